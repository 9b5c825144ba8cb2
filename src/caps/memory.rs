//! Vendor-specific video memory counters.
//!
//! Each vendor extension gets its own provider; the first provider whose
//! extension is present wins. Drivers without any of them report zeros.

use crate::backend::{GlInteger, GlQuery};
use crate::caps::snapshot::GpuMemoryInfo;

/// Reads memory counters through one vendor extension
pub trait MemoryInfoProvider {
    /// Extension string this provider relies on
    fn extension(&self) -> &'static str;

    /// Read the counters, `None` if the extension is missing or unusable
    fn try_read(&self, gl: &dyn GlQuery) -> Option<GpuMemoryInfo>;
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// `GL_NVX_gpu_memory_info`
#[derive(Debug, Default, Clone, Copy)]
pub struct NvxMemoryInfo;

impl MemoryInfoProvider for NvxMemoryInfo {
    fn extension(&self) -> &'static str {
        "GL_NVX_gpu_memory_info"
    }

    fn try_read(&self, gl: &dyn GlQuery) -> Option<GpuMemoryInfo> {
        if !gl.is_extension_supported(self.extension()) {
            return None;
        }
        Some(GpuMemoryInfo {
            total_dedicated_kb: non_negative(
                gl.get_integer(GlInteger::GpuMemoryInfoDedicatedVidmemNvx)?,
            ),
            available_kb: non_negative(
                gl.get_integer(GlInteger::GpuMemoryInfoTotalAvailableMemoryNvx)?,
            ),
            available_dedicated_kb: non_negative(
                gl.get_integer(GlInteger::GpuMemoryInfoCurrentAvailableVidmemNvx)?,
            ),
        })
    }
}

/// `GL_ATI_meminfo`
///
/// Only free memory is exposed: element 0 is the total free pool, element 2
/// the free auxiliary (shared) pool. Dedicated total stays unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtiMemInfo;

impl MemoryInfoProvider for AtiMemInfo {
    fn extension(&self) -> &'static str {
        "GL_ATI_meminfo"
    }

    fn try_read(&self, gl: &dyn GlQuery) -> Option<GpuMemoryInfo> {
        if !gl.is_extension_supported(self.extension()) {
            return None;
        }
        let texture = gl.get_integer_array(GlInteger::TextureFreeMemoryAti, 4)?;
        let free = non_negative(texture.first().copied().unwrap_or(0));
        let free_aux = non_negative(texture.get(2).copied().unwrap_or(0));
        Some(GpuMemoryInfo {
            total_dedicated_kb: 0,
            available_kb: free.saturating_add(free_aux),
            available_dedicated_kb: free,
        })
    }
}

/// Providers in the order they are tried
pub fn default_providers() -> Vec<Box<dyn MemoryInfoProvider + Send + Sync>> {
    vec![Box::new(NvxMemoryInfo), Box::new(AtiMemInfo)]
}

/// Ask each provider in turn and keep the first answer.
pub fn read_gpu_memory(
    gl: &dyn GlQuery,
    providers: &[Box<dyn MemoryInfoProvider + Send + Sync>],
) -> GpuMemoryInfo {
    for provider in providers {
        if let Some(info) = provider.try_read(gl) {
            log::debug!("GPU memory read via {}", provider.extension());
            return info;
        }
    }
    log::debug!("No GPU memory extension available");
    GpuMemoryInfo::default()
}
