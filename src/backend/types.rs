//! Common types shared between backends

/// Requested configuration for a graphics context.
///
/// Backends treat every field as a hard requirement: a context is either
/// created with exactly these traits or creation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTraits {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub double_buffer: bool,
    pub stencil_bits: u32,
    pub depth_bits: u32,
    /// Multisample count, 0 for no multisampling
    pub samples: u32,
    pub quad_buffer_stereo: bool,
    pub window_decoration: bool,
    pub window_name: String,
}

impl ContextTraits {
    /// Minimal 1x1 context used as the negotiation baseline.
    pub fn baseline(window_name: &str) -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
            double_buffer: false,
            stencil_bits: 0,
            depth_bits: 0,
            samples: 0,
            quad_buffer_stereo: false,
            window_decoration: false,
            window_name: window_name.to_string(),
        }
    }

    /// Number of color buffers this configuration asks for.
    pub fn buffer_count(&self) -> u32 {
        match (self.double_buffer, self.quad_buffer_stereo) {
            (true, true) => 4,
            (false, true) | (true, false) => 2,
            (false, false) => 1,
        }
    }
}

impl Default for ContextTraits {
    fn default() -> Self {
        Self::baseline("hogbox")
    }
}

/// Handle to a live graphics context owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub(crate) u64);

/// String queries (`glGetString`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlString {
    Vendor,
    Renderer,
    Version,
    ShadingLanguageVersion,
    Extensions,
}

/// Integer queries (`glGetIntegerv`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlInteger {
    MaxTextureSize,
    /// Fixed-function texture units
    MaxTextureUnits,
    /// Fragment-stage image units
    MaxTextureImageUnits,
    MaxVertexTextureImageUnits,
    MaxGeometryTextureImageUnits,
    MaxCombinedTextureImageUnits,
    MaxTextureCoords,
    MaxSamples,
    StencilBits,
    DepthBits,
    // GL_NVX_gpu_memory_info
    GpuMemoryInfoDedicatedVidmemNvx,
    GpuMemoryInfoTotalAvailableMemoryNvx,
    GpuMemoryInfoCurrentAvailableVidmemNvx,
    // GL_ATI_meminfo, each returns four values
    TextureFreeMemoryAti,
    VboFreeMemoryAti,
}

/// Boolean queries (`glGetBooleanv`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlBoolean {
    Stereo,
    DoubleBuffer,
}
