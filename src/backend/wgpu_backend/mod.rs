//! wgpu backend implementation
//!
//! wgpu has no notion of an OpenGL context, so a "context" here is a logical
//! device whose requested traits have been validated against the adapter's
//! texture-format support. Driver queries are answered from the adapter info,
//! limits and downlevel capabilities, phrased the way a GL driver would.

use crate::backend::traits::*;
use crate::backend::types::*;
use std::collections::HashMap;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// A validated device standing in for a GL context
struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    traits: ContextTraits,
}

/// wgpu backend implementation
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    contexts: HashMap<u64, WgpuContext>,
    next_context_id: u64,
}

impl WgpuBackend {
    /// Create a backend on the best adapter of the given backends
    pub fn new(backends: wgpu::Backends) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(backends))
    }

    /// Async backend creation
    pub async fn new_async(backends: wgpu::Backends) -> BackendResult<Self> {
        let backends = if std::env::var("WGPU_BACKEND").is_ok() {
            wgpu::util::backend_bits_from_env().unwrap_or(backends)
        } else {
            backends
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await;

        // If no adapter found with preferred backend, try with all backends
        let (instance, adapter) = if adapter.is_none() && backends != wgpu::Backends::all() {
            log::warn!("Preferred backend not available, falling back to all backends");
            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok_or_else(|| {
                    BackendError::InitializationFailed("No suitable adapter found".into())
                })?;
            (instance, adapter)
        } else {
            let adapter = adapter.ok_or_else(|| {
                BackendError::InitializationFailed("No suitable adapter found".into())
            })?;
            (instance, adapter)
        };

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?} backend)",
            adapter_info.name,
            adapter_info.backend
        );

        Ok(Self {
            instance,
            adapter,
            contexts: HashMap::new(),
            next_context_id: 1,
        })
    }

    /// Pick the depth/stencil format matching the requested bit counts
    fn depth_stencil_format(
        &self,
        depth_bits: u32,
        stencil_bits: u32,
    ) -> Result<Option<wgpu::TextureFormat>, String> {
        use wgpu::TextureFormat as F;

        let format = match (depth_bits, stencil_bits) {
            (0, 0) => return Ok(None),
            (0, 1..=8) => F::Stencil8,
            (1..=16, 0) => F::Depth16Unorm,
            (17..=24, 0) => F::Depth24Plus,
            (1..=24, 1..=8) => F::Depth24PlusStencil8,
            (25..=32, 0) => F::Depth32Float,
            (25..=32, 1..=8)
                if self
                    .adapter
                    .features()
                    .contains(wgpu::Features::DEPTH32FLOAT_STENCIL8) =>
            {
                F::Depth32FloatStencil8
            }
            (depth, stencil) => {
                return Err(format!(
                    "no format with {} depth bits and {} stencil bits",
                    depth, stencil
                ))
            }
        };
        Ok(Some(format))
    }

    fn supports_attachment(&self, format: wgpu::TextureFormat, samples: u32) -> bool {
        let features = self.adapter.get_texture_format_features(format);
        if !features
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        {
            return false;
        }
        samples <= 1 || features.flags.sample_count_supported(samples)
    }

    /// Check the traits against the adapter without creating a device
    fn validate(&self, traits: &ContextTraits) -> Result<(), String> {
        if traits.quad_buffer_stereo {
            return Err("quad-buffer stereo is not exposed by wgpu".to_string());
        }
        if !self.supports_attachment(COLOR_FORMAT, traits.samples) {
            return Err(format!(
                "{:?} cannot be rendered with {} samples",
                COLOR_FORMAT, traits.samples
            ));
        }
        if let Some(format) = self.depth_stencil_format(traits.depth_bits, traits.stencil_bits)? {
            if !self.supports_attachment(format, traits.samples) {
                return Err(format!(
                    "{:?} cannot be rendered with {} samples",
                    format, traits.samples
                ));
            }
        }
        Ok(())
    }

    fn max_samples(&self) -> u32 {
        [16u32, 8, 4, 2]
            .into_iter()
            .find(|&samples| self.supports_attachment(COLOR_FORMAT, samples))
            .unwrap_or(0)
    }
}

impl GraphicsBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_context(&mut self, traits: &ContextTraits) -> BackendResult<ContextHandle> {
        self.validate(traits).map_err(BackendError::ContextRejected)?;

        let (device, queue) = pollster::block_on(self.adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some(traits.window_name.as_str()),
                required_features: wgpu::Features::empty(),
                required_limits: self.adapter.limits(),
            },
            None,
        ))
        .map_err(|e| BackendError::ContextRejected(e.to_string()))?;

        let id = self.next_context_id;
        self.next_context_id += 1;
        self.contexts.insert(
            id,
            WgpuContext {
                device,
                queue,
                traits: traits.clone(),
            },
        );
        log::trace!("WgpuBackend: created context {} for {:?}", id, traits);
        Ok(ContextHandle(id))
    }

    fn release_context(&mut self, context: ContextHandle) {
        self.contexts.remove(&context.0);
    }

    fn run_one_frame(
        &mut self,
        context: ContextHandle,
        callback: &mut dyn FnMut(&dyn GlQuery),
    ) -> BackendResult<()> {
        let max_samples = self.max_samples();
        let ctx = self
            .contexts
            .get(&context.0)
            .ok_or(BackendError::UnknownContext(context))?;

        let query = WgpuQuery {
            info: self.adapter.get_info(),
            limits: ctx.device.limits(),
            downlevel: self.adapter.get_downlevel_capabilities(),
            traits: &ctx.traits,
            max_samples,
        };
        callback(&query);

        let encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capability Probe Frame"),
            });
        ctx.queue.submit(Some(encoder.finish()));
        let _ = ctx.device.poll(wgpu::Maintain::Wait);
        Ok(())
    }
}

/// GL-style view of a wgpu adapter
struct WgpuQuery<'a> {
    info: wgpu::AdapterInfo,
    limits: wgpu::Limits,
    downlevel: wgpu::DownlevelCapabilities,
    traits: &'a ContextTraits,
    max_samples: u32,
}

impl WgpuQuery<'_> {
    fn shader_model_rank(&self) -> u32 {
        match self.downlevel.shader_model {
            wgpu::ShaderModel::Sm5 => 5,
            wgpu::ShaderModel::Sm4 => 4,
            _ => 2,
        }
    }

    fn vendor_name(&self) -> String {
        match self.info.vendor {
            0x10DE => "NVIDIA Corporation".to_string(),
            0x1002 => "ATI Technologies Inc.".to_string(),
            0x8086 => "Intel".to_string(),
            0x106B => "Apple".to_string(),
            0x13B5 => "ARM".to_string(),
            0x5143 => "Qualcomm".to_string(),
            _ if !self.info.driver.is_empty() => self.info.driver.clone(),
            other => format!("0x{:04X}", other),
        }
    }

    fn version(&self) -> String {
        if self.info.backend == wgpu::Backend::Gl && !self.info.driver_info.is_empty() {
            return self.info.driver_info.clone();
        }
        let version = match self.shader_model_rank() {
            5 => "4.5",
            4 => "3.3",
            _ => "2.1",
        };
        format!("{} ({:?})", version, self.info.backend)
    }

    fn shading_language_version(&self) -> &'static str {
        match self.shader_model_rank() {
            5 => "4.50",
            4 => "3.30",
            _ => "1.20",
        }
    }

    fn extensions(&self) -> Vec<&'static str> {
        let mut extensions = vec![
            "GL_ARB_shading_language_100",
            "GL_ARB_shader_objects",
            "GL_ARB_vertex_shader",
            "GL_ARB_fragment_shader",
            "GL_ARB_framebuffer_object",
        ];
        if self.max_samples > 1 {
            extensions.push("GL_ARB_multisample");
        }
        if self
            .downlevel
            .flags
            .contains(wgpu::DownlevelFlags::NON_POWER_OF_TWO_MIPMAPPED_TEXTURES)
        {
            extensions.push("GL_ARB_texture_non_power_of_two");
        }
        if self.shader_model_rank() >= 4 {
            extensions.push("GL_EXT_gpu_shader4");
        }
        extensions
    }
}

fn to_gl_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl GlQuery for WgpuQuery<'_> {
    fn is_extension_supported(&self, name: &str) -> bool {
        self.extensions().contains(&name)
    }

    fn get_integer(&self, pname: GlInteger) -> Option<i32> {
        let per_stage = self.limits.max_sampled_textures_per_shader_stage;
        match pname {
            GlInteger::MaxTextureSize => Some(to_gl_int(self.limits.max_texture_dimension_2d)),
            GlInteger::MaxTextureImageUnits | GlInteger::MaxVertexTextureImageUnits => {
                Some(to_gl_int(per_stage))
            }
            GlInteger::MaxCombinedTextureImageUnits => Some(to_gl_int(per_stage.saturating_mul(2))),
            GlInteger::MaxTextureCoords => {
                Some(to_gl_int(self.limits.max_inter_stage_shader_components / 4))
            }
            GlInteger::MaxSamples => Some(to_gl_int(self.max_samples)),
            GlInteger::StencilBits => Some(to_gl_int(self.traits.stencil_bits)),
            GlInteger::DepthBits => Some(to_gl_int(self.traits.depth_bits)),
            // No fixed-function pipeline, no geometry stage, no vendor memory queries
            _ => None,
        }
    }

    fn get_string(&self, pname: GlString) -> Option<String> {
        match pname {
            GlString::Vendor => Some(self.vendor_name()),
            GlString::Renderer => Some(self.info.name.clone()),
            GlString::Version => Some(self.version()),
            GlString::ShadingLanguageVersion => Some(self.shading_language_version().to_string()),
            GlString::Extensions => Some(self.extensions().join(" ")),
        }
    }

    fn get_boolean(&self, pname: GlBoolean) -> Option<bool> {
        match pname {
            GlBoolean::Stereo => Some(false),
            GlBoolean::DoubleBuffer => Some(self.traits.double_buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::probe::gather_gl_info;

    fn adapter_info(backend: wgpu::Backend) -> wgpu::AdapterInfo {
        wgpu::AdapterInfo {
            name: "Test GPU".to_string(),
            vendor: 0x10DE,
            device: 0,
            device_type: wgpu::DeviceType::DiscreteGpu,
            driver: String::new(),
            driver_info: String::new(),
            backend,
        }
    }

    #[test]
    fn test_sm5_adapter_has_no_geometry_stage() {
        let traits = ContextTraits::baseline("test");
        let query = WgpuQuery {
            info: adapter_info(wgpu::Backend::Vulkan),
            limits: wgpu::Limits::default(),
            downlevel: wgpu::DownlevelCapabilities::default(),
            traits: &traits,
            max_samples: 4,
        };

        let result = gather_gl_info(&query);
        assert_eq!(result.gl_version, 4.5);
        assert_eq!(result.vendor, "NVIDIA Corporation");
        assert!(result.vertex_shaders_supported && result.fragment_shaders_supported);
        assert!(!result.geometry_shaders_supported);
        assert_eq!(result.max_geometry_texture_units, 0);
        assert_eq!(result.max_fixed_texture_units, 0);
    }
}
