//! The gathered capability snapshot

use std::fmt;

use crate::GatherStrategy;

/// Vendor-reported video memory counters, in KB. Zero means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpuMemoryInfo {
    pub total_dedicated_kb: u32,
    pub available_kb: u32,
    pub available_dedicated_kb: u32,
}

impl GpuMemoryInfo {
    pub fn is_known(&self) -> bool {
        *self != Self::default()
    }
}

/// Everything learned about the GPU, driver and context limits.
///
/// Built once by [`CapabilityRegistry`](crate::CapabilityRegistry) and shared
/// as `Arc<CapabilitySnapshot>`; it is never re-derived from the GPU until the
/// registry is reset.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySnapshot {
    /// How this snapshot was produced
    pub source: GatherStrategy,

    // Driver identity
    pub renderer: String,
    pub vendor: String,
    pub gl_version: f32,
    pub glsl_version: f32,

    // Buffers
    pub double_buffer_supported: bool,
    /// Driver claims stereo support (`GL_STEREO`)
    pub quad_buffer_reported: bool,
    /// Color buffers of the largest context actually created (1, 2 or 4)
    pub tested_buffers: u32,
    pub max_stencil_bits: u32,
    pub max_depth_bits: u32,
    pub multisampling_supported: bool,
    pub max_samples: u32,

    // Shaders
    pub glsl_supported: bool,
    pub shader_objects_supported: bool,
    pub gpu_shader4_supported: bool,
    pub vertex_shaders_supported: bool,
    pub fragment_shaders_supported: bool,
    pub geometry_shaders_supported: bool,

    // Textures
    pub max_texture_2d_size: u32,
    pub npot_supported: bool,
    pub texture_rectangles_supported: bool,
    pub max_fixed_texture_units: u32,
    pub max_vertex_texture_units: u32,
    pub max_fragment_texture_units: u32,
    pub max_geometry_texture_units: u32,
    pub max_total_texture_units: u32,
    pub max_texture_coord_units: u32,
    pub fbo_supported: bool,

    pub memory: GpuMemoryInfo,
}

impl CapabilitySnapshot {
    /// Conservative values for OpenGL 1.x class hardware: no shaders, two
    /// texture units, 16-bit depth.
    pub fn defaults() -> Self {
        Self {
            source: GatherStrategy::Defaults,
            renderer: "Unknown".to_string(),
            vendor: "Unknown".to_string(),
            gl_version: 1.1,
            glsl_version: 0.0,
            double_buffer_supported: true,
            quad_buffer_reported: false,
            tested_buffers: 2,
            max_stencil_bits: 0,
            max_depth_bits: 16,
            multisampling_supported: false,
            max_samples: 0,
            glsl_supported: false,
            shader_objects_supported: false,
            gpu_shader4_supported: false,
            vertex_shaders_supported: false,
            fragment_shaders_supported: false,
            geometry_shaders_supported: false,
            max_texture_2d_size: 1024,
            npot_supported: false,
            texture_rectangles_supported: false,
            max_fixed_texture_units: 2,
            max_vertex_texture_units: 0,
            max_fragment_texture_units: 2,
            max_geometry_texture_units: 0,
            max_total_texture_units: 2,
            max_texture_coord_units: 2,
            fbo_supported: false,
            memory: GpuMemoryInfo::default(),
        }
    }

    /// All of GLSL, shader objects, vertex and fragment shaders are present.
    pub fn are_shaders_supported(&self) -> bool {
        self.glsl_supported
            && self.shader_objects_supported
            && self.vertex_shaders_supported
            && self.fragment_shaders_supported
    }

    /// Stereo is only trusted when a four-buffer context was really created.
    pub fn quad_buffered_stereo_supported(&self) -> bool {
        self.quad_buffer_reported && self.tested_buffers == 4
    }

    pub fn total_texture_units(&self) -> u32 {
        self.max_total_texture_units
    }

    /// Multi-line human readable report
    pub fn report(&self) -> String {
        self.to_string()
    }

    /// Clamp a requested anti-aliasing sample count to what was tested.
    ///
    /// Returns 0 (multisampling off) when multisampling is unavailable.
    pub fn clamp_samples(&self, requested: u32) -> u32 {
        if !self.multisampling_supported {
            return 0;
        }
        requested.min(self.max_samples)
    }

    /// Emit the report at info level, one line per entry.
    pub fn log_report(&self) {
        for line in self.report().lines() {
            log::info!("{}", line);
        }
    }
}

impl Default for CapabilitySnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}

impl fmt::Display for CapabilitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System capabilities ({:?})", self.source)?;
        writeln!(f, "  Renderer: {}", self.renderer)?;
        writeln!(f, "  Vendor: {}", self.vendor)?;
        writeln!(f, "  GL version: {:.1}", self.gl_version)?;
        writeln!(f, "  GLSL version: {:.2}", self.glsl_version)?;
        writeln!(f, "  Double buffered: {}", self.double_buffer_supported)?;
        writeln!(
            f,
            "  Quad buffered stereo: {} (driver {}, {} buffers tested)",
            self.quad_buffered_stereo_supported(),
            self.quad_buffer_reported,
            self.tested_buffers
        )?;
        writeln!(f, "  Depth bits: {}", self.max_depth_bits)?;
        writeln!(f, "  Stencil bits: {}", self.max_stencil_bits)?;
        writeln!(
            f,
            "  Multisampling: {} (max {} samples)",
            self.multisampling_supported, self.max_samples
        )?;
        writeln!(
            f,
            "  Shaders: {} (GLSL {}, objects {}, vertex {}, fragment {}, geometry {}, shader4 {})",
            self.are_shaders_supported(),
            self.glsl_supported,
            self.shader_objects_supported,
            self.vertex_shaders_supported,
            self.fragment_shaders_supported,
            self.geometry_shaders_supported,
            self.gpu_shader4_supported
        )?;
        writeln!(f, "  Max 2D texture size: {}", self.max_texture_2d_size)?;
        writeln!(
            f,
            "  NPOT textures: {}, texture rectangles: {}, FBOs: {}",
            self.npot_supported, self.texture_rectangles_supported, self.fbo_supported
        )?;
        writeln!(
            f,
            "  Texture units: fixed {}, vertex {}, fragment {}, geometry {}, total {}",
            self.max_fixed_texture_units,
            self.max_vertex_texture_units,
            self.max_fragment_texture_units,
            self.max_geometry_texture_units,
            self.max_total_texture_units
        )?;
        writeln!(f, "  Texture coord units: {}", self.max_texture_coord_units)?;
        write!(
            f,
            "  GPU memory (KB): dedicated {}, available {}, available dedicated {}",
            self.memory.total_dedicated_kb,
            self.memory.available_kb,
            self.memory.available_dedicated_kb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_support_is_strict_conjunction() {
        for mask in 0u8..16 {
            let snapshot = CapabilitySnapshot {
                glsl_supported: mask & 1 != 0,
                shader_objects_supported: mask & 2 != 0,
                vertex_shaders_supported: mask & 4 != 0,
                fragment_shaders_supported: mask & 8 != 0,
                ..CapabilitySnapshot::defaults()
            };
            assert_eq!(snapshot.are_shaders_supported(), mask == 0b1111, "mask {mask:04b}");
        }
    }

    #[test]
    fn test_stereo_requires_four_tested_buffers() {
        let mut snapshot = CapabilitySnapshot {
            quad_buffer_reported: true,
            ..CapabilitySnapshot::defaults()
        };
        for buffers in [1, 2] {
            snapshot.tested_buffers = buffers;
            assert!(!snapshot.quad_buffered_stereo_supported());
        }
        snapshot.tested_buffers = 4;
        assert!(snapshot.quad_buffered_stereo_supported());

        snapshot.quad_buffer_reported = false;
        assert!(!snapshot.quad_buffered_stereo_supported());
    }

    #[test]
    fn test_clamp_samples() {
        let mut snapshot = CapabilitySnapshot::defaults();
        assert_eq!(snapshot.clamp_samples(4), 0);

        snapshot.multisampling_supported = true;
        snapshot.max_samples = 4;
        assert_eq!(snapshot.clamp_samples(0), 0);
        assert_eq!(snapshot.clamp_samples(2), 2);
        assert_eq!(snapshot.clamp_samples(16), 4);
    }

    #[test]
    fn test_defaults_are_legacy_class() {
        let snapshot = CapabilitySnapshot::defaults();
        assert!(!snapshot.are_shaders_supported());
        assert_eq!(snapshot.max_total_texture_units, 2);
        assert!(snapshot.gl_version < 2.0);
        assert!(!snapshot.memory.is_known());
    }

    #[test]
    fn test_report_mentions_every_section() {
        let report = CapabilitySnapshot::defaults().to_string();
        for needle in ["Renderer", "GL version", "Stencil bits", "Texture units", "GPU memory"] {
            assert!(report.contains(needle), "missing {needle}");
        }
    }
}
