//! Named minimum-capability requirements

use std::fmt;

use glam::UVec2;

use crate::caps::snapshot::CapabilitySnapshot;

/// Minimum hardware a rendering technique needs.
///
/// Every threshold defaults to zero / not required, so an empty level is
/// satisfied by any snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemFeatureLevel {
    pub gl_version: f32,
    pub glsl_version: f32,
    pub texture_units: u32,
    pub texture_coord_units: u32,
    pub vertex_and_fragment_shaders: bool,
    pub geometry_shaders: bool,
    pub screen_resolution: UVec2,
}

impl SystemFeatureLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gl_version(mut self, version: f32) -> Self {
        self.gl_version = version;
        self
    }

    pub fn with_glsl_version(mut self, version: f32) -> Self {
        self.glsl_version = version;
        self
    }

    pub fn with_texture_units(mut self, units: u32) -> Self {
        self.texture_units = units;
        self
    }

    pub fn with_texture_coord_units(mut self, units: u32) -> Self {
        self.texture_coord_units = units;
        self
    }

    pub fn with_shaders(mut self, required: bool) -> Self {
        self.vertex_and_fragment_shaders = required;
        self
    }

    pub fn with_geometry_shaders(mut self, required: bool) -> Self {
        self.geometry_shaders = required;
        self
    }

    pub fn with_screen_resolution(mut self, width: u32, height: u32) -> Self {
        self.screen_resolution = UVec2::new(width, height);
        self
    }

    /// Every requirement `caps` fails to meet.
    ///
    /// `screen` is the primary screen resolution; an unknown screen only
    /// satisfies a zero resolution requirement.
    pub fn shortfalls(&self, caps: &CapabilitySnapshot, screen: Option<UVec2>) -> Vec<Shortfall> {
        let mut shortfalls = Vec::new();
        let screen = screen.unwrap_or(UVec2::ZERO);

        if self.gl_version > caps.gl_version {
            shortfalls.push(Shortfall::GlVersion {
                required: self.gl_version,
                available: caps.gl_version,
            });
        }
        if self.glsl_version > caps.glsl_version {
            shortfalls.push(Shortfall::GlslVersion {
                required: self.glsl_version,
                available: caps.glsl_version,
            });
        }
        if self.texture_units > caps.max_total_texture_units {
            shortfalls.push(Shortfall::TextureUnits {
                required: self.texture_units,
                available: caps.max_total_texture_units,
            });
        }
        if self.texture_coord_units > caps.max_texture_coord_units {
            shortfalls.push(Shortfall::TextureCoordUnits {
                required: self.texture_coord_units,
                available: caps.max_texture_coord_units,
            });
        }
        if self.vertex_and_fragment_shaders && !caps.are_shaders_supported() {
            shortfalls.push(Shortfall::Shaders);
        }
        if self.geometry_shaders && !caps.geometry_shaders_supported {
            shortfalls.push(Shortfall::GeometryShaders);
        }
        if self.screen_resolution.x > screen.x || self.screen_resolution.y > screen.y {
            shortfalls.push(Shortfall::ScreenResolution {
                required: self.screen_resolution,
                available: screen,
            });
        }
        shortfalls
    }

    pub fn is_satisfied_by(&self, caps: &CapabilitySnapshot, screen: Option<UVec2>) -> bool {
        self.shortfalls(caps, screen).is_empty()
    }
}

/// One unmet requirement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortfall {
    GlVersion { required: f32, available: f32 },
    GlslVersion { required: f32, available: f32 },
    TextureUnits { required: u32, available: u32 },
    TextureCoordUnits { required: u32, available: u32 },
    Shaders,
    GeometryShaders,
    ScreenResolution { required: UVec2, available: UVec2 },
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortfall::GlVersion {
                required,
                available,
            } => write!(f, "GL version {:.1} required, {:.1} available", required, available),
            Shortfall::GlslVersion {
                required,
                available,
            } => write!(f, "GLSL version {:.2} required, {:.2} available", required, available),
            Shortfall::TextureUnits {
                required,
                available,
            } => write!(f, "{} texture units required, {} available", required, available),
            Shortfall::TextureCoordUnits {
                required,
                available,
            } => write!(
                f,
                "{} texture coord units required, {} available",
                required, available
            ),
            Shortfall::Shaders => write!(f, "vertex and fragment shaders required, not available"),
            Shortfall::GeometryShaders => write!(f, "geometry shaders required, not available"),
            Shortfall::ScreenResolution {
                required,
                available,
            } => write!(
                f,
                "screen {}x{} required, {}x{} available",
                required.x, required.y, available.x, available.y
            ),
        }
    }
}
