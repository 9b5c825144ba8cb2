//! Capability override files.
//!
//! A flat TOML table whose keys match the snapshot fields:
//!
//! ```toml
//! GLVersion = 2.1
//! GLSLSupported = 1
//! QuadBuffered = "0"
//! MaxTextureUnits = 8
//! ```
//!
//! Flags accept `true`/`false`, integers or numeric text, where zero means
//! false. Unknown keys are ignored so older builds can read newer files.

use std::path::Path;

use serde::{de::Error as _, Deserialize, Deserializer};

use crate::caps::snapshot::CapabilitySnapshot;
use crate::error::{CapsError, CapsResult};

/// Any scalar a config value may be written as
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn to_flag(&self) -> Result<bool, String> {
        match self {
            Scalar::Bool(value) => Ok(*value),
            Scalar::Int(value) => Ok(*value != 0),
            Scalar::Float(value) => Ok(*value != 0.0),
            Scalar::Text(text) => match text.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => other
                    .parse::<f64>()
                    .map(|value| value != 0.0)
                    .map_err(|_| format!("'{}' is not a flag", text)),
            },
        }
    }

    fn to_f64(&self) -> Result<f64, String> {
        match self {
            Scalar::Int(value) => Ok(*value as f64),
            Scalar::Float(value) => Ok(*value),
            Scalar::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("'{}' is not a number", text)),
            Scalar::Bool(value) => Err(format!("{} is not a number", value)),
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Scalar::deserialize(deserializer)?;
    value.to_flag().map(Some).map_err(D::Error::custom)
}

fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
    let value = Scalar::deserialize(deserializer)?;
    value.to_f64().map(|v| Some(v as f32)).map_err(D::Error::custom)
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Scalar::deserialize(deserializer)?.to_f64().map_err(D::Error::custom)?;
    if value < 0.0 || value > u32::MAX as f64 {
        return Err(D::Error::custom(format!("{} is out of range", value)));
    }
    Ok(Some(value as u32))
}

/// Capability values read from a config file; `None` fields keep whatever
/// was gathered.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CapabilityOverrides {
    #[serde(rename = "Renderer", default)]
    pub renderer: Option<String>,
    #[serde(rename = "Vendor", default)]
    pub vendor: Option<String>,
    #[serde(rename = "GLVersion", default, deserialize_with = "float")]
    pub gl_version: Option<f32>,
    #[serde(rename = "GLSLVersion", default, deserialize_with = "float")]
    pub glsl_version: Option<f32>,

    #[serde(rename = "DoubleBuffered", default, deserialize_with = "flag")]
    pub double_buffered: Option<bool>,
    #[serde(rename = "QuadBuffered", default, deserialize_with = "flag")]
    pub quad_buffered: Option<bool>,
    #[serde(rename = "StencilBuffered", default, deserialize_with = "flag")]
    pub stencil_buffered: Option<bool>,
    #[serde(rename = "MaxStencilBits", default, deserialize_with = "count")]
    pub max_stencil_bits: Option<u32>,
    #[serde(rename = "MaxDepthBits", default, deserialize_with = "count")]
    pub max_depth_bits: Option<u32>,
    #[serde(rename = "MultiSampling", default, deserialize_with = "flag")]
    pub multisampling: Option<bool>,
    #[serde(rename = "MaxMultiSamples", default, deserialize_with = "count")]
    pub max_multisamples: Option<u32>,

    #[serde(rename = "GLSLSupported", default, deserialize_with = "flag")]
    pub glsl_supported: Option<bool>,
    #[serde(rename = "ShaderObjectsSupported", default, deserialize_with = "flag")]
    pub shader_objects_supported: Option<bool>,
    #[serde(rename = "Shader4Supported", default, deserialize_with = "flag")]
    pub shader4_supported: Option<bool>,
    #[serde(rename = "VertexShadersSupported", default, deserialize_with = "flag")]
    pub vertex_shaders_supported: Option<bool>,
    #[serde(rename = "FragmentShadersSupported", default, deserialize_with = "flag")]
    pub fragment_shaders_supported: Option<bool>,
    #[serde(rename = "GeometryShadersSupported", default, deserialize_with = "flag")]
    pub geometry_shaders_supported: Option<bool>,

    #[serde(rename = "NPOTSupported", default, deserialize_with = "flag")]
    pub npot_supported: Option<bool>,
    #[serde(rename = "MaxTexture2DSize", default, deserialize_with = "count")]
    pub max_texture_2d_size: Option<u32>,
    #[serde(rename = "TextureRectanglesSupported", default, deserialize_with = "flag")]
    pub texture_rectangles_supported: Option<bool>,
    #[serde(rename = "MaxTextureUnits", default, deserialize_with = "count")]
    pub max_texture_units: Option<u32>,
    #[serde(rename = "MaxVertexTextureUnits", default, deserialize_with = "count")]
    pub max_vertex_texture_units: Option<u32>,
    #[serde(rename = "MaxFragmentTextureUnits", default, deserialize_with = "count")]
    pub max_fragment_texture_units: Option<u32>,
    #[serde(rename = "MaxGeometryTextureUnits", default, deserialize_with = "count")]
    pub max_geometry_texture_units: Option<u32>,
    #[serde(rename = "MaxTotalTextureUnits", default, deserialize_with = "count")]
    pub max_total_texture_units: Option<u32>,
    #[serde(rename = "MaxTextureCoordUnits", default, deserialize_with = "count")]
    pub max_texture_coord_units: Option<u32>,
    #[serde(rename = "FrameBufferObjectsSupported", default, deserialize_with = "flag")]
    pub fbo_supported: Option<bool>,

    #[serde(rename = "TotalDedicatedMemory", default, deserialize_with = "count")]
    pub total_dedicated_memory: Option<u32>,
    #[serde(rename = "AvailableMemory", default, deserialize_with = "count")]
    pub available_memory: Option<u32>,
    #[serde(rename = "AvailableDedicatedMemory", default, deserialize_with = "count")]
    pub available_dedicated_memory: Option<u32>,
}

impl CapabilityOverrides {
    /// Parse overrides from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load overrides from a TOML file.
    pub fn load(path: &Path) -> CapsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CapsError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides = Self::from_toml_str(&content).map_err(|e| CapsError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("Loaded capability overrides from {}", path.display());
        Ok(overrides)
    }

    /// Overwrite the fields of `snapshot` this file names.
    pub fn apply(&self, snapshot: &mut CapabilitySnapshot) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut snapshot.renderer, &self.renderer);
        set(&mut snapshot.vendor, &self.vendor);
        set(&mut snapshot.gl_version, &self.gl_version);
        set(&mut snapshot.glsl_version, &self.glsl_version);
        set(&mut snapshot.double_buffer_supported, &self.double_buffered);

        // A config file is the confirmation itself: QuadBuffered vouches for
        // a four-buffer context.
        match self.quad_buffered {
            Some(true) => {
                snapshot.quad_buffer_reported = true;
                snapshot.double_buffer_supported = true;
                snapshot.tested_buffers = 4;
            }
            Some(false) => {
                snapshot.quad_buffer_reported = false;
                snapshot.tested_buffers = snapshot.tested_buffers.min(2);
            }
            None => {}
        }

        match self.stencil_buffered {
            Some(false) => snapshot.max_stencil_bits = 0,
            Some(true) if snapshot.max_stencil_bits == 0 => snapshot.max_stencil_bits = 8,
            _ => {}
        }
        set(&mut snapshot.max_stencil_bits, &self.max_stencil_bits);
        set(&mut snapshot.max_depth_bits, &self.max_depth_bits);

        set(&mut snapshot.multisampling_supported, &self.multisampling);
        set(&mut snapshot.max_samples, &self.max_multisamples);
        if !snapshot.multisampling_supported {
            snapshot.max_samples = 0;
        }

        set(&mut snapshot.glsl_supported, &self.glsl_supported);
        set(&mut snapshot.shader_objects_supported, &self.shader_objects_supported);
        set(&mut snapshot.gpu_shader4_supported, &self.shader4_supported);
        set(&mut snapshot.vertex_shaders_supported, &self.vertex_shaders_supported);
        set(&mut snapshot.fragment_shaders_supported, &self.fragment_shaders_supported);
        set(&mut snapshot.geometry_shaders_supported, &self.geometry_shaders_supported);

        set(&mut snapshot.npot_supported, &self.npot_supported);
        set(&mut snapshot.max_texture_2d_size, &self.max_texture_2d_size);
        set(&mut snapshot.texture_rectangles_supported, &self.texture_rectangles_supported);
        set(&mut snapshot.max_fixed_texture_units, &self.max_texture_units);
        set(&mut snapshot.max_vertex_texture_units, &self.max_vertex_texture_units);
        set(&mut snapshot.max_fragment_texture_units, &self.max_fragment_texture_units);
        set(&mut snapshot.max_geometry_texture_units, &self.max_geometry_texture_units);
        // MaxTextureUnits doubles as the total when no total is given
        set(
            &mut snapshot.max_total_texture_units,
            &self.max_total_texture_units.or(self.max_texture_units),
        );
        set(&mut snapshot.max_texture_coord_units, &self.max_texture_coord_units);
        set(&mut snapshot.fbo_supported, &self.fbo_supported);

        set(&mut snapshot.memory.total_dedicated_kb, &self.total_dedicated_memory);
        set(&mut snapshot.memory.available_kb, &self.available_memory);
        set(&mut snapshot.memory.available_dedicated_kb, &self.available_dedicated_memory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        GLVersion = 2.1
        GLSLVersion = "1.20"
        QuadBuffered = 0
        MultiSampling = 1
        MaxMultiSamples = 4
        StencilBuffered = "1"
        GLSLSupported = 1
        ShaderObjectsSupported = 1
        Shader4Supported = 0
        VertexShadersSupported = true
        FragmentShadersSupported = "1"
        GeometryShadersSupported = 0
        NPOTSupported = 1
        MaxTexture2DSize = 4096
        TextureRectanglesSupported = 1
        MaxTextureUnits = 8
        FrameBufferObjectsSupported = 1
        SomeFutureField = "ignored"
    "#;

    #[test]
    fn test_unknown_fields_are_ignored() {
        let overrides = CapabilityOverrides::from_toml_str(FULL_CONFIG).unwrap();
        assert_eq!(overrides.gl_version, Some(2.1));
        assert_eq!(overrides.glsl_version, Some(1.2));
        assert_eq!(overrides.quad_buffered, Some(false));
        assert_eq!(overrides.multisampling, Some(true));
        assert_eq!(overrides.max_multisamples, Some(4));
        assert_eq!(overrides.stencil_buffered, Some(true));
        assert_eq!(overrides.shader4_supported, Some(false));
        assert_eq!(overrides.vertex_shaders_supported, Some(true));
        assert_eq!(overrides.fragment_shaders_supported, Some(true));
        assert_eq!(overrides.max_texture_2d_size, Some(4096));
        assert_eq!(overrides.max_texture_units, Some(8));
        assert_eq!(overrides.fbo_supported, Some(true));
        // Not mentioned in the file
        assert_eq!(overrides.renderer, None);
        assert_eq!(overrides.max_depth_bits, None);
        assert_eq!(overrides.max_texture_coord_units, None);
    }

    #[test]
    fn test_apply_populates_only_named_fields() {
        let overrides = CapabilityOverrides::from_toml_str(FULL_CONFIG).unwrap();
        let mut snapshot = CapabilitySnapshot::defaults();
        let before = snapshot.clone();
        overrides.apply(&mut snapshot);

        assert_eq!(snapshot.gl_version, 2.1);
        assert!(snapshot.are_shaders_supported());
        assert!(!snapshot.quad_buffered_stereo_supported());
        assert_eq!(snapshot.max_stencil_bits, 8);
        assert_eq!(snapshot.max_samples, 4);
        assert_eq!(snapshot.max_fixed_texture_units, 8);
        assert_eq!(snapshot.max_total_texture_units, 8);
        assert_eq!(snapshot.renderer, before.renderer);
        assert_eq!(snapshot.max_depth_bits, before.max_depth_bits);
        assert_eq!(snapshot.max_texture_coord_units, before.max_texture_coord_units);
    }

    #[test]
    fn test_quad_buffered_config_confirms_stereo() {
        let overrides = CapabilityOverrides::from_toml_str("QuadBuffered = 1").unwrap();
        let mut snapshot = CapabilitySnapshot::defaults();
        overrides.apply(&mut snapshot);
        assert!(snapshot.quad_buffered_stereo_supported());
    }

    #[test]
    fn test_disabling_multisampling_clears_samples() {
        let overrides =
            CapabilityOverrides::from_toml_str("MultiSampling = 0\nMaxMultiSamples = 8").unwrap();
        let mut snapshot = CapabilitySnapshot::defaults();
        overrides.apply(&mut snapshot);
        assert!(!snapshot.multisampling_supported);
        assert_eq!(snapshot.max_samples, 0);
    }

    #[test]
    fn test_bad_flag_is_rejected() {
        assert!(CapabilityOverrides::from_toml_str("GLSLSupported = \"maybe\"").is_err());
        assert!(CapabilityOverrides::from_toml_str("MaxTextureUnits = -2").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = CapabilityOverrides::load(Path::new("/nonexistent/caps.toml")).unwrap_err();
        assert!(matches!(err, CapsError::ConfigRead { .. }));
    }
}
