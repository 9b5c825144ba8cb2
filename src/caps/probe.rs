//! Driver capability queries run inside the probe frame

use crate::backend::{GlBoolean, GlInteger, GlQuery, GlString};
use crate::caps::snapshot::CapabilitySnapshot;

/// Raw results of the capability frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlProbeResult {
    pub renderer: String,
    pub vendor: String,
    pub version_string: String,
    pub glsl_version_string: String,
    pub gl_version: f32,
    pub glsl_version: f32,

    pub stereo_reported: bool,
    pub multisample_extension: bool,

    pub glsl_supported: bool,
    pub shader_objects_supported: bool,
    pub gpu_shader4_supported: bool,
    pub vertex_shaders_supported: bool,
    pub fragment_shaders_supported: bool,
    pub geometry_shaders_supported: bool,

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
}

/// Parse the leading `major.minor` number of a GL version string.
///
/// Handles `"3.3.0 NVIDIA 535.54"`, `"OpenGL ES 3.0 Mesa"` and GLSL's
/// `"3.30"`; returns 0.0 when no number is present.
pub fn parse_version(text: &str) -> f32 {
    let start = match text.find(|c: char| c.is_ascii_digit()) {
        Some(start) => start,
        None => return 0.0,
    };
    let rest = &text[start..];

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
    }
    rest[..end].parse().unwrap_or(0.0)
}

/// A version-gated extension check: core since `core_version` or advertised
/// under any of `extensions`.
fn has_feature(gl: &dyn GlQuery, version: f32, core_version: f32, extensions: &[&str]) -> bool {
    version >= core_version || extensions.iter().any(|ext| gl.is_extension_supported(ext))
}

fn get_u32(gl: &dyn GlQuery, pname: GlInteger) -> u32 {
    gl.get_integer(pname)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(0)
}

/// Read general driver information. Must run while a context is current.
pub fn gather_gl_info(gl: &dyn GlQuery) -> GlProbeResult {
    let version_string = gl.get_string(GlString::Version).unwrap_or_default();
    let glsl_version_string = gl
        .get_string(GlString::ShadingLanguageVersion)
        .unwrap_or_default();
    let gl_version = parse_version(&version_string);
    let glsl_version = parse_version(&glsl_version_string);

    let glsl_supported = glsl_version > 0.0
        || has_feature(gl, gl_version, 2.0, &["GL_ARB_shading_language_100"]);
    let shader_objects_supported = has_feature(gl, gl_version, 2.0, &["GL_ARB_shader_objects"]);
    let vertex_shaders_supported = has_feature(gl, gl_version, 2.0, &["GL_ARB_vertex_shader"]);
    let fragment_shaders_supported = has_feature(gl, gl_version, 2.0, &["GL_ARB_fragment_shader"]);
    // A backend without a geometry stage answers no geometry unit count.
    let geometry_shaders_supported = has_feature(
        gl,
        gl_version,
        3.2,
        &["GL_ARB_geometry_shader4", "GL_EXT_geometry_shader4"],
    ) && gl
        .get_integer(GlInteger::MaxGeometryTextureImageUnits)
        .is_some_and(|units| units > 0);
    let gpu_shader4_supported = has_feature(gl, gl_version, 3.0, &["GL_EXT_gpu_shader4"]);

    let max_fixed_texture_units = get_u32(gl, GlInteger::MaxTextureUnits);
    let max_fragment_texture_units = match get_u32(gl, GlInteger::MaxTextureImageUnits) {
        0 => max_fixed_texture_units,
        units => units,
    };
    let max_vertex_texture_units = get_u32(gl, GlInteger::MaxVertexTextureImageUnits);
    let max_geometry_texture_units = if geometry_shaders_supported {
        get_u32(gl, GlInteger::MaxGeometryTextureImageUnits)
    } else {
        0
    };
    let max_total_texture_units = match get_u32(gl, GlInteger::MaxCombinedTextureImageUnits) {
        0 => max_fixed_texture_units.max(max_fragment_texture_units),
        units => units,
    };
    let max_texture_coord_units = match get_u32(gl, GlInteger::MaxTextureCoords) {
        0 => max_fixed_texture_units,
        units => units,
    };

    GlProbeResult {
        renderer: gl.get_string(GlString::Renderer).unwrap_or_default(),
        vendor: gl.get_string(GlString::Vendor).unwrap_or_default(),
        version_string,
        glsl_version_string,
        gl_version,
        glsl_version,
        stereo_reported: gl.get_boolean(GlBoolean::Stereo).unwrap_or(false),
        multisample_extension: has_feature(gl, gl_version, 1.3, &["GL_ARB_multisample"]),
        glsl_supported,
        shader_objects_supported,
        gpu_shader4_supported,
        vertex_shaders_supported,
        fragment_shaders_supported,
        geometry_shaders_supported,
        max_texture_2d_size: get_u32(gl, GlInteger::MaxTextureSize),
        npot_supported: has_feature(gl, gl_version, 2.0, &["GL_ARB_texture_non_power_of_two"]),
        texture_rectangles_supported: has_feature(
            gl,
            gl_version,
            3.1,
            &[
                "GL_ARB_texture_rectangle",
                "GL_EXT_texture_rectangle",
                "GL_NV_texture_rectangle",
            ],
        ),
        max_fixed_texture_units,
        max_vertex_texture_units,
        max_fragment_texture_units,
        max_geometry_texture_units,
        max_total_texture_units,
        max_texture_coord_units,
        fbo_supported: has_feature(
            gl,
            gl_version,
            3.0,
            &["GL_ARB_framebuffer_object", "GL_EXT_framebuffer_object"],
        ),
    }
}

impl GlProbeResult {
    /// Copy the driver facts into `snapshot`.
    ///
    /// Stereo and multisampling are folded in later against the negotiated
    /// traits, since a driver claim alone is not trusted.
    pub fn apply_to(&self, snapshot: &mut CapabilitySnapshot) {
        snapshot.renderer = self.renderer.clone();
        snapshot.vendor = self.vendor.clone();
        snapshot.gl_version = self.gl_version;
        snapshot.glsl_version = self.glsl_version;
        snapshot.quad_buffer_reported = self.stereo_reported;
        snapshot.glsl_supported = self.glsl_supported;
        snapshot.shader_objects_supported = self.shader_objects_supported;
        snapshot.gpu_shader4_supported = self.gpu_shader4_supported;
        snapshot.vertex_shaders_supported = self.vertex_shaders_supported;
        snapshot.fragment_shaders_supported = self.fragment_shaders_supported;
        snapshot.geometry_shaders_supported = self.geometry_shaders_supported;
        snapshot.max_texture_2d_size = self.max_texture_2d_size;
        snapshot.npot_supported = self.npot_supported;
        snapshot.texture_rectangles_supported = self.texture_rectangles_supported;
        snapshot.max_fixed_texture_units = self.max_fixed_texture_units;
        snapshot.max_vertex_texture_units = self.max_vertex_texture_units;
        snapshot.max_fragment_texture_units = self.max_fragment_texture_units;
        snapshot.max_geometry_texture_units = self.max_geometry_texture_units;
        snapshot.max_total_texture_units = self.max_total_texture_units;
        snapshot.max_texture_coord_units = self.max_texture_coord_units;
        snapshot.fbo_supported = self.fbo_supported;
    }
}
