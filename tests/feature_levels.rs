//! Feature-level checks and material fallback resolution.

mod common;

use rstest::rstest;

use common::{config_registry, init_logging, GL33_CONFIG};
use hogbox_caps::{CapabilityRegistry, Material, MaterialLibrary, SystemFeatureLevel};

/// A level the reference GL 3.3 machine meets exactly.
fn matching_level() -> SystemFeatureLevel {
    SystemFeatureLevel::new()
        .with_gl_version(3.3)
        .with_glsl_version(3.3)
        .with_texture_units(16)
        .with_texture_coord_units(8)
        .with_shaders(true)
        .with_geometry_shaders(true)
        .with_screen_resolution(1920, 1080)
}

fn gl33_registry(name: &str) -> CapabilityRegistry {
    config_registry(name, GL33_CONFIG)
}

// ============================================================================
// Monotonicity
// ============================================================================

#[rstest]
#[case::gl_version(matching_level().with_gl_version(3.4))]
#[case::glsl_version(matching_level().with_glsl_version(4.0))]
#[case::texture_units(matching_level().with_texture_units(17))]
#[case::texture_coord_units(matching_level().with_texture_coord_units(9))]
#[case::screen_width(matching_level().with_screen_resolution(1921, 1080))]
#[case::screen_height(matching_level().with_screen_resolution(1920, 1081))]
fn test_raising_one_threshold_fails(#[case] raised: SystemFeatureLevel) {
    init_logging();
    let registry = gl33_registry("monotonic");
    assert!(registry.is_feature_level_supported(&matching_level()));
    assert!(!registry.is_feature_level_supported(&raised));
    assert_eq!(registry.feature_level_shortfalls(&raised).len(), 1);
}

#[rstest]
#[case::gl_version(matching_level().with_gl_version(1.0))]
#[case::texture_units(matching_level().with_texture_units(1))]
#[case::no_shaders(matching_level().with_shaders(false))]
#[case::no_geometry(matching_level().with_geometry_shaders(false))]
#[case::small_screen(matching_level().with_screen_resolution(640, 480))]
fn test_lowering_one_threshold_keeps_support(#[case] lowered: SystemFeatureLevel) {
    let registry = gl33_registry("monotonic-lower");
    assert!(registry.is_feature_level_supported(&lowered));
}

#[test]
fn test_geometry_requirement_against_missing_support() {
    let config = GL33_CONFIG.replace(
        "GeometryShadersSupported = true",
        "GeometryShadersSupported = false",
    );
    let registry = config_registry("no-geometry", &config);
    assert!(!registry.is_feature_level_supported(&matching_level()));
    assert!(registry.is_feature_level_supported(&matching_level().with_geometry_shaders(false)));
}

// ============================================================================
// Lookup by name
// ============================================================================

#[test]
fn test_unregistered_level_fails_closed() {
    init_logging();
    let registry = gl33_registry("by-name");
    assert!(!registry.is_feature_level_supported_by_name("nonexistent"));
    assert!(registry.check_feature_level("nonexistent").is_err());

    registry.set_feature_level("reference", matching_level());
    assert!(registry.is_feature_level_supported_by_name("reference"));
    assert!(registry.check_feature_level("reference").unwrap());
}

// ============================================================================
// Fallback chains
// ============================================================================

fn chain_registry() -> CapabilityRegistry {
    let registry = gl33_registry("chains");
    registry.set_feature_level("gl45", SystemFeatureLevel::new().with_gl_version(4.5));
    registry.set_feature_level(
        "huge_screen",
        SystemFeatureLevel::new().with_screen_resolution(7680, 4320),
    );
    registry
}

#[test]
fn test_chain_walks_to_unrestricted_material() {
    init_logging();
    let registry = chain_registry();
    let mut library = MaterialLibrary::new();
    let a = library.add(Material::new("a").with_feature_level("gl45"));
    let b = library.add(Material::new("b").with_feature_level("huge_screen"));
    let c = library.add(Material::new("c"));
    library.set_fallback(a, Some(b)).unwrap();
    library.set_fallback(b, Some(c)).unwrap();

    assert_eq!(library.resolve(a, &registry), Some(c));
    assert_eq!(library.resolve(b, &registry), Some(c));
    assert_eq!(library.resolve(c, &registry), Some(c));
}

#[test]
fn test_exhausted_chain_resolves_to_none() {
    init_logging();
    let registry = chain_registry();
    let mut library = MaterialLibrary::new();
    let a = library.add(Material::new("a").with_feature_level("gl45"));
    let b = library.add(Material::new("b").with_feature_level("huge_screen"));
    library.set_fallback(a, Some(b)).unwrap();

    assert_eq!(library.resolve(a, &registry), None);
}

#[test]
fn test_unknown_level_in_chain_is_skipped() {
    let registry = chain_registry();
    let mut library = MaterialLibrary::new();
    let a = library.add(Material::new("a").with_feature_level("typo"));
    let b = library.add(Material::new("b"));
    library.set_fallback(a, Some(b)).unwrap();

    assert_eq!(library.resolve(a, &registry), Some(b));
}

#[test]
fn test_levels_cleared_by_reset() {
    let registry = chain_registry();
    let mut library = MaterialLibrary::new();
    let a = library.add(Material::new("a").with_feature_level("gl45"));
    registry.set_feature_level("gl45", SystemFeatureLevel::new());
    assert_eq!(library.resolve(a, &registry), Some(a));

    registry.reset();
    assert_eq!(library.resolve(a, &registry), None);
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_end_to_end_scenario() {
    init_logging();
    let registry = gl33_registry("end-to-end");

    let r1 = SystemFeatureLevel::new()
        .with_gl_version(2.0)
        .with_glsl_version(1.2)
        .with_texture_units(4)
        .with_texture_coord_units(2)
        .with_shaders(true)
        .with_geometry_shaders(false)
        .with_screen_resolution(640, 480);
    let r2 = SystemFeatureLevel {
        gl_version: 4.5,
        ..r1.clone()
    };
    assert!(registry.is_feature_level_supported(&r1));
    assert!(!registry.is_feature_level_supported(&r2));

    registry.set_feature_level("R1", r1);
    registry.set_feature_level("R2", r2);

    let mut library = MaterialLibrary::new();
    let basic = library.add(Material::new("basic").with_feature_level("R1"));
    let advanced = library.add(Material::new("advanced").with_feature_level("R2"));
    library.set_fallback(advanced, Some(basic)).unwrap();

    let resolved = library.resolve(advanced, &registry);
    assert_eq!(resolved, Some(basic));
    assert_eq!(library.get(basic).map(|m| m.name.as_str()), Some("basic"));
}
