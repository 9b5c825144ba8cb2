//! Capability probe demo.
//!
//! Gathers the system capabilities, prints the report and resolves a small
//! material library against a few feature levels, printing the uniform block
//! each resolved material would upload.
//!
//! ```bash
//! cargo run --example probe
//! cargo run --example probe -- --strategy gl-only
//! cargo run --example probe -- --strategy config --overrides caps.toml
//! cargo run --example probe -- --backend dummy
//! ```

use std::path::PathBuf;

use clap::Parser;
use glam::{Vec3, Vec4};
use winit::event_loop::EventLoop;

use hogbox_caps::backend::{DummyBackend, DummyDriver};
use hogbox_caps::{
    CapabilityRegistry, GatherStrategy, Material, MaterialLibrary, RegistryConfig,
    SystemFeatureLevel, WgpuBackend, WinitScreens,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliStrategy {
    /// Negotiate context traits, then probe
    #[default]
    Full,
    /// Probe on a fixed context
    GlOnly,
    /// Read the overrides file only
    Config,
    /// Built-in conservative values
    Defaults,
}

impl From<CliStrategy> for GatherStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Full => GatherStrategy::Full,
            CliStrategy::GlOnly => GatherStrategy::GlOnly,
            CliStrategy::Config => GatherStrategy::Config,
            CliStrategy::Defaults => GatherStrategy::Defaults,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
enum CliBackend {
    /// Real adapter via wgpu
    #[default]
    Wgpu,
    /// Scripted modern driver, no GPU needed
    Dummy,
}

/// Print the capabilities of this machine.
#[derive(Parser, Debug)]
#[command(name = "probe", version)]
struct Args {
    /// How to gather capabilities.
    #[arg(long, default_value = "full", value_enum)]
    strategy: CliStrategy,

    /// Backend to probe with.
    #[arg(long, default_value = "wgpu", value_enum)]
    backend: CliBackend,

    /// TOML capability overrides.
    #[arg(long)]
    overrides: Option<PathBuf>,
}

fn build_registry(args: &Args, screens: WinitScreens) -> CapabilityRegistry {
    let config = RegistryConfig {
        gather: args.strategy.into(),
        overrides_path: args.overrides.clone(),
        ..Default::default()
    };

    if args.backend == CliBackend::Wgpu {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all());
        match WgpuBackend::new(backends) {
            Ok(backend) => return CapabilityRegistry::new(config, backend, screens),
            Err(e) => log::warn!("wgpu unavailable ({}), using the dummy driver", e),
        }
    }
    CapabilityRegistry::new(config, DummyBackend::new(DummyDriver::modern()), screens)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let screens = match EventLoop::new() {
        Ok(event_loop) => WinitScreens::from_target(&*event_loop),
        Err(e) => {
            log::warn!("No event loop ({}), screens unknown", e);
            WinitScreens::default()
        }
    };

    let registry = build_registry(&args, screens);
    let caps = registry.snapshot();
    println!("{}", caps);
    println!(
        "Primary screen: {:?}, density {:?}",
        registry.primary_screen_resolution(),
        registry.screen_density()
    );

    registry.set_feature_level(
        "gl45",
        SystemFeatureLevel::new()
            .with_gl_version(4.5)
            .with_glsl_version(4.5)
            .with_shaders(true)
            .with_texture_units(16),
    );
    registry.set_feature_level(
        "gl20",
        SystemFeatureLevel::new()
            .with_gl_version(2.0)
            .with_shaders(true),
    );

    let mut library = MaterialLibrary::new();
    let unlit = library.add(Material::unlit(Vec3::splat(0.8)));
    let per_pixel = library.add(
        Material::new("per_pixel")
            .with_shaders("per_pixel.vert", "per_pixel.frag")
            .with_feature_level("gl20"),
    );
    let deferred = library.add(
        Material::new("deferred")
            .with_shaders("deferred.vert", "deferred.frag")
            .with_feature_level("gl45"),
    );
    let glass = library.add(Material::glass());
    let mut refractive = Material::new("refractive_glass")
        .with_base_color(Vec4::new(0.9, 0.95, 1.0, 0.3))
        .with_shaders("refract.vert", "refract.frag")
        .with_feature_level("gl45");
    refractive.transparent = true;
    let refractive = library.add(refractive);

    let linked = library
        .set_fallback(deferred, Some(per_pixel))
        .and_then(|_| library.set_fallback(per_pixel, Some(unlit)))
        .and_then(|_| library.set_fallback(refractive, Some(glass)));
    if let Err(e) = linked {
        log::error!("{}", e);
        return;
    }

    for name in ["deferred", "per_pixel", "unlit", "refractive_glass"] {
        let Some(id) = library.id(name) else {
            continue;
        };
        match library
            .resolve(id, &registry)
            .and_then(|resolved| library.get(resolved))
        {
            Some(material) => {
                let uniforms = material.uniform_data();
                println!(
                    "{} -> {} (color {:?}, flags {:?}, {} uniform bytes)",
                    name,
                    material.name,
                    uniforms.base_color,
                    uniforms.flags,
                    bytemuck::bytes_of(&uniforms).len()
                );
            }
            None => println!("{} -> <none>", name),
        }
    }
}
