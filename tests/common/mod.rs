//! Shared helpers for the capability integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use hogbox_caps::backend::{DummyBackend, DummyDriver, DummyScreens};
use hogbox_caps::{CapabilityRegistry, GatherStrategy, RegistryConfig};

/// Route `log` output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scripted drivers used across the tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Modern,
    Legacy,
    Headless,
}

impl Driver {
    pub fn dummy(self) -> DummyDriver {
        match self {
            Driver::Modern => DummyDriver::modern(),
            Driver::Legacy => DummyDriver::legacy(),
            Driver::Headless => DummyDriver::headless(),
        }
    }
}

pub fn config(gather: GatherStrategy) -> RegistryConfig {
    RegistryConfig {
        gather,
        log_report: false,
        ..Default::default()
    }
}

/// Registry over a dummy driver with one 1920x1080 screen.
pub fn registry(gather: GatherStrategy, driver: DummyDriver) -> CapabilityRegistry {
    CapabilityRegistry::new(
        config(gather),
        DummyBackend::new(driver),
        DummyScreens::single(1920, 1080),
    )
}

static NEXT_CONFIG: AtomicUsize = AtomicUsize::new(0);

/// Write `contents` to a fresh file under the system temp directory.
pub fn write_config(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("hogbox-caps-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!(
        "{}-{}-{}.toml",
        name,
        std::process::id(),
        NEXT_CONFIG.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Registry whose snapshot comes only from `contents`.
pub fn config_registry(name: &str, contents: &str) -> CapabilityRegistry {
    let config = RegistryConfig {
        overrides_path: Some(write_config(name, contents)),
        ..config(GatherStrategy::Config)
    };
    CapabilityRegistry::new(
        config,
        DummyBackend::new(DummyDriver::headless()),
        DummyScreens::single(1920, 1080),
    )
}

/// Capabilities of the reference OpenGL 3.3 machine.
pub const GL33_CONFIG: &str = r#"
GLVersion = 3.3
GLSLVersion = 3.3
GLSLSupported = true
ShaderObjectsSupported = true
VertexShadersSupported = true
FragmentShadersSupported = true
GeometryShadersSupported = true
MaxTextureUnits = 8
MaxTotalTextureUnits = 16
MaxTextureCoordUnits = 8
"#;
