//! HogBox capabilities - runtime GPU capability detection and feature levels
//!
//! Probes the graphics driver once, through a throw-away context, and keeps
//! the result as an immutable [`CapabilitySnapshot`]. Rendering techniques
//! declare a [`SystemFeatureLevel`]; materials linked into fallback chains are
//! resolved to the first one the hardware can run.
//!
//! # Backends
//! - **dummy**: scripted driver, used headless and in tests
//! - **wgpu** (feature `wgpu-backend`): answers the same queries from a real adapter
//!
//! # Features
//! - Context trait negotiation (double/quad buffering, depth, stencil, MSAA)
//! - Extension and version gated capability probing
//! - Vendor GPU memory counters
//! - TOML capability overrides
//! - Named feature levels with fallback resolution

pub mod backend;
pub mod caps;
pub mod error;
pub mod resources;
pub mod window;

use std::path::PathBuf;

pub use caps::{
    resolve, CapabilityOverrides, CapabilityRegistry, CapabilitySnapshot, FallbackChain,
    GpuMemoryInfo, ScreenDensity, Shortfall, SystemFeatureLevel, TraitRequests,
};
pub use error::{CapsError, CapsResult};
pub use resources::{Material, MaterialId, MaterialLibrary};
pub use window::WinitScreens;

#[cfg(feature = "wgpu-backend")]
pub use backend::WgpuBackend;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the capability snapshot is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatherStrategy {
    /// Negotiate context traits, then probe the driver
    #[default]
    Full,
    /// Probe the driver on a fixed double-buffered context, no negotiation
    GlOnly,
    /// Read everything from the overrides file, no GPU access
    Config,
    /// Conservative built-in values, no GPU access
    Defaults,
}

/// Configuration for the capability registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Gather strategy
    pub gather: GatherStrategy,
    /// TOML overrides; the whole source for [`GatherStrategy::Config`],
    /// applied on top of the result for every other strategy
    pub overrides_path: Option<PathBuf>,
    /// Depth bits to start the search from
    pub requested_depth_bits: u32,
    /// Stencil bits to start the search from
    pub requested_stencil_bits: u32,
    /// MSAA samples to start the search from
    pub requested_samples: u32,
    /// Log the capability report after gathering
    pub log_report: bool,
    /// Title of the probe context's window
    pub window_name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            gather: GatherStrategy::Full,
            overrides_path: None,
            requested_depth_bits: 24,
            requested_stencil_bits: 8,
            requested_samples: 8,
            log_report: true,
            window_name: "hogbox capability probe".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn trait_requests(&self) -> TraitRequests {
        TraitRequests {
            depth_bits: self.requested_depth_bits,
            stencil_bits: self.requested_stencil_bits,
            samples: self.requested_samples,
        }
    }
}
