//! Capability gathering, feature levels and fallback resolution

pub mod config;
pub mod feature_level;
pub mod memory;
pub mod negotiate;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod screen;
pub mod snapshot;

pub use config::CapabilityOverrides;
pub use feature_level::{Shortfall, SystemFeatureLevel};
pub use memory::{AtiMemInfo, MemoryInfoProvider, NvxMemoryInfo};
pub use negotiate::{NegotiatedTraits, SearchPolicy, SearchState, TraitNegotiator, TraitRequests};
pub use probe::GlProbeResult;
pub use registry::CapabilityRegistry;
pub use resolver::{link_shortfalls, resolve, FallbackChain};
pub use screen::ScreenDensity;
pub use snapshot::{CapabilitySnapshot, GpuMemoryInfo};
