//! Backend abstraction layer
//!
//! Provides the traits the capability system drives plus the dummy and wgpu
//! implementations.

pub mod dummy;
pub mod traits;
pub mod types;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub use dummy::{DummyBackend, DummyDriver, DummyScreens, DummyStats};
pub use traits::*;
pub use types::*;

#[cfg(feature = "wgpu-backend")]
pub use wgpu_backend::WgpuBackend;
