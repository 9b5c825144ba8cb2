//! Resource management
//!
//! Materials and the fallback chains that pick one the hardware can render.

mod material;

pub use material::*;
