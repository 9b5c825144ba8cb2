//! Core backend abstraction traits
//!
//! These traits describe everything the capability system needs from the host
//! graphics engine: trial context creation, one-frame execution with a query
//! hook, and the windowing system's screen list.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to initialize backend: {0}")]
    InitializationFailed(String),
    #[error("Context rejected: {0}")]
    ContextRejected(String),
    #[error("Unknown context handle {0:?}")]
    UnknownContext(ContextHandle),
    #[error("Frame failed: {0}")]
    FrameFailed(String),
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Low-level driver queries available while a context is current.
///
/// Only ever handed out from inside [`GraphicsBackend::run_one_frame`].
pub trait GlQuery {
    /// Check whether the driver advertises an extension
    fn is_extension_supported(&self, name: &str) -> bool;

    /// Query a single integer, `None` if the driver doesn't know `pname`
    fn get_integer(&self, pname: GlInteger) -> Option<i32>;

    /// Query an integer vector of `count` values
    fn get_integer_array(&self, pname: GlInteger, count: usize) -> Option<Vec<i32>> {
        let first = self.get_integer(pname)?;
        let mut values = vec![0; count.max(1)];
        values[0] = first;
        Some(values)
    }

    /// Query a driver string
    fn get_string(&self, pname: GlString) -> Option<String>;

    /// Query a boolean state value
    fn get_boolean(&self, pname: GlBoolean) -> Option<bool>;
}

/// Main graphics backend trait
pub trait GraphicsBackend {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Try to create a context with exactly the requested traits.
    ///
    /// Rejection is reported as [`BackendError::ContextRejected`] and has no
    /// other side effects.
    fn create_context(&mut self, traits: &ContextTraits) -> BackendResult<ContextHandle>;

    /// Destroy a context created by this backend
    fn release_context(&mut self, context: ContextHandle);

    /// Execute exactly one frame with `context` current, invoking `callback`
    /// before returning.
    fn run_one_frame(
        &mut self,
        context: ContextHandle,
        callback: &mut dyn FnMut(&dyn GlQuery),
    ) -> BackendResult<()>;
}

/// Properties of one attached screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    /// Refresh rate in Hz, 0 if the platform doesn't report one
    pub refresh_rate: f32,
    /// Bits per pixel, 0 if the platform doesn't report one
    pub color_depth: u32,
}

/// Windowing-system screen enumeration.
///
/// `None` means "unknown": either no windowing interface exists or the index
/// is out of range.
pub trait Windowing: Send + Sync {
    fn screen_count(&self) -> Option<usize>;

    fn screen(&self, index: usize) -> Option<ScreenInfo>;
}

/// Windowing stand-in for headless processes
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWindowing;

impl Windowing for NoWindowing {
    fn screen_count(&self) -> Option<usize> {
        None
    }

    fn screen(&self, _index: usize) -> Option<ScreenInfo> {
        None
    }
}
