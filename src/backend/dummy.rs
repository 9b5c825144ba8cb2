//! Dummy graphics backend for testing and headless use.
//!
//! This backend never touches a GPU. Its answers come from a scripted
//! [`DummyDriver`], so capability gathering and trait negotiation can be
//! exercised without graphics hardware.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::traits::*;
use crate::backend::types::*;

/// Scripted driver description answered by [`DummyBackend`].
#[derive(Debug, Clone)]
pub struct DummyDriver {
    /// When false every context creation is rejected (no GPU)
    pub available: bool,
    pub vendor: Option<String>,
    pub renderer: Option<String>,
    pub version: Option<String>,
    pub glsl_version: Option<String>,
    pub extensions: Vec<String>,
    pub integers: HashMap<GlInteger, Vec<i32>>,
    pub stereo: bool,
    pub accepts_double_buffer: bool,
    pub accepts_quad_buffer: bool,
    /// Exact depth sizes accepted, 0 is always accepted
    pub depth_bits: Vec<u32>,
    pub stencil_bits: Vec<u32>,
    pub sample_counts: Vec<u32>,
    /// Panic inside `create_context` whenever multisampling is requested
    pub panic_on_multisample: bool,
}

impl DummyDriver {
    /// OpenGL 3.3 class driver with NVIDIA memory counters.
    pub fn modern() -> Self {
        let integers = [
            (GlInteger::MaxTextureSize, 16384),
            (GlInteger::MaxTextureUnits, 4),
            (GlInteger::MaxTextureImageUnits, 32),
            (GlInteger::MaxVertexTextureImageUnits, 32),
            (GlInteger::MaxGeometryTextureImageUnits, 32),
            (GlInteger::MaxCombinedTextureImageUnits, 192),
            (GlInteger::MaxTextureCoords, 8),
            (GlInteger::MaxSamples, 8),
            (GlInteger::GpuMemoryInfoDedicatedVidmemNvx, 4_194_304),
            (GlInteger::GpuMemoryInfoTotalAvailableMemoryNvx, 4_194_304),
            (GlInteger::GpuMemoryInfoCurrentAvailableVidmemNvx, 3_800_000),
        ]
        .into_iter()
        .map(|(pname, value)| (pname, vec![value]))
        .collect();

        Self {
            available: true,
            vendor: Some("NVIDIA Corporation".to_string()),
            renderer: Some("Dummy GeForce".to_string()),
            version: Some("3.3.0 NVIDIA 535.54".to_string()),
            glsl_version: Some("3.30 NVIDIA via Cg compiler".to_string()),
            extensions: [
                "GL_ARB_multisample",
                "GL_ARB_shading_language_100",
                "GL_ARB_shader_objects",
                "GL_ARB_vertex_shader",
                "GL_ARB_fragment_shader",
                "GL_EXT_gpu_shader4",
                "GL_ARB_geometry_shader4",
                "GL_ARB_texture_non_power_of_two",
                "GL_ARB_texture_rectangle",
                "GL_ARB_framebuffer_object",
                "GL_NVX_gpu_memory_info",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            integers,
            stereo: false,
            accepts_double_buffer: true,
            accepts_quad_buffer: false,
            depth_bits: vec![16, 24],
            stencil_bits: vec![8],
            sample_counts: vec![2, 4, 8],
            panic_on_multisample: false,
        }
    }

    /// OpenGL 1.x class driver without shaders.
    pub fn legacy() -> Self {
        let integers = [
            (GlInteger::MaxTextureSize, 1024),
            (GlInteger::MaxTextureUnits, 2),
        ]
        .into_iter()
        .map(|(pname, value)| (pname, vec![value]))
        .collect();

        Self {
            available: true,
            vendor: Some("Legacy Graphics".to_string()),
            renderer: Some("Dummy Rage".to_string()),
            version: Some("1.4.0".to_string()),
            glsl_version: None,
            extensions: vec!["GL_EXT_texture_rectangle".to_string()],
            integers,
            stereo: false,
            accepts_double_buffer: true,
            accepts_quad_buffer: false,
            depth_bits: vec![16],
            stencil_bits: Vec::new(),
            sample_counts: Vec::new(),
            panic_on_multisample: false,
        }
    }

    /// No GPU at all: every context is rejected.
    pub fn headless() -> Self {
        Self {
            available: false,
            ..Self::legacy()
        }
    }

    pub fn with_extension(mut self, name: &str) -> Self {
        self.extensions.push(name.to_string());
        self
    }

    pub fn with_integer(mut self, pname: GlInteger, values: &[i32]) -> Self {
        self.integers.insert(pname, values.to_vec());
        self
    }

    fn accepts(&self, traits: &ContextTraits) -> Result<(), String> {
        if !self.available {
            return Err("no display available".to_string());
        }
        if traits.double_buffer && !self.accepts_double_buffer {
            return Err("double buffering unsupported".to_string());
        }
        if traits.quad_buffer_stereo && !self.accepts_quad_buffer {
            return Err("quad-buffer stereo unsupported".to_string());
        }
        if traits.depth_bits != 0 && !self.depth_bits.contains(&traits.depth_bits) {
            return Err(format!("{} depth bits unsupported", traits.depth_bits));
        }
        if traits.stencil_bits != 0 && !self.stencil_bits.contains(&traits.stencil_bits) {
            return Err(format!("{} stencil bits unsupported", traits.stencil_bits));
        }
        if traits.samples != 0 && !self.sample_counts.contains(&traits.samples) {
            return Err(format!("{} samples unsupported", traits.samples));
        }
        Ok(())
    }
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::modern()
    }
}

/// Counters recorded by a [`DummyBackend`], shared so tests can inspect them
/// after the backend moved into a registry.
#[derive(Debug, Default)]
pub struct DummyStats {
    /// Every trait set passed to `create_context`, in order
    pub attempts: Vec<ContextTraits>,
    pub live_contexts: usize,
    pub frames: usize,
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    driver: DummyDriver,
    contexts: HashMap<ContextHandle, ContextTraits>,
    next_handle: u64,
    stats: Arc<Mutex<DummyStats>>,
}

impl DummyBackend {
    /// Create a dummy backend answering with `driver`.
    pub fn new(driver: DummyDriver) -> Self {
        Self {
            driver,
            contexts: HashMap::new(),
            next_handle: 1,
            stats: Arc::new(Mutex::new(DummyStats::default())),
        }
    }

    pub fn driver(&self) -> &DummyDriver {
        &self.driver
    }

    /// Shared handle to the recorded counters.
    pub fn stats(&self) -> Arc<Mutex<DummyStats>> {
        Arc::clone(&self.stats)
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new(DummyDriver::modern())
    }
}

impl GraphicsBackend for DummyBackend {
    fn name(&self) -> &str {
        "Dummy Backend"
    }

    fn create_context(&mut self, traits: &ContextTraits) -> BackendResult<ContextHandle> {
        self.stats.lock().attempts.push(traits.clone());

        if self.driver.panic_on_multisample && traits.samples > 0 {
            panic!("DummyBackend: driver crashed on {} samples", traits.samples);
        }

        if let Err(reason) = self.driver.accepts(traits) {
            log::trace!("DummyBackend: rejecting context: {}", reason);
            return Err(BackendError::ContextRejected(reason));
        }

        let handle = ContextHandle(self.next_handle);
        self.next_handle += 1;
        self.contexts.insert(handle, traits.clone());
        self.stats.lock().live_contexts += 1;
        log::trace!("DummyBackend: created context {:?}", handle);
        Ok(handle)
    }

    fn release_context(&mut self, context: ContextHandle) {
        if self.contexts.remove(&context).is_some() {
            self.stats.lock().live_contexts -= 1;
        }
    }

    fn run_one_frame(
        &mut self,
        context: ContextHandle,
        callback: &mut dyn FnMut(&dyn GlQuery),
    ) -> BackendResult<()> {
        let traits = self
            .contexts
            .get(&context)
            .ok_or(BackendError::UnknownContext(context))?;

        let query = DummyQuery {
            driver: &self.driver,
            traits,
        };
        callback(&query);
        self.stats.lock().frames += 1;
        Ok(())
    }
}

/// Query view over the scripted driver for the current context
struct DummyQuery<'a> {
    driver: &'a DummyDriver,
    traits: &'a ContextTraits,
}

impl GlQuery for DummyQuery<'_> {
    fn is_extension_supported(&self, name: &str) -> bool {
        self.driver.extensions.iter().any(|ext| ext == name)
    }

    fn get_integer(&self, pname: GlInteger) -> Option<i32> {
        match pname {
            GlInteger::StencilBits => Some(self.traits.stencil_bits as i32),
            GlInteger::DepthBits => Some(self.traits.depth_bits as i32),
            _ => self.driver.integers.get(&pname).and_then(|v| v.first().copied()),
        }
    }

    fn get_integer_array(&self, pname: GlInteger, count: usize) -> Option<Vec<i32>> {
        let values = self.driver.integers.get(&pname)?;
        let mut out = values.clone();
        out.resize(count.max(1), 0);
        Some(out)
    }

    fn get_string(&self, pname: GlString) -> Option<String> {
        match pname {
            GlString::Vendor => self.driver.vendor.clone(),
            GlString::Renderer => self.driver.renderer.clone(),
            GlString::Version => self.driver.version.clone(),
            GlString::ShadingLanguageVersion => self.driver.glsl_version.clone(),
            GlString::Extensions => Some(self.driver.extensions.join(" ")),
        }
    }

    fn get_boolean(&self, pname: GlBoolean) -> Option<bool> {
        match pname {
            GlBoolean::Stereo => Some(self.driver.stereo && self.traits.quad_buffer_stereo),
            GlBoolean::DoubleBuffer => Some(self.traits.double_buffer),
        }
    }
}

/// Fixed screen list for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct DummyScreens {
    screens: Vec<ScreenInfo>,
}

impl DummyScreens {
    pub fn new(screens: Vec<ScreenInfo>) -> Self {
        Self { screens }
    }

    /// A single screen of the given size at 60Hz, 24 bits
    pub fn single(width: u32, height: u32) -> Self {
        Self::new(vec![ScreenInfo {
            width,
            height,
            refresh_rate: 60.0,
            color_depth: 24,
        }])
    }
}

impl Windowing for DummyScreens {
    fn screen_count(&self) -> Option<usize> {
        Some(self.screens.len())
    }

    fn screen(&self, index: usize) -> Option<ScreenInfo> {
        self.screens.get(index).copied()
    }
}
