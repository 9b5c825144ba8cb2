//! The process-wide capability registry.
//!
//! A [`CapabilityRegistry`] is built once by the application and handed to
//! whatever needs capability data. The snapshot is gathered lazily on first
//! access, under a write lock, so concurrent first readers wait for one
//! complete gather instead of racing it.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use glam::UVec2;
use parking_lot::{Mutex, RwLock};

use crate::backend::{
    ContextHandle, ContextTraits, DummyBackend, DummyDriver, GraphicsBackend, NoWindowing,
    ScreenInfo, Windowing,
};
use crate::caps::config::CapabilityOverrides;
use crate::caps::feature_level::{Shortfall, SystemFeatureLevel};
use crate::caps::memory::{default_providers, read_gpu_memory, MemoryInfoProvider};
use crate::caps::negotiate::TraitNegotiator;
use crate::caps::probe::{gather_gl_info, GlProbeResult};
use crate::caps::screen::ScreenDensity;
use crate::caps::snapshot::{CapabilitySnapshot, GpuMemoryInfo};
use crate::error::{CapsError, CapsResult};
use crate::{GatherStrategy, RegistryConfig};

/// Capability registry: one snapshot plus the named feature levels.
pub struct CapabilityRegistry {
    config: RegistryConfig,
    backend: Mutex<Box<dyn GraphicsBackend + Send>>,
    windowing: Box<dyn Windowing>,
    memory_providers: Vec<Box<dyn MemoryInfoProvider + Send + Sync>>,
    snapshot: RwLock<Option<Arc<CapabilitySnapshot>>>,
    feature_levels: RwLock<HashMap<String, Arc<SystemFeatureLevel>>>,
}

impl CapabilityRegistry {
    /// Create a registry. Nothing is probed until the first [`snapshot`](Self::snapshot).
    pub fn new(
        config: RegistryConfig,
        backend: impl GraphicsBackend + Send + 'static,
        windowing: impl Windowing + 'static,
    ) -> Self {
        Self {
            config,
            backend: Mutex::new(Box::new(backend)),
            windowing: Box::new(windowing),
            memory_providers: default_providers(),
            snapshot: RwLock::new(None),
            feature_levels: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with no GPU and no windowing, for the config and defaults
    /// strategies.
    pub fn without_gpu(config: RegistryConfig) -> Self {
        Self::new(config, DummyBackend::new(DummyDriver::headless()), NoWindowing)
    }

    /// Replace the GPU memory providers, tried in order
    pub fn with_memory_providers(
        mut self,
        providers: Vec<Box<dyn MemoryInfoProvider + Send + Sync>>,
    ) -> Self {
        self.memory_providers = providers;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn gather_strategy(&self) -> GatherStrategy {
        self.config.gather
    }

    /// Whether a snapshot has been gathered since creation or the last reset
    pub fn is_initialized(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// The capability snapshot, gathered on first call.
    pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
        if let Some(snapshot) = self.snapshot.read().as_ref() {
            return Arc::clone(snapshot);
        }

        let mut slot = self.snapshot.write();
        if let Some(snapshot) = slot.as_ref() {
            return Arc::clone(snapshot);
        }
        let snapshot = Arc::new(self.gather());
        *slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Forget the snapshot and all feature levels; the next access gathers
    /// again. Must not race with readers holding on to feature-level names.
    pub fn reset(&self) {
        *self.snapshot.write() = None;
        self.feature_levels.write().clear();
        log::info!("Capability registry reset");
    }

    fn gather(&self) -> CapabilitySnapshot {
        let strategy = self.config.gather;
        log::info!("Gathering system capabilities ({:?})", strategy);

        let mut snapshot = match strategy {
            GatherStrategy::Full | GatherStrategy::GlOnly => {
                panic::catch_unwind(AssertUnwindSafe(|| self.gather_live(strategy)))
                    .unwrap_or_else(|_| {
                        log::error!("Capability probe panicked, using default capabilities");
                        CapabilitySnapshot::defaults()
                    })
            }
            GatherStrategy::Config => self.gather_from_config(),
            GatherStrategy::Defaults => CapabilitySnapshot::defaults(),
        };

        if strategy != GatherStrategy::Config {
            if let Some(path) = &self.config.overrides_path {
                match CapabilityOverrides::load(path) {
                    Ok(overrides) => {
                        log::info!("Applying capability overrides from {}", path.display());
                        overrides.apply(&mut snapshot);
                    }
                    Err(e) => log::warn!("{}", e),
                }
            }
        }

        if self.config.log_report {
            snapshot.log_report();
        }
        snapshot
    }

    fn gather_from_config(&self) -> CapabilitySnapshot {
        let mut snapshot = CapabilitySnapshot {
            source: GatherStrategy::Config,
            ..CapabilitySnapshot::defaults()
        };

        let Some(path) = &self.config.overrides_path else {
            log::warn!("Config gather requested without a config path, using defaults");
            return snapshot;
        };
        match CapabilityOverrides::load(path) {
            Ok(overrides) => overrides.apply(&mut snapshot),
            Err(e) => log::warn!("{}, using defaults", e),
        }
        snapshot
    }

    fn gather_live(&self, strategy: GatherStrategy) -> CapabilitySnapshot {
        let mut snapshot = CapabilitySnapshot::defaults();

        let mut guard = self.backend.lock();
        let backend: &mut dyn GraphicsBackend = &mut **guard;
        log::debug!("Probing capabilities with backend '{}'", backend.name());

        let baseline = ContextTraits::baseline(&self.config.window_name);
        let traits = match strategy {
            GatherStrategy::Full => {
                TraitNegotiator::new(&mut *backend)
                    .negotiate(&baseline, self.config.trait_requests())
                    .traits
            }
            _ => ContextTraits {
                double_buffer: true,
                depth_bits: 16,
                stencil_bits: 0,
                samples: 0,
                ..baseline.clone()
            },
        };

        let Some((context, traits)) = create_final_context(backend, traits, &baseline) else {
            log::warn!("No graphics context could be created, using default capabilities");
            return snapshot;
        };

        let mut probe: Option<GlProbeResult> = None;
        if let Err(e) = backend.run_one_frame(context, &mut |gl| probe = Some(gather_gl_info(gl))) {
            log::warn!("Capability frame failed: {}", e);
        }

        let mut memory = GpuMemoryInfo::default();
        let providers = &self.memory_providers;
        if let Err(e) =
            backend.run_one_frame(context, &mut |gl| memory = read_gpu_memory(gl, providers))
        {
            log::warn!("GPU memory frame failed: {}", e);
        }
        backend.release_context(context);

        let Some(probe) = probe else {
            log::warn!("Capability frame produced no results, using default capabilities");
            return snapshot;
        };

        probe.apply_to(&mut snapshot);
        snapshot.source = strategy;
        snapshot.double_buffer_supported = traits.double_buffer;
        snapshot.tested_buffers = traits.buffer_count();
        snapshot.max_depth_bits = traits.depth_bits;
        snapshot.max_stencil_bits = traits.stencil_bits;
        snapshot.max_samples = traits.samples;
        snapshot.multisampling_supported = probe.multisample_extension && traits.samples > 0;
        snapshot.memory = memory;
        snapshot
    }

    // Screen data is only as fresh as the Windowing implementation keeps it.

    pub fn screen_count(&self) -> Option<usize> {
        self.windowing.screen_count()
    }

    pub fn screen(&self, index: usize) -> Option<ScreenInfo> {
        self.windowing.screen(index)
    }

    pub fn screen_resolution(&self, index: usize) -> Option<UVec2> {
        self.screen(index)
            .map(|screen| UVec2::new(screen.width, screen.height))
    }

    pub fn screen_refresh_rate(&self, index: usize) -> Option<f32> {
        self.screen(index).map(|screen| screen.refresh_rate)
    }

    pub fn screen_color_depth(&self, index: usize) -> Option<u32> {
        self.screen(index).map(|screen| screen.color_depth)
    }

    pub fn primary_screen_resolution(&self) -> Option<UVec2> {
        self.screen_resolution(0)
    }

    pub fn screen_density(&self) -> ScreenDensity {
        ScreenDensity::classify(self.primary_screen_resolution())
    }

    /// Register a feature level, replacing any level of the same name
    pub fn set_feature_level(&self, name: &str, level: SystemFeatureLevel) {
        let previous = self
            .feature_levels
            .write()
            .insert(name.to_string(), Arc::new(level));
        if previous.is_some() {
            log::debug!("Feature level '{}' replaced", name);
        }
    }

    pub fn feature_level(&self, name: &str) -> Option<Arc<SystemFeatureLevel>> {
        self.feature_levels.read().get(name).cloned()
    }

    /// Registered feature level names, sorted
    pub fn feature_level_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.feature_levels.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Requirements of `level` this system fails to meet
    pub fn feature_level_shortfalls(&self, level: &SystemFeatureLevel) -> Vec<Shortfall> {
        level.shortfalls(&self.snapshot(), self.primary_screen_resolution())
    }

    pub fn is_feature_level_supported(&self, level: &SystemFeatureLevel) -> bool {
        self.feature_level_shortfalls(level).is_empty()
    }

    /// Check a registered feature level, erroring when `name` is unknown
    pub fn check_feature_level(&self, name: &str) -> CapsResult<bool> {
        let level = self
            .feature_level(name)
            .ok_or_else(|| CapsError::UnknownFeatureLevel(name.to_string()))?;
        Ok(self.is_feature_level_supported(&level))
    }

    /// Check a registered feature level; an unknown name is reported and
    /// counts as unsupported.
    pub fn is_feature_level_supported_by_name(&self, name: &str) -> bool {
        match self.check_feature_level(name) {
            Ok(supported) => supported,
            Err(e) => {
                log::warn!("{}, treating as unsupported", e);
                false
            }
        }
    }
}

/// Create the context the probe frames run on, dropping back to the bare
/// baseline when the negotiated traits are refused this time.
fn create_final_context(
    backend: &mut dyn GraphicsBackend,
    traits: ContextTraits,
    baseline: &ContextTraits,
) -> Option<(ContextHandle, ContextTraits)> {
    match backend.create_context(&traits) {
        Ok(context) => return Some((context, traits)),
        Err(e) => log::warn!("Context with negotiated traits failed: {}", e),
    }
    if traits == *baseline {
        return None;
    }
    match backend.create_context(baseline) {
        Ok(context) => Some((context, baseline.clone())),
        Err(e) => {
            log::warn!("Baseline context failed: {}", e);
            None
        }
    }
}
