//! Trial-and-error discovery of the context traits a driver accepts.
//!
//! There is no portable query for "which depth/stencil/multisample
//! configurations will this driver give me", so each candidate is tested by
//! creating a throwaway context. Searches assume acceptance is monotonic: if
//! N bits fail, some smaller value is tried next and 0 (no buffer) always
//! works.

use std::panic::{self, AssertUnwindSafe};

use crate::backend::{ContextTraits, GraphicsBackend};

/// How the next candidate is chosen after a rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPolicy {
    /// Subtract a fixed step (depth buffers come in 8-bit increments)
    Decrement(u32),
    /// Halve the candidate, then drop from 1 to 0
    Halve,
}

impl SearchPolicy {
    fn next(self, candidate: u32) -> u32 {
        match self {
            SearchPolicy::Decrement(step) => candidate.saturating_sub(step.max(1)),
            SearchPolicy::Halve => candidate / 2,
        }
    }
}

/// State of one numeric trait search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    pub candidate: u32,
    pub floor: u32,
    pub policy: SearchPolicy,
}

impl SearchState {
    pub fn new(start: u32, policy: SearchPolicy) -> Self {
        Self {
            candidate: start,
            floor: 0,
            policy,
        }
    }

    /// Run the search to completion.
    ///
    /// `accept` is only called for non-zero candidates; the result is always
    /// within `[floor, start]`, or `floor` when nothing above it is accepted.
    pub fn run(mut self, mut accept: impl FnMut(u32) -> bool) -> u32 {
        while self.candidate > self.floor {
            if accept(self.candidate) {
                return self.candidate;
            }
            let next = self.policy.next(self.candidate);
            log::debug!(
                "Candidate {} rejected, trying {}",
                self.candidate,
                next.max(self.floor)
            );
            self.candidate = next.max(self.floor);
        }
        self.floor
    }
}

/// Starting points for the numeric searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraitRequests {
    pub depth_bits: u32,
    pub stencil_bits: u32,
    pub samples: u32,
}

impl Default for TraitRequests {
    fn default() -> Self {
        Self {
            depth_bits: 24,
            stencil_bits: 8,
            samples: 8,
        }
    }
}

/// Best accepted trait combination found by [`TraitNegotiator::negotiate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedTraits {
    pub traits: ContextTraits,
    pub double_buffer: bool,
    pub quad_buffer_stereo: bool,
    pub depth_bits: u32,
    pub stencil_bits: u32,
    pub samples: u32,
}

impl NegotiatedTraits {
    /// Buffers the negotiated context really has (1, 2 or 4)
    pub fn tested_buffers(&self) -> u32 {
        self.traits.buffer_count()
    }
}

/// Drives context-creation probes against a backend
pub struct TraitNegotiator<'a> {
    backend: &'a mut dyn GraphicsBackend,
    depth_policy: SearchPolicy,
    stencil_policy: SearchPolicy,
    samples_policy: SearchPolicy,
}

impl<'a> TraitNegotiator<'a> {
    pub fn new(backend: &'a mut dyn GraphicsBackend) -> Self {
        Self {
            backend,
            depth_policy: SearchPolicy::Decrement(8),
            stencil_policy: SearchPolicy::Halve,
            samples_policy: SearchPolicy::Halve,
        }
    }

    pub fn with_depth_policy(mut self, policy: SearchPolicy) -> Self {
        self.depth_policy = policy;
        self
    }

    pub fn with_stencil_policy(mut self, policy: SearchPolicy) -> Self {
        self.stencil_policy = policy;
        self
    }

    pub fn with_samples_policy(mut self, policy: SearchPolicy) -> Self {
        self.samples_policy = policy;
        self
    }

    /// Try to create a context with `traits` and release it straight away.
    ///
    /// Any backend error or panic counts as rejection.
    pub fn probe(&mut self, traits: &ContextTraits) -> bool {
        let backend = &mut *self.backend;
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            match backend.create_context(traits) {
                Ok(context) => {
                    backend.release_context(context);
                    true
                }
                Err(e) => {
                    log::trace!("Context probe rejected: {}", e);
                    false
                }
            }
        }));

        match result {
            Ok(accepted) => accepted,
            Err(_) => {
                log::warn!(
                    "Backend '{}' panicked while probing {:?}, treating as rejected",
                    self.backend.name(),
                    traits
                );
                false
            }
        }
    }

    /// Search the largest accepted depth size starting at `start`
    pub fn find_depth_bits(&mut self, base: &ContextTraits, start: u32) -> u32 {
        let policy = self.depth_policy;
        let mut candidate = base.clone();
        SearchState::new(start, policy).run(|bits| {
            candidate.depth_bits = bits;
            self.probe(&candidate)
        })
    }

    /// Search the largest accepted stencil size starting at `start`
    pub fn find_stencil_bits(&mut self, base: &ContextTraits, start: u32) -> u32 {
        let policy = self.stencil_policy;
        let mut candidate = base.clone();
        SearchState::new(start, policy).run(|bits| {
            candidate.stencil_bits = bits;
            self.probe(&candidate)
        })
    }

    /// Search the largest accepted multisample count starting at `start`
    pub fn find_samples(&mut self, base: &ContextTraits, start: u32) -> u32 {
        let policy = self.samples_policy;
        let mut candidate = base.clone();
        SearchState::new(start, policy).run(|samples| {
            candidate.samples = samples;
            self.probe(&candidate)
        })
    }

    /// Run the full sequence: double buffer, quad-buffer stereo (only once
    /// double buffering is confirmed), depth, stencil, multisampling. Each
    /// step builds on the traits accepted by the previous ones.
    pub fn negotiate(&mut self, baseline: &ContextTraits, requests: TraitRequests) -> NegotiatedTraits {
        let mut traits = baseline.clone();

        let mut candidate = traits.clone();
        candidate.double_buffer = true;
        let double_buffer = self.probe(&candidate);
        if double_buffer {
            traits = candidate;
        }
        log::debug!("Double buffering: {}", double_buffer);

        let mut quad_buffer_stereo = false;
        if double_buffer {
            let mut candidate = traits.clone();
            candidate.quad_buffer_stereo = true;
            quad_buffer_stereo = self.probe(&candidate);
            if quad_buffer_stereo {
                traits = candidate;
            }
        }
        log::debug!("Quad-buffer stereo: {}", quad_buffer_stereo);

        traits.depth_bits = self.find_depth_bits(&traits, requests.depth_bits);
        log::debug!("Depth bits: {}", traits.depth_bits);

        traits.stencil_bits = self.find_stencil_bits(&traits, requests.stencil_bits);
        log::debug!("Stencil bits: {}", traits.stencil_bits);

        traits.samples = self.find_samples(&traits, requests.samples);
        log::debug!("Samples: {}", traits.samples);

        NegotiatedTraits {
            double_buffer,
            quad_buffer_stereo,
            depth_bits: traits.depth_bits,
            stencil_bits: traits.stencil_bits,
            samples: traits.samples,
            traits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, DummyDriver};

    #[test]
    fn test_decrement_search_steps_by_eight() {
        let mut tried = Vec::new();
        let found = SearchState::new(24, SearchPolicy::Decrement(8)).run(|bits| {
            tried.push(bits);
            bits <= 8
        });
        assert_eq!(found, 8);
        assert_eq!(tried, vec![24, 16, 8]);
    }

    #[test]
    fn test_halving_search() {
        let mut tried = Vec::new();
        let found = SearchState::new(8, SearchPolicy::Halve).run(|samples| {
            tried.push(samples);
            false
        });
        assert_eq!(found, 0);
        assert_eq!(tried, vec![8, 4, 2, 1]);
    }

    #[test]
    fn test_zero_is_never_probed() {
        let found = SearchState::new(0, SearchPolicy::Halve).run(|_| panic!("probed zero"));
        assert_eq!(found, 0);
    }

    #[test]
    fn test_decrement_handles_non_multiple_start() {
        let mut tried = Vec::new();
        let found = SearchState::new(20, SearchPolicy::Decrement(8)).run(|bits| {
            tried.push(bits);
            false
        });
        assert_eq!(found, 0);
        assert_eq!(tried, vec![20, 12, 4]);
    }

    #[test]
    fn test_negotiate_modern_driver() {
        let mut backend = DummyBackend::new(DummyDriver::modern());
        let stats = backend.stats();
        let negotiated = TraitNegotiator::new(&mut backend)
            .negotiate(&ContextTraits::baseline("test"), TraitRequests::default());

        assert!(negotiated.double_buffer);
        assert!(!negotiated.quad_buffer_stereo);
        assert_eq!(negotiated.depth_bits, 24);
        assert_eq!(negotiated.stencil_bits, 8);
        assert_eq!(negotiated.samples, 8);
        assert_eq!(negotiated.tested_buffers(), 2);
        assert_eq!(stats.lock().live_contexts, 0);
    }

    #[test]
    fn test_quad_buffer_skipped_without_double_buffer() {
        let mut driver = DummyDriver::modern();
        driver.accepts_double_buffer = false;
        driver.accepts_quad_buffer = true;
        let mut backend = DummyBackend::new(driver);
        let stats = backend.stats();

        let negotiated = TraitNegotiator::new(&mut backend)
            .negotiate(&ContextTraits::baseline("test"), TraitRequests::default());

        assert!(!negotiated.double_buffer);
        assert!(!negotiated.quad_buffer_stereo);
        assert!(stats
            .lock()
            .attempts
            .iter()
            .all(|traits| !traits.quad_buffer_stereo));
    }

    #[test]
    fn test_probe_order() {
        let mut backend = DummyBackend::new(DummyDriver::modern());
        let stats = backend.stats();
        TraitNegotiator::new(&mut backend)
            .negotiate(&ContextTraits::baseline("test"), TraitRequests::default());

        let attempts = stats.lock().attempts.clone();
        assert!(attempts[0].double_buffer && !attempts[0].quad_buffer_stereo);
        assert!(attempts[1].quad_buffer_stereo);
        let first_depth = attempts.iter().position(|t| t.depth_bits > 0).unwrap();
        let first_stencil = attempts.iter().position(|t| t.stencil_bits > 0).unwrap();
        let first_samples = attempts.iter().position(|t| t.samples > 0).unwrap();
        assert!(first_depth < first_stencil && first_stencil < first_samples);
    }

    #[test]
    fn test_panicking_probe_is_contained() {
        let mut driver = DummyDriver::modern();
        driver.panic_on_multisample = true;
        let mut backend = DummyBackend::new(driver);

        let negotiated = TraitNegotiator::new(&mut backend)
            .negotiate(&ContextTraits::baseline("test"), TraitRequests::default());

        assert_eq!(negotiated.samples, 0);
        assert_eq!(negotiated.depth_bits, 24);
    }

    #[test]
    fn test_headless_negotiation_degrades_to_baseline() {
        let mut backend = DummyBackend::new(DummyDriver::headless());
        let negotiated = TraitNegotiator::new(&mut backend)
            .negotiate(&ContextTraits::baseline("test"), TraitRequests::default());

        assert!(!negotiated.double_buffer);
        assert_eq!(negotiated.depth_bits, 0);
        assert_eq!(negotiated.stencil_bits, 0);
        assert_eq!(negotiated.samples, 0);
        assert_eq!(negotiated.tested_buffers(), 1);
    }
}
