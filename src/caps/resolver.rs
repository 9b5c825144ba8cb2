//! Fallback resolution against feature levels.

use std::collections::HashSet;
use std::hash::Hash;

use crate::caps::feature_level::Shortfall;
use crate::caps::registry::CapabilityRegistry;

/// A graph of items that each name an optional feature level and an
/// optional fallback to try when that level is unsupported.
pub trait FallbackChain {
    type Id: Copy + Eq + Hash;

    /// Display name, used in log messages
    fn name(&self, id: Self::Id) -> &str;

    /// Feature level the item needs, `None` when it runs anywhere
    fn feature_level(&self, id: Self::Id) -> Option<&str>;

    fn fallback(&self, id: Self::Id) -> Option<Self::Id>;
}

/// Requirements of the feature level `id` names that this system fails to
/// meet.
///
/// Empty when the item names no level or its level is met. `None` when the
/// named level is not registered.
pub fn link_shortfalls<C: FallbackChain>(
    chain: &C,
    id: C::Id,
    registry: &CapabilityRegistry,
) -> Option<Vec<Shortfall>> {
    match chain.feature_level(id) {
        None => Some(Vec::new()),
        Some(name) => registry
            .feature_level(name)
            .map(|level| registry.feature_level_shortfalls(&level)),
    }
}

fn unmet_reason(level: &str, shortfalls: Option<&[Shortfall]>) -> String {
    match shortfalls {
        Some(shortfalls) => {
            let unmet: Vec<String> = shortfalls.iter().map(ToString::to_string).collect();
            format!("feature level '{}' not met: {}", level, unmet.join("; "))
        }
        None => format!("feature level '{}' is not registered", level),
    }
}

/// Walk the chain from `start` and return the first item whose feature level
/// this system supports.
///
/// Returns `None` when the chain ends, or loops, without a supported item.
pub fn resolve<C: FallbackChain>(
    chain: &C,
    start: C::Id,
    registry: &CapabilityRegistry,
) -> Option<C::Id> {
    let mut visited = HashSet::new();
    let mut current = start;

    loop {
        if !visited.insert(current) {
            log::error!(
                "Fallback chain starting at '{}' loops back to '{}'",
                chain.name(start),
                chain.name(current)
            );
            return None;
        }

        let shortfalls = link_shortfalls(chain, current, registry);
        if shortfalls.as_ref().is_some_and(Vec::is_empty) {
            return Some(current);
        }
        let reason = unmet_reason(
            chain.feature_level(current).unwrap_or_default(),
            shortfalls.as_deref(),
        );

        match chain.fallback(current) {
            Some(next) => {
                log::warn!(
                    "'{}' unusable, {}; falling back to '{}'",
                    chain.name(current),
                    reason,
                    chain.name(next)
                );
                current = next;
            }
            None => {
                log::error!(
                    "No supported fallback for '{}', chain ends at '{}' ({})",
                    chain.name(start),
                    chain.name(current),
                    reason
                );
                return None;
            }
        }
    }
}
