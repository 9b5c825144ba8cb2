//! Screen density buckets

use glam::{UVec2, Vec2};

/// Reference resolution below which a screen counts as low density
const LOW_DENSITY_REFERENCE: Vec2 = Vec2::new(480.0, 800.0);
/// Reference resolution below which a screen counts as medium density
const MEDIUM_DENSITY_REFERENCE: Vec2 = Vec2::new(540.0, 960.0);

/// Coarse pixel density of the primary screen, used to pick asset variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenDensity {
    #[default]
    Low,
    Medium,
    High,
}

impl ScreenDensity {
    /// Classify by resolution diagonal. No or empty resolution is `Low`.
    pub fn classify(resolution: Option<UVec2>) -> Self {
        let Some(resolution) = resolution.filter(|r| r.x > 0 && r.y > 0) else {
            return ScreenDensity::Low;
        };

        let diagonal = resolution.as_vec2().length();
        if diagonal <= LOW_DENSITY_REFERENCE.length() {
            ScreenDensity::Low
        } else if diagonal <= MEDIUM_DENSITY_REFERENCE.length() {
            ScreenDensity::Medium
        } else {
            ScreenDensity::High
        }
    }
}
