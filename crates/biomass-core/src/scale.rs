//! Rendered-size multiplier from body mass.
//!
//! A saturating growth curve: at or below the baseline mass the critter
//! renders at `scale_at_baseline`; at `max_multiple` times the baseline and
//! beyond it renders at `scale_at_max_multiple`; in between the scale is
//! interpolated linearly. The mapper only reads mass.

use crate::fixed::{Fixed64, Kg, MASS_FLOOR, clamp01, div_or_zero, lerp};
use serde::{Deserialize, Serialize};

/// Smallest accepted `max_multiple` (1 + 2^-16).
const MIN_MAX_MULTIPLE: Fixed64 = Fixed64::from_bits((1 << 32) + (1 << 16));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualScaleMapper {
    pub scale_at_baseline: Fixed64,
    pub scale_at_max_multiple: Fixed64,
    /// Mass multiple of the baseline at which growth saturates.
    pub max_multiple: Fixed64,
}

impl Default for VisualScaleMapper {
    fn default() -> Self {
        Self {
            scale_at_baseline: Fixed64::ONE,
            scale_at_max_multiple: Fixed64::from_num(2),
            max_multiple: Fixed64::from_num(4),
        }
    }
}

impl VisualScaleMapper {
    pub fn new(scale_at_baseline: Fixed64, scale_at_max_multiple: Fixed64, max_multiple: Fixed64) -> Self {
        Self {
            scale_at_baseline,
            scale_at_max_multiple,
            max_multiple,
        }
    }

    /// Scale for a critter of `current_mass` whose baseline is `baseline_mass`.
    pub fn scale(&self, current_mass: Kg, baseline_mass: Kg) -> Fixed64 {
        let baseline = baseline_mass.max(MASS_FLOOR);
        let max_multiple = self.max_multiple.max(MIN_MAX_MULTIPLE);

        // A ratio too large for the fixed-point range is past saturation.
        let multiple = current_mass
            .checked_div(baseline)
            .unwrap_or(Fixed64::MAX)
            .clamp(Fixed64::ONE, max_multiple);
        let t = clamp01(div_or_zero(multiple - Fixed64::ONE, max_multiple - Fixed64::ONE));
        lerp(self.scale_at_baseline, self.scale_at_max_multiple, t)
    }
}
