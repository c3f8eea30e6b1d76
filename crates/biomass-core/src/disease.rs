//! Disease payloads carried alongside a mass of substance.
//!
//! Two payloads merge by keeping the disease with the larger count. When both
//! carry the same disease their counts add up.

use crate::fixed::Fixed64;
use crate::id::DiseaseId;
use serde::{Deserialize, Serialize};

/// A disease and the number of germs carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiseasePayload {
    pub id: DiseaseId,
    pub count: u32,
}

impl DiseasePayload {
    /// The payload carried by clean material.
    pub const NONE: DiseasePayload = DiseasePayload {
        id: DiseaseId::NONE,
        count: 0,
    };

    /// Build a payload. A `NONE` id or a zero count collapses to [`Self::NONE`].
    pub fn new(id: DiseaseId, count: u32) -> Self {
        if id.is_none() || count == 0 {
            Self::NONE
        } else {
            Self { id, count }
        }
    }

    pub fn is_empty(self) -> bool {
        self.id.is_none() || self.count == 0
    }

    /// Combine two payloads.
    ///
    /// - same disease: counts are summed (saturating)
    /// - one side empty: the other side is kept
    /// - different diseases: the larger count wins with its own count;
    ///   a tie keeps `self`
    pub fn merge(self, other: DiseasePayload) -> DiseasePayload {
        if other.is_empty() {
            return if self.is_empty() { Self::NONE } else { self };
        }
        if self.is_empty() {
            return other;
        }
        if self.id == other.id {
            return Self {
                id: self.id,
                count: self.count.saturating_add(other.count),
            };
        }
        if other.count > self.count { other } else { self }
    }

    /// The share of this payload carried by `fraction` of its mass.
    /// Counts round down; the fraction is clamped to `[0, 1]`.
    pub fn apportion(self, fraction: Fixed64) -> DiseasePayload {
        if self.is_empty() {
            return Self::NONE;
        }
        let fraction = crate::fixed::clamp01(fraction);
        let scaled = Fixed64::saturating_from_num(self.count).saturating_mul(fraction);
        Self::new(self.id, scaled.to_num::<u32>())
    }
}
