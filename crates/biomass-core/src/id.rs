use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies one live critter in the [`World`](crate::world::World).
    pub struct CritterId;
}

/// Identifies a substance, food or output type. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubstanceTag(pub u32);

impl SubstanceTag {
    /// Never assigned by the registry; marks "no substance".
    pub const INVALID: SubstanceTag = SubstanceTag(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Identifies a species (prefab) in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesKey(pub u32);

/// Identifies a disease carried by a mass of substance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiseaseId(pub u8);

impl DiseaseId {
    /// Sentinel for "no disease".
    pub const NONE: DiseaseId = DiseaseId(u8::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl Default for DiseaseId {
    fn default() -> Self {
        Self::NONE
    }
}
