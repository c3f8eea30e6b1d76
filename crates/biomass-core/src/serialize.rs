//! Binary world snapshots via `bitcode`, behind a versioned header.
//!
//! The registry is static content and is not part of a snapshot; the caller
//! supplies it again on load. Listeners are not serialized either and must
//! be re-registered afterwards.

use crate::critter::{Critter, Meal};
use crate::event::EventBus;
use crate::id::CritterId;
use crate::registry::SpeciesRegistry;
use crate::sim::{SimState, TickCadence};
use crate::world::World;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// Magic number identifying a world snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xB10_A55;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("critter {0:?} belongs to a species missing from the registry")]
    UnknownSpecies(CritterId),
}

/// Prepended to every snapshot so format and version can be checked before
/// the payload is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick at which the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WorldSnapshot {
    header: SnapshotHeader,
    sim_state: SimState,
    cadence: TickCadence,
    critters: SlotMap<CritterId, Critter>,
    meals: Vec<(CritterId, Meal)>,
    last_state_hash: u64,
}

/// Decode only far enough to report the header.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    let snapshot: WorldSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

impl World {
    /// Serialize every critter, queued meal and the sim state.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = WorldSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            sim_state: self.sim_state.clone(),
            cadence: self.cadence,
            critters: self.critters.clone(),
            meals: self.meals.clone(),
            last_state_hash: self.last_state_hash,
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Rebuild a world from a snapshot against `registry`.
    ///
    /// Critter ids survive the round trip. The event bus starts empty.
    pub fn deserialize(data: &[u8], registry: SpeciesRegistry) -> Result<Self, DeserializeError> {
        let snapshot: WorldSnapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;

        if let Some((id, _)) = snapshot
            .critters
            .iter()
            .find(|(_, c)| registry.get_species(c.species).is_none())
        {
            return Err(DeserializeError::UnknownSpecies(id));
        }

        Ok(World {
            registry,
            critters: snapshot.critters,
            sim_state: snapshot.sim_state,
            cadence: snapshot.cadence,
            meals: snapshot.meals,
            event_bus: EventBus::default(),
            last_state_hash: snapshot.last_state_hash,
        })
    }
}
