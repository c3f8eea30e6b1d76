//! Tick bookkeeping: the step counter, the two update cadences and the
//! desync hash.
//!
//! The host advances the world one tick at a time. Seeking runs on the
//! frequent cadence; ambient intake and automatic flushing run on the
//! infrequent one.

use crate::fixed::{Fixed64, Ticks};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

/// How often each update group runs, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCadence {
    /// Wall-clock length of one tick.
    pub millis_per_tick: u32,
    pub frequent_every: Ticks,
    pub infrequent_every: Ticks,
}

impl Default for TickCadence {
    /// 200 ms ticks; seeking every tick, intake and flushing once a second.
    fn default() -> Self {
        Self {
            millis_per_tick: 200,
            frequent_every: 1,
            infrequent_every: 5,
        }
    }
}

impl TickCadence {
    pub fn is_frequent(&self, tick: Ticks) -> bool {
        tick % self.frequent_every.max(1) == 0
    }

    pub fn is_infrequent(&self, tick: Ticks) -> bool {
        tick % self.infrequent_every.max(1) == 0
    }

    /// Simulated seconds covered by one infrequent update.
    pub fn infrequent_seconds(&self) -> Fixed64 {
        let millis = self
            .infrequent_every
            .max(1)
            .saturating_mul(u64::from(self.millis_per_tick));
        Fixed64::saturating_from_num(millis) / Fixed64::from_num(1000)
    }
}

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Number of completed steps.
    pub tick: Ticks,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// FNV-1a (64-bit) digest of world state, for desync detection between
/// replicas stepping the same inputs. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cadence_runs_infrequent_once_a_second() {
        let cadence = TickCadence::default();
        assert!(cadence.is_frequent(3));
        assert!(cadence.is_infrequent(0));
        assert!(!cadence.is_infrequent(4));
        assert!(cadence.is_infrequent(10));
        assert_eq!(cadence.infrequent_seconds(), Fixed64::ONE);
    }

    #[test]
    fn zero_intervals_behave_as_every_tick() {
        let cadence = TickCadence {
            millis_per_tick: 500,
            frequent_every: 0,
            infrequent_every: 0,
        };
        assert!(cadence.is_frequent(7));
        assert!(cadence.is_infrequent(7));
        assert_eq!(cadence.infrequent_seconds(), Fixed64::from_num(0.5));
    }

    #[test]
    fn state_hash_is_deterministic_and_order_sensitive() {
        let mut a = StateHash::new();
        a.write_u32(1);
        a.write_fixed64(Fixed64::from_num(2.5));

        let mut b = StateHash::new();
        b.write_u32(1);
        b.write_fixed64(Fixed64::from_num(2.5));
        assert_eq!(a.finish(), b.finish());

        let mut c = StateHash::new();
        c.write_fixed64(Fixed64::from_num(2.5));
        c.write_u32(1);
        assert_ne!(a.finish(), c.finish());
    }
}
