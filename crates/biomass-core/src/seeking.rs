//! Acquire-and-bite behavior for solid fuel.
//!
//! A bounded state machine, advanced once per frequent tick:
//!
//! ```text
//! Idle -> Seeking -> Traveling -> Consuming -> Aborted -> Idle
//!            ^  (no target: rescan later)       |
//!            +----------------------------------+
//! ```
//!
//! Every failure (target lost or claimed, unreachable, no progress, travel
//! timeout, out of range) and every normal exit from `Consuming` routes
//! through `Aborted`, which clears the target and waits a short retry delay
//! before going back to `Idle`. Nothing here returns an error.

use crate::diet::Diet;
use crate::fixed::{Fixed64, Kg, Ticks};
use crate::id::{CritterId, SubstanceTag};
use crate::storage::{FuelStorage, Withdrawal};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A resource instance the host world can hand out as a seek target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// Host-side validity of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Valid,
    Destroyed,
    /// Another critter holds the target.
    Claimed,
}

/// Result of one pathing step toward a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelStatus {
    Arrived,
    /// Still moving; `distance` is the remaining path length in cells.
    EnRoute { distance: u32 },
    /// No path this tick. Aborts once it persists past the stuck timeout.
    Unreachable,
}

/// The host world as seen by the seeking behavior.
pub trait ForageContext {
    /// Find a reachable, eligible instance of `substance`.
    fn find_target(&mut self, critter: CritterId, substance: SubstanceTag) -> Option<TargetId>;
    fn target_status(&self, critter: CritterId, target: TargetId) -> TargetStatus;
    fn travel(&mut self, critter: CritterId, target: TargetId) -> TravelStatus;
    fn in_range(&self, critter: CritterId, target: TargetId) -> bool;
    /// Remove up to `requested` kg from the target.
    fn bite(&mut self, critter: CritterId, target: TargetId, requested: Kg) -> Withdrawal;
}

/// Why an attempt ended. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// Storage is full again.
    Satisfied,
    TargetLost,
    TargetClaimed,
    Unreachable,
    /// No path progress for longer than the stuck timeout.
    Stuck,
    /// Travel took longer than the travel timeout.
    TravelTimeout,
    /// The target yielded nothing.
    Exhausted,
    OutOfRange,
    Cancelled,
}

/// Timing and sizing knobs, per species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekingConfig {
    /// Start seeking when a solid input's fill fraction drops below this.
    pub refill_threshold: Fixed64,
    /// Largest single bite.
    pub bite_size: Kg,
    pub travel_timeout: Ticks,
    pub stuck_timeout: Ticks,
    /// Delay between an abort and the next attempt.
    pub retry_delay: Ticks,
    /// Delay between scans when no target is found.
    pub rescan_interval: Ticks,
}

impl Default for SeekingConfig {
    fn default() -> Self {
        Self {
            refill_threshold: Fixed64::from_num(0.5),
            bite_size: Fixed64::ONE,
            travel_timeout: 150,
            stuck_timeout: 25,
            retry_delay: 5,
            rescan_interval: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SeekState {
    #[default]
    Idle,
    Seeking {
        substance: SubstanceTag,
        next_scan_at: Ticks,
    },
    Traveling {
        substance: SubstanceTag,
        target: TargetId,
        started_at: Ticks,
        last_progress_at: Ticks,
        best_distance: u32,
    },
    Consuming {
        substance: SubstanceTag,
        target: TargetId,
    },
    Aborted {
        reason: AbortReason,
        retry_at: Ticks,
    },
}

/// What happened during one tick, for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekEvent {
    Started { substance: SubstanceTag },
    TargetAcquired { substance: SubstanceTag, target: TargetId },
    Arrived { target: TargetId },
    Bite { substance: SubstanceTag, taken: Kg },
    Aborted { reason: AbortReason, retry_at: Ticks },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeekingStateMachine {
    state: SeekState,
}

impl SeekingStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SeekState {
        self.state
    }

    /// The target currently assigned, if any.
    pub fn target(&self) -> Option<TargetId> {
        match self.state {
            SeekState::Traveling { target, .. } | SeekState::Consuming { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Tick at which an aborted attempt may be retried.
    pub fn retry_at(&self) -> Option<Ticks> {
        match self.state {
            SeekState::Aborted { retry_at, .. } => Some(retry_at),
            _ => None,
        }
    }

    /// Abandon the current attempt from outside. No-op while idle or aborted.
    pub fn cancel(&mut self, now: Ticks, config: &SeekingConfig) -> Option<SeekEvent> {
        match self.state {
            SeekState::Idle | SeekState::Aborted { .. } => None,
            _ => Some(self.abort(AbortReason::Cancelled, now, config)),
        }
    }

    /// Advance by one frequent tick.
    pub fn tick(
        &mut self,
        now: Ticks,
        critter: CritterId,
        diet: &Diet,
        config: &SeekingConfig,
        storage: &mut FuelStorage,
        ctx: &mut impl ForageContext,
    ) -> Option<SeekEvent> {
        match self.state {
            SeekState::Idle => {
                let substance = diet
                    .solid_inputs()
                    .map(|spec| spec.substance)
                    .find(|tag| storage.needs_refill(*tag, config.refill_threshold))?;
                self.state = SeekState::Seeking {
                    substance,
                    next_scan_at: now,
                };
                Some(SeekEvent::Started { substance })
            }

            SeekState::Seeking {
                substance,
                next_scan_at,
            } => {
                if !storage.needs_refill(substance, config.refill_threshold) {
                    self.state = SeekState::Idle;
                    return Some(SeekEvent::Reset);
                }
                if now < next_scan_at {
                    return None;
                }
                match ctx.find_target(critter, substance) {
                    Some(target) => {
                        self.state = SeekState::Traveling {
                            substance,
                            target,
                            started_at: now,
                            last_progress_at: now,
                            best_distance: u32::MAX,
                        };
                        Some(SeekEvent::TargetAcquired { substance, target })
                    }
                    None => {
                        trace!(?critter, substance = substance.0, "no forage target, rescanning later");
                        self.state = SeekState::Seeking {
                            substance,
                            next_scan_at: now + config.rescan_interval.max(1),
                        };
                        None
                    }
                }
            }

            SeekState::Traveling {
                substance,
                target,
                started_at,
                mut last_progress_at,
                mut best_distance,
            } => {
                if let Some(reason) = status_failure(ctx.target_status(critter, target)) {
                    return Some(self.abort(reason, now, config));
                }
                match ctx.travel(critter, target) {
                    TravelStatus::Arrived => {
                        self.state = SeekState::Consuming { substance, target };
                        Some(SeekEvent::Arrived { target })
                    }
                    TravelStatus::Unreachable => {
                        if now.saturating_sub(last_progress_at) > config.stuck_timeout {
                            return Some(self.abort(AbortReason::Unreachable, now, config));
                        }
                        None
                    }
                    TravelStatus::EnRoute { distance } => {
                        if distance < best_distance {
                            best_distance = distance;
                            last_progress_at = now;
                        }
                        if now.saturating_sub(started_at) > config.travel_timeout {
                            return Some(self.abort(AbortReason::TravelTimeout, now, config));
                        }
                        if now.saturating_sub(last_progress_at) > config.stuck_timeout {
                            return Some(self.abort(AbortReason::Stuck, now, config));
                        }
                        self.state = SeekState::Traveling {
                            substance,
                            target,
                            started_at,
                            last_progress_at,
                            best_distance,
                        };
                        None
                    }
                }
            }

            SeekState::Consuming { substance, target } => {
                if let Some(reason) = status_failure(ctx.target_status(critter, target)) {
                    return Some(self.abort(reason, now, config));
                }
                if storage.is_full(substance) {
                    return Some(self.abort(AbortReason::Satisfied, now, config));
                }
                if !ctx.in_range(critter, target) {
                    return Some(self.abort(AbortReason::OutOfRange, now, config));
                }

                let requested = config.bite_size.min(storage.remaining_capacity(substance));
                let bite = ctx.bite(critter, target, requested);
                if bite.is_empty() {
                    return Some(self.abort(AbortReason::Exhausted, now, config));
                }
                let temperature = bite.temperature.unwrap_or(crate::fixed::FALLBACK_TEMPERATURE);
                let taken = bite.taken.min(requested);
                let overflow = storage.deposit(substance, taken, temperature, bite.disease);
                Some(SeekEvent::Bite {
                    substance,
                    taken: taken - overflow,
                })
            }

            SeekState::Aborted { retry_at, .. } => {
                if now >= retry_at {
                    self.state = SeekState::Idle;
                    Some(SeekEvent::Reset)
                } else {
                    None
                }
            }
        }
    }

    fn abort(&mut self, reason: AbortReason, now: Ticks, config: &SeekingConfig) -> SeekEvent {
        let retry_at = now + config.retry_delay.max(1);
        debug!(?reason, retry_at, "seek attempt aborted");
        self.state = SeekState::Aborted { reason, retry_at };
        SeekEvent::Aborted { reason, retry_at }
    }
}

fn status_failure(status: TargetStatus) -> Option<AbortReason> {
    match status {
        TargetStatus::Valid => None,
        TargetStatus::Destroyed => Some(AbortReason::TargetLost),
        TargetStatus::Claimed => Some(AbortReason::TargetClaimed),
    }
}
