//! Biomass Core -- mass accounting and resource conversion for simulated
//! critters.
//!
//! Critters grow from what they eat, burn stored fuel into byproducts, and
//! hand those byproducts back to the host world in batches. Everything runs
//! on deterministic fixed-point arithmetic and never fails on the per-tick
//! hot path: bad input is clamped or ignored, shortages produce less output.
//!
//! # Five-Phase Tick Pipeline
//!
//! Each call to [`world::World::step`] advances the simulation by one tick:
//!
//! 1. **Meals** -- Apply queued "main food consumed" reports.
//! 2. **Seeking** -- Advance acquire-and-bite state machines (frequent cadence).
//! 3. **Intake and flush** -- Absorb ambient fuel, then drain critters whose
//!    pending output reached their threshold (infrequent cadence).
//! 4. **Delivery** -- Hand buffered events to listeners.
//! 5. **Bookkeeping** -- Increment tick counter and compute the state hash.
//!
//! # Key Types
//!
//! - [`ledger::MassLedger`] -- Body mass under one of two accumulation modes.
//! - [`diet::Diet`] -- Fuel inputs and conversion specs for a species.
//! - [`conversion::ConversionEngine`] -- Turns consumption into withdrawals
//!   and output credits, optionally blending inputs richest-first.
//! - [`accumulator::PendingOutputAccumulator`] -- Outputs waiting for a flush.
//! - [`drops::ExtraDropTable`] -- Secondary yields with per-critter overrides.
//! - [`scale::VisualScaleMapper`] -- Saturating render scale from mass.
//! - [`seeking::SeekingStateMachine`] -- Bounded solid-fuel acquisition.
//! - [`registry::SpeciesRegistry`] -- Immutable species table (frozen at startup).
//! - [`world::World`] -- Critter store and pipeline orchestrator.
//! - [`serialize`] -- Versioned snapshots via bitcode.

pub mod accumulator;
pub mod conversion;
pub mod critter;
pub mod diet;
pub mod disease;
pub mod drops;
pub mod event;
pub mod fixed;
pub mod id;
pub mod intake;
pub mod ledger;
pub mod registry;
pub mod scale;
pub mod seeking;
pub mod serialize;
pub mod sim;
pub mod storage;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
