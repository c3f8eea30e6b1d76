//! The critter store and its tick pipeline.
//!
//! Each [`World::step`] runs five phases in order:
//!
//! 1. **Meals** -- apply every meal queued since the last step.
//! 2. **Seeking** -- on the frequent cadence, advance each critter's
//!    acquire-and-bite state machine.
//! 3. **Intake and flush** -- on the infrequent cadence, absorb ambient fuel,
//!    then drain critters whose pending output reached their flush threshold.
//! 4. **Delivery** -- hand buffered events to listeners.
//! 5. **Bookkeeping** -- advance the tick counter and recompute the state hash.
//!
//! Meals always land before a same-tick flush reads the accumulator.

use crate::accumulator::DrainedOutput;
use crate::critter::{Critter, Meal, MealOutcome};
use crate::disease::DiseasePayload;
use crate::drops::{DropEntry, ResolvedDrop};
use crate::event::{Event, EventBus, EventKind, PassiveListener};
use crate::fixed::{Fixed64, Kelvin, Kg, Ticks};
use crate::id::{CritterId, SpeciesKey, SubstanceTag};
use crate::intake::AmbientSource;
use crate::ledger::MassMode;
use crate::registry::SpeciesRegistry;
use crate::seeking::{ForageContext, SeekEvent};
use crate::sim::{SimState, StateHash, TickCadence};
use crate::storage::FuelStore;
use slotmap::SlotMap;
use tracing::{debug, trace, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("unknown critter: {0:?}")]
    UnknownCritter(CritterId),
    #[error("unknown species: {0:?}")]
    UnknownSpecies(SpeciesKey),
}

/// Outputs drained automatically during a step, per critter.
#[derive(Debug, Default)]
pub struct StepReport {
    pub flushed: Vec<(CritterId, Vec<DrainedOutput>)>,
}

pub struct World {
    pub(crate) registry: SpeciesRegistry,
    pub(crate) critters: SlotMap<CritterId, Critter>,
    pub(crate) sim_state: SimState,
    pub(crate) cadence: TickCadence,
    /// Meals reported since the last step, in arrival order.
    pub(crate) meals: Vec<(CritterId, Meal)>,
    pub(crate) event_bus: EventBus,
    pub(crate) last_state_hash: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("critters", &self.critters.len())
            .field("tick", &self.sim_state.tick)
            .field("queued_meals", &self.meals.len())
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new(registry: SpeciesRegistry) -> Self {
        Self::with_cadence(registry, TickCadence::default())
    }

    pub fn with_cadence(registry: SpeciesRegistry, cadence: TickCadence) -> Self {
        Self {
            registry,
            critters: SlotMap::with_key(),
            sim_state: SimState::new(),
            cadence,
            meals: Vec::new(),
            event_bus: EventBus::default(),
            last_state_hash: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn spawn(&mut self, species: SpeciesKey) -> Result<CritterId, WorldError> {
        let def = self
            .registry
            .get_species(species)
            .ok_or(WorldError::UnknownSpecies(species))?;
        let critter = self.critters.insert(Critter::spawn(species, def));
        self.event_bus.emit(Event::CritterSpawned {
            critter,
            species,
            tick: self.sim_state.tick,
        });
        Ok(critter)
    }

    /// Remove a critter. Meals still queued for it are dropped at the next step.
    pub fn despawn(&mut self, id: CritterId) -> Result<Critter, WorldError> {
        let critter = self.critters.remove(id).ok_or(WorldError::UnknownCritter(id))?;
        self.event_bus.emit(Event::CritterDespawned {
            critter: id,
            tick: self.sim_state.tick,
        });
        Ok(critter)
    }

    // -----------------------------------------------------------------------
    // Inbound: consumption
    // -----------------------------------------------------------------------

    /// Queue a meal for the next step. Meals for unknown critters are ignored.
    pub fn on_main_food_consumed(&mut self, id: CritterId, meal: Meal) {
        self.meals.push((id, meal));
    }

    /// Apply a meal immediately, outside the step pipeline.
    pub fn apply_meal_now(&mut self, id: CritterId, meal: Meal) -> Result<MealOutcome, WorldError> {
        self.apply_meal(id, &meal).ok_or(WorldError::UnknownCritter(id))
    }

    fn apply_meal(&mut self, id: CritterId, meal: &Meal) -> Option<MealOutcome> {
        let critter = self.critters.get_mut(id)?;
        let def = self.registry.get_species(critter.species)?;
        let outcome = critter.apply_meal(def, meal);

        let tick = self.sim_state.tick;
        self.event_bus.emit(Event::MealApplied {
            critter: id,
            food: meal.food,
            gained: outcome.gained,
            tick,
        });
        for &(substance, mass) in &outcome.conversion.withdrawn {
            self.event_bus.emit(Event::FuelWithdrawn {
                critter: id,
                substance,
                mass,
                tick,
            });
        }
        for &(output, mass) in &outcome.conversion.credited {
            self.event_bus.emit(Event::OutputCredited {
                critter: id,
                output,
                mass,
                tick,
            });
        }
        if outcome.conversion.resume_intake() {
            self.event_bus.emit(Event::IntakeResumeRequested { critter: id, tick });
        }
        Some(outcome)
    }

    // -----------------------------------------------------------------------
    // Outbound: flush, scale, drops
    // -----------------------------------------------------------------------

    /// Drain a critter's pending outputs for placement in the host world.
    ///
    /// Meals still queued for this critter are applied first, so a flush never
    /// runs ahead of a meal reported before it.
    pub fn on_flush_requested(&mut self, id: CritterId) -> Result<Vec<DrainedOutput>, WorldError> {
        if !self.critters.contains_key(id) {
            return Err(WorldError::UnknownCritter(id));
        }
        self.apply_queued_meals_for(id);
        let critter = self.critters.get_mut(id).ok_or(WorldError::UnknownCritter(id))?;
        let drained = critter.flush();
        Self::emit_flushed(&mut self.event_bus, id, &drained, self.sim_state.tick);
        Ok(drained)
    }

    fn apply_queued_meals_for(&mut self, id: CritterId) {
        if !self.meals.iter().any(|(owner, _)| *owner == id) {
            return;
        }
        let (own, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.meals)
            .into_iter()
            .partition(|(owner, _)| *owner == id);
        self.meals = rest;
        for (_, meal) in own {
            self.apply_meal(id, &meal);
        }
    }

    fn emit_flushed(bus: &mut EventBus, critter: CritterId, drained: &[DrainedOutput], tick: Ticks) {
        if drained.is_empty() {
            return;
        }
        let mass = drained
            .iter()
            .fold(Fixed64::ZERO, |acc, d| acc.saturating_add(d.mass));
        debug!(?critter, outputs = drained.len(), mass = %mass, "outputs flushed");
        bus.emit(Event::OutputsFlushed {
            critter,
            outputs: drained.len() as u32,
            mass,
            tick,
        });
    }

    pub fn visual_scale(&self, id: CritterId) -> Result<Fixed64, WorldError> {
        let critter = self.critter(id)?;
        let def = self
            .registry
            .get_species(critter.species)
            .ok_or(WorldError::UnknownSpecies(critter.species))?;
        Ok(critter.visual_scale(def))
    }

    /// Split `base_yield` into secondary drops: the critter's override if
    /// set, else its species table, else the default entry.
    pub fn resolve_drops(&self, id: CritterId, base_yield: Kg) -> Result<Vec<ResolvedDrop>, WorldError> {
        let critter = self.critter(id)?;
        let drops = self.registry.drops();
        if critter.drop_override.is_none() && !drops.is_registered(critter.species) {
            warn!(
                species = critter.species.0,
                fallback = ?drops.fallback().output,
                "no extra drops registered, using default entry"
            );
        }
        Ok(drops.resolve(critter.species, base_yield, critter.drop_override.as_deref()))
    }

    /// Set or clear a per-critter drop override.
    pub fn set_drop_override(&mut self, id: CritterId, entries: Option<Vec<DropEntry>>) -> Result<(), WorldError> {
        self.critter_mut(id)?.drop_override = entries;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mass management
    // -----------------------------------------------------------------------

    pub fn set_absolute_mass(&mut self, id: CritterId, mass: Kg) -> Result<(), WorldError> {
        self.critter_mut(id)?.ledger.set_absolute_mass(mass);
        Ok(())
    }

    /// Copy `parent`'s body mass and ledger configuration onto `child`.
    pub fn inherit_mass(&mut self, parent: CritterId, child: CritterId, carry_over: bool) -> Result<(), WorldError> {
        let source = self.critter(parent)?.ledger.clone();
        self.critter_mut(child)?.ledger.copy_from(&source, carry_over);
        Ok(())
    }

    pub fn switch_mode(&mut self, id: CritterId, mode: MassMode, keep_current_as_baseline: bool) -> Result<(), WorldError> {
        self.critter_mut(id)?
            .ledger
            .switch_mode(mode, keep_current_as_baseline);
        Ok(())
    }

    /// Put fuel straight into a critter's storage. Returns the overflow.
    pub fn deposit_fuel(
        &mut self,
        id: CritterId,
        substance: SubstanceTag,
        mass: Kg,
        temperature: Kelvin,
        disease: DiseasePayload,
    ) -> Result<Kg, WorldError> {
        Ok(self
            .critter_mut(id)?
            .storage
            .deposit(substance, mass, temperature, disease))
    }

    /// Abandon the critter's current seek attempt.
    pub fn cancel_seeking(&mut self, id: CritterId) -> Result<(), WorldError> {
        let tick = self.sim_state.tick;
        let critter = self.critters.get_mut(id).ok_or(WorldError::UnknownCritter(id))?;
        let Some(def) = self.registry.get_species(critter.species) else {
            return Ok(());
        };
        if let Some(SeekEvent::Aborted { reason, .. }) = critter.seeking.cancel(tick, &def.seeking) {
            self.event_bus.emit(Event::SeekAborted {
                critter: id,
                reason,
                tick,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Run one tick against the host's forage targets and ambient grid.
    pub fn step(&mut self, forage: &mut impl ForageContext, ambient: &mut impl AmbientSource) -> StepReport {
        let tick = self.sim_state.tick;
        let mut report = StepReport::default();

        // Phase 1: Meals.
        for (id, meal) in std::mem::take(&mut self.meals) {
            if self.apply_meal(id, &meal).is_none() {
                debug!(?id, "dropping meal for missing critter");
            }
        }

        // Phase 2: Seeking.
        if self.cadence.is_frequent(tick) {
            self.phase_seeking(tick, forage);
        }

        // Phase 3: Intake, then flush.
        if self.cadence.is_infrequent(tick) {
            self.phase_intake(ambient);
            self.phase_auto_flush(tick, &mut report);
        }

        // Phase 4: Delivery.
        self.event_bus.deliver();

        // Phase 5: Bookkeeping.
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();

        report
    }

    fn phase_seeking(&mut self, tick: Ticks, forage: &mut impl ForageContext) {
        for (id, critter) in &mut self.critters {
            let Some(def) = self.registry.get_species(critter.species) else {
                continue;
            };
            let Some(event) = critter
                .seeking
                .tick(tick, id, &def.diet, &def.seeking, &mut critter.storage, forage)
            else {
                continue;
            };
            match event {
                SeekEvent::Started { substance } => self.event_bus.emit(Event::SeekStarted {
                    critter: id,
                    substance,
                    tick,
                }),
                SeekEvent::Bite { substance, taken } => {
                    trace!(?id, substance = substance.0, kg = %taken, "bite");
                    self.event_bus.emit(Event::BiteTaken {
                        critter: id,
                        substance,
                        mass: taken,
                        tick,
                    })
                }
                SeekEvent::Aborted { reason, .. } => self.event_bus.emit(Event::SeekAborted {
                    critter: id,
                    reason,
                    tick,
                }),
                SeekEvent::TargetAcquired { .. } | SeekEvent::Arrived { .. } | SeekEvent::Reset => {}
            }
        }
    }

    fn phase_intake(&mut self, ambient: &mut impl AmbientSource) {
        let elapsed = self.cadence.infrequent_seconds();
        for (id, critter) in &mut self.critters {
            let Some(def) = self.registry.get_species(critter.species) else {
                continue;
            };
            critter
                .intake
                .tick(id, &def.diet, elapsed, &mut critter.storage, ambient);
        }
    }

    fn phase_auto_flush(&mut self, tick: Ticks, report: &mut StepReport) {
        for (id, critter) in &mut self.critters {
            let Some(def) = self.registry.get_species(critter.species) else {
                continue;
            };
            if !critter.wants_flush(def) {
                continue;
            }
            let drained = critter.flush();
            Self::emit_flushed(&mut self.event_bus, id, &drained, tick);
            report.flushed.push((id, drained));
        }
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        for (_, critter) in &self.critters {
            hash.write_u32(critter.species.0);
            hash.write_fixed64(critter.ledger.current_mass());
            hash.write_fixed64(critter.ledger.starting_mass());
            for stack in critter.storage.stacks() {
                hash.write_u32(stack.substance.0);
                hash.write_fixed64(stack.mass);
            }
            hash.write_fixed64(critter.pending.peek_total_mass());
        }
        hash.finish()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn critter(&self, id: CritterId) -> Result<&Critter, WorldError> {
        self.critters.get(id).ok_or(WorldError::UnknownCritter(id))
    }

    fn critter_mut(&mut self, id: CritterId) -> Result<&mut Critter, WorldError> {
        self.critters.get_mut(id).ok_or(WorldError::UnknownCritter(id))
    }

    pub fn critters(&self) -> impl Iterator<Item = (CritterId, &Critter)> {
        self.critters.iter()
    }

    pub fn critter_count(&self) -> usize {
        self.critters.len()
    }

    pub fn current_mass(&self, id: CritterId) -> Result<Kg, WorldError> {
        Ok(self.critter(id)?.ledger.current_mass())
    }

    pub fn available_fuel(&self, id: CritterId, substance: SubstanceTag) -> Result<Kg, WorldError> {
        Ok(self.critter(id)?.storage.available_mass(substance))
    }

    pub fn pending_output_mass(&self, id: CritterId) -> Result<Kg, WorldError> {
        Ok(self.critter(id)?.pending.peek_total_mass())
    }

    pub fn queued_meal_count(&self) -> usize {
        self.meals.len()
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    pub fn cadence(&self) -> TickCadence {
        self.cadence
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    /// Hash computed at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.event_bus.on_passive(kind, listener);
    }

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn event_bus_mut(&mut self) -> &mut EventBus {
        &mut self.event_bus
    }
}
