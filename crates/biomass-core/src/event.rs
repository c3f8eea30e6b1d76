//! Typed events with per-kind ring buffers.
//!
//! The world emits events while it steps and delivers them in one batch at
//! the end of the step. Each kind has its own [`EventBuffer`]; a suppressed
//! kind is never buffered at all.

use crate::fixed::{Kg, Ticks};
use crate::id::{CritterId, SpeciesKey, SubstanceTag};
use crate::seeking::AbortReason;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something that happened to a critter. Every event carries its tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Mass --
    MealApplied {
        critter: CritterId,
        food: SubstanceTag,
        gained: Kg,
        tick: Ticks,
    },

    // -- Conversion --
    FuelWithdrawn {
        critter: CritterId,
        substance: SubstanceTag,
        mass: Kg,
        tick: Ticks,
    },
    OutputCredited {
        critter: CritterId,
        output: SubstanceTag,
        mass: Kg,
        tick: Ticks,
    },
    IntakeResumeRequested {
        critter: CritterId,
        tick: Ticks,
    },
    OutputsFlushed {
        critter: CritterId,
        outputs: u32,
        mass: Kg,
        tick: Ticks,
    },

    // -- Seeking --
    SeekStarted {
        critter: CritterId,
        substance: SubstanceTag,
        tick: Ticks,
    },
    SeekAborted {
        critter: CritterId,
        reason: AbortReason,
        tick: Ticks,
    },
    BiteTaken {
        critter: CritterId,
        substance: SubstanceTag,
        mass: Kg,
        tick: Ticks,
    },

    // -- Lifecycle --
    CritterSpawned {
        critter: CritterId,
        species: SpeciesKey,
        tick: Ticks,
    },
    CritterDespawned {
        critter: CritterId,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MealApplied,
    FuelWithdrawn,
    OutputCredited,
    IntakeResumeRequested,
    OutputsFlushed,
    SeekStarted,
    SeekAborted,
    BiteTaken,
    CritterSpawned,
    CritterDespawned,
}

const EVENT_KIND_COUNT: usize = 10;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::MealApplied { .. } => EventKind::MealApplied,
            Event::FuelWithdrawn { .. } => EventKind::FuelWithdrawn,
            Event::OutputCredited { .. } => EventKind::OutputCredited,
            Event::IntakeResumeRequested { .. } => EventKind::IntakeResumeRequested,
            Event::OutputsFlushed { .. } => EventKind::OutputsFlushed,
            Event::SeekStarted { .. } => EventKind::SeekStarted,
            Event::SeekAborted { .. } => EventKind::SeekAborted,
            Event::BiteTaken { .. } => EventKind::BiteTaken,
            Event::CritterSpawned { .. } => EventKind::CritterSpawned,
            Event::CritterDespawned { .. } => EventKind::CritterDespawned,
        }
    }

    /// The critter the event concerns.
    pub fn critter(&self) -> CritterId {
        match *self {
            Event::MealApplied { critter, .. }
            | Event::FuelWithdrawn { critter, .. }
            | Event::OutputCredited { critter, .. }
            | Event::IntakeResumeRequested { critter, .. }
            | Event::OutputsFlushed { critter, .. }
            | Event::SeekStarted { critter, .. }
            | Event::SeekAborted { critter, .. }
            | Event::BiteTaken { critter, .. }
            | Event::CritterSpawned { critter, .. }
            | Event::CritterDespawned { critter, .. } => critter,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring buffer. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write position; also the oldest entry once the buffer is full.
    head: usize,
    len: usize,
    /// Events ever written, dropped ones included.
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events pushed out because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() { 0 } else { self.head };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    pub fn clear(&mut self) {
        self.events.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A read-only observer of delivered events.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Optional predicate narrowing what a listener receives.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Delivery order among listeners of one kind. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct ListenerEntry {
    listener: PassiveListener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("priority", &self.priority)
            .field("filtered", &self.filter.is_some())
            .field("insertion_order", &self.insertion_order)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// One ring buffer per event kind, plus listeners and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// `default_capacity` sizes each kind's buffer on first emit.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Stop recording a kind and drop anything already buffered for it.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Buffer an event. No-op for suppressed kinds.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Listen with `Normal` priority and no filter.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.on_passive_filtered(kind, SubscriberPriority::Normal, None, listener);
    }

    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        let insertion_order = self.next_insertion_order;
        self.next_insertion_order += 1;
        let entries = &mut self.listeners[kind.index()];
        entries.push(ListenerEntry {
            listener,
            priority,
            filter,
            insertion_order,
        });
        entries.sort_by_key(|e| (e.priority, e.insertion_order));
    }

    /// Hand every buffered event to its listeners, then clear the buffers.
    ///
    /// Kinds are visited in declaration order; within a kind, listeners run
    /// by `(priority, registration order)` and each sees events oldest first.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            let events: Vec<Event> = buffer.iter().cloned().collect();
            buffer.clear();

            for entry in &mut self.listeners[idx] {
                for event in &events {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, EventBuffer::len)
    }

    /// Events ever emitted for a kind, dropped ones included.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind).map_or(0, EventBuffer::total_written)
    }

    /// Clear all buffers. Listeners and suppression stay.
    pub fn clear_all(&mut self) {
        self.buffers.iter_mut().flatten().for_each(EventBuffer::clear);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed64;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn critter() -> CritterId {
        let mut sm = SlotMap::<CritterId, ()>::with_key();
        sm.insert(())
    }

    fn meal(critter: CritterId, tick: Ticks) -> Event {
        Event::MealApplied {
            critter,
            food: SubstanceTag(0),
            gained: Fixed64::ONE,
            tick,
        }
    }

    #[test]
    fn ring_buffer_keeps_newest() {
        let mut buf = EventBuffer::new(3);
        let id = critter();
        for tick in 0..5 {
            buf.push(meal(id, tick));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.dropped_count(), 2);
        let ticks: Vec<Ticks> = buf
            .iter()
            .map(|e| match e {
                Event::MealApplied { tick, .. } => *tick,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buf = EventBuffer::new(0);
        buf.push(meal(critter(), 1));
        buf.push(meal(critter(), 2));
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn suppressed_kind_is_not_buffered() {
        let mut bus = EventBus::new(8);
        bus.emit(meal(critter(), 0));
        bus.suppress(EventKind::MealApplied);
        assert!(bus.buffer(EventKind::MealApplied).is_none());
        bus.emit(meal(critter(), 1));
        assert_eq!(bus.buffered_count(EventKind::MealApplied), 0);

        bus.unsuppress(EventKind::MealApplied);
        bus.emit(meal(critter(), 2));
        assert_eq!(bus.buffered_count(EventKind::MealApplied), 1);
    }

    #[test]
    fn deliver_runs_listeners_by_priority_then_clears() {
        let mut bus = EventBus::new(8);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (label, priority) in [
            ("post", SubscriberPriority::Post),
            ("normal", SubscriberPriority::Normal),
            ("pre", SubscriberPriority::Pre),
        ] {
            let log = Rc::clone(&log);
            bus.on_passive_filtered(
                EventKind::MealApplied,
                priority,
                None,
                Box::new(move |_| log.borrow_mut().push(label)),
            );
        }

        bus.emit(meal(critter(), 0));
        bus.deliver();
        assert_eq!(*log.borrow(), vec!["pre", "normal", "post"]);
        assert_eq!(bus.buffered_count(EventKind::MealApplied), 0);
        assert_eq!(bus.total_emitted(EventKind::MealApplied), 1);

        bus.deliver();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn filter_limits_delivery() {
        let mut bus = EventBus::new(8);
        let seen = Rc::new(RefCell::new(0u32));
        let seen_in = Rc::clone(&seen);
        bus.on_passive_filtered(
            EventKind::MealApplied,
            SubscriberPriority::Normal,
            Some(Box::new(|e| matches!(e, Event::MealApplied { tick, .. } if *tick >= 5))),
            Box::new(move |_| *seen_in.borrow_mut() += 1),
        );
        for tick in 0..10 {
            bus.emit(meal(critter(), tick));
        }
        bus.deliver();
        assert_eq!(*seen.borrow(), 5);
    }

    #[test]
    fn kinds_are_independent() {
        let mut bus = EventBus::new(8);
        let id = critter();
        bus.emit(meal(id, 0));
        bus.emit(Event::CritterDespawned { critter: id, tick: 0 });
        assert_eq!(bus.buffered_count(EventKind::MealApplied), 1);
        assert_eq!(bus.buffered_count(EventKind::CritterDespawned), 1);
        assert_eq!(bus.buffered_count(EventKind::OutputsFlushed), 0);
        bus.clear_all();
        assert_eq!(bus.buffered_count(EventKind::MealApplied), 0);
    }

    #[test]
    fn event_reports_its_critter() {
        let id = critter();
        assert_eq!(meal(id, 3).critter(), id);
        assert_eq!(meal(id, 3).kind(), EventKind::MealApplied);
    }
}
