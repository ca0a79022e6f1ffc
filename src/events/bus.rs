//! Event Bus - central hub for simulation events
//!
//! The step system emits what happened each frame; the headless runner and
//! the database logger drain it. Nothing in the physics reads from the bus.

use bevy::prelude::*;

use super::types::SimEvent;

/// Timestamped event for the event bus
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Time in milliseconds since the session started
    pub time_ms: u32,
    pub event: SimEvent,
}

/// Central event bus
#[derive(Resource, Default)]
pub struct EventBus {
    /// Events emitted since the last drain
    pending: Vec<BusEvent>,

    /// Events that have been drained (kept for logging)
    processed: Vec<BusEvent>,

    /// Current elapsed time in milliseconds (for timestamping)
    elapsed_ms: u32,

    enabled: bool,
}

impl EventBus {
    /// Create a new enabled event bus
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Create a disabled event bus (events are dropped)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Update the elapsed time (called each frame)
    pub fn update_time(&mut self, elapsed_secs: f32) {
        self.elapsed_ms = (elapsed_secs * 1000.0) as u32;
    }

    pub fn emit(&mut self, event: SimEvent) {
        if !self.enabled {
            return;
        }
        self.pending.push(BusEvent {
            time_ms: self.elapsed_ms,
            event,
        });
    }

    /// Drain pending events, moving them to processed
    pub fn drain(&mut self) -> Vec<BusEvent> {
        let events = std::mem::take(&mut self.pending);
        self.processed.extend(events.clone());
        events
    }

    pub fn processed(&self) -> &[BusEvent] {
        &self.processed
    }

    pub fn clear_processed(&mut self) {
        self.processed.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Export pending events as (time_ms, SimEvent) tuples
    pub fn export_events(&mut self) -> Vec<(u32, SimEvent)> {
        self.drain()
            .into_iter()
            .map(|e| (e.time_ms, e.event))
            .collect()
    }
}

/// System to update the event bus time each frame
pub fn update_event_bus_time(mut bus: ResMut<EventBus>, time: Res<Time>) {
    bus.update_time(time.elapsed_secs());
}
