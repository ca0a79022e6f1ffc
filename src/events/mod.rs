//! Simulation event logging
//!
//! Provides a compact text format for logging what the simulator does each
//! frame. Used by the headless runner, the scenario runner and the SQLite
//! store.

mod bus;
mod format;
mod types;

pub use bus::{BusEvent, EventBus, update_event_bus_time};
pub use format::{parse_event, serialize_event};
pub use types::{SimConfigSnapshot, SimEvent};
