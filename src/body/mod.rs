//! Body module - body records, physics, the simulator and its systems

mod components;
mod physics;
mod simulator;
mod systems;

pub use components::*;
pub use physics::*;
pub use simulator::*;
pub use systems::*;
