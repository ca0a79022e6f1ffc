//! Bevy systems around the Body Simulator

use bevy::prelude::*;

use crate::body::components::{BodyIndex, StepReport};
use crate::body::simulator::BodySimulator;
use crate::events::{EventBus, SimEvent};
use crate::input::ControllerInputs;

/// Report from the most recent simulator frame
#[derive(Resource, Default, Debug)]
pub struct LastStepReport(pub StepReport);

/// Advance the simulator by this frame's (scaled) delta.
/// Reads the controller pair captured earlier in the frame.
pub fn step_bodies(
    time: Res<Time>,
    inputs: Res<ControllerInputs>,
    mut sim: ResMut<BodySimulator>,
    mut bus: ResMut<EventBus>,
    mut last: ResMut<LastStepReport>,
) {
    let dt = time.delta_secs() * sim.tuning().time_scale;
    let report = sim.step(dt, &inputs);
    emit_step_events(&report, &mut bus);
    last.0 = report;
}

/// Forward a frame report to the event bus
pub fn emit_step_events(report: &StepReport, bus: &mut EventBus) {
    for injection in &report.injections {
        bus.emit(SimEvent::Injected {
            controller: injection.controller as u8,
            body: injection.body,
            speed: injection.velocity.length(),
        });
    }
    if report.floor_impacts > 0 {
        bus.emit(SimEvent::FloorImpacts {
            count: report.floor_impacts,
        });
    }
    if report.contacts > 0 {
        bus.emit(SimEvent::Contacts {
            count: report.contacts,
        });
    }
}

/// Copy arena positions onto the rendered spheres
pub fn sync_body_transforms(
    sim: Res<BodySimulator>,
    mut query: Query<(&BodyIndex, &mut Transform)>,
) {
    for (index, mut transform) in &mut query {
        if let Some(body) = sim.body(index.0) {
            transform.translation = body.position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::components::Injection;

    #[test]
    fn test_quiet_report_emits_nothing() {
        let mut bus = EventBus::new();
        emit_step_events(&StepReport::default(), &mut bus);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_report_events() {
        let mut bus = EventBus::new();
        let report = StepReport {
            injections: vec![Injection {
                controller: 1,
                body: 12,
                velocity: Vec3::new(0.0, 0.0, -9.0),
            }],
            floor_impacts: 3,
            wall_impacts: 1,
            contacts: 0,
        };

        emit_step_events(&report, &mut bus);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].event,
            SimEvent::Injected {
                controller: 1,
                body: 12,
                speed: 9.0
            }
        );
        assert_eq!(events[1].event, SimEvent::FloorImpacts { count: 3 });
    }
}
