//! Ballroom - two hundred bouncing bodies in a room, thrown from two controllers
//!
//! Main entry point: app setup and system registration.

use ballroom::{
    BodyIndex, BodySimulator, ConfigWatcher, ControllerInputs, CurrentSettings, EventBus,
    LastStepReport, RoomCamera, SimConfigSnapshot, SimEvent, body, config_watcher,
    constants::*, input, load_global_tuning, save_settings_system,
    serialize_event, settings, update_event_bus_time,
};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // --seed <n> overrides the saved scatter seed for this launch
    let seed_override = args
        .iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1).and_then(|s| s.parse::<u64>().ok()));

    let current_settings = CurrentSettings::default();

    // Save settings on first run to ensure file exists
    if let Err(e) = current_settings.settings.save() {
        warn!("Failed to save initial settings: {}", e);
    }

    let seed = seed_override.or(current_settings.settings.seed);
    let tuning = load_global_tuning();
    let simulator = BodySimulator::new(tuning, seed);
    let (width, height) = (
        current_settings.settings.window_width,
        current_settings.settings.window_height,
    );

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                resolution: bevy::window::WindowResolution::new(width, height),
                title: "Ballroom".into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(BACKGROUND_COLOR))
        .insert_resource(current_settings)
        .insert_resource(simulator)
        .insert_resource(BodyPalette::new(seed))
        .insert_resource(EventBus::new())
        .init_resource::<ControllerInputs>()
        .init_resource::<LastStepReport>()
        .init_resource::<ConfigWatcher>()
        .add_systems(Startup, (setup, log_session_start))
        // Frame order: clock -> look around -> controllers -> step -> render sync
        .add_systems(
            Update,
            (
                update_event_bus_time,
                input::turn_camera,
                input::capture_controllers,
                body::step_bodies,
                body::sync_body_transforms,
                log_bus_events,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                config_watcher::check_config_changes,
                settings::toggle_overlays,
                save_settings_system,
                draw_room,
                draw_controllers,
            ),
        )
        .run();
}

/// Per-body colors, seeded with the scatter seed so a fixed seed looks the same
#[derive(Resource)]
struct BodyPalette {
    rng: StdRng,
}

impl BodyPalette {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ 0xC01_0125),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn next_color(&mut self) -> Color {
        Color::hsl(self.rng.gen_range(0.0..360.0), 0.65, 0.55)
    }
}

/// Spawn camera, light and one sphere per arena body
fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut palette: ResMut<BodyPalette>,
    sim: Res<BodySimulator>,
) {
    let camera = Transform::from_translation(CAMERA_EYE).looking_at(CAMERA_TARGET, Vec3::Y);
    let (yaw, pitch, _) = camera.rotation.to_euler(EulerRot::YXZ);
    commands.spawn((Camera3d::default(), camera, RoomCamera { yaw, pitch }));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(2.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            intensity: 400_000.0,
            range: 20.0,
            ..default()
        },
        Transform::from_xyz(0.0, sim.room().ceiling() - 0.5, 0.0),
    ));

    let sphere = meshes.add(Sphere::new(sim.tuning().body_radius));
    for (index, body) in sim.bodies().iter().enumerate() {
        let material = materials.add(StandardMaterial {
            base_color: palette.next_color(),
            perceptual_roughness: 0.6,
            ..default()
        });
        commands.spawn((
            Mesh3d(sphere.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(body.position),
            BodyIndex(index),
        ));
    }

    info!(
        "Spawned {} bodies in a {}m room",
        sim.len(),
        sim.room().side
    );
}

fn log_session_start(mut bus: ResMut<EventBus>, sim: Res<BodySimulator>) {
    bus.emit(SimEvent::SessionStart {
        session_id: uuid::Uuid::new_v4().to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });
    bus.emit(SimEvent::Config(SimConfigSnapshot::from(sim.tuning())));
}

/// Event log goes to the debug log; nothing is kept
fn log_bus_events(mut bus: ResMut<EventBus>) {
    if !bus.has_pending() {
        return;
    }
    for event in bus.drain() {
        debug!("{}", serialize_event(event.time_ms, &event.event));
    }
    bus.clear_processed();
}

fn draw_room(mut gizmos: Gizmos, sim: Res<BodySimulator>, current: Res<CurrentSettings>) {
    if !current.settings.show_room {
        return;
    }
    let room = sim.room();
    gizmos.cuboid(
        Transform::from_translation(room.center())
            .with_scale(Vec3::new(room.side, room.height, room.side)),
        ROOM_LINE_COLOR,
    );
}

fn draw_controllers(
    mut gizmos: Gizmos,
    inputs: Res<ControllerInputs>,
    current: Res<CurrentSettings>,
) {
    if !current.settings.show_controllers {
        return;
    }

    for state in inputs.0.iter() {
        let color = if state.is_selecting {
            CONTROLLER_ACTIVE_COLOR
        } else {
            CONTROLLER_COLOR
        };
        gizmos.line(
            state.pose.position,
            state.pose.position + state.pose.forward() * CONTROLLER_POINTER_LENGTH,
            color,
        );
    }
}
