use bevy::prelude::*;
use bevy_feedback_fx::cpu::displacement::{DisplacementConfig, TrailDisplacement};
use bevy_feedback_fx::cpu::trail::{TrailBuffer, TrailConfig};
use bevy_feedback_fx::gpu::plugin::{TrailPlugin, TrailSurface};
use bevy_feedback_fx::gpu::textures::TrailTexture;
use bevy_feedback_fx::params::ParamRegistry;
use bevy_feedback_fx::trail_material::TrailMaterial;

const SEED: u64 = 5;
const LATTICE: u32 = 48;
const PARTICLE_SIZE: f32 = 0.05;

#[derive(Component)]
struct Lifted(usize);

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            MaterialPlugin::<TrailMaterial>::default(),
            TrailPlugin::default(),
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, (spawn_display, follow_trail, nudge_decay))
        .run();
}

fn setup(
    mut commands: Commands,
    surface: Res<TrailSurface>,
    mut params: ResMut<ParamRegistry>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, -6.0, 16.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // a lattice of particles over the plane, lifted wherever the trail glows
    let config = DisplacementConfig::default();
    config.register(&mut params);
    let displacement = match TrailDisplacement::on_plane(&surface.0, LATTICE, LATTICE, SEED, config) {
        Ok(d) => d,
        Err(err) => {
            error!("no displacement particles: {err}");
            return;
        }
    };

    let mesh = meshes.add(Sphere::new(PARTICLE_SIZE));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.9, 1.0),
        unlit: true,
        ..default()
    });
    for (i, p) in displacement.rest_positions().iter().enumerate() {
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(p.x, p.y, p.z),
            Lifted(i),
        ));
    }
    commands.insert_resource(displacement);
}

fn follow_trail(
    displacement: Option<Res<TrailDisplacement>>,
    mut query: Query<(&Lifted, &mut Transform)>,
) {
    let Some(displacement) = displacement else { return };
    let positions = displacement.positions();
    for (lifted, mut transform) in query.iter_mut() {
        if let Some(p) = positions.get(lifted.0) {
            transform.translation = Vec3::new(p.x, p.y, p.z);
        }
    }
}

// the display plane sits exactly where TrailSurface expects the cursor to land
fn spawn_display(
    mut commands: Commands,
    texture: Option<Res<TrailTexture>>,
    surface: Res<TrailSurface>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<TrailMaterial>>,
    mut done: Local<bool>,
) {
    if *done {
        return;
    }
    let Some(texture) = texture else { return };
    let size = surface.0.size;
    let center = surface.0.center;

    commands.spawn((
        Mesh3d(meshes.add(Rectangle::new(size.x, size.y))),
        MeshMaterial3d(materials.add(TrailMaterial {
            tint: LinearRgba::new(0.1, 0.3, 0.35, 1.0),
            trail: texture.handle.clone(),
        })),
        Transform::from_xyz(center.x, center.y, center.z),
    ));
    *done = true;
}

// up/down arrows tweak the fade through the registry, as a debug panel would
fn nudge_decay(
    keys: Res<ButtonInput<KeyCode>>,
    mut params: ResMut<ParamRegistry>,
    trail: Option<Res<TrailBuffer>>,
) {
    let step = if keys.just_pressed(KeyCode::ArrowUp) {
        0.005
    } else if keys.just_pressed(KeyCode::ArrowDown) {
        -0.005
    } else {
        return;
    };
    let current = params.float_or(TrailConfig::DECAY, TrailConfig::default().decay);
    match params.set_float(TrailConfig::DECAY, current + step) {
        Ok(decay) => {
            let fade = trail.map(|t| t.ticks_to_fade(0.01)).unwrap_or_default();
            info!("trail decay {decay:.3} (fades below 1% in {fade} frames)");
        }
        Err(err) => warn!("{err}"),
    }
}
