use bevy::prelude::*;
use bevy_feedback_fx::cpu::attributes::ParticleAttributes;
use bevy_feedback_fx::cpu::feedback::{FeedbackSim, SimulationKernel};
use bevy_feedback_fx::cpu::kernels::{FlowFieldConfig, FlowFieldKernel};
use bevy_feedback_fx::gpu::plugin::{FeedbackSimPlugin, PendingSeed, SeedStatus};
use bevy_feedback_fx::params::ParamRegistry;

const SEED: u64 = 7;
const PARTICLE_SIZE: f32 = 0.04;
const DT: f32 = 1.0 / 30.0;

#[derive(Component)]
struct ParticleVisual(usize);

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, FeedbackSimPlugin))
        .insert_resource(ClearColor(Color::srgb(0.16, 0.145, 0.19)))
        .add_systems(Startup, setup)
        .add_systems(Update, (spawn_particles, sync_particles).chain())
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut params: ResMut<ParamRegistry>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(4.5, 4.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    FlowFieldConfig::default().register(&mut params);

    // any mesh works; its vertices become the particles
    let sphere = Sphere::new(3.0);
    let source = meshes.add(sphere.mesh().ico(3).unwrap_or_else(|_| sphere.mesh().uv(32, 18)));
    commands.insert_resource(PendingSeed {
        mesh: source,
        time_step: DT,
        kernel: Box::new(|positions: &[glam::Vec3]| -> Box<dyn SimulationKernel> {
            Box::new(FlowFieldKernel::seeded(positions, SEED, FlowFieldConfig::default()))
        }),
    });
}

fn spawn_particles(
    mut commands: Commands,
    status: Option<Res<SeedStatus>>,
    sim: Option<Res<FeedbackSim>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut done: Local<bool>,
) {
    if *done {
        return;
    }
    let Some(status) = status else { return };
    if let SeedStatus::Failed(err) = &*status {
        error!("no particles to show: {err}");
        *done = true;
        return;
    }
    let Some(sim) = sim else { return };

    let attributes = ParticleAttributes::seeded(sim.particle_count(), SEED);
    let mesh = meshes.add(Sphere::new(PARTICLE_SIZE));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.45, 0.2),
        unlit: true,
        ..default()
    });

    for (i, p) in sim.current_texture().particles().iter().enumerate() {
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(p.pos.x, p.pos.y, p.pos.z)
                .with_scale(Vec3::splat(0.5 + attributes.sizes[i])),
            ParticleVisual(i),
        ));
    }
    info!("spawned {} particle visuals", sim.particle_count());
    *done = true;
}

fn sync_particles(
    sim: Option<Res<FeedbackSim>>,
    mut query: Query<(&ParticleVisual, &mut Transform)>,
) {
    let Some(sim) = sim else { return };
    let state = sim.current_texture();
    for (visual, mut transform) in query.iter_mut() {
        if let Some(texel) = state.get(visual.0) {
            transform.translation = Vec3::new(texel.pos.x, texel.pos.y, texel.pos.z);
        }
    }
}
