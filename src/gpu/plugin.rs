use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;
use bevy::window::PrimaryWindow;

use crate::cpu::displacement::TrailDisplacement;
use crate::cpu::feedback::{FeedbackSim, SimulationKernel};
use crate::cpu::projection::{InteractivePlane, Ray};
use crate::cpu::trail::{TrailBuffer, TrailConfig};
use crate::error::{FxError, FxResult};
use crate::gpu::textures::{
    FeedbackTexture, TextureStatus, TrailTexture, float_texture, pack_state, pack_trail,
    upload_texels,
};
use crate::params::ParamRegistry;

// ==================== resources ======================================

pub type KernelFactory = Box<dyn Fn(&[glam::Vec3]) -> Box<dyn SimulationKernel> + Send + Sync>;

/// A mesh whose vertex positions will seed the feedback simulation once it loads.
#[derive(Resource)]
pub struct PendingSeed {
    pub mesh: Handle<Mesh>,
    pub time_step: f32,
    pub kernel: KernelFactory,
}

/// Outcome of a `PendingSeed`, written exactly once.
#[derive(Resource, Debug, Clone, PartialEq)]
pub enum SeedStatus {
    Resolved { particles: usize },
    Failed(FxError),
}

/// The (invisible) plane the cursor is projected onto, in bevy world space.
#[derive(Resource, Debug, Clone, Copy)]
pub struct TrailSurface(pub InteractivePlane);

impl Default for TrailSurface {
    fn default() -> Self {
        Self(InteractivePlane::facing_z(glam::Vec3::ZERO, glam::Vec2::splat(10.0)))
    }
}

// =====================================================================

pub fn positions_from_mesh(mesh: &Mesh) -> FxResult<Vec<glam::Vec3>> {
    match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) if !positions.is_empty() => {
            Ok(positions.iter().map(|&p| glam::Vec3::from_array(p)).collect())
        }
        _ => Err(FxError::MissingPositions),
    }
}

// bevy re-exports its own glam, so cross over by value
fn to_glam_vec3(v: Vec3) -> glam::Vec3 {
    glam::Vec3::new(v.x, v.y, v.z)
}

fn seed_from_mesh(pending: &PendingSeed, mesh: Option<&Mesh>) -> FxResult<FeedbackSim> {
    let positions = positions_from_mesh(mesh.ok_or(FxError::MissingPositions)?)?;
    let kernel = (pending.kernel)(&positions);
    FeedbackSim::with_boxed_kernel(&positions, pending.time_step, kernel)
}

// ========================== systems ==================================

// feedback simulation

fn resolve_pending_seed(
    mut commands: Commands,
    pending: Option<Res<PendingSeed>>,
    asset_server: Res<AssetServer>,
    meshes: Res<Assets<Mesh>>,
) {
    let Some(pending) = pending else {
        return;
    };

    let outcome = match asset_server.load_state(pending.mesh.id()) {
        LoadState::Failed(err) => Err(FxError::AssetLoad(err.to_string())),
        LoadState::Loaded => seed_from_mesh(&pending, meshes.get(&pending.mesh)),
        // meshes added in code never go through the asset server
        LoadState::NotLoaded => match meshes.get(&pending.mesh) {
            Some(mesh) => seed_from_mesh(&pending, Some(mesh)),
            None => return,
        },
        LoadState::Loading => return,
    };

    match outcome {
        Ok(sim) => {
            info!("feedback sim seeded from mesh: {} particles", sim.particle_count());
            commands.insert_resource(SeedStatus::Resolved { particles: sim.particle_count() });
            commands.insert_resource(sim);
        }
        Err(err) => {
            error!("feedback sim seeding failed: {err}");
            commands.insert_resource(SeedStatus::Failed(err));
        }
    }
    commands.remove_resource::<PendingSeed>();
}

fn init_feedback_texture(
    mut commands: Commands,
    sim: Option<Res<FeedbackSim>>,
    texture: Option<Res<FeedbackTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let (Some(sim), None) = (sim, texture) else {
        return;
    };
    let handle = images.add(float_texture(sim.side(), sim.side()));
    commands.insert_resource(FeedbackTexture { handle, status: TextureStatus::Pending });
}

fn step_feedback_sim(
    sim: Option<ResMut<FeedbackSim>>,
    params: Option<Res<ParamRegistry>>,
    time: Res<Time>,
) {
    let Some(mut sim) = sim else {
        return;
    };
    if let Some(params) = params {
        sim.apply_params(&params);
    }
    sim.step(time.elapsed_secs(), time.delta_secs());
}

fn upload_feedback_texture(
    sim: Option<Res<FeedbackSim>>,
    texture: Option<ResMut<FeedbackTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let (Some(sim), Some(mut texture)) = (sim, texture) else {
        return;
    };
    let view = sim.current_texture();
    let texels = pack_state(&view);
    let FeedbackTexture { handle, status } = &mut *texture;
    if let Err(err) = upload_texels(&mut images, handle, status, view.side(), view.side(), &texels) {
        error!("feedback texture uploads disabled: {err}");
    }
}

// trail buffer

fn apply_trail_params(trail: Option<ResMut<TrailBuffer>>, params: Option<Res<ParamRegistry>>) {
    let (Some(mut trail), Some(params)) = (trail, params) else {
        return;
    };
    if !params.is_changed() {
        return;
    }
    if let Err(err) = trail.apply_params(&params) {
        warn!("trail parameters rejected: {err}");
    }
}

fn project_trail_cursor(
    trail: Option<ResMut<TrailBuffer>>,
    surface: Res<TrailSurface>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
) {
    let Some(mut trail) = trail else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    // topmost active camera whose viewport holds the cursor
    let Some((camera, camera_tf)) = cameras
        .iter()
        .filter(|(camera, _)| camera.is_active)
        .filter(|(camera, _)| {
            camera
                .logical_viewport_rect()
                .is_some_and(|rect| rect.contains(cursor))
        })
        .max_by_key(|(camera, _)| camera.order)
    else {
        return;
    };

    // bevy builds the ray for perspective and orthographic projections alike
    let Ok(ray) = camera.viewport_to_world(camera_tf, cursor) else {
        return;
    };
    let Some(ray) = Ray::new(to_glam_vec3(ray.origin), to_glam_vec3(*ray.direction)) else {
        return;
    };
    trail.project_ray(&ray, &surface.0);
}

fn tick_trail(trail: Option<ResMut<TrailBuffer>>) {
    if let Some(mut trail) = trail {
        trail.advance();
    }
}

fn displace_from_trail(
    trail: Option<Res<TrailBuffer>>,
    displacement: Option<ResMut<TrailDisplacement>>,
    params: Option<Res<ParamRegistry>>,
) {
    let (Some(trail), Some(mut displacement)) = (trail, displacement) else {
        return;
    };
    if let Some(params) = params.filter(|p| p.is_changed()) {
        displacement.apply_params(&params);
    }
    displacement.update(&trail.as_texture());
}

fn init_trail_texture(
    mut commands: Commands,
    trail: Option<Res<TrailBuffer>>,
    texture: Option<Res<TrailTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let (Some(trail), None) = (trail, texture) else {
        return;
    };
    let handle = images.add(float_texture(trail.width(), trail.height()));
    commands.insert_resource(TrailTexture { handle, status: TextureStatus::Pending });
}

fn upload_trail_texture(
    trail: Option<Res<TrailBuffer>>,
    texture: Option<ResMut<TrailTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let (Some(trail), Some(mut texture)) = (trail, texture) else {
        return;
    };
    let view = trail.as_texture();
    let texels = pack_trail(&view);
    let TrailTexture { handle, status } = &mut *texture;
    if let Err(err) = upload_texels(&mut images, handle, status, view.width, view.height, &texels) {
        error!("trail texture uploads disabled: {err}");
    }
}

// =====================================================================

// Plugins

/// Steps a `FeedbackSim` resource once per frame and mirrors it into `FeedbackTexture`.
/// Insert the sim directly, or a `PendingSeed` to build it from a mesh.
pub struct FeedbackSimPlugin;

impl Plugin for FeedbackSimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ParamRegistry>().add_systems(
            Update,
            (
                resolve_pending_seed,
                init_feedback_texture,
                step_feedback_sim,
                upload_feedback_texture,
            )
                .chain(),
        );
    }
}

/// Owns a `TrailBuffer` fed by the primary window's cursor and mirrors it into
/// `TrailTexture`. A `TrailDisplacement` resource, if present, is refreshed from the
/// trail every frame.
pub struct TrailPlugin {
    pub config: TrailConfig,
    pub surface: InteractivePlane,
}

impl Default for TrailPlugin {
    fn default() -> Self {
        Self { config: TrailConfig::default(), surface: TrailSurface::default().0 }
    }
}

impl Plugin for TrailPlugin {
    fn build(&self, app: &mut App) {
        {
            let mut params = app
                .world_mut()
                .get_resource_or_insert_with(ParamRegistry::default);
            self.config.register(&mut params);
        }

        match TrailBuffer::from_config(&self.config) {
            Ok(trail) => {
                app.insert_resource(trail);
            }
            Err(err) => error!("trail buffer disabled: {err}"),
        }

        app.insert_resource(TrailSurface(self.surface)).add_systems(
            Update,
            (
                apply_trail_params,
                project_trail_cursor,
                tick_trail,
                displace_from_trail,
                init_trail_texture,
                upload_trail_texture,
            )
                .chain(),
        );
    }
}
