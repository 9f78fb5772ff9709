use bevy::asset::{AssetPlugin, RenderAssetUsages};
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy_feedback_fx::{FxError, ParamRegistry};
use bevy_feedback_fx::cpu::attributes::ParticleAttributes;
use bevy_feedback_fx::cpu::displacement::{DisplacementConfig, TrailDisplacement};
use bevy_feedback_fx::cpu::feedback::{FeedbackSim, SimulationKernel};
use bevy_feedback_fx::cpu::kernels::Stationary;
use bevy_feedback_fx::cpu::trail::{Stamp, TrailBuffer, TrailConfig};
use bevy_feedback_fx::gpu::ffi::GpuTexel;
use bevy_feedback_fx::gpu::plugin::{
    FeedbackSimPlugin, KernelFactory, PendingSeed, SeedStatus, TrailPlugin, TrailSurface,
};
use bevy_feedback_fx::gpu::textures::{
    FeedbackTexture, TextureStatus, TrailTexture, float_texture, upload_texels,
};

fn headless_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default()))
        .init_asset::<Image>()
        .init_asset::<Mesh>();
    app
}

fn point_mesh(points: Vec<[f32; 3]>) -> Mesh {
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, points)
}

fn stationary_factory() -> KernelFactory {
    Box::new(|_: &[glam::Vec3]| -> Box<dyn SimulationKernel> { Box::new(Stationary) })
}

fn image_size(app: &App, handle: &Handle<Image>) -> (u32, u32) {
    let size = app.world().resource::<Assets<Image>>().get(handle).unwrap().size();
    (size.x, size.y)
}

#[test]
fn sim_resource_gets_stepped_and_uploaded() {
    let mut app = headless_app();
    app.add_plugins(FeedbackSimPlugin);
    let positions = [glam::Vec3::ZERO, glam::Vec3::X, glam::Vec3::Y];
    app.insert_resource(FeedbackSim::new(&positions, 0.05, Stationary).unwrap());

    app.update();
    app.update();

    assert_eq!(app.world().resource::<FeedbackSim>().steps(), 2);
    let texture = app.world().resource::<FeedbackTexture>().clone();
    assert_eq!(texture.status, TextureStatus::Ready);
    assert_eq!(image_size(&app, &texture.handle), (2, 2));

    let images = app.world().resource::<Assets<Image>>();
    let bytes = images.get(&texture.handle).unwrap().data.clone().unwrap();
    let texel = |rgba: [f32; 4]| bytemuck::bytes_of(&GpuTexel { rgba }).to_vec();
    assert_eq!(bytes.len(), 4 * 16);
    assert_eq!(&bytes[16..32], texel([1.0, 0.0, 0.0, 0.0]).as_slice());
    assert_eq!(&bytes[48..64], texel([0.0; 4]).as_slice()); // padding
}

#[test]
fn pending_seed_resolves_from_a_mesh() {
    let mut app = headless_app();
    app.add_plugins(FeedbackSimPlugin);
    let mesh = app
        .world_mut()
        .resource_mut::<Assets<Mesh>>()
        .add(point_mesh(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]));
    app.insert_resource(PendingSeed {
        mesh,
        time_step: 0.05,
        kernel: stationary_factory(),
    });

    app.update();

    assert_eq!(
        app.world().get_resource::<SeedStatus>(),
        Some(&SeedStatus::Resolved { particles: 3 })
    );
    assert!(app.world().get_resource::<PendingSeed>().is_none());
    assert_eq!(app.world().resource::<FeedbackSim>().side(), 2);
}

#[test]
fn mesh_without_positions_fails_once() {
    let mut app = headless_app();
    app.add_plugins(FeedbackSimPlugin);
    let mesh = app
        .world_mut()
        .resource_mut::<Assets<Mesh>>()
        .add(Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default()));
    app.insert_resource(PendingSeed {
        mesh,
        time_step: 0.05,
        kernel: stationary_factory(),
    });

    app.update();
    app.update();

    assert_eq!(
        app.world().get_resource::<SeedStatus>(),
        Some(&SeedStatus::Failed(FxError::MissingPositions))
    );
    assert!(app.world().get_resource::<FeedbackSim>().is_none());
    assert!(app.world().get_resource::<FeedbackTexture>().is_none());
}

#[test]
fn trail_plugin_follows_registry_resolution() {
    let mut app = headless_app();
    app.add_plugins(TrailPlugin::default());

    app.update();
    let texture = app.world().resource::<TrailTexture>().clone();
    assert_eq!(texture.status, TextureStatus::Ready);
    assert_eq!(image_size(&app, &texture.handle), (128, 128));
    assert_eq!(app.world().resource::<TrailBuffer>().ticks(), 1);

    app.world_mut()
        .resource_mut::<ParamRegistry>()
        .set_float(TrailConfig::WIDTH, 32.0)
        .unwrap();
    app.update();

    assert_eq!(app.world().resource::<TrailBuffer>().width(), 32);
    assert_eq!(image_size(&app, &texture.handle), (32, 128));
}

#[test]
fn trail_plugin_drives_displacement() {
    let mut app = headless_app();
    app.add_plugins(TrailPlugin::default());
    let surface = app.world().resource::<TrailSurface>().0;
    let displacement =
        TrailDisplacement::on_plane(&surface, 4, 4, 11, DisplacementConfig::default()).unwrap();
    app.insert_resource(displacement);

    app.update();
    let d = app.world().resource::<TrailDisplacement>();
    assert_eq!(d.positions(), d.rest_positions());

    // light up the middle of the 128x128 trail, under the centre particle
    app.world_mut().resource_mut::<TrailBuffer>().stamp(Stamp {
        center: glam::Vec2::splat(64.0),
        radius: 9.6,
        alpha: 1.0,
    });
    app.update();

    let d = app.world().resource::<TrailDisplacement>();
    let centre = 12; // (2, 2) on the 5x5 lattice
    assert!(d.positions()[centre].distance(d.rest_positions()[centre]) > 0.0);
    assert_eq!(d.positions()[0], d.rest_positions()[0]);
}

#[test]
fn missing_image_latches_unavailable() {
    let mut images = Assets::<Image>::default();
    let handle = images.add(float_texture(2, 2));
    let texels = vec![GpuTexel::default(); 4];
    let mut status = TextureStatus::Pending;

    upload_texels(&mut images, &handle, &mut status, 2, 2, &texels).unwrap();
    assert_eq!(status, TextureStatus::Ready);

    images.remove(&handle);
    assert!(upload_texels(&mut images, &handle, &mut status, 2, 2, &texels).is_err());
    assert_eq!(status, TextureStatus::Unavailable);

    // latched: no retry, no error spam
    let fresh = images.add(float_texture(2, 2));
    assert!(upload_texels(&mut images, &fresh, &mut status, 2, 2, &texels).is_ok());
    assert_eq!(status, TextureStatus::Unavailable);
}

#[test]
fn attributes_are_seeded() {
    let a = ParticleAttributes::seeded(64, 99);
    let b = ParticleAttributes::seeded(64, 99);
    let c = ParticleAttributes::seeded(64, 100);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
    assert!(a.phases.iter().all(|p| (0.0..1.0).contains(p)));
    assert!(a.angles.iter().all(|r| (0.0..std::f32::consts::TAU).contains(r)));
}
