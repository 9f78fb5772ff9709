use bevy_feedback_fx::FxError;
use bevy_feedback_fx::ParamRegistry;
use bevy_feedback_fx::cpu::attributes::ParticleAttributes;
use bevy_feedback_fx::cpu::displacement::{DisplacementConfig, TrailDisplacement};
use bevy_feedback_fx::cpu::projection::InteractivePlane;
use bevy_feedback_fx::cpu::trail::{Stamp, TrailBuffer};
use glam::{Vec2, Vec3};

const SEED: u64 = 3;

fn small_plane() -> InteractivePlane {
    InteractivePlane::facing_z(Vec3::ZERO, Vec2::splat(2.0))
}

// 16x16 trail lit around its centre cell
fn lit_trail() -> TrailBuffer {
    let mut trail = TrailBuffer::new(16, 16, 0.95).unwrap();
    let center = trail.cell_center(8, 8);
    trail.stamp(Stamp { center, radius: 3.0, alpha: 1.0 });
    trail
}

#[test]
fn lattice_covers_the_plane_top_row_first() {
    let d = TrailDisplacement::on_plane(&small_plane(), 2, 2, SEED, DisplacementConfig::default())
        .unwrap();
    assert_eq!(d.len(), 9);
    assert_eq!(d.rest_positions()[0], Vec3::new(-1.0, 1.0, 0.0));
    assert_eq!(d.uvs()[0], Vec2::new(0.0, 1.0));
    assert_eq!(d.rest_positions()[4], Vec3::ZERO);
    assert_eq!(d.rest_positions()[8], Vec3::new(1.0, -1.0, 0.0));
    assert_eq!(d.uvs()[8], Vec2::new(1.0, 0.0));
}

#[test]
fn dark_trail_leaves_particles_at_rest() {
    let mut d =
        TrailDisplacement::on_plane(&small_plane(), 4, 4, SEED, DisplacementConfig::default())
            .unwrap();
    let trail = TrailBuffer::new(16, 16, 0.95).unwrap();
    d.update(&trail.as_texture());
    assert_eq!(d.positions(), d.rest_positions());
}

#[test]
fn lit_cells_push_particles_by_their_intensity() {
    let config = DisplacementConfig::default();
    let mut d = TrailDisplacement::on_plane(&small_plane(), 2, 2, SEED, config).unwrap();
    d.update(&lit_trail().as_texture());

    // the centre particle reads cell (8, 8), bright enough for the full lift
    let intensity = ParticleAttributes::seeded(9, SEED).intensities[4];
    let moved = d.positions()[4] - d.rest_positions()[4];
    assert!((moved.length() - config.strength * intensity).abs() < 1e-4);
    assert!(moved.z > 0.0); // mostly along the plane normal

    // corners read dark cells
    for i in [0, 2, 6, 8] {
        assert_eq!(d.positions()[i], d.rest_positions()[i]);
    }
}

#[test]
fn zero_spread_pushes_straight_off_the_plane() {
    let config = DisplacementConfig { spread: 0.0, ..DisplacementConfig::default() };
    let mut d = TrailDisplacement::on_plane(&small_plane(), 2, 2, SEED, config).unwrap();
    d.update(&lit_trail().as_texture());

    let intensity = ParticleAttributes::seeded(9, SEED).intensities[4];
    let expected = Vec3::Z * config.strength * intensity;
    assert!((d.positions()[4] - expected).length() < 1e-4);
}

#[test]
fn fading_trail_lets_particles_settle_back() {
    let mut trail = lit_trail();
    let mut d =
        TrailDisplacement::on_plane(&small_plane(), 2, 2, SEED, DisplacementConfig::default())
            .unwrap();
    for _ in 0..trail.ticks_to_fade(0.05) {
        trail.tick(0.0);
    }
    d.update(&trail.as_texture());
    assert_eq!(d.positions(), d.rest_positions()); // below `low`
}

#[test]
fn rejects_bad_layouts() {
    let plane = small_plane();
    let config = DisplacementConfig::default();
    assert_eq!(
        TrailDisplacement::new(&plane, vec![Vec3::ZERO; 3], vec![Vec2::ZERO; 2], SEED, config)
            .err(),
        Some(FxError::LengthMismatch { positions: 3, uvs: 2 })
    );
    assert_eq!(
        TrailDisplacement::new(&plane, vec![], vec![], SEED, config).err(),
        Some(FxError::EmptyInitialState)
    );
    assert!(matches!(
        TrailDisplacement::on_plane(&plane, 0, 4, SEED, config),
        Err(FxError::InvalidResolution { .. })
    ));
}

#[test]
fn trail_uv_sampling_matches_cursor_mapping() {
    let mut trail = TrailBuffer::new(8, 4, 0.95).unwrap();
    trail.stamp(Stamp { center: Vec2::new(0.5, 0.5), radius: 1.0, alpha: 1.0 });
    let view = trail.as_texture();

    // v = 1 is the top row of the buffer
    assert_eq!(view.sample_uv(Vec2::new(0.0, 1.0)), trail.sample(0, 0));
    assert_eq!(view.sample_uv(Vec2::new(1.0, 0.0)), trail.sample(7, 3)); // clamped
    assert_eq!(view.sample_uv(Vec2::new(0.5, 0.5)), trail.sample(4, 2));
    assert_eq!(view.sample_uv(Vec2::new(-3.0, 9.0)), trail.sample(0, 0));
    assert_eq!(view.sample_uv(Vec2::new(f32::NAN, 0.5)), None);
}

#[test]
fn reads_its_params() {
    let mut params = ParamRegistry::new();
    DisplacementConfig::default().register(&mut params);
    params.set_float(DisplacementConfig::STRENGTH, 1.5).unwrap();

    let mut d =
        TrailDisplacement::on_plane(&small_plane(), 1, 1, SEED, DisplacementConfig::default())
            .unwrap();
    d.apply_params(&params);
    assert_eq!(d.config.strength, 1.5);
    assert_eq!(d.config.low, 0.1);
}
