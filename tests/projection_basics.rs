use bevy_feedback_fx::cpu::projection::{
    InteractivePlane, ProjectionSurface, Ray, window_to_ndc,
};
use glam::{Mat4, Vec2, Vec3};

#[test]
fn ray_hits_plane_from_both_sides() {
    let plane = InteractivePlane::facing_z(Vec3::ZERO, Vec2::splat(2.0));
    let front = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::NEG_Z).unwrap();
    let back = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z).unwrap();
    assert_eq!(plane.intersect_uv(&front), Some(Vec2::new(0.75, 0.75)));
    assert_eq!(plane.intersect_uv(&back), Some(Vec2::new(0.75, 0.75)));
}

#[test]
fn ray_misses_when_parallel_away_or_outside() {
    let plane = InteractivePlane::facing_z(Vec3::ZERO, Vec2::splat(2.0));
    let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X).unwrap();
    let away = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::Z).unwrap();
    let outside = Ray::new(Vec3::new(3.0, 0.0, 1.0), Vec3::NEG_Z).unwrap();
    assert_eq!(plane.intersect_uv(&parallel), None);
    assert_eq!(plane.intersect_uv(&away), None);
    assert_eq!(plane.intersect_uv(&outside), None);
}

#[test]
fn tilted_plane_uses_its_own_axes() {
    // lying flat on the ground, v pointing towards -Z
    let plane = InteractivePlane {
        center: Vec3::ZERO,
        u_axis: Vec3::X,
        v_axis: Vec3::NEG_Z,
        size: Vec2::new(4.0, 2.0),
    };
    let down = Ray::new(Vec3::new(1.0, 3.0, -0.5), Vec3::NEG_Y).unwrap();
    let uv = plane.intersect_uv(&down).unwrap();
    assert!((uv - Vec2::new(0.75, 0.75)).length() < 1e-6);
}

#[test]
fn degenerate_rays_are_rejected() {
    assert_eq!(Ray::new(Vec3::ZERO, Vec3::ZERO), None);
    assert_eq!(Ray::new(Vec3::splat(f32::NAN), Vec3::X), None);
    let inv = Mat4::IDENTITY;
    assert_eq!(Ray::from_screen(Vec2::new(f32::NAN, 0.0), inv), None);
}

#[test]
fn screen_ray_points_through_the_cursor() {
    let eye = Vec3::new(0.0, 0.0, 10.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
    let ray = Ray::from_screen(Vec2::ZERO, (proj * view).inverse()).unwrap();
    assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    assert!((ray.origin - Vec3::new(0.0, 0.0, 9.9)).length() < 1e-3); // starts on the near plane
}

#[test]
fn orthographic_rays_stay_parallel() {
    // camera off to the side at x = 3 with a 4x4 view box; the cursor half way to the
    // right edge sits over x = 4, which is u = 0.9 on a 10x10 plane
    let eye = Vec3::new(3.0, 0.0, 10.0);
    let view = Mat4::look_at_rh(eye, Vec3::new(3.0, 0.0, 0.0), Vec3::Y);
    let proj = Mat4::orthographic_rh(-2.0, 2.0, -2.0, 2.0, 0.1, 100.0);
    let surface =
        ProjectionSurface::new(InteractivePlane::facing_z(Vec3::ZERO, Vec2::splat(10.0)), proj * view);

    let uv = surface.project(Vec2::new(0.5, 0.0)).unwrap();
    assert!((uv - Vec2::new(0.9, 0.5)).length() < 1e-4, "{uv}");

    let left = Ray::from_screen(Vec2::new(-1.0, 0.0), (proj * view).inverse()).unwrap();
    let right = Ray::from_screen(Vec2::new(1.0, 0.0), (proj * view).inverse()).unwrap();
    assert!((left.direction - right.direction).length() < 1e-5);
    assert!((right.origin.x - left.origin.x - 4.0).abs() < 1e-4);
}

#[test]
fn window_pixels_to_ndc() {
    let size = Vec2::new(800.0, 600.0);
    assert_eq!(window_to_ndc(Vec2::new(0.0, 0.0), size), Some(Vec2::new(-1.0, 1.0)));
    assert_eq!(window_to_ndc(Vec2::new(400.0, 300.0), size), Some(Vec2::ZERO));
    assert_eq!(window_to_ndc(Vec2::new(800.0, 600.0), size), Some(Vec2::new(1.0, -1.0)));
    assert_eq!(window_to_ndc(Vec2::ZERO, Vec2::ZERO), None);
}
