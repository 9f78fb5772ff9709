// screen point -> ray -> UV on a flat interactive plane
use glam::{Mat4, Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3, // unit length
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        origin.is_finite().then_some(Self { origin, direction })
    }

    /// Pick ray through a normalized device coordinate (x, y in [-1, 1], y up) for a
    /// projection whose depth runs from 0 at the near plane to 1 at the far plane.
    /// Both ends are unprojected, so orthographic rays come out parallel.
    pub fn from_screen(ndc: Vec2, inverse_view_proj: Mat4) -> Option<Self> {
        if !ndc.is_finite() {
            return None;
        }
        let near = inverse_view_proj.project_point3(ndc.extend(0.0));
        let far = inverse_view_proj.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A finite rectangle in world space, hit from either side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractivePlane {
    pub center: Vec3,
    pub u_axis: Vec3, // unit, along width
    pub v_axis: Vec3, // unit, along height ("up" in UV space)
    pub size: Vec2,
}

impl InteractivePlane {
    /// Plane facing +Z, like a freshly created plane geometry.
    pub fn facing_z(center: Vec3, size: Vec2) -> Self {
        Self { center, u_axis: Vec3::X, v_axis: Vec3::Y, size }
    }

    pub fn normal(&self) -> Vec3 {
        self.u_axis.cross(self.v_axis).normalize_or_zero()
    }

    /// UV of the ray hit, (0, 0) bottom-left and (1, 1) top-right; `None` when the
    /// ray is parallel, points away, or lands outside the rectangle.
    pub fn intersect_uv(&self, ray: &Ray) -> Option<Vec2> {
        let normal = self.normal();
        let denom = normal.dot(ray.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = normal.dot(self.center - ray.origin) / denom;
        if !(t >= 0.0) {
            return None;
        }

        let local = ray.at(t) - self.center;
        let uv = Vec2::new(
            local.dot(self.u_axis) / self.size.x + 0.5,
            local.dot(self.v_axis) / self.size.y + 0.5,
        );
        let inside = (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y);
        inside.then_some(uv)
    }
}

/// Camera plus the plane the cursor is projected onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionSurface {
    pub plane: InteractivePlane,
    pub inverse_view_proj: Mat4,
}

impl ProjectionSurface {
    pub fn new(plane: InteractivePlane, view_proj: Mat4) -> Self {
        Self { plane, inverse_view_proj: view_proj.inverse() }
    }

    pub fn project(&self, ndc: Vec2) -> Option<Vec2> {
        let ray = Ray::from_screen(ndc, self.inverse_view_proj)?;
        self.plane.intersect_uv(&ray)
    }
}

/// Window pixel position (origin top-left) to NDC (origin centre, y up).
pub fn window_to_ndc(cursor: Vec2, window_size: Vec2) -> Option<Vec2> {
    if window_size.x <= 0.0 || window_size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        cursor.x / window_size.x * 2.0 - 1.0,
        -(cursor.y / window_size.y) * 2.0 + 1.0,
    ))
}
