// particles laid out on a plane, pushed off it wherever the trail buffer is lit
use glam::{Vec2, Vec3};
use bevy::prelude::Resource;

use crate::cpu::attributes::ParticleAttributes;
use crate::cpu::kernels::smoothstep;
use crate::cpu::projection::InteractivePlane;
use crate::cpu::trail::TrailView;
use crate::error::{FxError, FxResult};
use crate::params::ParamRegistry;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacementConfig {
    pub low: f32,  // trail value where particles start to lift
    pub high: f32, // trail value where the lift is complete
    pub spread: f32, // sideways share of the push
    pub strength: f32,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self { low: 0.1, high: 0.3, spread: 0.2, strength: 3.0 }
    }
}

impl DisplacementConfig {
    pub const LOW: &'static str = "displacement_low";
    pub const HIGH: &'static str = "displacement_high";
    pub const SPREAD: &'static str = "displacement_spread";
    pub const STRENGTH: &'static str = "displacement_strength";

    pub fn register(&self, params: &mut ParamRegistry) {
        params.register_float(Self::LOW, self.low, 0.0, 1.0);
        params.register_float(Self::HIGH, self.high, 0.0, 1.0);
        params.register_float(Self::SPREAD, self.spread, 0.0, 1.0);
        params.register_float(Self::STRENGTH, self.strength, 0.0, 10.0);
    }

    pub fn read(&self, params: &ParamRegistry) -> Self {
        Self {
            low: params.float_or(Self::LOW, self.low),
            high: params.float_or(Self::HIGH, self.high),
            spread: params.float_or(Self::SPREAD, self.spread),
            strength: params.float_or(Self::STRENGTH, self.strength),
        }
    }
}

/// Reads the trail as a displacement map. Each particle keeps its rest position and
/// plane UV; every `update` rebuilds the displaced positions from the latest trail.
#[derive(Resource, Clone, Debug)]
pub struct TrailDisplacement {
    rest: Vec<Vec3>,
    uvs: Vec<Vec2>,
    sideways: Vec<Vec3>, // unit, in the plane, from the particle's angle
    intensities: Vec<f32>,
    normal: Vec3,
    positions: Vec<Vec3>,
    pub config: DisplacementConfig,
}

impl TrailDisplacement {
    /// `rest[i]` sits at `uvs[i]` on `plane`. Angles and intensities come from
    /// `ParticleAttributes::seeded(rest.len(), seed)`.
    pub fn new(
        plane: &InteractivePlane,
        rest: Vec<Vec3>,
        uvs: Vec<Vec2>,
        seed: u64,
        config: DisplacementConfig,
    ) -> FxResult<Self> {
        if rest.is_empty() {
            return Err(FxError::EmptyInitialState);
        }
        if rest.len() != uvs.len() {
            return Err(FxError::LengthMismatch { positions: rest.len(), uvs: uvs.len() });
        }

        let attributes = ParticleAttributes::seeded(rest.len(), seed);
        let sideways = attributes
            .angles
            .iter()
            .map(|a| plane.u_axis * a.cos() + plane.v_axis * a.sin())
            .collect();

        Ok(Self {
            positions: rest.clone(),
            rest,
            uvs,
            sideways,
            intensities: attributes.intensities,
            normal: plane.normal(),
            config,
        })
    }

    /// A `(columns + 1) x (rows + 1)` lattice of particles covering the whole plane,
    /// top row first.
    pub fn on_plane(
        plane: &InteractivePlane,
        columns: u32,
        rows: u32,
        seed: u64,
        config: DisplacementConfig,
    ) -> FxResult<Self> {
        if columns == 0 || rows == 0 {
            return Err(FxError::InvalidResolution { width: columns, height: rows });
        }
        let count = (columns as usize + 1) * (rows as usize + 1);
        let mut rest = Vec::with_capacity(count);
        let mut uvs = Vec::with_capacity(count);
        for iy in 0..=rows {
            for ix in 0..=columns {
                let uv = Vec2::new(ix as f32 / columns as f32, 1.0 - iy as f32 / rows as f32);
                rest.push(
                    plane.center
                        + plane.u_axis * (uv.x - 0.5) * plane.size.x
                        + plane.v_axis * (uv.y - 0.5) * plane.size.y,
                );
                uvs.push(uv);
            }
        }
        Self::new(plane, rest, uvs, seed, config)
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    // displaced, as of the last update
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn apply_params(&mut self, params: &ParamRegistry) {
        self.config = self.config.read(params);
    }

    /// Lifts every particle off the plane by the trail's red channel under it, eased
    /// through `smoothstep(low, high, value)` and scaled by its own intensity.
    pub fn update(&mut self, trail: &TrailView) {
        let cfg = self.config;
        for i in 0..self.rest.len() {
            let value = trail.sample_uv(self.uvs[i]).map_or(0.0, |c| c[0]);
            let amount = smoothstep(cfg.low, cfg.high, value) * cfg.strength * self.intensities[i];
            let push = (self.sideways[i] * cfg.spread + self.normal).normalize_or_zero();
            self.positions[i] = self.rest[i] + push * amount;
        }
    }
}
