// ready-made simulation kernels
use glam::Vec3;

use crate::cpu::attributes::ParticleAttributes;
use crate::cpu::feedback::{ParticleTexel, SimulationKernel, StepContext};
use crate::params::ParamRegistry;

/// Leaves every cell untouched.
pub struct Stationary;

impl SimulationKernel for Stationary {
    fn update(&self, texel: ParticleTexel, _ctx: &StepContext) -> ParticleTexel {
        texel
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowFieldConfig {
    pub influence: f32, // how much of the cloud moves at all (0 = everything)
    pub strength: f32,
    pub frequency: f32,
    pub lifetime_decay: f32, // lifetime gained per second
}

impl Default for FlowFieldConfig {
    fn default() -> Self {
        Self { influence: 0.5, strength: 2.0, frequency: 0.5, lifetime_decay: 0.1 }
    }
}

impl FlowFieldConfig {
    pub const INFLUENCE: &'static str = "flow_field_influence";
    pub const STRENGTH: &'static str = "flow_field_strength";
    pub const FREQUENCY: &'static str = "flow_field_frequency";
    pub const LIFETIME_DECAY: &'static str = "flow_field_lifetime_decay";

    pub fn register(&self, params: &mut ParamRegistry) {
        params.register_float(Self::INFLUENCE, self.influence, 0.0, 1.0);
        params.register_float(Self::STRENGTH, self.strength, 0.0, 10.0);
        params.register_float(Self::FREQUENCY, self.frequency, 0.0, 1.0);
        params.register_float(Self::LIFETIME_DECAY, self.lifetime_decay, 0.0, 1.0);
    }

    /// Missing entries fall back to the current values.
    pub fn read(&self, params: &ParamRegistry) -> Self {
        Self {
            influence: params.float_or(Self::INFLUENCE, self.influence),
            strength: params.float_or(Self::STRENGTH, self.strength),
            frequency: params.float_or(Self::FREQUENCY, self.frequency),
            lifetime_decay: params.float_or(Self::LIFETIME_DECAY, self.lifetime_decay),
        }
    }
}

/// Particles drift along a noise flow field, age through the reserved slot, and
/// respawn at their base position once their lifetime wraps past 1.
pub struct FlowFieldKernel {
    base: Vec<ParticleTexel>,
    pub config: FlowFieldConfig,
}

impl FlowFieldKernel {
    /// `base` holds respawn positions with a starting lifetime phase in `aux`.
    pub fn new(base: Vec<ParticleTexel>, config: FlowFieldConfig) -> Self {
        Self { base, config }
    }

    /// Base positions with lifetime phases drawn from seeded attributes.
    pub fn seeded(positions: &[Vec3], seed: u64, config: FlowFieldConfig) -> Self {
        let attributes = ParticleAttributes::seeded(positions.len(), seed);
        let base = positions
            .iter()
            .zip(&attributes.phases)
            .map(|(&pos, &phase)| ParticleTexel::new(pos, phase))
            .collect();
        Self::new(base, config)
    }
}

impl SimulationKernel for FlowFieldKernel {
    fn update(&self, texel: ParticleTexel, ctx: &StepContext) -> ParticleTexel {
        let Some(base) = self.base.get(ctx.index).copied() else {
            return texel;
        };
        let cfg = self.config;
        let time = ctx.elapsed * 0.2;

        // aux is the age since seeding; the base phase staggers when each particle wraps
        let mut out = texel;
        out.aux += ctx.delta * cfg.lifetime_decay;
        let lifetime = out.aux + base.aux;
        if lifetime >= 1.0 {
            out.aux = lifetime.fract() - base.aux;
            out.pos = base.pos;
            return out;
        }

        let gate = value_noise(base.pos * 0.2 + Vec3::splat(time + 1.0));
        let strength = smoothstep(cfg.influence, 1.0, gate);

        let p = texel.pos * cfg.frequency;
        let flow = Vec3::new(
            value_noise(p + Vec3::new(0.0, time, 0.0)),
            value_noise(p + Vec3::new(1.0, time, 0.0)),
            value_noise(p + Vec3::new(2.0, time, 0.0)),
        )
        .normalize_or_zero();

        out.pos += flow * ctx.delta * strength * cfg.strength;
        out
    }

    fn apply_params(&mut self, params: &ParamRegistry) {
        self.config = self.config.read(params);
    }
}

#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// lattice hash -> [-1, 1]
#[inline]
fn hash3(x: i32, y: i32, z: i32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// Smooth 3D value noise in [-1, 1]. Deterministic, no tables.
pub fn value_noise(p: Vec3) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let (x, y, z) = (cell.x as i32, cell.y as i32, cell.z as i32);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let x00 = lerp(hash3(x, y, z), hash3(x + 1, y, z), u.x);
    let x10 = lerp(hash3(x, y + 1, z), hash3(x + 1, y + 1, z), u.x);
    let x01 = lerp(hash3(x, y, z + 1), hash3(x + 1, y, z + 1), u.x);
    let x11 = lerp(hash3(x, y + 1, z + 1), hash3(x + 1, y + 1, z + 1), u.x);
    lerp(lerp(x00, x10, u.y), lerp(x01, x11, u.y), u.z)
}
