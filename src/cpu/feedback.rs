// feedback ("GPGPU") particle simulation: ping-pong grids advanced by a per-cell kernel
use glam::{UVec2, Vec2, Vec3};
use bevy::log::debug;
use bevy::prelude::Resource;

use crate::error::{FxError, FxResult};
use crate::params::ParamRegistry;

/// One record of the state grid: a position plus a spare scalar
/// (lifetime, phase, seed... whatever the kernel wants).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleTexel {
    pub pos: Vec3,
    pub aux: f32,
}

impl ParticleTexel {
    pub const ZERO: Self = Self { pos: Vec3::ZERO, aux: 0.0 };

    pub fn new(pos: Vec3, aux: f32) -> Self {
        Self { pos, aux }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.pos.x, self.pos.y, self.pos.z, self.aux]
    }
}

/// Everything a kernel may look at while updating one cell.
pub struct StepContext<'a> {
    pub elapsed: f32,
    pub delta: f32,
    pub cell: UVec2,
    pub index: usize,
    pub side: u32,
    previous: &'a [ParticleTexel],
}

impl StepContext<'_> {
    /// Reads a cell of the previous completed frame. Out-of-grid cells read as zero.
    pub fn sample(&self, cell: UVec2) -> ParticleTexel {
        if cell.x >= self.side || cell.y >= self.side {
            return ParticleTexel::ZERO;
        }
        self.previous[(cell.y * self.side + cell.x) as usize]
    }

    /// Normalized sampling coordinate of the cell being updated.
    pub fn uv(&self) -> Vec2 {
        cell_uv(self.cell, self.side)
    }
}

/// Per-cell update rule. Must be a pure function of its inputs.
pub trait SimulationKernel: Send + Sync + 'static {
    fn update(&self, texel: ParticleTexel, ctx: &StepContext) -> ParticleTexel;

    /// Pull tunables for the coming frame. Most kernels have none.
    fn apply_params(&mut self, _params: &ParamRegistry) {}
}

impl<F> SimulationKernel for F
where
    F: Fn(ParticleTexel, &StepContext) -> ParticleTexel + Send + Sync + 'static,
{
    fn update(&self, texel: ParticleTexel, ctx: &StepContext) -> ParticleTexel {
        self(texel, ctx)
    }
}

/// Smallest square side that holds `count` cells.
pub fn grid_side(count: usize) -> u32 {
    let mut side = (count as f64).sqrt().ceil() as usize;
    // float sqrt can be off by one for large counts
    while side * side < count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side as u32
}

#[inline]
pub fn cell_uv(cell: UVec2, side: u32) -> Vec2 {
    (cell.as_vec2() + Vec2::splat(0.5)) / side as f32
}

/// Sampling coordinate for each of the first `count` particles.
pub fn particle_uvs(side: u32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let i = i as u32;
            cell_uv(UVec2::new(i % side, i / side), side)
        })
        .collect()
}

/// Negative, NaN and zero deltas all become 0; anything else is capped at `max_step`.
#[inline]
pub fn sanitize_delta(delta: f32, max_step: f32) -> f32 {
    if delta > 0.0 { delta.min(max_step) } else { 0.0 }
}

/// Read-only view of a completed state grid.
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    side: u32,
    count: usize,
    texels: &'a [ParticleTexel],
}

impl<'a> StateView<'a> {
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }

    /// Every cell of the grid, padding included, row-major.
    pub fn texels(&self) -> &'a [ParticleTexel] {
        self.texels
    }

    /// Only the cells that belong to a particle.
    pub fn particles(&self) -> &'a [ParticleTexel] {
        &self.texels[..self.count]
    }

    pub fn get(&self, index: usize) -> Option<ParticleTexel> {
        if index < self.count { Some(self.texels[index]) } else { None }
    }

    pub fn at(&self, cell: UVec2) -> Option<ParticleTexel> {
        if cell.x >= self.side || cell.y >= self.side {
            return None;
        }
        self.get((cell.y * self.side + cell.x) as usize)
    }
}

#[derive(Resource)]
pub struct FeedbackSim {
    side: u32,
    count: usize,
    buffers: [Vec<ParticleTexel>; 2],
    current: usize, // index of the last completed grid
    max_step: f32,
    steps: u64,
    kernel: Box<dyn SimulationKernel>,
}

impl FeedbackSim {
    /// Seeds cell `i` with `initial_positions[i]`; padding cells stay zero.
    /// `time_step` caps how far a single `step` may advance.
    pub fn new(
        initial_positions: &[Vec3],
        time_step: f32,
        kernel: impl SimulationKernel,
    ) -> FxResult<Self> {
        Self::with_boxed_kernel(initial_positions, time_step, Box::new(kernel))
    }

    pub fn with_boxed_kernel(
        initial_positions: &[Vec3],
        time_step: f32,
        kernel: Box<dyn SimulationKernel>,
    ) -> FxResult<Self> {
        if initial_positions.is_empty() {
            return Err(FxError::EmptyInitialState);
        }
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(FxError::InvalidTimeStep(time_step));
        }

        let count = initial_positions.len();
        let side = grid_side(count);
        let cells = side as usize * side as usize;

        let mut front = alloc_grid(cells)?;
        let back = alloc_grid(cells)?;
        for (texel, &pos) in front.iter_mut().zip(initial_positions) {
            texel.pos = pos;
        }

        debug!("feedback sim seeded: {count} particles on a {side}x{side} grid");

        Ok(Self {
            side,
            count,
            buffers: [front, back],
            current: 0,
            max_step: time_step,
            steps: 0,
            kernel,
        })
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn particle_count(&self) -> usize {
        self.count
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn time_step(&self) -> f32 {
        self.max_step
    }

    pub fn apply_params(&mut self, params: &ParamRegistry) {
        self.kernel.apply_params(params);
    }

    /// Runs the kernel once over every live cell, reading the previous grid and
    /// writing the other one, then swaps.
    pub fn step(&mut self, elapsed: f32, delta: f32) {
        let delta = sanitize_delta(delta, self.max_step);
        let elapsed = if elapsed.is_finite() { elapsed } else { 0.0 };

        let (first, second) = self.buffers.split_at_mut(1);
        let (src, dst) = if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };

        let side = self.side;
        for index in 0..self.count {
            let i = index as u32;
            let ctx = StepContext {
                elapsed,
                delta,
                cell: UVec2::new(i % side, i / side),
                index,
                side,
                previous: src,
            };
            dst[index] = self.kernel.update(src[index], &ctx);
        }

        self.current ^= 1;
        self.steps += 1;
    }

    /// The most recently completed grid.
    pub fn current_texture(&self) -> StateView<'_> {
        StateView {
            side: self.side,
            count: self.count,
            texels: &self.buffers[self.current],
        }
    }

    pub fn particle_uvs(&self) -> Vec<Vec2> {
        particle_uvs(self.side, self.count)
    }
}

fn alloc_grid(cells: usize) -> FxResult<Vec<ParticleTexel>> {
    let mut grid = Vec::new();
    grid.try_reserve_exact(cells)
        .map_err(|_| FxError::ResourceUnavailable { label: "feedback grid", texels: cells })?;
    grid.resize(cells, ParticleTexel::ZERO);
    Ok(grid)
}
