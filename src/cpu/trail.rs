// persistent decaying paint canvas driven by the cursor (glowing trails / displacement)
use glam::Vec2;
use bevy::log::debug;
use bevy::prelude::Resource;

use crate::cpu::projection::{InteractivePlane, ProjectionSurface, Ray};
use crate::error::{FxError, FxResult};
use crate::params::ParamRegistry;

pub type Rgba = [f32; 4];

const GLOW_SAMPLES: usize = 64;

/// Pre-rendered radial profile of the paint brush: 1 at the centre, 0 at the rim.
#[derive(Clone, Debug, PartialEq)]
pub struct GlowSprite {
    samples: Vec<f32>,
}

impl GlowSprite {
    pub fn soft() -> Self {
        let samples = (0..GLOW_SAMPLES)
            .map(|i| {
                let d = i as f32 / (GLOW_SAMPLES - 1) as f32;
                let t = 1.0 - d;
                t * t * (3.0 - 2.0 * t)
            })
            .collect();
        Self { samples }
    }

    /// `d` is the distance from the centre in radii.
    pub fn sample(&self, d: f32) -> f32 {
        if !(d >= 0.0) || d >= 1.0 {
            return 0.0;
        }
        let x = d * (self.samples.len() - 1) as f32;
        let i = x.floor() as usize;
        let j = (i + 1).min(self.samples.len() - 1);
        let f = x - i as f32;
        self.samples[i] + (self.samples[j] - self.samples[i]) * f
    }
}

impl Default for GlowSprite {
    fn default() -> Self {
        Self::soft()
    }
}

/// One paint event, in buffer space (cell `(x, y)` spans `[x, x+1) x [y, y+1)`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stamp {
    pub center: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailConfig {
    pub width: u32,
    pub height: u32,
    pub decay: f32,
    pub speed_gain: f32,
    pub glow_ratio: f32, // brush diameter as a fraction of the buffer width
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self { width: 128, height: 128, decay: 0.98, speed_gain: 0.1, glow_ratio: 0.15 }
    }
}

impl TrailConfig {
    pub const WIDTH: &'static str = "trail_width";
    pub const HEIGHT: &'static str = "trail_height";
    pub const DECAY: &'static str = "trail_decay";
    pub const SPEED_GAIN: &'static str = "trail_speed_gain";
    pub const GLOW_RATIO: &'static str = "trail_glow_ratio";

    pub fn register(&self, params: &mut ParamRegistry) {
        params.register_float(Self::WIDTH, self.width as f32, 8.0, 1024.0);
        params.register_float(Self::HEIGHT, self.height as f32, 8.0, 1024.0);
        params.register_float(Self::DECAY, self.decay, 0.5, 0.999);
        params.register_float(Self::SPEED_GAIN, self.speed_gain, 0.0, 1.0);
        params.register_float(Self::GLOW_RATIO, self.glow_ratio, 0.01, 1.0);
    }

    pub fn read(&self, params: &ParamRegistry) -> Self {
        Self {
            width: params.float_or(Self::WIDTH, self.width as f32).round() as u32,
            height: params.float_or(Self::HEIGHT, self.height as f32).round() as u32,
            decay: params.float_or(Self::DECAY, self.decay),
            speed_gain: params.float_or(Self::SPEED_GAIN, self.speed_gain),
            glow_ratio: params.float_or(Self::GLOW_RATIO, self.glow_ratio),
        }
    }
}

#[derive(Resource, Clone, Debug)]
pub struct TrailBuffer {
    width: u32,
    height: u32,
    decay: f32,
    speed_gain: f32,
    glow_ratio: f32,
    glow: GlowSprite,
    cells: Vec<Rgba>,
    cursor: Option<Vec2>,          // None until the first projection lands
    previous_cursor: Option<Vec2>, // cursor at the last tick
    ticks: u64,
}

impl TrailBuffer {
    pub fn new(width: u32, height: u32, decay: f32) -> FxResult<Self> {
        Self::from_config(&TrailConfig { width, height, decay, ..TrailConfig::default() })
    }

    pub fn from_config(config: &TrailConfig) -> FxResult<Self> {
        if !(config.decay > 0.0 && config.decay < 1.0) {
            return Err(FxError::InvalidDecay(config.decay));
        }
        let cells = alloc_cells(config.width, config.height)?;
        let defaults = TrailConfig::default();
        Ok(Self {
            width: config.width,
            height: config.height,
            decay: config.decay,
            speed_gain: finite_or(config.speed_gain, defaults.speed_gain).max(0.0),
            glow_ratio: finite_or(config.glow_ratio, defaults.glow_ratio).max(0.0),
            glow: GlowSprite::soft(),
            cells,
            cursor: None,
            previous_cursor: None,
            ticks: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn speed_gain(&self) -> f32 {
        self.speed_gain
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    // in cells
    pub fn glow_radius(&self) -> f32 {
        self.width as f32 * self.glow_ratio * 0.5
    }

    /// Out-of-range decay is clamped into (0, 1); NaN is ignored.
    pub fn set_decay(&mut self, decay: f32) {
        if decay.is_nan() {
            return;
        }
        let clamped = decay.clamp(f32::EPSILON, 1.0 - f32::EPSILON);
        if clamped != decay {
            debug!("trail decay clamped from {decay} to {clamped}");
        }
        self.decay = clamped;
    }

    pub fn set_speed_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.speed_gain = gain.max(0.0);
        }
    }

    pub fn set_glow_ratio(&mut self, ratio: f32) {
        if ratio.is_finite() {
            self.glow_ratio = ratio.max(0.0);
        }
    }

    /// Reallocates (zero-filled) only if the resolution actually changes. The cursor is
    /// forgotten since it lived in the old buffer space.
    pub fn resize(&mut self, width: u32, height: u32) -> FxResult<bool> {
        if width == self.width && height == self.height {
            return Ok(false);
        }
        self.cells = alloc_cells(width, height)?;
        self.width = width;
        self.height = height;
        self.cursor = None;
        self.previous_cursor = None;
        debug!("trail buffer resized to {width}x{height}");
        Ok(true)
    }

    pub fn apply_params(&mut self, params: &ParamRegistry) -> FxResult<bool> {
        let current = TrailConfig {
            width: self.width,
            height: self.height,
            decay: self.decay,
            speed_gain: self.speed_gain,
            glow_ratio: self.glow_ratio,
        };
        let next = current.read(params);
        self.set_decay(next.decay);
        self.set_speed_gain(next.speed_gain);
        self.set_glow_ratio(next.glow_ratio);
        self.resize(next.width, next.height)
    }

    /// Maps a normalized screen point into buffer space. On a miss the previous cursor
    /// stays where it was.
    pub fn project_cursor(&mut self, ndc: Vec2, surface: &ProjectionSurface) -> Option<Vec2> {
        let uv = surface.project(ndc);
        self.land(uv)
    }

    // same as above for callers that already have a world-space pick ray
    pub fn project_ray(&mut self, ray: &Ray, plane: &InteractivePlane) -> Option<Vec2> {
        let uv = plane.intersect_uv(ray);
        self.land(uv)
    }

    fn land(&mut self, uv: Option<Vec2>) -> Option<Vec2> {
        if let Some(uv) = uv {
            self.set_cursor(Vec2::new(
                uv.x * self.width as f32,
                (1.0 - uv.y) * self.height as f32,
            ));
        }
        self.cursor
    }

    // buffer space; non-finite points are ignored
    pub fn set_cursor(&mut self, point: Vec2) {
        if point.is_finite() {
            self.cursor = Some(point);
        }
    }

    pub fn cursor_travel(&self) -> f32 {
        match (self.previous_cursor, self.cursor) {
            (Some(prev), Some(now)) => prev.distance(now),
            _ => 0.0,
        }
    }

    pub fn advance(&mut self) {
        let travel = self.cursor_travel();
        self.tick(travel);
    }

    /// Decay everything, then stamp at the cursor with an opacity that follows speed.
    pub fn tick(&mut self, cursor_distance: f32) {
        self.decay_pass();

        let distance = if cursor_distance.is_finite() { cursor_distance.max(0.0) } else { 0.0 };
        if let Some(center) = self.cursor {
            let alpha = (distance * self.speed_gain).min(1.0);
            if alpha > 0.0 {
                self.stamp(Stamp { center, radius: self.glow_radius(), alpha });
            }
        }

        self.previous_cursor = self.cursor;
        self.ticks += 1;
    }

    pub fn decay_pass(&mut self) {
        let decay = self.decay;
        for cell in &mut self.cells {
            for c in cell.iter_mut() {
                *c *= decay;
            }
        }
    }

    /// Lighten-composites the glow sprite: `dst + alpha * (max(dst, src) - dst)`.
    pub fn stamp(&mut self, stamp: Stamp) {
        let alpha = if stamp.alpha.is_finite() { stamp.alpha.clamp(0.0, 1.0) } else { 0.0 };
        if alpha == 0.0 || !stamp.center.is_finite() || !(stamp.radius > 0.0) {
            return;
        }

        let min = (stamp.center - Vec2::splat(stamp.radius)).floor().max(Vec2::ZERO);
        let max = (stamp.center + Vec2::splat(stamp.radius))
            .ceil()
            .min(Vec2::new(self.width as f32, self.height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let d = self.cell_center(x, y).distance(stamp.center) / stamp.radius;
                let src = self.glow.sample(d);
                if src <= 0.0 {
                    continue;
                }
                let idx = (y * self.width + x) as usize;
                for c in self.cells[idx].iter_mut() {
                    *c += alpha * (c.max(src) - *c);
                }
            }
        }
    }

    pub fn cell_center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
    }

    pub fn sample(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[(y * self.width + x) as usize])
    }

    pub fn total_intensity(&self) -> f32 {
        self.cells.iter().flatten().sum()
    }

    pub fn clear(&mut self) {
        self.cells.fill([0.0; 4]);
    }

    /// Upper bound on ticks for a unit value to fall below `threshold`.
    pub fn ticks_to_fade(&self, threshold: f32) -> u32 {
        if !(threshold > 0.0) {
            return u32::MAX;
        }
        if threshold >= 1.0 {
            return 0;
        }
        (threshold.ln() / self.decay.ln()).ceil() as u32
    }

    // row-major, top row first
    pub fn as_texture(&self) -> TrailView<'_> {
        TrailView { width: self.width, height: self.height, cells: &self.cells }
    }
}

/// Read-only view handed to consumers.
#[derive(Clone, Copy, Debug)]
pub struct TrailView<'a> {
    pub width: u32,
    pub height: u32,
    pub cells: &'a [Rgba],
}

impl TrailView<'_> {
    /// Nearest cell under a plane UV, using the same flip as cursor projection so a
    /// consumer on the plane reads the paint right under it. UVs outside [0, 1] clamp
    /// to the border.
    pub fn sample_uv(&self, uv: Vec2) -> Option<Rgba> {
        if !uv.is_finite() || self.width == 0 || self.height == 0 {
            return None;
        }
        let x = (uv.x * self.width as f32).floor().clamp(0.0, (self.width - 1) as f32) as u32;
        let y = ((1.0 - uv.y) * self.height as f32)
            .floor()
            .clamp(0.0, (self.height - 1) as f32) as u32;
        self.cells.get((y * self.width + x) as usize).copied()
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn alloc_cells(width: u32, height: u32) -> FxResult<Vec<Rgba>> {
    if width == 0 || height == 0 {
        return Err(FxError::InvalidResolution { width, height });
    }
    let texels = width as usize * height as usize;
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(texels)
        .map_err(|_| FxError::ResourceUnavailable { label: "trail buffer", texels })?;
    cells.resize(texels, [0.0; 4]);
    Ok(cells)
}
