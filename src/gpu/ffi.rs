use bytemuck::{Pod, Zeroable};

use crate::cpu::feedback::ParticleTexel;

// one Rgba32Float texel; plain arrays so the layout matches WGSL vec4<f32>
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuTexel {
    pub rgba: [f32; 4],
}

impl From<ParticleTexel> for GpuTexel {
    fn from(t: ParticleTexel) -> Self {
        Self { rgba: t.to_array() }
    }
}

impl From<[f32; 4]> for GpuTexel {
    fn from(rgba: [f32; 4]) -> Self {
        Self { rgba }
    }
}

pub const TEXEL_BYTES: usize = std::mem::size_of::<GpuTexel>();
