pub mod error;
pub mod params;
pub mod trail_material;

pub mod cpu {
    pub mod attributes;
    pub mod displacement;
    pub mod feedback;
    pub mod kernels;
    pub mod projection;
    pub mod trail;
}

pub mod gpu {
    pub mod ffi;
    pub mod plugin;
    pub mod textures;
}

pub use error::{FxError, FxResult};
pub use params::{ParamRegistry, ParamValue};
