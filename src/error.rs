//! Error types shared by the simulation core and the Bevy layer.

use thiserror::Error;

/// Everything that can go wrong while building or driving an effect.
///
/// Degenerate per-frame input (NaN deltas, out-of-range slider values) never shows up
/// here; it is clamped where it enters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// A feedback simulation needs at least one particle.
    #[error("cannot seed a simulation from an empty position list")]
    EmptyInitialState,

    #[error("invalid time step {0}: must be finite and positive")]
    InvalidTimeStep(f32),

    #[error("invalid buffer resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    /// Decay is a per-frame retention factor and must lie strictly inside (0, 1).
    #[error("decay factor {0} outside (0, 1)")]
    InvalidDecay(f32),

    /// Backing storage could not be allocated, or the texture asset vanished.
    #[error("could not provide {texels} texels for {label}")]
    ResourceUnavailable { label: &'static str, texels: usize },

    #[error("mesh has no usable position attribute")]
    MissingPositions,

    #[error("asset failed to load: {0}")]
    AssetLoad(String),

    #[error("unknown parameter: {0}")]
    UnknownParam(String),

    #[error("parameter {name} is a {found}, not a {expected}")]
    ParamType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{positions} positions but {uvs} uvs")]
    LengthMismatch { positions: usize, uvs: usize },
}

pub type FxResult<T> = Result<T, FxError>;
