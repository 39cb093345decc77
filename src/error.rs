use thiserror::Error;

use crate::feed::CameraPosition;

/// Setup failure. The mapper is not created and stays inert.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no {0} passthrough camera feed is available")]
    MissingFeed(CameraPosition),
    #[error("uniform target is not assigned")]
    MissingTarget,
    #[error("{eye} UV offset {axis} = {value} is outside [-0.2, 0.0]")]
    UvOffsetOutOfRange {
        eye: CameraPosition,
        axis: char,
        value: f32,
    },
}

/// Why a frame produced no uniform writes. Transient, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("camera feeds are not playing yet")]
    NotReady,
    #[error("mapper has been torn down")]
    Detached,
}
