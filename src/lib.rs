//! Binds a headset's stereo passthrough camera feeds to shader uniforms.
//!
//! Each frame the [`StereoUniformMapper`] reads pose and pinhole intrinsics
//! from the left and right feeds and writes the shader-facing values into a
//! [`UniformTarget`]. Engine integration stays outside of the crate: feeds,
//! feed discovery and the uniform destination are traits, so the mapping can
//! run headless in tests and tools.

pub mod app;
pub mod calibration;
pub mod error;
pub mod feed;
pub mod gpu;
pub mod mapper;
pub mod plane;
pub mod registry;
pub mod rig;
pub mod uniforms;

pub use calibration::{Calibration, UvOffset};
pub use error::{ConfigError, SkipReason};
pub use feed::{
    CameraFeed, CameraPosition, FeedSnapshot, Intrinsics, Pose, SimulatedFeed, TextureHandle,
};
pub use gpu::{GpuUniformBuffer, PackedUniforms, StereoUniformBlock, STEREO_CAMERA_WGSL};
pub use mapper::{map_eye, MapperState, StereoUniformMapper};
pub use plane::{ImagePlane, PlaneTransform};
pub use registry::{resolve_feed, FeedList, FeedRegistry};
pub use rig::{Rig, RigFeed};
pub use uniforms::{EyeUniforms, UniformParam, UniformSet, UniformSlot, UniformTarget, UniformValue};
