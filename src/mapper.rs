use std::sync::Arc;

use glam::{Mat4, Vec2, Vec4};
use log::{debug, error, info};

use crate::calibration::Calibration;
use crate::error::{ConfigError, SkipReason};
use crate::feed::{CameraFeed, CameraPosition, FeedSnapshot};
use crate::registry::{resolve_feed, FeedRegistry};
use crate::uniforms::{EyeUniforms, UniformParam, UniformSlot, UniformTarget};

/// Lifecycle of a [`StereoUniformMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperState {
    /// Set up, polling each tick until both feeds play. No writes yet.
    WaitingForFeeds,
    /// Readiness gate passed; uniforms are rewritten every frame.
    Streaming,
    /// Detached from the host. Nothing is written again.
    TornDown,
}

/// Maps the two passthrough camera feeds onto a shared uniform target.
pub struct StereoUniformMapper<T: UniformTarget> {
    left: Arc<dyn CameraFeed>,
    right: Arc<dyn CameraFeed>,
    target: Option<T>,
    calibration: Calibration,
    state: MapperState,
    frames_written: u64,
}

impl<T: UniformTarget> StereoUniformMapper<T> {
    /// Validates the feed assignment and target. Performs no writes.
    pub fn initialize(
        left: Option<Arc<dyn CameraFeed>>,
        right: Option<Arc<dyn CameraFeed>>,
        target: Option<T>,
        calibration: Calibration,
    ) -> Result<Self, ConfigError> {
        let left = require_feed(left, CameraPosition::Left).map_err(log_setup_error)?;
        let right = require_feed(right, CameraPosition::Right).map_err(log_setup_error)?;
        let target = target
            .ok_or(ConfigError::MissingTarget)
            .map_err(log_setup_error)?;

        Ok(Self {
            left,
            right,
            target: Some(target),
            calibration,
            state: MapperState::WaitingForFeeds,
            frames_written: 0,
        })
    }

    /// Resolves both eyes against `registry`, then initializes.
    pub fn resolve(
        configured_left: Option<Arc<dyn CameraFeed>>,
        configured_right: Option<Arc<dyn CameraFeed>>,
        registry: &dyn FeedRegistry,
        target: Option<T>,
        calibration: Calibration,
    ) -> Result<Self, ConfigError> {
        let left = resolve_feed(configured_left, CameraPosition::Left, registry);
        let right = resolve_feed(configured_right, CameraPosition::Right, registry);
        Self::initialize(left, right, target, calibration)
    }

    pub fn state(&self) -> MapperState {
        self.state
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Number of frames that produced a full parameter write.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn target_mut(&mut self) -> Option<&mut T> {
        self.target.as_mut()
    }

    pub fn feed(&self, eye: CameraPosition) -> &Arc<dyn CameraFeed> {
        match eye {
            CameraPosition::Left => &self.left,
            CameraPosition::Right => &self.right,
        }
    }

    pub fn feeds_playing(&self) -> bool {
        self.left.is_playing() && self.right.is_playing()
    }

    /// Per-frame entry point for the host loop.
    pub fn tick(&mut self) -> Result<(), SkipReason> {
        match self.state {
            MapperState::WaitingForFeeds => {
                if self.poll_readiness() {
                    Ok(())
                } else {
                    Err(SkipReason::NotReady)
                }
            }
            MapperState::Streaming => self.update(),
            MapperState::TornDown => Err(SkipReason::Detached),
        }
    }

    /// Checks the readiness gate. The first time both feeds play, binds
    /// their textures and writes every parameter once.
    pub fn poll_readiness(&mut self) -> bool {
        match self.state {
            MapperState::Streaming => true,
            MapperState::TornDown => false,
            MapperState::WaitingForFeeds => {
                if !self.feeds_playing() {
                    return false;
                }
                self.on_feeds_ready();
                true
            }
        }
    }

    fn on_feeds_ready(&mut self) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        info!("passthrough feeds are playing; binding stereo uniforms");
        self.state = MapperState::Streaming;
        for (eye, feed) in [
            (CameraPosition::Left, &self.left),
            (CameraPosition::Right, &self.right),
        ] {
            bind_texture(target, eye, &**feed);
        }
        write_frame(target, &self.left, &self.right, &self.calibration);
        self.frames_written += 1;
    }

    /// Rewrites the UV offsets, fresh textures and both eyes' pose and
    /// intrinsics. Skips without touching the target when not ready; the
    /// last written values stay in place.
    pub fn update(&mut self) -> Result<(), SkipReason> {
        match self.state {
            MapperState::TornDown => return Err(SkipReason::Detached),
            MapperState::WaitingForFeeds => return Err(SkipReason::NotReady),
            MapperState::Streaming => {}
        }
        if !self.feeds_playing() {
            return Err(SkipReason::NotReady);
        }
        let target = self.target.as_mut().ok_or(SkipReason::NotReady)?;

        write_uv_offsets(target, &self.calibration);
        for (eye, feed) in [
            (CameraPosition::Left, &self.left),
            (CameraPosition::Right, &self.right),
        ] {
            bind_texture(target, eye, &**feed);
        }
        write_eye_data(target, &self.left, &self.right);
        self.frames_written += 1;
        Ok(())
    }

    /// Detaches the mapper and hands back the target. A pending readiness
    /// check never resumes after this.
    pub fn teardown(&mut self) -> Option<T> {
        self.state = MapperState::TornDown;
        self.target.take()
    }
}

/// Converts one feed's pose and intrinsics into shader-facing values.
pub fn map_eye(feed: &dyn CameraFeed) -> EyeUniforms {
    let FeedSnapshot {
        pose,
        intrinsics,
        current_resolution: current,
    } = feed.snapshot();

    EyeUniforms {
        position: pose.position.extend(0.0),
        // Shaders project world points into the camera, so they need the
        // world-to-camera rotation.
        rotation_matrix: Mat4::from_quat(pose.rotation.inverse()),
        focal_length: intrinsics.focal_length,
        principal_point: intrinsics.principal_point,
        sensor_resolution: padded(intrinsics.sensor_resolution.as_vec2()),
        current_resolution: padded(current.as_vec2()),
    }
}

fn padded(value: Vec2) -> Vec4 {
    value.extend(0.0).extend(0.0)
}

fn require_feed(
    feed: Option<Arc<dyn CameraFeed>>,
    required: CameraPosition,
) -> Result<Arc<dyn CameraFeed>, ConfigError> {
    match feed {
        Some(feed) if feed.position() == required => Ok(feed),
        _ => Err(ConfigError::MissingFeed(required)),
    }
}

fn log_setup_error(err: ConfigError) -> ConfigError {
    error!("stereo uniform mapper setup failed: {err}");
    err
}

fn bind_texture<T: UniformTarget + ?Sized>(target: &mut T, eye: CameraPosition, feed: &dyn CameraFeed) {
    match feed.texture() {
        Some(texture) => target.set_texture(UniformSlot::new(eye, UniformParam::Texture), texture),
        None => debug!("no fresh {eye} camera frame; keeping previous texture binding"),
    }
}

fn write_uv_offsets<T: UniformTarget + ?Sized>(target: &mut T, calibration: &Calibration) {
    for eye in CameraPosition::BOTH {
        target.set_vec2(
            UniformSlot::new(eye, UniformParam::UvOffset),
            calibration.offset(eye).as_vec2(),
        );
    }
}

fn write_eye_data<T: UniformTarget + ?Sized>(
    target: &mut T,
    left: &Arc<dyn CameraFeed>,
    right: &Arc<dyn CameraFeed>,
) {
    map_eye(&**left).write_to(CameraPosition::Left, target);
    map_eye(&**right).write_to(CameraPosition::Right, target);
}

fn write_frame<T: UniformTarget + ?Sized>(
    target: &mut T,
    left: &Arc<dyn CameraFeed>,
    right: &Arc<dyn CameraFeed>,
    calibration: &Calibration,
) {
    write_uv_offsets(target, calibration);
    write_eye_data(target, left, right);
}
