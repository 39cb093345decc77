use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::feed::{CameraFeed, FeedSnapshot};

/// Forward axis of the capture API's camera space.
pub const CAMERA_FORWARD: Vec3 = Vec3::Z;

/// World transform for a quad that shows a camera image at a fixed distance
/// in front of the camera, sized so its content lines up with the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Places an image plane in front of a passthrough camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePlane {
    pub distance: f32,
}

impl Default for ImagePlane {
    fn default() -> Self {
        Self { distance: 1.0 }
    }
}

impl ImagePlane {
    pub fn new(distance: f32) -> Self {
        Self { distance }
    }

    /// Returns `None` while the feed is not playing or reports an empty
    /// resolution.
    pub fn place(&self, feed: &dyn CameraFeed) -> Option<PlaneTransform> {
        if !feed.is_playing() {
            return None;
        }
        let FeedSnapshot {
            pose,
            intrinsics,
            current_resolution: image,
        } = feed.snapshot();
        let sensor = intrinsics.sensor_resolution;
        if sensor.x == 0 || image.x == 0 {
            return None;
        }

        let scale_x = 2.0 * self.distance * intrinsics.focal_length.x / sensor.x as f32;
        let scale_y = scale_x * (image.y as f32 / image.x as f32);

        Some(PlaneTransform {
            position: pose.position + pose.rotation * CAMERA_FORWARD * self.distance,
            rotation: pose.rotation,
            scale: Vec3::new(scale_x, scale_y, 1.0),
        })
    }
}
