use std::fmt;

use glam::{Quat, UVec2, Vec2, Vec3};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Which physical passthrough camera a feed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Left,
    Right,
}

impl CameraPosition {
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if name.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("Left"),
            Self::Right => f.write_str("Right"),
        }
    }
}

/// Opaque handle to an image owned by the capture subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Camera pose in world space (camera-to-world rotation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Pinhole camera parameters, in sensor pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intrinsics {
    pub focal_length: Vec2,
    pub principal_point: Vec2,
    pub sensor_resolution: UVec2,
}

/// Read-only view of one eye's camera data, polled once per frame.
pub trait CameraFeed: Send + Sync {
    fn position(&self) -> CameraPosition;

    fn is_playing(&self) -> bool;

    /// Image for the current frame, or `None` when no fresh frame arrived.
    fn texture(&self) -> Option<TextureHandle>;

    fn pose(&self) -> Pose;

    fn intrinsics(&self) -> Intrinsics;

    fn current_resolution(&self) -> UVec2;

    /// Pose, intrinsics and image size read together.
    ///
    /// Providers that update these from another thread should override this
    /// so a frame never mixes values from two camera updates.
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            pose: self.pose(),
            intrinsics: self.intrinsics(),
            current_resolution: self.current_resolution(),
        }
    }
}

/// Per-frame camera data captured in one read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeedSnapshot {
    pub pose: Pose,
    pub intrinsics: Intrinsics,
    pub current_resolution: UVec2,
}

#[derive(Debug, Clone, Default)]
struct FeedState {
    playing: bool,
    texture: Option<TextureHandle>,
    pose: Pose,
    intrinsics: Intrinsics,
    current_resolution: UVec2,
}

/// Thread-safe feed whose state is pushed by a capture loop or a test.
#[derive(Debug)]
pub struct SimulatedFeed {
    position: CameraPosition,
    state: RwLock<FeedState>,
}

impl SimulatedFeed {
    pub fn new(position: CameraPosition, intrinsics: Intrinsics, current_resolution: UVec2) -> Self {
        Self {
            position,
            state: RwLock::new(FeedState {
                intrinsics,
                current_resolution,
                ..FeedState::default()
            }),
        }
    }

    pub fn set_playing(&self, playing: bool) {
        self.state.write().playing = playing;
    }

    pub fn set_pose(&self, pose: Pose) {
        self.state.write().pose = pose;
    }

    pub fn set_intrinsics(&self, intrinsics: Intrinsics) {
        self.state.write().intrinsics = intrinsics;
    }

    pub fn set_current_resolution(&self, resolution: UVec2) {
        self.state.write().current_resolution = resolution;
    }

    /// Replaces pose, intrinsics and image size in one write, as a capture
    /// loop does when the camera reconfigures.
    pub fn apply(&self, snapshot: FeedSnapshot) {
        let mut state = self.state.write();
        state.pose = snapshot.pose;
        state.intrinsics = snapshot.intrinsics;
        state.current_resolution = snapshot.current_resolution;
    }

    /// Publishes a fresh frame.
    pub fn present(&self, texture: TextureHandle) {
        self.state.write().texture = Some(texture);
    }

    /// Marks the current frame as consumed; `texture()` returns `None` until
    /// the next `present`.
    pub fn clear_frame(&self) {
        self.state.write().texture = None;
    }
}

impl CameraFeed for SimulatedFeed {
    fn position(&self) -> CameraPosition {
        self.position
    }

    fn is_playing(&self) -> bool {
        self.state.read().playing
    }

    fn texture(&self) -> Option<TextureHandle> {
        self.state.read().texture
    }

    fn pose(&self) -> Pose {
        self.state.read().pose
    }

    fn intrinsics(&self) -> Intrinsics {
        self.state.read().intrinsics
    }

    fn current_resolution(&self) -> UVec2 {
        self.state.read().current_resolution
    }

    fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.read();
        FeedSnapshot {
            pose: state.pose,
            intrinsics: state.intrinsics,
            current_resolution: state.current_resolution,
        }
    }
}
