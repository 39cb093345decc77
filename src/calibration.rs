use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::feed::CameraPosition;

pub const UV_OFFSET_MIN: f32 = -0.2;
pub const UV_OFFSET_MAX: f32 = 0.0;

/// Per-eye UV correction. Both components lie in `[-0.2, 0.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvOffset(Vec2);

impl UvOffset {
    pub const ZERO: Self = Self(Vec2::ZERO);

    /// Validates both axes, rejecting values outside the allowed range.
    pub fn new(eye: CameraPosition, x: f32, y: f32) -> Result<Self, ConfigError> {
        let check = |axis: char, value: f32| {
            if (UV_OFFSET_MIN..=UV_OFFSET_MAX).contains(&value) {
                Ok(value)
            } else {
                Err(ConfigError::UvOffsetOutOfRange { eye, axis, value })
            }
        };
        Ok(Self(Vec2::new(check('x', x)?, check('y', y)?)))
    }

    /// Lenient constructor: clamps into range, NaN becomes zero.
    pub fn clamped(x: f32, y: f32) -> Self {
        let clamp = |value: f32| {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(UV_OFFSET_MIN, UV_OFFSET_MAX)
            }
        };
        Self(Vec2::new(clamp(x), clamp(y)))
    }

    pub fn as_vec2(self) -> Vec2 {
        self.0
    }
}

/// Configuration supplied once at setup. Not mutated by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCalibration", into = "RawCalibration")]
pub struct Calibration {
    pub left: UvOffset,
    pub right: UvOffset,
}

impl Calibration {
    pub fn new(left: UvOffset, right: UvOffset) -> Self {
        Self { left, right }
    }

    /// Builds a calibration from the four scalar offsets.
    pub fn from_scalars(
        left_x: f32,
        left_y: f32,
        right_x: f32,
        right_y: f32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            left: UvOffset::new(CameraPosition::Left, left_x, left_y)?,
            right: UvOffset::new(CameraPosition::Right, right_x, right_y)?,
        })
    }

    pub fn offset(&self, eye: CameraPosition) -> UvOffset {
        match eye {
            CameraPosition::Left => self.left,
            CameraPosition::Right => self.right,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCalibration {
    #[serde(default)]
    left_uv_offset: [f32; 2],
    #[serde(default)]
    right_uv_offset: [f32; 2],
}

impl TryFrom<RawCalibration> for Calibration {
    type Error = ConfigError;

    fn try_from(raw: RawCalibration) -> Result<Self, Self::Error> {
        let [lx, ly] = raw.left_uv_offset;
        let [rx, ry] = raw.right_uv_offset;
        Self::from_scalars(lx, ly, rx, ry)
    }
}

impl From<Calibration> for RawCalibration {
    fn from(calibration: Calibration) -> Self {
        Self {
            left_uv_offset: calibration.left.as_vec2().to_array(),
            right_uv_offset: calibration.right.as_vec2().to_array(),
        }
    }
}
