use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec4};

use crate::feed::{CameraPosition, TextureHandle};

/// Shader parameter written for each eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformParam {
    Texture,
    Position,
    RotationMatrix,
    FocalLength,
    PrincipalPoint,
    SensorResolution,
    CurrentResolution,
    UvOffset,
}

impl UniformParam {
    pub const ALL: [Self; 8] = [
        Self::Texture,
        Self::Position,
        Self::RotationMatrix,
        Self::FocalLength,
        Self::PrincipalPoint,
        Self::SensorResolution,
        Self::CurrentResolution,
        Self::UvOffset,
    ];
}

/// A uniform slot: one parameter of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformSlot {
    pub eye: CameraPosition,
    pub param: UniformParam,
}

impl UniformSlot {
    pub const fn new(eye: CameraPosition, param: UniformParam) -> Self {
        Self { eye, param }
    }

    /// Every slot, left eye first.
    pub fn all() -> impl Iterator<Item = Self> {
        CameraPosition::BOTH
            .into_iter()
            .flat_map(|eye| UniformParam::ALL.into_iter().map(move |param| Self::new(eye, param)))
    }

    /// Shader property name used by material-based hosts.
    pub fn shader_name(self) -> &'static str {
        use CameraPosition::{Left, Right};
        match (self.eye, self.param) {
            (Left, UniformParam::Texture) => "_LeftTex",
            (Right, UniformParam::Texture) => "_RightTex",
            (Left, UniformParam::Position) => "_LeftCameraPos",
            (Right, UniformParam::Position) => "_RightCameraPos",
            (Left, UniformParam::RotationMatrix) => "_LeftCameraRotationMatrix",
            (Right, UniformParam::RotationMatrix) => "_RightCameraRotationMatrix",
            (Left, UniformParam::FocalLength) => "_LeftFocalLength",
            (Right, UniformParam::FocalLength) => "_RightFocalLength",
            (Left, UniformParam::PrincipalPoint) => "_LeftPrincipalPoint",
            (Right, UniformParam::PrincipalPoint) => "_RightPrincipalPoint",
            (Left, UniformParam::SensorResolution) => "_LeftSensorResolution",
            (Right, UniformParam::SensorResolution) => "_RightSensorResolution",
            (Left, UniformParam::CurrentResolution) => "_LeftCurrentResolution",
            (Right, UniformParam::CurrentResolution) => "_RightCurrentResolution",
            (Left, UniformParam::UvOffset) => "_LeftUvOffset",
            (Right, UniformParam::UvOffset) => "_RightUvOffset",
        }
    }
}

/// Destination for shader parameters. Write-only; no read-back is required.
pub trait UniformTarget {
    fn set_texture(&mut self, slot: UniformSlot, texture: TextureHandle);

    fn set_vec2(&mut self, slot: UniformSlot, value: Vec2);

    fn set_vec4(&mut self, slot: UniformSlot, value: Vec4);

    fn set_mat4(&mut self, slot: UniformSlot, value: Mat4);
}

impl<T: UniformTarget + ?Sized> UniformTarget for &mut T {
    fn set_texture(&mut self, slot: UniformSlot, texture: TextureHandle) {
        (**self).set_texture(slot, texture)
    }

    fn set_vec2(&mut self, slot: UniformSlot, value: Vec2) {
        (**self).set_vec2(slot, value)
    }

    fn set_vec4(&mut self, slot: UniformSlot, value: Vec4) {
        (**self).set_vec4(slot, value)
    }

    fn set_mat4(&mut self, slot: UniformSlot, value: Mat4) {
        (**self).set_mat4(slot, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Texture(TextureHandle),
    Vec2(Vec2),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// In-memory uniform destination that also counts writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    values: HashMap<UniformSlot, UniformValue>,
    writes: usize,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: UniformSlot) -> Option<UniformValue> {
        self.values.get(&slot).copied()
    }

    pub fn texture(&self, slot: UniformSlot) -> Option<TextureHandle> {
        match self.get(slot)? {
            UniformValue::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn vec2(&self, slot: UniformSlot) -> Option<Vec2> {
        match self.get(slot)? {
            UniformValue::Vec2(value) => Some(value),
            _ => None,
        }
    }

    pub fn vec4(&self, slot: UniformSlot) -> Option<Vec4> {
        match self.get(slot)? {
            UniformValue::Vec4(value) => Some(value),
            _ => None,
        }
    }

    pub fn mat4(&self, slot: UniformSlot) -> Option<Mat4> {
        match self.get(slot)? {
            UniformValue::Mat4(value) => Some(value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total number of writes received, including overwrites.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Stored values in slot order.
    pub fn entries(&self) -> Vec<(UniformSlot, UniformValue)> {
        UniformSlot::all()
            .filter_map(|slot| self.get(slot).map(|value| (slot, value)))
            .collect()
    }

    fn store(&mut self, slot: UniformSlot, value: UniformValue) {
        self.values.insert(slot, value);
        self.writes += 1;
    }
}

impl UniformTarget for UniformSet {
    fn set_texture(&mut self, slot: UniformSlot, texture: TextureHandle) {
        self.store(slot, UniformValue::Texture(texture));
    }

    fn set_vec2(&mut self, slot: UniformSlot, value: Vec2) {
        self.store(slot, UniformValue::Vec2(value));
    }

    fn set_vec4(&mut self, slot: UniformSlot, value: Vec4) {
        self.store(slot, UniformValue::Vec4(value));
    }

    fn set_mat4(&mut self, slot: UniformSlot, value: Mat4) {
        self.store(slot, UniformValue::Mat4(value));
    }
}

/// Shader-facing representation of one eye's pose and intrinsics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeUniforms {
    pub position: Vec4,
    pub rotation_matrix: Mat4,
    pub focal_length: Vec2,
    pub principal_point: Vec2,
    pub sensor_resolution: Vec4,
    pub current_resolution: Vec4,
}

impl EyeUniforms {
    /// Writes the six pose/intrinsics parameters for `eye`.
    pub fn write_to<T: UniformTarget + ?Sized>(&self, eye: CameraPosition, target: &mut T) {
        let slot = |param| UniformSlot::new(eye, param);
        target.set_vec4(slot(UniformParam::Position), self.position);
        target.set_mat4(slot(UniformParam::RotationMatrix), self.rotation_matrix);
        target.set_vec2(slot(UniformParam::FocalLength), self.focal_length);
        target.set_vec2(slot(UniformParam::PrincipalPoint), self.principal_point);
        target.set_vec4(slot(UniformParam::SensorResolution), self.sensor_resolution);
        target.set_vec4(slot(UniformParam::CurrentResolution), self.current_resolution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn slot_names_are_unique() {
        let names: HashSet<_> = UniformSlot::all().map(UniformSlot::shader_name).collect();
        assert_eq!(names.len(), 16);
        assert_eq!(
            UniformSlot::new(CameraPosition::Right, UniformParam::RotationMatrix).shader_name(),
            "_RightCameraRotationMatrix"
        );
    }

    #[test]
    fn uniform_set_counts_overwrites() {
        let slot = UniformSlot::new(CameraPosition::Left, UniformParam::UvOffset);
        let mut set = UniformSet::new();
        set.set_vec2(slot, Vec2::new(-0.1, 0.0));
        set.set_vec2(slot, Vec2::new(-0.2, 0.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.write_count(), 2);
        assert_eq!(set.vec2(slot), Some(Vec2::new(-0.2, 0.0)));
        assert_eq!(set.vec4(slot), None);
    }
}
