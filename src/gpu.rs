use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};
use log::warn;

use crate::feed::{CameraPosition, TextureHandle};
use crate::uniforms::{UniformParam, UniformSlot, UniformTarget};

/// WGSL declaration matching [`StereoUniformBlock`].
pub const STEREO_CAMERA_WGSL: &str = r#"
struct EyeCamera {
    rotation: mat4x4<f32>,
    position: vec4<f32>,
    // focal length in xy, principal point in zw
    lens: vec4<f32>,
    sensor_resolution: vec4<f32>,
    current_resolution: vec4<f32>,
    uv_offset: vec4<f32>,
}

struct StereoCamera {
    left: EyeCamera,
    right: EyeCamera,
}
"#;

/// One eye's uniforms in GPU layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EyeBlock {
    pub rotation: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub lens: [f32; 4],
    pub sensor_resolution: [f32; 4],
    pub current_resolution: [f32; 4],
    pub uv_offset: [f32; 4],
}

impl Default for EyeBlock {
    fn default() -> Self {
        Self {
            rotation: Mat4::IDENTITY.to_cols_array_2d(),
            ..Self::zeroed()
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct StereoUniformBlock {
    pub left: EyeBlock,
    pub right: EyeBlock,
}

impl StereoUniformBlock {
    pub fn eye(&self, eye: CameraPosition) -> &EyeBlock {
        match eye {
            CameraPosition::Left => &self.left,
            CameraPosition::Right => &self.right,
        }
    }

    fn eye_mut(&mut self, eye: CameraPosition) -> &mut EyeBlock {
        match eye {
            CameraPosition::Left => &mut self.left,
            CameraPosition::Right => &mut self.right,
        }
    }
}

/// Uniform target that packs writes into a [`StereoUniformBlock`]. Texture
/// bindings are kept beside the block for the host to build bind groups.
#[derive(Debug, Clone, Default)]
pub struct PackedUniforms {
    block: StereoUniformBlock,
    textures: [Option<TextureHandle>; 2],
    dirty: bool,
}

impl PackedUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self) -> &StereoUniformBlock {
        &self.block
    }

    pub fn texture(&self, eye: CameraPosition) -> Option<TextureHandle> {
        self.textures[eye.index()]
    }

    /// True when the block changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn store(&mut self, slot: UniformSlot, value: Vec4) {
        let eye = self.block.eye_mut(slot.eye);
        match slot.param {
            UniformParam::Position => eye.position = value.to_array(),
            UniformParam::FocalLength => {
                eye.lens[0] = value.x;
                eye.lens[1] = value.y;
            }
            UniformParam::PrincipalPoint => {
                eye.lens[2] = value.x;
                eye.lens[3] = value.y;
            }
            UniformParam::SensorResolution => eye.sensor_resolution = value.to_array(),
            UniformParam::CurrentResolution => eye.current_resolution = value.to_array(),
            UniformParam::UvOffset => eye.uv_offset = value.to_array(),
            UniformParam::Texture | UniformParam::RotationMatrix => {
                warn!("{} does not hold a vector; write ignored", slot.shader_name());
                return;
            }
        }
        self.dirty = true;
    }
}

impl UniformTarget for PackedUniforms {
    fn set_texture(&mut self, slot: UniformSlot, texture: TextureHandle) {
        if slot.param != UniformParam::Texture {
            warn!("{} does not hold a texture; write ignored", slot.shader_name());
            return;
        }
        self.textures[slot.eye.index()] = Some(texture);
    }

    fn set_vec2(&mut self, slot: UniformSlot, value: Vec2) {
        self.store(slot, value.extend(0.0).extend(0.0));
    }

    fn set_vec4(&mut self, slot: UniformSlot, value: Vec4) {
        self.store(slot, value);
    }

    fn set_mat4(&mut self, slot: UniformSlot, value: Mat4) {
        if slot.param != UniformParam::RotationMatrix {
            warn!("{} does not hold a matrix; write ignored", slot.shader_name());
            return;
        }
        self.block.eye_mut(slot.eye).rotation = value.to_cols_array_2d();
        self.dirty = true;
    }
}

/// GPU uniform buffer holding a [`StereoUniformBlock`].
#[derive(Debug)]
pub struct GpuUniformBuffer {
    buffer: wgpu::Buffer,
}

impl GpuUniformBuffer {
    pub const SIZE: u64 = std::mem::size_of::<StereoUniformBlock>() as u64;

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stereo-camera-uniform"),
            size: Self::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(Self::SIZE),
            },
            count: None,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// Uploads the block if it changed. Returns whether anything was queued.
    pub fn upload(&self, queue: &wgpu::Queue, uniforms: &mut PackedUniforms) -> bool {
        if !uniforms.dirty {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytes_of(&uniforms.block));
        uniforms.dirty = false;
        true
    }
}
