//! Global uniform bindings for camera, spotlight and frame data
//!
//! Manages the uniform buffer and bind group shared by every draw in a frame.
//! Bound to slot 0 in both the shadow and the lit pipeline.

use crate::{
    gfx::{camera::camera_utils::CameraUniform, scene::light::SpotLight},
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// Global uniform buffer content
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    /// xyz: position, w: intensity
    light_position: [f32; 4],
    /// xyz: normalized direction, w: cosine of the outer cone
    light_direction: [f32; 4],
    /// rgb: linear colour, w: cosine of the inner cone
    light_color: [f32; 4],
    /// x: exposure, y: environment strength, z: shadow texel size, w: PCF radius
    frame: [f32; 4],
}

impl GlobalUniform {
    pub fn new(
        camera: &CameraUniform,
        light: &SpotLight,
        exposure: f32,
        has_environment: bool,
    ) -> Self {
        let direction = light.direction();
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_view_proj: light.view_projection().into(),
            light_position: [
                light.position.x,
                light.position.y,
                light.position.z,
                light.intensity,
            ],
            light_direction: [direction.x, direction.y, direction.z, light.cos_outer()],
            light_color: [
                light.color[0],
                light.color[1],
                light.color[2],
                light.cos_inner(),
            ],
            frame: [
                exposure,
                if has_environment { 1.0 } else { 0.0 },
                1.0 / light.shadow.map_size.max(1) as f32,
                light.pcf_radius(),
            ],
        }
    }

    pub fn exposure(&self) -> f32 {
        self.frame[0]
    }

    pub fn light_intensity(&self) -> f32 {
        self.light_position[3]
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Owns the global uniform buffer together with its layout and bind group
pub struct GlobalBindings {
    ubo: GlobalUBO,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let ubo = GlobalUBO::new(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: binding_types::uniform(),
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            ubo,
            bind_group_layout,
            bind_group,
        }
    }

    /// Writes this frame's globals, skipping the upload when nothing changed
    pub fn update(&mut self, queue: &wgpu::Queue, content: GlobalUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpotLightConfig;

    #[test]
    fn uniform_is_sixteen_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 16 + 64 + 64 + 16 * 4);
    }

    #[test]
    fn packs_light_and_exposure() {
        let light = SpotLight::from_config(&SpotLightConfig::default(), 80.0);
        let globals = GlobalUniform::new(&CameraUniform::default(), &light, 4.0, false);

        assert_eq!(globals.exposure(), 4.0);
        assert_eq!(globals.light_intensity(), 80.0);
        assert_eq!(globals.light_direction[1], -1.0);
        assert_eq!(globals.frame[1], 0.0);
        assert_eq!(globals.frame[3], 2.5);
    }
}
