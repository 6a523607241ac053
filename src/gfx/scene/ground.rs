//! Static ground plane under the model

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::color::srgb_hex_to_linear;
use crate::gfx::geometry::generate_plane;
use crate::gfx::scene::model::{Primitive, SurfaceMaterial};

/// Matte square at y = 0 that receives the spotlight's shadow but never casts one
pub struct GroundPlane {
    primitive: Primitive,
    size: f32,
}

impl GroundPlane {
    pub fn new(size: f32, color: u32) -> Self {
        let (vertices, indices) = generate_plane(size, size, 1, 1).to_scene_format();
        let material = SurfaceMaterial::matte(srgb_hex_to_linear(color));
        Self {
            primitive: Primitive::new(vertices, indices, material),
            size,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub fn receives_shadow(&self) -> bool {
        true
    }

    pub fn casts_shadow(&self) -> bool {
        false
    }

    pub fn init_gpu(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        self.primitive
            .init_gpu(device, layout, Matrix4::identity(), self.receives_shadow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_is_a_single_quad() {
        let ground = GroundPlane::new(10.0, 0x5a5a5a);
        assert_eq!(ground.primitive().triangle_count(), 2);
        assert!(ground.receives_shadow() && !ground.casts_shadow());
        assert_eq!(ground.primitive().material.roughness, 1.0);
    }
}
