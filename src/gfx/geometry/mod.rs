//! # Procedural Geometry
//!
//! Generates the static geometry the viewer needs that does not come from a
//! model file. Currently that is the ground plane the vehicles stand on.
//!
//! ```rust
//! use showroom::gfx::geometry::generate_plane;
//!
//! // 10x10 ground plane, a single quad
//! let plane = generate_plane(10.0, 10.0, 1, 1);
//! assert_eq!(plane.triangle_count(), 2);
//! ```

pub mod primitives;

pub use primitives::generate_plane;

use crate::gfx::scene::vertex::Vertex3D;

/// Generated geometry ready to be turned into a mesh primitive
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions and normals into the renderer's vertex format
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| Vertex3D {
                position: *position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
