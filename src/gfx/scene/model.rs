//! Loaded model graphs
//!
//! A [`ModelNode`] is the root of a decoded model: a tree of transforms, some
//! of which carry a [`Mesh`]. Nodes are built on a loader thread with CPU data
//! only; GPU buffers are created on the window thread once the model is
//! attached to the scene, and destroyed again when it is detached.

use std::fmt;

use cgmath::{Matrix, Matrix4, SquareMatrix, Vector4};
use wgpu::util::DeviceExt;

use super::vertex::Vertex3D;

/// Surface parameters of one primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    /// Linear RGBA base colour
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Linear RGB emission
    pub emissive: [f32; 3],
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0; 3],
        }
    }
}

impl SurfaceMaterial {
    /// Opaque dielectric of the given linear colour
    pub fn matte(color: [f32; 3]) -> Self {
        Self {
            base_color: [color[0], color[1], color[2], 1.0],
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0; 3],
        }
    }
}

/// Per-primitive uniform block, bound at group 1
///
/// MUST match `PrimitiveUniform` in `scene.wgsl` and `shadow.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PrimitiveUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    base_color: [f32; 4],
    /// rgb: emission, w: 1.0 when the primitive receives shadows
    emissive: [f32; 4],
    /// x: metallic, y: roughness
    surface: [f32; 4],
}

impl PrimitiveUniform {
    pub fn new(world: Matrix4<f32>, material: &SurfaceMaterial, receive_shadow: bool) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);

        Self {
            model: world.into(),
            normal: normal.into(),
            base_color: material.base_color,
            emissive: [
                material.emissive[0],
                material.emissive[1],
                material.emissive[2],
                if receive_shadow { 1.0 } else { 0.0 },
            ],
            surface: [material.metallic, material.roughness, 0.0, 0.0],
        }
    }
}

#[derive(Debug)]
struct PrimitiveGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// One indexed triangle list with a single material
pub struct Primitive {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    pub material: SurfaceMaterial,
    gpu: Option<PrimitiveGpu>,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("vertices", &self.vertices.len())
            .field("triangles", &self.triangle_count())
            .field("material", &self.material)
            .field("resident", &self.gpu.is_some())
            .finish()
    }
}

impl Primitive {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>, material: SurfaceMaterial) -> Self {
        Self {
            vertices,
            indices,
            material,
            gpu: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }

    /// Creates vertex, index and uniform buffers plus the group-1 bind group
    ///
    /// No-op if the primitive is already resident.
    pub fn init_gpu(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        world: Matrix4<f32>,
        receive_shadow: bool,
    ) {
        if self.gpu.is_some() || self.indices.is_empty() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Primitive Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Primitive Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform = PrimitiveUniform::new(world, &self.material, receive_shadow);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Primitive Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Primitive Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.gpu = Some(PrimitiveGpu {
            vertex_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
        });
    }

    /// Destroys the GPU buffers, returns whether anything was resident
    pub fn release(&mut self) -> bool {
        match self.gpu.take() {
            Some(gpu) => {
                gpu.vertex_buffer.destroy();
                gpu.index_buffer.destroy();
                gpu.uniform_buffer.destroy();
                true
            }
            None => false,
        }
    }
}

/// The renderable part of a node
#[derive(Debug, Default)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives }
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(Primitive::triangle_count).sum()
    }
}

/// Node of a loaded model graph
#[derive(Debug)]
pub struct ModelNode {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Matrix4<f32>,
    pub mesh: Option<Mesh>,
    pub children: Vec<ModelNode>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl ModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: ModelNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node itself draws triangles
    pub fn is_renderable_mesh(&self) -> bool {
        self.mesh
            .as_ref()
            .is_some_and(|mesh| mesh.primitives.iter().any(|p| p.index_count() > 0))
    }

    /// Depth-first visit of this node and all of its descendants
    pub fn traverse(&self, visit: &mut impl FnMut(&ModelNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut impl FnMut(&mut ModelNode)) {
        visit(self);
        for child in self.children.iter_mut() {
            child.traverse_mut(visit);
        }
    }

    /// Marks every renderable mesh in the graph as casting and receiving
    /// shadows, and every other node as neither
    pub fn prepare_shadows(&mut self) {
        self.traverse_mut(&mut |node| {
            let renderable = node.is_renderable_mesh();
            node.cast_shadow = renderable;
            node.receive_shadow = renderable;
        });
    }

    /// Moves the root to the world origin, keeping its rotation and scale
    pub fn place_at_origin(&mut self) {
        self.transform.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if node.is_renderable_mesh() {
                count += 1;
            }
        });
        count
    }

    pub fn triangle_count(&self) -> usize {
        let mut count = 0;
        self.traverse(&mut |node| {
            if let Some(mesh) = &node.mesh {
                count += mesh.triangle_count();
            }
        });
        count
    }

    /// True once every primitive in the graph has GPU buffers
    pub fn is_gpu_ready(&self) -> bool {
        let mut ready = true;
        self.traverse(&mut |node| {
            if let Some(mesh) = &node.mesh {
                ready &= mesh
                    .primitives
                    .iter()
                    .all(|p| p.index_count() == 0 || p.has_gpu_resources());
            }
        });
        ready
    }

    /// Uploads every primitive, baking world transforms into the uniforms
    pub fn init_gpu(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        self.init_gpu_with_parent(device, layout, Matrix4::identity());
    }

    fn init_gpu_with_parent(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        parent: Matrix4<f32>,
    ) {
        let world = parent * self.transform;
        let receive_shadow = self.receive_shadow;
        if let Some(mesh) = self.mesh.as_mut() {
            for primitive in mesh.primitives.iter_mut() {
                primitive.init_gpu(device, layout, world, receive_shadow);
            }
        }
        for child in self.children.iter_mut() {
            child.init_gpu_with_parent(device, layout, world);
        }
    }

    /// Destroys all GPU buffers in the graph, returns how many primitives
    /// were resident
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        self.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                for primitive in mesh.primitives.iter_mut() {
                    if primitive.release() {
                        released += 1;
                    }
                }
            }
        });
        released
    }
}

/// Draw calls for model graphs
pub trait DrawModel {
    fn draw_primitive(&mut self, primitive: &Primitive);
    /// Draws every resident primitive in the graph
    fn draw_model(&mut self, model: &ModelNode);
    /// Draws only the nodes flagged as shadow casters
    fn draw_shadow_casters(&mut self, model: &ModelNode);
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_primitive(&mut self, primitive: &Primitive) {
        let Some(gpu) = primitive.gpu.as_ref() else {
            return; // Skip drawing if not uploaded
        };

        self.set_bind_group(1, &gpu.bind_group, &[]);
        self.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        self.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..primitive.index_count(), 0, 0..1);
    }

    fn draw_model(&mut self, model: &ModelNode) {
        model.traverse(&mut |node| {
            if let Some(mesh) = &node.mesh {
                for primitive in &mesh.primitives {
                    self.draw_primitive(primitive);
                }
            }
        });
    }

    fn draw_shadow_casters(&mut self, model: &ModelNode) {
        model.traverse(&mut |node| {
            if !node.cast_shadow {
                return;
            }
            if let Some(mesh) = &node.mesh {
                for primitive in &mesh.primitives {
                    self.draw_primitive(primitive);
                }
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cgmath::Vector3;

    pub(crate) fn triangle_primitive() -> Primitive {
        Primitive::new(
            vec![
                Vertex3D {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                },
                Vertex3D {
                    position: [0.0, 0.0, 1.0],
                    normal: [0.0, 1.0, 0.0],
                },
                Vertex3D {
                    position: [1.0, 0.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                },
            ],
            vec![0, 1, 2],
            SurfaceMaterial::default(),
        )
    }

    /// Root with a mesh-less pivot child holding two mesh nodes
    pub(crate) fn sample_model(name: &str) -> ModelNode {
        ModelNode::new(name).with_child(
            ModelNode::new("pivot")
                .with_child(ModelNode::new("body").with_mesh(Mesh::new(vec![triangle_primitive()])))
                .with_child(
                    ModelNode::new("wheel")
                        .with_mesh(Mesh::new(vec![triangle_primitive(), triangle_primitive()])),
                ),
        )
    }

    #[test]
    fn shadow_flags_follow_renderable_meshes() {
        let mut model = sample_model("car")
            .with_child(ModelNode::new("empty").with_mesh(Mesh::new(vec![Primitive::new(
                Vec::new(),
                Vec::new(),
                SurfaceMaterial::default(),
            )])));
        model.prepare_shadows();

        let mut flags = Vec::new();
        model.traverse(&mut |node| {
            flags.push((node.name.clone(), node.cast_shadow, node.receive_shadow))
        });

        assert_eq!(
            flags,
            vec![
                ("car".to_string(), false, false),
                ("pivot".to_string(), false, false),
                ("body".to_string(), true, true),
                ("wheel".to_string(), true, true),
                ("empty".to_string(), false, false),
            ]
        );
    }

    #[test]
    fn counts_meshes_and_triangles() {
        let model = sample_model("car");
        assert_eq!(model.mesh_count(), 2);
        assert_eq!(model.triangle_count(), 3);
    }

    #[test]
    fn place_at_origin_keeps_rotation() {
        let rotation = Matrix4::from_angle_y(cgmath::Deg(90.0));
        let mut model = ModelNode::new("car")
            .with_transform(Matrix4::from_translation(Vector3::new(4.0, 1.0, -2.0)) * rotation);
        model.place_at_origin();

        assert_eq!(model.transform.w, Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(model.transform.x, rotation.x);
    }

    #[test]
    fn release_without_gpu_is_a_no_op() {
        let mut model = sample_model("car");
        assert_eq!(model.release(), 0);
        assert!(!model.is_gpu_ready());
    }

    #[test]
    fn debug_output_summarises_geometry() {
        let failed: Result<ModelNode, String> = Err("missing".into());
        assert_eq!(failed.unwrap_err(), "missing");

        let text = format!("{:?}", sample_model("car"));
        assert!(text.contains("\"car\""));
        assert!(text.contains("triangles: 1"));
        assert!(text.contains("resident: false"));
    }
}
