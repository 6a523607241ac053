//! glTF decoding into [`ModelNode`] graphs
//!
//! Handles `.gltf` with external or embedded (`data:`) buffers and binary
//! `.glb`. Only triangle-list geometry and the metallic-roughness factors are
//! read; textures are ignored.

use base64::Engine;
use cgmath::Matrix4;
use gltf::Gltf;

use crate::assets::source::{resolve_relative, AssetSource};
use crate::error::LoadError;
use crate::gfx::scene::model::{Mesh, ModelNode, Primitive, SurfaceMaterial};
use crate::gfx::scene::vertex::{compute_vertex_normals, Vertex3D};

/// Fetches and decodes the model at `locator`
pub fn load_model(source: &dyn AssetSource, locator: &str) -> Result<ModelNode, LoadError> {
    let bytes = source
        .read(locator)
        .map_err(|err| LoadError::model(locator, err))?;
    decode_model(source, locator, &bytes)
}

/// Decodes glTF bytes, resolving external buffers through `source`
///
/// The returned root is named after the scene (or the locator) and has
/// shadow flags prepared for every descendant.
pub fn decode_model(
    source: &dyn AssetSource,
    locator: &str,
    bytes: &[u8],
) -> Result<ModelNode, LoadError> {
    let gltf = Gltf::from_slice(bytes).map_err(|err| LoadError::model(locator, err))?;
    let buffers = load_buffers(&gltf, source, locator)?;

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| LoadError::model(locator, "model has no scene"))?;

    let mut root = ModelNode::new(scene.name().unwrap_or(locator));
    for node in scene.nodes() {
        root.children.push(convert_node(&node, &buffers));
    }

    if root.mesh_count() == 0 {
        return Err(LoadError::model(
            locator,
            "model contains no triangle geometry",
        ));
    }

    root.prepare_shadows();
    log::debug!(
        "Decoded '{}': {} meshes, {} triangles",
        locator,
        root.mesh_count(),
        root.triangle_count()
    );
    Ok(root)
}

fn load_buffers(
    gltf: &Gltf,
    source: &dyn AssetSource,
    locator: &str,
) -> Result<Vec<Vec<u8>>, LoadError> {
    let mut buffers = Vec::new();

    for buffer in gltf.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| LoadError::model(locator, "missing binary chunk"))?,
            gltf::buffer::Source::Uri(uri) => read_uri(source, locator, uri)?,
        };

        if data.len() < buffer.length() {
            return Err(LoadError::model(
                locator,
                format!(
                    "buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                ),
            ));
        }
        // Accessor reads may run up to the next 4-byte boundary
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buffers.push(data);
    }

    Ok(buffers)
}

fn read_uri(source: &dyn AssetSource, locator: &str, uri: &str) -> Result<Vec<u8>, LoadError> {
    if let Some(data) = uri.strip_prefix("data:") {
        let (_, encoded) = data
            .split_once(";base64,")
            .ok_or_else(|| LoadError::model(locator, "unsupported data URI encoding"))?;
        return base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|err| LoadError::model(locator, format!("invalid data URI: {err}")));
    }

    let path = resolve_relative(locator, uri);
    source
        .read(&path)
        .map_err(|err| LoadError::model(locator, format!("{path}: {err}")))
}

fn convert_node(node: &gltf::Node, buffers: &[Vec<u8>]) -> ModelNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut converted =
        ModelNode::new(name).with_transform(Matrix4::from(node.transform().matrix()));

    if let Some(mesh) = node.mesh() {
        let primitives: Vec<Primitive> = mesh
            .primitives()
            .filter_map(|primitive| convert_primitive(&primitive, buffers))
            .collect();
        if !primitives.is_empty() {
            converted.mesh = Some(Mesh::new(primitives));
        }
    }

    for child in node.children() {
        converted.children.push(convert_node(&child, buffers));
    }

    converted
}

fn convert_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Option<Primitive> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::debug!("Skipping primitive with mode {:?}", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => compute_vertex_normals(&positions, &indices),
    };

    let vertices = positions
        .iter()
        .zip(normals.iter().chain(std::iter::repeat(&[0.0, 1.0, 0.0])))
        .map(|(position, normal)| Vertex3D {
            position: *position,
            normal: *normal,
        })
        .collect();

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let surface = SurfaceMaterial {
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
    };

    Some(Primitive::new(vertices, indices, surface))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::source::MemorySource;

    /// One red triangle under a translated node, plus an empty sibling
    pub(crate) fn triangle_gltf(buffer_uri: &str) -> String {
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "name": "Showcase", "nodes": [0, 1] }}],
  "nodes": [
    {{ "name": "body", "mesh": 0, "translation": [0.0, 0.5, 0.0] }},
    {{ "name": "empty" }}
  ],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1, "material": 0 }}] }}],
  "materials": [{{ "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.9, "roughnessFactor": 0.2 }} }}],
  "buffers": [{{ "uri": "{buffer_uri}", "byteLength": 44 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 0.0, 1.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#
        )
    }

    /// Positions (0,0,0) (0,0,1) (1,0,0) and u16 indices 0 1 2, padded
    pub(crate) fn triangle_bin() -> Vec<u8> {
        let mut bytes = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        bytes
    }

    #[test]
    fn decodes_external_buffer() {
        let source = MemorySource::new()
            .with_file("cars/red/scene.gltf", triangle_gltf("scene.bin"))
            .with_file("cars/red/scene.bin", triangle_bin());

        let model = load_model(&source, "cars/red/scene.gltf").expect("model decodes");

        assert_eq!(model.name, "Showcase");
        assert_eq!(model.children.len(), 2);
        assert_eq!(model.mesh_count(), 1);
        assert_eq!(model.triangle_count(), 1);

        let body = &model.children[0];
        assert_eq!(body.name, "body");
        assert_eq!(body.transform.w.y, 0.5);
        assert!(body.cast_shadow && body.receive_shadow);
        assert!(!model.children[1].cast_shadow);

        let primitive = &body.mesh.as_ref().unwrap().primitives[0];
        assert_eq!(primitive.indices(), &[0, 1, 2]);
        assert_eq!(primitive.material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(primitive.material.metallic, 0.9);
        // No normals in the file, so they are computed from the winding
        assert_eq!(primitive.vertices()[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn percent_encoded_buffer_uri_is_found() {
        let source = MemorySource::new()
            .with_file("car/scene.gltf", triangle_gltf("scene%20data.bin"))
            .with_file("car/scene data.bin", triangle_bin());

        let model = load_model(&source, "car/scene.gltf").expect("model decodes");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn decodes_embedded_buffer() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(triangle_bin());
        let uri = format!("data:application/octet-stream;base64,{encoded}");
        let source = MemorySource::new().with_file("car.gltf", triangle_gltf(&uri));

        let model = load_model(&source, "car.gltf").expect("model decodes");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn missing_buffer_is_a_model_error() {
        let source = MemorySource::new().with_file("car.gltf", triangle_gltf("car.bin"));
        let err = load_model(&source, "car.gltf").unwrap_err();
        assert!(matches!(err, LoadError::Model { .. }));
        assert_eq!(err.locator(), "car.gltf");
        assert!(err.reason().contains("car.bin"));
    }

    #[test]
    fn garbage_is_a_model_error() {
        let source = MemorySource::new().with_file("car.gltf", "not a model");
        let err = load_model(&source, "car.gltf").unwrap_err();
        assert_eq!(err.locator(), "car.gltf");
    }

    #[test]
    fn missing_file_is_a_model_error() {
        let err = load_model(&MemorySource::new(), "nowhere.gltf").unwrap_err();
        assert!(matches!(err, LoadError::Model { .. }));
    }
}
