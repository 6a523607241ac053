//! # Graphics Module
//!
//! Everything between a loaded model and pixels on the surface: the orbit
//! camera, the scene graph, GPU resources and the render passes.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with damped controls
//! - **Scene Management** ([`scene`]) - Model graph, spotlight, ground plane and environment
//! - **Geometry** ([`geometry`]) - Procedural meshes for the ground
//! - **Resource Management** ([`resources`]) - Textures and the global uniform buffer
//! - **Rendering Pipeline** ([`rendering`]) - Shadow pass, lit pass and tone mapping
//!
//! The scene is plain CPU data and can be built and mutated without a GPU;
//! [`RenderEngine`] uploads whatever changed right before drawing it.

pub mod camera;
pub mod color;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
pub use scene::scene::Scene;
