//! # Scene Management
//!
//! The scene graph the renderer draws each frame: one orbit camera, one
//! spotlight, a static ground plane, an optional environment map and at most
//! one loaded model.
//!
//! ## Key Components
//!
//! - [`Scene`] - owns everything above and applies load results
//! - [`ModelNode`] - root of a loaded model's node graph
//! - [`SpotLight`] - the shadow-casting cone light
//! - [`GroundPlane`] - shadow-receiving floor
//! - [`Vertex3D`] - shared vertex format

pub mod ground;
pub mod light;
pub mod model;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use ground::GroundPlane;
pub use light::SpotLight;
pub use model::{DrawModel, Mesh, ModelNode, Primitive, SurfaceMaterial};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
