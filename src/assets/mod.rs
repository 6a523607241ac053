//! # Asset Loading
//!
//! Fetching and decoding of the two asset kinds the viewer displays:
//! glTF models, decoded into [`ModelNode`](crate::gfx::scene::ModelNode)
//! graphs, and Radiance HDR environment maps. Bytes come from an
//! [`AssetSource`]; decoding runs on the [`AssetLoader`]'s worker pool.

pub mod environment;
pub mod gltf_import;
pub mod loader;
pub mod request;
pub mod source;

pub use environment::EnvironmentMap;
pub use loader::AssetLoader;
pub use request::{LoadCompletion, LoadKind, LoadPayload, LoadRequest, RequestToken, TokenCounter};
pub use source::{AssetSource, FileSource, MemorySource};
