// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Textures and the per-frame global bind group.

pub mod global_bindings;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform};
pub use texture_resource::TextureResource;
