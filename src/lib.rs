// src/lib.rs
//! Showroom
//!
//! An interactive 3D vehicle showroom built on wgpu and winit. A fixed
//! catalog of glTF models is browsed one at a time under a shadow-casting
//! spotlight, with per-model exposure and an HDR environment map.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod viewer;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ShowroomApp;
pub use config::{Catalog, CatalogEntry, ViewerConfig};
pub use error::{ConfigError, LoadError};
pub use viewer::Viewer;
