//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the lit scene.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu
//! - [`catalog_panel`] - entry name, load status, prev/next buttons and scene statistics
//!
//! When the overlay wants the pointer or keyboard, camera input is suppressed
//! so dragging the panel does not orbit the model.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{catalog_panel, PanelState};
