// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Render pipelines, the shadow and lit passes, and frame submission.

pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
