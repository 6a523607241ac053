// src/ui/panel.rs
//! Catalog overlay
//!
//! Shows the selected entry, load status and scene statistics, with arrow
//! buttons that feed the same navigation commands as the keyboard.

use crate::{
    error::LoadError,
    gfx::scene::scene::SceneStatistics,
    viewer::{NavigationCommand, Viewer},
};

/// Everything the overlay shows, captured before the frame is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub name: String,
    pub tag: String,
    pub index: usize,
    pub count: usize,
    pub loading: bool,
    pub exposure: f32,
    pub can_retreat: bool,
    pub can_advance: bool,
    pub stats: SceneStatistics,
    pub last_failure: Option<String>,
}

impl PanelState {
    pub fn from_viewer(viewer: &Viewer, last_failure: Option<&LoadError>) -> Self {
        let entry = viewer.selected_entry();
        let navigator = viewer.navigator();
        Self {
            name: entry.name.clone(),
            tag: entry.tag.clone(),
            index: navigator.current_index(),
            count: navigator.len(),
            loading: viewer.is_loading(),
            exposure: viewer.exposure(),
            can_retreat: !navigator.is_first(),
            can_advance: !navigator.is_last(),
            stats: viewer.scene().statistics(),
            last_failure: last_failure.map(ToString::to_string),
        }
    }
}

/// Draws the overlay, returns the navigation the user clicked
pub fn catalog_panel(ui: &imgui::Ui, state: &PanelState) -> Option<NavigationCommand> {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return None;
    }

    ui.window("Showroom")
        .position([16.0, 16.0], imgui::Condition::FirstUseEver)
        .always_auto_resize(true)
        .collapsible(false)
        .resizable(false)
        .build(|| {
            let mut command = None;

            ui.text(&state.name);
            if !state.tag.is_empty() {
                ui.same_line();
                ui.text_disabled(format!("[{}]", state.tag));
            }
            ui.text(format!("{} / {}", state.index + 1, state.count));

            ui.disabled(!state.can_retreat, || {
                if ui.button("<  Previous") {
                    command = Some(NavigationCommand::Retreat);
                }
            });
            ui.same_line();
            ui.disabled(!state.can_advance, || {
                if ui.button("Next  >") {
                    command = Some(NavigationCommand::Advance);
                }
            });

            if state.loading {
                ui.text_colored([1.0, 0.85, 0.3, 1.0], "Loading...");
            }
            if let Some(failure) = &state.last_failure {
                ui.text_colored([1.0, 0.4, 0.4, 1.0], failure);
            }

            ui.separator();
            ui.text_disabled(format!(
                "exposure {:.1}  meshes {}  triangles {}",
                state.exposure, state.stats.mesh_count, state.stats.triangle_count
            ));
            ui.text_disabled(format!(
                "models released {}  primitives released {}",
                state.stats.models_released, state.stats.primitives_released
            ));

            command
        })
        .flatten()
}
