//! # Viewer
//!
//! Coordinates catalog navigation with asynchronous loads. The [`Viewer`]
//! owns the scene and decides, when a load completes, whether the result is
//! still wanted.
//!
//! Every navigation issues a model request with a fresh [`RequestToken`].
//! When a completion arrives its token is compared with the latest token
//! issued for its kind; anything older is dropped without touching the scene.
//! The previous model stays on screen until its replacement is applied, and
//! the swap happens in one call on the thread that renders.
//!
//! Environment maps are cached: one is requested only when the selected
//! entry's environment differs from the one applied or already in flight.

pub mod navigator;
pub mod render_loop;
pub mod resize;

use std::collections::HashSet;

use crate::{
    assets::request::{LoadCompletion, LoadKind, LoadPayload, LoadRequest, RequestToken, TokenCounter},
    config::{Catalog, CatalogEntry, ViewerConfig},
    error::LoadError,
    gfx::scene::scene::Scene,
};

pub use navigator::{CatalogNavigator, NavigationCommand, SelectionChanged};
pub use render_loop::{FrameContext, FrameRenderer, FrameScheduler, RenderLoop, RenderLoopHandle};
pub use resize::{RenderSurface, ResizeHandler, ViewportSize, ViewportSizeProvider};

/// Loads to dispatch after a selection change
#[derive(Debug, Clone, PartialEq)]
pub struct Reload {
    pub model: LoadRequest,
    pub environment: Option<LoadRequest>,
}

impl Reload {
    /// Environment first, so a shared pool tends to finish it before the model
    pub fn into_requests(self) -> impl Iterator<Item = LoadRequest> {
        self.environment.into_iter().chain(std::iter::once(self.model))
    }
}

/// What [`Viewer::complete`] did with a load result
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Applied(LoadKind),
    /// A newer request of the same kind was issued after this one
    Superseded,
    /// The load failed; the scene is unchanged
    Failed(LoadError),
}

/// The model request whose result is still wanted
#[derive(Debug, Clone, Copy)]
struct PendingModel {
    token: RequestToken,
    entry_index: usize,
}

#[derive(Debug)]
struct PendingEnvironment {
    token: RequestToken,
    locator: String,
}

pub struct Viewer {
    catalog: Catalog,
    navigator: CatalogNavigator,
    scene: Scene,
    tokens: TokenCounter,
    pending_model: Option<PendingModel>,
    pending_environment: Option<PendingEnvironment>,
    applied_environment: Option<String>,
    failed_environments: HashSet<String>,
    displayed_entry: Option<usize>,
    started: bool,
}

impl Viewer {
    /// Builds the scene for the first catalog entry; nothing is loaded until
    /// [`Viewer::start`]
    pub fn new(catalog: Catalog, config: &ViewerConfig) -> Self {
        let scene = Scene::initialize(config, catalog.first());
        Self {
            navigator: CatalogNavigator::new(catalog.len()),
            catalog,
            scene,
            tokens: TokenCounter::default(),
            pending_model: None,
            pending_environment: None,
            applied_environment: None,
            failed_environments: HashSet::new(),
            displayed_entry: None,
            started: false,
        }
    }

    /// Requests the initially selected entry; returns `None` after the first call
    pub fn start(&mut self) -> Option<Reload> {
        if self.started {
            return None;
        }
        self.started = true;
        Some(self.reload(self.navigator.current_index()))
    }

    pub fn advance(&mut self) -> Option<Reload> {
        self.handle(NavigationCommand::Advance)
    }

    pub fn retreat(&mut self) -> Option<Reload> {
        self.handle(NavigationCommand::Retreat)
    }

    /// Moves the selection; a move that happens yields exactly one reload
    pub fn handle(&mut self, command: NavigationCommand) -> Option<Reload> {
        let change = self.navigator.apply(command)?;
        log::debug!(
            "Selection {} -> {} ({:?})",
            change.previous,
            change.current,
            command
        );
        Some(self.reload(change.current))
    }

    fn reload(&mut self, index: usize) -> Reload {
        let entry = &self.catalog.entries()[index];
        log::info!("Loading '{}' from {}", entry.name, entry.model);
        let model = LoadRequest {
            token: self.tokens.next(),
            entry_index: index,
            locator: entry.model.clone(),
            kind: LoadKind::Model,
        };
        self.pending_model = Some(PendingModel {
            token: model.token,
            entry_index: index,
        });

        let environment = self.environment_request(index);

        Reload { model, environment }
    }

    fn environment_request(&mut self, index: usize) -> Option<LoadRequest> {
        let wanted = self.catalog.environment_for(index);

        if self
            .pending_environment
            .as_ref()
            .is_some_and(|pending| pending.locator == wanted)
        {
            return None;
        }

        if self.applied_environment.as_deref() == Some(wanted)
            || self.failed_environments.contains(wanted)
        {
            // Whatever is still in flight is no longer wanted
            self.pending_environment = None;
            return None;
        }

        let token = self.tokens.next();
        self.pending_environment = Some(PendingEnvironment {
            token,
            locator: wanted.to_string(),
        });
        Some(LoadRequest {
            token,
            entry_index: index,
            locator: wanted.to_string(),
            kind: LoadKind::Environment,
        })
    }

    /// Applies a finished load if it is still the latest of its kind
    ///
    /// Failures are logged here, once, and returned as
    /// [`CompletionOutcome::Failed`].
    pub fn complete(&mut self, completion: LoadCompletion) -> CompletionOutcome {
        let LoadCompletion {
            token,
            entry_index,
            payload,
        } = completion;

        match payload {
            LoadPayload::Model(result) => {
                let Some(pending) = self.pending_model.filter(|p| p.token == token) else {
                    log::debug!("Dropping superseded model load {}", token);
                    return CompletionOutcome::Superseded;
                };
                self.pending_model = None;

                // The entry comes from the request, never from the completion
                if entry_index != pending.entry_index {
                    log::warn!(
                        "Model load {} reported entry {}, it was issued for entry {}",
                        token,
                        entry_index,
                        pending.entry_index
                    );
                }

                match result {
                    Ok(node) => {
                        let Some(entry) = self.catalog.get(pending.entry_index) else {
                            log::warn!("Model load {} names no catalog entry", token);
                            return CompletionOutcome::Superseded;
                        };
                        self.scene.set_model(node);
                        self.scene.apply_light_profile(entry);
                        self.scene.set_exposure(entry.exposure);
                        self.displayed_entry = Some(pending.entry_index);
                        log::info!(
                            "Showing '{}' (exposure {}, light {})",
                            entry.name,
                            entry.exposure,
                            entry.light_intensity
                        );
                        CompletionOutcome::Applied(LoadKind::Model)
                    }
                    Err(error) => {
                        log::error!("{}", error);
                        CompletionOutcome::Failed(error)
                    }
                }
            }
            LoadPayload::Environment(result) => {
                let is_latest = self
                    .pending_environment
                    .as_ref()
                    .is_some_and(|pending| pending.token == token);
                if !is_latest {
                    log::debug!("Dropping superseded environment load {}", token);
                    return CompletionOutcome::Superseded;
                }
                let Some(pending) = self.pending_environment.take() else {
                    return CompletionOutcome::Superseded;
                };

                match result {
                    Ok(map) => {
                        self.scene.set_environment(map);
                        self.applied_environment = Some(pending.locator);
                        CompletionOutcome::Applied(LoadKind::Environment)
                    }
                    Err(error) => {
                        log::error!("{}", error);
                        self.failed_environments.insert(pending.locator);
                        CompletionOutcome::Failed(error)
                    }
                }
            }
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn navigator(&self) -> &CatalogNavigator {
        &self.navigator
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current_index()
    }

    pub fn selected_entry(&self) -> &CatalogEntry {
        &self.catalog.entries()[self.navigator.current_index()]
    }

    /// Entry whose model is on screen, once any model has loaded
    pub fn displayed_entry(&self) -> Option<&CatalogEntry> {
        self.displayed_entry.and_then(|index| self.catalog.get(index))
    }

    /// Exposure the next frame will render with
    pub fn exposure(&self) -> f32 {
        self.scene.exposure()
    }

    /// True while the latest model or environment request is unresolved
    pub fn is_loading(&self) -> bool {
        self.pending_model.is_some() || self.pending_environment.is_some()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::model::tests::sample_model;

    fn viewer() -> Viewer {
        Viewer::new(Catalog::builtin(), &ViewerConfig::default())
    }

    fn model_done(request: &LoadRequest, name: &str) -> LoadCompletion {
        LoadCompletion {
            token: request.token,
            entry_index: request.entry_index,
            payload: LoadPayload::Model(Ok(sample_model(name))),
        }
    }

    #[test]
    fn start_requests_first_entry_once() {
        let mut viewer = viewer();
        let reload = viewer.start().expect("first start reloads");
        assert_eq!(reload.model.entry_index, 0);
        assert_eq!(reload.model.locator, "assets/models/car1/scene.gltf");
        assert_eq!(
            reload.environment.as_ref().map(|e| e.locator.as_str()),
            Some("assets/WhiteNeons_NAD.hdr")
        );
        assert!(viewer.start().is_none());
        assert!(viewer.is_loading());
    }

    #[test]
    fn navigation_at_bounds_issues_no_reload() {
        let mut viewer = viewer();
        viewer.start();
        assert!(viewer.retreat().is_none());
        assert!(viewer.advance().is_some());
        assert!(viewer.advance().is_some());
        assert!(viewer.advance().is_none());
        assert_eq!(viewer.current_index(), 2);
    }

    #[test]
    fn completion_applies_model_light_and_exposure() {
        let mut viewer = viewer();
        viewer.start();
        let reload = viewer.advance().unwrap();

        let outcome = viewer.complete(model_done(&reload.model, "car2"));
        assert_eq!(outcome, CompletionOutcome::Applied(LoadKind::Model));
        assert_eq!(viewer.exposure(), 1.0);
        assert_eq!(viewer.scene().light().intensity, 80.0);
        assert_eq!(viewer.displayed_entry().map(|e| e.name.as_str()), Some("Car 2"));
    }

    #[test]
    fn stale_model_completion_is_superseded() {
        let mut viewer = viewer();
        let first = viewer.start().unwrap();
        let second = viewer.advance().unwrap();

        assert_eq!(
            viewer.complete(model_done(&first.model, "car1")),
            CompletionOutcome::Superseded
        );
        assert_eq!(viewer.scene().model_count(), 0);
        assert_eq!(viewer.exposure(), 2.0);

        viewer.complete(model_done(&second.model, "car2"));
        assert_eq!(viewer.scene().model_count(), 1);
        assert!(second.model.token > first.model.token);
    }

    #[test]
    fn failed_model_keeps_previous_scene() {
        let mut viewer = viewer();
        let first = viewer.start().unwrap();
        viewer.complete(model_done(&first.model, "car1"));

        let second = viewer.advance().unwrap();
        let error = LoadError::model(second.model.locator.clone(), "404");
        let outcome = viewer.complete(LoadCompletion {
            token: second.model.token,
            entry_index: 1,
            payload: LoadPayload::Model(Err(error.clone())),
        });

        assert_eq!(outcome, CompletionOutcome::Failed(error));
        assert_eq!(
            viewer.scene().current_model().map(|m| m.name.as_str()),
            Some("car1")
        );
        assert_eq!(viewer.exposure(), 2.0);
        assert_eq!(viewer.current_index(), 1);
    }

    #[test]
    fn environment_is_requested_once_and_cached() {
        let mut viewer = viewer();
        let first = viewer.start().unwrap();
        let env = first.environment.clone().unwrap();

        // Same environment already in flight
        assert!(viewer.advance().unwrap().environment.is_none());

        let outcome = viewer.complete(LoadCompletion {
            token: env.token,
            entry_index: env.entry_index,
            payload: LoadPayload::Environment(Ok(crate::assets::EnvironmentMap {
                locator: env.locator.clone(),
                width: 1,
                height: 1,
                data: vec![1.0; 4],
            })),
        });
        assert_eq!(outcome, CompletionOutcome::Applied(LoadKind::Environment));
        assert!(viewer.advance().unwrap().environment.is_none());
        assert_eq!(viewer.scene().environment_revision(), 1);
    }

    #[test]
    fn per_entry_environment_supersedes_in_flight_one() {
        let catalog = Catalog::new(
            vec![
                CatalogEntry::new("A", "a.gltf", 1.0, 10.0),
                CatalogEntry::new("B", "b.gltf", 1.0, 10.0).with_environment("night.hdr"),
            ],
            "day.hdr",
        )
        .unwrap();
        let mut viewer = Viewer::new(catalog, &ViewerConfig::default());

        let day = viewer.start().unwrap().environment.unwrap();
        let night = viewer.advance().unwrap().environment.unwrap();
        assert_eq!(night.locator, "night.hdr");

        let stale = viewer.complete(LoadCompletion {
            token: day.token,
            entry_index: 0,
            payload: LoadPayload::Environment(Err(LoadError::environment("day.hdr", "late"))),
        });
        assert_eq!(stale, CompletionOutcome::Superseded);
        assert!(viewer.scene().environment().is_none());
    }

    #[test]
    fn completion_entry_index_cannot_redirect_the_profile() {
        let mut viewer = viewer();
        let first = viewer.start().unwrap();

        let outcome = viewer.complete(LoadCompletion {
            token: first.model.token,
            entry_index: 99,
            payload: LoadPayload::Model(Ok(sample_model("car1"))),
        });

        assert_eq!(outcome, CompletionOutcome::Applied(LoadKind::Model));
        assert_eq!(viewer.exposure(), 2.0);
        assert_eq!(viewer.scene().light().intensity, 50.0);
        assert_eq!(viewer.displayed_entry().map(|e| e.name.as_str()), Some("Car 1"));
    }

    #[test]
    fn failed_environment_is_not_retried() {
        let mut viewer = viewer();
        let env = viewer.start().unwrap().environment.unwrap();
        let outcome = viewer.complete(LoadCompletion {
            token: env.token,
            entry_index: 0,
            payload: LoadPayload::Environment(Err(LoadError::environment(
                env.locator.clone(),
                "bad header",
            ))),
        });
        assert!(matches!(outcome, CompletionOutcome::Failed(_)));
        assert!(viewer.advance().unwrap().environment.is_none());
    }
}
