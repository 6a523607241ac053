//! Asynchronous asset loading on a worker pool

use std::future::Future;
use std::sync::Arc;

use futures::channel::oneshot;
use futures::executor::ThreadPool;

use crate::assets::environment::{self, EnvironmentMap};
use crate::assets::gltf_import;
use crate::assets::request::{LoadCompletion, LoadKind, LoadPayload, LoadRequest};
use crate::assets::source::AssetSource;
use crate::error::LoadError;
use crate::gfx::scene::model::ModelNode;

/// Fetches and decodes assets off the window thread
///
/// Loading never touches the scene: results come back as values (or as
/// [`LoadCompletion`]s through [`AssetLoader::dispatch`]) and the owner of
/// the scene decides whether to apply them.
pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    pool: ThreadPool,
}

impl AssetLoader {
    pub const DEFAULT_WORKERS: usize = 2;

    pub fn new(source: Arc<dyn AssetSource>) -> std::io::Result<Self> {
        Self::with_workers(source, Self::DEFAULT_WORKERS)
    }

    pub fn with_workers(source: Arc<dyn AssetSource>, workers: usize) -> std::io::Result<Self> {
        let pool = ThreadPool::builder()
            .pool_size(workers.max(1))
            .name_prefix("showroom-loader-")
            .create()?;
        Ok(Self { source, pool })
    }

    pub fn source(&self) -> &Arc<dyn AssetSource> {
        &self.source
    }

    /// Loads a model graph; resolves once decoding has finished
    pub fn load_model(
        &self,
        locator: &str,
    ) -> impl Future<Output = Result<ModelNode, LoadError>> + Send + 'static {
        let locator = locator.to_string();
        let job_locator = locator.clone();
        let receiver = self.run(move |source| gltf_import::load_model(source, &job_locator));
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(LoadError::model(locator, "loader shut down")))
        }
    }

    /// Loads an equirectangular environment map
    pub fn load_environment(
        &self,
        locator: &str,
    ) -> impl Future<Output = Result<EnvironmentMap, LoadError>> + Send + 'static {
        let locator = locator.to_string();
        let job_locator = locator.clone();
        let receiver = self.run(move |source| environment::load_environment(source, &job_locator));
        async move {
            receiver
                .await
                .unwrap_or_else(|_| Err(LoadError::environment(locator, "loader shut down")))
        }
    }

    /// Runs `request` on the pool and hands the completion to `on_complete`
    /// from the worker thread
    pub fn dispatch<F>(&self, request: LoadRequest, on_complete: F)
    where
        F: FnOnce(LoadCompletion) + Send + 'static,
    {
        log::debug!(
            "Dispatching {:?} load {} for '{}'",
            request.kind,
            request.token,
            request.locator
        );

        let source = Arc::clone(&self.source);
        self.pool.spawn_ok(async move {
            let payload = match request.kind {
                LoadKind::Model => {
                    LoadPayload::Model(gltf_import::load_model(source.as_ref(), &request.locator))
                }
                LoadKind::Environment => LoadPayload::Environment(environment::load_environment(
                    source.as_ref(),
                    &request.locator,
                )),
            };
            on_complete(LoadCompletion {
                token: request.token,
                entry_index: request.entry_index,
                payload,
            });
        });
    }

    fn run<T, F>(&self, job: F) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn AssetSource) -> T + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let source = Arc::clone(&self.source);
        self.pool.spawn_ok(async move {
            // The caller may have dropped the future; nothing to report then
            let _ = sender.send(job(source.as_ref()));
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::environment::tests::white_hdr;
    use crate::assets::gltf_import::tests::{triangle_bin, triangle_gltf};
    use crate::assets::request::RequestToken;
    use crate::assets::source::MemorySource;
    use std::sync::mpsc;
    use std::time::Duration;

    fn loader() -> AssetLoader {
        let source = MemorySource::new()
            .with_file("car/scene.gltf", triangle_gltf("scene.bin"))
            .with_file("car/scene.bin", triangle_bin())
            .with_file("sky.hdr", white_hdr());
        AssetLoader::new(Arc::new(source)).expect("pool starts")
    }

    #[test]
    fn loads_model_and_environment() {
        let loader = loader();

        let model = pollster::block_on(loader.load_model("car/scene.gltf")).expect("model");
        assert_eq!(model.mesh_count(), 1);

        let map = pollster::block_on(loader.load_environment("sky.hdr")).expect("environment");
        assert_eq!(map.width, 2);
    }

    #[test]
    fn failures_are_reported_not_raised() {
        let loader = loader();
        let err = pollster::block_on(loader.load_model("missing.gltf")).unwrap_err();
        assert_eq!(err.locator(), "missing.gltf");

        let err = pollster::block_on(loader.load_environment("car/scene.bin")).unwrap_err();
        assert!(matches!(err, LoadError::Environment { .. }));
    }

    #[test]
    fn dispatch_delivers_tagged_completion() {
        let loader = loader();
        let (sender, receiver) = mpsc::channel();

        loader.dispatch(
            LoadRequest {
                token: RequestToken::new(7),
                entry_index: 2,
                locator: "car/scene.gltf".into(),
                kind: LoadKind::Model,
            },
            move |completion| {
                let _ = sender.send(completion);
            },
        );

        let completion = receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("completion arrives");
        assert_eq!(completion.token, RequestToken::new(7));
        assert_eq!(completion.entry_index, 2);
        assert_eq!(completion.kind(), LoadKind::Model);
        assert!(completion.is_success());
    }
}
