use std::sync::Arc;

use crate::{
    assets::environment::EnvironmentMap,
    config::{CatalogEntry, ViewerConfig},
    gfx::{
        camera::camera_utils::CameraManager,
        color,
        scene::{ground::GroundPlane, light::SpotLight, model::ModelNode},
    },
};

/// Everything the renderer draws: camera, spotlight, ground, environment
/// and at most one model
///
/// All mutation happens on the thread that renders, between frames, so a
/// frame never observes a half-applied change.
pub struct Scene {
    pub camera_manager: CameraManager,
    light: SpotLight,
    ground: GroundPlane,
    environment: Option<Arc<EnvironmentMap>>,
    environment_revision: u64,
    model: Option<ModelNode>,
    exposure: f32,
    clear_color: wgpu::Color,
    primitives_released: usize,
    models_released: usize,
}

impl Scene {
    /// Builds the camera, a spotlight sized to `first` and the ground plane
    ///
    /// Exposure starts at `first`'s value so the first frames match the
    /// model that is about to load.
    pub fn initialize(config: &ViewerConfig, first: &CatalogEntry) -> Self {
        log::info!(
            "Initializing scene: spotlight intensity {}, exposure {}",
            first.light_intensity,
            first.exposure
        );

        Self {
            camera_manager: CameraManager::from_config(config),
            light: SpotLight::from_config(&config.spot_light, first.light_intensity),
            ground: GroundPlane::new(config.ground_size, config.ground_color),
            environment: None,
            environment_revision: 0,
            model: None,
            exposure: first.exposure,
            clear_color: color::clear_color(config.clear_color),
            primitives_released: 0,
            models_released: 0,
        }
    }

    /// Advances camera damping and refreshes the camera uniform
    pub fn update(&mut self) -> bool {
        self.camera_manager.update()
    }

    /// Replaces the displayed model
    ///
    /// The previous model is detached and its GPU buffers destroyed before
    /// `node` is attached at the origin, so the scene never holds two models.
    pub fn set_model(&mut self, mut node: ModelNode) {
        if let Some(mut previous) = self.model.take() {
            let released = previous.release();
            self.primitives_released += released;
            self.models_released += 1;
            log::debug!(
                "Detached model '{}', released {} primitives",
                previous.name,
                released
            );
        }

        node.place_at_origin();
        log::info!(
            "Attached model '{}' ({} meshes, {} triangles)",
            node.name,
            node.mesh_count(),
            node.triangle_count()
        );
        self.model = Some(node);
    }

    /// Makes `map` the active environment, dropping the previous one
    pub fn set_environment(&mut self, map: EnvironmentMap) {
        if let Some(previous) = self.environment.take() {
            log::debug!("Releasing environment '{}'", previous.locator);
        }
        log::info!(
            "Environment '{}' applied ({}x{})",
            map.locator,
            map.width,
            map.height
        );
        self.environment = Some(Arc::new(map));
        self.environment_revision += 1;
    }

    pub fn apply_light_profile(&mut self, entry: &CatalogEntry) {
        self.light.intensity = entry.light_intensity;
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        self.exposure = exposure;
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn light(&self) -> &SpotLight {
        &self.light
    }

    pub fn ground(&self) -> &GroundPlane {
        &self.ground
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    /// Bumped on every `set_environment`, so GPU copies know when to rebuild
    pub fn environment_revision(&self) -> u64 {
        self.environment_revision
    }

    pub fn current_model(&self) -> Option<&ModelNode> {
        self.model.as_ref()
    }

    pub fn model_count(&self) -> usize {
        usize::from(self.model.is_some())
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    /// Uploads anything not yet resident on the GPU
    pub fn prepare_gpu(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        self.ground.init_gpu(device, layout);
        if let Some(model) = self.model.as_mut() {
            if !model.is_gpu_ready() {
                model.init_gpu(device, layout);
            }
        }
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            model_count: self.model_count(),
            mesh_count: self.model.as_ref().map_or(0, ModelNode::mesh_count),
            triangle_count: self.model.as_ref().map_or(0, ModelNode::triangle_count),
            models_released: self.models_released,
            primitives_released: self.primitives_released,
        }
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub model_count: usize,
    pub mesh_count: usize,
    pub triangle_count: usize,
    pub models_released: usize,
    pub primitives_released: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use crate::gfx::scene::model::tests::sample_model;

    fn scene() -> Scene {
        let catalog = Catalog::builtin();
        Scene::initialize(&ViewerConfig::default(), catalog.first())
    }

    #[test]
    fn initialize_sizes_light_to_first_entry() {
        let scene = scene();
        assert_eq!(scene.light().intensity, 50.0);
        assert_eq!(scene.exposure(), 2.0);
        assert_eq!(scene.model_count(), 0);
        assert!(scene.environment().is_none());
        assert!(scene.ground().receives_shadow());
    }

    #[test]
    fn set_model_keeps_exactly_one_model() {
        let mut scene = scene();

        scene.set_model(sample_model("first"));
        assert_eq!(scene.model_count(), 1);

        scene.set_model(sample_model("second"));
        assert_eq!(scene.model_count(), 1);
        assert_eq!(scene.current_model().map(|m| m.name.as_str()), Some("second"));

        let stats = scene.statistics();
        assert_eq!(stats.models_released, 1);
        assert_eq!(stats.mesh_count, 2);
        assert_eq!(stats.triangle_count, 3);
    }

    #[test]
    fn environment_swaps_bump_revision() {
        let mut scene = scene();
        let map = |locator: &str| EnvironmentMap {
            locator: locator.into(),
            width: 1,
            height: 1,
            data: vec![1.0; 4],
        };

        scene.set_environment(map("a.hdr"));
        scene.set_environment(map("b.hdr"));
        assert_eq!(scene.environment_revision(), 2);
        assert_eq!(scene.environment().map(|e| e.locator.as_str()), Some("b.hdr"));
    }

    #[test]
    fn light_profile_and_exposure_follow_entry() {
        let mut scene = scene();
        let catalog = Catalog::builtin();
        let car2 = catalog.get(1).unwrap();

        scene.apply_light_profile(car2);
        scene.set_exposure(car2.exposure);
        assert_eq!(scene.light().intensity, 80.0);
        assert_eq!(scene.exposure(), 1.0);
    }
}
