//! Catalog and viewer configuration
//!
//! The catalog is the fixed, ordered list of models the viewer can show. It is
//! established once at startup, either in code, from the built-in showroom, or
//! from a TOML file, and validated before anything is loaded:
//!
//! ```toml
//! environment = "assets/WhiteNeons_NAD.hdr"
//!
//! [[entry]]
//! name = "Car 1"
//! model = "assets/models/car1/scene.gltf"
//! exposure = 2.0
//! light_intensity = 50.0
//! tag = "model-1-gradient"
//! ```
//!
//! [`ViewerConfig`] holds the presentation constants of the viewer itself:
//! surface size, camera, spotlight, ground plane and clear colour.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// One model in the catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Locator of the glTF file, relative to the asset root
    pub model: String,
    /// Tone-mapping exposure used while this model is displayed
    pub exposure: f32,
    /// Spotlight intensity used while this model is displayed
    pub light_intensity: f32,
    /// Presentation hint for the overlay, e.g. a style name
    #[serde(default)]
    pub tag: String,
    /// Overrides the catalog-wide environment map for this entry
    #[serde(default)]
    pub environment: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: &str, model: &str, exposure: f32, light_intensity: f32) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            exposure,
            light_intensity,
            tag: String::new(),
            environment: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn with_environment(mut self, locator: &str) -> Self {
        self.environment = Some(locator.to_string());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyLocator {
                name: self.name.clone(),
            });
        }
        // `!(x > 0.0)` also rejects NaN
        if !(self.exposure > 0.0) || !self.exposure.is_finite() {
            return Err(ConfigError::NonPositiveExposure {
                name: self.name.clone(),
                value: self.exposure,
            });
        }
        if !(self.light_intensity > 0.0) || !self.light_intensity.is_finite() {
            return Err(ConfigError::NonPositiveLightIntensity {
                name: self.name.clone(),
                value: self.light_intensity,
            });
        }
        if let Some(environment) = &self.environment {
            if environment.trim().is_empty() {
                return Err(ConfigError::EmptyLocator {
                    name: format!("{} environment", self.name),
                });
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    environment: String,
    #[serde(rename = "entry", default)]
    entries: Vec<CatalogEntry>,
}

/// Immutable, validated, ordered list of catalog entries
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    environment: String,
}

impl Catalog {
    /// Builds a catalog, failing fast on invalid entries
    pub fn new(entries: Vec<CatalogEntry>, environment: &str) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if environment.trim().is_empty() {
            return Err(ConfigError::EmptyLocator {
                name: "catalog environment".to_string(),
            });
        }

        let mut names = HashSet::new();
        for entry in &entries {
            entry.validate()?;
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
        }

        Ok(Self {
            entries,
            environment: environment.to_string(),
        })
    }

    /// The three-car showroom the viewer ships with
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                CatalogEntry::new("Car 1", "assets/models/car1/scene.gltf", 2.0, 50.0)
                    .with_tag("model-1-gradient"),
                CatalogEntry::new("Car 2", "assets/models/car2/scene.gltf", 1.0, 80.0)
                    .with_tag("model-2-gradient"),
                CatalogEntry::new("Car 3", "assets/models/car3/scene.gltf", 4.0, 50.0)
                    .with_tag("model-3-gradient"),
            ],
            environment: "assets/WhiteNeons_NAD.hdr".to_string(),
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(source)?;
        Self::new(file.entries, &file.environment)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a validated catalog
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn first(&self) -> &CatalogEntry {
        // Validation guarantees at least one entry
        &self.entries[0]
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Environment map that should be active while `index` is displayed
    pub fn environment_for(&self, index: usize) -> &str {
        self.entries
            .get(index)
            .and_then(|entry| entry.environment.as_deref())
            .unwrap_or(&self.environment)
    }
}

/// Spotlight shadow parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    /// Fraction of the cone angle covered by the shadow camera
    pub focus: f32,
    /// Softness of the shadow edge
    pub blur_samples: u32,
    pub near: f32,
    pub far: f32,
    /// Shadow map resolution in texels
    pub map_size: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            focus: 1.0,
            blur_samples: 10,
            near: 1.0,
            far: 20.0,
            map_size: 2048,
        }
    }
}

/// Spotlight placement and cone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLightConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub color: u32,
    /// Half-angle of the cone in radians
    pub angle: f32,
    pub penumbra: f32,
    pub shadow: ShadowConfig,
}

impl Default for SpotLightConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 8.0, 0.0],
            target: [0.0, 0.0, 0.0],
            color: 0xffffff,
            angle: 0.5,
            penumbra: 0.1,
            shadow: ShadowConfig::default(),
        }
    }
}

/// Presentation constants for the viewer
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    /// Initial surface size in logical pixels
    pub width: u32,
    pub height: u32,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    /// Fraction of the remaining orbit motion applied per frame, in (0, 1]
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    /// sRGB clear colour as 0xRRGGBB
    pub clear_color: u32,
    pub ground_size: f32,
    /// sRGB ground colour as 0xRRGGBB
    pub ground_color: u32,
    pub spot_light: SpotLightConfig,
    /// Directory locators are resolved against
    pub asset_root: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Showroom".to_string(),
            width: 800,
            height: 500,
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 1000.0,
            camera_position: [3.65, 2.47, 1.17],
            camera_target: [0.0, 0.0, 0.0],
            damping_factor: 0.1,
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            clear_color: 0xa3a3a3,
            ground_size: 10.0,
            ground_color: 0x5a5a5a,
            spot_light: SpotLightConfig::default(),
            asset_root: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_matches_showroom() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 3);
        let exposures: Vec<f32> = catalog.entries().iter().map(|e| e.exposure).collect();
        assert_eq!(exposures, vec![2.0, 1.0, 4.0]);
        assert_eq!(catalog.get(1).map(|e| e.light_intensity), Some(80.0));
        assert_eq!(catalog.environment_for(2), "assets/WhiteNeons_NAD.hdr");
    }

    #[test]
    fn parses_toml_catalog() {
        let catalog = Catalog::from_toml_str(
            r#"
            environment = "sky.hdr"

            [[entry]]
            name = "Roadster"
            model = "roadster/scene.gltf"
            exposure = 1.5
            light_intensity = 60.0
            tag = "red"

            [[entry]]
            name = "Van"
            model = "van/scene.gltf"
            exposure = 0.8
            light_intensity = 40.0
            environment = "garage.hdr"
            "#,
        )
        .expect("valid catalog");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.first().tag, "red");
        assert_eq!(catalog.environment_for(0), "sky.hdr");
        assert_eq!(catalog.environment_for(1), "garage.hdr");
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = Catalog::new(Vec::new(), "sky.hdr").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCatalog));
    }

    #[test]
    fn rejects_non_positive_values() {
        let err = Catalog::new(vec![CatalogEntry::new("A", "a.gltf", 0.0, 1.0)], "sky.hdr")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveExposure { .. }));

        let err = Catalog::new(
            vec![CatalogEntry::new("A", "a.gltf", 1.0, f32::NAN)],
            "sky.hdr",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveLightIntensity { .. }));
    }

    #[test]
    fn rejects_duplicates_and_empty_locators() {
        let err = Catalog::new(
            vec![
                CatalogEntry::new("A", "a.gltf", 1.0, 1.0),
                CatalogEntry::new("A", "b.gltf", 1.0, 1.0),
            ],
            "sky.hdr",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(name) if name == "A"));

        let err = Catalog::new(vec![CatalogEntry::new("A", " ", 1.0, 1.0)], "sky.hdr")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLocator { .. }));

        let err =
            Catalog::new(vec![CatalogEntry::new("A", "a.gltf", 1.0, 1.0)], "").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLocator { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Catalog::from_toml_str("environment = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
