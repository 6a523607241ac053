//! Where asset bytes come from

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Byte source for model and environment files
///
/// Locators are `/`-separated paths. Implementations are shared with the
/// loader's worker threads.
pub trait AssetSource: Send + Sync {
    fn read(&self, locator: &str) -> io::Result<Vec<u8>>;
}

/// Reads locators relative to a root directory on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for FileSource {
    fn read(&self, locator: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(locator))
    }
}

/// In-memory files keyed by locator
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locator: &str, bytes: impl Into<Vec<u8>>) {
        self.files.insert(locator.to_string(), bytes.into());
    }

    pub fn with_file(mut self, locator: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(locator, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn read(&self, locator: &str) -> io::Result<Vec<u8>> {
        self.files.get(locator).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such asset: {locator}"))
        })
    }
}

/// Resolves `uri` against the directory of `base`
///
/// `resolve_relative("models/car/scene.gltf", "scene.bin")` yields
/// `models/car/scene.bin`. Segments of `uri` are percent-decoded, so
/// `scene%20data.bin` names `scene data.bin`. `..` segments walk up, `.`
/// segments are dropped.
pub fn resolve_relative(base: &str, uri: &str) -> String {
    let mut segments: Vec<Cow<'_, str>> = match base.rfind('/') {
        Some(pos) => base[..pos].split('/').map(Cow::Borrowed).collect(),
        None => Vec::new(),
    };

    for raw in uri.split('/') {
        // Malformed escapes are kept verbatim
        let segment = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
        match segment.as_ref() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_uris_next_to_base() {
        assert_eq!(
            resolve_relative("assets/models/car1/scene.gltf", "scene.bin"),
            "assets/models/car1/scene.bin"
        );
        assert_eq!(
            resolve_relative("assets/models/car1/scene.gltf", "../shared/wheel.bin"),
            "assets/models/shared/wheel.bin"
        );
        assert_eq!(resolve_relative("scene.gltf", "./scene.bin"), "scene.bin");
    }

    #[test]
    fn percent_encoded_segments_are_decoded() {
        assert_eq!(
            resolve_relative("car/scene.gltf", "scene%20data.bin"),
            "car/scene data.bin"
        );
        assert_eq!(
            resolve_relative("cars/red/scene.gltf", "%2E%2E/shared%2Fwheel.bin"),
            "cars/shared/wheel.bin"
        );
        assert_eq!(resolve_relative("scene.gltf", "100%.bin"), "100%.bin");
    }

    #[test]
    fn memory_source_reports_missing_files() {
        let source = MemorySource::new().with_file("a.bin", vec![1, 2, 3]);
        assert_eq!(source.read("a.bin").unwrap(), vec![1, 2, 3]);

        let err = source.read("b.bin").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
