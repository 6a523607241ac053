use std::path::Path;

use anyhow::Context;
use showroom::{Catalog, ShowroomApp, ViewerConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("showroom=info"))
        .init();

    let mut config = ViewerConfig::default();
    let catalog = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = Path::new(&path);
            let catalog = Catalog::from_path(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            // Locators in a catalog file are relative to the file
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.asset_root = parent.to_path_buf();
            }
            catalog
        }
        None => Catalog::builtin(),
    };

    ShowroomApp::new(catalog, config)?.run()
}
