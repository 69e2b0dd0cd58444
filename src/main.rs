//! `chaos-tree [scene.json] [photo ...]`
//!
//! A `.json` argument replaces the default Classic scene; every other argument
//! is hung on the tree as a photo card. `RUST_LOG` overrides the default
//! `chaos_tree=info` filter.

use std::path::Path;

use chaos_tree::feature::PhotoRef;
use chaos_tree::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chaos_tree=info")),
        )
        .init();

    let mut config_path = None;
    let mut photos = Vec::new();
    for arg in std::env::args().skip(1) {
        let is_json = Path::new(&arg)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            config_path = Some(arg);
        } else {
            photos.push(PhotoRef::from(arg));
        }
    }

    let config = match config_path {
        Some(path) => {
            tracing::info!(%path, "loading scene config");
            SceneConfig::from_json_file(&path)?
        }
        None => SceneConfig::for_theme(Theme::default()),
    };

    let mut scene = Scene::new(config);
    let change = scene.gallery_mut().sync(&photos);
    if !change.is_empty() {
        tracing::info!(photos = change.added.len(), "photo cards added");
    }

    chaos_tree::app::run(scene)
}
