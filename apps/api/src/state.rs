use std::sync::Arc;

use crate::config::Config;
use crate::fonts::{FontLibrary, FontStore, FontStoreSettings};
use crate::presets::{MemoryPresetStore, PresetStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Named layout configurations. Backend chosen from STORAGE_BACKEND.
    pub presets: Arc<dyn PresetStore>,
    /// Uploaded custom fonts.
    pub fonts: Arc<dyn FontStore>,
    pub config: Config,
}

impl AppState {
    /// State backed by process-local stores.
    pub fn in_memory(config: Config) -> Self {
        let fonts = FontLibrary::in_memory(FontStoreSettings {
            url_prefix: config.font_url_prefix.clone(),
            max_bytes: config.max_font_bytes,
        });
        AppState {
            presets: Arc::new(MemoryPresetStore::new()),
            fonts: Arc::new(fonts),
            config,
        }
    }
}
