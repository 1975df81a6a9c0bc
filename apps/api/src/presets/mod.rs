pub mod handlers;
pub mod store;

pub use store::{MemoryPresetStore, PgPresetStore, PresetStore};
