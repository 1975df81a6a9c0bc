//! Preset Store — named `LayoutConfig` snapshots.
//!
//! `AppState` holds an `Arc<dyn PresetStore>`; the backend is picked at startup
//! from `STORAGE_BACKEND`. Payloads are stored as raw JSON and decoded leniently
//! on the way out, so presets saved before a config field existed still load.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::StoreError;
use crate::models::preset::{Preset, PresetRow};

#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Preset>, StoreError>;

    /// Inserts or replaces the preset with `id`. `settings` is stored as given.
    async fn upsert(&self, id: &str, name: &str, settings: Value) -> Result<Preset, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

fn validate(id: &str, name: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidInput("preset id cannot be empty".to_string()));
    }
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput("preset name cannot be empty".to_string()));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres backend
// ────────────────────────────────────────────────────────────────────────────

pub struct PgPresetStore {
    pool: PgPool,
}

impl PgPresetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresetStore for PgPresetStore {
    async fn list(&self) -> Result<Vec<Preset>, StoreError> {
        let rows = sqlx::query_as::<_, PresetRow>(
            "SELECT id, name, settings, updated_at FROM presets ORDER BY updated_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Preset::from).collect())
    }

    async fn upsert(&self, id: &str, name: &str, settings: Value) -> Result<Preset, StoreError> {
        validate(id, name)?;
        let row = sqlx::query_as::<_, PresetRow>(
            r#"
            INSERT INTO presets (id, name, settings, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    settings = EXCLUDED.settings,
                    updated_at = NOW()
            RETURNING id, name, settings, updated_at
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(&settings)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved preset {id} ({})", row.name);
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM presets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("preset {id}")));
        }
        info!("Deleted preset {id}");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store. Keeps insertion order; an upsert of an existing id
/// replaces it in place.
#[derive(Default, Clone)]
pub struct MemoryPresetStore {
    rows: Arc<RwLock<Vec<PresetRow>>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresetStore for MemoryPresetStore {
    async fn list(&self) -> Result<Vec<Preset>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().cloned().map(Preset::from).collect())
    }

    async fn upsert(&self, id: &str, name: &str, settings: Value) -> Result<Preset, StoreError> {
        validate(id, name)?;
        let row = PresetRow {
            id: id.to_string(),
            name: name.trim().to_string(),
            settings,
            updated_at: Utc::now(),
        };
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        info!("Saved preset {id} ({})", row.name);
        Ok(row.into())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(StoreError::NotFound(format!("preset {id}")));
        }
        info!("Deleted preset {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::style::LayoutConfig;
    use serde_json::json;

    #[tokio::test]
    async fn upsert_replaces_in_place_and_lists_in_order() {
        let store = MemoryPresetStore::new();
        store.upsert("a", "Gala", json!({})).await.unwrap();
        store.upsert("b", "Forum", json!({})).await.unwrap();
        store
            .upsert("a", "Gala 2", json!({ "rotateForPrint": true }))
            .await
            .unwrap();

        let presets = store.list().await.unwrap();
        let names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Gala 2", "Forum"]);
        assert!(presets[0].settings.global.rotate_for_print);
    }

    #[tokio::test]
    async fn preset_missing_newer_fields_loads_with_defaults() {
        let store = MemoryPresetStore::new();
        store
            .upsert(
                "legacy",
                "Legacy",
                json!({ "enableTwoCharWidening": true, "globalSpacingPt": "4" }),
            )
            .await
            .unwrap();
        let preset = store.list().await.unwrap().remove(0);
        assert!(!preset.settings.global.show_fold_line);
        assert_eq!(preset.settings.global.crop_offset_mm.x, 0.0);
        assert_eq!(preset.settings.global.global_spacing_pt, 4.0);
    }

    #[tokio::test]
    async fn corrupt_payload_loads_as_default_config() {
        let store = MemoryPresetStore::new();
        store.upsert("x", "Broken", json!([1, 2, 3])).await.unwrap();
        let preset = store.list().await.unwrap().remove(0);
        assert_eq!(preset.settings, LayoutConfig::default());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemoryPresetStore::new();
        store.upsert("a", "Gala", json!({})).await.unwrap();
        store.delete("a").await.unwrap();
        assert!(matches!(store.delete("a").await, Err(StoreError::NotFound(_))));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryPresetStore::new();
        assert!(matches!(
            store.upsert("a", "  ", json!({})).await,
            Err(StoreError::InvalidInput(_))
        ));
    }
}
