use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::layout::style::LayoutConfig;

/// A named, persisted `LayoutConfig` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub settings: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PresetRow {
    pub id: String,
    pub name: String,
    /// Raw stored payload; may predate newer config fields.
    pub settings: Value,
    pub updated_at: DateTime<Utc>,
}

impl From<PresetRow> for Preset {
    fn from(row: PresetRow) -> Self {
        Preset {
            id: row.id,
            name: row.name,
            settings: LayoutConfig::from_json_lenient(row.settings),
        }
    }
}
