use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata of an uploaded font. `name` is what styles put in `fontFamily`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFont {
    pub name: String,
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomFontRow {
    pub name: String,
    pub file_name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<CustomFontRow> for CustomFont {
    fn from(row: CustomFontRow) -> Self {
        CustomFont {
            name: row.name,
            file_name: row.file_name,
            url: row.url,
        }
    }
}
