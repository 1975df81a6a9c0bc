//! Font Store — uploaded font binaries plus their metadata.
//!
//! Metadata (the catalog) is keyed by display name. Uploading a font whose
//! display name is already taken replaces the metadata (last write wins) and
//! leaves the older binary in storage, unreferenced. Whether that binary should
//! be reclaimed is still undecided, so the orphan is only logged.
//!
//! Binaries are written before metadata and deleted before metadata, so a
//! catalog entry never outlives a failed operation in a way a retry can't fix.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::StoreError;
use crate::fonts::naming::{check_stored_name, plan_upload, FontFormat, UploadName};
use crate::models::font::{CustomFont, CustomFontRow};

#[async_trait]
pub trait FontStore: Send + Sync {
    async fn list(&self) -> Result<Vec<CustomFont>, StoreError>;

    async fn upload(&self, bytes: Bytes, original_name: &str) -> Result<CustomFont, StoreError>;

    async fn delete(&self, file_name: &str) -> Result<(), StoreError>;

    /// Raw binary of a stored font, for serving.
    async fn fetch(&self, file_name: &str) -> Result<(Bytes, FontFormat), StoreError>;
}

/// Font metadata, keyed by display name.
#[async_trait]
pub trait FontCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<CustomFont>, StoreError>;

    async fn find(&self, file_name: &str) -> Result<Option<CustomFont>, StoreError>;

    /// Inserts or replaces the entry for `font.name`. Returns the file name of
    /// the entry it replaced, if any.
    async fn upsert(&self, font: &CustomFont) -> Result<Option<String>, StoreError>;

    /// Returns false when no entry has `file_name`.
    async fn remove(&self, file_name: &str) -> Result<bool, StoreError>;
}

/// Font binaries, keyed by stored file name.
#[async_trait]
pub trait FontBlobs: Send + Sync {
    async fn put(&self, file_name: &str, bytes: Bytes, format: FontFormat)
        -> Result<(), StoreError>;

    async fn get(&self, file_name: &str) -> Result<Bytes, StoreError>;

    /// Deleting a missing binary succeeds.
    async fn delete(&self, file_name: &str) -> Result<(), StoreError>;
}

/// Upload limits and URL shape shared by all backends.
#[derive(Debug, Clone)]
pub struct FontStoreSettings {
    pub url_prefix: String,
    pub max_bytes: usize,
}

impl FontStoreSettings {
    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name)
    }
}

/// Millisecond stamp, strictly increasing within the process.
fn next_stamp(last: &AtomicI64) -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = last
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
            Some(now.max(prev + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1)
}

/// Checks run before any byte is written. Format first: a rejected upload
/// must not leave anything behind.
fn prepare(
    bytes: &Bytes,
    original_name: &str,
    settings: &FontStoreSettings,
    stamp: i64,
) -> Result<(UploadName, String), StoreError> {
    let plan = plan_upload(original_name, stamp)?;
    if bytes.is_empty() {
        return Err(StoreError::InvalidInput("font file is empty".to_string()));
    }
    if bytes.len() > settings.max_bytes {
        return Err(StoreError::InvalidInput(format!(
            "font file is {} bytes, limit is {}",
            bytes.len(),
            settings.max_bytes
        )));
    }
    let url = settings.url_for(&plan.file_name);
    Ok((plan, url))
}

// ────────────────────────────────────────────────────────────────────────────
// Font library: catalog + blobs
// ────────────────────────────────────────────────────────────────────────────

pub struct FontLibrary {
    catalog: Arc<dyn FontCatalog>,
    blobs: Arc<dyn FontBlobs>,
    settings: FontStoreSettings,
    last_stamp: AtomicI64,
}

impl FontLibrary {
    pub fn new(
        catalog: Arc<dyn FontCatalog>,
        blobs: Arc<dyn FontBlobs>,
        settings: FontStoreSettings,
    ) -> Self {
        Self {
            catalog,
            blobs,
            settings,
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Process-local catalog and binaries.
    pub fn in_memory(settings: FontStoreSettings) -> Self {
        Self::new(
            Arc::new(MemoryFontCatalog::default()),
            Arc::new(MemoryFontBlobs::default()),
            settings,
        )
    }
}

#[async_trait]
impl FontStore for FontLibrary {
    async fn list(&self) -> Result<Vec<CustomFont>, StoreError> {
        self.catalog.list().await
    }

    async fn upload(&self, bytes: Bytes, original_name: &str) -> Result<CustomFont, StoreError> {
        let stamp = next_stamp(&self.last_stamp);
        let (plan, url) = prepare(&bytes, original_name, &self.settings, stamp)?;
        let size = bytes.len();
        let font = CustomFont {
            name: plan.display_name.clone(),
            file_name: plan.file_name.clone(),
            url,
        };

        self.blobs.put(&plan.file_name, bytes, plan.format).await?;

        let previous = match self.catalog.upsert(&font).await {
            Ok(previous) => previous,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&plan.file_name).await {
                    warn!(
                        "Font '{}' metadata write failed; binary {} left behind: {cleanup}",
                        font.name, plan.file_name
                    );
                }
                return Err(e);
            }
        };

        if let Some(old) = previous.filter(|old| *old != font.file_name) {
            warn!(
                "Font '{}' replaced; previous binary {old} is no longer referenced",
                font.name
            );
        }
        info!("Uploaded font '{}' as {} ({size} bytes)", font.name, font.file_name);
        Ok(font)
    }

    async fn delete(&self, file_name: &str) -> Result<(), StoreError> {
        if self.catalog.find(file_name).await?.is_none() {
            return Err(StoreError::NotFound(format!("font {file_name}")));
        }
        // Binary first: if this fails the entry is still listed and the
        // delete can be retried.
        self.blobs.delete(file_name).await?;
        self.catalog.remove(file_name).await?;
        info!("Deleted font {file_name}");
        Ok(())
    }

    async fn fetch(&self, file_name: &str) -> Result<(Bytes, FontFormat), StoreError> {
        let format = check_stored_name(file_name)?;
        let data = self.blobs.get(file_name).await?;
        Ok((data, format))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres catalog
// ────────────────────────────────────────────────────────────────────────────

pub struct PgFontCatalog {
    pool: PgPool,
}

impl PgFontCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FontCatalog for PgFontCatalog {
    async fn list(&self) -> Result<Vec<CustomFont>, StoreError> {
        let rows = sqlx::query_as::<_, CustomFontRow>(
            "SELECT name, file_name, url, created_at FROM custom_fonts ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CustomFont::from).collect())
    }

    async fn find(&self, file_name: &str) -> Result<Option<CustomFont>, StoreError> {
        let row = sqlx::query_as::<_, CustomFontRow>(
            "SELECT name, file_name, url, created_at FROM custom_fonts WHERE file_name = $1",
        )
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CustomFont::from))
    }

    async fn upsert(&self, font: &CustomFont) -> Result<Option<String>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT file_name FROM custom_fonts WHERE name = $1 FOR UPDATE")
                .bind(&font.name)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO custom_fonts (name, file_name, url, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (name) DO UPDATE
                SET file_name = EXCLUDED.file_name,
                    url = EXCLUDED.url,
                    created_at = NOW()
            "#,
        )
        .bind(&font.name)
        .bind(&font.file_name)
        .bind(&font.url)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous)
    }

    async fn remove(&self, file_name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM custom_fonts WHERE file_name = $1")
            .bind(file_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 binaries
// ────────────────────────────────────────────────────────────────────────────

pub struct S3FontBlobs {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FontBlobs {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { s3, bucket }
    }

    fn key(file_name: &str) -> String {
        format!("fonts/{file_name}")
    }
}

#[async_trait]
impl FontBlobs for S3FontBlobs {
    async fn put(
        &self,
        file_name: &str,
        bytes: Bytes,
        format: FontFormat,
    ) -> Result<(), StoreError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(Self::key(file_name))
            .body(ByteStream::from(bytes))
            .content_type(format.content_type())
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 upload failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, file_name: &str) -> Result<Bytes, StoreError> {
        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(Self::key(file_name))
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    StoreError::NotFound(format!("font {file_name}"))
                } else {
                    StoreError::Unavailable(format!("S3 download failed: {e}"))
                }
            })?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 download failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, file_name: &str) -> Result<(), StoreError> {
        // S3 reports success for keys that do not exist.
        self.s3
            .delete_object()
            .bucket(&self.bucket)
            .key(Self::key(file_name))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backends
// ────────────────────────────────────────────────────────────────────────────

/// Keeps upload order; a replaced entry moves to the end.
#[derive(Default)]
pub struct MemoryFontCatalog {
    fonts: RwLock<Vec<CustomFont>>,
}

#[async_trait]
impl FontCatalog for MemoryFontCatalog {
    async fn list(&self) -> Result<Vec<CustomFont>, StoreError> {
        Ok(self.fonts.read().await.clone())
    }

    async fn find(&self, file_name: &str) -> Result<Option<CustomFont>, StoreError> {
        let fonts = self.fonts.read().await;
        Ok(fonts.iter().find(|f| f.file_name == file_name).cloned())
    }

    async fn upsert(&self, font: &CustomFont) -> Result<Option<String>, StoreError> {
        let mut fonts = self.fonts.write().await;
        let pos = fonts.iter().position(|f| f.name == font.name);
        let previous = pos.map(|pos| fonts.remove(pos).file_name);
        fonts.push(font.clone());
        Ok(previous)
    }

    async fn remove(&self, file_name: &str) -> Result<bool, StoreError> {
        let mut fonts = self.fonts.write().await;
        let before = fonts.len();
        fonts.retain(|f| f.file_name != file_name);
        Ok(fonts.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryFontBlobs {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryFontBlobs {
    #[cfg(test)]
    async fn count(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl FontBlobs for MemoryFontBlobs {
    async fn put(&self, file_name: &str, bytes: Bytes, _: FontFormat) -> Result<(), StoreError> {
        self.blobs.write().await.insert(file_name.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, file_name: &str) -> Result<Bytes, StoreError> {
        self.blobs
            .read()
            .await
            .get(file_name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("font {file_name}")))
    }

    async fn delete(&self, file_name: &str) -> Result<(), StoreError> {
        self.blobs.write().await.remove(file_name);
        Ok(())
    }
}
