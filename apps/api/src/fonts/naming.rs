//! Upload naming rules for custom fonts.
//!
//! Accepted formats are decided by extension alone, before anything is written.
//! Stored file names keep ASCII alphanumerics, CJK Unified ideographs and `_`;
//! everything else becomes `_`. A millisecond timestamp prefix keeps every
//! upload's binary distinct, even when display names collide.

use std::path::Path;

use crate::errors::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    Ttf,
    Otf,
    Woff,
    Woff2,
}

impl FontFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ttf" => Some(Self::Ttf),
            "otf" => Some(Self::Otf),
            "woff" => Some(Self::Woff),
            "woff2" => Some(Self::Woff2),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ttf => "ttf",
            Self::Otf => "otf",
            Self::Woff => "woff",
            Self::Woff2 => "woff2",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Ttf => "font/ttf",
            Self::Otf => "font/otf",
            Self::Woff => "font/woff",
            Self::Woff2 => "font/woff2",
        }
    }

    /// Format of an already stored file, by its extension.
    pub fn of_file(file_name: &str) -> Option<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Display name and storage name for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadName {
    pub display_name: String,
    pub file_name: String,
    pub format: FontFormat,
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

pub fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

/// Validates `original_name` and derives the names to store it under.
pub fn plan_upload(original_name: &str, uploaded_at_ms: i64) -> Result<UploadName, StoreError> {
    // Browsers on some platforms send a full client path.
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name)
        .trim();
    let unsupported = || StoreError::UnsupportedFontFormat {
        file_name: base.to_string(),
    };

    let (stem, ext) = base.rsplit_once('.').ok_or_else(unsupported)?;
    let format = FontFormat::from_extension(ext).ok_or_else(unsupported)?;

    let display_name = stem.trim();
    if display_name.is_empty() {
        return Err(StoreError::InvalidInput(
            "font file name has no name before its extension".to_string(),
        ));
    }

    Ok(UploadName {
        display_name: display_name.to_string(),
        file_name: format!(
            "{uploaded_at_ms}_{}.{}",
            sanitize_stem(display_name),
            format.extension()
        ),
        format,
    })
}

/// Rejects anything that could not have come out of `plan_upload`.
pub fn check_stored_name(file_name: &str) -> Result<FontFormat, StoreError> {
    let (stem, _) = file_name
        .rsplit_once('.')
        .ok_or_else(|| StoreError::NotFound(format!("font {file_name}")))?;
    if stem.is_empty() || !stem.chars().all(is_allowed) {
        return Err(StoreError::NotFound(format!("font {file_name}")));
    }
    FontFormat::of_file(file_name).ok_or_else(|| StoreError::NotFound(format!("font {file_name}")))
}
