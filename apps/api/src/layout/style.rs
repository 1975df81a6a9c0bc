//! Style configuration — the only input to the engine besides a record.
//!
//! `LayoutConfig` is an immutable value per render. Every "edit" goes through a
//! `with_*` method that returns a new value.
//!
//! # Decoding rules
//! Stored presets predate some fields, and operators type numbers into free
//! text inputs. Decoding therefore never fails on content:
//! - a missing field takes its documented default (per field for styles)
//! - a numeric field that is not a finite number, nor a string parsing as one,
//!   decodes as `0`
//! - `cropOffsetMm` or a style entry that is not an object takes its own
//!   default; sibling settings are kept
//! - `previewScale` is clamped into `[0.30, 1.00]`
//!
//! Wire shape is flat camelCase: the global keys and the four style objects
//! (`chineseName`, `englishName`, `chineseCompany`, `englishCompany`) sit side
//! by side at the top level.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::record::CardField;

pub const MIN_PREVIEW_SCALE: f64 = 0.30;
pub const MAX_PREVIEW_SCALE: f64 = 1.00;

// ────────────────────────────────────────────────────────────────────────────
// Lenient scalar decoding
// ────────────────────────────────────────────────────────────────────────────

pub(crate) mod lenient {
    use std::fmt;

    use serde::de::{self, DeserializeOwned, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
    use serde::Deserialize;

    use super::{MAX_PREVIEW_SCALE, MIN_PREVIEW_SCALE};

    /// Parses free text the way a numeric input would: trimmed, finite or 0.
    pub fn parse_number(s: &str) -> f64 {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(if v.is_finite() { v } else { 0.0 })
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            Ok(parse_number(v))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<f64, D::Error> {
            d.deserialize_any(NumberVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<f64, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(0.0)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<f64, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(0.0)
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        d.deserialize_any(NumberVisitor)
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        number(d).map(Some)
    }

    pub fn preview_scale<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        number(d).map(|v| v.clamp(MIN_PREVIEW_SCALE, MAX_PREVIEW_SCALE))
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            Ok(v != 0.0 && v.is_finite())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            Ok(v.trim().eq_ignore_ascii_case("true"))
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<bool, D::Error> {
            d.deserialize_any(FlagVisitor)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<bool, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(false)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<bool, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(false)
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        d.deserialize_any(FlagVisitor)
    }

    /// Non-string or blank values become `None` so the caller's default applies.
    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        Ok(match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    fn object<T: DeserializeOwned>(value: serde_json::Value) -> Option<T> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Nested object. Anything that is not an object takes the section's
    /// default without disturbing its siblings.
    pub fn section<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = serde_json::Value::deserialize(d)?;
        Ok(object(value).unwrap_or_default())
    }

    /// Like `section`, but leaves the fill to the caller.
    pub fn opt_section<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = serde_json::Value::deserialize(d)?;
        Ok(object(value))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field styles
// ────────────────────────────────────────────────────────────────────────────

/// Type settings for one of the four fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyle {
    pub size_pt: f64,
    /// Operator adjustment added on top of the field's fixed baseline anchor.
    pub offset_pt: f64,
    pub font_family: String,
    pub tracking_em: f64,
}

impl FieldStyle {
    /// Documented default for `field`; also the fill value for any attribute
    /// missing from a stored preset.
    pub fn default_for(field: CardField) -> Self {
        let (size_pt, font_family, tracking_em) = match field {
            CardField::ChineseName => (72.0, "Noto Serif SC", 0.1),
            CardField::EnglishName => (28.0, "Helvetica Neue", 0.05),
            CardField::ChineseCompany => (24.0, "Noto Sans SC", 0.0),
            CardField::EnglishCompany => (16.0, "Helvetica Neue", 0.0),
        };
        Self {
            size_pt,
            offset_pt: 0.0,
            font_family: font_family.to_string(),
            tracking_em,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PartialFieldStyle {
    #[serde(deserialize_with = "lenient::opt_number")]
    size_pt: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_number")]
    offset_pt: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_text")]
    font_family: Option<String>,
    #[serde(deserialize_with = "lenient::opt_number")]
    tracking_em: Option<f64>,
}

impl PartialFieldStyle {
    fn fill(self, field: CardField) -> FieldStyle {
        let base = FieldStyle::default_for(field);
        FieldStyle {
            size_pt: self.size_pt.unwrap_or(base.size_pt),
            offset_pt: self.offset_pt.unwrap_or(base.offset_pt),
            font_family: self.font_family.unwrap_or(base.font_family),
            tracking_em: self.tracking_em.unwrap_or(base.tracking_em),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PartialFieldStyles {
    #[serde(deserialize_with = "lenient::opt_section")]
    chinese_name: Option<PartialFieldStyle>,
    #[serde(deserialize_with = "lenient::opt_section")]
    english_name: Option<PartialFieldStyle>,
    #[serde(deserialize_with = "lenient::opt_section")]
    chinese_company: Option<PartialFieldStyle>,
    #[serde(deserialize_with = "lenient::opt_section")]
    english_company: Option<PartialFieldStyle>,
}

/// Fixed-shape set of the four field styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PartialFieldStyles")]
pub struct FieldStyles {
    pub chinese_name: FieldStyle,
    pub english_name: FieldStyle,
    pub chinese_company: FieldStyle,
    pub english_company: FieldStyle,
}

impl From<PartialFieldStyles> for FieldStyles {
    fn from(p: PartialFieldStyles) -> Self {
        let fill = |s: Option<PartialFieldStyle>, field| s.unwrap_or_default().fill(field);
        Self {
            chinese_name: fill(p.chinese_name, CardField::ChineseName),
            english_name: fill(p.english_name, CardField::EnglishName),
            chinese_company: fill(p.chinese_company, CardField::ChineseCompany),
            english_company: fill(p.english_company, CardField::EnglishCompany),
        }
    }
}

impl Default for FieldStyles {
    fn default() -> Self {
        PartialFieldStyles::default().into()
    }
}

impl FieldStyles {
    pub fn get(&self, field: CardField) -> &FieldStyle {
        match field {
            CardField::ChineseName => &self.chinese_name,
            CardField::EnglishName => &self.english_name,
            CardField::ChineseCompany => &self.chinese_company,
            CardField::EnglishCompany => &self.english_company,
        }
    }

    fn get_mut(&mut self, field: CardField) -> &mut FieldStyle {
        match field {
            CardField::ChineseName => &mut self.chinese_name,
            CardField::EnglishName => &mut self.english_name,
            CardField::ChineseCompany => &mut self.chinese_company,
            CardField::EnglishCompany => &mut self.english_company,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Global layout
// ────────────────────────────────────────────────────────────────────────────

/// Printer-drift calibration, measured by the operator with a ruler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOffsetMm {
    #[serde(deserialize_with = "lenient::number")]
    pub x: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalLayoutConfig {
    #[serde(deserialize_with = "lenient::flag")]
    pub enable_two_char_widening: bool,
    /// Uniform vertical gap between consecutive fields on a face.
    #[serde(deserialize_with = "lenient::number")]
    pub global_spacing_pt: f64,
    #[serde(deserialize_with = "lenient::flag")]
    pub show_crop_marks: bool,
    #[serde(deserialize_with = "lenient::section")]
    pub crop_offset_mm: CropOffsetMm,
    #[serde(deserialize_with = "lenient::flag")]
    pub show_fold_line: bool,
    /// Rotate the face-pair onto the page instead of down-scaling it.
    #[serde(deserialize_with = "lenient::flag")]
    pub rotate_for_print: bool,
    /// Screen-only zoom; never read on the print path.
    #[serde(deserialize_with = "lenient::preview_scale")]
    pub preview_scale: f64,
}

impl Default for GlobalLayoutConfig {
    fn default() -> Self {
        Self {
            enable_two_char_widening: true,
            global_spacing_pt: 6.0,
            show_crop_marks: true,
            crop_offset_mm: CropOffsetMm::default(),
            show_fold_line: false,
            rotate_for_print: false,
            preview_scale: 0.5,
        }
    }
}

/// Complete engine configuration: globals plus the four field styles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(flatten)]
    pub global: GlobalLayoutConfig,
    #[serde(flatten)]
    pub styles: FieldStyles,
}

impl LayoutConfig {
    /// Decodes a stored or submitted settings payload. Never fails: a payload
    /// that is not an object at all yields the default config.
    pub fn from_json_lenient(value: serde_json::Value) -> Self {
        if !value.is_object() {
            warn!("Layout settings payload is not an object; using defaults");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Layout settings payload could not be decoded ({e}); using defaults");
            Self::default()
        })
    }

    pub fn style(&self, field: CardField) -> &FieldStyle {
        self.styles.get(field)
    }

    pub fn with_style(&self, field: CardField, style: FieldStyle) -> Self {
        let mut next = self.clone();
        *next.styles.get_mut(field) = style;
        next
    }

    pub fn with_crop_offset(&self, x: f64, y: f64) -> Self {
        let mut next = self.clone();
        next.global.crop_offset_mm = CropOffsetMm { x, y };
        next
    }

    pub fn with_rotate_for_print(&self, rotate: bool) -> Self {
        let mut next = self.clone();
        next.global.rotate_for_print = rotate;
        next
    }

    pub fn with_fold_line(&self, show: bool) -> Self {
        let mut next = self.clone();
        next.global.show_fold_line = show;
        next
    }

    pub fn with_preview_scale(&self, scale: f64) -> Self {
        let mut next = self.clone();
        next.global.preview_scale = if scale.is_finite() {
            scale.clamp(MIN_PREVIEW_SCALE, MAX_PREVIEW_SCALE)
        } else {
            MIN_PREVIEW_SCALE
        };
        next
    }
}
