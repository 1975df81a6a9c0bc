//! Per-field tracking and vertical placement.
//!
//! # Two-character widening
//! A two-ideograph personal name sets visibly narrower than a three-ideograph
//! one at the same point size. With widening enabled, a field whose trimmed text
//! is exactly two CJK Unified ideographs gets `1 + 2 * trackingEm` em of tracking
//! so the column width of a mixed roster evens out without per-record tuning.
//!
//! # Trailing gap compensation
//! Letter-spacing also inserts its gap after the last glyph, which pushes
//! centred text left by one tracking unit. Every resolved field therefore carries
//! a negative trailing margin equal to its effective tracking.

use serde::{Deserialize, Serialize};

use crate::layout::style::FieldStyle;
use crate::models::record::CardField;

/// Effective tracking and its paired trailing compensation, both in em.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTypography {
    pub tracking_em: f64,
    /// Applied as a negative trailing margin. Always equal to `tracking_em`.
    pub margin_compensation_em: f64,
}

/// Fixed baseline anchor per field, in points. These balance the default
/// four-line stack and are not derived from anything.
pub const fn field_baseline_pt(field: CardField) -> f64 {
    match field {
        CardField::ChineseName => 25.0,
        CardField::EnglishName => 12.0,
        CardField::ChineseCompany => -5.0,
        CardField::EnglishCompany => -10.0,
    }
}

/// CJK Unified Ideographs block, U+4E00..=U+9FFF.
fn is_cjk_unified(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// True when the whole trimmed string is exactly two CJK Unified ideographs.
pub fn is_two_char_name(text: &str) -> bool {
    let mut chars = text.trim().chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), None) if is_cjk_unified(a) && is_cjk_unified(b)
    )
}

pub fn resolve(text: &str, style: &FieldStyle, widening: bool) -> ResolvedTypography {
    let tracking_em = if widening && !text.is_empty() && is_two_char_name(text) {
        1.0 + 2.0 * style.tracking_em
    } else {
        style.tracking_em
    };
    ResolvedTypography {
        tracking_em,
        margin_compensation_em: tracking_em,
    }
}

/// Vertical translation of a field: operator offset plus the fixed anchor.
pub fn vertical_offset_pt(field: CardField, style: &FieldStyle) -> f64 {
    style.offset_pt + field_baseline_pt(field)
}
