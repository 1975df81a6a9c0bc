//! Physical constants and millimetre geometry shared by the compositor.
//!
//! Page geometry is expressed in millimetres, type in points. None of the
//! constants below are configurable: the crop-mark calibration only holds
//! while the host prints at exactly this page size, 100% scale, zero margins.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Target paper (portrait)
// ────────────────────────────────────────────────────────────────────────────

pub const PAGE_WIDTH_MM: f64 = 297.0;
pub const PAGE_HEIGHT_MM: f64 = 420.0;

// ────────────────────────────────────────────────────────────────────────────
// Face-pair footprint
// ────────────────────────────────────────────────────────────────────────────

/// Unscaled width of the face-pair when laid out unrotated.
///
/// Empirical calibration constant measured against printed output. Do not
/// derive it from font metrics; recalibrate against paper instead.
pub const NATIVE_CONTENT_WIDTH_MM: f64 = 357.0;
/// Unscaled height of the face-pair (front on top, back below).
pub const NATIVE_CONTENT_HEIGHT_MM: f64 = 270.0;
/// Height of a single face. The fold runs along the boundary between faces.
pub const FACE_HEIGHT_MM: f64 = NATIVE_CONTENT_HEIGHT_MM / 2.0;

/// Horizontal inset of the trim rectangle inside the native footprint.
pub const TRIM_INSET_X_MM: f64 = 1.0;
pub const TRIM_WIDTH_MM: f64 = NATIVE_CONTENT_WIDTH_MM - 2.0 * TRIM_INSET_X_MM;
pub const TRIM_HEIGHT_MM: f64 = NATIVE_CONTENT_HEIGHT_MM;

// Nominal (pre-calibration) crop mark distances from the long and short
// paper edges of the sheet the native block was measured on.
pub const NOMINAL_CROP_DISTANCE_H_MM: f64 = 32.5;
pub const NOMINAL_CROP_DISTANCE_V_MM: f64 = 13.5;

pub const CROP_MARK_ARM_MM: f64 = 5.0;
pub const GUIDE_STROKE_MM: f64 = 0.25;

// The native block must not fit the page width; this is why fit-scale exists.
const _: () = assert!(NATIVE_CONTENT_WIDTH_MM > PAGE_WIDTH_MM);
// Rotated, it must fit without scaling.
const _: () = assert!(NATIVE_CONTENT_HEIGHT_MM <= PAGE_WIDTH_MM);
const _: () = assert!(NATIVE_CONTENT_WIDTH_MM <= PAGE_HEIGHT_MM);

/// Millimetres per typographic point (1pt = 1/72 in).
pub const MM_PER_PT: f64 = 25.4 / 72.0;

#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_PT
}

// ────────────────────────────────────────────────────────────────────────────
// Geometry primitives
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointMm {
    pub x: f64,
    pub y: f64,
}

impl PointMm {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, origin top-left, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectMm {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectMm {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> PointMm {
        PointMm::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn corners(&self) -> [PointMm; 4] {
        [
            PointMm::new(self.x, self.y),
            PointMm::new(self.right(), self.y),
            PointMm::new(self.x, self.bottom()),
            PointMm::new(self.right(), self.bottom()),
        ]
    }

    /// Smallest rectangle containing every point.
    pub fn bounding(points: &[PointMm]) -> Self {
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn contains_rect(&self, other: &RectMm) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// A straight stroke in page or content space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineMm {
    pub from: PointMm,
    pub to: PointMm,
}
