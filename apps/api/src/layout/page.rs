//! Page compositing — places a face-pair on a fixed 297 × 420 mm canvas.
//!
//! # Fit decision
//! The face-pair is 357 mm wide unrotated, wider than the page. The config
//! picks one of two presentations, never the content:
//! - `rotateForPrint = false`: upright, uniformly scaled by `297 / 357` about
//!   the block centre so it spans exactly the page width
//! - `rotateForPrint = true`: turned 90° clockwise, where 270 × 357 mm already
//!   fits, at scale 1
//!
//! The canvas itself is always 297 × 420 mm; pagination on the host relies on it.
//!
//! # Calibration
//! Crop marks sit on the trim corners after the content transform, each pushed
//! outward by the operator's measured `cropOffsetMm` in page axes. The fold
//! guide follows the content only and ignores that offset.

use serde::{Deserialize, Serialize};

use crate::layout::faces::FacePair;
use crate::layout::style::LayoutConfig;
use crate::layout::units::{
    LineMm, PointMm, RectMm, CROP_MARK_ARM_MM, FACE_HEIGHT_MM, GUIDE_STROKE_MM,
    NATIVE_CONTENT_HEIGHT_MM, NATIVE_CONTENT_WIDTH_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
    TRIM_HEIGHT_MM, TRIM_INSET_X_MM, TRIM_WIDTH_MM,
};

/// Uniform scale applied to the face-pair for the configured orientation.
pub fn fit_scale(config: &LayoutConfig) -> f64 {
    if config.global.rotate_for_print {
        1.0
    } else {
        PAGE_WIDTH_MM / NATIVE_CONTENT_WIDTH_MM
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content placement
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrientation {
    Upright,
    /// Turned 90° clockwise on the page.
    Rotated,
}

/// Transform from face-pair (content) coordinates to page coordinates:
/// scale and rotate about the block centre, then centre on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPlacement {
    pub orientation: ContentOrientation,
    pub rotation_deg: f64,
    pub fit_scale: f64,
    pub native_width_mm: f64,
    pub native_height_mm: f64,
    /// Page-space point the block centre is pinned to.
    pub anchor: PointMm,
    /// Page-space footprint of the whole block.
    pub bounds: RectMm,
}

impl ContentPlacement {
    fn for_config(config: &LayoutConfig) -> Self {
        let orientation = if config.global.rotate_for_print {
            ContentOrientation::Rotated
        } else {
            ContentOrientation::Upright
        };
        let mut placement = Self {
            orientation,
            rotation_deg: match orientation {
                ContentOrientation::Upright => 0.0,
                ContentOrientation::Rotated => 90.0,
            },
            fit_scale: fit_scale(config),
            native_width_mm: NATIVE_CONTENT_WIDTH_MM,
            native_height_mm: NATIVE_CONTENT_HEIGHT_MM,
            anchor: PointMm::new(PAGE_WIDTH_MM / 2.0, PAGE_HEIGHT_MM / 2.0),
            bounds: RectMm::default(),
        };
        let native = RectMm::new(0.0, 0.0, NATIVE_CONTENT_WIDTH_MM, NATIVE_CONTENT_HEIGHT_MM);
        placement.bounds = placement.map_rect(&native);
        placement
    }

    /// Maps a content-space point onto the page.
    pub fn to_page(&self, p: PointMm) -> PointMm {
        let dx = (p.x - self.native_width_mm / 2.0) * self.fit_scale;
        let dy = (p.y - self.native_height_mm / 2.0) * self.fit_scale;
        let (rx, ry) = match self.orientation {
            ContentOrientation::Upright => (dx, dy),
            // y grows downwards, so (x, y) -> (-y, x) reads clockwise.
            ContentOrientation::Rotated => (-dy, dx),
        };
        PointMm::new(self.anchor.x + rx, self.anchor.y + ry)
    }

    /// Page-space rectangle covered by a content-space rectangle. Exact, since
    /// only quarter turns are used.
    pub fn map_rect(&self, r: &RectMm) -> RectMm {
        let corners = r.corners().map(|c| self.to_page(c));
        RectMm::bounding(&corners)
    }

    pub fn map_line(&self, line: &LineMm) -> LineMm {
        LineMm {
            from: self.to_page(line.from),
            to: self.to_page(line.to),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Guides
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Unit direction pointing away from the card centre, in page axes.
    pub fn outward(&self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }

    fn of(&self, r: &RectMm) -> PointMm {
        match self {
            Corner::TopLeft => PointMm::new(r.x, r.y),
            Corner::TopRight => PointMm::new(r.right(), r.y),
            Corner::BottomLeft => PointMm::new(r.x, r.bottom()),
            Corner::BottomRight => PointMm::new(r.right(), r.bottom()),
        }
    }
}

/// Corner bracket: vertex on the (calibrated) trim corner, two arms running
/// back along the trim edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropMark {
    pub corner: Corner,
    pub at: PointMm,
    pub arms: [LineMm; 2],
    pub stroke_mm: f64,
}

impl CropMark {
    fn new(corner: Corner, trim: &RectMm, offset_x: f64, offset_y: f64) -> Self {
        let (ox, oy) = corner.outward();
        let logical = corner.of(trim);
        let at = PointMm::new(logical.x + ox * offset_x, logical.y + oy * offset_y);
        let horizontal = LineMm {
            from: at,
            to: PointMm::new(at.x - ox * CROP_MARK_ARM_MM, at.y),
        };
        let vertical = LineMm {
            from: at,
            to: PointMm::new(at.x, at.y - oy * CROP_MARK_ARM_MM),
        };
        Self {
            corner,
            at,
            arms: [horizontal, vertical],
            stroke_mm: GUIDE_STROKE_MM,
        }
    }
}

/// Fold line between the faces. Horizontal in content space; on a rotated
/// page it therefore runs vertically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldGuide {
    pub content_y_mm: f64,
    pub line: LineMm,
    pub stroke_mm: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCanvas {
    pub width_mm: f64,
    pub height_mm: f64,
    pub fit_scale: f64,
    pub placement: ContentPlacement,
    /// Trim rectangle (the card's logical corners) in page space, before calibration.
    pub trim: RectMm,
    pub faces: FacePair,
    pub crop_marks: Vec<CropMark>,
    pub fold_line: Option<FoldGuide>,
}

impl PageCanvas {
    pub fn crop_mark(&self, corner: Corner) -> Option<&CropMark> {
        self.crop_marks.iter().find(|m| m.corner == corner)
    }

    pub fn page_rect(&self) -> RectMm {
        RectMm::new(0.0, 0.0, self.width_mm, self.height_mm)
    }
}

fn content_trim() -> RectMm {
    RectMm::new(TRIM_INSET_X_MM, 0.0, TRIM_WIDTH_MM, TRIM_HEIGHT_MM)
}

pub fn compose_page(faces: FacePair, config: &LayoutConfig) -> PageCanvas {
    let placement = ContentPlacement::for_config(config);
    let trim_content = content_trim();
    let trim = placement.map_rect(&trim_content);

    let crop_marks = if config.global.show_crop_marks {
        let offset = config.global.crop_offset_mm;
        Corner::ALL
            .iter()
            .map(|c| CropMark::new(*c, &trim, offset.x, offset.y))
            .collect()
    } else {
        Vec::new()
    };

    let fold_line = config.global.show_fold_line.then(|| {
        let fold = LineMm {
            from: PointMm::new(trim_content.x, FACE_HEIGHT_MM),
            to: PointMm::new(trim_content.right(), FACE_HEIGHT_MM),
        };
        FoldGuide {
            content_y_mm: FACE_HEIGHT_MM,
            line: placement.map_line(&fold),
            stroke_mm: GUIDE_STROKE_MM,
        }
    });

    PageCanvas {
        width_mm: PAGE_WIDTH_MM,
        height_mm: PAGE_HEIGHT_MM,
        fit_scale: placement.fit_scale,
        placement,
        trim,
        faces,
        crop_marks,
        fold_line,
    }
}
