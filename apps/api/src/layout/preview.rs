//! Screen preview zoom. Never used on the print path.
//!
//! A presentation scale does not reflow what follows it: a page drawn at 50%
//! still reserves its full 420 mm. Each block therefore carries a trailing
//! margin of `-420 * (1 - previewScale)` mm so stacked pages stay contiguous.

use serde::{Deserialize, Serialize};

use crate::layout::page::PageCanvas;
use crate::layout::style::{MAX_PREVIEW_SCALE, MIN_PREVIEW_SCALE};
use crate::layout::units::PAGE_HEIGHT_MM;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenBlock {
    /// Untouched physical page; the zoom is applied on top of it.
    pub page: PageCanvas,
    pub preview_scale: f64,
    /// Scale origin, as a fraction of the page box (0.5, 0 = top centre).
    pub origin: (f64, f64),
    pub trailing_margin_mm: f64,
    /// Height the block visually occupies after compensation.
    pub visible_height_mm: f64,
}

/// Trailing margin that cancels the space a scaled page still reserves.
/// Depends on `preview_scale` alone.
pub fn trailing_margin_mm(preview_scale: f64) -> f64 {
    let margin = -PAGE_HEIGHT_MM * (1.0 - preview_scale);
    // Keep exactly-zero as +0 so it serialises as `0`, not `-0`.
    if margin == 0.0 {
        0.0
    } else {
        margin
    }
}

pub fn for_screen(page: PageCanvas, preview_scale: f64) -> ScreenBlock {
    let scale = if preview_scale.is_finite() {
        preview_scale.clamp(MIN_PREVIEW_SCALE, MAX_PREVIEW_SCALE)
    } else {
        MIN_PREVIEW_SCALE
    };
    ScreenBlock {
        page,
        preview_scale: scale,
        origin: (0.5, 0.0),
        trailing_margin_mm: trailing_margin_mm(scale),
        visible_height_mm: PAGE_HEIGHT_MM * scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::faces::compose_faces;
    use crate::layout::fonts::FontReadiness;
    use crate::layout::page::compose_page;
    use crate::layout::style::LayoutConfig;
    use crate::models::record::CardRecord;

    fn canvas(rotate: bool) -> PageCanvas {
        let cfg = LayoutConfig::default().with_rotate_for_print(rotate);
        compose_page(
            compose_faces(&CardRecord::blank(), &cfg, &FontReadiness::AllReady),
            &cfg,
        )
    }

    #[test]
    fn margin_compensates_scaled_height() {
        assert_eq!(trailing_margin_mm(0.75), -105.0);
        assert_eq!(trailing_margin_mm(1.0), 0.0);
        assert!(trailing_margin_mm(1.0).is_sign_positive());
        assert!((trailing_margin_mm(0.3) + 294.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_leaves_the_physical_page_alone() {
        let page = canvas(false);
        let block = for_screen(page.clone(), 0.6);
        assert_eq!(block.page, page);
        assert_eq!((block.page.width_mm, block.page.height_mm), (297.0, 420.0));
        // Reserved height plus the negative margin is what stays visible.
        assert!((420.0 + block.trailing_margin_mm - block.visible_height_mm).abs() < 1e-9);
    }

    #[test]
    fn margin_does_not_depend_on_fit_scale() {
        let a = for_screen(canvas(false), 0.5);
        let b = for_screen(canvas(true), 0.5);
        assert_ne!(a.page.fit_scale, b.page.fit_scale);
        assert_eq!(a.trailing_margin_mm, b.trailing_margin_mm);
    }

    #[test]
    fn out_of_range_scale_is_clamped() {
        assert_eq!(for_screen(canvas(false), 2.0).preview_scale, 1.0);
        assert_eq!(for_screen(canvas(false), 0.0).preview_scale, 0.3);
        assert_eq!(for_screen(canvas(false), f64::NAN).preview_scale, 0.3);
    }
}
