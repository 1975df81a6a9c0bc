//! Record stream → pages.
//!
//! Each page is a pure function of (record, config, font readiness); nothing is
//! shared between pages, so records are rendered in parallel and collected back
//! in caller order. The batch is CPU-bound and runs under `spawn_blocking`.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::layout::faces::compose_faces;
use crate::layout::fonts::FontReadiness;
use crate::layout::page::{compose_page, PageCanvas};
use crate::layout::preview::{for_screen, ScreenBlock};
use crate::layout::style::LayoutConfig;
use crate::models::record::CardRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTarget {
    /// Physical pages, passed through untouched.
    #[default]
    Print,
    /// Physical pages wrapped with the preview zoom.
    Screen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub record_id: String,
    pub canvas: PageCanvas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPage {
    pub record_id: String,
    pub block: ScreenBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageOutput {
    Print(RenderedPage),
    Screen(ScreenPage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutcome {
    pub target: RenderTarget,
    /// True when at least one field used fallback metrics; render again once
    /// the pending fonts have loaded.
    pub provisional: bool,
    pub pages: Vec<PageOutput>,
}

pub fn render_page(record: &CardRecord, config: &LayoutConfig, fonts: &FontReadiness) -> RenderedPage {
    let faces = compose_faces(record, config, fonts);
    if faces.front.overflows_frame() {
        warn!(
            "Record {}: text stack is {:.1} mm, taller than its {:.0} mm face",
            record.id,
            faces.front.stack_height_mm(),
            faces.front.frame.height
        );
    }
    RenderedPage {
        record_id: record.id.clone(),
        canvas: compose_page(faces, config),
    }
}

/// Renders every record; output order matches `records`.
pub fn render_batch(
    records: &[CardRecord],
    config: &LayoutConfig,
    fonts: &FontReadiness,
) -> Vec<RenderedPage> {
    records
        .par_iter()
        .map(|r| render_page(r, config, fonts))
        .collect()
}

pub fn render_for_target(
    records: &[CardRecord],
    config: &LayoutConfig,
    fonts: &FontReadiness,
    target: RenderTarget,
) -> RenderOutcome {
    let pages = render_batch(records, config, fonts);
    let provisional = pages.iter().any(|p| p.canvas.faces.is_provisional());
    let pages = match target {
        RenderTarget::Print => pages.into_iter().map(PageOutput::Print).collect(),
        RenderTarget::Screen => pages
            .into_iter()
            .map(|p| {
                PageOutput::Screen(ScreenPage {
                    record_id: p.record_id,
                    block: for_screen(p.canvas, config.global.preview_scale),
                })
            })
            .collect(),
    };
    RenderOutcome {
        target,
        provisional,
        pages,
    }
}

/// Async entry point: runs the batch off the async executor.
pub async fn render_records(
    records: Vec<CardRecord>,
    config: LayoutConfig,
    fonts: FontReadiness,
    target: RenderTarget,
) -> Result<RenderOutcome, AppError> {
    let count = records.len();
    let outcome = tokio::task::spawn_blocking(move || {
        render_for_target(&records, &config, &fonts, target)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))?;
    debug!(
        "Rendered {count} page(s) for {:?} (provisional: {})",
        target, outcome.provisional
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{CardField, Roster};

    fn roster() -> Roster {
        let names = ["张三", "欧阳修", "李四", "Alice"];
        Roster::new(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| CardRecord {
                    id: format!("r{i}"),
                    chinese_name: n.to_string(),
                    english_company: "Sample Org".to_string(),
                    ..CardRecord::blank()
                })
                .collect(),
        )
    }

    #[test]
    fn batch_preserves_caller_order() {
        let r = roster();
        let pages = render_batch(r.records(), &LayoutConfig::default(), &FontReadiness::AllReady);
        let ids: Vec<_> = pages.iter().map(|p| p.record_id.as_str()).collect();
        assert_eq!(ids, ["r0", "r1", "r2", "r3"]);
    }

    #[test]
    fn reordering_changes_sequence_not_geometry() {
        let cfg = LayoutConfig::default();
        let mut r = roster();
        let before = render_batch(r.records(), &cfg, &FontReadiness::AllReady);
        assert!(r.move_record(3, 0));
        let after = render_batch(r.records(), &cfg, &FontReadiness::AllReady);

        let ids: Vec<_> = after.iter().map(|p| p.record_id.as_str()).collect();
        assert_eq!(ids, ["r3", "r0", "r1", "r2"]);
        for page in &after {
            let same = before.iter().find(|p| p.record_id == page.record_id).unwrap();
            assert_eq!(same, page);
        }
    }

    #[test]
    fn sample_record_end_to_end() {
        let record = CardRecord {
            id: "sample".to_string(),
            chinese_name: "张三".to_string(),
            english_name: "San Zhang".to_string(),
            chinese_company: "示例单位".to_string(),
            english_company: "Sample Org".to_string(),
        };
        let page = render_page(&record, &LayoutConfig::default(), &FontReadiness::AllReady);
        let fields = &page.canvas.faces.front.fields;
        let cn = fields.iter().find(|f| f.field == CardField::ChineseName).unwrap();
        let en = fields.iter().find(|f| f.field == CardField::EnglishName).unwrap();
        assert!((cn.tracking_em - 1.2).abs() < 1e-12);
        assert_eq!(en.tracking_em, 0.05);
        assert_eq!((page.canvas.width_mm, page.canvas.height_mm), (297.0, 420.0));
    }

    #[test]
    fn screen_target_wraps_pages_print_target_does_not() {
        let r = roster();
        let cfg = LayoutConfig::default().with_preview_scale(0.75);
        let print = render_for_target(r.records(), &cfg, &FontReadiness::AllReady, RenderTarget::Print);
        let screen = render_for_target(r.records(), &cfg, &FontReadiness::AllReady, RenderTarget::Screen);

        assert!(print.pages.iter().all(|p| matches!(p, PageOutput::Print(_))));
        for (p, s) in print.pages.iter().zip(&screen.pages) {
            let (PageOutput::Print(p), PageOutput::Screen(s)) = (p, s) else {
                panic!("unexpected page kinds");
            };
            assert_eq!(p.canvas, s.block.page);
            assert_eq!(s.block.trailing_margin_mm, -105.0);
        }
    }

    #[tokio::test]
    async fn async_render_reports_provisional_fonts() {
        let mut cfg = LayoutConfig::default();
        cfg.styles.english_name.font_family = "EventSans".to_string();
        let pending = FontReadiness::loaded(["EventSans".to_string()], Vec::new());

        let outcome = render_records(roster().into_records(), cfg.clone(), pending, RenderTarget::Print)
            .await
            .unwrap();
        assert!(outcome.provisional);
        assert_eq!(outcome.pages.len(), 4);

        let settled = render_records(roster().into_records(), cfg, FontReadiness::AllReady, RenderTarget::Print)
            .await
            .unwrap();
        assert!(!settled.provisional);
    }
}
