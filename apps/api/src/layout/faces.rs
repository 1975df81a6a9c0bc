//! Face composition: one record → a front/back pair of identical faces.
//!
//! The sheet is folded along the boundary between the two faces. For the
//! back to read upright from its own side once folded, it is the front turned
//! 180° about the centre of its own frame. The turn is a presentation transform
//! only; the fields inside are the same values as the front's.

use serde::{Deserialize, Serialize};

use crate::layout::fonts::{FontReadiness, FontSelection};
use crate::layout::style::LayoutConfig;
use crate::layout::typography::{resolve, vertical_offset_pt};
use crate::layout::units::{pt_to_mm, PointMm, RectMm, FACE_HEIGHT_MM, NATIVE_CONTENT_WIDTH_MM};
use crate::models::record::{CardField, CardRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSide {
    Front,
    Back,
}

impl FaceSide {
    pub fn rotation_deg(&self) -> f64 {
        match self {
            FaceSide::Front => 0.0,
            FaceSide::Back => 180.0,
        }
    }

    /// Frame of this face inside the face-pair block (content coordinates).
    pub fn frame(&self) -> RectMm {
        let y = match self {
            FaceSide::Front => 0.0,
            FaceSide::Back => FACE_HEIGHT_MM,
        };
        RectMm::new(0.0, y, NATIVE_CONTENT_WIDTH_MM, FACE_HEIGHT_MM)
    }
}

/// One field as the host should set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedField {
    pub field: CardField,
    pub text: String,
    pub font: FontSelection,
    pub size_pt: f64,
    pub tracking_em: f64,
    /// Negative trailing margin cancelling the gap tracking leaves after the last glyph.
    pub margin_compensation_em: f64,
    pub vertical_offset_pt: f64,
    /// Gap above this field; zero for the first field of the stack.
    pub gap_before_pt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFace {
    pub side: FaceSide,
    pub frame: RectMm,
    pub rotation_deg: f64,
    pub rotation_origin: PointMm,
    pub fields: Vec<RenderedField>,
}

impl RenderedFace {
    /// Nominal stack height: every field's size plus the gaps between them.
    pub fn stack_height_pt(&self) -> f64 {
        self.fields.iter().map(|f| f.size_pt + f.gap_before_pt).sum()
    }

    pub fn stack_height_mm(&self) -> f64 {
        pt_to_mm(self.stack_height_pt())
    }

    /// True when the nominal stack is taller than the face it sits on.
    pub fn overflows_frame(&self) -> bool {
        self.stack_height_mm() > self.frame.height
    }

    pub fn is_provisional(&self) -> bool {
        self.fields.iter().any(|f| f.font.provisional)
    }

    /// The same face as the front would present it.
    pub fn upright(&self) -> RenderedFace {
        RenderedFace {
            rotation_deg: 0.0,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacePair {
    pub front: RenderedFace,
    pub back: RenderedFace,
}

impl FacePair {
    pub fn is_provisional(&self) -> bool {
        self.front.is_provisional() || self.back.is_provisional()
    }
}

fn render_fields(
    record: &CardRecord,
    config: &LayoutConfig,
    fonts: &FontReadiness,
) -> Vec<RenderedField> {
    let widening = config.global.enable_two_char_widening;
    CardField::ALL
        .iter()
        .enumerate()
        .map(|(i, &field)| {
            let style = config.style(field);
            let text = record.field(field);
            let typo = resolve(text, style, widening);
            RenderedField {
                field,
                text: text.to_string(),
                font: fonts.select(&style.font_family),
                size_pt: style.size_pt,
                tracking_em: typo.tracking_em,
                margin_compensation_em: typo.margin_compensation_em,
                vertical_offset_pt: vertical_offset_pt(field, style),
                gap_before_pt: if i == 0 {
                    0.0
                } else {
                    config.global.global_spacing_pt
                },
            }
        })
        .collect()
}

fn face(side: FaceSide, fields: Vec<RenderedField>) -> RenderedFace {
    let frame = side.frame();
    RenderedFace {
        side,
        frame,
        rotation_deg: side.rotation_deg(),
        rotation_origin: frame.center(),
        fields,
    }
}

/// Renders both faces of `record`. Fields are resolved once and shared, so
/// the faces can only differ by their frame and rotation.
pub fn compose_faces(record: &CardRecord, config: &LayoutConfig, fonts: &FontReadiness) -> FacePair {
    let fields = render_fields(record, config, fonts);
    FacePair {
        front: face(FaceSide::Front, fields.clone()),
        back: face(FaceSide::Back, fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::style::FieldStyle;

    fn sample() -> CardRecord {
        CardRecord {
            id: "r1".to_string(),
            chinese_name: "张三".to_string(),
            english_name: "San Zhang".to_string(),
            chinese_company: "示例单位".to_string(),
            english_company: "Sample Org".to_string(),
        }
    }

    #[test]
    fn default_config_resolves_sample_tracking() {
        let pair = compose_faces(&sample(), &LayoutConfig::default(), &FontReadiness::AllReady);
        let f = &pair.front.fields;
        assert!((f[0].tracking_em - 1.2).abs() < 1e-12);
        assert_eq!(f[0].margin_compensation_em, f[0].tracking_em);
        assert_eq!(f[1].tracking_em, 0.05);
        assert_eq!(f[1].text, "San Zhang");
    }

    #[test]
    fn back_is_front_rotated_about_its_own_centre() {
        let pair = compose_faces(&sample(), &LayoutConfig::default(), &FontReadiness::AllReady);
        assert_eq!(pair.front.rotation_deg, 0.0);
        assert_eq!(pair.back.rotation_deg, 180.0);
        assert_eq!(pair.front.fields, pair.back.fields);
        assert_eq!(pair.back.rotation_origin, pair.back.frame.center());
        assert_eq!(pair.front.frame.bottom(), pair.back.frame.y);
        // Undoing the turn gives back the front's presentation in the back's frame.
        let upright = pair.back.upright();
        assert_eq!(upright.rotation_deg, pair.front.rotation_deg);
        assert_eq!(upright.fields, pair.front.fields);
    }

    #[test]
    fn oversized_type_overflows_the_face() {
        let default = compose_faces(&sample(), &LayoutConfig::default(), &FontReadiness::AllReady);
        // 158pt of type and gaps is about 55.7 mm on a 135 mm face.
        assert!((default.front.stack_height_mm() - 158.0 * 25.4 / 72.0).abs() < 1e-9);
        assert!(!default.front.overflows_frame());

        let mut huge = FieldStyle::default_for(CardField::ChineseName);
        huge.size_pt = 400.0;
        let cfg = LayoutConfig::default().with_style(CardField::ChineseName, huge);
        let pair = compose_faces(&sample(), &cfg, &FontReadiness::AllReady);
        assert!(pair.front.overflows_frame());
        assert!(pair.back.overflows_frame());
    }

    #[test]
    fn fields_stack_in_order_with_uniform_gap() {
        let mut cfg = LayoutConfig::default();
        cfg.global.global_spacing_pt = 9.0;
        let pair = compose_faces(&sample(), &cfg, &FontReadiness::AllReady);
        let order: Vec<_> = pair.front.fields.iter().map(|f| f.field).collect();
        assert_eq!(order, CardField::ALL);
        let gaps: Vec<_> = pair.front.fields.iter().map(|f| f.gap_before_pt).collect();
        assert_eq!(gaps, [0.0, 9.0, 9.0, 9.0]);
        assert_eq!(pair.front.stack_height_pt(), 72.0 + 28.0 + 24.0 + 16.0 + 27.0);
    }

    #[test]
    fn vertical_offsets_include_baseline_anchors() {
        let cfg = LayoutConfig::default().with_style(
            CardField::EnglishCompany,
            FieldStyle {
                offset_pt: 3.0,
                ..FieldStyle::default_for(CardField::EnglishCompany)
            },
        );
        let pair = compose_faces(&sample(), &cfg, &FontReadiness::AllReady);
        let offsets: Vec<_> = pair.front.fields.iter().map(|f| f.vertical_offset_pt).collect();
        assert_eq!(offsets, [25.0, 12.0, -5.0, -7.0]);
    }

    #[test]
    fn unloaded_custom_font_marks_pair_provisional() {
        let cfg = LayoutConfig::default().with_style(
            CardField::ChineseName,
            FieldStyle {
                font_family: "EventBrush".to_string(),
                ..FieldStyle::default_for(CardField::ChineseName)
            },
        );
        let pending = FontReadiness::loaded(["EventBrush".to_string()], Vec::new());
        let ready = FontReadiness::loaded(["EventBrush".to_string()], ["EventBrush".to_string()]);

        let first = compose_faces(&sample(), &cfg, &pending);
        let second = compose_faces(&sample(), &cfg, &ready);
        assert!(first.is_provisional());
        assert!(!second.is_provisional());
        // Same inputs, same output.
        assert_eq!(first, compose_faces(&sample(), &cfg, &pending));
    }
}
