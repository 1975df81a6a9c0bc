//! Font readiness snapshot.
//!
//! Custom fonts load asynchronously on the host. Layout never waits for them:
//! a field naming a custom font that has not loaded yet renders against a
//! fallback family and is marked `provisional`. When the load resolves, the
//! caller renders again with an updated snapshot. Output is a pure function of
//! (record, config, readiness), so both passes are reproducible.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const SANS_FALLBACK: &str = "sans-serif";
const SERIF_FALLBACK: &str = "serif";

/// Which custom fonts are usable for this render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FontReadiness {
    /// Every font is available. Used on the print path.
    #[default]
    AllReady,
    /// Only the listed custom fonts have finished loading.
    Loaded {
        custom: BTreeSet<String>,
        loaded: BTreeSet<String>,
    },
}

impl FontReadiness {
    pub fn loaded<C, L>(custom: C, loaded: L) -> Self
    where
        C: IntoIterator<Item = String>,
        L: IntoIterator<Item = String>,
    {
        Self::Loaded {
            custom: custom.into_iter().collect(),
            loaded: loaded.into_iter().collect(),
        }
    }

    /// System and built-in families are always ready; custom ones only once loaded.
    pub fn is_ready(&self, family: &str) -> bool {
        match self {
            Self::AllReady => true,
            Self::Loaded { custom, loaded } => !custom.contains(family) || loaded.contains(family),
        }
    }

    pub fn select(&self, family: &str) -> FontSelection {
        FontSelection {
            family: family.to_string(),
            fallback: fallback_for(family).to_string(),
            provisional: !self.is_ready(family),
        }
    }
}

/// Generic family used while `family` is unavailable.
fn fallback_for(family: &str) -> &'static str {
    let lower = family.to_ascii_lowercase();
    let serif_hint = (lower.contains("serif") && !lower.contains("sans"))
        || ["song", "ming", "kai", "garamond", "times"]
            .iter()
            .any(|h| lower.contains(h))
        || family.contains('宋')
        || family.contains('楷');
    if serif_hint {
        SERIF_FALLBACK
    } else {
        SANS_FALLBACK
    }
}

/// Font chosen for one rendered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSelection {
    /// Family the style asks for.
    pub family: String,
    /// Generic family the host falls back to.
    pub fallback: String,
    /// True when laid out against fallback metrics; a second pass is due.
    pub provisional: bool,
}
