//! Badge typesetting and page-compositing service.
//!
//! `layout` is the pure engine: records and a `LayoutConfig` in, positioned
//! pages out. The remaining modules wrap it in an HTTP API with preset and
//! custom-font storage and CSV roster import/export.

pub mod config;
pub mod db;
pub mod errors;
pub mod fonts;
pub mod layout;
pub mod models;
pub mod presets;
pub mod roster;
pub mod routes;
pub mod state;
