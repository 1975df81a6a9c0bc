// Badge layout engine: typography, face composition, page compositing and
// on-screen preview scaling. Everything except `handlers` is pure and
// synchronous; batches run inside tokio::task::spawn_blocking.

pub mod faces;
pub mod fonts;
pub mod handlers;
pub mod page;
pub mod pipeline;
pub mod preview;
pub mod style;
pub mod typography;
pub mod units;

pub use fonts::FontReadiness;
pub use pipeline::{render_batch, render_page, render_records, RenderOutcome, RenderTarget};
pub use style::LayoutConfig;
