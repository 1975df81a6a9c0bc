pub mod font;
pub mod preset;
pub mod record;
