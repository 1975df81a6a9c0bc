pub mod handlers;
pub mod naming;
pub mod store;

pub use store::{
    FontBlobs, FontCatalog, FontLibrary, FontStore, FontStoreSettings, MemoryFontBlobs,
    MemoryFontCatalog, PgFontCatalog, S3FontBlobs,
};
