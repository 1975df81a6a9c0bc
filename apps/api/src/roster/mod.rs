pub mod aliases;
pub mod csv_io;
pub mod handlers;

pub use csv_io::{export_csv, import_csv, RosterError};
