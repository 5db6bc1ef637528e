//! Card metadata loading
//!
//! Static card data from an external JSON export, used to fill in what game
//! events leave out

pub mod card;
pub mod database;

pub use card::{parse_type_line, CardMetadata, TypeLine};
pub use database::{normalize_name, CardDatabase};
