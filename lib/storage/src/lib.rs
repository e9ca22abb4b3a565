//! CSV storage for manifests and destination class tables

mod columns;
pub mod classes;
pub mod manifest;

pub use classes::{read_city_list, read_city_list_from, CityEntry, ClassTable};
pub use columns::FEATURE_COLUMNS;
pub use manifest::{read_manifest, read_manifest_from, write_manifest, write_manifest_to, CLASS_COLUMN};
