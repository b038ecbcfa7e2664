//! Station index and network catalog.
//!
//! The index is built once from the static network and answers
//! nearest-station and accessible-station queries for the planner.

mod catalog;
mod index;
mod spatial;

pub use catalog::{CatalogError, load_catalog, load_index, parse_catalog};
pub use index::{AccessibleStation, NearbyStation, StationIndex, access_score};
