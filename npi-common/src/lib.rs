//! # NPI Common Library
//!
//! Tracker core shared by the dashboard service:
//! - Raw CSV tables and row normalization
//! - Day-first date cell parsing
//! - Per-tracker records and status classification
//! - Status aggregation, view filtering and board assembly
//! - CSV projection of the current view
//! - Configuration loading

pub mod aggregate;
pub mod board;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod table;
pub mod tracker;

pub use aggregate::{aggregate, StatusCounts};
pub use board::{Board, Facet};
pub use error::{Error, Result};
pub use filter::{filter, FilterCriteria, StatusView};
pub use table::RawTable;
pub use tracker::{Classified, StatusGroup, StatusKind, TrackerKind, TrackerRecord};
