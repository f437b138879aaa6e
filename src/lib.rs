#![doc = include_str!("../README.md")]
pub mod aggregate;
pub mod brl;
pub mod chart;
pub mod record;
pub mod report;
pub mod stats;
pub mod table;

pub use aggregate::{Dimension, Ranking, Totals};
pub use brl::Brl;
pub use record::Record;
pub use report::{Dataset, Report, Stage};
pub use table::SalesTable;
