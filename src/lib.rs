//! Parallel min/mean/max aggregation over `<key>;<value>` measurement files.
//!
//! The file is cut into one byte range per worker, each worker folds its lines
//! into a private open-addressing [`Table`], and the tables are merged and
//! sorted into a [`Summary`].

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod planner;
pub mod profile;
pub mod reduce;
pub mod report;
pub mod stats;
pub mod table;
pub mod worker;

pub use config::EngineConfig;
pub use engine::{aggregate_file, Run};
pub use error::{Error, Result};
pub use report::Summary;
pub use stats::Stats;
pub use table::Table;
