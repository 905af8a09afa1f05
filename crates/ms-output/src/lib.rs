//! `ms-output`: mission output writers for the mission_sim framework.
//!
//! | Backend | Files created                                          |
//! |---------|--------------------------------------------------------|
//! | CSV     | `messages.csv`, `trajectory.csv`, `summary.csv`        |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`MissionLogObserver`], which implements `ms_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ms_output::{CsvWriter, MissionLogObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = MissionLogObserver::new(writer);
//! mission.run(&mut obs)?;
//! let summary = obs.finish(&mission)?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::MissionLogObserver;
pub use row::{MessageRow, SummaryRow, TrajectoryRow};
pub use writer::OutputWriter;
