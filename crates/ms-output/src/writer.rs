//! The `OutputWriter` trait implemented by backend writers.

use crate::{MessageRow, OutputResult, SummaryRow, TrajectoryRow};

/// Trait implemented by output backends.
///
/// Errors raised while the simulation is running are stored by the observer
/// and retrieved with [`MissionLogObserver::take_error`][crate::MissionLogObserver::take_error].
pub trait OutputWriter {
    /// Write a batch of message-log rows.
    fn write_messages(&mut self, rows: &[MessageRow]) -> OutputResult<()>;

    /// Write a batch of trajectory samples.
    fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()>;

    /// Write the run summary.
    fn write_summary(&mut self, row: &SummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
