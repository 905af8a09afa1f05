//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `messages.csv`
//! - `trajectory.csv`
//! - `summary.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{MessageRow, OutputResult, SummaryRow, TrajectoryRow};

/// Writes mission output to three CSV files.
pub struct CsvWriter {
    messages:   Writer<File>,
    trajectory: Writer<File>,
    summary:    Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create the three CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut messages = Writer::from_path(dir.join("messages.csv"))?;
        messages.write_record(["time", "channel", "kind", "ready_at", "detail"])?;

        let mut trajectory = Writer::from_path(dir.join("trajectory.csv"))?;
        trajectory.write_record(["time", "north", "east", "down", "yaw", "state"])?;

        let mut summary = Writer::from_path(dir.join("summary.csv"))?;
        summary.write_record(["final_time", "messages", "resumes", "classified"])?;

        Ok(Self {
            messages,
            trajectory,
            summary,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_messages(&mut self, rows: &[MessageRow]) -> OutputResult<()> {
        for row in rows {
            self.messages.write_record(&[
                row.time.to_string(),
                row.channel.to_string(),
                row.kind.to_owned(),
                row.ready_at.to_string(),
                row.detail.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_trajectory(&mut self, rows: &[TrajectoryRow]) -> OutputResult<()> {
        for row in rows {
            self.trajectory.write_record(&[
                row.time.to_string(),
                format!("{:.3}", row.north),
                format!("{:.3}", row.east),
                format!("{:.3}", row.down),
                format!("{:.4}", row.yaw),
                row.state.clone(),
            ])?;
        }
        Ok(())
    }

    fn write_summary(&mut self, row: &SummaryRow) -> OutputResult<()> {
        self.summary.write_record(&[
            row.final_time.to_string(),
            row.messages.to_string(),
            row.resumes.to_string(),
            row.classified.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.messages.flush()?;
        self.trajectory.flush()?;
        self.summary.flush()?;
        Ok(())
    }
}
