//! `MissionLogObserver<W>` bridges `SimObserver` to an `OutputWriter`.

use ms_core::{ChannelId, ProcessId, SimTime};
use ms_mission::{Mission, MissionMsg};
use ms_sim::{SimObserver, WakeKind};
use tracing::debug;

use crate::row::{MessageRow, SummaryRow, TrajectoryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that logs every message put on a mission channel to an
/// [`OutputWriter`] and counts process resumes.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After the run, check for errors with
/// [`take_error`][Self::take_error] or let [`finish`][Self::finish] report
/// them.
pub struct MissionLogObserver<W: OutputWriter> {
    writer:     W,
    messages:   u64,
    resumes:    u64,
    final_time: SimTime,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> MissionLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            messages:   0,
            resumes:    0,
            final_time: SimTime::ZERO,
            last_error: None,
        }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn messages(&self) -> u64 {
        self.messages
    }

    pub fn resumes(&self) -> u64 {
        self.resumes
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Write the mission's trajectory samples and the run summary, then
    /// close the writer.  A write error stored during the run is returned
    /// first.
    pub fn finish(&mut self, mission: &Mission) -> OutputResult<SummaryRow> {
        if let Some(e) = self.last_error.take() {
            return Err(e);
        }

        let rows: Vec<TrajectoryRow> = mission.samples().iter().map(TrajectoryRow::from).collect();
        if !rows.is_empty() {
            self.writer.write_trajectory(&rows)?;
        }

        let summary = SummaryRow {
            final_time: self.final_time.as_f64(),
            messages:   self.messages,
            resumes:    self.resumes,
            classified: mission.classified_count() as u64,
        };
        self.writer.write_summary(&summary)?;
        self.writer.finish()?;
        debug!(?summary, samples = rows.len(), "mission output written");
        Ok(summary)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver<MissionMsg> for MissionLogObserver<W> {
    fn on_put(&mut self, at: SimTime, channel: ChannelId, msg: &MissionMsg, ready_at: SimTime) {
        self.messages += 1;
        let row = MessageRow {
            time:     at.as_f64(),
            channel:  channel.0,
            kind:     msg.kind(),
            ready_at: ready_at.as_f64(),
            detail:   msg.to_string(),
        };
        let result = self.writer.write_messages(std::slice::from_ref(&row));
        self.store_err(result);
    }

    fn on_resume(&mut self, _at: SimTime, _pid: ProcessId, _wake: WakeKind) {
        self.resumes += 1;
    }

    fn on_sim_end(&mut self, final_time: SimTime) {
        self.final_time = final_time;
    }
}
