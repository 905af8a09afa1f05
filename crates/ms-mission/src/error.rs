//! Error types for ms-mission.

use ms_core::{CoreError, TargetId};
use ms_sim::{SimError, WakeKind};
use thiserror::Error;

use crate::VehicleState;

#[derive(Debug, Error)]
pub enum MissionError {
    /// The vehicle executor was woken for a reason its current state cannot handle.
    #[error("vehicle executor cannot handle a {wake} wake in state {state}")]
    InvalidState {
        state: VehicleState,
        wake:  WakeKind,
    },

    /// A mission process other than the executor was woken unexpectedly.
    #[error("{process} cannot handle a {wake} wake")]
    UnexpectedWake {
        process: &'static str,
        wake:    WakeKind,
    },

    #[error("{0} is already classified")]
    AlreadyClassified(TargetId),

    #[error("{0} appears more than once in the target set")]
    DuplicateTarget(TargetId),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
}

pub type MissionResult<T> = Result<T, MissionError>;

/// Mission faults abort the kernel run; kernel errors pass through unchanged.
impl From<MissionError> for SimError {
    fn from(err: MissionError) -> Self {
        match err {
            MissionError::Sim(inner) => inner,
            other => SimError::fault(other),
        }
    }
}
