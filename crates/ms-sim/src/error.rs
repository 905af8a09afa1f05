//! Error types for ms-sim.

use ms_core::{ChannelId, ProcessId};
use thiserror::Error;

use crate::ProcessState;

/// Boxed error raised by process logic built on top of the kernel.
pub type BoxedFault = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Only a process suspended on a timeout or on a child may be interrupted.
    #[error("cannot interrupt {pid}: process is {state}")]
    InvalidInterrupt {
        pid:   ProcessId,
        state: ProcessState,
    },

    #[error("{0} does not exist")]
    UnknownProcess(ProcessId),

    #[error("{0} does not exist")]
    UnknownChannel(ChannelId),

    #[error("invalid delay {0}: must be finite and non-negative")]
    InvalidDelay(f64),

    /// No id left for another process or channel.
    #[error("{0} table is full")]
    TableFull(&'static str),

    /// Raised by process code; the kernel attributes it to the running
    /// process before it leaves `advance`.
    #[error("process fault: {0}")]
    Fault(#[source] BoxedFault),

    #[error("process {pid} ({name}) failed: {source}")]
    Process {
        pid:    ProcessId,
        name:   String,
        #[source]
        source: BoxedFault,
    },
}

impl SimError {
    /// Wrap any error raised by process logic.
    pub fn fault<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SimError::Fault(Box::new(err))
    }
}

pub type SimResult<T> = Result<T, SimError>;
