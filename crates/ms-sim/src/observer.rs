//! Simulation observer trait for tracing runs and collecting output.

use ms_core::{ChannelId, ProcessId, SimTime};

use crate::WakeKind;

/// Callbacks invoked by [`Environment::advance`][crate::Environment::advance]
/// after each event has been fully processed.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Callbacks arrive in the exact order the
/// underlying actions happened, each stamped with its own virtual time.
///
/// # Example: message printer
///
/// ```rust,ignore
/// struct Printer;
///
/// impl SimObserver<String> for Printer {
///     fn on_put(&mut self, at: SimTime, ch: ChannelId, msg: &String, ready_at: SimTime) {
///         println!("{at}: {ch} <- {msg} (readable {ready_at})");
///     }
/// }
/// ```
pub trait SimObserver<M> {
    /// A message was written to `channel`; it becomes readable at `ready_at`.
    fn on_put(&mut self, _at: SimTime, _channel: ChannelId, _msg: &M, _ready_at: SimTime) {}

    /// `pid` was resumed for reason `wake`.
    fn on_resume(&mut self, _at: SimTime, _pid: ProcessId, _wake: WakeKind) {}

    /// `pid` returned `Step::Done`.
    fn on_terminate(&mut self, _at: SimTime, _pid: ProcessId) {}

    /// Called once when [`run_until`][crate::Environment::run_until] finishes.
    fn on_sim_end(&mut self, _final_time: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl<M> SimObserver<M> for NoopObserver {}

/// Actions journaled by the kernel while an event is processed.
pub(crate) enum Record<M> {
    Put {
        at:       SimTime,
        channel:  ChannelId,
        msg:      M,
        ready_at: SimTime,
    },
    Resume {
        at:   SimTime,
        pid:  ProcessId,
        wake: WakeKind,
    },
    Terminate {
        at:  SimTime,
        pid: ProcessId,
    },
}

impl<M> Record<M> {
    pub(crate) fn replay<O: SimObserver<M> + ?Sized>(self, observer: &mut O) {
        match self {
            Record::Put { at, channel, msg, ready_at } => {
                observer.on_put(at, channel, &msg, ready_at)
            }
            Record::Resume { at, pid, wake } => observer.on_resume(at, pid, wake),
            Record::Terminate { at, pid } => observer.on_terminate(at, pid),
        }
    }
}
