//! Resumable processes.
//!
//! A process is an explicit state machine.  The kernel calls
//! [`Process::resume`] with the reason the process woke up ([`Wake`]); the
//! process runs synchronously and answers with the next suspension point
//! ([`Step`]).  Between two calls it is parked in one of the
//! [`ProcessState`]s below.

use std::fmt;

use ms_core::{ChannelId, ProcessId};

use crate::{Context, SimResult};

/// What a suspended process is waiting for.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WaitKind {
    /// Wake after the given virtual-time delay.
    Timeout(f64),
    /// Wake in the instant the child process terminates.
    AwaitChild(ProcessId),
    /// Wake when the next message for this subscriber is available.
    AwaitMessage(ChannelId),
}

/// Lifecycle state of a process as tracked by the kernel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ProcessState {
    /// Has a same-instant resume queued (freshly spawned or just interrupted).
    Ready,
    /// Currently executing its `resume` step.
    Running,
    Suspended(WaitKind),
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Ready => f.write_str("ready"),
            ProcessState::Running => f.write_str("running"),
            ProcessState::Suspended(WaitKind::Timeout(d)) => write!(f, "suspended on timeout({d})"),
            ProcessState::Suspended(WaitKind::AwaitChild(c)) => write!(f, "suspended on child {c}"),
            ProcessState::Suspended(WaitKind::AwaitMessage(c)) => write!(f, "suspended on {c}"),
            ProcessState::Terminated => f.write_str("terminated"),
        }
    }
}

/// Why a process is being resumed.
#[derive(Clone, Debug, PartialEq)]
pub enum Wake<M> {
    /// First resume after `spawn`.
    Start,
    /// A `WaitKind::Timeout` elapsed.
    Timeout,
    /// The awaited child terminated.
    ChildDone(ProcessId),
    /// The next message on `channel` for this subscriber.
    Message { channel: ChannelId, msg: M },
    /// Another process cancelled the current timeout/child wait.
    Interrupted,
}

impl<M> Wake<M> {
    pub fn kind(&self) -> WakeKind {
        match self {
            Wake::Start => WakeKind::Start,
            Wake::Timeout => WakeKind::Timeout,
            Wake::ChildDone(_) => WakeKind::ChildDone,
            Wake::Message { .. } => WakeKind::Message,
            Wake::Interrupted => WakeKind::Interrupted,
        }
    }
}

/// Payload-free discriminant of [`Wake`], reported to observers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WakeKind {
    Start,
    Timeout,
    ChildDone,
    Message,
    Interrupted,
}

impl fmt::Display for WakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WakeKind::Start => "start",
            WakeKind::Timeout => "timeout",
            WakeKind::ChildDone => "child_done",
            WakeKind::Message => "message",
            WakeKind::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// What a process does at the end of a resume step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    Wait(WaitKind),
    Done,
}

impl Step {
    #[inline]
    pub fn timeout(delay: f64) -> Step {
        Step::Wait(WaitKind::Timeout(delay))
    }

    #[inline]
    pub fn await_child(child: ProcessId) -> Step {
        Step::Wait(WaitKind::AwaitChild(child))
    }

    #[inline]
    pub fn await_message(channel: ChannelId) -> Step {
        Step::Wait(WaitKind::AwaitMessage(channel))
    }
}

/// A unit of simulation logic driven by the kernel.
///
/// Implementations keep their continuation point in their own fields (an
/// enum of states is the usual shape) and branch on it plus the incoming
/// [`Wake`].  Returning an error aborts the run; use [`SimError::fault`] to
/// wrap domain errors.
///
/// [`SimError::fault`]: crate::SimError::fault
pub trait Process<M>: 'static {
    fn resume(&mut self, wake: Wake<M>, ctx: &mut Context<'_, M>) -> SimResult<Step>;

    /// Label used in logs and error messages.
    fn name(&self) -> &str {
        "process"
    }
}

/// A [`Process`] backed by a closure.  Build one with [`from_fn`].
pub struct FnProcess<F> {
    name: String,
    f:    F,
}

impl<F> FnProcess<F> {
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Turn a closure into a process.  Handy for small helpers and tests.
pub fn from_fn<M, F>(f: F) -> FnProcess<F>
where
    F: FnMut(Wake<M>, &mut Context<'_, M>) -> SimResult<Step> + 'static,
{
    FnProcess { name: "fn".to_owned(), f }
}

impl<M, F> Process<M> for FnProcess<F>
where
    F: FnMut(Wake<M>, &mut Context<'_, M>) -> SimResult<Step> + 'static,
{
    fn resume(&mut self, wake: Wake<M>, ctx: &mut Context<'_, M>) -> SimResult<Step> {
        (self.f)(wake, ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
