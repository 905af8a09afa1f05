//! The `Environment` and its event loop.

use std::collections::HashMap;

use ms_core::{ChannelId, ProcessId, SimTime};
use tracing::{debug, info, trace};

use crate::channel::Channel;
use crate::observer::Record;
use crate::{
    EventHandle, EventQueue, Process, ProcessState, SimError, SimObserver, SimResult, Step,
    WaitKind, Wake,
};

// ── Queue payload ─────────────────────────────────────────────────────────────

/// Resume reasons that can sit in the event queue.  Messages never do: they
/// are handed over by `Deliver` events straight from the channel log.
#[derive(Copy, Clone, Debug)]
enum Resume {
    Start,
    Timeout,
    ChildDone(ProcessId),
    Interrupted,
}

impl<M> From<Resume> for Wake<M> {
    fn from(r: Resume) -> Self {
        match r {
            Resume::Start => Wake::Start,
            Resume::Timeout => Wake::Timeout,
            Resume::ChildDone(child) => Wake::ChildDone(child),
            Resume::Interrupted => Wake::Interrupted,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum Event {
    Resume { pid: ProcessId, why: Resume },
    Deliver { channel: ChannelId, index: usize },
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Per-process bookkeeping.  A process owns at most one pending event.
struct Entry {
    name:    String,
    state:   ProcessState,
    pending: Option<EventHandle>,
}

/// Everything except the process bodies.  A running process borrows the
/// kernel mutably through its [`Context`] while its own body is checked out.
struct Kernel<M> {
    now:      SimTime,
    queue:    EventQueue<Event>,
    table:    Vec<Entry>,
    channels: Vec<Channel<M>>,
    /// child → processes suspended on `AwaitChild(child)`, in wait order.
    joiners:  HashMap<ProcessId, Vec<ProcessId>>,
    /// Bodies spawned during the current step, in `ProcessId` order.
    nursery:  Vec<Box<dyn Process<M>>>,
    journal:  Vec<Record<M>>,
}

impl<M: Clone + 'static> Kernel<M> {
    fn entry(&self, pid: ProcessId) -> SimResult<&Entry> {
        self.table.get(pid.index()).ok_or(SimError::UnknownProcess(pid))
    }

    fn entry_mut(&mut self, pid: ProcessId) -> SimResult<&mut Entry> {
        self.table.get_mut(pid.index()).ok_or(SimError::UnknownProcess(pid))
    }

    fn channel_mut(&mut self, channel: ChannelId) -> SimResult<&mut Channel<M>> {
        self.channels
            .get_mut(channel.index())
            .ok_or(SimError::UnknownChannel(channel))
    }

    fn spawn(&mut self, body: Box<dyn Process<M>>) -> SimResult<ProcessId> {
        let pid = ProcessId::try_from(self.table.len()).map_err(|_| SimError::TableFull("process"))?;
        let handle = self.queue.schedule_at(self.now, Event::Resume { pid, why: Resume::Start });
        debug!(%pid, name = body.name(), now = %self.now, "spawn");
        self.table.push(Entry {
            name:    body.name().to_owned(),
            state:   ProcessState::Ready,
            pending: Some(handle),
        });
        self.nursery.push(body);
        Ok(pid)
    }

    fn put(&mut self, channel: ChannelId, msg: M) -> SimResult<SimTime> {
        let now = self.now;
        let (index, ready_at) = self.channel_mut(channel)?.push(now, msg.clone());
        self.queue.schedule_at(ready_at, Event::Deliver { channel, index });
        trace!(%channel, index, %ready_at, "put");
        self.journal.push(Record::Put { at: now, channel, msg, ready_at });
        Ok(ready_at)
    }

    fn interrupt(&mut self, pid: ProcessId) -> SimResult<()> {
        let now = self.now;
        let entry = self.entry_mut(pid)?;
        let waiting_on = match entry.state {
            ProcessState::Suspended(WaitKind::Timeout(_)) => None,
            ProcessState::Suspended(WaitKind::AwaitChild(child)) => Some(child),
            state => return Err(SimError::InvalidInterrupt { pid, state }),
        };
        let stale = entry.pending.take();
        entry.state = ProcessState::Ready;

        if let Some(handle) = stale {
            self.queue.cancel(handle);
        }
        if let Some(child) = waiting_on {
            if let Some(waiters) = self.joiners.get_mut(&child) {
                waiters.retain(|&w| w != pid);
            }
        }
        let handle = self.queue.schedule_at(now, Event::Resume { pid, why: Resume::Interrupted });
        self.entry_mut(pid)?.pending = Some(handle);
        debug!(%pid, %now, "interrupt");
        Ok(())
    }

    /// Park `pid` according to `step`.  Returns the wake to feed straight
    /// back into the process when the wait is already satisfied.
    fn suspend(&mut self, pid: ProcessId, step: Step) -> SimResult<Option<Wake<M>>> {
        let now = self.now;
        match step {
            Step::Done => {
                self.terminate(pid)?;
                Ok(None)
            }
            Step::Wait(WaitKind::Timeout(delay)) => {
                let handle = self.queue.schedule(now, delay, Event::Resume { pid, why: Resume::Timeout })?;
                let entry = self.entry_mut(pid)?;
                entry.state = ProcessState::Suspended(WaitKind::Timeout(delay));
                entry.pending = Some(handle);
                Ok(None)
            }
            Step::Wait(WaitKind::AwaitChild(child)) => {
                if self.entry(child)?.state == ProcessState::Terminated {
                    return Ok(Some(Wake::ChildDone(child)));
                }
                self.joiners.entry(child).or_default().push(pid);
                self.entry_mut(pid)?.state = ProcessState::Suspended(WaitKind::AwaitChild(child));
                Ok(None)
            }
            Step::Wait(WaitKind::AwaitMessage(channel)) => {
                let ch = self.channel_mut(channel)?;
                if let Some(msg) = ch.take_next(pid) {
                    return Ok(Some(Wake::Message { channel, msg }));
                }
                ch.park(pid);
                self.entry_mut(pid)?.state = ProcessState::Suspended(WaitKind::AwaitMessage(channel));
                Ok(None)
            }
        }
    }

    fn terminate(&mut self, pid: ProcessId) -> SimResult<()> {
        let now = self.now;
        self.entry_mut(pid)?.state = ProcessState::Terminated;
        self.journal.push(Record::Terminate { at: now, pid });
        debug!(%pid, %now, "terminated");

        for parent in self.joiners.remove(&pid).unwrap_or_default() {
            let handle = self.queue.schedule_at(now, Event::Resume { pid: parent, why: Resume::ChildDone(pid) });
            self.entry_mut(parent)?.pending = Some(handle);
        }
        Ok(())
    }
}

// ── Environment ───────────────────────────────────────────────────────────────

/// Owns the clock, the event queue, every process and every channel.
///
/// `M` is the message type carried by all channels of this environment.
/// The environment is single-threaded by construction: nothing in it is
/// `Send`, and processes run strictly one after another in `(due, seq)`
/// order.
pub struct Environment<M> {
    kernel: Kernel<M>,
    /// Indexed by `ProcessId`; `None` while that process is running.
    bodies: Vec<Option<Box<dyn Process<M>>>>,
}

impl<M: Clone + 'static> Default for Environment<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + 'static> Environment<M> {
    pub fn new() -> Self {
        Self {
            kernel: Kernel {
                now:      SimTime::ZERO,
                queue:    EventQueue::new(),
                table:    Vec::new(),
                channels: Vec::new(),
                joiners:  HashMap::new(),
                nursery:  Vec::new(),
                journal:  Vec::new(),
            },
            bodies: Vec::new(),
        }
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Create a channel whose messages become readable `delay` units after `put`.
    pub fn channel(&mut self, delay: f64) -> SimResult<ChannelId> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }
        let id = ChannelId::try_from(self.kernel.channels.len()).map_err(|_| SimError::TableFull("channel"))?;
        self.kernel.channels.push(Channel::new(delay));
        Ok(id)
    }

    /// Register a process.  Its first resume (`Wake::Start`) happens at the
    /// current instant, after any events already queued for it.
    pub fn spawn<P: Process<M>>(&mut self, process: P) -> SimResult<ProcessId> {
        let pid = self.kernel.spawn(Box::new(process))?;
        self.adopt_nursery();
        Ok(pid)
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    pub fn state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.kernel.table.get(pid.index()).map(|e| e.state)
    }

    pub fn process_name(&self, pid: ProcessId) -> Option<&str> {
        self.kernel.table.get(pid.index()).map(|e| e.name.as_str())
    }

    pub fn process_count(&self) -> usize {
        self.kernel.table.len()
    }

    /// Number of pending events.
    pub fn pending_events(&self) -> usize {
        self.kernel.queue.len()
    }

    /// Due time of the next event, if any.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.kernel.queue.peek_time()
    }

    pub fn channel_delay(&self, channel: ChannelId) -> Option<f64> {
        self.kernel.channels.get(channel.index()).map(|c| c.delay())
    }

    /// Messages ever written to `channel`.
    pub fn channel_len(&self, channel: ChannelId) -> Option<usize> {
        self.kernel.channels.get(channel.index()).map(|c| c.len())
    }

    /// Messages of `channel` that have become readable.
    pub fn channel_delivered(&self, channel: ChannelId) -> Option<usize> {
        self.kernel.channels.get(channel.index()).map(|c| c.delivered())
    }

    /// Read position of subscriber `pid` on `channel`.
    pub fn cursor(&self, channel: ChannelId, pid: ProcessId) -> Option<usize> {
        self.kernel.channels.get(channel.index()).map(|c| c.cursor(pid))
    }

    // ── External stimuli ──────────────────────────────────────────────────

    /// Write a message from outside any process.
    pub fn put(&mut self, channel: ChannelId, msg: M) -> SimResult<SimTime> {
        self.kernel.put(channel, msg)
    }

    /// Interrupt a process from outside any process.
    pub fn interrupt(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.interrupt(pid)
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Fire the earliest pending event.  Returns `false` if the queue was empty.
    pub fn advance<O: SimObserver<M> + ?Sized>(&mut self, observer: &mut O) -> SimResult<bool> {
        let Some((handle, event)) = self.kernel.queue.pop_next() else {
            return Ok(false);
        };
        self.kernel.now = handle.due();
        trace!(now = %self.kernel.now, seq = handle.seq(), ?event, "fire");

        let result = match event {
            Event::Resume { pid, why } => {
                self.kernel.entry_mut(pid)?.pending = None;
                self.drive(pid, why.into())
            }
            Event::Deliver { channel, index } => self.deliver(channel, index),
        };

        for record in self.kernel.journal.drain(..) {
            record.replay(&mut *observer);
        }
        result.map(|()| true)
    }

    /// Fire every event due at or before `limit`, then move the clock to `limit`.
    pub fn run_until<O: SimObserver<M> + ?Sized>(
        &mut self,
        limit:    SimTime,
        observer: &mut O,
    ) -> SimResult<()> {
        info!(from = %self.kernel.now, until = %limit, processes = self.kernel.table.len(), "run start");
        let mut fired = 0u64;
        while let Some(due) = self.kernel.queue.peek_time() {
            if due > limit {
                break;
            }
            self.advance(&mut *observer)?;
            fired += 1;
        }
        if limit > self.kernel.now {
            self.kernel.now = limit;
        }
        observer.on_sim_end(self.kernel.now);
        info!(now = %self.kernel.now, fired, pending = self.kernel.queue.len(), "run end");
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn deliver(&mut self, channel: ChannelId, index: usize) -> SimResult<()> {
        let waiters = self.kernel.channel_mut(channel)?.deliver(index);
        trace!(%channel, index, waiters = waiters.len(), "deliver");
        for pid in waiters {
            if self.kernel.entry(pid)?.state != ProcessState::Suspended(WaitKind::AwaitMessage(channel)) {
                continue;
            }
            let Some(msg) = self.kernel.channel_mut(channel)?.take_next(pid) else {
                continue;
            };
            self.drive(pid, Wake::Message { channel, msg })?;
        }
        Ok(())
    }

    /// Resume `pid` with `wake` and keep resuming it for as long as its next
    /// wait is already satisfied.
    fn drive(&mut self, pid: ProcessId, mut wake: Wake<M>) -> SimResult<()> {
        let mut body = self
            .bodies
            .get_mut(pid.index())
            .and_then(Option::take)
            .ok_or(SimError::UnknownProcess(pid))?;

        let outcome = loop {
            let now = self.kernel.now;
            match self.kernel.entry_mut(pid) {
                Ok(entry) => entry.state = ProcessState::Running,
                Err(e) => break Err(e),
            }
            self.kernel.journal.push(Record::Resume { at: now, pid, wake: wake.kind() });

            let step = {
                let mut ctx = Context { kernel: &mut self.kernel, me: pid };
                body.resume(wake, &mut ctx)
            };
            let step = match step {
                Ok(step) => step,
                Err(SimError::Fault(source)) => {
                    break Err(SimError::Process { pid, name: body.name().to_owned(), source });
                }
                Err(e) => break Err(e),
            };
            match self.kernel.suspend(pid, step) {
                Ok(Some(next)) => wake = next,
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.bodies[pid.index()] = Some(body);
        self.adopt_nursery();
        outcome
    }

    fn adopt_nursery(&mut self) {
        self.bodies.extend(self.kernel.nursery.drain(..).map(Some));
        debug_assert_eq!(self.bodies.len(), self.kernel.table.len());
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// The kernel API available to a process while it runs.
pub struct Context<'a, M> {
    kernel: &'a mut Kernel<M>,
    me:     ProcessId,
}

impl<M: Clone + 'static> Context<'_, M> {
    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    /// Id of the running process.
    #[inline]
    pub fn me(&self) -> ProcessId {
        self.me
    }

    /// Write `msg` to `channel` without blocking.  Returns when it becomes readable.
    pub fn put(&mut self, channel: ChannelId, msg: M) -> SimResult<SimTime> {
        self.kernel.put(channel, msg)
    }

    /// Start a child process at the current instant.
    pub fn spawn<P: Process<M>>(&mut self, process: P) -> SimResult<ProcessId> {
        self.kernel.spawn(Box::new(process))
    }

    /// Cancel the timeout/child wait of `pid`; it resumes with
    /// `Wake::Interrupted` at the current instant.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidInterrupt`] unless `pid` is suspended on a timeout
    /// or a child.
    pub fn interrupt(&mut self, pid: ProcessId) -> SimResult<()> {
        self.kernel.interrupt(pid)
    }

    pub fn state(&self, pid: ProcessId) -> Option<ProcessState> {
        self.kernel.table.get(pid.index()).map(|e| e.state)
    }

    /// `true` if [`interrupt`][Self::interrupt] would succeed for `pid`.
    pub fn is_interruptible(&self, pid: ProcessId) -> bool {
        matches!(
            self.state(pid),
            Some(ProcessState::Suspended(WaitKind::Timeout(_) | WaitKind::AwaitChild(_)))
        )
    }
}
