//! Unit tests for ms-sim.

use std::cell::RefCell;
use std::rc::Rc;

use ms_core::{ChannelId, ProcessId, SimTime};

use crate::{
    Context, Environment, NoopObserver, ProcessState, SimError, SimObserver, Step, WaitKind,
    Wake, WakeKind, from_fn,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

type Msg = &'static str;
type Log<T> = Rc<RefCell<Vec<T>>>;

fn log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

fn t(v: f64) -> SimTime {
    SimTime(v)
}

/// A subscriber that records `(time, msg)` for every message on `channel`.
fn listener(env: &mut Environment<Msg>, channel: ChannelId, seen: &Log<(f64, Msg)>) -> ProcessId {
    let seen = Rc::clone(seen);
    env.spawn(from_fn(move |wake: Wake<Msg>, ctx| {
        if let Wake::Message { msg, .. } = wake {
            seen.borrow_mut().push((ctx.now().as_f64(), msg));
        }
        Ok(Step::await_message(channel))
    })).unwrap()
}

/// Observer that flattens every callback into a printable line.
#[derive(Default)]
struct Trace(Vec<String>);

impl SimObserver<Msg> for Trace {
    fn on_put(&mut self, at: SimTime, channel: ChannelId, msg: &Msg, ready_at: SimTime) {
        self.0.push(format!("{at} put {channel} {msg} {ready_at}"));
    }
    fn on_resume(&mut self, at: SimTime, pid: ProcessId, wake: WakeKind) {
        self.0.push(format!("{at} resume {pid} {wake}"));
    }
    fn on_terminate(&mut self, at: SimTime, pid: ProcessId) {
        self.0.push(format!("{at} done {pid}"));
    }
    fn on_sim_end(&mut self, final_time: SimTime) {
        self.0.push(format!("{final_time} end"));
    }
}

// ── EventQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queue_tests {
    use super::*;
    use crate::EventQueue;

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::new();
        q.schedule(t(0.0), 5.0, "late").unwrap();
        q.schedule(t(0.0), 1.0, "early").unwrap();
        assert_eq!(q.peek_time(), Some(t(1.0)));
        assert_eq!(q.pop_next().unwrap().1, "early");
        assert_eq!(q.pop_next().unwrap().1, "late");
        assert!(q.pop_next().is_none());
    }

    #[test]
    fn equal_times_are_fifo() {
        let mut q = EventQueue::new();
        for i in 0..10 {
            q.schedule(t(3.0), 0.0, i).unwrap();
        }
        let order: Vec<i32> = std::iter::from_fn(|| q.pop_next().map(|(_, v)| v)).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn cancel_removes_exactly_one() {
        let mut q = EventQueue::new();
        let a = q.schedule(t(0.0), 2.0, 'a').unwrap();
        let b = q.schedule(t(0.0), 2.0, 'b').unwrap();
        assert_eq!(q.cancel(a), Some('a'));
        assert_eq!(q.cancel(a), None);
        assert!(q.contains(b));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_next().unwrap().1, 'b');
    }

    #[test]
    fn rejects_bad_delays() {
        let mut q: EventQueue<()> = EventQueue::new();
        assert!(matches!(q.schedule(t(0.0), -1.0, ()), Err(SimError::InvalidDelay(_))));
        assert!(matches!(q.schedule(t(0.0), f64::NAN, ()), Err(SimError::InvalidDelay(_))));
        assert!(matches!(q.schedule(t(0.0), f64::INFINITY, ()), Err(SimError::InvalidDelay(_))));
        assert!(q.is_empty());
    }
}

// ── Timeouts and run_until ────────────────────────────────────────────────────

#[cfg(test)]
mod timeout_tests {
    use super::*;

    fn hello(env: &mut Environment<Msg>, name: Msg, after: f64, out: &Log<(f64, Msg)>) {
        let out = Rc::clone(out);
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => Ok(Step::timeout(after)),
            _ => {
                out.borrow_mut().push((ctx.now().as_f64(), name));
                Ok(Step::Done)
            }
        })).unwrap();
    }

    #[test]
    fn processes_wake_exactly_on_time() {
        let mut env = Environment::new();
        let out = log();
        hello(&mut env, "hello1", 10.0, &out);
        hello(&mut env, "hello2", 20.0, &out);
        env.run_until(t(30.0), &mut NoopObserver).unwrap();
        assert_eq!(*out.borrow(), vec![(10.0, "hello1"), (20.0, "hello2")]);
        assert_eq!(env.now(), t(30.0));
        assert_eq!(env.state(ProcessId(0)), Some(ProcessState::Terminated));
    }

    #[test]
    fn run_until_leaves_later_events_pending() {
        let mut env = Environment::new();
        let out = log();
        hello(&mut env, "soon", 5.0, &out);
        hello(&mut env, "later", 50.0, &out);
        env.run_until(t(10.0), &mut NoopObserver).unwrap();
        assert_eq!(out.borrow().len(), 1);
        assert_eq!(env.pending_events(), 1);
        assert_eq!(env.next_event_time(), Some(t(50.0)));

        env.run_until(t(50.0), &mut NoopObserver).unwrap();
        assert_eq!(out.borrow().len(), 2, "event due exactly at the limit fires");
    }

    #[test]
    fn same_instant_wakes_follow_spawn_order() {
        let mut env = Environment::new();
        let out = log();
        for name in ["a", "b", "c", "d"] {
            hello(&mut env, name, 7.0, &out);
        }
        env.run_until(t(7.0), &mut NoopObserver).unwrap();
        let names: Vec<Msg> = out.borrow().iter().map(|&(_, n)| n).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn advance_on_empty_queue_is_false() {
        let mut env: Environment<Msg> = Environment::new();
        assert!(!env.advance(&mut NoopObserver).unwrap());
    }

    #[test]
    fn invalid_timeout_aborts_the_run() {
        let mut env: Environment<Msg> = Environment::new();
        env.spawn(from_fn(|_wake: Wake<Msg>, _ctx| Ok(Step::timeout(-3.0)))).unwrap();
        let err = env.run_until(t(10.0), &mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::InvalidDelay(d) if d == -3.0));
    }
}

// ── Channels ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod channel_tests {
    use super::*;

    #[test]
    fn message_visible_after_delay() {
        // Channel delay 2, put at t=5 → get resolves at t=7.
        let mut env = Environment::new();
        let cable = env.channel(2.0).unwrap();
        let seen = log();
        listener(&mut env, cable, &seen);
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => Ok(Step::timeout(5.0)),
            _ => {
                ctx.put(cable, "A")?;
                Ok(Step::Done)
            }
        })).unwrap();
        env.run_until(t(6.9), &mut NoopObserver).unwrap();
        assert!(seen.borrow().is_empty());
        env.run_until(t(20.0), &mut NoopObserver).unwrap();
        assert_eq!(*seen.borrow(), vec![(7.0, "A")]);
    }

    #[test]
    fn every_subscriber_sees_the_full_stream_in_order() {
        let mut env = Environment::new();
        let cable = env.channel(2.0).unwrap();
        let first = log();
        let second = log();
        listener(&mut env, cable, &first);
        listener(&mut env, cable, &second);

        // A sender putting one message every 5 units, as in the latency demo.
        let words: [Msg; 4] = ["m1", "m2", "m3", "m4"];
        let mut sent = 0;
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| {
            if matches!(wake, Wake::Timeout) {
                ctx.put(cable, words[sent])?;
                sent += 1;
            }
            if sent == words.len() { Ok(Step::Done) } else { Ok(Step::timeout(5.0)) }
        })).unwrap();

        env.run_until(t(100.0), &mut NoopObserver).unwrap();
        let expected = vec![(7.0, "m1"), (12.0, "m2"), (17.0, "m3"), (22.0, "m4")];
        assert_eq!(*first.borrow(), expected);
        assert_eq!(*second.borrow(), expected);
        assert_eq!(env.channel_len(cable), Some(4));
        assert_eq!(env.channel_delivered(cable), Some(4));
    }

    #[test]
    fn burst_of_puts_keeps_order() {
        let mut env = Environment::new();
        let cable = env.channel(0.5).unwrap();
        let seen = log();
        let pid = listener(&mut env, cable, &seen);
        for m in ["x", "y", "z"] {
            env.put(cable, m).unwrap();
        }
        env.run_until(t(1.0), &mut NoopObserver).unwrap();
        assert_eq!(*seen.borrow(), vec![(0.5, "x"), (0.5, "y"), (0.5, "z")]);
        assert_eq!(env.cursor(cable, pid), Some(3));
    }

    #[test]
    fn late_subscriber_replays_the_backlog_immediately() {
        let mut env = Environment::new();
        let cable = env.channel(1.0).unwrap();
        env.put(cable, "old").unwrap();
        env.run_until(t(10.0), &mut NoopObserver).unwrap();

        let seen = log();
        listener(&mut env, cable, &seen);
        env.run_until(t(10.0), &mut NoopObserver).unwrap();
        assert_eq!(*seen.borrow(), vec![(10.0, "old")]);
    }

    #[test]
    fn zero_delay_channel_delivers_in_the_same_instant() {
        let mut env = Environment::new();
        let cable = env.channel(0.0).unwrap();
        let seen = log();
        listener(&mut env, cable, &seen);
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => Ok(Step::timeout(3.0)),
            _ => {
                ctx.put(cable, "now")?;
                Ok(Step::Done)
            }
        })).unwrap();
        env.run_until(t(3.0), &mut NoopObserver).unwrap();
        assert_eq!(*seen.borrow(), vec![(3.0, "now")]);
    }

    #[test]
    fn bad_channel_delay_and_unknown_channel() {
        let mut env: Environment<Msg> = Environment::new();
        assert!(matches!(env.channel(-1.0), Err(SimError::InvalidDelay(_))));
        assert!(matches!(env.put(ChannelId(9), "lost"), Err(SimError::UnknownChannel(ChannelId(9)))));
    }
}

// ── Children ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod child_tests {
    use super::*;

    #[test]
    fn parent_resumes_when_child_finishes() {
        let mut env = Environment::new();
        let out: Log<(f64, String)> = log();
        let o = Rc::clone(&out);
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => {
                let child = ctx.spawn(from_fn(|wake: Wake<Msg>, _ctx| match wake {
                    Wake::Start => Ok(Step::timeout(4.0)),
                    _ => Ok(Step::Done),
                }))?;
                Ok(Step::await_child(child))
            }
            Wake::ChildDone(child) => {
                o.borrow_mut().push((ctx.now().as_f64(), child.to_string()));
                Ok(Step::Done)
            }
            other => panic!("unexpected wake {other:?}"),
        })).unwrap();
        env.run_until(t(10.0), &mut NoopObserver).unwrap();
        assert_eq!(*out.borrow(), vec![(4.0, "ProcessId(1)".to_owned())]);
    }

    #[test]
    fn awaiting_a_finished_child_returns_immediately() {
        let mut env = Environment::new();
        let child = env.spawn(from_fn(|_wake: Wake<Msg>, _ctx| Ok(Step::Done))).unwrap();
        let out = log();
        let o = Rc::clone(&out);
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => Ok(Step::timeout(2.0)),
            Wake::Timeout => Ok(Step::await_child(child)),
            Wake::ChildDone(_) => {
                o.borrow_mut().push(ctx.now().as_f64());
                Ok(Step::Done)
            }
            other => panic!("unexpected wake {other:?}"),
        })).unwrap();
        env.run_until(t(10.0), &mut NoopObserver).unwrap();
        assert_eq!(*out.borrow(), vec![2.0]);
    }

    #[test]
    fn awaiting_an_unknown_process_fails() {
        let mut env: Environment<Msg> = Environment::new();
        env.spawn(from_fn(|_wake: Wake<Msg>, _ctx| Ok(Step::await_child(ProcessId(42))))).unwrap();
        let err = env.run_until(t(1.0), &mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::UnknownProcess(ProcessId(42))));
    }
}

// ── Interrupts ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod interrupt_tests {
    use super::*;

    /// Car that charges for 5 units, driving 2 units in between; a driver
    /// interrupts the charge at t=3.
    #[test]
    fn interrupted_timeout_resumes_at_the_interrupt_instant() {
        let mut env = Environment::new();
        let out: Log<(f64, WakeKind)> = log();
        let o = Rc::clone(&out);
        let car = env.spawn(from_fn(move |wake: Wake<Msg>, ctx| {
            o.borrow_mut().push((ctx.now().as_f64(), wake.kind()));
            match wake {
                Wake::Start => Ok(Step::timeout(5.0)),
                Wake::Interrupted => Ok(Step::timeout(2.0)),
                _ => Ok(Step::Done),
            }
        })).unwrap();
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| match wake {
            Wake::Start => Ok(Step::timeout(3.0)),
            _ => {
                ctx.interrupt(car)?;
                Ok(Step::Done)
            }
        })).unwrap();
        env.run_until(t(15.0), &mut NoopObserver).unwrap();
        assert_eq!(
            *out.borrow(),
            vec![
                (0.0, WakeKind::Start),
                (3.0, WakeKind::Interrupted),
                (5.0, WakeKind::Timeout), // the new 2-unit drive, not the cancelled charge
            ]
        );
        assert_eq!(env.state(car), Some(ProcessState::Terminated));
        assert_eq!(env.pending_events(), 0);
    }

    #[test]
    fn interrupting_a_child_wait_detaches_the_parent() {
        let mut env = Environment::new();
        let out: Log<(f64, WakeKind)> = log();
        let o = Rc::clone(&out);
        let parent = env.spawn(from_fn(move |wake: Wake<Msg>, ctx| {
            o.borrow_mut().push((ctx.now().as_f64(), wake.kind()));
            match wake {
                Wake::Start => {
                    let child = ctx.spawn(from_fn(|wake: Wake<Msg>, _ctx| match wake {
                        Wake::Start => Ok(Step::timeout(10.0)),
                        _ => Ok(Step::Done),
                    }))?;
                    Ok(Step::await_child(child))
                }
                Wake::Interrupted => Ok(Step::timeout(20.0)),
                _ => Ok(Step::Done),
            }
        })).unwrap();
        env.run_until(t(1.0), &mut NoopObserver).unwrap();
        assert_eq!(
            env.state(parent),
            Some(ProcessState::Suspended(WaitKind::AwaitChild(ProcessId(1))))
        );
        env.interrupt(parent).unwrap();
        env.run_until(t(15.0), &mut NoopObserver).unwrap();

        // The child still finishes at t=10, but the parent no longer cares.
        assert_eq!(env.state(ProcessId(1)), Some(ProcessState::Terminated));
        assert_eq!(*out.borrow(), vec![(0.0, WakeKind::Start), (1.0, WakeKind::Interrupted)]);
        env.run_until(t(30.0), &mut NoopObserver).unwrap();
        assert_eq!(out.borrow().last(), Some(&(21.0, WakeKind::Timeout)));
    }

    #[test]
    fn interrupting_a_terminated_process_is_an_error() {
        let mut env: Environment<Msg> = Environment::new();
        let pid = env.spawn(from_fn(|_wake: Wake<Msg>, _ctx| Ok(Step::Done))).unwrap();
        env.run_until(t(1.0), &mut NoopObserver).unwrap();
        let err = env.interrupt(pid).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidInterrupt { state: ProcessState::Terminated, .. }
        ));
    }

    #[test]
    fn interrupting_a_ready_or_listening_process_is_an_error() {
        let mut env = Environment::new();
        let cable = env.channel(1.0).unwrap();
        let seen = log();
        let pid = listener(&mut env, cable, &seen);
        assert!(matches!(
            env.interrupt(pid),
            Err(SimError::InvalidInterrupt { state: ProcessState::Ready, .. })
        ));
        env.run_until(t(1.0), &mut NoopObserver).unwrap();
        assert!(matches!(
            env.interrupt(pid),
            Err(SimError::InvalidInterrupt { state: ProcessState::Suspended(WaitKind::AwaitMessage(_)), .. })
        ));
    }

    #[test]
    fn interrupting_a_running_process_aborts_the_run() {
        let mut env: Environment<Msg> = Environment::new();
        let pid = env.spawn(from_fn(|wake: Wake<Msg>, ctx: &mut Context<'_, Msg>| match wake {
            Wake::Start => Ok(Step::timeout(3.0)),
            _ => {
                let me = ctx.me();
                assert!(!ctx.is_interruptible(me));
                ctx.interrupt(me)?;
                Ok(Step::Done)
            }
        })).unwrap();
        let err = env.run_until(t(5.0), &mut NoopObserver).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidInterrupt { pid: p, state: ProcessState::Running } if p == pid
        ));
        assert_eq!(env.now(), t(3.0));
    }

    #[test]
    fn double_interrupt_in_one_instant_is_rejected_and_aborts() {
        let mut env: Environment<Msg> = Environment::new();
        let sleeper = env.spawn(from_fn(|wake: Wake<Msg>, _ctx| match wake {
            Wake::Start => Ok(Step::timeout(100.0)),
            _ => Ok(Step::Done),
        })).unwrap();
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx: &mut Context<'_, Msg>| match wake {
            Wake::Start => Ok(Step::timeout(1.0)),
            _ => {
                assert!(ctx.is_interruptible(sleeper));
                ctx.interrupt(sleeper)?;
                assert!(!ctx.is_interruptible(sleeper));
                ctx.interrupt(sleeper)?;
                Ok(Step::Done)
            }
        })).unwrap();
        let err = env.run_until(t(5.0), &mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::InvalidInterrupt { pid, .. } if pid == sleeper));
    }
}

// ── Faults, observers, determinism ────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("sensor offline")]
    struct SensorOffline;

    #[test]
    fn environment_reports_processes_and_channels() {
        let mut env: Environment<Msg> = Environment::new();
        let slow = env.channel(2.5).unwrap();
        let fast = env.channel(0.0).unwrap();
        let pid = env.spawn(from_fn(|_wake: Wake<Msg>, _ctx| Ok(Step::Done)).named("sonar")).unwrap();
        listener(&mut env, slow, &log());

        assert_eq!(env.process_count(), 2);
        assert_eq!(env.process_name(pid), Some("sonar"));
        assert_eq!(env.process_name(ProcessId(1)), Some("fn"));
        assert_eq!(env.process_name(ProcessId(9)), None);
        assert_eq!(env.channel_delay(slow), Some(2.5));
        assert_eq!(env.channel_delay(fast), Some(0.0));
        assert_eq!(env.channel_delay(ChannelId(7)), None);
        assert!(matches!(env.channel(-1.0), Err(SimError::InvalidDelay(_))));
    }

    #[test]
    fn process_faults_are_attributed() {
        let mut env: Environment<Msg> = Environment::new();
        let pid = env.spawn(
            from_fn(|_wake: Wake<Msg>, _ctx| Err(SimError::fault(SensorOffline))).named("sonar"),
        ).unwrap();
        let err = env.run_until(t(1.0), &mut NoopObserver).unwrap_err();
        match err {
            SimError::Process { pid: p, name, source } => {
                assert_eq!(p, pid);
                assert_eq!(name, "sonar");
                assert_eq!(source.to_string(), "sensor offline");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn scenario(trace: &mut Trace) {
        let mut env = Environment::new();
        let cable = env.channel(2.0).unwrap();
        let seen = log();
        listener(&mut env, cable, &seen);
        let mut n = 0;
        env.spawn(from_fn(move |wake: Wake<Msg>, ctx| {
            if matches!(wake, Wake::Timeout) {
                n += 1;
                ctx.put(cable, if n % 2 == 0 { "even" } else { "odd" })?;
            }
            Ok(Step::timeout(5.0))
        })).unwrap();
        env.run_until(t(60.0), trace).unwrap();
    }

    #[test]
    fn observer_sees_puts_resumes_and_end() {
        let mut trace = Trace::default();
        scenario(&mut trace);
        assert_eq!(trace.0.first().map(String::as_str), Some("t=0 resume ProcessId(0) start"));
        assert!(trace.0.contains(&"t=5 put ChannelId(0) odd t=7".to_owned()));
        assert!(trace.0.contains(&"t=7 resume ProcessId(0) message".to_owned()));
        assert_eq!(trace.0.last().map(String::as_str), Some("t=60 end"));
    }

    #[test]
    fn identical_runs_produce_identical_traces() {
        let mut a = Trace::default();
        let mut b = Trace::default();
        scenario(&mut a);
        scenario(&mut b);
        assert!(!a.0.is_empty());
        assert_eq!(a.0, b.0);
    }
}
