//! `ms-sim`: deterministic discrete-event kernel for the mission_sim framework.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                         |
//! |---------------|------------------------------------------------------------------|
//! | [`queue`]     | `EventQueue<E>` (`BTreeMap<(due, seq), E>`), `EventHandle`        |
//! | [`process`]   | `Process` trait, `Wake`, `Step`, `WaitKind`, `ProcessState`      |
//! | `channel`     | Delayed broadcast log with per-subscriber cursors (private)      |
//! | [`env`]       | `Environment` (owns everything), `Context` (handed to a process) |
//! | [`observer`]  | `SimObserver` trait, `NoopObserver`                              |
//! | [`error`]     | `SimError`, `SimResult<T>`                                       |
//!
//! # Execution model
//!
//! ```text
//! loop while next_due <= limit:
//!   ① pop the earliest (due, seq) event      (ties fire in scheduling order)
//!   ② now = due
//!   ③ Resume  → drive the owning process until it suspends again
//!      Deliver → mark the message ready, drive every subscriber parked on it
//!   ④ replay the journal (puts, resumes, terminations) to the observer
//! ```
//!
//! A process is a state machine: [`Process::resume`] receives the reason it
//! woke up and returns the next thing to wait for.  There is no stack
//! capture; everything a process needs between steps lives in its own
//! fields.  Everything runs on one thread and nothing ever blocks a thread.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ms_sim::{Environment, NoopObserver, Step, Wake, WaitKind, from_fn};
//!
//! let mut env: Environment<&'static str> = Environment::new();
//! let cable = env.channel(2.0)?;
//! env.spawn(from_fn(move |wake: Wake<&'static str>, ctx| {
//!     if let Wake::Message { msg, .. } = wake {
//!         println!("{} got {msg}", ctx.now());
//!     }
//!     Ok(Step::Wait(WaitKind::AwaitMessage(cable)))
//! }))?;
//! env.put(cable, "hello")?;
//! env.run_until(100.0.into(), &mut NoopObserver)?;
//! ```

mod channel;
pub mod env;
pub mod error;
pub mod observer;
pub mod process;
pub mod queue;

#[cfg(test)]
mod tests;

pub use env::{Context, Environment};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use process::{FnProcess, Process, ProcessState, Step, WaitKind, Wake, WakeKind, from_fn};
pub use queue::{EventHandle, EventQueue};
