//! `ms-core`: foundational types for the `mission_sim` framework.
//!
//! This crate is a dependency of every other `ms-*` crate.  It has no `ms-*`
//! dependencies and a single required external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ProcessId`, `ChannelId`, `TargetId`                  |
//! | [`geo`]         | `NedPoint`, compass bearings, `wrap_angle`            |
//! | [`time`]        | `SimTime` (virtual time)                              |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{NedPoint, wrap_angle};
pub use ids::{ChannelId, ProcessId, TargetId};
pub use time::SimTime;
