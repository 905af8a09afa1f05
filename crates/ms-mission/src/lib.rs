//! `ms-mission`: AUV inspection missions on top of the `ms-sim` kernel.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`msgs`]        | `MissionMsg` (plan request/feedback, nav request/update)        |
//! | [`target`]      | `Target`, `Classification`, planner-side `TargetBook`           |
//! | [`vehicle`]     | `Vehicle` record, `VehicleExecutor`, plan/nav listeners, `Motion` |
//! | [`planner`]     | `MissionPlanner`, feedback/nav-update listeners, `PlannerState` |
//! | [`optimizer`]   | `Optimizer` trait, `DistanceMatrix`, `HeldKarp`, `NearestNeighbour` |
//! | [`sampler`]     | `PositionSampler`, `PoseSample`                                 |
//! | [`config`]      | `MissionConfig` (JSON, validated)                               |
//! | [`scenario`]    | Target CSV loader, `survey_box`                                 |
//! | [`builder`]     | `MissionBuilder`, `Mission`                                     |
//! | [`error`]       | `MissionError`, `MissionResult<T>`                              |
//!
//! # Message flow
//!
//! ```text
//!   MissionPlanner ──plan_request──▶ PlanListener ─┐
//!        ▲   │                                     ├─ Vehicle ─ VehicleExecutor
//!        │   └──nav_request───▶ NavListener ───────┘        │
//!        │                          │                       │
//!   NavUpdateListener ◀─nav_update──┘                       │
//!   FeedbackListener  ◀─plan_feedback───────────────────────┘
//! ```
//!
//! Planner and vehicle never touch each other's state; everything crosses a
//! delayed channel.

pub mod builder;
pub mod config;
pub mod error;
pub mod msgs;
pub mod optimizer;
pub mod planner;
pub mod sampler;
pub mod scenario;
pub mod target;
pub mod vehicle;


pub use builder::{Mission, MissionBuilder, MissionChannels, MissionProcesses};
pub use config::MissionConfig;
pub use error::{MissionError, MissionResult};
pub use msgs::MissionMsg;
pub use optimizer::{DistanceMatrix, HeldKarp, NearestNeighbour, Optimizer, Solution};
pub use planner::{FeedbackListener, MissionPlanner, NavUpdateListener, PlannerState, SharedPlanner};
pub use sampler::{PoseSample, PositionSampler, SampleLog};
pub use scenario::{load_targets_csv, load_targets_reader, survey_box};
pub use target::{Classification, Target, TargetBook};
pub use vehicle::{
    Motion, MotionKind, NavListener, PlanListener, SharedVehicle, Vehicle, VehicleExecutor,
    VehicleState,
};
