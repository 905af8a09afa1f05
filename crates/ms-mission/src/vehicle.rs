//! The vehicle side of a mission.
//!
//! One vehicle runs as three kernel processes that share a [`Vehicle`]
//! record:
//!
//! | Process             | Waits on                  | Job                                         |
//! |---------------------|---------------------------|---------------------------------------------|
//! | [`VehicleExecutor`] | timeouts                  | idle → navigate → inspect state machine      |
//! | [`PlanListener`]    | the plan-request channel  | swap in new plans, interrupt a running motion |
//! | [`NavListener`]     | the nav-request channel   | answer with the extrapolated position        |
//!
//! The kernel runs one process at a time and never holds a borrow of the
//! record across a resume, so a plain `Rc<RefCell<_>>` suffices.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use ms_core::{ChannelId, NedPoint, ProcessId, SimTime, TargetId, wrap_angle};
use ms_sim::{Context, Process, SimResult, Step, Wake};
use tracing::{debug, info, trace, warn};

use crate::{MissionConfig, MissionError, MissionMsg, MissionResult, Target};

/// Vehicle record shared by the executor and its listeners.
pub type SharedVehicle = Rc<RefCell<Vehicle>>;

// ── VehicleState ──────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VehicleState {
    Idle,
    NavigateToTarget,
    InspectTarget,
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleState::Idle => f.write_str("idle"),
            VehicleState::NavigateToTarget => f.write_str("navigate"),
            VehicleState::InspectTarget => f.write_str("inspect"),
        }
    }
}

// ── Motion ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionKind {
    Rotate,
    Move,
}

/// A timed rotation or translation in progress.
///
/// Pose at any instant inside `[start_time, end_time]` is linearly
/// interpolated between the `from` and `to` poses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Motion {
    pub kind:       MotionKind,
    pub start_time: SimTime,
    pub end_time:   SimTime,
    pub from:       NedPoint,
    pub to:         NedPoint,
    pub from_yaw:   f64,
    pub to_yaw:     f64,
}

impl Motion {
    /// Fraction of the motion completed at `now`, in `[0.0, 1.0]`.
    ///
    /// Returns `1.0` for zero-length motions or when `now >= end_time`.
    pub fn progress(&self, now: SimTime) -> f64 {
        let total = self.end_time.since(self.start_time);
        if total <= 0.0 {
            return 1.0;
        }
        (now.since(self.start_time) / total).clamp(0.0, 1.0)
    }

    pub fn position_at(&self, now: SimTime) -> NedPoint {
        self.from.lerp(self.to, self.progress(now))
    }

    /// Heading at `now`, turning the short way round.
    pub fn yaw_at(&self, now: SimTime) -> f64 {
        let turn = wrap_angle(self.to_yaw - self.from_yaw);
        wrap_angle(self.from_yaw + turn * self.progress(now))
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub name:        String,
    pub state:       VehicleState,
    /// Pose at the start of the current motion, or the current pose when still.
    pub position:    NedPoint,
    pub yaw:         f64,
    /// Targets of the active plan.
    pub queue:       Vec<Target>,
    /// Indices into `queue` still to visit, in plan order.
    pub visit_order: Vec<usize>,
    /// Target being approached or inspected.  Survives plan replacement.
    pub current:     Option<Target>,
    pub motion:      Option<Motion>,
    /// Every target this vehicle has inspected, across plans.
    pub classified:  BTreeSet<TargetId>,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, position: NedPoint, yaw: f64) -> Self {
        Self {
            name:        name.into(),
            state:       VehicleState::Idle,
            position,
            yaw,
            queue:       Vec::new(),
            visit_order: Vec::new(),
            current:     None,
            motion:      None,
            classified:  BTreeSet::new(),
        }
    }

    pub fn shared(self) -> SharedVehicle {
        Rc::new(RefCell::new(self))
    }

    /// Position at `now`, extrapolated along the running motion if any.
    pub fn position_at(&self, now: SimTime) -> NedPoint {
        self.motion.map_or(self.position, |m| m.position_at(now))
    }

    pub fn yaw_at(&self, now: SimTime) -> f64 {
        self.motion.map_or(self.yaw, |m| m.yaw_at(now))
    }

    /// Stop the running motion at `now`, keeping the extrapolated pose.
    pub fn abort_motion(&mut self, now: SimTime) -> Option<Motion> {
        let motion = self.motion.take()?;
        self.position = motion.position_at(now);
        self.yaw = motion.yaw_at(now);
        Some(motion)
    }

    /// Install a new plan.
    ///
    /// Targets this vehicle already classified are re-marked `Mine` and left
    /// out of `visit_order`, as are out-of-range and repeated indices.  The
    /// target currently approached or inspected is kept.
    pub fn replace_plan(&mut self, mut targets: Vec<Target>, order: Vec<usize>) {
        for target in &mut targets {
            if self.classified.contains(&target.id) {
                target.classification = crate::Classification::Mine;
            }
        }
        let mut seen = BTreeSet::new();
        self.visit_order = order
            .into_iter()
            .filter(|&i| targets.get(i).is_some_and(|t| !t.is_classified()) && seen.insert(i))
            .collect();
        self.queue = targets;
    }

    /// Pop the next unclassified target of the plan.
    pub fn next_target(&mut self) -> Option<Target> {
        while !self.visit_order.is_empty() {
            let idx = self.visit_order.remove(0);
            match self.queue.get(idx) {
                Some(t) if !t.is_classified() && !self.classified.contains(&t.id) => {
                    return Some(t.clone());
                }
                _ => {}
            }
        }
        None
    }

    pub fn current_target(&self) -> Option<&Target> {
        self.current.as_ref()
    }

    /// Classify the current target and mirror the result into the plan.
    fn classify_current(&mut self) -> MissionResult<Option<Target>> {
        let Some(mut target) = self.current.take() else {
            return Ok(None);
        };
        if self.classified.contains(&target.id) {
            return Err(MissionError::AlreadyClassified(target.id));
        }
        target.classify()?;
        self.classified.insert(target.id);
        for queued in self.queue.iter_mut().filter(|t| t.id == target.id) {
            queued.classification = target.classification;
        }
        Ok(Some(target))
    }
}

// ── VehicleExecutor ───────────────────────────────────────────────────────────

/// The vehicle state machine.
///
/// ```text
///   Idle ──target──▶ NavigateToTarget ──arrived──▶ InspectTarget
///   ▲ ▲ ↺ poll          │ rotate, then move           │
///   │ └── interrupted ──┘                             │
///   └─────────────────── classified ──────────────────┘
/// ```
pub struct VehicleExecutor {
    vehicle:             SharedVehicle,
    feedback:            ChannelId,
    linear_vel:          f64,
    rot_vel:             f64,
    inspection_duration: f64,
    idle_poll:           f64,
}

impl VehicleExecutor {
    pub fn new(vehicle: SharedVehicle, feedback: ChannelId, config: &MissionConfig) -> Self {
        Self {
            vehicle,
            feedback,
            linear_vel:          config.linear_vel,
            rot_vel:             config.rot_vel,
            inspection_duration: config.inspection_duration,
            idle_poll:           config.idle_poll,
        }
    }

    fn step(&self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> MissionResult<Step> {
        let now = ctx.now();
        let mut v = self.vehicle.borrow_mut();
        let state = v.state;
        let invalid = MissionError::InvalidState { state, wake: wake.kind() };

        match (state, wake) {
            (VehicleState::Idle, Wake::Start | Wake::Timeout) => Ok(self.idle(&mut v, now)),

            (VehicleState::NavigateToTarget, Wake::Timeout) => {
                let motion = v.motion.take().ok_or(invalid)?;
                v.position = motion.to;
                v.yaw = motion.to_yaw;
                match motion.kind {
                    MotionKind::Rotate => self.start_move(&mut v, now),
                    MotionKind::Move => {
                        v.state = VehicleState::InspectTarget;
                        debug!(vehicle = %v.name, %now, position = %v.position, "arrived, inspecting");
                        Ok(Step::timeout(self.inspection_duration))
                    }
                }
            }

            (VehicleState::NavigateToTarget, Wake::Interrupted) => {
                // The plan listener normally snapshots the pose before interrupting.
                v.abort_motion(now);
                v.current = None;
                v.state = VehicleState::Idle;
                debug!(vehicle = %v.name, %now, position = %v.position, "motion interrupted by new plan");
                Ok(self.idle(&mut v, now))
            }

            (VehicleState::InspectTarget, Wake::Timeout) => {
                let target = v.classify_current()?.ok_or(invalid)?;
                let (target_id, classification) = (target.id, target.classification);
                v.state = VehicleState::Idle;
                info!(vehicle = %v.name, %now, target = %target_id, %classification, "inspection finished");
                ctx.put(self.feedback, MissionMsg::PlanFeedback { target_id, classification })?;
                Ok(self.idle(&mut v, now))
            }

            _ => Err(invalid),
        }
    }

    /// Pick the next target and start turning towards it, or poll again later.
    fn idle(&self, v: &mut Vehicle, now: SimTime) -> Step {
        let Some(target) = v.next_target() else {
            return Step::timeout(self.idle_poll);
        };
        let goal = target.position;
        debug!(vehicle = %v.name, %now, target = %target.id, "navigating");
        v.current = Some(target);
        v.state = VehicleState::NavigateToTarget;

        let turn = if v.position.distance(goal) > 0.0 {
            wrap_angle(v.position.bearing_to(goal) - v.yaw)
        } else {
            0.0
        };
        let duration = turn.abs() / self.rot_vel;
        trace!(vehicle = %v.name, %now, turn, duration, "rotating");
        v.motion = Some(Motion {
            kind:       MotionKind::Rotate,
            start_time: now,
            end_time:   now.after(duration),
            from:       v.position,
            to:         v.position,
            from_yaw:   v.yaw,
            to_yaw:     wrap_angle(v.yaw + turn),
        });
        Step::timeout(duration)
    }

    fn start_move(&self, v: &mut Vehicle, now: SimTime) -> MissionResult<Step> {
        let goal = v
            .current_target()
            .map(|t| t.position)
            .ok_or(MissionError::InvalidState {
                state: v.state,
                wake:  ms_sim::WakeKind::Timeout,
            })?;
        let duration = v.position.distance(goal) / self.linear_vel;
        trace!(vehicle = %v.name, %now, duration, "moving");
        v.motion = Some(Motion {
            kind:       MotionKind::Move,
            start_time: now,
            end_time:   now.after(duration),
            from:       v.position,
            to:         goal,
            from_yaw:   v.yaw,
            to_yaw:     v.yaw,
        });
        Ok(Step::timeout(duration))
    }
}

impl Process<MissionMsg> for VehicleExecutor {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        Ok(self.step(wake, ctx)?)
    }

    fn name(&self) -> &str {
        "executor"
    }
}

// ── Listeners ─────────────────────────────────────────────────────────────────

/// Consumes `PlanRequest`s for one vehicle.
pub struct PlanListener {
    vehicle:  SharedVehicle,
    executor: ProcessId,
    plans:    ChannelId,
}

impl PlanListener {
    pub fn new(vehicle: SharedVehicle, executor: ProcessId, plans: ChannelId) -> Self {
        Self { vehicle, executor, plans }
    }
}

impl Process<MissionMsg> for PlanListener {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        match wake {
            Wake::Start => {}
            Wake::Message { msg: MissionMsg::PlanRequest { targets, order }, .. } => {
                let now = ctx.now();
                let mut v = self.vehicle.borrow_mut();
                if v.abort_motion(now).is_some() {
                    ctx.interrupt(self.executor)?;
                }
                v.replace_plan(targets, order);
                info!(vehicle = %v.name, %now, pending = v.visit_order.len(), "new plan");
            }
            Wake::Message { msg, .. } => {
                warn!(kind = msg.kind(), "ignoring unexpected message on the plan channel");
            }
            other => {
                return Err(MissionError::UnexpectedWake { process: "plan listener", wake: other.kind() }.into());
            }
        }
        Ok(Step::await_message(self.plans))
    }

    fn name(&self) -> &str {
        "plan_listener"
    }
}

/// Answers `NavRequest`s with the vehicle's extrapolated position.
pub struct NavListener {
    vehicle:  SharedVehicle,
    requests: ChannelId,
    updates:  ChannelId,
}

impl NavListener {
    pub fn new(vehicle: SharedVehicle, requests: ChannelId, updates: ChannelId) -> Self {
        Self { vehicle, requests, updates }
    }
}

impl Process<MissionMsg> for NavListener {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        match wake {
            Wake::Start => {}
            Wake::Message { msg: MissionMsg::NavRequest, .. } => {
                let position = self.vehicle.borrow().position_at(ctx.now());
                ctx.put(self.updates, MissionMsg::NavUpdate { position })?;
            }
            Wake::Message { msg, .. } => {
                warn!(kind = msg.kind(), "ignoring unexpected message on the nav-request channel");
            }
            other => {
                return Err(MissionError::UnexpectedWake { process: "nav listener", wake: other.kind() }.into());
            }
        }
        Ok(Step::await_message(self.requests))
    }

    fn name(&self) -> &str {
        "nav_listener"
    }
}
