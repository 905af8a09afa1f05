//! The planner side of a mission.
//!
//! Like the vehicle, the planner is split into processes sharing one record
//! ([`PlannerState`]): the periodic [`MissionPlanner`] plus two listeners that
//! fold `PlanFeedback` and `NavUpdate` messages into the record as they are
//! delivered.

use std::cell::RefCell;
use std::rc::Rc;

use ms_core::{ChannelId, NedPoint, SimTime};
use ms_sim::{Context, Process, SimResult, Step, Wake};
use tracing::{debug, info, warn};

use crate::{
    DistanceMatrix, MissionConfig, MissionError, MissionMsg, MissionResult, Optimizer, Solution,
    TargetBook,
};

pub type SharedPlanner = Rc<RefCell<PlannerState>>;

/// What the planner knows about the world.
#[derive(Clone, Debug)]
pub struct PlannerState {
    pub book:            TargetBook,
    /// Last reported vehicle position.
    pub vehicle_pos:     NedPoint,
    /// Time the last `NavUpdate` was received.
    pub last_fix:        Option<SimTime>,
    pub plans_published: u32,
    pub plans_skipped:   u32,
}

impl PlannerState {
    pub fn new(book: TargetBook, vehicle_pos: NedPoint) -> Self {
        Self { book, vehicle_pos, last_fix: None, plans_published: 0, plans_skipped: 0 }
    }

    pub fn shared(self) -> SharedPlanner {
        Rc::new(RefCell::new(self))
    }
}

// ── MissionPlanner ────────────────────────────────────────────────────────────

#[derive(Copy, Clone)]
enum Phase {
    Sleeping,
    AwaitingFix { requested_at: SimTime },
}

/// Periodic re-planning.
///
/// Every `planner_period`, if any target is still unclassified: ask the
/// vehicle for a fix, wait `nav_wait`, order the remaining targets with the
/// optimizer starting from the vehicle, and publish the plan.
pub struct MissionPlanner {
    state:     SharedPlanner,
    optimizer: Box<dyn Optimizer>,
    plans:     ChannelId,
    nav_req:   ChannelId,
    period:    f64,
    nav_wait:  f64,
    phase:     Phase,
}

impl MissionPlanner {
    pub fn new(
        state:     SharedPlanner,
        optimizer: Box<dyn Optimizer>,
        plans:     ChannelId,
        nav_req:   ChannelId,
        config:    &MissionConfig,
    ) -> Self {
        Self {
            state,
            optimizer,
            plans,
            nav_req,
            period:   config.planner_period,
            nav_wait: config.nav_wait,
            phase:    Phase::Sleeping,
        }
    }

    fn step(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> MissionResult<Step> {
        let now = ctx.now();
        match (self.phase, wake) {
            (Phase::Sleeping, Wake::Start | Wake::Timeout) => {
                if !self.state.borrow().book.has_unclassified() {
                    debug!(%now, "no unclassified targets, nothing to plan");
                    return Ok(Step::timeout(self.period));
                }
                ctx.put(self.nav_req, MissionMsg::NavRequest)?;
                self.phase = Phase::AwaitingFix { requested_at: now };
                Ok(Step::timeout(self.nav_wait))
            }
            (Phase::AwaitingFix { requested_at }, Wake::Timeout) => {
                self.phase = Phase::Sleeping;
                self.plan(requested_at, ctx)?;
                Ok(Step::timeout(self.period))
            }
            (_, other) => Err(MissionError::UnexpectedWake { process: "planner", wake: other.kind() }),
        }
    }

    fn plan(&self, requested_at: SimTime, ctx: &mut Context<'_, MissionMsg>) -> MissionResult<()> {
        let now = ctx.now();
        let mut state = self.state.borrow_mut();
        if state.last_fix.is_none_or(|t| t < requested_at) {
            warn!(%now, position = %state.vehicle_pos, "no fresh navigation update, planning from last known position");
        }

        let targets = state.book.unclassified();
        if targets.is_empty() {
            debug!(%now, "targets classified while waiting for a fix, nothing to plan");
            return Ok(());
        }

        let points: Vec<NedPoint> = std::iter::once(state.vehicle_pos)
            .chain(targets.iter().map(|t| t.position))
            .collect();
        let matrix = DistanceMatrix::from_points(&points);

        match self.optimizer.solve(&matrix, Some(0), None) {
            Solution::Route { order, cost } => {
                // Node 0 is the vehicle itself.
                let order: Vec<usize> = order.into_iter().filter_map(|i| i.checked_sub(1)).collect();
                info!(%now, optimizer = self.optimizer.name(), targets = targets.len(), cost, "publishing plan");
                state.plans_published += 1;
                ctx.put(self.plans, MissionMsg::PlanRequest { targets, order })?;
            }
            Solution::Infeasible => {
                warn!(%now, optimizer = self.optimizer.name(), targets = targets.len(), "optimizer found no route, retrying next period");
                state.plans_skipped += 1;
            }
        }
        Ok(())
    }
}

impl Process<MissionMsg> for MissionPlanner {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        Ok(self.step(wake, ctx)?)
    }

    fn name(&self) -> &str {
        "planner"
    }
}

// ── Listeners ─────────────────────────────────────────────────────────────────

/// Applies `PlanFeedback` to the planner's target book.
pub struct FeedbackListener {
    state:    SharedPlanner,
    feedback: ChannelId,
}

impl FeedbackListener {
    pub fn new(state: SharedPlanner, feedback: ChannelId) -> Self {
        Self { state, feedback }
    }
}

impl Process<MissionMsg> for FeedbackListener {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        match wake {
            Wake::Start => {}
            Wake::Message { msg: MissionMsg::PlanFeedback { target_id, classification }, .. } => {
                if !self.state.borrow_mut().book.apply_feedback(target_id, classification) {
                    warn!(now = %ctx.now(), target = %target_id, "feedback for unknown target");
                }
            }
            Wake::Message { msg, .. } => {
                warn!(kind = msg.kind(), "ignoring unexpected message on the feedback channel");
            }
            other => {
                return Err(MissionError::UnexpectedWake { process: "feedback listener", wake: other.kind() }.into());
            }
        }
        Ok(Step::await_message(self.feedback))
    }

    fn name(&self) -> &str {
        "feedback_listener"
    }
}

/// Stores the vehicle position carried by `NavUpdate`s.
pub struct NavUpdateListener {
    state:   SharedPlanner,
    updates: ChannelId,
}

impl NavUpdateListener {
    pub fn new(state: SharedPlanner, updates: ChannelId) -> Self {
        Self { state, updates }
    }
}

impl Process<MissionMsg> for NavUpdateListener {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        match wake {
            Wake::Start => {}
            Wake::Message { msg: MissionMsg::NavUpdate { position }, .. } => {
                let mut state = self.state.borrow_mut();
                state.vehicle_pos = position;
                state.last_fix = Some(ctx.now());
                debug!(now = %ctx.now(), %position, "navigation update");
            }
            Wake::Message { msg, .. } => {
                warn!(kind = msg.kind(), "ignoring unexpected message on the nav-update channel");
            }
            other => {
                return Err(MissionError::UnexpectedWake { process: "nav-update listener", wake: other.kind() }.into());
            }
        }
        Ok(Step::await_message(self.updates))
    }

    fn name(&self) -> &str {
        "nav_update_listener"
    }
}
