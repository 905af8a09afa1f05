//! Fluent builder for constructing a [`Mission`].

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use ms_core::{ChannelId, ProcessId, SimTime};
use ms_sim::{Environment, SimObserver};
use tracing::{debug, info};

use crate::{
    FeedbackListener, HeldKarp, MissionConfig, MissionMsg, MissionPlanner, MissionResult,
    NavListener, NavUpdateListener, NearestNeighbour, Optimizer, PlanListener, PlannerState,
    PoseSample, PositionSampler, SampleLog, SharedPlanner, SharedVehicle, Target, TargetBook,
    Vehicle, VehicleExecutor,
};

/// The four channels wiring planner and vehicle together.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissionChannels {
    /// planner → vehicle
    pub plan_request:  ChannelId,
    /// vehicle → planner
    pub plan_feedback: ChannelId,
    /// planner → vehicle
    pub nav_request:   ChannelId,
    /// vehicle → planner
    pub nav_update:    ChannelId,
}

/// Ids of every process a mission spawns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissionProcesses {
    pub executor:            ProcessId,
    pub plan_listener:       ProcessId,
    pub nav_listener:        ProcessId,
    pub planner:             ProcessId,
    pub feedback_listener:   ProcessId,
    pub nav_update_listener: ProcessId,
    pub sampler:             Option<ProcessId>,
}

/// Fluent builder for [`Mission`].
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                                     |
/// |----------------------|-------------------------------------------------------------|
/// | `.targets(v)`        | No targets: the vehicle idles for the whole run             |
/// | `.optimizer(o)`      | `HeldKarp` if it can take the target set, else `NearestNeighbour` |
/// | `.vehicle_name(s)`   | `"auv1"`                                                    |
///
/// # Example
///
/// ```rust,ignore
/// let mut mission = MissionBuilder::new(MissionConfig::default())
///     .targets(survey_box(100.0))
///     .build()?;
/// mission.run(&mut NoopObserver)?;
/// ```
pub struct MissionBuilder {
    config:       MissionConfig,
    targets:      Vec<Target>,
    optimizer:    Option<Box<dyn Optimizer>>,
    vehicle_name: String,
}

impl MissionBuilder {
    pub fn new(config: MissionConfig) -> Self {
        Self {
            config,
            targets:      Vec::new(),
            optimizer:    None,
            vehicle_name: "auv1".to_owned(),
        }
    }

    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    pub fn optimizer<O: Optimizer>(mut self, optimizer: O) -> Self {
        self.optimizer = Some(Box::new(optimizer));
        self
    }

    pub fn vehicle_name(mut self, name: impl Into<String>) -> Self {
        self.vehicle_name = name.into();
        self
    }

    /// Validate inputs, create the channels, spawn every process, and return
    /// a ready-to-run [`Mission`].
    pub fn build(self) -> MissionResult<Mission> {
        let config = self.config;
        config.validate()?;
        let book = TargetBook::new(self.targets)?;

        let optimizer: Box<dyn Optimizer> = match self.optimizer {
            Some(o) => o,
            None => {
                let exact = HeldKarp::default();
                // One extra node for the vehicle.
                if book.len() < exact.max_nodes() {
                    Box::new(exact)
                } else {
                    Box::new(NearestNeighbour)
                }
            }
        };
        debug!(optimizer = optimizer.name(), targets = book.len(), "mission optimizer");

        // ── Cabling ───────────────────────────────────────────────────────
        let mut env = Environment::new();
        let channels = MissionChannels {
            plan_request:  env.channel(config.plan_delay)?,
            plan_feedback: env.channel(config.feedback_delay)?,
            nav_request:   env.channel(config.nav_request_delay)?,
            nav_update:    env.channel(config.nav_update_delay)?,
        };

        // ── Vehicle ───────────────────────────────────────────────────────
        let vehicle = Vehicle::new(self.vehicle_name, config.start_position, config.start_yaw).shared();
        let executor = env.spawn(VehicleExecutor::new(Rc::clone(&vehicle), channels.plan_feedback, &config))?;
        let plan_listener = env.spawn(PlanListener::new(Rc::clone(&vehicle), executor, channels.plan_request))?;
        let nav_listener = env.spawn(NavListener::new(
            Rc::clone(&vehicle),
            channels.nav_request,
            channels.nav_update,
        ))?;

        // ── Planner ───────────────────────────────────────────────────────
        let planner_state = PlannerState::new(book, config.start_position).shared();
        let planner = env.spawn(MissionPlanner::new(
            Rc::clone(&planner_state),
            optimizer,
            channels.plan_request,
            channels.nav_request,
            &config,
        ))?;
        let feedback_listener = env.spawn(FeedbackListener::new(Rc::clone(&planner_state), channels.plan_feedback))?;
        let nav_update_listener = env.spawn(NavUpdateListener::new(Rc::clone(&planner_state), channels.nav_update))?;

        // ── Sampling ──────────────────────────────────────────────────────
        let samples: SampleLog = Rc::new(RefCell::new(Vec::new()));
        let sampler = config
            .sample_period
            .map(|period| env.spawn(PositionSampler::new(Rc::clone(&vehicle), period, Rc::clone(&samples))))
            .transpose()?;

        info!(
            vehicle = %vehicle.borrow().name,
            targets = planner_state.borrow().book.len(),
            duration = config.duration,
            "mission built"
        );

        Ok(Mission {
            env,
            config,
            channels,
            processes: MissionProcesses {
                executor,
                plan_listener,
                nav_listener,
                planner,
                feedback_listener,
                nav_update_listener,
                sampler,
            },
            vehicle,
            planner: planner_state,
            samples,
        })
    }
}

// ── Mission ───────────────────────────────────────────────────────────────────

/// A wired mission ready to run.
pub struct Mission {
    env:       Environment<MissionMsg>,
    config:    MissionConfig,
    channels:  MissionChannels,
    processes: MissionProcesses,
    vehicle:   SharedVehicle,
    planner:   SharedPlanner,
    samples:   SampleLog,
}

impl Mission {
    /// Run for the configured `duration`.
    pub fn run<O: SimObserver<MissionMsg> + ?Sized>(&mut self, observer: &mut O) -> MissionResult<()> {
        self.run_until(SimTime(self.config.duration), observer)
    }

    /// Run up to and including `limit`.  May be called repeatedly.
    pub fn run_until<O: SimObserver<MissionMsg> + ?Sized>(
        &mut self,
        limit:    SimTime,
        observer: &mut O,
    ) -> MissionResult<()> {
        self.env.run_until(limit, observer)?;
        Ok(())
    }

    pub fn now(&self) -> SimTime {
        self.env.now()
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn channels(&self) -> MissionChannels {
        self.channels
    }

    pub fn processes(&self) -> MissionProcesses {
        self.processes
    }

    pub fn env(&self) -> &Environment<MissionMsg> {
        &self.env
    }

    /// Direct kernel access, e.g. to inject messages from a test.
    pub fn env_mut(&mut self) -> &mut Environment<MissionMsg> {
        &mut self.env
    }

    pub fn vehicle(&self) -> Ref<'_, Vehicle> {
        self.vehicle.borrow()
    }

    pub fn planner(&self) -> Ref<'_, PlannerState> {
        self.planner.borrow()
    }

    /// Poses recorded so far (empty unless `sample_period` is set).
    pub fn samples(&self) -> Vec<PoseSample> {
        self.samples.borrow().clone()
    }

    /// Targets the vehicle has inspected.
    pub fn classified_count(&self) -> usize {
        self.vehicle.borrow().classified.len()
    }
}
