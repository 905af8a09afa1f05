//! Mission run parameters.

use std::path::Path;

use ms_core::{CoreError, CoreResult, NedPoint};
use serde::{Deserialize, Serialize};

/// Every tunable of a mission run.
///
/// Missing JSON fields take their [`Default`] value, so a config file only
/// needs to name what it changes:
///
/// ```json
/// { "duration": 7200.0, "plan_delay": 2.0, "sample_period": 10.0 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissionConfig {
    /// Virtual time to simulate.  Default: 3600.
    pub duration: f64,

    // ── Channel propagation delays ────────────────────────────────────────
    pub plan_delay:        f64,
    pub feedback_delay:    f64,
    pub nav_request_delay: f64,
    pub nav_update_delay:  f64,

    // ── Planner ───────────────────────────────────────────────────────────
    /// Time between planner ticks.  Default: 100.
    pub planner_period: f64,
    /// How long the planner waits for a `NavUpdate` after asking.  Default: 1.
    pub nav_wait: f64,

    // ── Vehicle ───────────────────────────────────────────────────────────
    /// Time spent hovering over a target.  Default: 120.
    pub inspection_duration: f64,
    /// Metres per time unit.  Default: 0.4.
    pub linear_vel: f64,
    /// Radians per time unit.  Default: 0.3.
    pub rot_vel: f64,
    /// Idle re-check interval when no target is pending.  Default: 1.
    pub idle_poll: f64,
    pub start_position: NedPoint,
    /// Compass heading in radians.
    pub start_yaw: f64,

    /// Record the vehicle pose every `sample_period` time units.  `None`
    /// disables trajectory sampling.
    pub sample_period: Option<f64>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            duration:            3600.0,
            plan_delay:          0.0,
            feedback_delay:      0.0,
            nav_request_delay:   0.0,
            nav_update_delay:    0.0,
            planner_period:      100.0,
            nav_wait:            1.0,
            inspection_duration: 120.0,
            linear_vel:          0.4,
            rot_vel:             0.3,
            idle_poll:           1.0,
            start_position:      NedPoint::ORIGIN,
            start_yaw:           0.0,
            sample_period:       None,
        }
    }
}

impl MissionConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: MissionConfig =
            serde_json::from_str(json).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_path(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that every duration is usable by the kernel and every speed can
    /// be divided by.
    pub fn validate(&self) -> CoreResult<()> {
        let non_negative = [
            ("duration", self.duration),
            ("plan_delay", self.plan_delay),
            ("feedback_delay", self.feedback_delay),
            ("nav_request_delay", self.nav_request_delay),
            ("nav_update_delay", self.nav_update_delay),
            ("nav_wait", self.nav_wait),
            ("inspection_duration", self.inspection_duration),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Config(format!("{name} must be finite and >= 0, got {value}")));
            }
        }

        let positive = [
            ("planner_period", self.planner_period),
            ("linear_vel", self.linear_vel),
            ("rot_vel", self.rot_vel),
            ("idle_poll", self.idle_poll),
        ];
        for (name, value) in positive.into_iter().chain(self.sample_period.map(|p| ("sample_period", p))) {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::Config(format!("{name} must be finite and > 0, got {value}")));
            }
        }

        if !self.start_position.is_finite() || !self.start_yaw.is_finite() {
            return Err(CoreError::Config("start pose must be finite".into()));
        }
        Ok(())
    }
}
