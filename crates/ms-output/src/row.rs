//! Plain data row types written by output backends.

use ms_mission::PoseSample;

/// One message written to a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    /// Time of the `put`.
    pub time:     f64,
    pub channel:  u32,
    /// `MissionMsg::kind()`, e.g. `plan_request`.
    pub kind:     &'static str,
    /// Time the message becomes readable.
    pub ready_at: f64,
    pub detail:   String,
}

/// One sampled vehicle pose.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryRow {
    pub time:  f64,
    pub north: f64,
    pub east:  f64,
    pub down:  f64,
    /// Compass heading, radians.
    pub yaw:   f64,
    pub state: String,
}

impl From<&PoseSample> for TrajectoryRow {
    fn from(s: &PoseSample) -> Self {
        Self {
            time:  s.time.as_f64(),
            north: s.position.north,
            east:  s.position.east,
            down:  s.position.down,
            yaw:   s.yaw,
            state: s.state.to_string(),
        }
    }
}

/// Totals for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub final_time: f64,
    pub messages:   u64,
    pub resumes:    u64,
    /// Targets the vehicle classified.
    pub classified: u64,
}
