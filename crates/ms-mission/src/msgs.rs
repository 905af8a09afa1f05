//! Messages exchanged between the planner and the vehicle.

use std::fmt;

use ms_core::{NedPoint, TargetId};

use crate::{Classification, Target};

/// Every message carried by the mission channels.
#[derive(Clone, Debug, PartialEq)]
pub enum MissionMsg {
    /// New visiting plan: `order` indexes into `targets`.
    PlanRequest {
        targets: Vec<Target>,
        order:   Vec<usize>,
    },
    /// Outcome of one inspection.
    PlanFeedback {
        target_id:      TargetId,
        classification: Classification,
    },
    /// Ask the vehicle for a position fix.
    NavRequest,
    NavUpdate {
        position: NedPoint,
    },
}

impl MissionMsg {
    pub fn kind(&self) -> &'static str {
        match self {
            MissionMsg::PlanRequest { .. } => "plan_request",
            MissionMsg::PlanFeedback { .. } => "plan_feedback",
            MissionMsg::NavRequest => "nav_request",
            MissionMsg::NavUpdate { .. } => "nav_update",
        }
    }
}

/// Compact payload description, used by message logs.
impl fmt::Display for MissionMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionMsg::PlanRequest { targets, order } => {
                let ids: Vec<String> = order
                    .iter()
                    .filter_map(|&i| targets.get(i))
                    .map(|t| t.id.0.to_string())
                    .collect();
                write!(f, "order=[{}]", ids.join(" "))
            }
            MissionMsg::PlanFeedback { target_id, classification } => {
                write!(f, "{target_id} {classification}")
            }
            MissionMsg::NavRequest => Ok(()),
            MissionMsg::NavUpdate { position } => write!(f, "{position}"),
        }
    }
}
