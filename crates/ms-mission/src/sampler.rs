//! Periodic pose recording.

use std::cell::RefCell;
use std::rc::Rc;

use ms_core::{NedPoint, SimTime};
use ms_sim::{Context, Process, SimResult, Step, Wake};

use crate::{MissionError, MissionMsg, SharedVehicle, VehicleState};

/// One recorded vehicle pose.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PoseSample {
    pub time:     SimTime,
    pub position: NedPoint,
    pub yaw:      f64,
    pub state:    VehicleState,
}

pub type SampleLog = Rc<RefCell<Vec<PoseSample>>>;

/// Records the vehicle's extrapolated pose every `period` time units,
/// starting at spawn time.  Reads the shared record only; never wakes the
/// vehicle.
pub struct PositionSampler {
    vehicle: SharedVehicle,
    period:  f64,
    log:     SampleLog,
}

impl PositionSampler {
    pub fn new(vehicle: SharedVehicle, period: f64, log: SampleLog) -> Self {
        Self { vehicle, period, log }
    }
}

impl Process<MissionMsg> for PositionSampler {
    fn resume(&mut self, wake: Wake<MissionMsg>, ctx: &mut Context<'_, MissionMsg>) -> SimResult<Step> {
        if !matches!(wake, Wake::Start | Wake::Timeout) {
            return Err(MissionError::UnexpectedWake { process: "sampler", wake: wake.kind() }.into());
        }
        let now = ctx.now();
        let v = self.vehicle.borrow();
        self.log.borrow_mut().push(PoseSample {
            time:     now,
            position: v.position_at(now),
            yaw:      v.yaw_at(now),
            state:    v.state,
        });
        Ok(Step::timeout(self.period))
    }

    fn name(&self) -> &str {
        "sampler"
    }
}
