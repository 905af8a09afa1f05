//! Target scenarios.
//!
//! # CSV format
//!
//! One row per target, positions in metres in the local NED frame:
//!
//! ```csv
//! id,north,east,down
//! 0,100,0,-100
//! 1,100,100,-100
//! 2,0,100,0
//! ```
//!
//! Ids must be unique and coordinates finite; rows keep their file order.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use ms_core::{NedPoint, TargetId};
use serde::Deserialize;

use crate::target::check_position;
use crate::{MissionError, MissionResult, Target};

#[derive(Deserialize)]
struct TargetRecord {
    id:    u32,
    north: f64,
    east:  f64,
    down:  f64,
}

/// Load targets from a CSV file.
pub fn load_targets_csv(path: &Path) -> MissionResult<Vec<Target>> {
    let file = std::fs::File::open(path)?;
    load_targets_reader(file)
}

/// Like [`load_targets_csv`] but accepts any `Read` source.
pub fn load_targets_reader<R: Read>(reader: R) -> MissionResult<Vec<Target>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for result in csv_reader.deserialize::<TargetRecord>() {
        let row = result?;
        let id = TargetId(row.id);
        if !seen.insert(id) {
            return Err(MissionError::DuplicateTarget(id));
        }
        let position = NedPoint::new(row.north, row.east, row.down);
        check_position(id, position)?;
        targets.push(Target::new(id, position));
    }
    Ok(targets)
}

/// The standard survey box: eight waypoints on a square of half-width
/// `scale`, the first two at `down = -scale`.
pub fn survey_box(scale: f64) -> Vec<Target> {
    const UNIT: [[f64; 3]; 8] = [
        [1.0, 0.0, -1.0],
        [1.0, 1.0, -1.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [-1.0, -1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 0.0],
    ];
    UNIT.iter()
        .enumerate()
        .map(|(i, p)| Target::new(TargetId(i as u32), NedPoint::new(p[0] * scale, p[1] * scale, p[2] * scale)))
        .collect()
}
