//! Inspection targets and the planner's view of them.

use std::collections::BTreeMap;
use std::fmt;

use ms_core::{CoreError, NedPoint, TargetId};
use serde::{Deserialize, Serialize};

use crate::{MissionError, MissionResult};

/// Result of inspecting a target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Unclassified,
    Mine,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Unclassified => f.write_str("unclassified"),
            Classification::Mine => f.write_str("mine"),
        }
    }
}

/// A point of interest on the seabed.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub id:             TargetId,
    pub position:       NedPoint,
    pub classification: Classification,
}

impl Target {
    pub fn new(id: TargetId, position: NedPoint) -> Self {
        Self { id, position, classification: Classification::Unclassified }
    }

    #[inline]
    pub fn is_classified(&self) -> bool {
        self.classification != Classification::Unclassified
    }

    /// Record the outcome of an inspection.
    ///
    /// A target moves from `Unclassified` to `Mine` exactly once; a second
    /// call fails with [`MissionError::AlreadyClassified`].
    pub fn classify(&mut self) -> MissionResult<Classification> {
        if self.is_classified() {
            return Err(MissionError::AlreadyClassified(self.id));
        }
        self.classification = Classification::Mine;
        Ok(self.classification)
    }
}

/// Reject a target position the vehicle could never reach.
pub(crate) fn check_position(id: TargetId, position: NedPoint) -> MissionResult<()> {
    if position.is_finite() {
        return Ok(());
    }
    Err(CoreError::Config(format!("{id} has a non-finite position {position}")).into())
}

// ── TargetBook ────────────────────────────────────────────────────────────────

/// The planner's copy of the target set, keyed by id.
///
/// Classifications only change through [`apply_feedback`][Self::apply_feedback],
/// i.e. through `PlanFeedback` messages from the vehicle.
#[derive(Clone, Debug, Default)]
pub struct TargetBook {
    targets: BTreeMap<TargetId, Target>,
}

impl TargetBook {
    /// Build a book from a target list; duplicate ids and non-finite
    /// positions are rejected.
    pub fn new(targets: impl IntoIterator<Item = Target>) -> MissionResult<Self> {
        let mut book = BTreeMap::new();
        for target in targets {
            let id = target.id;
            check_position(id, target.position)?;
            if book.insert(id, target).is_some() {
                return Err(MissionError::DuplicateTarget(id));
            }
        }
        Ok(Self { targets: book })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn has_unclassified(&self) -> bool {
        self.targets.values().any(|t| !t.is_classified())
    }

    /// Unclassified targets in id order.
    pub fn unclassified(&self) -> Vec<Target> {
        self.targets.values().filter(|t| !t.is_classified()).cloned().collect()
    }

    pub fn classified_count(&self) -> usize {
        self.targets.values().filter(|t| t.is_classified()).count()
    }

    /// Apply a classification reported by the vehicle.  Returns `false` for
    /// an id the book does not know.
    pub fn apply_feedback(&mut self, id: TargetId, classification: Classification) -> bool {
        match self.targets.get_mut(&id) {
            Some(target) => {
                target.classification = classification;
                true
            }
            None => false,
        }
    }
}
