//! Time-indexed series.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::domain::TimeStep;

/// What happens when a second value arrives for an occupied time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Keep the first value; the newcomer is rejected.
    FirstWins,
    /// The newcomer replaces the stored value.
    LastWins,
}

/// Result of `Series::insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Replaced,
    Rejected,
}

/// Oldest and latest time step present in a non-empty series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesBounds {
    pub oldest: TimeStep,
    pub latest: TimeStep,
}

/// Ordered map from time step to value, built once and then read-only.
#[derive(Debug, Clone)]
pub struct Series<T> {
    values: BTreeMap<TimeStep, T>,
    policy: WritePolicy,
}

impl<T> Series<T> {
    pub fn new(policy: WritePolicy) -> Self {
        Self {
            values: BTreeMap::new(),
            policy,
        }
    }

    pub fn insert(&mut self, step: TimeStep, value: T) -> InsertOutcome {
        match self.values.entry(step) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                InsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => match self.policy {
                WritePolicy::LastWins => {
                    slot.insert(value);
                    InsertOutcome::Replaced
                }
                WritePolicy::FirstWins => InsertOutcome::Rejected,
            },
        }
    }

    pub fn get(&self, step: TimeStep) -> Option<&T> {
        self.values.get(&step)
    }

    /// Value at the latest time step in `[oldest, step]`.
    ///
    /// Keys and `step` all sit on the rounder's grid, so this is the value a
    /// step-by-step backward walk from `step` would reach first.
    pub fn at_or_before(&self, step: TimeStep) -> Option<(TimeStep, &T)> {
        self.values
            .range(..=step)
            .next_back()
            .map(|(k, v)| (*k, v))
    }

    pub fn bounds(&self) -> Option<SeriesBounds> {
        let (oldest, _) = self.values.first_key_value()?;
        let (latest, _) = self.values.last_key_value()?;
        Some(SeriesBounds {
            oldest: *oldest,
            latest: *latest,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
