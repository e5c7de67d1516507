use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::event::Event;

/// Pipeline stage at which events are counted
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumIter,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Checkpoint {
    /// Before any selection
    #[strum(serialize = "init")]
    #[serde(rename = "init")]
    Init,
    /// After reweighting (simulation) or golden run selection (data)
    #[strum(serialize = "reweight")]
    #[serde(rename = "reweight")]
    Reweight,
    /// After the MET filters
    #[strum(serialize = "MET_Filter")]
    #[serde(rename = "MET_Filter")]
    MetFilter,
}

/// Number of events and sum of their generator weights
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageCount {
    pub n_ev: u64,
    pub sumw: f64,
}

impl StageCount {
    pub fn of(events: &[Event]) -> Self {
        Self {
            n_ev: events.len() as u64,
            sumw: events.iter().map(|e| e.gen_weight).sum(),
        }
    }
}

impl AddAssign for StageCount {
    fn add_assign(&mut self, rhs: StageCount) {
        self.n_ev += rhs.n_ev;
        self.sumw += rhs.sumw;
    }
}

impl Add for StageCount {
    type Output = Self;

    fn add(mut self, rhs: StageCount) -> Self::Output {
        self += rhs;
        self
    }
}

/// Running event counts per checkpoint and dataset
///
/// Entries are only ever incremented. Accumulators of independent chunks
/// are combined with `+`, which is associative and commutative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageAccumulator {
    counts: BTreeMap<Checkpoint, BTreeMap<String, StageCount>>,
}

impl StageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `events` at `checkpoint` for `dataset`
    pub fn record(
        &mut self,
        checkpoint: Checkpoint,
        dataset: &str,
        events: &[Event],
    ) {
        *self
            .counts
            .entry(checkpoint)
            .or_default()
            .entry(dataset.to_owned())
            .or_default() += StageCount::of(events);
    }

    /// Counts at `checkpoint` for `dataset`, zero if nothing was recorded
    pub fn get(&self, checkpoint: Checkpoint, dataset: &str) -> StageCount {
        self.counts
            .get(&checkpoint)
            .and_then(|c| c.get(dataset))
            .copied()
            .unwrap_or_default()
    }

    /// All (checkpoint, dataset, count) entries
    pub fn iter(&self) -> impl Iterator<Item = (Checkpoint, &str, StageCount)> {
        Checkpoint::iter().flat_map(move |checkpoint| {
            self.counts
                .get(&checkpoint)
                .into_iter()
                .flatten()
                .map(move |(ds, count)| (checkpoint, ds.as_str(), *count))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|c| c.is_empty())
    }

    pub fn merge(&mut self, other: StageAccumulator) {
        for (checkpoint, counts) in other.counts {
            let target = self.counts.entry(checkpoint).or_default();
            for (ds, count) in counts {
                *target.entry(ds).or_default() += count;
            }
        }
    }
}

impl AddAssign for StageAccumulator {
    fn add_assign(&mut self, rhs: StageAccumulator) {
        self.merge(rhs)
    }
}

impl Add for StageAccumulator {
    type Output = Self;

    fn add(mut self, rhs: StageAccumulator) -> Self::Output {
        self += rhs;
        self
    }
}
