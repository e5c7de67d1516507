use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accumulator::{Checkpoint, StageAccumulator};
use crate::classify::ChunkContext;
use crate::config::Period;
use crate::event::Event;
use crate::traits::MetFilter;

const COMMON_FLAGS: [&str; 7] = [
    "goodVertices",
    "globalSuperTightHalo2016Filter",
    "HBHENoiseFilter",
    "HBHENoiseIsoFilter",
    "EcalDeadCellTriggerPrimitiveFilter",
    "BadPFMuonFilter",
    "eeBadScFilter",
];

// not recommended for 2016
const ECAL_BAD_CALIB_FLAG: &str = "ecalBadCalibFilter";

/// Apply the MET filters and record the `MET_Filter` checkpoint
pub fn met_filter_stage<M: MetFilter>(
    ctx: &ChunkContext,
    filter: &M,
    events: Vec<Event>,
    acc: &mut StageAccumulator,
) -> Result<Vec<Event>, M::Error> {
    let events = filter.filter(events)?;
    acc.record(Checkpoint::MetFilter, &ctx.dataset, &events);
    debug!("{} events after MET filters", events.len());
    Ok(events)
}

/// Require a fixed set of MET filter flags
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardMetFilters {
    flags: Vec<String>,
}

impl StandardMetFilters {
    /// Require the given flags
    pub fn new(flags: Vec<String>) -> Self {
        Self { flags }
    }

    /// The recommended flags for the given period
    pub fn for_period(period: Period) -> Self {
        let mut flags: Vec<_> =
            COMMON_FLAGS.iter().map(|f| f.to_string()).collect();
        if matches!(period, Period::Run2017 | Period::Run2018) {
            flags.push(ECAL_BAD_CALIB_FLAG.to_owned());
        }
        Self { flags }
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    fn pass(&self, event: &Event) -> Result<bool, MetFilterError> {
        for flag in &self.flags {
            match event.flags.get(flag) {
                Some(true) => {}
                Some(false) => return Ok(false),
                None => {
                    return Err(MetFilterError::MissingFlag {
                        flag: flag.clone(),
                        run: event.run,
                        event: event.event,
                    })
                }
            }
        }
        Ok(true)
    }
}

impl MetFilter for StandardMetFilters {
    type Error = MetFilterError;

    fn filter(&self, events: Vec<Event>) -> Result<Vec<Event>, Self::Error> {
        let mut res = Vec::with_capacity(events.len());
        for event in events {
            if self.pass(&event)? {
                res.push(event);
            }
        }
        Ok(res)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetFilterError {
    #[error("Flag_{flag} missing in run {run}, event {event}")]
    MissingFlag { flag: String, run: u32, event: u64 },
}
