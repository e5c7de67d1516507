use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, trace};
use thiserror::Error;

use crate::config::Period;
use crate::event::Event;
use crate::traits::GoldenRunFilter;

/// Certified luminosity blocks
///
/// Read from the usual certification JSON format, mapping each run number
/// to a list of inclusive `[first, last]` luminosity block ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoldenJson {
    period: Option<Period>,
    lumis: BTreeMap<u32, Vec<(u32, u32)>>,
}

impl GoldenJson {
    /// Parse certification JSON
    pub fn from_reader<R: std::io::Read>(r: R) -> Result<Self, GoldenJsonError> {
        let raw: BTreeMap<String, Vec<[u32; 2]>> = serde_yaml::from_reader(r)?;
        let mut lumis = BTreeMap::new();
        for (run, ranges) in raw {
            let run = run
                .trim()
                .parse()
                .map_err(|_| GoldenJsonError::InvalidRun(run.clone()))?;
            let mut ranges: Vec<_> = ranges.into_iter().map(|[a, b]| (a, b)).collect();
            ranges.sort_unstable();
            lumis.insert(run, ranges);
        }
        Ok(Self {
            period: None,
            lumis,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GoldenJsonError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Only accept events from the given period
    pub fn for_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    /// Whether the luminosity block `lumi` of run `run` is certified
    pub fn is_certified(&self, run: u32, lumi: u32) -> bool {
        self.lumis
            .get(&run)
            .map(|ranges| ranges.iter().any(|&(a, b)| a <= lumi && lumi <= b))
            .unwrap_or(false)
    }
}

impl GoldenRunFilter for GoldenJson {
    type Error = GoldenJsonError;

    fn filter(
        &self,
        dataset: &str,
        mut events: Vec<Event>,
        period: Period,
    ) -> Result<Vec<Event>, Self::Error> {
        if let Some(certified) = self.period {
            if certified != period {
                return Err(GoldenJsonError::WrongPeriod {
                    dataset: dataset.to_owned(),
                    expected: certified,
                    got: period,
                });
            }
        }
        let before = events.len();
        events.retain(|e| {
            let keep = self.is_certified(e.run, e.luminosity_block);
            if !keep {
                trace!("Reject run {} lumi {}", e.run, e.luminosity_block);
            }
            keep
        });
        debug!("{dataset}: {} of {before} events in golden runs", events.len());
        Ok(events)
    }
}

#[derive(Debug, Error)]
pub enum GoldenJsonError {
    #[error("Failed to read certification file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse certification file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid run number: {0}")]
    InvalidRun(String),
    #[error("Certification for {expected} cannot be applied to {dataset} from {got}")]
    WrongPeriod {
        dataset: String,
        expected: Period,
        got: Period,
    },
}
