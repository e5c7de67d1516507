use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use audec::auto_decompress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Period;
use crate::event::{Met, Tau};
use crate::traits::TauEnergyCorrection;
use crate::variation::{Direction, TauEsVariation};

/// Nominal, up, and down energy scale factors for one tau
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TauEsFactors {
    pub nominal: f64,
    pub up: f64,
    pub down: f64,
}

impl Default for TauEsFactors {
    fn default() -> Self {
        Self {
            nominal: 1.,
            up: 1.,
            down: 1.,
        }
    }
}

impl TauEsFactors {
    pub fn varied(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }
}

/// Correct the momenta of selected taus
///
/// Without a variation, tau momenta and masses are scaled by the nominal
/// factor and the MET is left unchanged. With a variation, taus selected
/// by the variation are scaled with the up or down factor and all others
/// with the nominal one. The difference to the nominal correction is then
/// propagated to the MET.
///
/// Returns the MET shift, which is only nonzero for variations.
pub fn correct_taus(
    taus: &mut [Tau],
    factors: &[TauEsFactors],
    variation: Option<&TauEsVariation>,
    met: &mut Met,
) -> f64 {
    debug_assert_eq!(taus.len(), factors.len());
    let Some(variation) = variation else {
        for (tau, f) in taus.iter_mut().zip(factors) {
            tau.pt *= f.nominal;
            tau.mass *= f.nominal;
        }
        return 0.;
    };
    let mut delta_met = 0.;
    for (tau, f) in taus.iter_mut().zip(factors) {
        let sf = if variation.applies_to(tau) {
            f.varied(variation.direction())
        } else {
            f.nominal
        };
        delta_met += tau.pt * sf - tau.pt * f.nominal;
        tau.pt *= sf;
        tau.mass *= sf;
    }
    met.pt -= delta_met;
    delta_met
}

/// Tau energy scale factors for one period
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TauEsPeriodTable {
    /// Genuine hadronic taus, by decay mode
    #[serde(default)]
    pub genuine_tau: BTreeMap<i32, TauEsFactors>,
    /// Electrons misidentified as taus, by decay mode
    #[serde(default)]
    pub genuine_electron: BTreeMap<i32, TauEsFactors>,
    /// Muons misidentified as taus
    #[serde(default)]
    pub genuine_muon: Option<TauEsFactors>,
}

impl TauEsPeriodTable {
    fn lookup(&self, tau: &Tau) -> TauEsFactors {
        let factors = match tau.gen_part_flav {
            5 => self.genuine_tau.get(&tau.decay_mode).copied(),
            1 | 3 => self.genuine_electron.get(&tau.decay_mode).copied(),
            2 | 4 => self.genuine_muon,
            _ => None,
        };
        factors.unwrap_or_default()
    }
}

/// Tau energy scale factors read from a table
///
/// Taus without a matching entry get unit factors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TauEsTable {
    periods: BTreeMap<Period, TauEsPeriodTable>,
}

impl TauEsTable {
    pub fn new(periods: BTreeMap<Period, TauEsPeriodTable>) -> Self {
        Self { periods }
    }

    /// Read a (possibly compressed) YAML table
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TauEsError> {
        let file = File::open(path.as_ref())?;
        let r = auto_decompress(BufReader::new(file));
        Ok(serde_yaml::from_reader(r)?)
    }
}

impl TauEnergyCorrection for TauEsTable {
    type Error = TauEsError;

    fn factors(
        &self,
        taus: &[Tau],
        period: Period,
    ) -> Result<Vec<TauEsFactors>, Self::Error> {
        let table = self
            .periods
            .get(&period)
            .ok_or(TauEsError::MissingPeriod(period))?;
        Ok(taus.iter().map(|t| table.lookup(t)).collect())
    }
}

#[derive(Debug, Error)]
pub enum TauEsError {
    #[error("No tau energy scale factors for period {0}")]
    MissingPeriod(Period),
    #[error("Failed to read tau energy scale table: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse tau energy scale table: {0}")]
    Parse(#[from] serde_yaml::Error),
}
