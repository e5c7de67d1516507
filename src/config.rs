use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::event::{Electron, Muon, Tau};
use crate::variation::TauEsVariation;

/// Tau candidates need a corrected transverse momentum above this value
pub const TAU_PT_MIN: f64 = 20.;
/// General recommendation for DeepTau 2p5, 2.3 would suffice for 2p1
pub const TAU_ETA_MAX: f64 = 2.5;
pub const TAU_DZ_MAX: f64 = 0.2;
/// Minimum DeepTau VSmu working point (Tight)
pub const TAU_ID_VS_MU_MIN: u8 = 4;
/// Minimum DeepTau VSe working point (VVLoose)
pub const TAU_ID_VS_E_MIN: u8 = 2;
/// Minimum DeepTau VSjet working point (VVLoose)
pub const TAU_ID_VS_JET_MIN: u8 = 2;
/// Decay modes 5 and 6 are not recommended for analysis
pub const TAU_REJECTED_DECAY_MODES: [i32; 2] = [5, 6];

pub const MUON_PT_MIN: f64 = 10.;
pub const MUON_ETA_MAX: f64 = 2.4;
pub const MUON_DZ_MAX: f64 = 0.2;
pub const MUON_DXY_MAX: f64 = 0.045;
pub const MUON_ISO_MAX: f64 = 0.4;

pub const ELECTRON_PT_MIN: f64 = 10.;
pub const ELECTRON_ETA_MAX: f64 = 2.5;
pub const ELECTRON_DZ_MAX: f64 = 0.2;
pub const ELECTRON_DXY_MAX: f64 = 0.045;
pub const ELECTRON_ISO_MAX: f64 = 0.4;

/// Data-taking period
#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    EnumString,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum Period {
    #[strum(serialize = "2016_HIPM")]
    #[serde(rename = "2016_HIPM")]
    Run2016HIPM,
    #[strum(serialize = "2016")]
    #[serde(rename = "2016")]
    Run2016,
    #[strum(serialize = "2017")]
    #[serde(rename = "2017")]
    Run2017,
    #[strum(serialize = "2018")]
    #[serde(rename = "2018")]
    Run2018,
}

/// Version of the DeepTau identification discriminants
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TauIdVersion {
    DeepTau2017v2p1,
    DeepTau2018v2p5,
}

impl From<Period> for TauIdVersion {
    fn from(period: Period) -> Self {
        match period {
            Period::Run2018 => TauIdVersion::DeepTau2018v2p5,
            _ => TauIdVersion::DeepTau2017v2p1,
        }
    }
}

/// Field accessors for one set of DeepTau discriminants
#[derive(Copy, Clone)]
pub struct TauIdAccessors {
    pub vs_e: fn(&Tau) -> u8,
    pub vs_mu: fn(&Tau) -> u8,
    pub vs_jet: fn(&Tau) -> u8,
}

impl TauIdVersion {
    pub fn accessors(self) -> TauIdAccessors {
        match self {
            TauIdVersion::DeepTau2017v2p1 => TauIdAccessors {
                vs_e: |t| t.id_deep_tau2017v2p1_vs_e,
                vs_mu: |t| t.id_deep_tau2017v2p1_vs_mu,
                vs_jet: |t| t.id_deep_tau2017v2p1_vs_jet,
            },
            TauIdVersion::DeepTau2018v2p5 => TauIdAccessors {
                vs_e: |t| t.id_deep_tau2018v2p5_vs_e,
                vs_mu: |t| t.id_deep_tau2018v2p5_vs_mu,
                vs_jet: |t| t.id_deep_tau2018v2p5_vs_jet,
            },
        }
    }
}

/// Baseline object selection thresholds
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cuts {
    pub tau_pt: f64,
    pub tau_eta: f64,
    pub tau_dz: f64,
    pub tau_id_vs_mu: u8,
    pub tau_id_vs_e: u8,
    pub tau_id_vs_jet: u8,
    pub tau_rejected_decay_modes: [i32; 2],

    pub mu_pt: f64,
    pub mu_eta: f64,
    pub mu_dz: f64,
    pub mu_dxy: f64,
    pub mu_iso: f64,

    pub e_pt: f64,
    pub e_eta: f64,
    pub e_dz: f64,
    pub e_dxy: f64,
    pub e_iso: f64,
}

impl Default for Cuts {
    fn default() -> Self {
        Self {
            tau_pt: TAU_PT_MIN,
            tau_eta: TAU_ETA_MAX,
            tau_dz: TAU_DZ_MAX,
            tau_id_vs_mu: TAU_ID_VS_MU_MIN,
            tau_id_vs_e: TAU_ID_VS_E_MIN,
            tau_id_vs_jet: TAU_ID_VS_JET_MIN,
            tau_rejected_decay_modes: TAU_REJECTED_DECAY_MODES,
            mu_pt: MUON_PT_MIN,
            mu_eta: MUON_ETA_MAX,
            mu_dz: MUON_DZ_MAX,
            mu_dxy: MUON_DXY_MAX,
            mu_iso: MUON_ISO_MAX,
            e_pt: ELECTRON_PT_MIN,
            e_eta: ELECTRON_ETA_MAX,
            e_dz: ELECTRON_DZ_MAX,
            e_dxy: ELECTRON_DXY_MAX,
            e_iso: ELECTRON_ISO_MAX,
        }
    }
}

impl Cuts {
    /// Baseline tau requirements, except for the transverse momentum
    ///
    /// The momentum cut has to be applied after the energy correction,
    /// see [Cuts::pass_tau_pt].
    pub fn pass_tau_id(&self, tau: &Tau, ids: &TauIdAccessors) -> bool {
        tau.eta.abs() < self.tau_eta
            && tau.dz.abs() < self.tau_dz
            && (ids.vs_mu)(tau) >= self.tau_id_vs_mu
            && (ids.vs_e)(tau) >= self.tau_id_vs_e
            && (ids.vs_jet)(tau) >= self.tau_id_vs_jet
            && !self.tau_rejected_decay_modes.contains(&tau.decay_mode)
    }

    pub fn pass_tau_pt(&self, tau: &Tau) -> bool {
        tau.pt > self.tau_pt
    }

    pub fn pass_muon(&self, mu: &Muon) -> bool {
        mu.pt > self.mu_pt
            && mu.eta.abs() < self.mu_eta
            && mu.dz.abs() < self.mu_dz
            && mu.dxy.abs() < self.mu_dxy
            && mu.medium_id
            && mu.pf_rel_iso03_all < self.mu_iso
    }

    pub fn pass_electron(&self, e: &Electron) -> bool {
        e.pt > self.e_pt
            && e.eta.abs() < self.e_eta
            && e.dz.abs() < self.e_dz
            && e.dxy.abs() < self.e_dxy
            && e.mva_no_iso_wp90
            && e.pf_rel_iso03_all < self.e_iso
    }
}

/// Cross sections in pb by dataset identity
pub type CrossSections = BTreeMap<String, f64>;

/// Groups of datasets that are stitched together
pub type StitchingTable = Vec<Vec<String>>;

fn default_signal_marker() -> String {
    "HNL".to_owned()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("anatuples")
}

/// Analysis configuration
///
/// Immutable for the duration of a job and passed by reference to every
/// pipeline stage.
#[derive(Clone, Debug, Deserialize, Serialize, TypedBuilder)]
pub struct Config {
    pub period: Period,
    /// Tag identifying the production, part of the output path
    #[builder(setter(into))]
    pub tag: String,
    /// Datasets whose name contains this marker are collision data
    #[serde(rename = "dataHLT")]
    #[builder(setter(into))]
    pub data_hlt: String,
    /// Datasets whose identity contains this marker are signal samples
    #[serde(default = "default_signal_marker")]
    #[builder(default = default_signal_marker(), setter(into))]
    pub signal_marker: String,
    pub stitched_list: StitchingTable,
    /// Required for all simulated samples
    #[serde(default)]
    #[builder(default, setter(strip_option))]
    pub xsecs: Option<CrossSections>,
    #[serde(default = "default_output_dir")]
    #[builder(default = default_output_dir(), setter(into))]
    pub output_dir: PathBuf,
    /// Systematic variation of the tau energy scale
    #[serde(default)]
    #[builder(default)]
    pub tau_es_variation: Option<TauEsVariation>,
    #[serde(skip)]
    #[builder(default)]
    pub cuts: Cuts,
}

impl Config {
    /// Check that all mandatory settings are present
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.stitched_list.is_empty() {
            return Err(ConfigError::MissingStitchedList);
        }
        if self.tag.is_empty() {
            return Err(ConfigError::MissingTag);
        }
        if self.data_hlt.is_empty() {
            return Err(ConfigError::MissingDataMarker);
        }
        Ok(self)
    }

    pub fn tau_id_version(&self) -> TauIdVersion {
        self.period.into()
    }

    /// Name of the output tree
    pub fn tree_name(&self) -> String {
        match &self.tau_es_variation {
            Some(variation) => format!("Events_{variation}"),
            None => "Events".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing stitched list")]
    MissingStitchedList,
    #[error("Missing tag")]
    MissingTag,
    #[error("Missing HLT marker for data sets")]
    MissingDataMarker,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::builder()
            .period(Period::Run2018)
            .tag("v1")
            .data_hlt("SingleMuon")
            .stitched_list(vec![vec!["DY-50".to_owned()]])
            .build()
    }

    #[test]
    fn tau_id_version_from_period() {
        assert_eq!(config().tau_id_version(), TauIdVersion::DeepTau2018v2p5);
        let mut cfg = config();
        cfg.period = Period::Run2016HIPM;
        assert_eq!(cfg.tau_id_version(), TauIdVersion::DeepTau2017v2p1);

        let tau = Tau {
            id_deep_tau2017v2p1_vs_jet: 3,
            id_deep_tau2018v2p5_vs_jet: 7,
            ..Default::default()
        };
        let ids = TauIdVersion::DeepTau2018v2p5.accessors();
        assert_eq!((ids.vs_jet)(&tau), 7);
        let ids = TauIdVersion::DeepTau2017v2p1.accessors();
        assert_eq!((ids.vs_jet)(&tau), 3);
    }

    #[test]
    fn validate() {
        assert!(config().validate().is_ok());
        let mut cfg = config();
        cfg.stitched_list.clear();
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::MissingStitchedList);
        let mut cfg = config();
        cfg.tag.clear();
        assert_eq!(cfg.validate().unwrap_err(), ConfigError::MissingTag);
    }

    #[test]
    fn deserialise() {
        let yaml = r#"
period: "2017"
tag: prod
dataHLT: EGamma
stitched_list: [[DY-50, DY1J-50]]
xsecs: {DY-50: 6077.22}
tau_es_variation: Events_GenuineMuonES_down
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.period, Period::Run2017);
        assert_eq!(cfg.signal_marker, "HNL");
        assert_eq!(cfg.cuts, Cuts::default());
        assert_eq!(cfg.tree_name(), "Events_GenuineMuonES_down");
        assert_eq!(cfg.xsecs.unwrap()["DY-50"], 6077.22);
    }

    #[test]
    fn unknown_variation_is_rejected() {
        let yaml = r#"
period: "2017"
tag: prod
dataHLT: EGamma
stitched_list: [[DY-50]]
tau_es_variation: Events_GenuinePhotonES_up
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
