use std::collections::BTreeMap;
use std::fmt::{self, Display};

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};

use crate::four_vector::FourVector;

/// A single value in an output record
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", *b as u8),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i.into())
    }
}

impl From<u8> for Value {
    fn from(i: u8) -> Self {
        Value::Int(i.into())
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::UInt(u.into())
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// Common interface of reconstructed physics objects
pub trait PhysicsObject {
    /// Names of all fields, in output order
    const FIELD_NAMES: &'static [&'static str];

    fn pt(&self) -> f64;
    fn eta(&self) -> f64;
    fn phi(&self) -> f64;
    fn mass(&self) -> f64;

    /// All fields as (name, value), in the order of `FIELD_NAMES`
    fn fields(&self) -> Vec<(&'static str, Value)>;

    fn p4(&self) -> FourVector {
        FourVector::from_pt_eta_phi_m(
            self.pt(),
            self.eta(),
            self.phi(),
            self.mass(),
        )
    }
}

/// Missing transverse energy
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Met {
    pub pt: f64,
    pub phi: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tau {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    pub charge: i32,
    pub dxy: f64,
    pub dz: f64,
    pub decay_mode: i32,
    #[serde(default)]
    pub gen_part_flav: u8,
    #[serde(default)]
    pub gen_part_idx: i32,
    #[serde(rename = "idDeepTau2017v2p1VSe", default)]
    pub id_deep_tau2017v2p1_vs_e: u8,
    #[serde(rename = "idDeepTau2017v2p1VSmu", default)]
    pub id_deep_tau2017v2p1_vs_mu: u8,
    #[serde(rename = "idDeepTau2017v2p1VSjet", default)]
    pub id_deep_tau2017v2p1_vs_jet: u8,
    #[serde(rename = "idDeepTau2018v2p5VSe", default)]
    pub id_deep_tau2018v2p5_vs_e: u8,
    #[serde(rename = "idDeepTau2018v2p5VSmu", default)]
    pub id_deep_tau2018v2p5_vs_mu: u8,
    #[serde(rename = "idDeepTau2018v2p5VSjet", default)]
    pub id_deep_tau2018v2p5_vs_jet: u8,
}

impl PhysicsObject for Tau {
    const FIELD_NAMES: &'static [&'static str] = &[
        "pt",
        "eta",
        "phi",
        "mass",
        "charge",
        "dxy",
        "dz",
        "decayMode",
        "genPartFlav",
        "genPartIdx",
        "idDeepTau2017v2p1VSe",
        "idDeepTau2017v2p1VSmu",
        "idDeepTau2017v2p1VSjet",
        "idDeepTau2018v2p5VSe",
        "idDeepTau2018v2p5VSmu",
        "idDeepTau2018v2p5VSjet",
    ];

    fn pt(&self) -> f64 {
        self.pt
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn mass(&self) -> f64 {
        self.mass
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        let values: [Value; 16] = [
            self.pt.into(),
            self.eta.into(),
            self.phi.into(),
            self.mass.into(),
            self.charge.into(),
            self.dxy.into(),
            self.dz.into(),
            self.decay_mode.into(),
            self.gen_part_flav.into(),
            self.gen_part_idx.into(),
            self.id_deep_tau2017v2p1_vs_e.into(),
            self.id_deep_tau2017v2p1_vs_mu.into(),
            self.id_deep_tau2017v2p1_vs_jet.into(),
            self.id_deep_tau2018v2p5_vs_e.into(),
            self.id_deep_tau2018v2p5_vs_mu.into(),
            self.id_deep_tau2018v2p5_vs_jet.into(),
        ];
        Self::FIELD_NAMES.iter().copied().zip(values).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Muon {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    pub charge: i32,
    pub pdg_id: i32,
    pub dxy: f64,
    pub dz: f64,
    #[serde(rename = "pfRelIso03_all")]
    pub pf_rel_iso03_all: f64,
    pub medium_id: bool,
    #[serde(default)]
    pub tight_id: bool,
    #[serde(default)]
    pub gen_part_idx: i32,
    #[serde(default)]
    pub gen_part_flav: u8,
}

impl PhysicsObject for Muon {
    const FIELD_NAMES: &'static [&'static str] = &[
        "pt",
        "eta",
        "phi",
        "mass",
        "charge",
        "pdgId",
        "dxy",
        "dz",
        "pfRelIso03_all",
        "mediumId",
        "tightId",
        "genPartIdx",
        "genPartFlav",
    ];

    fn pt(&self) -> f64 {
        self.pt
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn mass(&self) -> f64 {
        self.mass
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        let values: [Value; 13] = [
            self.pt.into(),
            self.eta.into(),
            self.phi.into(),
            self.mass.into(),
            self.charge.into(),
            self.pdg_id.into(),
            self.dxy.into(),
            self.dz.into(),
            self.pf_rel_iso03_all.into(),
            self.medium_id.into(),
            self.tight_id.into(),
            self.gen_part_idx.into(),
            self.gen_part_flav.into(),
        ];
        Self::FIELD_NAMES.iter().copied().zip(values).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Electron {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    pub charge: i32,
    pub pdg_id: i32,
    pub dxy: f64,
    pub dz: f64,
    #[serde(rename = "pfRelIso03_all")]
    pub pf_rel_iso03_all: f64,
    #[serde(rename = "mvaNoIso_WP90")]
    pub mva_no_iso_wp90: bool,
    #[serde(default)]
    pub cut_based: i32,
    #[serde(default)]
    pub gen_part_idx: i32,
    #[serde(default)]
    pub gen_part_flav: u8,
}

impl PhysicsObject for Electron {
    const FIELD_NAMES: &'static [&'static str] = &[
        "pt",
        "eta",
        "phi",
        "mass",
        "charge",
        "pdgId",
        "dxy",
        "dz",
        "pfRelIso03_all",
        "mvaNoIso_WP90",
        "cutBased",
        "genPartIdx",
        "genPartFlav",
    ];

    fn pt(&self) -> f64 {
        self.pt
    }
    fn eta(&self) -> f64 {
        self.eta
    }
    fn phi(&self) -> f64 {
        self.phi
    }
    fn mass(&self) -> f64 {
        self.mass
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        let values: [Value; 13] = [
            self.pt.into(),
            self.eta.into(),
            self.phi.into(),
            self.mass.into(),
            self.charge.into(),
            self.pdg_id.into(),
            self.dxy.into(),
            self.dz.into(),
            self.pf_rel_iso03_all.into(),
            self.mva_no_iso_wp90.into(),
            self.cut_based.into(),
            self.gen_part_idx.into(),
            self.gen_part_flav.into(),
        ];
        Self::FIELD_NAMES.iter().copied().zip(values).collect()
    }
}

/// Light lepton flavour
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flavour {
    Electron,
    Muon,
}

/// Either kind of light lepton
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Lepton<'a> {
    Electron(&'a Electron),
    Muon(&'a Muon),
}

impl<'a> Lepton<'a> {
    pub fn flavour(&self) -> Flavour {
        match self {
            Lepton::Electron(_) => Flavour::Electron,
            Lepton::Muon(_) => Flavour::Muon,
        }
    }

    pub fn particle_id(&self) -> ParticleID {
        match self {
            Lepton::Electron(e) => ParticleID::new(e.pdg_id),
            Lepton::Muon(m) => ParticleID::new(m.pdg_id),
        }
    }

    pub fn charge(&self) -> i32 {
        match self {
            Lepton::Electron(e) => e.charge,
            Lepton::Muon(m) => m.charge,
        }
    }

    pub fn rel_iso(&self) -> f64 {
        match self {
            Lepton::Electron(e) => e.pf_rel_iso03_all,
            Lepton::Muon(m) => m.pf_rel_iso03_all,
        }
    }

    pub fn eta(&self) -> f64 {
        match self {
            Lepton::Electron(e) => e.eta,
            Lepton::Muon(m) => m.eta,
        }
    }

    pub fn phi(&self) -> f64 {
        match self {
            Lepton::Electron(e) => e.phi,
            Lepton::Muon(m) => m.phi,
        }
    }

    pub fn p4(&self) -> FourVector {
        match self {
            Lepton::Electron(e) => e.p4(),
            Lepton::Muon(m) => m.p4(),
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        match self {
            Lepton::Electron(e) => e.fields(),
            Lepton::Muon(m) => m.fields(),
        }
    }
}

/// A collision event
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub run: u32,
    pub luminosity_block: u32,
    pub event: u64,
    /// Generator weight, absent for data
    #[serde(default)]
    pub gen_weight: f64,
    #[serde(rename = "MET")]
    pub met: Met,
    /// MET quality flags by name, without the `Flag_` prefix
    #[serde(rename = "Flag", default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(rename = "Tau", default)]
    pub taus: Vec<Tau>,
    #[serde(rename = "Muon", default)]
    pub muons: Vec<Muon>,
    #[serde(rename = "Electron", default)]
    pub electrons: Vec<Electron>,
}

/// An event together with its selected object collections
///
/// The selected collections are ordered subsequences of the original
/// collections, with tau momenta and the MET possibly corrected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectedEvent {
    pub event: Event,
    pub sel_taus: Vec<Tau>,
    pub sel_muons: Vec<Muon>,
    pub sel_electrons: Vec<Electron>,
}

impl SelectedEvent {
    /// The selected lepton of the given flavour at position `idx`
    pub fn lepton(&self, flavour: Flavour, idx: usize) -> Option<Lepton<'_>> {
        match flavour {
            Flavour::Electron => self.sel_electrons.get(idx).map(Lepton::Electron),
            Flavour::Muon => self.sel_muons.get(idx).map(Lepton::Muon),
        }
    }

    /// Number of selected leptons of the given flavour
    pub fn nleptons(&self, flavour: Flavour) -> usize {
        match flavour {
            Flavour::Electron => self.sel_electrons.len(),
            Flavour::Muon => self.sel_muons.len(),
        }
    }
}
