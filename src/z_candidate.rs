use itertools::Itertools;
use log::debug;

use crate::event::{Flavour, Lepton, PhysicsObject, SelectedEvent};

/// Z boson mass in GeV
pub const Z_MASS: f64 = 91.19;

/// Position of a selected lepton within its collection
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeptonRef {
    pub flavour: Flavour,
    pub idx: usize,
}

/// Same-flavour, opposite-sign lepton pair compatible with a Z boson
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZCandidate {
    /// Leading lepton
    pub lepton1: LeptonRef,
    /// Subleading lepton
    pub lepton2: LeptonRef,
    /// Invariant mass of the pair
    pub mass: f64,
}

impl ZCandidate {
    pub fn flavour(&self) -> Flavour {
        self.lepton1.flavour
    }

    /// Whether the selected lepton `r` is part of the pair
    pub fn contains(&self, r: LeptonRef) -> bool {
        self.lepton1 == r || self.lepton2 == r
    }

    /// The two leptons of the pair, leading lepton first
    pub fn leptons<'a>(
        &self,
        event: &'a SelectedEvent,
    ) -> Option<(Lepton<'a>, Lepton<'a>)> {
        let l1 = event.lepton(self.lepton1.flavour, self.lepton1.idx)?;
        let l2 = event.lepton(self.lepton2.flavour, self.lepton2.idx)?;
        Some((l1, l2))
    }
}

fn os_pairs<'a, L: PhysicsObject + 'a>(
    leptons: &'a [L],
    flavour: Flavour,
    charge: fn(&L) -> i32,
) -> impl Iterator<Item = ZCandidate> + 'a {
    leptons
        .iter()
        .enumerate()
        .tuple_combinations()
        .filter(move |((_, l1), (_, l2))| charge(l1) * charge(l2) < 0)
        .map(move |((i1, l1), (i2, l2))| {
            let mass = (l1.p4() + l2.p4()).m();
            let (lead, sublead) = if l2.pt() > l1.pt() { (i2, i1) } else { (i1, i2) };
            ZCandidate {
                lepton1: LeptonRef { flavour, idx: lead },
                lepton2: LeptonRef { flavour, idx: sublead },
                mass,
            }
        })
}

/// Find the same-flavour opposite-sign pair with mass closest to [Z_MASS]
///
/// Pairs are formed separately among the selected muons and among the
/// selected electrons. If several pairs are equally close, the first one
/// (muons before electrons) is chosen.
pub fn select_z_candidate(event: &SelectedEvent) -> Option<ZCandidate> {
    let muon_pairs = os_pairs(&event.sel_muons, Flavour::Muon, |m| m.charge);
    let electron_pairs =
        os_pairs(&event.sel_electrons, Flavour::Electron, |e| e.charge);
    muon_pairs
        .chain(electron_pairs)
        .min_by(|a, b| {
            (a.mass - Z_MASS).abs().total_cmp(&(b.mass - Z_MASS).abs())
        })
}

/// Keep events with a Z candidate
pub fn select_z_candidates(
    events: Vec<SelectedEvent>,
) -> Vec<(SelectedEvent, ZCandidate)> {
    let nevents = events.len();
    let res: Vec<_> = events
        .into_iter()
        .filter_map(|e| select_z_candidate(&e).map(|z| (e, z)))
        .collect();
    debug!("{} of {nevents} events with Z candidate", res.len());
    res
}
