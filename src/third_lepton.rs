use log::trace;

use crate::event::{Flavour, SelectedEvent};
use crate::four_vector::delta_r;
use crate::z_candidate::{LeptonRef, ZCandidate};

/// Minimum distance between the third lepton and each pair member
pub const MIN_DELTA_R: f64 = 0.5;

/// Find the most isolated lepton of flavour `flavour` away from the pair
///
/// Candidates are the selected leptons of the requested flavour that are
/// not part of the Z candidate and are separated by more than
/// [MIN_DELTA_R] from both pair members. Returns the index of the
/// candidate with the smallest relative isolation, the first one if there
/// are several.
pub fn select_third_lepton(
    event: &SelectedEvent,
    z: &ZCandidate,
    flavour: Flavour,
) -> Option<usize> {
    let (l1, l2) = z.leptons(event)?;
    (0..event.nleptons(flavour))
        .filter(|&idx| !z.contains(LeptonRef { flavour, idx }))
        .filter_map(|idx| event.lepton(flavour, idx).map(|l| (idx, l)))
        .filter(|(_, l)| {
            delta_r(l.eta(), l.phi(), l1.eta(), l1.phi()) > MIN_DELTA_R
                && delta_r(l.eta(), l.phi(), l2.eta(), l2.phi()) > MIN_DELTA_R
        })
        .min_by(|(_, a), (_, b)| a.rel_iso().total_cmp(&b.rel_iso()))
        .map(|(idx, _)| idx)
}

/// Keep events with a third lepton, together with its index
pub fn select_third_leptons(
    candidates: Vec<(SelectedEvent, ZCandidate)>,
    flavour: Flavour,
) -> Vec<(SelectedEvent, ZCandidate, usize)> {
    candidates
        .into_iter()
        .filter_map(|(event, z)| {
            let third = select_third_lepton(&event, &z, flavour);
            if third.is_none() {
                trace!("No third lepton in event {}", event.event.event);
            }
            third.map(|idx| (event, z, idx))
        })
        .collect()
}
