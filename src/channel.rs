use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::event::{Flavour, Lepton, SelectedEvent};
use crate::third_lepton::select_third_lepton;
use crate::z_candidate::{select_z_candidate, ZCandidate};

/// Analysis channel, named after the flavour of the third lepton
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
pub enum Channel {
    /// Z boson candidate plus an electron
    Ze,
    /// Z boson candidate plus a muon
    Zmu,
}

impl Channel {
    /// Flavour of the third lepton
    pub fn target_flavour(self) -> Flavour {
        match self {
            Channel::Ze => Flavour::Electron,
            Channel::Zmu => Flavour::Muon,
        }
    }

    /// Prefix of the third lepton columns in the output
    pub fn third_lepton_prefix(self) -> &'static str {
        match self {
            Channel::Ze => "Electron",
            Channel::Zmu => "Muon",
        }
    }

    /// Whether there are enough selected leptons for this channel
    ///
    /// We need either a pair of the other flavour plus one lepton of the
    /// target flavour, or three leptons of the target flavour.
    pub fn passes_prefilter(self, event: &SelectedEvent) -> bool {
        let target = self.target_flavour();
        let other = match target {
            Flavour::Electron => Flavour::Muon,
            Flavour::Muon => Flavour::Electron,
        };
        let ntarget = event.nleptons(target);
        (event.nleptons(other) >= 2 && ntarget >= 1) || ntarget >= 3
    }
}

/// A selected event with a Z candidate and a third lepton
#[derive(Clone, Debug, PartialEq)]
pub struct FinalState {
    pub event: SelectedEvent,
    pub pair: ZCandidate,
    /// Index of the third lepton in the selected collection of the
    /// channel's flavour
    pub third: usize,
    pub channel: Channel,
}

impl FinalState {
    pub fn third_lepton(&self) -> Option<Lepton<'_>> {
        self.event.lepton(self.channel.target_flavour(), self.third)
    }
}

/// Reduce selected events to the final states of `channel`
pub fn select_final_states(
    channel: Channel,
    events: Vec<SelectedEvent>,
) -> Vec<FinalState> {
    let nevents = events.len();
    let target = channel.target_flavour();
    let mut npassed_prefilter = 0;
    let mut npair = 0;
    let res: Vec<_> = events
        .into_iter()
        .filter(|e| channel.passes_prefilter(e))
        .inspect(|_| npassed_prefilter += 1)
        .filter_map(|event| {
            let pair = select_z_candidate(&event)?;
            npair += 1;
            let third = select_third_lepton(&event, &pair, target)?;
            Some(FinalState {
                event,
                pair,
                third,
                channel,
            })
        })
        .collect();
    debug!(
        "{channel}: {npassed_prefilter} of {nevents} events pass lepton multiplicity, {npair} with Z candidate, {} with third lepton",
        res.len()
    );
    res
}
