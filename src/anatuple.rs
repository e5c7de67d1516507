use std::collections::BTreeMap;

use itertools::Itertools;
use particle_id::sm_elementary_particles::muon;

use crate::channel::{Channel, FinalState};
use crate::classify::ChunkContext;
use crate::event::{Electron, Lepton, Muon, PhysicsObject, Value};

/// Third lepton fields that are not written
const THIRD_LEPTON_SKIPPED_FIELDS: [&str; 1] = ["genPartIdx"];

/// Flat output record with one row per final state
///
/// Missing entries are `None`. This happens for the pair leptons, where
/// each member only fills the fields native to its own type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Anatuple {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

/// Union of muon and electron fields, muon fields first
pub fn pair_lepton_fields() -> Vec<&'static str> {
    Muon::FIELD_NAMES
        .iter()
        .chain(Electron::FIELD_NAMES)
        .copied()
        .unique()
        .collect()
}

fn third_lepton_fields(channel: Channel) -> Vec<&'static str> {
    let names = match channel {
        Channel::Ze => Electron::FIELD_NAMES,
        Channel::Zmu => Muon::FIELD_NAMES,
    };
    names
        .iter()
        .copied()
        .filter(|f| !THIRD_LEPTON_SKIPPED_FIELDS.contains(f))
        .collect()
}

fn lepton_values(
    lepton: Option<Lepton<'_>>,
    names: &[&'static str],
) -> Vec<Option<Value>> {
    let values: BTreeMap<_, _> =
        lepton.map(|l| l.fields()).unwrap_or_default().into_iter().collect();
    names.iter().map(|name| values.get(name).copied()).collect()
}

impl Anatuple {
    /// Assemble the output record for the final states of one chunk
    pub fn assemble(
        channel: Channel,
        ctx: &ChunkContext,
        states: &[FinalState],
    ) -> Self {
        let pair_fields = pair_lepton_fields();
        let third_fields = third_lepton_fields(channel);

        let mut header: Vec<String> = [
            "event",
            "genWeight",
            "luminosityBlock",
            "run",
            "MET_pt",
            "MET_phi",
            "IsLeptonPairMuons",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        if ctx.signal_mass.is_some() {
            header.push("HNLmass".to_owned());
        }
        for prefix in ["Lepton1", "Lepton2"] {
            header.extend(pair_fields.iter().map(|f| format!("{prefix}_{f}")));
        }
        let prefix = channel.third_lepton_prefix();
        header.extend(third_fields.iter().map(|f| format!("{prefix}_{f}")));

        let rows = states
            .iter()
            .map(|state| {
                let ev = &state.event.event;
                let (l1, l2) = match state.pair.leptons(&state.event) {
                    Some((l1, l2)) => (Some(l1), Some(l2)),
                    None => (None, None),
                };
                let is_muon_pair =
                    l1.map(|l| l.particle_id().abs() == muon).unwrap_or(false);
                let mut row: Vec<Option<Value>> = vec![
                    Some(ev.event.into()),
                    Some(ev.gen_weight.into()),
                    Some(ev.luminosity_block.into()),
                    Some(ev.run.into()),
                    Some(ev.met.pt.into()),
                    Some(ev.met.phi.into()),
                    Some(is_muon_pair.into()),
                ];
                if let Some(mass) = ctx.signal_mass {
                    row.push(Some(mass.into()));
                }
                row.extend(lepton_values(l1, &pair_fields));
                row.extend(lepton_values(l2, &pair_fields));
                row.extend(lepton_values(state.third_lepton(), &third_fields));
                debug_assert_eq!(row.len(), header.len());
                row
            })
            .collect();

        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All entries of the column `name`
    pub fn column(&self, name: &str) -> Option<Vec<Option<Value>>> {
        let idx = self.header.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}
