use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accumulator::{Checkpoint, StageAccumulator};
use crate::classify::ChunkContext;
use crate::config::{Config, CrossSections, Period, StitchingTable};
use crate::event::Event;
use crate::traits::Reweight;

/// Apply the reweighting to simulated events and record the `reweight`
/// checkpoint
///
/// The checkpoint is recorded for all modes, the weights are only changed
/// for simulation.
pub fn reweight_stage<R: Reweight>(
    config: &Config,
    ctx: &ChunkContext,
    reweighter: &R,
    events: Vec<Event>,
    acc: &mut StageAccumulator,
) -> Result<Vec<Event>, ReweightStageError<R::Error>> {
    let events = if ctx.is_data() {
        events
    } else {
        let xsecs = config
            .xsecs
            .as_ref()
            .ok_or_else(|| ReweightStageError::MissingXsecs(ctx.dataset.clone()))?;
        reweighter
            .reweight(
                &ctx.dataset,
                events,
                &config.stitched_list,
                &config.data_hlt,
                xsecs,
                config.period,
            )
            .map_err(ReweightStageError::Reweight)?
    };
    acc.record(Checkpoint::Reweight, &ctx.dataset, &events);
    debug!("{} events after reweighting", events.len());
    Ok(events)
}

#[derive(Debug, Error)]
pub enum ReweightStageError<E> {
    #[error("Missing cross sections for simulated dataset {0}")]
    MissingXsecs(String),
    #[error("Failed to reweight events: {0}")]
    Reweight(E),
}

/// Normalise simulated events to luminosity times cross section
///
/// Each generator weight is multiplied by `L σ / Σw`, where `Σw` is the
/// sum of generator weights of the full dataset. For datasets in a
/// stitched group, the sum runs over all datasets of the group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LumiXsecReweighter {
    /// Integrated luminosity in pb^-1 per period
    luminosity: BTreeMap<Period, f64>,
    /// Total sum of generator weights per dataset
    sum_gen_weights: BTreeMap<String, f64>,
}

impl LumiXsecReweighter {
    pub fn new(
        luminosity: BTreeMap<Period, f64>,
        sum_gen_weights: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            luminosity,
            sum_gen_weights,
        }
    }

    fn sum_weights(
        &self,
        dataset: &str,
        stitching: &StitchingTable,
    ) -> Result<f64, ReweightError> {
        let group = stitching
            .iter()
            .find(|group| group.iter().any(|ds| ds == dataset));
        let lookup = |ds: &str| {
            self.sum_gen_weights
                .get(ds)
                .copied()
                .ok_or_else(|| ReweightError::MissingSumWeights(ds.to_owned()))
        };
        match group {
            Some(group) => group.iter().map(|ds| lookup(ds)).sum(),
            None => lookup(dataset),
        }
    }
}

impl Reweight for LumiXsecReweighter {
    type Error = ReweightError;

    fn reweight(
        &self,
        dataset: &str,
        mut events: Vec<Event>,
        stitching: &StitchingTable,
        _data_hlt: &str,
        xsecs: &CrossSections,
        period: Period,
    ) -> Result<Vec<Event>, Self::Error> {
        use ReweightError::*;

        let xsec = *xsecs
            .get(dataset)
            .ok_or_else(|| MissingXsec(dataset.to_owned()))?;
        let lumi = *self
            .luminosity
            .get(&period)
            .ok_or(MissingLuminosity(period))?;
        let sumw = self.sum_weights(dataset, stitching)?;
        if sumw == 0. {
            return Err(ZeroSumWeights(dataset.to_owned()));
        }
        let norm = lumi * xsec / sumw;
        debug!("Normalisation factor for {dataset}: {norm:e}");
        for event in &mut events {
            event.gen_weight *= norm;
        }
        Ok(events)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReweightError {
    #[error("No cross section for dataset {0}")]
    MissingXsec(String),
    #[error("No integrated luminosity for period {0}")]
    MissingLuminosity(Period),
    #[error("No sum of generator weights for dataset {0}")]
    MissingSumWeights(String),
    #[error("Sum of generator weights vanishes for dataset {0}")]
    ZeroSumWeights(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::Mode;

    fn reweighter() -> LumiXsecReweighter {
        LumiXsecReweighter::new(
            [(Period::Run2018, 100.)].into(),
            [
                ("DY-50".to_owned(), 50.),
                ("DY1J-50".to_owned(), 150.),
                ("TT".to_owned(), 10.),
            ]
            .into(),
        )
    }

    fn events(n: usize) -> Vec<Event> {
        vec![
            Event {
                gen_weight: 2.,
                ..Default::default()
            };
            n
        ]
    }

    fn config() -> Config {
        Config::builder()
            .period(Period::Run2018)
            .tag("test")
            .data_hlt("SingleMuon")
            .stitched_list(vec![vec!["DY-50".to_owned(), "DY1J-50".to_owned()]])
            .xsecs([("DY-50".to_owned(), 4.), ("TT".to_owned(), 1.)].into())
            .build()
    }

    #[test]
    fn normalisation() {
        let cfg = config();
        let xsecs = cfg.xsecs.as_ref().unwrap();
        let rw = reweighter();
        let ev = rw
            .reweight("TT", events(1), &cfg.stitched_list, "", xsecs, Period::Run2018)
            .unwrap();
        assert_eq!(ev[0].gen_weight, 2. * 100. * 1. / 10.);

        // stitched: normalised to the sum over the whole group
        let ev = rw
            .reweight("DY-50", events(1), &cfg.stitched_list, "", xsecs, Period::Run2018)
            .unwrap();
        assert_eq!(ev[0].gen_weight, 2. * 100. * 4. / 200.);
    }

    #[test]
    fn missing_inputs() {
        let cfg = config();
        let xsecs = cfg.xsecs.as_ref().unwrap();
        let rw = reweighter();
        let err = rw
            .reweight("WJets", events(1), &cfg.stitched_list, "", xsecs, Period::Run2018)
            .unwrap_err();
        assert_eq!(err, ReweightError::MissingXsec("WJets".to_owned()));
        let err = rw
            .reweight("TT", events(1), &cfg.stitched_list, "", xsecs, Period::Run2017)
            .unwrap_err();
        assert_eq!(err, ReweightError::MissingLuminosity(Period::Run2017));
    }

    #[test]
    fn stage_records_checkpoint() {
        let cfg = config();
        let rw = reweighter();
        let mut acc = StageAccumulator::new();
        let mc = ChunkContext {
            dataset: "TT".to_owned(),
            mode: Mode::MCbackground,
            signal_mass: None,
        };
        let ev = reweight_stage(&cfg, &mc, &rw, events(3), &mut acc).unwrap();
        assert_eq!(ev.len(), 3);
        let count = acc.get(Checkpoint::Reweight, "TT");
        assert_eq!(count.n_ev, 3);
        assert_eq!(count.sumw, 3. * 20.);

        // data is counted, but not reweighted
        let data = ChunkContext {
            dataset: "SingleMuon_2018".to_owned(),
            mode: Mode::Data,
            signal_mass: None,
        };
        let ev = reweight_stage(&cfg, &data, &rw, events(2), &mut acc).unwrap();
        assert!(ev.iter().all(|e| e.gen_weight == 2.));
        assert_eq!(acc.get(Checkpoint::Reweight, "SingleMuon_2018").n_ev, 2);
    }

    #[test]
    fn empty_chunk() {
        let cfg = config();
        let mut acc = StageAccumulator::new();
        let mc = ChunkContext {
            dataset: "TT".to_owned(),
            mode: Mode::MCbackground,
            signal_mass: None,
        };
        let ev = reweight_stage(&cfg, &mc, &reweighter(), Vec::new(), &mut acc).unwrap();
        assert!(ev.is_empty());
        assert_eq!(acc.get(Checkpoint::Reweight, "TT").n_ev, 0);
    }
}
