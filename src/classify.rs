use log::{debug, info};
use strum::Display;
use thiserror::Error;

use crate::accumulator::{Checkpoint, StageAccumulator};
use crate::config::Config;
use crate::event::Event;
use crate::traits::GoldenRunFilter;

/// Analysis mode of a dataset
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Mode {
    Data,
    MCbackground,
    #[strum(serialize = "signal")]
    Signal,
}

/// Per-chunk state resolved by the classifier
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkContext {
    /// Dataset identity, with the run era removed for data
    pub dataset: String,
    pub mode: Mode,
    /// HNL mass in GeV, only for signal
    pub signal_mass: Option<f64>,
}

impl ChunkContext {
    pub fn is_data(&self) -> bool {
        self.mode == Mode::Data
    }
}

/// Parse the HNL mass from the dataset suffix after the last hyphen
pub fn parse_signal_mass(dataset: &str) -> Option<f64> {
    let (_, suffix) = dataset.rsplit_once('-')?;
    suffix.parse().ok()
}

#[derive(Debug, Error)]
pub enum ClassifyError<E> {
    #[error("Missing cross sections for simulated dataset {0}")]
    MissingXsecs(String),
    #[error("Cannot determine HNL mass from dataset name {0}")]
    InvalidSignalMass(String),
    #[error("Golden run selection failed: {0}")]
    GoldenRun(E),
}

/// Determine dataset identity and analysis mode
pub struct EventClassifier<'a, G> {
    config: &'a Config,
    golden_run_filter: &'a G,
}

impl<'a, G: GoldenRunFilter> EventClassifier<'a, G> {
    pub fn new(config: &'a Config, golden_run_filter: &'a G) -> Self {
        Self {
            config,
            golden_run_filter,
        }
    }

    /// Classify a chunk of events from the dataset `raw_dataset`
    ///
    /// Records the `init` checkpoint under the raw dataset name. For
    /// data, generator weights are set to one, only golden runs are kept,
    /// and the trailing run era is removed from the dataset identity.
    pub fn classify(
        &self,
        raw_dataset: &str,
        mut events: Vec<Event>,
        acc: &mut StageAccumulator,
    ) -> Result<(Vec<Event>, ChunkContext), ClassifyError<G::Error>> {
        info!("Processing: {raw_dataset}");
        let is_data = raw_dataset.contains(&self.config.data_hlt);
        if is_data {
            for event in &mut events {
                event.gen_weight = 1.;
            }
        }

        acc.record(Checkpoint::Init, raw_dataset, &events);

        let mut dataset = raw_dataset.to_owned();
        let mode = if is_data {
            events = self
                .golden_run_filter
                .filter(raw_dataset, events, self.config.period)
                .map_err(ClassifyError::GoldenRun)?;
            debug!("{} events in golden runs", events.len());
            // merge all run eras
            dataset.pop();
            Mode::Data
        } else if dataset.contains(&self.config.signal_marker) {
            Mode::Signal
        } else {
            Mode::MCbackground
        };
        info!("Analysis in mode {mode}");

        if mode != Mode::Data && self.config.xsecs.is_none() {
            return Err(ClassifyError::MissingXsecs(dataset));
        }
        let signal_mass = if mode == Mode::Signal {
            let mass = parse_signal_mass(&dataset)
                .ok_or_else(|| ClassifyError::InvalidSignalMass(dataset.clone()))?;
            Some(mass)
        } else {
            None
        };

        let ctx = ChunkContext {
            dataset,
            mode,
            signal_mass,
        };
        Ok((events, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::Period;

    struct OddLumis;

    impl GoldenRunFilter for OddLumis {
        type Error = std::convert::Infallible;

        fn filter(
            &self,
            _dataset: &str,
            mut events: Vec<Event>,
            _period: Period,
        ) -> Result<Vec<Event>, Self::Error> {
            events.retain(|e| e.luminosity_block % 2 == 1);
            Ok(events)
        }
    }

    fn config(with_xsecs: bool) -> Config {
        let cfg = Config::builder()
            .period(Period::Run2018)
            .tag("test")
            .data_hlt("SingleMuon")
            .stitched_list(vec![vec!["DY-50".to_owned()]]);
        if with_xsecs {
            cfg.xsecs([("DY-50".to_owned(), 6000.)].into()).build()
        } else {
            cfg.build()
        }
    }

    fn events() -> Vec<Event> {
        (0..4)
            .map(|n| Event {
                luminosity_block: n,
                gen_weight: 0.5,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn background() {
        let cfg = config(true);
        let classifier = EventClassifier::new(&cfg, &OddLumis);
        let mut acc = StageAccumulator::new();
        let (events, ctx) = classifier.classify("DY-50", events(), &mut acc).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(ctx.mode, Mode::MCbackground);
        assert_eq!(ctx.dataset, "DY-50");
        assert_eq!(ctx.signal_mass, None);
        let init = acc.get(Checkpoint::Init, "DY-50");
        assert_eq!(init.n_ev, 4);
        assert_eq!(init.sumw, 2.);
    }

    #[test]
    fn signal() {
        let cfg = config(true);
        let classifier = EventClassifier::new(&cfg, &OddLumis);
        let mut acc = StageAccumulator::new();
        let (_, ctx) = classifier.classify("HNL-20", events(), &mut acc).unwrap();
        assert_eq!(ctx.mode, Mode::Signal);
        assert_eq!(ctx.signal_mass, Some(20.));
        assert_eq!(ctx.mode.to_string(), "signal");
    }

    #[test]
    fn signal_mass_suffix() {
        assert_eq!(parse_signal_mass("HNL_tau-1p0-500"), Some(500.));
        assert_eq!(parse_signal_mass("HNL-85"), Some(85.));
        assert_eq!(parse_signal_mass("HNL"), None);
    }

    #[test]
    fn data() {
        let cfg = config(false);
        let classifier = EventClassifier::new(&cfg, &OddLumis);
        let mut acc = StageAccumulator::new();
        let (events, ctx) = classifier
            .classify("SingleMuon_2018B", events(), &mut acc)
            .unwrap();
        assert_eq!(ctx.mode, Mode::Data);
        assert_eq!(ctx.dataset, "SingleMuon_2018");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.gen_weight == 1.));
        // init is counted before golden runs under the raw name
        let init = acc.get(Checkpoint::Init, "SingleMuon_2018B");
        assert_eq!(init.n_ev, 4);
        assert_eq!(init.sumw, 4.);
        assert_eq!(acc.get(Checkpoint::Init, "SingleMuon_2018").n_ev, 0);
    }

    #[test]
    fn missing_xsecs() {
        let cfg = config(false);
        let classifier = EventClassifier::new(&cfg, &OddLumis);
        let mut acc = StageAccumulator::new();
        let res = classifier.classify("DY-50", events(), &mut acc);
        assert!(matches!(res, Err(ClassifyError::MissingXsecs(ds)) if ds == "DY-50"));
    }

    #[test]
    fn invalid_signal_mass() {
        let cfg = config(true);
        let classifier = EventClassifier::new(&cfg, &OddLumis);
        let mut acc = StageAccumulator::new();
        let res = classifier.classify("HNL-heavy", events(), &mut acc);
        assert!(matches!(res, Err(ClassifyError::InvalidSignalMass(_))));
    }
}
