use log::{debug, trace};

use crate::classify::ChunkContext;
use crate::config::{Config, Cuts, Period, TauIdAccessors};
use crate::event::{Event, SelectedEvent};
use crate::tau_es::correct_taus;
use crate::traits::TauEnergyCorrection;
use crate::variation::TauEsVariation;

/// Baseline selection of taus, muons, and electrons
pub struct ObjectSelector<'a, T> {
    cuts: &'a Cuts,
    tau_ids: TauIdAccessors,
    period: Period,
    variation: Option<&'a TauEsVariation>,
    apply_tau_es: bool,
    tau_es: &'a T,
}

impl<'a, T: TauEnergyCorrection> ObjectSelector<'a, T> {
    pub fn new(config: &'a Config, ctx: &ChunkContext, tau_es: &'a T) -> Self {
        let apply_tau_es = !ctx.is_data();
        if !apply_tau_es && config.tau_es_variation.is_some() {
            debug!("Ignoring tau energy scale variation for data");
        }
        Self {
            cuts: &config.cuts,
            tau_ids: config.tau_id_version().accessors(),
            period: config.period,
            variation: config.tau_es_variation.as_ref(),
            apply_tau_es,
            tau_es,
        }
    }

    /// Select the objects of a single event
    ///
    /// The transverse momentum cut on taus is applied after the energy
    /// correction.
    pub fn select(&self, event: Event) -> Result<SelectedEvent, T::Error> {
        let cuts = self.cuts;
        let mut sel_taus: Vec<_> = event
            .taus
            .iter()
            .filter(|t| cuts.pass_tau_id(t, &self.tau_ids))
            .cloned()
            .collect();
        let sel_muons = event
            .muons
            .iter()
            .filter(|m| cuts.pass_muon(m))
            .cloned()
            .collect();
        let sel_electrons = event
            .electrons
            .iter()
            .filter(|e| cuts.pass_electron(e))
            .cloned()
            .collect();

        let mut event = event;
        if self.apply_tau_es {
            let factors = self.tau_es.factors(&sel_taus, self.period)?;
            let shift = correct_taus(
                &mut sel_taus,
                &factors,
                self.variation,
                &mut event.met,
            );
            if shift != 0. {
                trace!("MET shift {shift} in event {}", event.event);
            }
        }
        sel_taus.retain(|t| cuts.pass_tau_pt(t));

        Ok(SelectedEvent {
            event,
            sel_taus,
            sel_muons,
            sel_electrons,
        })
    }

    pub fn select_all(
        &self,
        events: Vec<Event>,
    ) -> Result<Vec<SelectedEvent>, T::Error> {
        let selected: Vec<_> = events
            .into_iter()
            .map(|e| self.select(e))
            .collect::<Result<_, _>>()?;
        debug!(
            "Selected {} taus, {} muons, {} electrons in {} events",
            selected.iter().map(|e| e.sel_taus.len()).sum::<usize>(),
            selected.iter().map(|e| e.sel_muons.len()).sum::<usize>(),
            selected.iter().map(|e| e.sel_electrons.len()).sum::<usize>(),
            selected.len()
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::Mode;
    use crate::event::{Electron, Met, Muon, Tau};
    use crate::tau_es::TauEsFactors;

    /// Scale all taus by 1.1, up variation 1.2, down variation 1.0
    struct FixedScale;

    impl TauEnergyCorrection for FixedScale {
        type Error = std::convert::Infallible;

        fn factors(
            &self,
            taus: &[Tau],
            _period: Period,
        ) -> Result<Vec<TauEsFactors>, Self::Error> {
            let f = TauEsFactors {
                nominal: 1.1,
                up: 1.2,
                down: 1.0,
            };
            Ok(vec![f; taus.len()])
        }
    }

    fn config(variation: Option<&str>) -> Config {
        let mut cfg = Config::builder()
            .period(Period::Run2018)
            .tag("test")
            .data_hlt("SingleMuon")
            .stitched_list(vec![vec!["DY-50".to_owned()]])
            .xsecs(Default::default())
            .build();
        cfg.tau_es_variation = variation.map(|v| v.parse().unwrap());
        cfg
    }

    fn ctx(mode: Mode) -> ChunkContext {
        ChunkContext {
            dataset: "DY-50".to_owned(),
            mode,
            signal_mass: None,
        }
    }

    fn good_tau(pt: f64) -> Tau {
        Tau {
            pt,
            mass: 1.,
            eta: 1.,
            dz: 0.05,
            decay_mode: 1,
            gen_part_flav: 5,
            id_deep_tau2018v2p5_vs_e: 2,
            id_deep_tau2018v2p5_vs_mu: 4,
            id_deep_tau2018v2p5_vs_jet: 5,
            ..Default::default()
        }
    }

    fn good_muon() -> Muon {
        Muon {
            pt: 20.,
            eta: -1.,
            dxy: 0.01,
            dz: 0.1,
            medium_id: true,
            pf_rel_iso03_all: 0.1,
            pdg_id: 13,
            charge: -1,
            ..Default::default()
        }
    }

    fn good_electron() -> Electron {
        Electron {
            pt: 20.,
            eta: 2.,
            dxy: -0.01,
            dz: -0.1,
            mva_no_iso_wp90: true,
            pf_rel_iso03_all: 0.3,
            pdg_id: -11,
            charge: 1,
            ..Default::default()
        }
    }

    fn event() -> Event {
        Event {
            met: Met { pt: 40., phi: 0. },
            taus: vec![
                good_tau(19.),
                good_tau(30.),
                Tau { decay_mode: 5, ..good_tau(30.) },
                Tau { id_deep_tau2018v2p5_vs_mu: 3, ..good_tau(30.) },
                // only passes with the 2017 discriminants
                Tau {
                    id_deep_tau2017v2p1_vs_e: 2,
                    id_deep_tau2017v2p1_vs_mu: 4,
                    id_deep_tau2017v2p1_vs_jet: 2,
                    id_deep_tau2018v2p5_vs_jet: 1,
                    ..good_tau(30.)
                },
            ],
            muons: vec![
                good_muon(),
                Muon { medium_id: false, ..good_muon() },
                Muon { eta: 2.45, ..good_muon() },
                Muon { pt: 10., ..good_muon() },
                Muon { dxy: -0.05, ..good_muon() },
            ],
            electrons: vec![
                good_electron(),
                Electron { mva_no_iso_wp90: false, ..good_electron() },
                Electron { pf_rel_iso03_all: 0.4, ..good_electron() },
                Electron { dz: 0.2, ..good_electron() },
                Electron { eta: 2.45, ..good_electron() },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn baseline_cuts() {
        let cfg = config(None);
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::MCbackground), &FixedScale);
        let sel = selector.select(event()).unwrap();
        assert_eq!(sel.sel_muons, vec![good_muon()]);
        assert_eq!(
            sel.sel_electrons,
            vec![good_electron(), Electron { eta: 2.45, ..good_electron() }]
        );
        // 19 GeV tau passes after the correction
        assert_eq!(sel.sel_taus.len(), 2);
        assert_eq!(sel.sel_taus[0].pt, 19. * 1.1);
        assert_eq!(sel.sel_taus[1].pt, 30. * 1.1);
        assert_eq!(sel.event.met.pt, 40.);
        // the original collections are kept
        assert_eq!(sel.event.taus.len(), 5);
        assert_eq!(sel.event.taus[0].pt, 19.);
    }

    #[test]
    fn data_is_not_corrected() {
        let cfg = config(Some("GenuineTauES_DM1_up"));
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::Data), &FixedScale);
        let sel = selector.select(event()).unwrap();
        assert_eq!(sel.sel_taus.len(), 1);
        assert_eq!(sel.sel_taus[0].pt, 30.);
        assert_eq!(sel.event.met.pt, 40.);
    }

    #[test]
    fn variation_moves_met() {
        let cfg = config(Some("Events_GenuineTauES_DM1_up"));
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::Signal), &FixedScale);
        let sel = selector.select(event()).unwrap();
        assert_eq!(sel.sel_taus[0].pt, 19. * 1.2);
        assert_eq!(sel.sel_taus[1].pt, 30. * 1.2);
        let shift = (19. * 1.2 - 19. * 1.1) + (30. * 1.2 - 30. * 1.1);
        assert!((sel.event.met.pt - (40. - shift)).abs() < 1e-12);
    }

    #[test]
    fn older_discriminants() {
        let mut cfg = config(None);
        cfg.period = Period::Run2017;
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::MCbackground), &FixedScale);
        let sel = selector.select(event()).unwrap();
        assert_eq!(sel.sel_taus.len(), 1);
        assert_eq!(sel.sel_taus[0].id_deep_tau2017v2p1_vs_mu, 4);
    }

    #[test]
    fn reselection_is_idempotent() {
        let cfg = config(None);
        let cuts = &cfg.cuts;
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::MCbackground), &FixedScale);
        let sel = selector.select(event()).unwrap();

        let muons: Vec<_> = sel.sel_muons.iter().filter(|m| cuts.pass_muon(m)).cloned().collect();
        assert_eq!(muons, sel.sel_muons);
        let electrons: Vec<_> = sel
            .sel_electrons
            .iter()
            .filter(|e| cuts.pass_electron(e))
            .cloned()
            .collect();
        assert_eq!(electrons, sel.sel_electrons);
        let ids = cfg.tau_id_version().accessors();
        let taus: Vec<_> = sel
            .sel_taus
            .iter()
            .filter(|t| cuts.pass_tau_id(t, &ids) && cuts.pass_tau_pt(t))
            .cloned()
            .collect();
        assert_eq!(taus, sel.sel_taus);
    }

    #[test]
    fn empty_batch() {
        let cfg = config(None);
        let selector = ObjectSelector::new(&cfg, &ctx(Mode::MCbackground), &FixedScale);
        assert!(selector.select_all(Vec::new()).unwrap().is_empty());
    }
}
