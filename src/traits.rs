use std::path::{Path, PathBuf};

use crate::anatuple::Anatuple;
use crate::config::{CrossSections, Period, StitchingTable};
use crate::event::{Event, Tau};
use crate::tau_es::TauEsFactors;

/// Keep only events from certified luminosity blocks
pub trait GoldenRunFilter {
    type Error;

    fn filter(
        &self,
        dataset: &str,
        events: Vec<Event>,
        period: Period,
    ) -> Result<Vec<Event>, Self::Error>;
}

/// Rescale generator weights of simulated events
///
/// After reweighting, the sum of weights corresponds to the expected
/// number of events for the integrated luminosity of `period`.
pub trait Reweight {
    type Error;

    fn reweight(
        &self,
        dataset: &str,
        events: Vec<Event>,
        stitching: &StitchingTable,
        data_hlt: &str,
        xsecs: &CrossSections,
        period: Period,
    ) -> Result<Vec<Event>, Self::Error>;
}

/// Remove events failing MET quality requirements
pub trait MetFilter {
    type Error;

    fn filter(&self, events: Vec<Event>) -> Result<Vec<Event>, Self::Error>;
}

/// Provide tau energy scale factors
pub trait TauEnergyCorrection {
    type Error;

    /// One set of factors for each tau in `taus`, in the same order
    fn factors(
        &self,
        taus: &[Tau],
        period: Period,
    ) -> Result<Vec<TauEsFactors>, Self::Error>;
}

/// Persist an anatuple
pub trait WriteAnatuple {
    type Error;

    /// Write `record` into directory `dir`
    ///
    /// The file name starts with `stem`, followed by the smallest
    /// numeric suffix that does not clash with an existing file.
    /// Returns the path of the written file.
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        record: &Anatuple,
        tree_name: &str,
    ) -> Result<PathBuf, Self::Error>;
}
