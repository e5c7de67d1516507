use std::convert::From;
use std::path::PathBuf;

use log::{debug, info};
use thiserror::Error;

use crate::accumulator::StageAccumulator;
use crate::anatuple::Anatuple;
use crate::channel::{select_final_states, Channel};
use crate::classify::{ChunkContext, ClassifyError, EventClassifier};
use crate::config::{Config, ConfigError};
use crate::event::Event;
use crate::met_filter::met_filter_stage;
use crate::reweight::{reweight_stage, ReweightStageError};
use crate::selection::ObjectSelector;
use crate::traits::*;

/// Assemble a [Processor] from its configuration and collaborators
#[derive(Clone, Debug)]
pub struct ProcessorBuilder<G, R, M, T, W> {
    pub config: Config,
    pub channel: Channel,
    pub golden_run_filter: G,
    pub reweighter: R,
    pub met_filter: M,
    pub tau_es: T,
    pub writer: W,
}

impl<G, R, M, T, W> ProcessorBuilder<G, R, M, T, W> {
    /// Validate the configuration and construct the processor
    pub fn build(self) -> Result<Processor<G, R, M, T, W>, ConfigError> {
        Ok(Processor {
            config: self.config.validate()?,
            channel: self.channel,
            golden_run_filter: self.golden_run_filter,
            reweighter: self.reweighter,
            met_filter: self.met_filter,
            tau_es: self.tau_es,
            writer: self.writer,
        })
    }
}

impl<G, R, M, T, W> From<Processor<G, R, M, T, W>>
    for ProcessorBuilder<G, R, M, T, W>
{
    fn from(p: Processor<G, R, M, T, W>) -> Self {
        ProcessorBuilder {
            config: p.config,
            channel: p.channel,
            golden_run_filter: p.golden_run_filter,
            reweighter: p.reweighter,
            met_filter: p.met_filter,
            tau_es: p.tau_es,
            writer: p.writer,
        }
    }
}

/// Event selection for one channel
///
/// Each call to [Processor::process] handles one chunk of events:
///
/// 1. Classify the dataset, selecting golden runs for data
/// 2. Normalise simulated events
/// 3. Apply the MET filters
/// 4. Select taus, muons, and electrons, correcting the tau energy scale
/// 5. Find a Z boson candidate and a third lepton
/// 6. Write the anatuple
#[derive(Clone, Debug)]
pub struct Processor<G, R, M, T, W> {
    config: Config,
    channel: Channel,
    golden_run_filter: G,
    reweighter: R,
    met_filter: M,
    tau_es: T,
    writer: W,
}

/// Result of processing a single chunk
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkOutput {
    /// Event counts of this chunk
    pub accumulator: StageAccumulator,
    pub ctx: ChunkContext,
    /// Path of the written anatuple
    pub path: PathBuf,
    /// Number of events in the anatuple
    pub nselected: usize,
}

#[derive(Debug, Error)]
pub enum ProcessError<E1, E2, E3, E4, E5> {
    #[error("Failed to classify events: {0}")]
    ClassifyErr(ClassifyError<E1>),
    #[error("Reweighting error: {0}")]
    ReweightErr(ReweightStageError<E2>),
    #[error("MET filter error: {0}")]
    MetFilterErr(E3),
    #[error("Tau energy scale error: {0}")]
    TauEsErr(E4),
    #[error("Failed to write anatuple: {0}")]
    WriteErr(E5),
}

impl<G, R, M, T, W> Processor<G, R, M, T, W>
where
    G: GoldenRunFilter,
    R: Reweight,
    M: MetFilter,
    T: TauEnergyCorrection,
    W: WriteAnatuple,
{
    /// Process a chunk of events from the dataset `raw_dataset`
    pub fn process(
        &self,
        raw_dataset: &str,
        events: Vec<Event>,
    ) -> Result<
        ChunkOutput,
        ProcessError<G::Error, R::Error, M::Error, T::Error, W::Error>,
    > {
        use ProcessError::*;

        let config = &self.config;
        let mut acc = StageAccumulator::new();

        let classifier = EventClassifier::new(config, &self.golden_run_filter);
        let (events, ctx) = classifier
            .classify(raw_dataset, events, &mut acc)
            .map_err(ClassifyErr)?;

        let events =
            reweight_stage(config, &ctx, &self.reweighter, events, &mut acc)
                .map_err(ReweightErr)?;

        let events = met_filter_stage(&ctx, &self.met_filter, events, &mut acc)
            .map_err(MetFilterErr)?;

        let selector = ObjectSelector::new(config, &ctx, &self.tau_es);
        let events = selector.select_all(events).map_err(TauEsErr)?;

        let states = select_final_states(self.channel, events);
        let record = Anatuple::assemble(self.channel, &ctx, &states);

        let dir = self.output_dir(&ctx);
        let stem = format!("{}_anatuple", ctx.dataset);
        debug!("Writing {} events to {dir:?}", record.len());
        let path = self
            .writer
            .write(&dir, &stem, &record, &config.tree_name())
            .map_err(WriteErr)?;
        info!("{}: {} selected events in {path:?}", ctx.dataset, record.len());

        Ok(ChunkOutput {
            accumulator: acc,
            ctx,
            path,
            nselected: record.len(),
        })
    }
}

impl<G, R, M, T, W> Processor<G, R, M, T, W> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Output directory for anatuples of the dataset in `ctx`
    pub fn output_dir(&self, ctx: &ChunkContext) -> PathBuf {
        self.config
            .output_dir
            .join(self.config.period.to_string())
            .join(&self.config.tag)
            .join(self.channel.to_string())
            .join(&ctx.dataset)
    }
}
