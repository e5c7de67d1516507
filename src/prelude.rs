pub use crate::{
    accumulator::{Checkpoint, StageAccumulator},
    anatuple::Anatuple,
    channel::Channel,
    config::{Config, Period},
    event::Event,
    golden_run::GoldenJson,
    met_filter::StandardMetFilters,
    processor::{ChunkOutput, Processor, ProcessorBuilder},
    reader::EventChunk,
    reweight::LumiXsecReweighter,
    tau_es::TauEsTable,
    traits::*,
    variation::TauEsVariation,
    writer::TsvWriter,
};
