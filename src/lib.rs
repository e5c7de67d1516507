//! `hnl_anatuple` selects events for heavy neutral lepton searches in the
//! channels with a Z boson candidate and a third light lepton.
//!
//! # How to use
//!
//! Set up a [processor::Processor] with a [config::Config] and the
//! collaborators defined in [traits], then feed it chunks of events. Each
//! chunk yields an anatuple file and the event counts at each selection
//! stage.
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [processor] lists the steps that are performed for each chunk
//! - [config] for the analysis configuration and object selection cuts
//! - [event] for the input event format
//! - [anatuple] and [writer] for the output
//! - [accumulator] for event counts
//!

/// Event counts at selection stages
pub mod accumulator;
/// Flat output records
pub mod anatuple;
/// Analysis channels
pub mod channel;
/// Dataset classification
pub mod classify;
/// Output compression
pub mod compression;
/// Analysis configuration
pub mod config;
/// Collision event format
pub mod event;
/// Four-vector class
pub mod four_vector;
/// Certified luminosity blocks
pub mod golden_run;
/// MET filters
pub mod met_filter;
/// Most important exports
pub mod prelude;
pub mod processor;
/// Event chunk reader
pub mod reader;
/// Normalisation of simulated events
pub mod reweight;
/// Baseline object selection
pub mod selection;
/// Tau energy scale corrections
pub mod tau_es;
/// Third lepton selection
pub mod third_lepton;
/// Common traits
pub mod traits;
/// Systematic variations of the tau energy scale
pub mod variation;
/// Anatuple writer
pub mod writer;
/// Z boson candidates
pub mod z_candidate;

use lazy_static::lazy_static;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
lazy_static! {
    pub static ref VERSION_MAJOR: u32 =
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 =
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 =
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
}
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
