mod job;
mod opt;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::job::{DefaultProcessor, JobConfig};
use crate::opt::Opt;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use hnl_anatuple::prelude::*;
use hnl_anatuple::{GIT_BRANCH, GIT_REV, VERSION};
use log::{debug, info};
use rayon::prelude::*;

fn main() -> Result<()> {
    let args = argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")?;
    let opt = Opt::parse_from(args).validate()?;

    let env = Env::default().filter_or("HNL_LOG", &opt.loglevel);
    env_logger::init_from_env(env);

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()?;

    if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
        info!("hnl-anatuple {VERSION} rev {rev} ({branch})");
    } else {
        info!("hnl-anatuple {VERSION}");
    }

    debug!("settings: {:#?}", opt);

    let job = JobConfig::from_file(&opt.config)?;
    let processor = job.into_processor(&opt)?;
    info!(
        "Selecting {} events for period {}, tree {}",
        processor.channel(),
        processor.config().period,
        processor.config().tree_name()
    );

    let counts: Vec<StageAccumulator> = opt
        .infiles
        .par_iter()
        .map(|file| process_file(&processor, file))
        .collect::<Result<_>>()?;
    let total = counts
        .into_iter()
        .fold(StageAccumulator::new(), |acc, c| acc + c);

    for (checkpoint, dataset, count) in total.iter() {
        info!(
            "{dataset} {checkpoint}: {} events, sum of weights {:e}",
            count.n_ev, count.sumw
        );
    }
    if let Some(path) = &opt.counts {
        write_counts(path, &total)?;
    }
    info!("done");
    Ok(())
}

fn process_file(
    processor: &DefaultProcessor,
    file: &Path,
) -> Result<StageAccumulator> {
    let chunk = EventChunk::from_file(file)?;
    let out = processor
        .process(&chunk.dataset, chunk.events)
        .with_context(|| format!("Failed to process {file:?}"))?;
    Ok(out.accumulator)
}

fn write_counts(path: &Path, counts: &StageAccumulator) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {path:?}"))?;
    serde_yaml::to_writer(BufWriter::new(file), counts)
        .with_context(|| format!("Failed to write event counts to {path:?}"))?;
    info!("Event counts written to {path:?}");
    Ok(())
}
