use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hnl_anatuple::prelude::*;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::opt::Opt;

pub(crate) type DefaultProcessor = Processor<
    GoldenJson,
    LumiXsecReweighter,
    StandardMetFilters,
    TauEsTable,
    TsvWriter,
>;

/// Contents of the job configuration file
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct JobConfig {
    #[serde(flatten)]
    pub(crate) config: Config,
    /// Certified luminosity blocks in JSON format
    pub(crate) golden_json: PathBuf,
    /// Tau energy scale factors
    pub(crate) tau_es: PathBuf,
    /// Integrated luminosity of the period in pb^-1
    #[serde(default)]
    pub(crate) luminosity: Option<f64>,
    /// Total sum of generator weights for each simulated dataset
    #[serde(default)]
    pub(crate) sum_gen_weights: BTreeMap<String, f64>,
    /// Required MET filter flags, defaults to the recommendation for
    /// the period
    #[serde(default)]
    pub(crate) met_filters: Option<Vec<String>>,
}

impl JobConfig {
    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open job configuration {path:?}"))?;
        serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse job configuration {path:?}"))
    }

    /// Apply command line overrides and set up the collaborators
    pub(crate) fn into_processor(self, opt: &Opt) -> Result<DefaultProcessor> {
        let mut config = self.config;
        if let Some(variation) = opt.variation {
            config.tau_es_variation = Some(variation);
        }
        if let Some(outdir) = &opt.outdir {
            config.output_dir = outdir.clone();
        }
        let period = config.period;

        let golden_run_filter = GoldenJson::from_file(&self.golden_json)
            .with_context(|| format!("Failed to read {:?}", self.golden_json))?
            .for_period(period);
        let tau_es = TauEsTable::from_file(&self.tau_es)
            .with_context(|| format!("Failed to read {:?}", self.tau_es))?;

        let luminosity = match self.luminosity {
            Some(lumi) => BTreeMap::from([(period, lumi)]),
            None => {
                warn!(
                    "No integrated luminosity given, \
                     simulated events cannot be normalised"
                );
                BTreeMap::new()
            }
        };
        let reweighter = LumiXsecReweighter::new(luminosity, self.sum_gen_weights);

        let met_filter = match self.met_filters {
            Some(flags) => StandardMetFilters::new(flags),
            None => StandardMetFilters::for_period(period),
        };
        debug!("MET filters: {:?}", met_filter.flags());

        let writer = TsvWriter::builder().compression(opt.compression).build();

        let processor = ProcessorBuilder {
            config,
            channel: opt.channel,
            golden_run_filter,
            reweighter,
            met_filter,
            tau_es,
            writer,
        }
        .build()?;
        Ok(processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_job() {
        let yaml = r#"
period: "2018"
tag: v1
dataHLT: EGamma
stitched_list: [[DY-50, DY1J-50]]
xsecs: {DY-50: 6077.22, DY1J-50: 978.3}
golden_json: Cert_Collisions2018.json
tau_es: tau_es.yaml
luminosity: 59830.
sum_gen_weights: {DY-50: 1.2e9, DY1J-50: 3.1e8}
"#;
        let job: JobConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(job.config.period, Period::Run2018);
        assert_eq!(job.config.tag, "v1");
        assert_eq!(job.config.tree_name(), "Events");
        assert_eq!(job.golden_json, PathBuf::from("Cert_Collisions2018.json"));
        assert_eq!(job.luminosity, Some(59830.));
        assert_eq!(job.sum_gen_weights.len(), 2);
        assert!(job.met_filters.is_none());
    }
}
