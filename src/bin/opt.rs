use std::path::PathBuf;

use clap::Parser;
use hnl_anatuple::channel::Channel;
use hnl_anatuple::compression::Compression;
use hnl_anatuple::variation::TauEsVariation;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

const GZIP_DEFAULT_LEVEL: u8 = 6;
const LZ4_DEFAULT_LEVEL: u8 = 0;
const ZSTD_DEFAULT_LEVEL: u8 = 0;

lazy_static! {
    static ref COMPRESSION_RE: Regex =
        Regex::new(r"^(?P<algo>[[:alnum:]]+)(?P<lvl>_\d+)?$").unwrap();
}

fn parse_level(
    algo: &str,
    lvl_str: Option<&str>,
    max: u8,
    default: u8,
) -> Result<u8, ParseCompressionErr> {
    let Some(lvl_str) = lvl_str else {
        return Ok(default);
    };
    match lvl_str[1..].parse::<u8>() {
        Ok(lvl) if lvl <= max => Ok(lvl),
        _ => Err(ParseCompressionErr::UnsupportedLevel(
            algo.into(),
            lvl_str.to_owned(),
        )),
    }
}

pub(crate) fn parse_compr(s: &str) -> Result<Compression, ParseCompressionErr> {
    use Compression::*;
    use ParseCompressionErr::*;

    let lower_case = s.to_ascii_lowercase();
    let Some(captures) = COMPRESSION_RE.captures(&lower_case) else {
        return Err(UnknownAlgorithm(s.to_owned()));
    };
    let algo = &captures["algo"];
    let lvl_str = captures.name("lvl").map(|l| l.as_str());
    match algo {
        "bzip2" | "bz2" => {
            if let Some(lvl_str) = lvl_str {
                Err(UnsupportedLevel(algo.into(), lvl_str.to_owned()))
            } else {
                Ok(Bzip2)
            }
        }
        "gzip" | "gz" => {
            parse_level(algo, lvl_str, 9, GZIP_DEFAULT_LEVEL).map(Gzip)
        }
        "lz4" => parse_level(algo, lvl_str, 16, LZ4_DEFAULT_LEVEL).map(Lz4),
        "zstd" | "zstandard" => {
            parse_level(algo, lvl_str, 19, ZSTD_DEFAULT_LEVEL).map(Zstd)
        }
        _ => Err(UnknownAlgorithm(s.to_string())),
    }
}

#[derive(Debug, Clone, Error)]
pub(crate) enum ParseCompressionErr {
    #[error("Unknown compression algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Level {1} not supported for {0} compression")]
    UnsupportedLevel(String, String),
}

#[derive(Debug, Parser)]
#[clap(about, author, version)]
pub(crate) struct Opt {
    /// Job configuration file.
    ///
    /// A YAML file with the analysis configuration and the paths to the
    /// certification and tau energy scale tables.
    #[clap(long, short, value_parser)]
    pub(crate) config: PathBuf,

    /// Analysis channel, either 'Ze' or 'Zmu'.
    #[clap(long)]
    pub(crate) channel: Channel,

    /// Systematic variation of the tau energy scale.
    ///
    /// Overrides the variation in the job configuration, for example
    /// 'GenuineTauES_DM0_up' or 'GenuineMuonES_down'.
    #[clap(long)]
    pub(crate) variation: Option<TauEsVariation>,

    /// Output directory, overrides the job configuration.
    #[clap(long, short, value_parser)]
    pub(crate) outdir: Option<PathBuf>,

    #[clap(long, value_parser = parse_compr,
                help = "Compress output files.
Possible settings are 'bzip2', 'gzip', 'zstd', 'lz4'.
Compression levels can be set with algorithm_level e.g. 'zstd_5'.
Maximum levels are 'gzip_9', 'zstd_19', 'lz4_16'.")]
    pub(crate) compression: Option<Compression>,

    /// Write the event counts at each selection stage to this file.
    #[clap(long, value_parser)]
    pub(crate) counts: Option<PathBuf>,

    /// Verbosity level
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.\n"
    )]
    pub(crate) loglevel: String,

    #[clap(
        short,
        long,
        default_value_t,
        help = "Number of threads.

If set to 0, a default number of threads is chosen.
The default can be set with the `RAYON_NUM_THREADS` environment
variable."
    )]
    pub(crate) threads: usize,

    /// Event chunk files
    #[clap(name = "INFILES", value_parser)]
    pub(crate) infiles: Vec<PathBuf>,
}

impl Opt {
    pub(crate) fn validate(self) -> Result<Self, ValidationError> {
        if self.infiles.is_empty() {
            return Err(ValidationError::NoInput);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Error)]
pub(crate) enum ValidationError {
    #[error("No input files")]
    NoInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression() {
        assert!(matches!(parse_compr("zstd_5"), Ok(Compression::Zstd(5))));
        assert!(matches!(parse_compr("GZ"), Ok(Compression::Gzip(6))));
        assert!(matches!(parse_compr("bz2"), Ok(Compression::Bzip2)));
        assert!(parse_compr("gzip_10").is_err());
        assert!(parse_compr("bzip2_1").is_err());
        assert!(parse_compr("xz").is_err());
    }

    #[test]
    fn options() {
        let opt = Opt::parse_from([
            "hnl-anatuple",
            "-c",
            "job.yaml",
            "--channel",
            "Zmu",
            "--variation",
            "GenuineElectronES_DM1_down",
            "chunk_0.yaml",
        ])
        .validate()
        .unwrap();
        assert_eq!(opt.channel, Channel::Zmu);
        assert_eq!(
            opt.variation.unwrap().to_string(),
            "GenuineElectronES_DM1_down"
        );
        assert_eq!(opt.infiles, [PathBuf::from("chunk_0.yaml")]);

        let res = Opt::try_parse_from([
            "hnl-anatuple",
            "-c",
            "job.yaml",
            "--channel",
            "Ztau",
        ]);
        assert!(res.is_err());
    }
}
