use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use audec::auto_decompress;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

/// A chunk of events from a single dataset
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventChunk {
    /// Raw dataset name, including the run era for data
    pub dataset: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl EventChunk {
    /// Parse a YAML or JSON chunk
    pub fn from_reader<R: Read>(r: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(r)
    }

    /// Read a chunk file, which may be compressed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ChunkReadError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| ChunkReadError::Open(path.to_owned(), err))?;
        let r = auto_decompress(BufReader::new(file));
        let chunk = Self::from_reader(r)
            .map_err(|err| ChunkReadError::Parse(path.to_owned(), err))?;
        debug!(
            "Read {} events of {} from {path:?}",
            chunk.events.len(),
            chunk.dataset
        );
        Ok(chunk)
    }
}

#[derive(Debug, Error)]
pub enum ChunkReadError {
    #[error("Failed to open {0:?}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("Failed to parse event chunk {0:?}: {1}")]
    Parse(PathBuf, serde_yaml::Error),
}
