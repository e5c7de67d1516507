use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::anatuple::Anatuple;
use crate::compression::{compress_writer, Compression};
use crate::traits::WriteAnatuple;

/// Write anatuples as tab-separated text
///
/// The first line is `# tree: <tree name>`, followed by the header and one
/// line per row. Missing entries are left empty.
#[derive(Debug, Default, TypedBuilder)]
pub struct TsvWriter {
    #[builder(default)]
    compression: Option<Compression>,
}

impl TsvWriter {
    fn file_name(&self, stem: &str, i: usize) -> String {
        let ext = self.compression.map(|c| c.extension()).unwrap_or_default();
        format!("{stem}_{i}.tsv{ext}")
    }

    fn write_to(
        &self,
        file: File,
        record: &Anatuple,
        tree_name: &str,
    ) -> Result<(), io::Error> {
        let mut out = compress_writer(BufWriter::new(file), self.compression)?;
        writeln!(out, "# tree: {tree_name}")?;
        writeln!(out, "{}", record.header.iter().join("\t"))?;
        for row in &record.rows {
            let line = row
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
                .join("\t");
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

impl WriteAnatuple for TsvWriter {
    type Error = TsvWriteError;

    fn write(
        &self,
        dir: &Path,
        stem: &str,
        record: &Anatuple,
        tree_name: &str,
    ) -> Result<PathBuf, Self::Error> {
        create_dir_all(dir)
            .map_err(|err| TsvWriteError::CreateDir(dir.to_owned(), err))?;
        let mut i = 0;
        loop {
            let path = dir.join(self.file_name(stem, i));
            // create_new makes claiming a name atomic
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    self.write_to(file, record, tree_name)
                        .map_err(|err| TsvWriteError::Write(path.clone(), err))?;
                    info!("Written {} events to {path:?}", record.len());
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!("{path:?} exists");
                    i += 1;
                }
                Err(err) => return Err(TsvWriteError::Create(path, err)),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum TsvWriteError {
    #[error("Failed to create output directory {0:?}: {1}")]
    CreateDir(PathBuf, io::Error),
    #[error("Failed to create output file {0:?}: {1}")]
    Create(PathBuf, io::Error),
    #[error("Failed to write to {0:?}: {1}")]
    Write(PathBuf, io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::read_to_string;

    use crate::event::Value;

    fn record() -> Anatuple {
        Anatuple {
            header: vec![
                "event".to_owned(),
                "Lepton1_mediumId".to_owned(),
                "MET_pt".to_owned(),
            ],
            rows: vec![vec![
                Some(Value::UInt(u64::MAX)),
                None,
                Some(Value::Float(31.5)),
            ]],
        }
    }

    #[test]
    fn never_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("2018/v1/Zmu/DY-50");
        let writer = TsvWriter::default();
        let first = writer
            .write(&dir, "DY-50_anatuple", &record(), "Events")
            .unwrap();
        let second = writer
            .write(&dir, "DY-50_anatuple", &Anatuple::default(), "Events")
            .unwrap();
        assert_eq!(first, dir.join("DY-50_anatuple_0.tsv"));
        assert_eq!(second, dir.join("DY-50_anatuple_1.tsv"));

        let content = read_to_string(&first).unwrap();
        assert_eq!(
            content,
            "# tree: Events\nevent\tLepton1_mediumId\tMET_pt\n18446744073709551615\t\t31.5\n"
        );
    }

    #[test]
    fn header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let record = Anatuple {
            header: vec!["event".to_owned(), "run".to_owned()],
            rows: vec![],
        };
        let path = TsvWriter::default()
            .write(tmp.path(), "HNL-20_anatuple", &record, "Events_GenuineTauES_DM0_up")
            .unwrap();
        let content = read_to_string(path).unwrap();
        assert_eq!(content, "# tree: Events_GenuineTauES_DM0_up\nevent\trun\n");
    }

    #[test]
    fn compressed_name() {
        let writer = TsvWriter::builder()
            .compression(Some(Compression::Zstd(0)))
            .build();
        assert_eq!(writer.file_name("TT_anatuple", 3), "TT_anatuple_3.tsv.zst");
    }
}
