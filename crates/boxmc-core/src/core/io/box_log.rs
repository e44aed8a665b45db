use crate::core::models::box_dim::BoxDim;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoxLogError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error while writing box log: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
    #[error("Failed to flush box log: {source}")]
    Flush {
        #[from]
        source: std::io::Error,
    },
}

/// One row of the box log: the outcome of a single box update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxLogRecord {
    pub timestep: u64,
    pub category: String,
    pub outcome: String,
    pub lx: f64,
    pub ly: f64,
    pub lz: f64,
    pub xy: f64,
    pub xz: f64,
    pub yz: f64,
    pub volume: f64,
}

impl BoxLogRecord {
    pub fn new(timestep: u64, category: &str, outcome: &str, box_dim: &BoxDim) -> Self {
        let [lx, ly, lz] = box_dim.lengths();
        let [xy, xz, yz] = box_dim.tilts();
        Self {
            timestep,
            category: category.to_string(),
            outcome: outcome.to_string(),
            lx,
            ly,
            lz,
            xy,
            xz,
            yz,
            volume: box_dim.volume(),
        }
    }
}

/// Streams [`BoxLogRecord`]s as CSV with a header row.
pub struct BoxLogWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl BoxLogWriter<File> {
    pub fn create(path: &Path) -> Result<Self, BoxLogError> {
        let file = File::create(path).map_err(|e| BoxLogError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(Self::new(file))
    }
}

impl<W: Write> BoxLogWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn write(&mut self, record: &BoxLogRecord) -> Result<(), BoxLogError> {
        self.writer.serialize(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), BoxLogError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_header_and_one_row_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("box.csv");
        {
            let mut writer = BoxLogWriter::create(&path).unwrap();
            let b = BoxDim::new([2.0, 3.0, 4.0], [0.1, 0.0, 0.0]);
            writer
                .write(&BoxLogRecord::new(10, "volume", "accepted", &b))
                .unwrap();
            writer
                .write(&BoxLogRecord::new(11, "shear", "rejected-overlap", &b))
                .unwrap();
            writer.flush().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestep,category,outcome,lx,ly,lz,xy,xz,yz,volume");
        assert!(lines[1].starts_with("10,volume,accepted,2.0,3.0,4.0,0.1"));
        assert!(lines[2].ends_with(",24.0"));
    }

    #[test]
    fn records_read_back_through_csv() {
        let mut buffer = Vec::new();
        {
            let mut writer = BoxLogWriter::new(&mut buffer);
            writer
                .write(&BoxLogRecord::new(3, "length", "accepted", &BoxDim::cube(5.0)))
                .unwrap();
            writer.flush().unwrap();
        }
        let mut reader = csv::Reader::from_reader(buffer.as_slice());
        let records: Vec<BoxLogRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].volume, 125.0);
        assert_eq!(records[0].category, "length");
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("box.csv");
        assert!(matches!(
            BoxLogWriter::create(&path),
            Err(BoxLogError::Io { .. })
        ));
    }
}
