//! Record sinks.
//!
//! [`AppendFileSink`] holds one buffered handle for the whole run and flushes
//! after every record, so a crash after N records leaves exactly N complete
//! lines. The handle is flushed and closed on drop, including on error paths.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::Result;
use crate::sweep::record::SweepRecord;

/// Destination for sweep records.
pub trait RecordSink {
    fn write_record(&mut self, record: &SweepRecord) -> Result<()>;
}

/// In-memory sink.
impl RecordSink for Vec<SweepRecord> {
    fn write_record(&mut self, record: &SweepRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

/// Append-only text file sink.
#[derive(Debug)]
pub struct AppendFileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl AppendFileSink {
    /// Opens `path` for appending, creating it if needed.
    ///
    /// Existing content is kept unless `truncate` is set; re-running without
    /// truncation duplicates earlier output.
    pub fn open(path: impl AsRef<Path>, truncate: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = if truncate {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?
        } else {
            OpenOptions::new().create(true).append(true).open(&path)?
        };
        debug!(path = %path.display(), truncate, "opened output file");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this handle (not counting prior content).
    pub fn written(&self) -> usize {
        self.written
    }
}

impl RecordSink for AppendFileSink {
    fn write_record(&mut self, record: &SweepRecord) -> Result<()> {
        self.writer.write_all(record.to_line().as_bytes())?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}

impl Drop for AppendFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!(path = %self.path.display(), error = %e, "failed to flush output on close");
        }
    }
}
