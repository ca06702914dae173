//! Line-delimited JSON event log

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{create_log_file, EventSink};
use crate::error::MonitorError;
use crate::models::Event;

/// Writes one flat JSON object per event, flushing after each line
pub struct NdjsonSink {
    path: PathBuf,
    file: std::fs::File,
}

impl NdjsonSink {
    /// Create (truncate) the log file, making parent directories as
    /// needed
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let file = create_log_file(&path)?;
        Ok(Self { path, file })
    }

    fn sink_err(&self, source: std::io::Error) -> MonitorError {
        MonitorError::Sink {
            path: self.path.clone(),
            source,
        }
    }
}

impl EventSink for NdjsonSink {
    fn append(&mut self, event: &Event) -> Result<(), MonitorError> {
        let mut line = serde_json::to_vec(event).map_err(|e| self.sink_err(e.into()))?;
        line.push(b'\n');

        self.file
            .write_all(&line)
            .and_then(|_| self.file.flush())
            .map_err(|e| self.sink_err(e))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
