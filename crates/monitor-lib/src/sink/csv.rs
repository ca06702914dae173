//! Fixed-column CSV event log
//!
//! Columns follow the pod-usage shape; kinds without a per-pod field
//! leave it empty. Scale transitions don't fit the fixed schema, so
//! the before/after counts are folded into the `notes` column.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{create_log_file, EventSink};
use crate::error::MonitorError;
use crate::models::Event;

const CSV_HEADER: &str = "timestamp,event_type,replica_count,pod_name,cpu_m,cpu_pct,notes";

/// Writes one CSV row per event, flushing after each row
pub struct CsvSink {
    path: PathBuf,
    file: std::fs::File,
}

impl CsvSink {
    /// Create (truncate) the log file and write the header row
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let file = create_log_file(&path)?;
        let mut sink = Self { path, file };
        sink.write_line(CSV_HEADER)?;
        Ok(sink)
    }

    fn write_line(&mut self, line: &str) -> Result<(), MonitorError> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.write_all(b"\n"))
            .and_then(|_| self.file.flush())
            .map_err(|source| MonitorError::Sink {
                path: self.path.clone(),
                source,
            })
    }
}

impl EventSink for CsvSink {
    fn append(&mut self, event: &Event) -> Result<(), MonitorError> {
        let timestamp = event.timestamp().to_rfc3339();
        let replica_count = event.replica_count().to_string();

        let (pod_name, cpu_m, cpu_pct, notes) = match event {
            Event::PodUsage {
                pod_name,
                cpu_m,
                cpu_pct,
                notes,
                ..
            } => (
                pod_name.clone(),
                cpu_m.to_string(),
                cpu_pct.to_string(),
                notes.clone(),
            ),
            Event::CpuAlert { cpu_pct, notes, .. }
            | Event::CpuCritical { cpu_pct, notes, .. } => {
                (String::new(), String::new(), cpu_pct.to_string(), notes.clone())
            }
            Event::RequestWait { notes, .. } => {
                (String::new(), String::new(), String::new(), notes.clone())
            }
            Event::ScaleEvent {
                replicas_before,
                replicas_after,
                notes,
                ..
            } => {
                let folded = format!("{notes} replicas {replicas_before}->{replicas_after}");
                (
                    String::new(),
                    String::new(),
                    String::new(),
                    folded.trim().to_string(),
                )
            }
        };

        let row = [
            timestamp,
            event.kind().to_string(),
            replica_count,
            pod_name,
            cpu_m,
            cpu_pct,
            notes,
        ]
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",");

        self.write_line(&row)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Quote a field when it contains a delimiter, quote or newline
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ts() -> DateTime<Utc> {
        "2024-05-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_csv_header_and_pod_usage_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        sink.append(&Event::PodUsage {
            timestamp: ts(),
            replica_count: 2,
            pod_name: "api-1".to_string(),
            cpu_m: 500.0,
            cpu_pct: 50.0,
            notes: "baseline".to_string(),
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2024-05-01T12:00:00+00:00,pod_usage,2,api-1,500,50,baseline"
        );
    }

    #[test]
    fn test_csv_folds_scale_event_into_notes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        sink.append(&Event::ScaleEvent {
            timestamp: ts(),
            replica_count: 3,
            replicas_before: 1,
            replicas_after: 3,
            notes: "scaled".to_string(),
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert!(row.starts_with("2024-05-01T12:00:00+00:00,scale_event,3,,,,"));
        assert!(row.ends_with("scaled replicas 1->3"));
    }

    #[test]
    fn test_csv_alert_row_has_aggregate_pct_and_empty_pod() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        sink.append(&Event::CpuAlert {
            timestamp: ts(),
            replica_count: 2,
            cpu_pct: 85.5,
            notes: "mean CPU >= 70% (load)".to_string(),
        })
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "2024-05-01T12:00:00+00:00,cpu_alert,2,,,85.5,mean CPU >= 70% (load)"
        );
    }

    #[test]
    fn test_csv_escapes_delimiters_in_notes() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
