// Audit trail for report runs, one JSON object per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use log::error;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub target: String,
    pub result: String,
    pub details: String,
}

pub struct AuditRecorder {
    path: PathBuf,
}

impl AuditRecorder {
    pub fn new(output_dir: &Path) -> Self {
        AuditRecorder {
            path: output_dir.join("report_audit.jsonl"),
        }
    }

    /// Append one audit line. Audit failures are logged but never abort a
    /// report run.
    pub fn record(&self, action: &str, target: &str, result: &str, details: &str) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            action: action.to_string(),
            target: target.to_string(),
            result: result.to_string(),
            details: details.to_string(),
        };

        if let Err(e) = self.append(&entry) {
            error!("Failed to write audit entry to {}: {}", self.path.display(), e);
        }
    }

    fn append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{}", line)?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_entries_append_as_jsonl() {
        let dir = tempdir().unwrap();
        let recorder = AuditRecorder::new(dir.path());

        recorder.record("run_report", "mail_flow", "success", "120 records");
        recorder.record("run_report", "mailbox", "fallback", "sample data used");

        let content = std::fs::read_to_string(dir.path().join("report_audit.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.action, "run_report");
        assert_eq!(first.target, "mail_flow");
        assert_eq!(first.result, "success");
    }
}
