use thiserror::Error;

/// Error taxonomy for report pipelines.
///
/// The first three variants describe why the live-data path is unavailable and
/// make a pipeline fall back to generated sample data. `PartialData` marks a
/// per-item enrichment failure that is logged and skipped. The remaining
/// variants are infrastructure failures; of those, only output-write errors
/// abort a run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("partial data: {0}")]
    PartialData(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Whether a failed primary fetch with this error should degrade to the
    /// sample-data path instead of aborting the run.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            ReportError::NotConfigured(_)
                | ReportError::ServiceUnavailable(_)
                | ReportError::PermissionDenied(_)
                | ReportError::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_trigger_fallback() {
        assert!(ReportError::NotConfigured("no secret".into()).triggers_fallback());
        assert!(ReportError::ServiceUnavailable("timeout".into()).triggers_fallback());
        assert!(ReportError::PermissionDenied("403".into()).triggers_fallback());
    }

    #[test]
    fn test_write_errors_abort() {
        let io = ReportError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(!io.triggers_fallback());
    }
}
