use log::{info, warn};
use crate::data_structures::DataSource;
use crate::error::Result;

/// Fallback policy for a primary fetch: live records when the fetch succeeded
/// and returned anything, otherwise generated sample data so the emitters
/// always have schema-compatible, non-empty input. Errors that do not belong
/// to the fetch taxonomy still propagate.
pub fn fetch_or_sample<T, F>(
    what: &str,
    fetched: Result<Vec<T>>,
    generate: F,
    sample_size: usize,
) -> Result<DataSource<T>>
where
    F: FnOnce(usize) -> Vec<T>,
{
    match fetched {
        Ok(records) if !records.is_empty() => {
            info!("Fetched {} {} records", records.len(), what);
            Ok(DataSource::Real(records))
        }
        Ok(_) => {
            warn!("{} fetch returned no records, generating {} sample records", what, sample_size);
            Ok(DataSource::Synthetic(generate(sample_size)))
        }
        Err(e) if e.triggers_fallback() => {
            warn!("{} fetch failed ({}), generating {} sample records", what, e, sample_size);
            Ok(DataSource::Synthetic(generate(sample_size)))
        }
        Err(e) => Err(e),
    }
}

/// Degrade a failed optional sub-fetch to an empty set with a logged warning.
pub fn optional_fetch<T>(what: &str, fetched: Result<Vec<T>>) -> Vec<T> {
    match fetched {
        Ok(records) => records,
        Err(e) => {
            warn!("Optional {} fetch failed, continuing without it: {}", what, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn test_live_records_pass_through() {
        let source = fetch_or_sample("test", Ok(vec![1, 2, 3]), |n| vec![0; n], 10).unwrap();
        assert!(!source.is_synthetic());
        assert_eq!(source.records(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_result_falls_back() {
        let source = fetch_or_sample("test", Ok(Vec::<i32>::new()), |n| vec![0; n], 10).unwrap();
        assert!(source.is_synthetic());
        assert_eq!(source.records().len(), 10);
    }

    #[test]
    fn test_unavailable_service_falls_back_with_requested_count() {
        let fetched: Result<Vec<i32>> = Err(ReportError::ServiceUnavailable("down".into()));
        let source = fetch_or_sample("test", fetched, |n| vec![7; n], 25).unwrap();
        assert!(source.is_synthetic());
        assert_eq!(source.records().len(), 25);
    }

    #[test]
    fn test_io_error_propagates() {
        let fetched: Result<Vec<i32>> = Err(ReportError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )));
        assert!(fetch_or_sample("test", fetched, |n| vec![0; n], 10).is_err());
    }

    #[test]
    fn test_optional_fetch_degrades_to_empty() {
        let fetched: Result<Vec<i32>> = Err(ReportError::PermissionDenied("403".into()));
        assert!(optional_fetch("rules", fetched).is_empty());
        assert_eq!(optional_fetch("rules", Ok(vec![1])), vec![1]);
    }
}
