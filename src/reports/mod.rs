pub mod mail_flow;
pub mod mailbox;
pub mod room_utilization;

use crate::api_connection::DataFetcher;
use crate::config::Config;
use crate::data_structures::{CliArgs, ReportArtifact, ReportKind};
use crate::error::Result;

/// Run one report pipeline end to end: fetch, fall back, aggregate, emit.
pub async fn run(
    kind: ReportKind,
    fetcher: &dyn DataFetcher,
    config: &Config,
    args: &CliArgs,
) -> Result<ReportArtifact> {
    match kind {
        ReportKind::MailFlow => mail_flow::run(fetcher, config, args).await,
        ReportKind::Mailbox => mailbox::run(fetcher, config, args).await,
        ReportKind::Rooms => room_utilization::run(fetcher, config, args).await,
        ReportKind::All => unreachable!("All is expanded by the caller"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::data_structures::{CliArgs, ReportKind};

    pub fn test_config() -> Config {
        serde_yaml::from_str(
            r#"
tenant:
  tenant_id: "00000000-0000-0000-0000-000000000000"
  client_id: "11111111-1111-1111-1111-111111111111"
  client_secret: "s3cret"
reports:
  daysBack: 5
output:
  path: "./reports"
"#,
        )
        .unwrap()
    }

    pub fn test_args(output_dir: &str, sample_size: usize) -> CliArgs {
        CliArgs {
            config: "config.yaml".to_string(),
            report: ReportKind::All,
            days_back: None,
            output_dir: Some(output_dir.to_string()),
            sample_size: Some(sample_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::api_connection::OfflineFetcher;
    use crate::data_structures::ReportRecords;
    use crate::interfaces::csv_interface::UTF8_BOM;
    use tempfile::tempdir;
    use test_support::{test_args, test_config};

    /// A simulated outage must still yield a complete artifact built from
    /// sample data of the requested size.
    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_sample_artifact() {
        let dir = tempdir().unwrap();
        let config = test_config();
        let args = test_args(dir.path().to_str().unwrap(), 15);
        let fetcher = OfflineFetcher::new("simulated outage".to_string());

        let artifact = run(ReportKind::MailFlow, &fetcher, &config, &args)
            .await
            .unwrap();

        assert!(artifact.is_synthetic());
        assert_eq!(artifact.record_count(), 15);
        assert!(artifact.csv_path.exists());
        assert!(artifact.html_path.exists());
        assert_eq!(artifact.summary.get("Messages"), Some("15"));

        let bytes = std::fs::read(&artifact.csv_path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 16);
    }

    /// The artifact hands the record set itself back to the caller, so a run
    /// can chain into further processing without re-reading its own CSV.
    #[tokio::test]
    async fn test_artifact_carries_record_set() {
        let dir = tempdir().unwrap();
        let config = test_config();
        let args = test_args(dir.path().to_str().unwrap(), 12);
        let fetcher = OfflineFetcher::new("simulated outage".to_string());

        let artifact = run(ReportKind::MailFlow, &fetcher, &config, &args)
            .await
            .unwrap();

        let set = match &artifact.records {
            ReportRecords::MailFlow(set) => set,
            other => panic!("wrong record set variant: {:?}", other),
        };
        assert!(set.is_synthetic());
        assert_eq!(set.records().len(), 12);

        // The carried records reproduce the artifact's own summary.
        let recomputed = aggregate::mail_flow_summary(set.records());
        assert_eq!(recomputed.get("Messages"), artifact.summary.get("Messages"));
        assert_eq!(
            recomputed.get("Success rate %"),
            artifact.summary.get("Success rate %")
        );
    }

    #[tokio::test]
    async fn test_all_reports_survive_an_outage() {
        let dir = tempdir().unwrap();
        let config = test_config();
        let args = test_args(dir.path().to_str().unwrap(), 5);
        let fetcher = OfflineFetcher::new("simulated outage".to_string());

        for kind in ReportKind::All.selected() {
            let artifact = run(kind, &fetcher, &config, &args).await.unwrap();
            assert!(artifact.is_synthetic(), "{:?} did not fall back", kind);
            assert!(artifact.record_count() > 0);
        }
    }
}
