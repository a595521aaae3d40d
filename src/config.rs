use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use serde_derive::Deserialize;
use crate::data_structures::MESSAGE_TRACE_RETENTION_DAYS;
use crate::error::{ReportError, Result};


#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub tenant: TenantConfig,
    pub reports: Option<ReportsSubConfig>,
    pub output: OutputSubConfig,
    pub log: Option<LogSubConfig>,
}

impl Config {

    pub fn new(path: String) -> Self {

        let open_file = File::open(path)
            .unwrap_or_else(|e| panic!("Config path could not be opened: {}", e));
        let reader = BufReader::new(open_file);
        let config: Config = serde_yaml::from_reader(reader)
            .unwrap_or_else(|e| panic!("Config could not be parsed: {}", e));
        config
    }

    /// Analysis window in days, CLI override first, clamped to trace retention.
    pub fn get_days_back(&self, cli_override: Option<i64>) -> i64 {
        let configured = self
            .reports
            .as_ref()
            .and_then(|r| r.days_back)
            .unwrap_or(7);
        cli_override.unwrap_or(configured).clamp(1, MESSAGE_TRACE_RETENTION_DAYS)
    }

    /// Record cap for fetches and target count for generated sample data.
    pub fn get_sample_size(&self, cli_override: Option<usize>) -> usize {
        let configured = self
            .reports
            .as_ref()
            .and_then(|r| r.sample_size)
            .unwrap_or(100);
        cli_override.unwrap_or(configured).max(1)
    }

    pub fn include_transport_rules(&self) -> bool {
        self.reports
            .as_ref()
            .and_then(|r| r.include_transport_rules)
            .unwrap_or(true)
    }

    pub fn include_connectors(&self) -> bool {
        self.reports
            .as_ref()
            .and_then(|r| r.include_connectors)
            .unwrap_or(true)
    }

    pub fn output_base(&self, cli_override: Option<&str>) -> PathBuf {
        PathBuf::from(cli_override.unwrap_or(&self.output.path))
    }

    /// Create (if needed) and return the per-report output directory.
    pub fn ensure_report_dir(&self, cli_override: Option<&str>, report_type: &str) -> Result<PathBuf> {
        let dir = self.output_base(cli_override).join(report_type);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}


#[derive(Deserialize, Clone, Debug)]
pub struct TenantConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub client_secret_path: Option<String>,
    pub api_type: Option<String>,  // commercial, gcc, gcc-high
}

impl TenantConfig {
    /// Login authority and API base for the configured cloud. An unknown
    /// `api_type` is a settings error, which routes to the sample fallback
    /// like any other misconfiguration.
    pub fn get_endpoints(&self) -> Result<(String, String)> {
        let api_type = self.api_type.as_deref().unwrap_or("commercial");
        match api_type {
            "commercial" | "gcc" => Ok((
                "https://login.microsoftonline.com".to_string(),
                "https://graph.microsoft.com".to_string()
            )),
            "gcc-high" => Ok((
                "https://login.microsoftonline.us".to_string(),
                "https://graph.microsoft.us".to_string()
            )),
            _ => Err(ReportError::NotConfigured(format!(
                "invalid api_type: {}. Must be 'commercial', 'gcc', or 'gcc-high'",
                api_type
            ))),
        }
    }

    pub fn get_secret(&self) -> Result<String> {
        if let Some(secret) = &self.client_secret {
            return Ok(secret.clone());
        }

        if let Some(secret_path) = &self.client_secret_path {
            match std::fs::read_to_string(Path::new(secret_path)) {
                Ok(content) => Ok(content.trim().to_string()),
                Err(e) => Err(ReportError::NotConfigured(
                    format!("failed to read secret from {}: {}", secret_path, e))),
            }
        } else {
            Err(ReportError::NotConfigured(
                "either client_secret or client_secret_path must be provided".to_string()))
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReportsSubConfig {
    #[serde(rename = "daysBack")]
    pub days_back: Option<i64>,
    #[serde(rename = "sampleSize")]
    pub sample_size: Option<usize>,
    #[serde(rename = "includeTransportRules")]
    pub include_transport_rules: Option<bool>,
    #[serde(rename = "includeConnectors")]
    pub include_connectors: Option<bool>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OutputSubConfig {
    pub path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LogSubConfig {
    pub path: String,
    pub debug: bool,
}


#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        serde_yaml::from_str(
            r#"
tenant:
  tenant_id: "00000000-0000-0000-0000-000000000000"
  client_id: "11111111-1111-1111-1111-111111111111"
  client_secret: "s3cret"
output:
  path: "./reports"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = minimal_config();
        assert_eq!(config.get_days_back(None), 7);
        assert_eq!(config.get_sample_size(None), 100);
        assert!(config.include_transport_rules());
        assert!(config.include_connectors());
    }

    #[test]
    fn test_days_back_clamped() {
        let config = minimal_config();
        assert_eq!(config.get_days_back(Some(90)), MESSAGE_TRACE_RETENTION_DAYS);
        assert_eq!(config.get_days_back(Some(0)), 1);
        assert_eq!(config.get_days_back(Some(3)), 3);
    }

    #[test]
    fn test_unknown_api_type_is_not_configured() {
        let mut config = minimal_config();
        assert!(config.tenant.get_endpoints().is_ok());
        config.tenant.api_type = Some("dod".to_string());
        assert!(matches!(
            config.tenant.get_endpoints(),
            Err(ReportError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_secret_missing_is_not_configured() {
        let mut config = minimal_config();
        config.tenant.client_secret = None;
        assert!(matches!(
            config.tenant.get_secret(),
            Err(ReportError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_ensure_report_dir() {
        let config = minimal_config();
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let report_dir = config.ensure_report_dir(Some(base), "mail_flow").unwrap();
        assert!(report_dir.exists());
        assert!(report_dir.ends_with("mail_flow"));
    }
}
