use chrono::{DateTime, Duration, Utc};
use clap::{Parser, ValueEnum};
use log::warn;
use serde_derive::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

/// Message trace data is only retained for this many days server-side.
pub const MESSAGE_TRACE_RETENTION_DAYS: i64 = 10;


#[derive(Parser, Clone, Debug)]
#[command(name = "exchange-report-collector", about = "Exchange Online operational reports")]
pub struct CliArgs {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Which report to run
    #[arg(short, long, value_enum, default_value = "all")]
    pub report: ReportKind,

    /// Override the configured analysis window (days back from now)
    #[arg(long)]
    pub days_back: Option<i64>,

    /// Override the configured output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Override the configured record cap / sample size
    #[arg(long)]
    pub sample_size: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    MailFlow,
    Mailbox,
    Rooms,
    All,
}

impl ReportKind {
    /// Expand `All` into the concrete report list, in run order.
    pub fn selected(self) -> Vec<ReportKind> {
        match self {
            ReportKind::All => vec![ReportKind::MailFlow, ReportKind::Mailbox, ReportKind::Rooms],
            kind => vec![kind],
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            ReportKind::MailFlow => "mail_flow",
            ReportKind::Mailbox => "mailbox",
            ReportKind::Rooms => "room_utilization",
            ReportKind::All => "all",
        }
    }
}


/// Half-open analysis window `[start, end)`.
#[derive(Clone, Debug)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Window covering the last `days` days, clamped to the trace retention limit.
    pub fn last_days(days: i64) -> Self {
        let days = if days > MESSAGE_TRACE_RETENTION_DAYS {
            warn!(
                "Requested window of {} days exceeds the {}-day trace retention limit, clamping",
                days, MESSAGE_TRACE_RETENTION_DAYS
            );
            MESSAGE_TRACE_RETENTION_DAYS
        } else {
            days.max(1)
        };
        let end = Utc::now();
        ReportWindow {
            start: end - Duration::days(days),
            end,
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}


#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Pending,
    Quarantined,
    FilteredAsSpam,
    Other,
}

impl DeliveryStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Delivered" => DeliveryStatus::Delivered,
            "Failed" => DeliveryStatus::Failed,
            "Pending" => DeliveryStatus::Pending,
            "Quarantined" => DeliveryStatus::Quarantined,
            "FilteredAsSpam" => DeliveryStatus::FilteredAsSpam,
            _ => DeliveryStatus::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Failed => "Failed",
            DeliveryStatus::Pending => "Pending",
            DeliveryStatus::Quarantined => "Quarantined",
            DeliveryStatus::FilteredAsSpam => "FilteredAsSpam",
            DeliveryStatus::Other => "Other",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            DeliveryStatus::Delivered => "status-ok",
            DeliveryStatus::Failed => "status-bad",
            _ => "status-warn",
        }
    }
}

/// Domain part of an SMTP address, `"unknown"` when the address has no `@`.
pub fn domain_of(address: &str) -> &str {
    match address.split_once('@') {
        Some((_, domain)) if !domain.is_empty() => domain,
        _ => "unknown",
    }
}


#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageTraceRecord {
    pub received: DateTime<Utc>,
    pub sender_address: String,
    pub recipient_address: String,
    pub subject: String,
    pub status: DeliveryStatus,
    pub size_bytes: u64,
}

impl MessageTraceRecord {
    pub fn recipient_domain(&self) -> &str {
        domain_of(&self.recipient_address)
    }

    pub fn sender_domain(&self) -> &str {
        domain_of(&self.sender_address)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MailboxRecord {
    pub display_name: String,
    pub primary_address: String,
    pub item_count: u64,
    pub total_size_mb: f64,
    pub quota_mb: f64,
    pub forwarding_address: Option<String>,
}

impl MailboxRecord {
    /// Quota consumption in percent, 0 for mailboxes without a quota.
    pub fn usage_pct(&self) -> f64 {
        if self.quota_mb <= 0.0 {
            0.0
        } else {
            (self.total_size_mb * 10000.0 / self.quota_mb).round() / 100.0
        }
    }

    /// Forwarding to an address outside the mailbox's own domain.
    pub fn forwards_externally(&self) -> bool {
        match &self.forwarding_address {
            Some(target) => domain_of(target) != domain_of(&self.primary_address),
            None => false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RoomMailboxRecord {
    pub display_name: String,
    pub primary_address: String,
    pub capacity: u32,
    pub bookings: u32,
    pub booked_hours: f64,
    pub utilization_rate: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TransportRuleRecord {
    pub name: String,
    pub state: String,
    pub priority: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConnectorRecord {
    pub name: String,
    pub direction: String,
    pub enabled: bool,
}


/// Uniform tabular access for CSV and HTML emitters. Every record type in a
/// set exposes the same field names, which is what keeps the emitters free of
/// per-report branching.
pub trait ReportRecord {
    fn field_names() -> &'static [&'static str];
    fn field_values(&self) -> Vec<String>;

    /// Styling class for the HTML row; empty for unstyled rows.
    fn css_class(&self) -> &'static str {
        ""
    }
}

impl ReportRecord for MessageTraceRecord {
    fn field_names() -> &'static [&'static str] {
        &["Received", "Sender", "Recipient", "Subject", "Status", "SizeKB"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.received.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.sender_address.clone(),
            self.recipient_address.clone(),
            self.subject.clone(),
            self.status.as_str().to_string(),
            format!("{:.2}", self.size_bytes as f64 / 1024.0),
        ]
    }

    fn css_class(&self) -> &'static str {
        self.status.css_class()
    }
}

impl ReportRecord for MailboxRecord {
    fn field_names() -> &'static [&'static str] {
        &["DisplayName", "PrimaryAddress", "Items", "SizeMB", "QuotaMB", "UsagePct", "ForwardingAddress"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.display_name.clone(),
            self.primary_address.clone(),
            self.item_count.to_string(),
            format!("{:.2}", self.total_size_mb),
            format!("{:.2}", self.quota_mb),
            format!("{:.2}", self.usage_pct()),
            self.forwarding_address.clone().unwrap_or_default(),
        ]
    }

    fn css_class(&self) -> &'static str {
        if self.forwards_externally() {
            "status-warn"
        } else if self.usage_pct() > 90.0 {
            "status-bad"
        } else {
            ""
        }
    }
}

impl ReportRecord for TransportRuleRecord {
    fn field_names() -> &'static [&'static str] {
        &["Name", "State", "Priority"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![self.name.clone(), self.state.clone(), self.priority.to_string()]
    }
}

impl ReportRecord for ConnectorRecord {
    fn field_names() -> &'static [&'static str] {
        &["Name", "Direction", "Enabled"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![self.name.clone(), self.direction.clone(), self.enabled.to_string()]
    }
}


/// Provenance tag for a fetched record set, so callers and tests can tell a
/// live result from the sample-data fallback without heuristics.
#[derive(Clone, Debug)]
pub enum DataSource<T> {
    Real(Vec<T>),
    Synthetic(Vec<T>),
}

impl<T> DataSource<T> {
    pub fn records(&self) -> &[T] {
        match self {
            DataSource::Real(records) | DataSource::Synthetic(records) => records,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Real(_) => "live",
            DataSource::Synthetic(_) => "sample",
        }
    }

    /// New set carrying the same provenance tag, for record sets derived
    /// from this one (sorted, enriched, re-typed).
    pub fn derive<U>(&self, records: Vec<U>) -> DataSource<U> {
        match self {
            DataSource::Real(_) => DataSource::Real(records),
            DataSource::Synthetic(_) => DataSource::Synthetic(records),
        }
    }
}


#[derive(Clone, Debug, Default)]
pub struct SummaryStats {
    metrics: Vec<(String, String)>,
}

impl SummaryStats {
    pub fn new() -> Self {
        SummaryStats::default()
    }

    pub fn push(&mut self, name: &str, value: impl Display) {
        self.metrics.push((name.to_string(), value.to_string()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metrics.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}


/// The final record set of one pipeline run, typed per report so callers
/// can pick the payload back out without downcasting.
#[derive(Clone, Debug)]
pub enum ReportRecords {
    MailFlow(DataSource<MessageTraceRecord>),
    Mailbox(DataSource<MailboxRecord>),
    Rooms(DataSource<RoomMailboxRecord>),
}

impl ReportRecords {
    pub fn count(&self) -> usize {
        match self {
            ReportRecords::MailFlow(set) => set.records().len(),
            ReportRecords::Mailbox(set) => set.records().len(),
            ReportRecords::Rooms(set) => set.records().len(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        match self {
            ReportRecords::MailFlow(set) => set.is_synthetic(),
            ReportRecords::Mailbox(set) => set.is_synthetic(),
            ReportRecords::Rooms(set) => set.is_synthetic(),
        }
    }
}

/// What one pipeline run hands back to the caller: the output file paths
/// plus the in-memory record set and summary stats, so a run can chain
/// into further automation without re-reading its own CSV.
#[derive(Debug)]
pub struct ReportArtifact {
    pub report: ReportKind,
    pub csv_path: PathBuf,
    pub html_path: PathBuf,
    pub records: ReportRecords,
    pub summary: SummaryStats,
}

impl ReportArtifact {
    pub fn record_count(&self) -> usize {
        self.records.count()
    }

    pub fn is_synthetic(&self) -> bool {
        self.records.is_synthetic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("user@contoso.com"), "contoso.com");
        assert_eq!(domain_of("no-at-sign"), "unknown");
        assert_eq!(domain_of("trailing@"), "unknown");
    }

    #[test]
    fn test_window_clamped_to_retention() {
        let window = ReportWindow::last_days(30);
        assert_eq!(window.days(), MESSAGE_TRACE_RETENTION_DAYS);
        let window = ReportWindow::last_days(3);
        assert_eq!(window.days(), 3);
    }

    #[test]
    fn test_usage_pct_zero_quota() {
        let mailbox = MailboxRecord {
            display_name: "Shared".into(),
            primary_address: "shared@contoso.com".into(),
            item_count: 10,
            total_size_mb: 100.0,
            quota_mb: 0.0,
            forwarding_address: None,
        };
        assert_eq!(mailbox.usage_pct(), 0.0);
    }

    #[test]
    fn test_external_forwarding_detection() {
        let mut mailbox = MailboxRecord {
            display_name: "User".into(),
            primary_address: "user@contoso.com".into(),
            item_count: 0,
            total_size_mb: 0.0,
            quota_mb: 1.0,
            forwarding_address: Some("backup@contoso.com".into()),
        };
        assert!(!mailbox.forwards_externally());
        mailbox.forwarding_address = Some("drop@fabrikam.com".into());
        assert!(mailbox.forwards_externally());
    }

    #[test]
    fn test_report_kind_expansion() {
        assert_eq!(ReportKind::All.selected().len(), 3);
        assert_eq!(ReportKind::Rooms.selected(), vec![ReportKind::Rooms]);
    }
}
