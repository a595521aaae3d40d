use log::info;
use crate::aggregate;
use crate::api_connection::DataFetcher;
use crate::config::Config;
use crate::data_structures::{CliArgs, MailboxRecord, ReportArtifact, ReportKind, ReportRecords};
use crate::error::Result;
use crate::interfaces::{csv_interface, html_interface};
use crate::pipeline;
use crate::sample_data;

/// Mailbox capacity and forwarding report: per-mailbox size, quota usage and
/// forwarding targets, largest mailboxes first.
pub async fn run(fetcher: &dyn DataFetcher, config: &Config, args: &CliArgs) -> Result<ReportArtifact> {
    let cap = config.get_sample_size(args.sample_size);

    let source = pipeline::fetch_or_sample(
        "mailbox statistics",
        fetcher.mailboxes(cap).await,
        sample_data::mailboxes,
        cap,
    )?;

    let mut records: Vec<MailboxRecord> = source.records().to_vec();
    records.sort_by(|a, b| {
        b.total_size_mb
            .partial_cmp(&a.total_size_mb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let stats = aggregate::mailbox_summary(&records);

    let forwarding: Vec<MailboxRecord> = records
        .iter()
        .filter(|r| r.forwarding_address.is_some())
        .cloned()
        .collect();

    let sections = vec![
        html_interface::section("Largest mailboxes", &records),
        html_interface::section("Mailboxes with forwarding", &forwarding),
    ];

    let dir = config.ensure_report_dir(args.output_dir.as_deref(), ReportKind::Mailbox.dir_name())?;
    let csv_path = csv_interface::write_csv(&dir, "mailbox", &records)?;
    let document = html_interface::render_document(
        "Mailbox Capacity Report",
        &stats,
        &sections,
        source.is_synthetic(),
    );
    let html_path = html_interface::write_html(&dir, "mailbox", &document)?;

    info!(
        "Mailbox report written ({} records, {} data): {}",
        records.len(),
        source.label(),
        html_path.display()
    );

    Ok(ReportArtifact {
        report: ReportKind::Mailbox,
        csv_path,
        html_path,
        records: ReportRecords::Mailbox(source.derive(records)),
        summary: stats,
    })
}
