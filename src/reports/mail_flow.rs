use log::info;
use crate::aggregate;
use crate::api_connection::DataFetcher;
use crate::config::Config;
use crate::data_structures::{CliArgs, ReportArtifact, ReportKind, ReportRecords, ReportWindow};
use crate::error::Result;
use crate::interfaces::{csv_interface, html_interface};
use crate::pipeline;
use crate::sample_data;

/// Mail-flow analysis: message traces over the window, broken down by
/// recipient domain, hour of day and delivery status, with transport rules
/// and connectors as optional side tables.
pub async fn run(fetcher: &dyn DataFetcher, config: &Config, args: &CliArgs) -> Result<ReportArtifact> {
    let window = ReportWindow::last_days(config.get_days_back(args.days_back));
    let cap = config.get_sample_size(args.sample_size);

    let source = pipeline::fetch_or_sample(
        "message trace",
        fetcher.message_trace(&window, cap).await,
        |n| sample_data::message_traces(&window, n),
        cap,
    )?;
    let records = source.records();

    let mut stats = aggregate::mail_flow_summary(records);
    let domains = aggregate::by_recipient_domain(records);
    let hours = aggregate::by_hour(records);
    let statuses = aggregate::by_status(records);

    let mut sections = vec![
        html_interface::section("Volume by recipient domain", &domains),
        html_interface::section("Delivery status breakdown", &statuses),
        html_interface::section("Volume by hour of day", &hours),
    ];

    if config.include_transport_rules() {
        let rules = if source.is_synthetic() {
            sample_data::transport_rules()
        } else {
            pipeline::optional_fetch("transport rule", fetcher.transport_rules().await)
        };
        stats.push("Transport rules", rules.len());
        sections.push(html_interface::section("Transport rules", &rules));
    }

    if config.include_connectors() {
        let connectors = if source.is_synthetic() {
            sample_data::connectors()
        } else {
            pipeline::optional_fetch("connector", fetcher.connectors().await)
        };
        stats.push("Connectors", connectors.len());
        sections.push(html_interface::section("Connectors", &connectors));
    }

    let mut recent = records.to_vec();
    recent.sort_by(|a, b| b.received.cmp(&a.received));
    sections.push(html_interface::section("Most recent messages", &recent));

    let dir = config.ensure_report_dir(args.output_dir.as_deref(), ReportKind::MailFlow.dir_name())?;
    let csv_path = csv_interface::write_csv(&dir, "mail_flow", records)?;
    let document =
        html_interface::render_document("Mail Flow Report", &stats, &sections, source.is_synthetic());
    let html_path = html_interface::write_html(&dir, "mail_flow", &document)?;

    info!(
        "Mail flow report written ({} records, {} data): {}",
        records.len(),
        source.label(),
        html_path.display()
    );

    Ok(ReportArtifact {
        report: ReportKind::MailFlow,
        csv_path,
        html_path,
        records: ReportRecords::MailFlow(source),
        summary: stats,
    })
}
