use log::{info, warn};
use crate::aggregate::{self, round2};
use crate::api_connection::DataFetcher;
use crate::config::Config;
use crate::data_structures::{CliArgs, DataSource, ReportArtifact, ReportKind, ReportRecords, ReportWindow, RoomMailboxRecord};
use crate::error::{ReportError, Result};
use crate::interfaces::{csv_interface, html_interface};
use crate::pipeline;
use crate::sample_data;

/// Bookable hours per day used as the theoretical capacity baseline.
const BUSINESS_HOURS_PER_DAY: i64 = 8;

/// Room-resource utilization audit: booking activity per room mailbox as a
/// percentage of business-hours capacity over the window, banded into
/// high/normal/low/unused.
pub async fn run(fetcher: &dyn DataFetcher, config: &Config, args: &CliArgs) -> Result<ReportArtifact> {
    let window = ReportWindow::last_days(config.get_days_back(args.days_back));
    let cap = config.get_sample_size(args.sample_size);

    let source = pipeline::fetch_or_sample(
        "room mailbox",
        fetcher.room_mailboxes(cap).await,
        |n| sample_data::room_mailboxes(&window, n),
        cap,
    )?;

    // Live rooms come back without booking data; enrich per room. A room
    // whose calendar cannot be read keeps placeholder zeroes and the run
    // continues.
    let source = match source {
        DataSource::Real(mut rooms) => {
            for room in rooms.iter_mut() {
                match fetcher.room_bookings(&room.primary_address, &window).await {
                    Ok((bookings, booked_hours)) => {
                        room.bookings = bookings;
                        room.booked_hours = round2(booked_hours);
                    }
                    Err(e) => {
                        let partial = ReportError::PartialData(format!(
                            "calendar for {} unavailable: {}",
                            room.primary_address, e
                        ));
                        warn!("{}", partial);
                    }
                }
            }
            DataSource::Real(rooms)
        }
        synthetic => synthetic,
    };

    let bookable_hours = (window.days() * BUSINESS_HOURS_PER_DAY) as f64;
    let mut records: Vec<RoomMailboxRecord> = source
        .records()
        .iter()
        .cloned()
        .map(|mut room| {
            room.utilization_rate = if bookable_hours <= 0.0 {
                0.0
            } else {
                round2(room.booked_hours * 100.0 / bookable_hours)
            };
            room
        })
        .collect();
    records.sort_by(|a, b| {
        b.utilization_rate
            .partial_cmp(&a.utilization_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let stats = aggregate::room_summary(&records);
    let sections = vec![html_interface::section("Rooms by utilization", &records)];

    let dir = config.ensure_report_dir(args.output_dir.as_deref(), ReportKind::Rooms.dir_name())?;
    let csv_path = csv_interface::write_csv(&dir, "room_utilization", &records)?;
    let document = html_interface::render_document(
        "Room Utilization Report",
        &stats,
        &sections,
        source.is_synthetic(),
    );
    let html_path = html_interface::write_html(&dir, "room_utilization", &document)?;

    info!(
        "Room utilization report written ({} records, {} data): {}",
        records.len(),
        source.label(),
        html_path.display()
    );

    Ok(ReportArtifact {
        report: ReportKind::Rooms,
        csv_path,
        html_path,
        records: ReportRecords::Rooms(source.derive(records)),
        summary: stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{ConnectorRecord, MailboxRecord, MessageTraceRecord, TransportRuleRecord};
    use crate::reports::test_support::{test_args, test_config};
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Two live rooms; only the first has a readable calendar.
    struct PartialCalendarFetcher;

    #[async_trait]
    impl DataFetcher for PartialCalendarFetcher {
        async fn message_trace(
            &self,
            _window: &ReportWindow,
            _cap: usize,
        ) -> crate::error::Result<Vec<MessageTraceRecord>> {
            Err(ReportError::ServiceUnavailable("not under test".into()))
        }

        async fn mailboxes(&self, _cap: usize) -> crate::error::Result<Vec<MailboxRecord>> {
            Err(ReportError::ServiceUnavailable("not under test".into()))
        }

        async fn room_mailboxes(&self, _cap: usize) -> crate::error::Result<Vec<RoomMailboxRecord>> {
            let room = |name: &str, address: &str| RoomMailboxRecord {
                display_name: name.to_string(),
                primary_address: address.to_string(),
                capacity: 8,
                bookings: 0,
                booked_hours: 0.0,
                utilization_rate: 0.0,
            };
            Ok(vec![
                room("Aurora", "room.aurora@contoso.com"),
                room("Borealis", "room.borealis@contoso.com"),
            ])
        }

        async fn room_bookings(
            &self,
            room_address: &str,
            _window: &ReportWindow,
        ) -> crate::error::Result<(u32, f64)> {
            if room_address == "room.aurora@contoso.com" {
                Ok((10, 20.0))
            } else {
                Err(ReportError::PermissionDenied("calendar denied".into()))
            }
        }

        async fn transport_rules(&self) -> crate::error::Result<Vec<TransportRuleRecord>> {
            Ok(Vec::new())
        }

        async fn connectors(&self) -> crate::error::Result<Vec<ConnectorRecord>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_partial_enrichment_keeps_placeholder_rows() {
        let dir = tempdir().unwrap();
        let config = test_config();
        let args = test_args(dir.path().to_str().unwrap(), 10);

        let artifact = run(&PartialCalendarFetcher, &config, &args).await.unwrap();

        assert!(!artifact.is_synthetic());
        assert_eq!(artifact.record_count(), 2);
        assert_eq!(artifact.summary.get("Rooms"), Some("2"));

        // 20 booked hours over 5 days * 8 bookable hours = 50% for Aurora;
        // Borealis keeps placeholder zeroes and lands in the unused band.
        assert_eq!(artifact.summary.get("Low (20-50%)"), Some("1"));
        assert_eq!(artifact.summary.get("Unused (<=20%)"), Some("1"));

        // The carried set is the final one: enriched, rated, sorted.
        let rooms = match &artifact.records {
            ReportRecords::Rooms(set) => set.records(),
            other => panic!("wrong record set variant: {:?}", other),
        };
        assert_eq!(rooms[0].display_name, "Aurora");
        assert_eq!(rooms[0].utilization_rate, 50.0);
        assert_eq!(rooms[1].booked_hours, 0.0);
    }
}
