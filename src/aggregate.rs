use chrono::Timelike;
use std::collections::HashMap;
use crate::data_structures::{
    DeliveryStatus, MailboxRecord, MessageTraceRecord, ReportRecord, RoomMailboxRecord,
    SummaryStats,
};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `part` in `total`, rounded to 2 decimals. A zero total is
/// defined as 0 rather than a division error.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 * 100.0 / total as f64)
    }
}


#[derive(Clone, Debug)]
pub struct DomainBreakdown {
    pub domain: String,
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub avg_size_kb: f64,
}

impl ReportRecord for DomainBreakdown {
    fn field_names() -> &'static [&'static str] {
        &["Domain", "Total", "Delivered", "Failed", "SuccessRatePct", "AvgSizeKB"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.domain.clone(),
            self.total.to_string(),
            self.delivered.to_string(),
            self.failed.to_string(),
            format!("{:.2}", self.success_rate),
            format!("{:.2}", self.avg_size_kb),
        ]
    }

    fn css_class(&self) -> &'static str {
        if self.success_rate < 90.0 {
            "status-bad"
        } else if self.success_rate < 98.0 {
            "status-warn"
        } else {
            "status-ok"
        }
    }
}

/// Group message traces by recipient domain, descending by volume
/// (domain name breaks ties so the order is stable).
pub fn by_recipient_domain(records: &[MessageTraceRecord]) -> Vec<DomainBreakdown> {
    let mut groups: HashMap<&str, Vec<&MessageTraceRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.recipient_domain()).or_default().push(record);
    }

    let mut breakdown: Vec<DomainBreakdown> = groups
        .into_iter()
        .map(|(domain, members)| {
            let total = members.len();
            let delivered = members.iter().filter(|m| m.status == DeliveryStatus::Delivered).count();
            let failed = members.iter().filter(|m| m.status == DeliveryStatus::Failed).count();
            let size_kb: f64 = members.iter().map(|m| m.size_bytes as f64 / 1024.0).sum();
            DomainBreakdown {
                domain: domain.to_string(),
                total,
                delivered,
                failed,
                success_rate: percentage(delivered, total),
                avg_size_kb: if total == 0 { 0.0 } else { round2(size_kb / total as f64) },
            }
        })
        .collect();

    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.domain.cmp(&b.domain)));
    breakdown
}


#[derive(Clone, Debug)]
pub struct HourlyBreakdown {
    pub hour: u32,
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl ReportRecord for HourlyBreakdown {
    fn field_names() -> &'static [&'static str] {
        &["Hour", "Total", "Delivered", "Failed"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            format!("{:02}:00", self.hour),
            self.total.to_string(),
            self.delivered.to_string(),
            self.failed.to_string(),
        ]
    }
}

/// Time-series breakdown by hour of day, ascending by the natural key.
pub fn by_hour(records: &[MessageTraceRecord]) -> Vec<HourlyBreakdown> {
    let mut groups: HashMap<u32, (usize, usize, usize)> = HashMap::new();
    for record in records {
        let entry = groups.entry(record.received.hour()).or_default();
        entry.0 += 1;
        if record.status == DeliveryStatus::Delivered {
            entry.1 += 1;
        }
        if record.status == DeliveryStatus::Failed {
            entry.2 += 1;
        }
    }

    let mut breakdown: Vec<HourlyBreakdown> = groups
        .into_iter()
        .map(|(hour, (total, delivered, failed))| HourlyBreakdown { hour, total, delivered, failed })
        .collect();
    breakdown.sort_by_key(|b| b.hour);
    breakdown
}


#[derive(Clone, Debug)]
pub struct StatusBreakdown {
    pub status: DeliveryStatus,
    pub count: usize,
    pub share_pct: f64,
}

impl ReportRecord for StatusBreakdown {
    fn field_names() -> &'static [&'static str] {
        &["Status", "Count", "SharePct"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.status.as_str().to_string(),
            self.count.to_string(),
            format!("{:.2}", self.share_pct),
        ]
    }

    fn css_class(&self) -> &'static str {
        self.status.css_class()
    }
}

pub fn by_status(records: &[MessageTraceRecord]) -> Vec<StatusBreakdown> {
    let mut groups: HashMap<DeliveryStatus, usize> = HashMap::new();
    for record in records {
        *groups.entry(record.status).or_default() += 1;
    }

    let mut breakdown: Vec<StatusBreakdown> = groups
        .into_iter()
        .map(|(status, count)| StatusBreakdown {
            status,
            count,
            share_pct: percentage(count, records.len()),
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.as_str().cmp(b.status.as_str())));
    breakdown
}


/// Utilization banding with the canonical 80/50/20 cutoffs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UtilizationBand {
    High,
    Normal,
    Low,
    Unused,
}

impl UtilizationBand {
    pub fn from_rate(rate: f64) -> Self {
        if rate > 80.0 {
            UtilizationBand::High
        } else if rate > 50.0 {
            UtilizationBand::Normal
        } else if rate > 20.0 {
            UtilizationBand::Low
        } else {
            UtilizationBand::Unused
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UtilizationBand::High => "high",
            UtilizationBand::Normal => "normal",
            UtilizationBand::Low => "low",
            UtilizationBand::Unused => "unused",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            UtilizationBand::High | UtilizationBand::Normal => "status-ok",
            UtilizationBand::Low => "status-warn",
            UtilizationBand::Unused => "status-bad",
        }
    }
}

impl ReportRecord for RoomMailboxRecord {
    fn field_names() -> &'static [&'static str] {
        &["DisplayName", "PrimaryAddress", "Capacity", "Bookings", "BookedHours", "UtilizationPct", "Band"]
    }

    fn field_values(&self) -> Vec<String> {
        vec![
            self.display_name.clone(),
            self.primary_address.clone(),
            self.capacity.to_string(),
            self.bookings.to_string(),
            format!("{:.2}", self.booked_hours),
            format!("{:.2}", self.utilization_rate),
            UtilizationBand::from_rate(self.utilization_rate).as_str().to_string(),
        ]
    }

    fn css_class(&self) -> &'static str {
        UtilizationBand::from_rate(self.utilization_rate).css_class()
    }
}


pub fn mail_flow_summary(records: &[MessageTraceRecord]) -> SummaryStats {
    let total = records.len();
    let delivered = records.iter().filter(|r| r.status == DeliveryStatus::Delivered).count();
    let failed = records.iter().filter(|r| r.status == DeliveryStatus::Failed).count();
    let filtered = records
        .iter()
        .filter(|r| {
            matches!(
                r.status,
                DeliveryStatus::FilteredAsSpam | DeliveryStatus::Quarantined
            )
        })
        .count();
    let sender_domains: std::collections::HashSet<&str> =
        records.iter().map(|r| r.sender_domain()).collect();
    let recipient_domains: std::collections::HashSet<&str> =
        records.iter().map(|r| r.recipient_domain()).collect();
    let size_kb: f64 = records.iter().map(|r| r.size_bytes as f64 / 1024.0).sum();

    let mut stats = SummaryStats::new();
    stats.push("Messages", total);
    stats.push("Delivered", delivered);
    stats.push("Failed", failed);
    stats.push("Success rate %", format!("{:.2}", percentage(delivered, total)));
    stats.push("Spam/quarantined", filtered);
    stats.push("Spam share %", format!("{:.2}", percentage(filtered, total)));
    stats.push("Sender domains", sender_domains.len());
    stats.push("Recipient domains", recipient_domains.len());
    stats.push(
        "Avg size KB",
        format!("{:.2}", if total == 0 { 0.0 } else { round2(size_kb / total as f64) }),
    );
    stats
}

pub fn mailbox_summary(records: &[MailboxRecord]) -> SummaryStats {
    let total = records.len();
    let total_size_gb: f64 = records.iter().map(|r| r.total_size_mb / 1024.0).sum();
    let usage_sum: f64 = records.iter().map(|r| r.usage_pct()).sum();
    let near_quota = records.iter().filter(|r| r.usage_pct() > 90.0).count();
    let forwarding = records.iter().filter(|r| r.forwarding_address.is_some()).count();
    let external_forwarding = records.iter().filter(|r| r.forwards_externally()).count();

    let mut stats = SummaryStats::new();
    stats.push("Mailboxes", total);
    stats.push("Total size GB", format!("{:.2}", total_size_gb));
    stats.push(
        "Avg usage %",
        format!("{:.2}", if total == 0 { 0.0 } else { round2(usage_sum / total as f64) }),
    );
    stats.push("Above 90% quota", near_quota);
    stats.push("Forwarding set", forwarding);
    stats.push("External forwarding", external_forwarding);
    stats
}

pub fn room_summary(records: &[RoomMailboxRecord]) -> SummaryStats {
    let total = records.len();
    let rate_sum: f64 = records.iter().map(|r| r.utilization_rate).sum();
    let band_count = |band: UtilizationBand| {
        records
            .iter()
            .filter(|r| UtilizationBand::from_rate(r.utilization_rate) == band)
            .count()
    };

    let mut stats = SummaryStats::new();
    stats.push("Rooms", total);
    stats.push(
        "Avg utilization %",
        format!("{:.2}", if total == 0 { 0.0 } else { round2(rate_sum / total as f64) }),
    );
    stats.push("High (>80%)", band_count(UtilizationBand::High));
    stats.push("Normal (50-80%)", band_count(UtilizationBand::Normal));
    stats.push("Low (20-50%)", band_count(UtilizationBand::Low));
    stats.push("Unused (<=20%)", band_count(UtilizationBand::Unused));
    stats
}
