use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use crate::data_structures::{
    ConnectorRecord, DeliveryStatus, MailboxRecord, MessageTraceRecord, ReportWindow,
    RoomMailboxRecord, TransportRuleRecord,
};

// Fixed pools keep generated reports recognizable as sample data while
// exercising the same grouping keys as live data.
const SAMPLE_DOMAINS: &[&str] = &[
    "contoso.com",
    "fabrikam.com",
    "northwindtraders.com",
    "adventure-works.com",
    "tailspintoys.com",
];

const SAMPLE_USERS: &[&str] = &[
    "adele.vance", "alex.wilber", "diego.siciliani", "grady.archie", "henrietta.mueller",
    "isaiah.langer", "johanna.lorenz", "lee.gu", "lidia.holloway", "lynne.robbins",
    "megan.bowen", "miriam.graham", "nestor.wilke", "patti.fernandez", "pradeep.gupta",
];

const SAMPLE_SUBJECTS: &[&str] = &[
    "Weekly status update",
    "Invoice attached",
    "RE: Project kickoff",
    "Meeting notes",
    "Quarterly figures",
    "Out of office handover",
    "Password expiry notice",
    "FW: Customer escalation",
];

const SAMPLE_ROOMS: &[(&str, u32)] = &[
    ("Boardroom", 16),
    ("Aurora", 8),
    ("Borealis", 8),
    ("Huddle 1", 4),
    ("Huddle 2", 4),
    ("Town Hall", 60),
];

// Roughly 70% delivered, matching what a healthy tenant looks like.
const STATUS_POOL: &[DeliveryStatus] = &[
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Delivered,
    DeliveryStatus::Failed,
    DeliveryStatus::Pending,
    DeliveryStatus::FilteredAsSpam,
];

fn sample_address(rng: &mut impl Rng) -> String {
    let user = SAMPLE_USERS.choose(rng).unwrap_or(&"someone");
    let domain = SAMPLE_DOMAINS.choose(rng).unwrap_or(&"contoso.com");
    format!("{}@{}", user, domain)
}

/// Synthetic message traces spread across the window, schema-identical to the
/// live fetch so the aggregation path needs no branching.
pub fn message_traces(window: &ReportWindow, count: usize) -> Vec<MessageTraceRecord> {
    let mut rng = rand::thread_rng();
    let span_secs = (window.end - window.start).num_seconds().max(1);

    (0..count)
        .map(|_| {
            let offset = rng.gen_range(0..span_secs);
            MessageTraceRecord {
                received: window.start + Duration::seconds(offset),
                sender_address: sample_address(&mut rng),
                recipient_address: sample_address(&mut rng),
                subject: SAMPLE_SUBJECTS.choose(&mut rng).unwrap_or(&"(no subject)").to_string(),
                status: *STATUS_POOL.choose(&mut rng).unwrap_or(&DeliveryStatus::Delivered),
                size_bytes: rng.gen_range(2_048..5_000_000),
            }
        })
        .collect()
}

pub fn mailboxes(count: usize) -> Vec<MailboxRecord> {
    let mut rng = rand::thread_rng();

    (0..count)
        .map(|i| {
            let user = SAMPLE_USERS[i % SAMPLE_USERS.len()];
            let domain = SAMPLE_DOMAINS[i % SAMPLE_DOMAINS.len()];
            let quota_mb = 51_200.0;
            let forwarding = if rng.gen_range(0..10) == 0 {
                Some(sample_address(&mut rng))
            } else {
                None
            };
            MailboxRecord {
                display_name: user.replace('.', " "),
                primary_address: format!("{}@{}", user, domain),
                item_count: rng.gen_range(500..120_000),
                total_size_mb: rng.gen_range(100.0..quota_mb),
                quota_mb,
                forwarding_address: forwarding,
            }
        })
        .collect()
}

/// Synthetic rooms with booking activity already filled in; the live path
/// fills bookings via per-room calendar enrichment instead.
pub fn room_mailboxes(window: &ReportWindow, count: usize) -> Vec<RoomMailboxRecord> {
    let mut rng = rand::thread_rng();
    let bookable_hours = (window.days() * 8) as f64;

    (0..count)
        .map(|i| {
            let (name, capacity) = SAMPLE_ROOMS[i % SAMPLE_ROOMS.len()];
            let booked_hours = rng.gen_range(0.0..bookable_hours);
            let bookings = (booked_hours / 1.5).round() as u32;
            RoomMailboxRecord {
                display_name: format!("{} {}", name, i / SAMPLE_ROOMS.len() + 1),
                primary_address: format!(
                    "room.{}@{}",
                    name.to_lowercase().replace(' ', ""),
                    SAMPLE_DOMAINS[0]
                ),
                capacity,
                bookings,
                booked_hours: (booked_hours * 100.0).round() / 100.0,
                utilization_rate: 0.0,
            }
        })
        .collect()
}

pub fn transport_rules() -> Vec<TransportRuleRecord> {
    vec![
        TransportRuleRecord {
            name: "Block executable attachments".to_string(),
            state: "Enabled".to_string(),
            priority: 0,
        },
        TransportRuleRecord {
            name: "External mail disclaimer".to_string(),
            state: "Enabled".to_string(),
            priority: 1,
        },
        TransportRuleRecord {
            name: "Legacy journaling rule".to_string(),
            state: "Disabled".to_string(),
            priority: 2,
        },
    ]
}

pub fn connectors() -> Vec<ConnectorRecord> {
    vec![
        ConnectorRecord {
            name: "Inbound from scanner appliance".to_string(),
            direction: "Inbound".to_string(),
            enabled: true,
        },
        ConnectorRecord {
            name: "Outbound smart host".to_string(),
            direction: "Outbound".to_string(),
            enabled: true,
        },
    ]
}
