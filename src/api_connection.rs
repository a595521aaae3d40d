use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use crate::config::TenantConfig;
use crate::data_structures::{
    ConnectorRecord, DeliveryStatus, MailboxRecord, MessageTraceRecord, ReportWindow,
    RoomMailboxRecord, TransportRuleRecord,
};
use crate::error::{ReportError, Result};

const API_VERSION: &str = "v1.0";

/// Read access to the reporting surface of the mail service. The live
/// implementation is [`ApiConnection`]; pipelines only see this trait so the
/// sample-data fallback and tests can substitute their own.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Primary fetch for the mail-flow report.
    async fn message_trace(&self, window: &ReportWindow, cap: usize) -> Result<Vec<MessageTraceRecord>>;

    /// Primary fetch for the mailbox capacity report.
    async fn mailboxes(&self, cap: usize) -> Result<Vec<MailboxRecord>>;

    /// Primary fetch for the room utilization report. Booking fields are
    /// zeroed; `room_bookings` enriches them per room.
    async fn room_mailboxes(&self, cap: usize) -> Result<Vec<RoomMailboxRecord>>;

    /// Booking count and booked hours for one room over the window.
    async fn room_bookings(&self, room_address: &str, window: &ReportWindow) -> Result<(u32, f64)>;

    /// Optional sub-fetch; callers degrade failures to an empty set.
    async fn transport_rules(&self) -> Result<Vec<TransportRuleRecord>>;

    /// Optional sub-fetch; callers degrade failures to an empty set.
    async fn connectors(&self) -> Result<Vec<ConnectorRecord>>;
}


pub struct ApiConnection {
    client: Client,
    access_token: String,
    api_base: String,
}

/// Acquire a client-credential token and wrap it in a connection handle.
/// The handle is passed explicitly into every pipeline; there is no global
/// session state.
pub async fn get_api_connection(tenant: &TenantConfig) -> Result<ApiConnection> {

    if tenant.tenant_id.is_empty() || tenant.client_id.is_empty() {
        return Err(ReportError::NotConfigured(
            "tenant_id and client_id must be set".to_string()));
    }
    let secret = tenant.get_secret()?;
    let (login_base, api_base) = tenant.get_endpoints()?;

    let client = Client::new();
    let token_url = format!("{}/{}/oauth2/v2.0/token", login_base, tenant.tenant_id);
    let params = [
        ("client_id", tenant.client_id.as_str()),
        ("client_secret", secret.as_str()),
        ("grant_type", "client_credentials"),
        ("scope", &format!("{}/.default", api_base)),
    ];

    let response = client
        .post(&token_url)
        .form(&params)
        .send()
        .await
        .map_err(|e| ReportError::ServiceUnavailable(format!("token endpoint unreachable: {}", e)))?;

    let status = response.status();
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
        let body = response.text().await.unwrap_or_default();
        return Err(ReportError::NotConfigured(format!("credentials rejected: {}", body)));
    }
    if !status.is_success() {
        return Err(ReportError::ServiceUnavailable(format!("token request failed: HTTP {}", status)));
    }

    let token: TokenResponse = response.json().await?;
    info!("Acquired access token for tenant {}", tenant.tenant_id);

    Ok(ApiConnection {
        client,
        access_token: token.access_token,
        api_base,
    })
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Paginated<T> {
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

impl ApiConnection {

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/{}", self.api_base, API_VERSION, endpoint.trim_start_matches('/'))
    }

    /// GET an absolute URL and deserialize, mapping HTTP status to the error
    /// taxonomy: 401/403 to PermissionDenied, everything else non-success to
    /// ServiceUnavailable.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ReportError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(ReportError::PermissionDenied(format!("{} for {}: {}", status, url, body)))
            }
            s if s.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| ReportError::ServiceUnavailable(format!("malformed response from {}: {}", url, e))),
            s => Err(ReportError::ServiceUnavailable(format!("HTTP {} for {}", s, url))),
        }
    }

    /// Follow `@odata.nextLink` pages until `cap` items are collected or the
    /// pages run out.
    async fn get_all_pages<T: DeserializeOwned>(&self, endpoint: &str, cap: usize) -> Result<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut current = self.url(endpoint);

        loop {
            let page: Paginated<T> = self.get_json(&current).await?;
            items.extend(page.value);
            if items.len() >= cap {
                items.truncate(cap);
                break;
            }
            match page.next_link {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(items)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageTraceRow {
    received_date_time: DateTime<Utc>,
    sender_address: String,
    recipient_address: String,
    subject: Option<String>,
    status: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxRow {
    display_name: String,
    email_address: String,
    item_count: Option<u64>,
    storage_used_mb: Option<f64>,
    quota_mb: Option<f64>,
    forwarding_smtp_address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRow {
    display_name: String,
    email_address: String,
    capacity: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransportRuleRow {
    name: String,
    state: Option<String>,
    priority: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectorRow {
    name: String,
    direction: Option<String>,
    enabled: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEventRow {
    start: EventTime,
    end: EventTime,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
}

impl EventTime {
    fn parse(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date_time, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

#[async_trait]
impl DataFetcher for ApiConnection {

    async fn message_trace(&self, window: &ReportWindow, cap: usize) -> Result<Vec<MessageTraceRecord>> {
        let endpoint = format!(
            "reports/messageTrace?$filter=receivedDateTime ge {} and receivedDateTime lt {}&$top={}",
            window.start.format("%Y-%m-%dT%H:%M:%SZ"),
            window.end.format("%Y-%m-%dT%H:%M:%SZ"),
            cap.min(1000),
        );
        let rows: Vec<MessageTraceRow> = self.get_all_pages(&endpoint, cap).await?;
        Ok(rows
            .into_iter()
            .map(|row| MessageTraceRecord {
                received: row.received_date_time,
                sender_address: row.sender_address,
                recipient_address: row.recipient_address,
                subject: row.subject.unwrap_or_default(),
                status: DeliveryStatus::parse(&row.status),
                size_bytes: row.size.unwrap_or(0),
            })
            .collect())
    }

    async fn mailboxes(&self, cap: usize) -> Result<Vec<MailboxRecord>> {
        let endpoint = format!("reports/mailboxUsage?$top={}", cap.min(1000));
        let rows: Vec<MailboxRow> = self.get_all_pages(&endpoint, cap).await?;
        Ok(rows
            .into_iter()
            .map(|row| MailboxRecord {
                display_name: row.display_name,
                primary_address: row.email_address,
                item_count: row.item_count.unwrap_or(0),
                total_size_mb: row.storage_used_mb.unwrap_or(0.0),
                quota_mb: row.quota_mb.unwrap_or(0.0),
                forwarding_address: row.forwarding_smtp_address,
            })
            .collect())
    }

    async fn room_mailboxes(&self, cap: usize) -> Result<Vec<RoomMailboxRecord>> {
        let endpoint = format!("places/microsoft.graph.room?$top={}", cap.min(1000));
        let rows: Vec<RoomRow> = self.get_all_pages(&endpoint, cap).await?;
        Ok(rows
            .into_iter()
            .map(|row| RoomMailboxRecord {
                display_name: row.display_name,
                primary_address: row.email_address,
                capacity: row.capacity.unwrap_or(0),
                bookings: 0,
                booked_hours: 0.0,
                utilization_rate: 0.0,
            })
            .collect())
    }

    async fn room_bookings(&self, room_address: &str, window: &ReportWindow) -> Result<(u32, f64)> {
        let endpoint = format!(
            "users/{}/calendarView?startDateTime={}&endDateTime={}&$top=999",
            room_address,
            window.start.format("%Y-%m-%dT%H:%M:%SZ"),
            window.end.format("%Y-%m-%dT%H:%M:%SZ"),
        );
        let events: Vec<CalendarEventRow> = self.get_all_pages(&endpoint, 999).await?;

        let mut booked_hours = 0.0;
        for event in &events {
            if let (Some(start), Some(end)) = (event.start.parse(), event.end.parse()) {
                let minutes = (end - start).num_minutes();
                if minutes > 0 {
                    booked_hours += minutes as f64 / 60.0;
                }
            }
        }
        Ok((events.len() as u32, booked_hours))
    }

    async fn transport_rules(&self) -> Result<Vec<TransportRuleRecord>> {
        let rows: Vec<TransportRuleRow> =
            self.get_all_pages("admin/exchange/transportRules", 1000).await?;
        Ok(rows
            .into_iter()
            .map(|row| TransportRuleRecord {
                name: row.name,
                state: row.state.unwrap_or_else(|| "Unknown".to_string()),
                priority: row.priority.unwrap_or(0),
            })
            .collect())
    }

    async fn connectors(&self) -> Result<Vec<ConnectorRecord>> {
        let rows: Vec<ConnectorRow> =
            self.get_all_pages("admin/exchange/connectors", 1000).await?;
        Ok(rows
            .into_iter()
            .map(|row| ConnectorRecord {
                name: row.name,
                direction: row.direction.unwrap_or_else(|| "Unknown".to_string()),
                enabled: row.enabled.unwrap_or(false),
            })
            .collect())
    }
}


/// Stand-in fetcher used when the connection itself could not be established.
/// Every fetch reports the original failure, which routes each pipeline onto
/// the sample-data path uniformly.
pub struct OfflineFetcher {
    reason: String,
}

impl OfflineFetcher {
    pub fn new(reason: String) -> Self {
        OfflineFetcher { reason }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(ReportError::ServiceUnavailable(self.reason.clone()))
    }
}

#[async_trait]
impl DataFetcher for OfflineFetcher {
    async fn message_trace(&self, _window: &ReportWindow, _cap: usize) -> Result<Vec<MessageTraceRecord>> {
        self.unavailable()
    }

    async fn mailboxes(&self, _cap: usize) -> Result<Vec<MailboxRecord>> {
        self.unavailable()
    }

    async fn room_mailboxes(&self, _cap: usize) -> Result<Vec<RoomMailboxRecord>> {
        self.unavailable()
    }

    async fn room_bookings(&self, _room_address: &str, _window: &ReportWindow) -> Result<(u32, f64)> {
        self.unavailable()
    }

    async fn transport_rules(&self) -> Result<Vec<TransportRuleRecord>> {
        self.unavailable()
    }

    async fn connectors(&self) -> Result<Vec<ConnectorRecord>> {
        self.unavailable()
    }
}
