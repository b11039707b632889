//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for the email-router backend. It implements
//! the `IdentityService`, `TempEmailService` and `DashboardService` ports from the
//! `core` crate on top of `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use mail_router_core::domain::{
    ActionTaken, DashboardStats, EmailLogEntry, Identity, TemporaryAddress,
};
use mail_router_core::ports::{
    CredentialStore, DashboardService, IdentityService, PortError, PortResult, TempEmailService,
};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that talks to the backend's REST API.
///
/// Reads are retried up to `request_attempts` times on transport errors. Mutations
/// are sent exactly once.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
    request_attempts: usize,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend`. `base_url` must already be normalized.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        request_attempts: usize,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
            request_attempts: request_attempts.max(1),
            http: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::new(
            config.api_base_url.clone(),
            config.request_timeout,
            config.request_attempts,
            credentials,
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn me_path() -> &'static str {
        "/api/auth/me"
    }

    pub fn temp_emails_path() -> &'static str {
        "/api/temp-emails/"
    }

    pub fn temp_email_path(id: i64) -> String {
        format!("/api/temp-emails/{}", id)
    }

    pub fn stats_path() -> &'static str {
        "/api/dashboard/stats"
    }

    pub fn activity_path(limit: u32) -> String {
        format!("/api/dashboard/emails?limit={}", limit)
    }

    /// The bearer token for protected calls. A missing token never reaches the wire.
    async fn bearer(&self) -> PortResult<String> {
        self.credentials
            .load_token()
            .await?
            .ok_or(PortError::Unauthorized)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: &str,
        payload: Option<&serde_json::Value>,
    ) -> PortResult<reqwest::Response> {
        let url = self.endpoint(path);
        let attempts = if method == Method::GET {
            self.request_attempts
        } else {
            1
        };
        let mut last_error: Option<String> = None;

        for attempt in 0..attempts {
            let mut request = self
                .http
                .request(method.clone(), url.as_str())
                .bearer_auth(token)
                .header("x-request-id", format!("req_{}", Uuid::new_v4().simple()))
                .timeout(self.timeout);
            if let Some(body) = payload {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    warn!(%method, path, attempt, "Request failed: {}", error);
                    last_error = Some(error.to_string());
                }
            }
        }

        Err(PortError::Unexpected(format!(
            "{} {} failed: {}",
            method,
            path,
            last_error.unwrap_or_else(|| "unknown".to_string())
        )))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let token = self.bearer().await?;
        let response = self.send(Method::GET, path, &token, None).await?;
        decode_json_response(response).await
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: i64,
    email: String,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(with = "utc_timestamp")]
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct TempEmailRecord {
    id: i64,
    address: String,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(with = "utc_timestamp")]
    expires_at: DateTime<Utc>,
    is_active: bool,
    #[serde(with = "utc_timestamp")]
    created_at: DateTime<Utc>,
}
impl TempEmailRecord {
    fn to_domain(self) -> TemporaryAddress {
        TemporaryAddress {
            id: self.id,
            address: self.address,
            purpose: self.purpose.filter(|p| !p.trim().is_empty()),
            expires_at: self.expires_at,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct EmailLogRecord {
    id: i64,
    #[serde(default)]
    temp_email_id: Option<i64>,
    sender_email: String,
    subject: String,
    #[serde(default)]
    body_preview: Option<String>,
    action_taken: String,
    #[serde(default)]
    ai_confidence_score: Option<f64>,
    #[serde(default)]
    ai_reasoning: Option<String>,
    #[serde(with = "utc_timestamp")]
    created_at: DateTime<Utc>,
}
impl EmailLogRecord {
    fn to_domain(self) -> EmailLogEntry {
        EmailLogEntry {
            id: self.id,
            temp_email_id: self.temp_email_id,
            sender_email: self.sender_email,
            subject: self.subject,
            body_preview: self.body_preview,
            action_taken: ActionTaken::parse(&self.action_taken),
            ai_confidence_score: self.ai_confidence_score,
            ai_reasoning: self.ai_reasoning,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct StatsRecord {
    total_temp_emails: u64,
    active_temp_emails: u64,
    #[serde(default)]
    emails_forwarded: u64,
    #[serde(default)]
    emails_deleted: u64,
    #[serde(default)]
    recent_activity: Vec<EmailLogRecord>,
}
impl StatsRecord {
    fn to_domain(self) -> DashboardStats {
        DashboardStats {
            total_temp_emails: self.total_temp_emails,
            active_temp_emails: self.active_temp_emails,
            emails_forwarded: self.emails_forwarded,
            emails_deleted: self.emails_deleted,
            recent_activity: self
                .recent_activity
                .into_iter()
                .map(EmailLogRecord::to_domain)
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct CreateTempEmailRequest<'a> {
    purpose: Option<&'a str>,
}

fn default_true() -> bool {
    true
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl IdentityService for HttpBackend {
    async fn verify_identity(&self, token: &str) -> PortResult<Identity> {
        let response = self.send(Method::GET, Self::me_path(), token, None).await?;
        let record: UserRecord = decode_json_response(response).await?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl TempEmailService for HttpBackend {
    async fn list_addresses(&self) -> PortResult<Vec<TemporaryAddress>> {
        let records: Vec<TempEmailRecord> = self.get_json(Self::temp_emails_path()).await?;
        Ok(records.into_iter().map(TempEmailRecord::to_domain).collect())
    }

    async fn get_address(&self, id: i64) -> PortResult<TemporaryAddress> {
        let record: TempEmailRecord = self.get_json(&Self::temp_email_path(id)).await?;
        Ok(record.to_domain())
    }

    async fn create_address(&self, purpose: Option<&str>) -> PortResult<TemporaryAddress> {
        let token = self.bearer().await?;
        let payload = serde_json::to_value(CreateTempEmailRequest { purpose })
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = self
            .send(Method::POST, Self::temp_emails_path(), &token, Some(&payload))
            .await?;
        let record: TempEmailRecord = decode_json_response(response).await?;
        debug!(id = record.id, "Backend created temporary address.");
        Ok(record.to_domain())
    }

    async fn deactivate_address(&self, id: i64) -> PortResult<()> {
        let token = self.bearer().await?;
        let response = self
            .send(Method::DELETE, &Self::temp_email_path(id), &token, None)
            .await?;
        // The acknowledgement body carries nothing the client uses.
        let _: serde_json::Value = decode_json_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DashboardService for HttpBackend {
    async fn get_stats(&self) -> PortResult<DashboardStats> {
        let record: StatsRecord = self.get_json(Self::stats_path()).await?;
        Ok(record.to_domain())
    }

    async fn list_activity(&self, limit: u32) -> PortResult<Vec<EmailLogEntry>> {
        let records: Vec<EmailLogRecord> = self.get_json(&Self::activity_path(limit)).await?;
        Ok(records.into_iter().map(EmailLogRecord::to_domain).collect())
    }
}

//=========================================================================================
// Response Handling
//=========================================================================================

/// Maps a non-success HTTP status onto the port error taxonomy.
pub fn map_status(status: StatusCode, body: &[u8]) -> PortError {
    let body = String::from_utf8_lossy(body).trim().to_string();
    let body = if body.is_empty() {
        "<empty>".to_string()
    } else {
        body
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(body),
        s if s.is_client_error() => PortError::Rejected(format!("{}: {}", s, body)),
        s => PortError::Unexpected(format!("{}: {}", s, body)),
    }
}

async fn decode_json_response<T: DeserializeOwned>(response: reqwest::Response) -> PortResult<T> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PortError::Unexpected(format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(map_status(status, &bytes));
    }

    decode_body(&bytes)
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> PortResult<T> {
    serde_json::from_slice::<T>(bytes)
        .map_err(|e| PortError::Unexpected(format!("malformed response: {}", e)))
}

/// Accepts RFC 3339 timestamps as well as the naive ISO-8601 ones the backend emits,
/// which are UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
}

mod utc_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
