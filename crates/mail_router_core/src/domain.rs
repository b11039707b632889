//! crates/mail_router_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};

//=========================================================================================
// Session
//=========================================================================================

/// The client's belief about whether the current user is authenticated.
///
/// `Unresolved -> Resolving -> {Authenticated, Unauthenticated}`. Leaving
/// `Authenticated` is only possible towards `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unresolved,
    Resolving,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// True once the gate has reached a final decision.
    pub fn is_resolved(self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Unauthenticated)
    }
}

/// A point-in-time view of the session.
///
/// `epoch` increases on every transition, so anything captured under one epoch
/// can be recognised as stale once the session has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub state: AuthState,
    pub epoch: u64,
}

impl Session {
    pub fn unresolved() -> Self {
        Self {
            state: AuthState::Unresolved,
            epoch: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }
}

/// The identity confirmed by the backend for a credential.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Temporary Addresses
//=========================================================================================

/// A disposable address owned by the backend. `id` is the sole identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryAddress {
    pub id: i64,
    pub address: String,
    pub purpose: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Classification Log
//=========================================================================================

/// What the backend did with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTaken {
    Forward,
    Delete,
    /// Any action label this client does not know about yet.
    Other(String),
}

impl ActionTaken {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" => ActionTaken::Forward,
            "delete" => ActionTaken::Delete,
            _ => ActionTaken::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionTaken::Forward => "forward",
            ActionTaken::Delete => "delete",
            ActionTaken::Other(raw) => raw,
        }
    }
}

/// One backend classification decision for an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailLogEntry {
    pub id: i64,
    pub temp_email_id: Option<i64>,
    pub sender_email: String,
    pub subject: String,
    pub body_preview: Option<String>,
    pub action_taken: ActionTaken,
    pub ai_confidence_score: Option<f64>,
    pub ai_reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate snapshot computed and owned by the backend.
///
/// The client never derives these numbers itself; `recent_activity` is kept in
/// the order it was delivered (newest first).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardStats {
    pub total_temp_emails: u64,
    pub active_temp_emails: u64,
    pub emails_forwarded: u64,
    pub emails_deleted: u64,
    pub recent_activity: Vec<EmailLogEntry>,
}

//=========================================================================================
// Navigation
//=========================================================================================

/// The views the client can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}
