//! crates/mail_router_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client's orchestration depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the HTTP backend, local storage and whatever drives navigation.

use async_trait::async_trait;
use crate::domain::{DashboardStats, EmailLogEntry, Identity, Route, TemporaryAddress};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, filesystem).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Backend Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Confirms which identity the given credential belongs to.
    async fn verify_identity(&self, token: &str) -> PortResult<Identity>;
}

#[async_trait]
pub trait TempEmailService: Send + Sync {
    async fn list_addresses(&self) -> PortResult<Vec<TemporaryAddress>>;

    async fn get_address(&self, id: i64) -> PortResult<TemporaryAddress>;

    /// Creates a new address. Id, address and expiry are assigned by the backend.
    async fn create_address(&self, purpose: Option<&str>) -> PortResult<TemporaryAddress>;

    /// Marks an address inactive. Deactivating an inactive address is a no-op.
    async fn deactivate_address(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn get_stats(&self) -> PortResult<DashboardStats>;

    /// Returns up to `limit` log entries, newest first.
    async fn list_activity(&self, limit: u32) -> PortResult<Vec<EmailLogEntry>>;
}

//=========================================================================================
// Client-local Ports
//=========================================================================================

/// Storage for the single opaque credential token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load_token(&self) -> PortResult<Option<String>>;
    async fn save_token(&self, token: &str) -> PortResult<()>;
    async fn clear_token(&self) -> PortResult<()>;
}

/// Whatever moves the user between views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
