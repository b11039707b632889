//! services/client/src/error.rs
//!
//! Defines the primary error type for the dashboard client.

use crate::config::ConfigError;
use mail_router_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., reading the confirmation prompt).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A protected operation was attempted without an authenticated session.
    #[error("The session is not authenticated")]
    NotAuthenticated,

    /// Another mutation on the same target has not completed yet.
    #[error("A mutation on {0} is still in flight")]
    MutationInFlight(String),

    /// A deactivation prompt for this address is still waiting for an answer.
    #[error("A confirmation for address {0} is still open")]
    ConfirmationPending(i64),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
