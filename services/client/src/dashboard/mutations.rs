//! services/client/src/dashboard/mutations.rs
//!
//! Create and deactivate commands for temporary addresses.
//!
//! A mutation here only talks to the backend and reports `Ok`/`Err`. Refreshing the
//! view afterwards is the caller's step (see `Dashboard`).

use crate::dashboard::{
    session_gate::SessionGate,
    state::{AppState, CreateForm, ViewStore},
};
use crate::error::ClientError;
use mail_router_core::domain::{Route, Session, TemporaryAddress};
use std::sync::Arc;
use tracing::{error, info};

/// Proof that the user was asked to confirm deactivating `id`.
///
/// Only `MutationCoordinator::request_deactivation` creates one, and confirming or
/// declining consumes it, so a deactivation request cannot be issued unconfirmed.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending deactivation must be confirmed or declined"]
pub struct PendingDeactivation {
    id: i64,
    epoch: u64,
}

impl PendingDeactivation {
    pub fn id(&self) -> i64 {
        self.id
    }
}

pub struct MutationCoordinator {
    app: Arc<AppState>,
    gate: Arc<SessionGate>,
    view: Arc<ViewStore>,
}

impl MutationCoordinator {
    pub fn new(app: Arc<AppState>, gate: Arc<SessionGate>, view: Arc<ViewStore>) -> Self {
        Self { app, gate, view }
    }

    fn require_session(&self) -> Result<Session, ClientError> {
        let session = self.gate.current();
        if session.is_authenticated() {
            Ok(session)
        } else {
            self.app.navigator.navigate(Route::Login);
            Err(ClientError::NotAuthenticated)
        }
    }

    //=====================================================================================
    // Create Form
    //=====================================================================================

    pub fn open_create_form(&self) {
        self.view.update(|view| {
            let changed = !view.create_form.open;
            view.create_form.open = true;
            changed
        });
    }

    pub fn set_purpose(&self, purpose: &str) {
        self.view.update(|view| {
            if view.create_form.purpose == purpose {
                return false;
            }
            view.create_form.purpose = purpose.to_string();
            true
        });
    }

    /// Closes the form. What was typed is kept for the next time it opens.
    pub fn cancel_create_form(&self) {
        self.view.update(|view| {
            let changed = view.create_form.open;
            view.create_form.open = false;
            changed
        });
    }

    //=====================================================================================
    // Create
    //=====================================================================================

    /// Asks the backend for a new address with an optional free-text purpose.
    ///
    /// On success the form is cleared and closed. On failure it is left exactly as it
    /// was so the user can retry.
    pub async fn create_temporary_address(
        &self,
        purpose: &str,
    ) -> Result<TemporaryAddress, ClientError> {
        let session = self.require_session()?;

        let mut busy = false;
        self.view.update(|view| {
            busy = view.creating;
            view.creating = true;
            !busy
        });
        if busy {
            return Err(ClientError::MutationInFlight("create".to_string()));
        }

        let trimmed = purpose.trim();
        let purpose = (!trimmed.is_empty()).then_some(trimmed);
        let result = self.app.temp_emails.create_address(purpose).await;

        let succeeded = result.is_ok();
        self.view.update(|view| {
            // A later session has its own view; leave it alone.
            if view.session_epoch > session.epoch {
                return false;
            }
            view.creating = false;
            if succeeded {
                view.create_form = CreateForm::default();
            }
            true
        });

        match result {
            Ok(address) => {
                info!(id = address.id, "Created temporary address.");
                Ok(address)
            }
            Err(e) => {
                error!("Error creating temporary address: {}", e);
                Err(e.into())
            }
        }
    }

    //=====================================================================================
    // Deactivate (two-phase)
    //=====================================================================================

    /// First phase: records that a confirmation prompt is showing for `id`.
    ///
    /// Fails while another prompt is still unanswered.
    pub fn request_deactivation(&self, id: i64) -> Result<PendingDeactivation, ClientError> {
        let session = self.require_session()?;

        let mut busy = false;
        let mut open = None;
        self.view.update(|view| {
            busy = view.deactivating.contains(&id);
            open = view.pending_deactivation;
            if busy || open.is_some() {
                return false;
            }
            view.pending_deactivation = Some(id);
            true
        });
        if busy {
            return Err(ClientError::MutationInFlight(format!("address {}", id)));
        }
        // One prompt at a time; it has to be answered before another can open.
        if let Some(open) = open {
            return Err(ClientError::ConfirmationPending(open));
        }

        Ok(PendingDeactivation {
            id,
            epoch: session.epoch,
        })
    }

    /// The user said no. Nothing is sent.
    pub fn decline_deactivation(&self, pending: PendingDeactivation) {
        info!(id = pending.id, "Deactivation declined.");
        self.dismiss_prompt(pending.id);
    }

    /// Second phase: the user confirmed, so the deactivation is sent.
    pub async fn confirm_deactivation(
        &self,
        pending: PendingDeactivation,
    ) -> Result<(), ClientError> {
        let session = self.require_session()?;
        let id = pending.id;
        if pending.epoch != session.epoch {
            self.dismiss_prompt(id);
            return Err(ClientError::Internal(format!(
                "confirmation for address {} belongs to an earlier session",
                id
            )));
        }

        let mut busy = false;
        self.view.update(|view| {
            if view.pending_deactivation == Some(id) {
                view.pending_deactivation = None;
            }
            busy = !view.deactivating.insert(id);
            true
        });
        if busy {
            return Err(ClientError::MutationInFlight(format!("address {}", id)));
        }

        let result = self.app.temp_emails.deactivate_address(id).await;

        self.view.update(|view| view.deactivating.remove(&id));

        match result {
            Ok(()) => {
                info!(id, "Deactivated temporary address.");
                Ok(())
            }
            Err(e) => {
                error!(id, "Error deactivating temporary address: {}", e);
                Err(e.into())
            }
        }
    }

    fn dismiss_prompt(&self, id: i64) {
        self.view.update(|view| {
            if view.pending_deactivation != Some(id) {
                return false;
            }
            view.pending_deactivation = None;
            true
        });
    }
}
