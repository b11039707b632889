//! services/client/src/dashboard/orchestrator.rs
//!
//! Keeps the address list and the statistics snapshot in step with the backend.
//!
//! Both collections are fetched concurrently and applied in one view transition.
//! Every call takes a generation number; a completion older than what is already on
//! screen is dropped, and so is anything that finishes after its session ended.

use crate::dashboard::{
    session_gate::SessionGate,
    state::{AppState, ViewState, ViewStore},
};
use crate::error::ClientError;
use mail_router_core::domain::Route;
use mail_router_core::ports::PortError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What became of a `load_all` call that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Both collections were replaced.
    Applied,
    /// A newer load had already been applied; this result was dropped.
    Superseded,
    /// The session ended or changed while the requests were in flight.
    SessionChanged,
    /// There was no authenticated session; the user was sent to the login view.
    Redirected,
}

pub struct ResourceOrchestrator {
    app: Arc<AppState>,
    gate: Arc<SessionGate>,
    view: Arc<ViewStore>,
    issued: AtomicU64,
}

impl ResourceOrchestrator {
    pub fn new(app: Arc<AppState>, gate: Arc<SessionGate>, view: Arc<ViewStore>) -> Self {
        Self {
            app,
            gate,
            view,
            issued: AtomicU64::new(0),
        }
    }

    /// Fetches addresses and statistics together and applies them as one unit.
    ///
    /// A failed half never blanks what is on screen: the half that succeeded is
    /// applied, the other keeps its last good value, and the call reports the error.
    pub async fn load_all(&self) -> Result<LoadOutcome, ClientError> {
        let session = self.gate.current();
        if !session.is_authenticated() {
            warn!("Refusing to load protected data without a session.");
            self.app.navigator.navigate(Route::Login);
            return Ok(LoadOutcome::Redirected);
        }

        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, epoch = session.epoch, "Loading dashboard data.");

        let (addresses, stats) = futures::join!(
            self.app.temp_emails.list_addresses(),
            self.app.dashboard.get_stats(),
        );

        if let Err(e) = &addresses {
            error!(generation, "Error fetching temporary addresses: {}", e);
        }
        if let Err(e) = &stats {
            error!(generation, "Error fetching dashboard stats: {}", e);
        }

        if matches!(addresses, Err(PortError::Unauthorized))
            || matches!(stats, Err(PortError::Unauthorized))
        {
            if let Some(ended) = self.gate.expire(session.epoch).await {
                self.view.reset_for(ended.epoch);
            }
            return Err(ClientError::Port(PortError::Unauthorized));
        }

        let gate = &self.gate;
        let mut outcome = LoadOutcome::Applied;
        self.view.update(|view| {
            // Checked under the view lock so a concurrent logout cannot slip in
            // between the check and the write.
            if gate.current().epoch != session.epoch || view.session_epoch > session.epoch {
                outcome = LoadOutcome::SessionChanged;
                return false;
            }
            if view.session_epoch < session.epoch {
                *view = ViewState::for_epoch(session.epoch);
            }
            if generation <= view.applied_generation {
                outcome = LoadOutcome::Superseded;
                return false;
            }

            let mut changed = false;
            if let Ok(addresses) = &addresses {
                view.addresses = addresses.clone();
                changed = true;
            }
            if let Ok(stats) = &stats {
                view.stats = Some(stats.clone());
                changed = true;
            }
            if changed {
                view.applied_generation = generation;
            }
            let was_loading = std::mem::replace(&mut view.loading, false);
            changed || was_loading
        });

        match outcome {
            LoadOutcome::Applied => {}
            other => {
                info!(generation, ?other, "Discarded dashboard data.");
                return Ok(other);
            }
        }

        addresses?;
        stats?;
        Ok(LoadOutcome::Applied)
    }
}
