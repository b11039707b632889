//! services/client/src/dashboard/controller.rs
//!
//! The `Dashboard` ties the session gate, the orchestrator and the mutation
//! coordinator together. Each user action here is "mutate, then on `Ok` refresh".

use crate::dashboard::{
    mutations::{MutationCoordinator, PendingDeactivation},
    orchestrator::{LoadOutcome, ResourceOrchestrator},
    routes::{guard, RouteDecision},
    session_gate::{SessionGate, SessionHandle},
    state::{AppState, ViewState, ViewStore},
};
use crate::error::ClientError;
use mail_router_core::domain::{EmailLogEntry, Route, Session, TemporaryAddress};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub struct Dashboard {
    app: Arc<AppState>,
    gate: Arc<SessionGate>,
    view: Arc<ViewStore>,
    orchestrator: ResourceOrchestrator,
    mutations: MutationCoordinator,
}

impl Dashboard {
    pub fn new(app: Arc<AppState>) -> Self {
        let gate = Arc::new(SessionGate::new(app.clone()));
        let view = Arc::new(ViewStore::new());
        let orchestrator = ResourceOrchestrator::new(app.clone(), gate.clone(), view.clone());
        let mutations = MutationCoordinator::new(app.clone(), gate.clone(), view.clone());
        Self {
            app,
            gate,
            view,
            orchestrator,
            mutations,
        }
    }

    pub fn session(&self) -> SessionHandle {
        self.gate.handle()
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn orchestrator(&self) -> &ResourceOrchestrator {
        &self.orchestrator
    }

    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    //=====================================================================================
    // Session
    //=====================================================================================

    /// Settles the session at startup and prepares a view for it.
    pub async fn start(&self) -> Session {
        let session = self.gate.resolve_session().await;
        self.view.reset_for(session.epoch);
        session
    }

    /// Called by the login/registration flow with a freshly issued token.
    pub async fn sign_in(&self, token: &str) -> Result<Session, ClientError> {
        let session = self.gate.establish(token).await?;
        self.view.reset_for(session.epoch);
        Ok(session)
    }

    pub async fn logout(&self) -> Session {
        let session = self.gate.logout().await;
        self.view.reset_for(session.epoch);
        session
    }

    /// Opens `route`: waits for the session, follows any redirect, and loads the
    /// dashboard data when the dashboard itself renders.
    pub async fn enter(&self, route: Route) -> RouteDecision {
        let session = self.start().await;
        let decision = guard(route, session);
        match decision {
            RouteDecision::Redirect(target) => self.app.navigator.navigate(target),
            RouteDecision::Render => {
                self.app.navigator.navigate(route);
                if route == Route::Dashboard {
                    // Failures are logged by the orchestrator; the last good view stays.
                    match self.refresh().await {
                        Ok(outcome) => debug!(?outcome, "Dashboard entered."),
                        Err(e) => debug!("Dashboard entered without fresh data: {}", e),
                    }
                }
            }
            RouteDecision::Wait => {}
        }
        decision
    }

    //=====================================================================================
    // View
    //=====================================================================================

    /// The protected view, or `None` whenever it must not be shown.
    pub fn view(&self) -> Option<ViewState> {
        let session = self.gate.current();
        if !session.is_authenticated() {
            return None;
        }
        let view = self.view.snapshot();
        (view.session_epoch == session.epoch).then_some(view)
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, ClientError> {
        self.orchestrator.load_all().await
    }

    /// Reloads after a successful mutation started in the session at `epoch`.
    ///
    /// If that session has ended since, the result belongs to nobody on screen and
    /// nothing is loaded or navigated.
    async fn refresh_after_mutation(&self, epoch: u64) {
        if self.gate.current().epoch != epoch {
            info!(epoch, "Session changed during the mutation; skipping the refresh.");
            return;
        }
        if let Err(e) = self.refresh().await {
            warn!("Refresh after mutation failed; keeping the previous view: {}", e);
        }
    }

    pub async fn activity_log(&self, limit: u32) -> Result<Vec<EmailLogEntry>, ClientError> {
        if !self.gate.current().is_authenticated() {
            self.app.navigator.navigate(Route::Login);
            return Err(ClientError::NotAuthenticated);
        }
        self.app.dashboard.list_activity(limit).await.map_err(|e| {
            error!("Error fetching the activity log: {}", e);
            e.into()
        })
    }

    /// Fetches one address fresh from the backend, whether or not it is listed.
    pub async fn address(&self, id: i64) -> Result<TemporaryAddress, ClientError> {
        if !self.gate.current().is_authenticated() {
            self.app.navigator.navigate(Route::Login);
            return Err(ClientError::NotAuthenticated);
        }
        self.app.temp_emails.get_address(id).await.map_err(|e| {
            error!(id, "Error fetching temporary address: {}", e);
            e.into()
        })
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    pub fn open_create_form(&self) {
        self.mutations.open_create_form();
    }

    pub fn set_purpose(&self, purpose: &str) {
        self.mutations.set_purpose(purpose);
    }

    pub fn cancel_create_form(&self) {
        self.mutations.cancel_create_form();
    }

    /// Creates an address and, once the backend accepted it, reloads everything.
    pub async fn create_temporary_address(&self, purpose: &str) -> Result<(), ClientError> {
        let epoch = self.gate.current().epoch;
        self.mutations.create_temporary_address(purpose).await?;
        self.refresh_after_mutation(epoch).await;
        Ok(())
    }

    /// Submits whatever is typed in the create form.
    pub async fn submit_create_form(&self) -> Result<(), ClientError> {
        let purpose = self.view.snapshot().create_form.purpose;
        self.create_temporary_address(&purpose).await
    }

    pub fn request_deactivation(&self, id: i64) -> Result<PendingDeactivation, ClientError> {
        self.mutations.request_deactivation(id)
    }

    pub fn decline_deactivation(&self, pending: PendingDeactivation) {
        self.mutations.decline_deactivation(pending);
    }

    pub async fn confirm_deactivation(
        &self,
        pending: PendingDeactivation,
    ) -> Result<(), ClientError> {
        let epoch = self.gate.current().epoch;
        self.mutations.confirm_deactivation(pending).await?;
        self.refresh_after_mutation(epoch).await;
        Ok(())
    }
}
