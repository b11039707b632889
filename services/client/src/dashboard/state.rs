//! services/client/src/dashboard/state.rs
//!
//! Defines the client's shared dependencies and the dashboard view state.

use mail_router_core::domain::{DashboardStats, TemporaryAddress};
use mail_router_core::ports::{
    CredentialStore, DashboardService, IdentityService, Navigator, TempEmailService,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

//=========================================================================================
// AppState (Shared Dependencies)
//=========================================================================================

/// The collaborators every dashboard component talks to, created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub temp_emails: Arc<dyn TempEmailService>,
    pub dashboard: Arc<dyn DashboardService>,
    pub credentials: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
}

//=========================================================================================
// ViewState (What the Dashboard Renders)
//=========================================================================================

/// The "Create New" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub open: bool,
    pub purpose: String,
}

/// Everything the protected dashboard renders.
///
/// `addresses` and `stats` are only ever replaced together in one update, tagged with
/// the load generation and session epoch that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// True until the first load for this session has terminated.
    pub loading: bool,
    pub addresses: Vec<TemporaryAddress>,
    pub stats: Option<DashboardStats>,
    pub applied_generation: u64,
    pub session_epoch: u64,
    pub create_form: CreateForm,
    pub pending_deactivation: Option<i64>,
    pub creating: bool,
    pub deactivating: BTreeSet<i64>,
}

impl ViewState {
    pub fn for_epoch(session_epoch: u64) -> Self {
        Self {
            loading: true,
            addresses: Vec::new(),
            stats: None,
            applied_generation: 0,
            session_epoch,
            create_form: CreateForm::default(),
            pending_deactivation: None,
            creating: false,
            deactivating: BTreeSet::new(),
        }
    }

    pub fn active_addresses(&self) -> impl Iterator<Item = &TemporaryAddress> {
        self.addresses.iter().filter(|a| a.is_active)
    }

    pub fn address(&self, id: i64) -> Option<&TemporaryAddress> {
        self.addresses.iter().find(|a| a.id == id)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::for_epoch(0)
    }
}

/// Owner of the published `ViewState`.
///
/// Every write goes through `update`, which runs under the channel's lock, so readers
/// only ever observe whole transitions.
pub struct ViewStore {
    tx: watch::Sender<ViewState>,
}

impl ViewStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ViewState::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Applies `f` as a single transition. Receivers are only notified when `f`
    /// returns true.
    pub(crate) fn update(&self, f: impl FnOnce(&mut ViewState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Drops everything belonging to earlier sessions.
    pub(crate) fn reset_for(&self, session_epoch: u64) {
        self.tx.send_modify(|view| {
            if view.session_epoch < session_epoch {
                *view = ViewState::for_epoch(session_epoch);
            }
        });
    }
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}
