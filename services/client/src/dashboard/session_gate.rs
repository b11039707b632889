//! services/client/src/dashboard/session_gate.rs
//!
//! The single writer of the session. It decides once per process (and again after a
//! logout) whether protected views may render, and hands out read-only handles to
//! everything else.

use crate::dashboard::state::AppState;
use crate::error::ClientError;
use mail_router_core::domain::{AuthState, Route, Session};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// A read-only view of the session, cheap to clone and pass to any component.
#[derive(Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<Session>,
}

impl SessionHandle {
    pub fn current(&self) -> Session {
        *self.rx.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_authenticated()
    }

    /// Waits until the gate has reached a final decision and returns it.
    pub async fn resolved(&mut self) -> Session {
        let resolved = self.rx.wait_for(|s| s.state.is_resolved()).await.map(|s| *s);
        match resolved {
            Ok(session) => session,
            // The gate is gone; nothing will ever authenticate this handle.
            Err(_) => Session {
                state: AuthState::Unauthenticated,
                epoch: self.current().epoch,
            },
        }
    }
}

pub struct SessionGate {
    app: Arc<AppState>,
    session: watch::Sender<Session>,
    resolve_lock: Mutex<()>,
    /// Held while the persisted credential and the session change together.
    credential_lock: Mutex<()>,
}

impl SessionGate {
    pub fn new(app: Arc<AppState>) -> Self {
        let (session, _) = watch::channel(Session::unresolved());
        Self {
            app,
            session,
            resolve_lock: Mutex::new(()),
            credential_lock: Mutex::new(()),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.session.subscribe(),
        }
    }

    pub fn current(&self) -> Session {
        *self.session.borrow()
    }

    /// Validates any persisted credential and settles the session.
    ///
    /// Only the first call does any work; later calls return the settled session.
    /// Every failure degrades silently to `Unauthenticated` and clears the token.
    pub async fn resolve_session(&self) -> Session {
        let _guard = self.resolve_lock.lock().await;
        let current = self.current();
        if current.state != AuthState::Unresolved {
            return current;
        }

        let resolving = self.transition(AuthState::Resolving);

        let token = match self.app.credentials.load_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the persisted credential: {}", e);
                None
            }
        };

        let Some(token) = token else {
            info!("No persisted credential; session is unauthenticated.");
            return self.settle(resolving.epoch, AuthState::Unauthenticated);
        };

        match self.app.identity.verify_identity(&token).await {
            Ok(identity) => {
                info!(user_id = identity.id, "Persisted credential accepted.");
                self.settle(resolving.epoch, AuthState::Authenticated)
            }
            Err(e) => {
                info!("Persisted credential rejected: {}", e);
                let _credentials = self.credential_lock.lock().await;
                if self.current().epoch != resolving.epoch {
                    // A login or logout landed meanwhile; the stored token is theirs.
                    return self.current();
                }
                self.clear_token().await;
                self.settle(resolving.epoch, AuthState::Unauthenticated)
            }
        }
    }

    /// Entry point for the login/registration flow once it holds a fresh token.
    pub async fn establish(&self, token: &str) -> Result<Session, ClientError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::Internal("refusing to store an empty credential".to_string()));
        }
        let _credentials = self.credential_lock.lock().await;
        self.app.credentials.save_token(token).await?;
        let session = self.transition(AuthState::Authenticated);
        info!(epoch = session.epoch, "Session established.");
        Ok(session)
    }

    /// Clears the credential, ends the session and sends the user to the landing view.
    pub async fn logout(&self) -> Session {
        let _credentials = self.credential_lock.lock().await;
        self.clear_token().await;
        let session = self.transition(AuthState::Unauthenticated);
        info!(epoch = session.epoch, "Logged out.");
        self.app.navigator.navigate(Route::Landing);
        session
    }

    /// Ends the session observed at `epoch` after the backend refused its credential.
    ///
    /// Returns `None` when the session has already moved on, in which case nothing
    /// is touched.
    pub async fn expire(&self, epoch: u64) -> Option<Session> {
        let _credentials = self.credential_lock.lock().await;
        let current = self.current();
        if current.epoch != epoch || !current.is_authenticated() {
            return None;
        }
        self.clear_token().await;
        let session = self.transition_from(epoch, AuthState::Unauthenticated)?;
        warn!("Backend rejected the session credential; signing out.");
        self.app.navigator.navigate(Route::Login);
        Some(session)
    }

    async fn clear_token(&self) {
        if let Err(e) = self.app.credentials.clear_token().await {
            warn!("Failed to clear the persisted credential: {}", e);
        }
    }

    fn transition(&self, state: AuthState) -> Session {
        let mut next = self.current();
        self.session.send_modify(|session| {
            session.state = state;
            session.epoch += 1;
            next = *session;
        });
        next
    }

    /// Like `transition`, but only if nothing else moved the session since `epoch`.
    fn transition_from(&self, epoch: u64, state: AuthState) -> Option<Session> {
        let mut next = None;
        self.session.send_if_modified(|session| {
            if session.epoch != epoch {
                return false;
            }
            session.state = state;
            session.epoch += 1;
            next = Some(*session);
            true
        });
        next
    }

    /// Finishes a resolution. A logout or login that raced it takes precedence.
    fn settle(&self, resolving_epoch: u64, state: AuthState) -> Session {
        self.transition_from(resolving_epoch, state)
            .unwrap_or_else(|| self.current())
    }
}
