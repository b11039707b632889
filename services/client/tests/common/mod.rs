//! In-process backend used by the integration tests.
//!
//! Every read takes its snapshot when it is called and only then waits on an
//! optional hold, so a test can release responses in any order it likes.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use client_lib::adapters::{MemoryTokenStore, RecordingNavigator};
use client_lib::dashboard::{AppState, Dashboard};
use mail_router_core::domain::{
    ActionTaken, DashboardStats, EmailLogEntry, Identity, TemporaryAddress,
};
use mail_router_core::ports::{
    DashboardService, IdentityService, PortError, PortResult, TempEmailService,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Verify,
    List,
    Stats,
    Create,
    Deactivate,
    Activity,
}

#[derive(Default)]
struct Inner {
    addresses: Vec<TemporaryAddress>,
    activity: Vec<EmailLogEntry>,
    next_id: i64,
    failures: HashMap<Op, PortError>,
    holds: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    calls: HashMap<Op, usize>,
}

#[derive(Default)]
pub struct FakeBackend {
    inner: Mutex<Inner>,
    verify_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_address(&self, purpose: Option<&str>, is_active: bool) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        inner.addresses.push(TemporaryAddress {
            id,
            address: format!("temp-{:08x}@example.com", id),
            purpose: purpose.map(str::to_string),
            expires_at: created_at + Duration::days(30),
            is_active,
            created_at,
        });
        id
    }

    pub fn seed_activity(&self, subject: &str, action: ActionTaken) {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.activity.len() as i64 + 1;
        inner.activity.insert(
            0,
            EmailLogEntry {
                id,
                temp_email_id: Some(1),
                sender_email: "sender@shop.example".to_string(),
                subject: subject.to_string(),
                body_preview: None,
                action_taken: action,
                ai_confidence_score: Some(0.9),
                ai_reasoning: None,
                created_at: Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, id as u32).unwrap(),
            },
        );
    }

    pub fn fail(&self, op: Op, error: PortError) {
        self.inner.lock().unwrap().failures.insert(op, error);
    }

    pub fn recover(&self, op: Op) {
        self.inner.lock().unwrap().failures.remove(&op);
    }

    /// The next call of `op` waits until the returned sender fires.
    pub fn hold(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .lock()
            .unwrap()
            .holds
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self, op: Op) -> usize {
        self.inner.lock().unwrap().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn addresses(&self) -> Vec<TemporaryAddress> {
        self.inner.lock().unwrap().addresses.clone()
    }

    /// Records the call, then returns the injected failure (if any) and the hold.
    fn enter(&self, op: Op) -> (Option<PortError>, Option<oneshot::Receiver<()>>) {
        let mut inner = self.inner.lock().unwrap();
        *inner.calls.entry(op).or_default() += 1;
        let failure = inner.failures.get(&op).cloned();
        let hold = inner.holds.get_mut(&op).and_then(VecDeque::pop_front);
        (failure, hold)
    }

    fn stats_snapshot(&self) -> DashboardStats {
        let inner = self.inner.lock().unwrap();
        let count = |action: ActionTaken| {
            inner
                .activity
                .iter()
                .filter(|e| e.action_taken == action)
                .count() as u64
        };
        DashboardStats {
            total_temp_emails: inner.addresses.len() as u64,
            active_temp_emails: inner.addresses.iter().filter(|a| a.is_active).count() as u64,
            emails_forwarded: count(ActionTaken::Forward),
            emails_deleted: count(ActionTaken::Delete),
            recent_activity: inner.activity.iter().take(10).cloned().collect(),
        }
    }
}

async fn release(hold: Option<oneshot::Receiver<()>>) {
    if let Some(rx) = hold {
        let _ = rx.await;
    }
}

#[async_trait]
impl IdentityService for FakeBackend {
    async fn verify_identity(&self, token: &str) -> PortResult<Identity> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let (failure, hold) = self.enter(Op::Verify);
        release(hold).await;
        if let Some(e) = failure {
            return Err(e);
        }
        if token != "valid-token" {
            return Err(PortError::Unauthorized);
        }
        Ok(Identity {
            id: 7,
            email: "owner@example.com".to_string(),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        })
    }
}

#[async_trait]
impl TempEmailService for FakeBackend {
    async fn list_addresses(&self) -> PortResult<Vec<TemporaryAddress>> {
        let (failure, hold) = self.enter(Op::List);
        let snapshot = self.addresses();
        release(hold).await;
        match failure {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    async fn get_address(&self, id: i64) -> PortResult<TemporaryAddress> {
        self.addresses()
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::NotFound("Temp email not found".to_string()))
    }

    async fn create_address(&self, purpose: Option<&str>) -> PortResult<TemporaryAddress> {
        let (failure, hold) = self.enter(Op::Create);
        release(hold).await;
        if let Some(e) = failure {
            return Err(e);
        }
        let id = self.seed_address(purpose, true);
        self.get_address(id).await
    }

    async fn deactivate_address(&self, id: i64) -> PortResult<()> {
        let (failure, hold) = self.enter(Op::Deactivate);
        release(hold).await;
        if let Some(e) = failure {
            return Err(e);
        }
        let mut inner = self.inner.lock().unwrap();
        match inner.addresses.iter_mut().find(|a| a.id == id) {
            Some(address) => {
                address.is_active = false;
                Ok(())
            }
            None => Err(PortError::NotFound("Temp email not found".to_string())),
        }
    }
}

#[async_trait]
impl DashboardService for FakeBackend {
    async fn get_stats(&self) -> PortResult<DashboardStats> {
        let (failure, hold) = self.enter(Op::Stats);
        let snapshot = self.stats_snapshot();
        release(hold).await;
        match failure {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    async fn list_activity(&self, limit: u32) -> PortResult<Vec<EmailLogEntry>> {
        let (failure, hold) = self.enter(Op::Activity);
        release(hold).await;
        if let Some(e) = failure {
            return Err(e);
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner.activity.iter().take(limit as usize).cloned().collect())
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub credentials: Arc<MemoryTokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub dashboard: Dashboard,
}

pub fn harness(token: Option<&str>) -> Harness {
    let backend = FakeBackend::new();
    let credentials = Arc::new(match token {
        Some(t) => MemoryTokenStore::with_token(t),
        None => MemoryTokenStore::default(),
    });
    let navigator = Arc::new(RecordingNavigator::default());
    let app = Arc::new(AppState {
        identity: backend.clone(),
        temp_emails: backend.clone(),
        dashboard: backend.clone(),
        credentials: credentials.clone(),
        navigator: navigator.clone(),
    });
    Harness {
        backend,
        credentials,
        navigator,
        dashboard: Dashboard::new(app),
    }
}

/// A harness whose session is already authenticated.
pub async fn signed_in() -> Harness {
    let h = harness(Some("valid-token"));
    let session = h.dashboard.start().await;
    assert!(session.is_authenticated());
    h
}
