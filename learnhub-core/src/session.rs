use crate::{Certificate, CoreError, CourseId};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The learner-local state that survives between runs: which premium courses
/// were paid for and which certificates were earned.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub paid_courses: Vec<CourseId>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<SessionState, CoreError>;
    async fn save(&self, state: &SessionState) -> Result<(), CoreError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    state: RwLock<SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<SessionState, CoreError> {
        Ok(self.state.read().clone())
    }

    async fn save(&self, state: &SessionState) -> Result<(), CoreError> {
        *self.state.write() = state.clone();
        Ok(())
    }
}

/// In-memory view of the session state, written through to its store.
pub struct SessionLedger {
    store: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
}

impl SessionLedger {
    pub async fn open(store: Arc<dyn SessionStore>) -> Result<Self, CoreError> {
        let state = store.load().await?;
        tracing::debug!(
            paid = state.paid_courses.len(),
            certificates = state.certificates.len(),
            "session ledger loaded"
        );
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn has_paid(&self, course_id: &str) -> bool {
        self.state.read().paid_courses.iter().any(|c| c == course_id)
    }

    pub async fn record_payment(&self, course_id: &str) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            if s.paid_courses.iter().any(|c| c == course_id) {
                return Ok(());
            }
            s.paid_courses.push(course_id.to_string());
            s.clone()
        };
        self.store.save(&snapshot).await
    }

    pub fn certificates(&self) -> Vec<Certificate> {
        self.state.read().certificates.clone()
    }

    pub fn certificate_for(&self, course_id: &str) -> Option<Certificate> {
        self.state
            .read()
            .certificates
            .iter()
            .find(|c| c.course_id == course_id)
            .cloned()
    }

    /// Keeps the first certificate earned for a course; returns the stored one.
    pub async fn award(&self, certificate: Certificate) -> Result<Certificate, CoreError> {
        let (stored, snapshot) = {
            let mut s = self.state.write();
            if let Some(existing) = s
                .certificates
                .iter()
                .find(|c| c.course_id == certificate.course_id)
            {
                return Ok(existing.clone());
            }
            s.certificates.push(certificate.clone());
            (certificate, s.clone())
        };
        self.store.save(&snapshot).await?;
        Ok(stored)
    }
}
