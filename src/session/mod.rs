// Session collaborators: the store the portal shares with the controller and
// the gateway that performs the actual submit call
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::RwLock;
use thiserror::Error;

/// Identity of the active exam. Both fields must be non-empty for a session
/// to be startable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamDescriptor {
    pub exam_id: String,
    pub exam_name: String,
}

impl ExamDescriptor {
    pub fn new(exam_id: impl Into<String>, exam_name: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            exam_name: exam_name.into(),
        }
    }

    pub fn is_startable(&self) -> bool {
        !self.exam_id.trim().is_empty() && !self.exam_name.trim().is_empty()
    }
}

/// Shared session state read by the presentation layer and mutated by the
/// controller. Interior mutability because both sides hold the same handle
/// on a single-threaded event loop.
pub trait SessionStore: Send + Sync {
    fn exam_started(&self) -> bool;
    fn is_submitted(&self) -> bool;
    fn exam_data(&self) -> Option<ExamDescriptor>;

    fn set_exam_started(&self, started: bool);
    fn set_is_submitted(&self, submitted: bool);
    fn clear_exam_state(&self);
}

#[derive(Debug, Default)]
struct SessionState {
    exam_started: bool,
    is_submitted: bool,
    exam_data: Option<ExamDescriptor>,
}

/// Default `RwLock`-backed store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: RwLock<SessionState>,
}

impl InMemorySessionStore {
    pub fn new(exam_data: Option<ExamDescriptor>) -> Self {
        Self {
            state: RwLock::new(SessionState {
                exam_started: false,
                is_submitted: false,
                exam_data,
            }),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn exam_started(&self) -> bool {
        self.state.read().expect("session store poisoned").exam_started
    }

    fn is_submitted(&self) -> bool {
        self.state.read().expect("session store poisoned").is_submitted
    }

    fn exam_data(&self) -> Option<ExamDescriptor> {
        self.state.read().expect("session store poisoned").exam_data.clone()
    }

    fn set_exam_started(&self, started: bool) {
        self.state.write().expect("session store poisoned").exam_started = started;
    }

    fn set_is_submitted(&self, submitted: bool) {
        self.state.write().expect("session store poisoned").is_submitted = submitted;
    }

    fn clear_exam_state(&self) {
        let mut state = self.state.write().expect("session store poisoned");
        state.exam_started = false;
        state.exam_data = None;
    }
}

/// Outcome of a submission call. A receipt with `success == false` is a
/// backend-reported failure and is handled the same way as a rejected call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

/// Submission failures reported by the gateway.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Submission rejected: {0}")]
    Rejected(String),
}

/// Performs the actual submit network call.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit_exam(&self) -> Result<SubmissionReceipt, GatewayError>;
}
