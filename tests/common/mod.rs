// Scripted fakes for the injected platform capabilities, shared by the
// integration suites.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::json;

use exam_lockdown::config::LockdownConfig;
use exam_lockdown::controller::ExamLockdownController;
use exam_lockdown::platform::{
    FullscreenError, FullscreenHost, NavigationTarget, Navigator, TabMarker, TokioScheduler,
};
use exam_lockdown::session::{
    ExamDescriptor, GatewayError, InMemorySessionStore, SessionStore, SubmissionGateway,
    SubmissionReceipt,
};

static TRACING: Once = Once::new();

/// Route controller tracing through the test writer; `RUST_LOG` filters as
/// usual.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fullscreen host with scriptable request outcomes. Outcomes queue up
/// front-to-back; once the queue drains, the default outcome applies.
pub struct FakeFullscreen {
    request_queue: Mutex<VecDeque<Result<(), FullscreenError>>>,
    default_request: Mutex<Result<(), FullscreenError>>,
    pub request_calls: AtomicU32,
    pub exit_calls: AtomicU32,
    pub unload_prompts: AtomicU32,
}

impl FakeFullscreen {
    pub fn new() -> Self {
        Self {
            request_queue: Mutex::new(VecDeque::new()),
            default_request: Mutex::new(Ok(())),
            request_calls: AtomicU32::new(0),
            exit_calls: AtomicU32::new(0),
            unload_prompts: AtomicU32::new(0),
        }
    }

    pub fn queue_request(&self, outcome: Result<(), FullscreenError>) {
        self.request_queue.lock().unwrap().push_back(outcome);
    }

    pub fn deny_requests(&self) {
        *self.default_request.lock().unwrap() = Err(FullscreenError::Denied);
    }

    pub fn requests(&self) -> u32 {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn exits(&self) -> u32 {
        self.exit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FullscreenHost for FakeFullscreen {
    async fn request_fullscreen(&self) -> Result<(), FullscreenError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(outcome) = self.request_queue.lock().unwrap().pop_front() {
            return outcome;
        }
        self.default_request.lock().unwrap().clone()
    }

    async fn exit_fullscreen(&self) -> Result<(), FullscreenError> {
        self.exit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn show_unload_prompt(&self) {
        self.unload_prompts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Gateway that records every invocation and, crucially, whether the session
/// store already carried `submitted` when the call arrived.
pub struct FakeGateway {
    outcome: Mutex<Result<SubmissionReceipt, GatewayError>>,
    session: Arc<dyn SessionStore>,
    pub calls: AtomicU32,
    pub submitted_before_call: AtomicBool,
}

impl FakeGateway {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self {
            outcome: Mutex::new(Ok(SubmissionReceipt {
                success: true,
                data: json!({"score": 42}),
            })),
            session,
            calls: AtomicU32::new(0),
            submitted_before_call: AtomicBool::new(false),
        }
    }

    pub fn set_outcome(&self, outcome: Result<SubmissionReceipt, GatewayError>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionGateway for FakeGateway {
    async fn submit_exam(&self) -> Result<SubmissionReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submitted_before_call
            .store(self.session.is_submitted(), Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct MemoryTabMarker {
    flag: AtomicBool,
}

impl MemoryTabMarker {
    pub fn preset() -> Self {
        let marker = Self::default();
        marker.flag.store(true, Ordering::SeqCst);
        marker
    }
}

impl TabMarker for MemoryTabMarker {
    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<NavigationTarget>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<NavigationTarget> {
        self.targets.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<NavigationTarget> {
        self.targets.lock().unwrap().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: NavigationTarget) {
        self.targets.lock().unwrap().push(target);
    }
}

/// Everything a test needs to drive a session and inspect the collaborators.
pub struct Harness {
    pub controller: ExamLockdownController,
    pub session: Arc<InMemorySessionStore>,
    pub gateway: Arc<FakeGateway>,
    pub fullscreen: Arc<FakeFullscreen>,
    pub marker: Arc<MemoryTabMarker>,
    pub navigator: Arc<RecordingNavigator>,
    pub config: LockdownConfig,
}

pub fn test_config() -> LockdownConfig {
    LockdownConfig {
        strike_limit: 3,
        ..LockdownConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config(), Some(ExamDescriptor::new("E1", "Midterm")), false)
}

pub fn harness_with(
    config: LockdownConfig,
    exam_data: Option<ExamDescriptor>,
    marker_set: bool,
) -> Harness {
    init_tracing();
    let session = Arc::new(InMemorySessionStore::new(exam_data));
    let gateway = Arc::new(FakeGateway::new(session.clone()));
    let fullscreen = Arc::new(FakeFullscreen::new());
    let marker = Arc::new(if marker_set {
        MemoryTabMarker::preset()
    } else {
        MemoryTabMarker::default()
    });
    let navigator = Arc::new(RecordingNavigator::default());

    let controller = ExamLockdownController::new(
        config.clone(),
        session.clone(),
        gateway.clone(),
        fullscreen.clone(),
        marker.clone(),
        navigator.clone(),
        Arc::new(TokioScheduler),
    );

    Harness {
        controller,
        session,
        gateway,
        fullscreen,
        marker,
        navigator,
        config,
    }
}

/// Route used by every harness config.
pub fn exam_route() -> String {
    LockdownConfig::default().exam_route
}

/// Enter the session on the exam route and assert the lockdown engaged.
pub async fn start_session(h: &mut Harness) {
    h.controller
        .enter_session(&exam_route())
        .await
        .expect("session entry should succeed");
    assert!(h.session.exam_started(), "lockdown should be active");
}
