// Injected browser capabilities. The controller never touches globals
// directly; every platform effect goes through one of these traits so the
// state machine is testable without a real browser.
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Fullscreen request failures as the platform reports them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FullscreenError {
    #[error("Fullscreen requires a user gesture")]
    GestureRequired,

    #[error("Fullscreen is not supported on this platform")]
    Unsupported,

    #[error("Fullscreen request was denied")]
    Denied,

    #[error("Platform error: {0}")]
    Platform(String),
}

/// Fullscreen control over the exam container element, plus the native
/// leave-page prompt used by the unload guard.
#[async_trait]
pub trait FullscreenHost: Send + Sync {
    async fn request_fullscreen(&self) -> Result<(), FullscreenError>;
    async fn exit_fullscreen(&self) -> Result<(), FullscreenError>;

    /// Arm the native "are you sure you want to leave" prompt for the
    /// in-flight unload. Best-effort; the page may die before it shows.
    fn show_unload_prompt(&self);
}

/// Durable tab-scoped boolean (sessionStorage-equivalent). Set when a
/// session ends abruptly so the next load of the exam route is treated as a
/// refresh violation instead of a fresh start.
pub trait TabMarker: Send + Sync {
    fn is_set(&self) -> bool;
    fn set(&self);
    fn clear(&self);
}

/// Where the controller sends the user when a session resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Missing or invalid exam identity at entry.
    Dashboard,
    /// Successful submission: the exam's analysis/report destination.
    ExamReport {
        exam_id: String,
        exam_name: String,
        result: Value,
    },
    /// Submission failure or invalid identity after a successful submit.
    ReportsError { details: String },
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget);
}

/// Delayed-task capability backing the violation grace timers. Production
/// uses the tokio clock; tests run on a paused clock and advance virtually.
#[async_trait]
pub trait DelayScheduler: Send + Sync {
    async fn wait(&self, delay: Duration);
}

#[derive(Debug, Default)]
pub struct TokioScheduler;

#[async_trait]
impl DelayScheduler for TokioScheduler {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// A keyboard event as delivered by the host's keydown listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key value as the platform names it ("a", "F5", "Escape", "PrintScreen").
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Cmd on macOS; treated interchangeably with ctrl by the policy.
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn ctrl_shift(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::plain(key)
        }
    }

    pub fn alt(key: impl Into<String>) -> Self {
        Self {
            alt: true,
            ..Self::plain(key)
        }
    }

    pub fn primary_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where keyboard focus sits when an input event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputContext {
    /// Anywhere outside an editing surface.
    Page,
    /// A free-text input or textarea.
    TextInput,
    /// The designated code-editing surface.
    CodeEditor,
}

impl InputContext {
    /// Editing surfaces where space and tab must pass through normally.
    pub fn is_editing_surface(&self) -> bool {
        matches!(self, InputContext::TextInput | InputContext::CodeEditor)
    }
}

/// What the host should do with the in-flight unload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadDecision {
    /// Show the native confirmation prompt.
    Prompt,
    /// Let the navigation proceed untouched.
    Allow,
}
