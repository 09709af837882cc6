// Exam lockdown controller: a state machine over injected platform
// capabilities. Owns fullscreen enforcement, strike accounting, violation
// detection and the single guarded submission attempt per session.
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::LockdownConfig;
use crate::error::LockdownError;
use crate::keymap::{KeyDisposition, KeyPolicy};
use crate::platform::{
    DelayScheduler, FullscreenHost, InputContext, KeyEvent, NavigationTarget, Navigator,
    TabMarker, UnloadDecision,
};
use crate::session::{ExamDescriptor, GatewayError, SessionStore, SubmissionGateway};

/// Lifecycle phase, exposed to the presentation layer.
///
/// Enforcement guards do not read the phase; they read the session store's
/// `started`/`submitted` flags so that a handler scheduled before a terminal
/// write still observes the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockdownPhase {
    NotStarted,
    Active,
    ViolationPending,
    Submitting,
    Submitted,
    ErrorPresented,
}

/// The single visible modal, if any. A tagged union rather than independent
/// booleans so two modals can never be up at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingModal {
    None,
    Error,
    ConfirmQuit,
    Violation,
}

pub struct ExamLockdownController {
    config: LockdownConfig,
    policy: KeyPolicy,

    // Collaborators
    session: Arc<dyn SessionStore>,
    gateway: Arc<dyn SubmissionGateway>,
    fullscreen: Arc<dyn FullscreenHost>,
    marker: Arc<dyn TabMarker>,
    navigator: Arc<dyn Navigator>,
    scheduler: Arc<dyn DelayScheduler>,

    // Lockdown state (never persisted)
    phase: LockdownPhase,
    pending_modal: PendingModal,
    is_fullscreen: bool,
    violation_strikes: u32,
    error_message: String,
}

impl ExamLockdownController {
    pub fn new(
        config: LockdownConfig,
        session: Arc<dyn SessionStore>,
        gateway: Arc<dyn SubmissionGateway>,
        fullscreen: Arc<dyn FullscreenHost>,
        marker: Arc<dyn TabMarker>,
        navigator: Arc<dyn Navigator>,
        scheduler: Arc<dyn DelayScheduler>,
    ) -> Self {
        Self {
            config,
            policy: KeyPolicy,
            session,
            gateway,
            fullscreen,
            marker,
            navigator,
            scheduler,
            phase: LockdownPhase::NotStarted,
            pending_modal: PendingModal::None,
            is_fullscreen: false,
            violation_strikes: 0,
            error_message: String::new(),
        }
    }

    // ---- Presentation surface -------------------------------------------

    pub fn phase(&self) -> LockdownPhase {
        self.phase
    }

    pub fn pending_modal(&self) -> &PendingModal {
        &self.pending_modal
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn violation_strikes(&self) -> u32 {
        self.violation_strikes
    }

    /// Protected exam content renders only in an unobstructed active session.
    pub fn content_visible(&self) -> bool {
        self.session.exam_started()
            && !self.session.is_submitted()
            && self.pending_modal == PendingModal::None
    }

    /// Lockdown enforcement runs only between fullscreen entry and the
    /// terminal submitted write.
    fn active(&self) -> bool {
        self.session.exam_started() && !self.session.is_submitted()
    }

    // ---- Entry contract -------------------------------------------------

    /// Activate the lockdown for the current route. Inert on any route other
    /// than the configured exam-taking route.
    ///
    /// Failures are surfaced through the error modal; the returned error is
    /// the same condition for the host's own logging.
    pub async fn enter_session(&mut self, route: &str) -> Result<(), LockdownError> {
        if route != self.config.exam_route {
            return Ok(());
        }
        if self.active() {
            return Ok(());
        }

        let descriptor = self.session.exam_data().filter(ExamDescriptor::is_startable);
        let Some(descriptor) = descriptor else {
            tracing::warn!("Exam session entered without a valid exam identity");
            self.present_error("Missing exam data. You will be returned to the dashboard.");
            return Err(LockdownError::Configuration(
                "exam identity is missing or blank".to_string(),
            ));
        };

        if self.marker.is_set() {
            // This tab already flagged an abrupt exit; the reload is a
            // refresh violation, not a fresh start.
            tracing::warn!(
                exam_id = %descriptor.exam_id,
                "Refresh marker present, treating reload as a violation"
            );
            self.begin_violation("exam page was reloaded", self.config.refresh_grace())
                .await;
            return Ok(());
        }

        match self.fullscreen.request_fullscreen().await {
            Ok(()) => {
                self.session.set_exam_started(true);
                self.is_fullscreen = true;
                self.pending_modal = PendingModal::None;
                self.phase = LockdownPhase::Active;
                tracing::info!(
                    exam_id = %descriptor.exam_id,
                    exam_name = %descriptor.exam_name,
                    "Lockdown active"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Initial fullscreen request failed: {}", e);
                self.present_error(
                    "Fullscreen could not be enabled. Please allow fullscreen for this page \
                     and re-enter the exam.",
                );
                Err(LockdownError::Fullscreen(e))
            }
        }
    }

    fn present_error(&mut self, message: &str) {
        self.pending_modal = PendingModal::Error;
        self.error_message = message.to_string();
        self.phase = LockdownPhase::ErrorPresented;
    }

    /// Resolve the error modal: the only recovery is navigating away.
    pub fn acknowledge_error(&mut self) {
        if self.pending_modal != PendingModal::Error {
            return;
        }
        self.pending_modal = PendingModal::None;
        self.error_message.clear();
        if self.active() {
            // Recoverable error inside a live session (failed fullscreen
            // re-entry); the session itself continues.
            self.phase = LockdownPhase::Active;
        } else {
            self.phase = LockdownPhase::NotStarted;
            self.navigator.navigate(NavigationTarget::Dashboard);
        }
    }

    // ---- Fullscreen-exit detection --------------------------------------

    pub async fn on_fullscreen_change(&mut self, is_fullscreen: bool) {
        if !self.active() {
            return;
        }
        if is_fullscreen {
            self.is_fullscreen = true;
            return;
        }

        self.is_fullscreen = false;
        let last_tolerated = self.config.strike_limit.saturating_sub(1);

        if self.violation_strikes < last_tolerated {
            self.violation_strikes += 1;
            tracing::warn!(
                strike = self.violation_strikes,
                limit = self.config.strike_limit,
                "Fullscreen lost"
            );
            self.pending_modal = PendingModal::ConfirmQuit;
            // Best-effort silent re-acquisition. Failure leaves the confirm
            // dialog in front of a windowed page; it does not end the session.
            if let Err(e) = self.fullscreen.request_fullscreen().await {
                tracing::debug!("Silent fullscreen re-acquisition failed: {}", e);
            }
            return;
        }

        // Strike budget exhausted.
        if self.config.enforce_fullscreen {
            if self.fullscreen.request_fullscreen().await.is_ok() {
                self.is_fullscreen = true;
                return;
            }
            self.begin_violation("fullscreen strike limit reached", self.config.violation_grace())
                .await;
        } else {
            self.begin_violation("fullscreen strike limit reached", Duration::ZERO)
                .await;
        }
    }

    /// Resolution of the confirm-quit modal.
    pub async fn resolve_confirm_quit(&mut self, quit: bool) {
        if !self.active() || self.pending_modal != PendingModal::ConfirmQuit {
            return;
        }
        if quit {
            // A failed submission already routed to the error screen.
            let _ = self.submit().await;
            return;
        }

        self.pending_modal = PendingModal::None;
        match self.fullscreen.request_fullscreen().await {
            Ok(()) => self.is_fullscreen = true,
            Err(e) => {
                tracing::warn!("Fullscreen re-entry after confirm-quit failed: {}", e);
                self.present_error(
                    "Failed to re-enter fullscreen. Please return to fullscreen to \
                     continue the exam.",
                );
            }
        }
    }

    // ---- Input restriction ----------------------------------------------

    pub async fn on_key_down(&mut self, event: &KeyEvent, context: InputContext) -> KeyDisposition {
        if !self.active() || !self.config.restrict_keyboard {
            return KeyDisposition::Allow;
        }

        if self.is_fullscreen && event.key.eq_ignore_ascii_case("Escape") {
            // Deliberate exit path. Any strike comes from the resulting
            // fullscreen-change notification, not from here.
            if let Err(e) = self.fullscreen.exit_fullscreen().await {
                tracing::debug!("Escape-triggered fullscreen exit failed: {}", e);
            }
            return KeyDisposition::Block;
        }

        self.policy.disposition(event, context)
    }

    pub fn on_wheel(&self, primary_modifier: bool) -> KeyDisposition {
        if !self.active() || !self.config.restrict_keyboard {
            return KeyDisposition::Allow;
        }
        self.policy.wheel_disposition(primary_modifier)
    }

    pub fn on_context_menu(&self) -> KeyDisposition {
        if self.active() {
            KeyDisposition::Block
        } else {
            KeyDisposition::Allow
        }
    }

    // ---- Tab-switch / focus-loss detection ------------------------------

    pub async fn on_visibility_change(&mut self, hidden: bool) {
        if !self.active() || !self.config.restrict_tab_switch || !hidden {
            return;
        }
        self.begin_violation("exam tab was hidden", self.config.violation_grace())
            .await;
    }

    pub async fn on_window_blur(&mut self, context: InputContext) {
        if !self.active() || !self.config.restrict_tab_switch {
            return;
        }
        // Focus moving into a text field fires blur on the window in some
        // embeddings; that is not a violation.
        if context.is_editing_surface() {
            return;
        }
        if self.pending_modal == PendingModal::Violation {
            return;
        }
        self.begin_violation("exam window lost focus", self.config.violation_grace())
            .await;
    }

    // ---- Abrupt navigation / unload guard -------------------------------

    pub fn on_before_unload(&mut self) -> UnloadDecision {
        if !self.active() {
            return UnloadDecision::Allow;
        }
        // The durable marker is what survives if the page dies before the
        // modal is ever observed.
        self.marker.set();
        self.pending_modal = PendingModal::Violation;
        self.phase = LockdownPhase::ViolationPending;
        self.fullscreen.show_unload_prompt();
        tracing::warn!("Unload attempted during an active exam session");
        UnloadDecision::Prompt
    }

    // ---- Violation + submission flow ------------------------------------

    /// Flag a violation and submit after the grace delay. The delay is never
    /// cancelled: once the violation modal is up, the exam is over even if
    /// the trigger condition clears within the window.
    async fn begin_violation(&mut self, reason: &str, grace: Duration) {
        tracing::warn!(reason, grace_secs = grace.as_secs(), "Integrity violation");
        self.pending_modal = PendingModal::Violation;
        self.phase = LockdownPhase::ViolationPending;
        if !grace.is_zero() {
            self.scheduler.wait(grace).await;
        }
        // A failed submission already routed to the error screen.
        let _ = self.submit().await;
    }

    /// Single submission entry point for every violation and confirm path.
    ///
    /// The terminal `submitted` write happens before the gateway call is
    /// awaited, so any handler that runs while the call is in flight
    /// observes a submitted session and no-ops.
    pub async fn submit(&mut self) -> Result<(), LockdownError> {
        if self.session.is_submitted() {
            return Ok(());
        }

        self.pending_modal = PendingModal::None;
        self.error_message.clear();
        self.session.set_is_submitted(true);
        self.session.set_exam_started(false);
        self.phase = LockdownPhase::Submitting;

        // Captured before the store is cleared on success.
        let identity = self.session.exam_data().filter(ExamDescriptor::is_startable);
        tracing::info!("Submitting exam session");

        match self.gateway.submit_exam().await {
            Ok(receipt) if receipt.success => {
                self.leave_fullscreen_best_effort().await;
                match identity {
                    Some(d) => {
                        tracing::info!(exam_id = %d.exam_id, "Exam submitted");
                        self.navigator.navigate(NavigationTarget::ExamReport {
                            exam_id: d.exam_id,
                            exam_name: d.exam_name,
                            result: receipt.data,
                        });
                    }
                    None => {
                        tracing::error!("Submission succeeded but the exam identity is missing");
                        self.navigator.navigate(NavigationTarget::ReportsError {
                            details: "invalid exam data".to_string(),
                        });
                    }
                }
                self.session.clear_exam_state();
                self.marker.set();
                self.phase = LockdownPhase::Submitted;
                Ok(())
            }
            Ok(receipt) => {
                let details = match &receipt.data {
                    Value::Null => "submission was not accepted".to_string(),
                    data => data.to_string(),
                };
                let error = GatewayError::Rejected(details);
                self.fail_submission(&error);
                Err(error.into())
            }
            Err(e) => {
                self.fail_submission(&e);
                Err(e.into())
            }
        }
    }

    fn fail_submission(&mut self, error: &GatewayError) {
        tracing::error!("Exam submission failed: {}", error);
        self.navigator.navigate(NavigationTarget::ReportsError {
            details: error.to_string(),
        });
        self.phase = LockdownPhase::Submitted;
    }

    async fn leave_fullscreen_best_effort(&mut self) {
        if !self.is_fullscreen {
            return;
        }
        match self.fullscreen.exit_fullscreen().await {
            Ok(()) => self.is_fullscreen = false,
            Err(e) => tracing::warn!("Failed to exit fullscreen after submission: {}", e),
        }
    }
}
