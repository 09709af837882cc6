use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Lockdown policy knobs.
///
/// Defaults match the production proctoring policy; individual values can be
/// overridden through `LOCKDOWN_*` environment variables at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockdownConfig {
    /// Tolerated fullscreen-exit events before forced submission.
    pub strike_limit: u32,
    /// Wait between flagging a violation and firing the auto-submission.
    pub violation_grace_secs: u64,
    /// Wait before auto-submitting a session flagged by the refresh marker.
    pub refresh_grace_secs: u64,
    /// When false, strike exhaustion submits immediately with no final
    /// fullscreen retry.
    pub enforce_fullscreen: bool,
    /// Keyboard/clipboard/context-menu restriction toggle.
    pub restrict_keyboard: bool,
    /// Visibility-change and window-blur violation toggle.
    pub restrict_tab_switch: bool,
    /// The only route on which the controller activates.
    pub exam_route: String,
}

impl LockdownConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("LOCKDOWN_STRIKE_LIMIT") {
            self.strike_limit = v.parse().unwrap_or(self.strike_limit);
        }
        if let Ok(v) = env::var("LOCKDOWN_VIOLATION_GRACE_SECS") {
            self.violation_grace_secs = v.parse().unwrap_or(self.violation_grace_secs);
        }
        if let Ok(v) = env::var("LOCKDOWN_REFRESH_GRACE_SECS") {
            self.refresh_grace_secs = v.parse().unwrap_or(self.refresh_grace_secs);
        }
        if let Ok(v) = env::var("LOCKDOWN_ENFORCE_FULLSCREEN") {
            self.enforce_fullscreen = v.parse().unwrap_or(self.enforce_fullscreen);
        }
        if let Ok(v) = env::var("LOCKDOWN_RESTRICT_KEYBOARD") {
            self.restrict_keyboard = v.parse().unwrap_or(self.restrict_keyboard);
        }
        if let Ok(v) = env::var("LOCKDOWN_RESTRICT_TAB_SWITCH") {
            self.restrict_tab_switch = v.parse().unwrap_or(self.restrict_tab_switch);
        }
        if let Ok(v) = env::var("LOCKDOWN_EXAM_ROUTE") {
            self.exam_route = v;
        }
        self
    }

    pub fn violation_grace(&self) -> Duration {
        Duration::from_secs(self.violation_grace_secs)
    }

    pub fn refresh_grace(&self) -> Duration {
        Duration::from_secs(self.refresh_grace_secs)
    }
}

impl Default for LockdownConfig {
    fn default() -> Self {
        Self {
            strike_limit: 100,
            violation_grace_secs: 2,
            refresh_grace_secs: 5,
            enforce_fullscreen: true,
            restrict_keyboard: true,
            restrict_tab_switch: true,
            exam_route: "/exam/session".to_string(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<LockdownConfig> = Lazy::new(LockdownConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static LockdownConfig {
    &CONFIG
}
