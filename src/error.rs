// Top-level error taxonomy for the lockdown controller
use thiserror::Error;

use crate::platform::FullscreenError;
use crate::session::GatewayError;

/// Lockdown failures surfaced to the host application.
///
/// Every variant is converted into either a modal state or a navigation
/// payload at the point it occurs; nothing propagates out of the controller
/// as an unhandled error.
#[derive(Debug, Error, Clone)]
pub enum LockdownError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Fullscreen error: {0}")]
    Fullscreen(#[from] FullscreenError),

    #[error("Submission error: {0}")]
    Submission(#[from] GatewayError),
}
