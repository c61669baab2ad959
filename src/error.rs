//! Dispatch error types

use crate::handler::Phase;
use thiserror::Error;

/// Failures that can occur while turning a request into a reply.
///
/// Only `MissingSessionId` ever reaches the caller as-is (as a 400). Every
/// other kind is converted by the dispatcher into a fallback envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Request is missing session.sessionId")]
    MissingSessionId,
    #[error("Handler not found: {name}")]
    HandlerNotFound { name: String },
    #[error("Phase {phase} of handler {name} is not invocable")]
    PhaseNotSupported { name: String, phase: Phase },
    #[error("Handler {name} failed: {message}")]
    HandlerRuntimeFailure { name: String, message: String },
    #[error("Handler {name} returned an unrecognized result: {reason}")]
    UnrecognizedHandlerResult { name: String, reason: String },
}

impl DispatchError {
    /// Short machine-readable kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSessionId => "missing_session_id",
            Self::HandlerNotFound { .. } => "handler_not_found",
            Self::PhaseNotSupported { .. } => "phase_not_supported",
            Self::HandlerRuntimeFailure { .. } => "handler_runtime_failure",
            Self::UnrecognizedHandlerResult { .. } => "unrecognized_handler_result",
        }
    }
}
