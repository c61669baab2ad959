//! Actions and effects produced by dialog transitions

use crate::handler::Phase;
use crate::response::Envelope;

/// What to answer when an invoked handler phase fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Hand dialog management back to the platform
    Delegate,
    /// Answer with a bare envelope
    EmptyEnvelope,
    /// Speak an error phrase and end the session
    PlainError,
}

impl Fallback {
    /// Whether handler failures are surfaced to the dispatcher instead of
    /// being turned into an error reply at the invocation site
    pub fn propagates_errors(self) -> bool {
        !matches!(self, Fallback::PlainError)
    }
}

/// The response-producing half of a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke `phase` on the handler registered as `handler`
    Invoke {
        handler: String,
        phase: Phase,
        fallback: Fallback,
    },
    /// Answer with a fixed envelope
    Respond(Envelope),
    /// Speak an error phrase and end the session
    PlainError,
}

/// Side effects applied before the action is performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Remove the session from the registry
    ClearSession,
    /// The platform ended the session, possibly reporting an error
    LogSessionEnded { error: String },
    /// Something the platform is not expected to send
    LogAnomaly { message: String },
}
