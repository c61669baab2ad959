//! Dialog state machine
//!
//! Decides, from the latest request of a session alone, what the dispatcher
//! should do. The decision is a pure function; the dispatcher performs it.

mod action;
mod transition;

#[cfg(test)]
mod proptests;

pub use action::{Action, Effect, Fallback};
pub use transition::{transition, DialogContext, Transition};
