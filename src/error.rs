// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Error types for FSM operations.

use thiserror::Error;

/// Errors returned by the engine and its builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    /// Duplicate actor slot registered for the same state.
    #[error("Duplicate invocation slot '{slot}' for state '{state}'")]
    DuplicateHandler { state: String, slot: String },

    /// Eventless transitions kept firing without settling in a state.
    #[error("Eventless transitions did not settle after leaving state '{state}'")]
    EventlessLoop { state: String },

    /// An event was not handled and no `when_unhandled` hook was provided.
    #[error("Unhandled event '{event}' in state '{state}'")]
    UnhandledEvent { state: String, event: String },

    /// Generic builder or configuration error.
    #[error("Builder error: {0}")]
    BuilderError(String),
}
