// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Handler type aliases for FSM callbacks

use std::sync::Arc;

use crate::types::{Invocation, Transition};

/// Type alias for transition handlers
///
/// The handler is invoked with the current state, event, and a mutable
/// reference to the machine context. Context updates happen here; effects
/// go into the returned `Transition`.
pub type TransitionHandler<S, E, C, A> =
    Arc<dyn Fn(&S, &E, &mut C) -> Transition<S, A> + Send + Sync>;

/// Type alias for eventless handlers, fired right after a state is entered
pub type EventlessHandler<S, C, A> = Arc<dyn Fn(&S, &mut C) -> Transition<S, A> + Send + Sync>;

/// Type alias for guards: pure predicates over the context
pub type Guard<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Type alias for state entry handlers
///
/// These are invoked on state entry and may produce additional actions.
pub type StateHandler<S, C, A> = Arc<dyn Fn(&S, &C) -> Vec<A> + Send + Sync>;

/// Type alias for invocation factories
///
/// Called on state entry with a freshly issued [`Invocation`]; the returned action starts
/// the actor and must report its outcome with events carrying that invocation.
pub type InvokeHandler<S, C, A> = Arc<dyn Fn(&S, &C, Invocation) -> A + Send + Sync>;

/// Type alias for the unhandled-event hook
pub type UnhandledHandler<S, E> = Arc<dyn Fn(&S, &E) + Send + Sync>;

/// One guarded candidate for an event or an eventless step.
pub(crate) struct Candidate<H, C> {
    pub(crate) guard: Option<Guard<C>>,
    pub(crate) handler: H,
}

impl<H, C> Candidate<H, C> {
    pub(crate) fn enabled(&self, ctx: &C) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(ctx))
    }
}
