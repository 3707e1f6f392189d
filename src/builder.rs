// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Fluent builder API for creating FSMs

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::FsmError;
use crate::handlers::{
    Candidate, EventlessHandler, InvokeHandler, StateHandler, TransitionHandler,
    UnhandledHandler,
};
use crate::machine::StateMachine;
use crate::types::{EventVariant, FsmAction, FsmContext, FsmResult, Invocation, StateVariant, Transition};

/// Scope name used for transitions that apply in every state.
pub(crate) const ANY_STATE: &str = "_";

pub(crate) type TransitionTable<S, E, C, A> =
    HashMap<(String, String), Vec<Candidate<TransitionHandler<S, E, C, A>, C>>>;
pub(crate) type EventlessTable<S, C, A> = HashMap<String, Vec<Candidate<EventlessHandler<S, C, A>, C>>>;
pub(crate) type InvokeTable<S, C, A> = HashMap<String, Vec<(&'static str, InvokeHandler<S, C, A>)>>;

/// Main builder for creating FSMs
pub struct FsmBuilder<S, E, C, A> {
    initial_state: S,
    transitions: TransitionTable<S, E, C, A>,
    eventless: EventlessTable<S, C, A>,
    entry_handlers: HashMap<String, Vec<StateHandler<S, C, A>>>,
    invocations: InvokeTable<S, C, A>,
    unhandled_handler: Option<UnhandledHandler<S, E>>,
    _phantom: PhantomData<E>,
}

impl<S, E, C, A> FsmBuilder<S, E, C, A>
where
    S: StateVariant,
    E: EventVariant,
    C: FsmContext,
    A: FsmAction<Event = E>,
{
    /// Create a new FSM builder with an initial state
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: HashMap::new(),
            eventless: HashMap::new(),
            entry_handlers: HashMap::new(),
            invocations: HashMap::new(),
            unhandled_handler: None,
            _phantom: PhantomData,
        }
    }

    /// Start defining behavior for a state path (`"Idle"`, `"ShowingLogin"`,
    /// `"ShowingLogin.LoggingIn"`). Handlers on a compound path apply to all of its
    /// sub-states unless a deeper path handles the event first.
    pub fn when(self, state_path: &str) -> WhenBuilder<S, E, C, A> {
        WhenBuilder {
            builder: self,
            state_path: state_path.to_string(),
        }
    }

    /// Define behavior for any state (wildcard)
    pub fn from_any(self) -> WhenBuilder<S, E, C, A> {
        WhenBuilder {
            builder: self,
            state_path: ANY_STATE.to_string(),
        }
    }

    /// Define handler for unhandled events. The event is dropped after the hook runs.
    pub fn when_unhandled<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &E) + Send + Sync + 'static,
    {
        self.unhandled_handler = Some(Arc::new(handler));
        self
    }

    /// Build the final state machine
    pub fn build(self) -> FsmResult<StateMachine<S, E, C, A>> {
        for (state, slots) in &self.invocations {
            let mut seen: Vec<&str> = Vec::with_capacity(slots.len());
            for (slot, _) in slots {
                if seen.contains(slot) {
                    return Err(FsmError::DuplicateHandler {
                        state: state.clone(),
                        slot: slot.to_string(),
                    });
                }
                seen.push(slot);
            }
        }
        if self.invocations.contains_key(ANY_STATE) || self.eventless.contains_key(ANY_STATE) {
            return Err(FsmError::BuilderError(
                "invocations and eventless transitions need a concrete state".to_string(),
            ));
        }

        Ok(StateMachine::new(
            self.initial_state,
            self.transitions,
            self.eventless,
            self.entry_handlers,
            self.invocations,
            self.unhandled_handler,
        ))
    }
}

/// Builder for defining state-specific behavior
pub struct WhenBuilder<S, E, C, A> {
    builder: FsmBuilder<S, E, C, A>,
    state_path: String,
}

impl<S, E, C, A> WhenBuilder<S, E, C, A>
where
    S: StateVariant,
    E: EventVariant,
    C: FsmContext,
    A: FsmAction<Event = E>,
{
    /// Define an unguarded transition for an event. Registered after guarded candidates it
    /// acts as their fallback.
    pub fn on<F>(self, event_name: &str, handler: F) -> Self
    where
        F: Fn(&S, &E, &mut C) -> Transition<S, A> + Send + Sync + 'static,
    {
        self.push_candidate(event_name, None, Arc::new(handler))
    }

    /// Define a guarded transition. Candidates are tried in registration order and the
    /// first whose guard passes fires.
    pub fn on_if<G, F>(self, event_name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&C) -> bool + Send + Sync + 'static,
        F: Fn(&S, &E, &mut C) -> Transition<S, A> + Send + Sync + 'static,
    {
        self.push_candidate(event_name, Some(Arc::new(guard)), Arc::new(handler))
    }

    /// Define an eventless transition taken as soon as the state is entered
    pub fn always<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &mut C) -> Transition<S, A> + Send + Sync + 'static,
    {
        self.builder
            .eventless
            .entry(self.state_path.clone())
            .or_default()
            .push(Candidate {
                guard: None,
                handler: Arc::new(handler),
            });
        self
    }

    /// Define a guarded eventless transition
    pub fn always_if<G, F>(mut self, guard: G, handler: F) -> Self
    where
        G: Fn(&C) -> bool + Send + Sync + 'static,
        F: Fn(&S, &mut C) -> Transition<S, A> + Send + Sync + 'static,
    {
        self.builder
            .eventless
            .entry(self.state_path.clone())
            .or_default()
            .push(Candidate {
                guard: Some(Arc::new(guard)),
                handler: Arc::new(handler),
            });
        self
    }

    /// Declare the actor this state invokes on entry. Leaving the state cancels it.
    pub fn invoke<F>(mut self, slot: &'static str, factory: F) -> Self
    where
        F: Fn(&S, &C, Invocation) -> A + Send + Sync + 'static,
    {
        self.builder
            .invocations
            .entry(self.state_path.clone())
            .or_default()
            .push((slot, Arc::new(factory)));
        self
    }

    /// Define entry handler for this state
    pub fn on_entry<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &C) -> Vec<A> + Send + Sync + 'static,
    {
        self.builder
            .entry_handlers
            .entry(self.state_path.clone())
            .or_default()
            .push(Arc::new(handler));
        self
    }

    /// Continue with the builder (ends this state's configuration)
    pub fn done(self) -> FsmBuilder<S, E, C, A> {
        self.builder
    }

    fn push_candidate(
        mut self,
        event_name: &str,
        guard: Option<crate::handlers::Guard<C>>,
        handler: TransitionHandler<S, E, C, A>,
    ) -> Self {
        self.builder
            .transitions
            .entry((self.state_path.clone(), event_name.to_string()))
            .or_default()
            .push(Candidate { guard, handler });
        self
    }
}

/// Convenience functions for creating transitions
pub mod transitions {
    use crate::Transition;

    /// Transition to a state, re-entering it if it is already active
    pub fn goto<S, A>(state: S) -> Transition<S, A> {
        goto_with_actions(state, vec![])
    }

    /// Transition to a state with actions
    pub fn goto_with_actions<S, A>(state: S, actions: Vec<A>) -> Transition<S, A> {
        Transition {
            next_state: state,
            actions,
            reenter: true,
        }
    }

    /// Stay in the current state without exiting it
    pub fn stay<S: Clone, A>(current_state: &S) -> Transition<S, A> {
        Transition {
            next_state: current_state.clone(),
            actions: vec![],
            reenter: false,
        }
    }
}
