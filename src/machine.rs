// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! StateMachine implementation

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::builder::{EventlessTable, InvokeTable, TransitionTable, ANY_STATE};
use crate::error::FsmError;
use crate::handlers::{StateHandler, TransitionHandler, UnhandledHandler};
use crate::types::{
    EventVariant, FsmAction, FsmContext, FsmResult, Invocation, StateVariant, Transition,
};

/// Upper bound on chained eventless transitions triggered by a single event.
const MAX_EVENTLESS_STEPS: usize = 16;

#[derive(Clone, Debug)]
struct ActiveInvocation {
    token: u64,
    scope: String,
}

/// The concrete FSM implementation
pub struct StateMachine<S, E, C, A> {
    current_state: S,
    transitions: Arc<TransitionTable<S, E, C, A>>,
    eventless: Arc<EventlessTable<S, C, A>>,
    entry_handlers: Arc<HashMap<String, Vec<StateHandler<S, C, A>>>>,
    invocations: Arc<InvokeTable<S, C, A>>,
    unhandled_handler: Option<UnhandledHandler<S, E>>,
    active: HashMap<&'static str, ActiveInvocation>,
    next_token: u64,
    _phantom: PhantomData<E>,
}

/// Scopes of a state path, innermost first: `A.B.C` → `A.B.C`, `A.B`, `A`.
fn scopes(path: &str) -> Vec<String> {
    let mut out = vec![path.to_string()];
    let mut rest = path;
    while let Some(idx) = rest.rfind('.') {
        rest = &rest[..idx];
        out.push(rest.to_string());
    }
    out
}

impl<S, E, C, A> StateMachine<S, E, C, A>
where
    S: StateVariant,
    E: EventVariant,
    C: FsmContext,
    A: FsmAction<Event = E>,
{
    /// Create a new state machine
    /// This method is intentionally pub(crate) to enforce builder-only construction
    pub(crate) fn new(
        initial_state: S,
        transitions: TransitionTable<S, E, C, A>,
        eventless: EventlessTable<S, C, A>,
        entry_handlers: HashMap<String, Vec<StateHandler<S, C, A>>>,
        invocations: InvokeTable<S, C, A>,
        unhandled_handler: Option<UnhandledHandler<S, E>>,
    ) -> Self {
        Self {
            current_state: initial_state,
            transitions: Arc::new(transitions),
            eventless: Arc::new(eventless),
            entry_handlers: Arc::new(entry_handlers),
            invocations: Arc::new(invocations),
            unhandled_handler,
            active: HashMap::new(),
            next_token: 0,
            _phantom: PhantomData,
        }
    }

    /// Get the current state
    pub fn state(&self) -> &S {
        &self.current_state
    }

    /// Whether the current state is `path` or lies inside it
    pub fn matches(&self, path: &str) -> bool {
        self.current_state.matches(path)
    }

    /// Whether the current state carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.current_state.has_tag(tag)
    }

    /// Whether `invocation` is still the live one for its slot
    pub fn is_current(&self, invocation: &Invocation) -> bool {
        self.active
            .get(invocation.slot)
            .is_some_and(|active| active.token == invocation.token)
    }

    /// Invocations currently in flight, one per slot
    pub fn active_invocations(&self) -> Vec<Invocation> {
        self.active
            .iter()
            .map(|(slot, active)| Invocation {
                slot,
                token: active.token,
            })
            .collect()
    }

    /// Handle an event and potentially transition to a new state.
    ///
    /// Returns the effects the host must run. Lifecycle events whose invocation has been
    /// superseded are dropped without touching state or context.
    pub fn handle(&mut self, event: E, context: &mut C) -> FsmResult<Vec<A>> {
        let state_path = self.current_state.state_path();
        let event_name = event.variant_name().to_string();

        if let Some(invocation) = event.invocation() {
            if !self.is_current(invocation) {
                debug!(
                    "FSM discarding stale {} for {} in state {}",
                    event_name, invocation, state_path
                );
                return Ok(vec![]);
            }
        }

        debug!("FSM handling event {} in state {}", event_name, state_path);

        match self.select_handler(&state_path, &event_name, context) {
            Some(handler) => {
                let transition = handler(&self.current_state, &event, context);
                self.apply_transition(transition, context)
            }
            None => match &self.unhandled_handler {
                Some(hook) => {
                    hook(&self.current_state, &event);
                    Ok(vec![])
                }
                None => Err(FsmError::UnhandledEvent {
                    state: state_path,
                    event: event_name,
                }),
            },
        }
    }

    /// Innermost scope first, then ancestors, then the wildcard; first enabled candidate wins.
    fn select_handler(
        &self,
        state_path: &str,
        event_name: &str,
        context: &C,
    ) -> Option<TransitionHandler<S, E, C, A>> {
        let mut lookup = scopes(state_path);
        lookup.push(ANY_STATE.to_string());

        lookup.into_iter().find_map(|scope| {
            self.transitions
                .get(&(scope, event_name.to_string()))
                .and_then(|candidates| candidates.iter().find(|c| c.enabled(context)))
                .map(|c| Arc::clone(&c.handler))
        })
    }

    /// Apply a state transition, then follow any eventless transitions it unlocks
    fn apply_transition(
        &mut self,
        transition: Transition<S, A>,
        context: &mut C,
    ) -> FsmResult<Vec<A>> {
        let mut all_actions = vec![];
        let mut pending = Some(transition);
        let mut steps = 0;

        while let Some(Transition {
            next_state,
            actions,
            reenter,
        }) = pending.take()
        {
            if steps > MAX_EVENTLESS_STEPS {
                return Err(FsmError::EventlessLoop {
                    state: self.current_state.state_path(),
                });
            }
            steps += 1;

            if reenter || self.current_state != next_state {
                let old_path = self.current_state.state_path();
                let new_path = next_state.state_path();
                self.current_state = next_state;

                let old_scopes = scopes(&old_path);
                let new_scopes = scopes(&new_path);
                // Ancestors shared by both paths are neither exited nor re-entered.
                let retained: Vec<&String> = new_scopes
                    .iter()
                    .skip(1)
                    .filter(|s| old_scopes.contains(s))
                    .collect();

                // Exited scopes take their in-flight invocations with them.
                self.active
                    .retain(|_, active| retained.contains(&&active.scope));

                // Enter new scopes outermost first
                for scope in new_scopes.iter().rev().filter(|s| !retained.contains(s)) {
                    all_actions.extend(self.enter_scope(scope, context));
                }

                debug!("FSM transitioned from {} to {}", old_path, new_path);
                all_actions.extend(actions);
                pending = self.eventless_transition(&new_scopes, context);
            } else {
                all_actions.extend(actions);
            }
        }

        Ok(all_actions)
    }

    fn enter_scope(&mut self, scope: &str, context: &C) -> Vec<A> {
        let mut actions = vec![];

        if let Some(handlers) = self.entry_handlers.get(scope) {
            for handler in handlers {
                actions.extend(handler(&self.current_state, context));
            }
        }

        let invocations = Arc::clone(&self.invocations);
        if let Some(slots) = invocations.get(scope) {
            for (slot, factory) in slots {
                self.next_token += 1;
                let invocation = Invocation {
                    slot,
                    token: self.next_token,
                };
                self.active.insert(
                    slot,
                    ActiveInvocation {
                        token: invocation.token,
                        scope: scope.to_string(),
                    },
                );
                debug!("FSM invoking {} on entry to {}", invocation, scope);
                actions.push(factory(&self.current_state, context, invocation));
            }
        }

        actions
    }

    fn eventless_transition(&self, scopes: &[String], context: &mut C) -> Option<Transition<S, A>> {
        let ctx: &C = context;
        let handler = scopes.iter().find_map(|scope| {
            self.eventless
                .get(scope)
                .and_then(|candidates| candidates.iter().find(|c| c.enabled(ctx)))
                .map(|c| Arc::clone(&c.handler))
        })?;
        Some(handler(&self.current_state, context))
    }
}
