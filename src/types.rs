// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Engine vocabulary: transitions, invocations and the traits machine types implement.

use std::fmt::{self, Debug};

use crate::error::FsmError;

/// What a transition handler decided: where to go and which effects to start.
#[derive(Clone, Debug)]
pub struct Transition<S, A> {
    pub next_state: S,
    pub actions: Vec<A>,
    /// Exit and re-enter the target even when it equals the current state
    pub reenter: bool,
}

impl<S, A> Transition<S, A> {
    /// Start a transition into `next_state`; add effects with [`TransitionBuilder::with_action`].
    pub fn to(next_state: S) -> TransitionBuilder<S, A> {
        TransitionBuilder {
            next_state,
            actions: vec![],
        }
    }
}

pub struct TransitionBuilder<S, A> {
    next_state: S,
    actions: Vec<A>,
}

impl<S, A> TransitionBuilder<S, A> {
    pub fn with_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Finish the transition. The target is always entered afresh.
    pub fn build(self) -> Transition<S, A> {
        Transition {
            next_state: self.next_state,
            actions: self.actions,
            reenter: true,
        }
    }
}

/// Identifies one actor invocation: the slot it runs in and the token it was issued.
///
/// Tokens grow monotonically per machine, so an invocation from an earlier entry of a state
/// never compares equal to the one that is currently active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Invocation {
    pub slot: &'static str,
    pub token: u64,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.slot, self.token)
    }
}

/// Implemented by state enums, usually through `#[derive(StateVariant)]`.
///
/// Nested states report a dot-joined path, e.g. `ShowingLogin.LoggingIn`.
pub trait StateVariant: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Name of the outermost variant, without its data.
    fn variant_name(&self) -> &str;

    /// Full path of the active state, descending into nested sub-states.
    fn state_path(&self) -> String {
        self.variant_name().to_string()
    }

    /// Whether the active state (or any nested sub-state) carries `tag`.
    fn has_tag(&self, _tag: &str) -> bool {
        false
    }

    /// True when `path` names the active state or one of its ancestors.
    fn matches(&self, path: &str) -> bool {
        let full = self.state_path();
        full == path
            || full
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Implemented by event enums, usually through `#[derive(EventVariant)]`.
pub trait EventVariant: Clone + Debug + Send + Sync + 'static {
    /// Name used to look up transition handlers.
    fn variant_name(&self) -> &str;

    /// The invocation this event settles, for actor lifecycle events.
    fn invocation(&self) -> Option<&Invocation> {
        None
    }
}

/// Trait for the data a machine carries between transitions
pub trait FsmContext: Clone + Send + Sync + 'static {
    /// One-line summary for trace output. Must not include credentials.
    fn describe(&self) -> String {
        "FSM Context".to_string()
    }
}

/// Effects produced by transitions and executed by the [`Service`](crate::Service).
///
/// Transition handlers stay pure; anything that touches the network lives here.
#[async_trait::async_trait]
pub trait FsmAction: Clone + Debug + Send + Sync + 'static {
    /// Events fed back into the machine once the effect settles
    type Event: EventVariant;
    /// Injected implementations the effect runs against
    type Actors: Send + Sync + 'static;

    /// The invocation this action starts, if it is an actor invocation.
    fn invocation(&self) -> Option<&Invocation> {
        None
    }

    /// Execute this action, returning the event that reports its outcome
    async fn execute(&self, actors: &Self::Actors) -> Option<Self::Event>;

    /// Summary used when the action is dispatched.
    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Boxed future returned by actor functions.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub type FsmResult<T> = Result<T, FsmError>;
