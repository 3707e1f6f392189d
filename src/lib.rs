// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! State-machine orchestration for a movie browser.
//!
//! `marquee-fsm` has two layers:
//! - A small **Mealy-machine** engine: `State(S) × Event(E) → Actions(A), State(S')`, with
//!   nested states, guarded transitions, eventless transitions, tags and actor invocations
//!   that are cancelled when their state is left.
//! - Four application machines built on it (auth, movie list, movie detail, favorites), each
//!   run by a tokio [`Service`] against injected [`Actor`]s.
//!
//! The engine keeps state evolution synchronous and deterministic:
//! - Transition handlers mutate the context and return a [`Transition`].
//! - Effects are [`FsmAction`]s; the host runs them and feeds their outcome back as events.
//! - Every actor invocation carries an [`Invocation`] token. A result whose token is no longer
//!   current is dropped, so a slow page-1 response can never overwrite page 2.
//!
//! ## Quick start
//!
//! ```rust
//! use marquee_fsm::builder::transitions::goto;
//! use marquee_fsm::{
//!     EventVariant, FsmAction, FsmBuilder, FsmContext, Invocation, StateVariant,
//! };
//!
//! #[derive(Clone, Debug, PartialEq, StateVariant)]
//! enum Door {
//!     Closed,
//!     #[fsm(tag = "busy")]
//!     Opening,
//!     Open,
//! }
//!
//! #[derive(Clone, Debug, EventVariant)]
//! enum DoorEvent {
//!     Push,
//!     Opened { invocation: Invocation },
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DoorAction {
//!     RunMotor(Invocation),
//! }
//!
//! #[async_trait::async_trait]
//! impl FsmAction for DoorAction {
//!     type Event = DoorEvent;
//!     type Actors = ();
//!
//!     fn invocation(&self) -> Option<&Invocation> {
//!         match self {
//!             DoorAction::RunMotor(invocation) => Some(invocation),
//!         }
//!     }
//!
//!     async fn execute(&self, _actors: &()) -> Option<DoorEvent> {
//!         match self {
//!             DoorAction::RunMotor(invocation) => Some(DoorEvent::Opened {
//!                 invocation: *invocation,
//!             }),
//!         }
//!     }
//! }
//!
//! #[derive(Clone, Default)]
//! struct DoorContext {
//!     pushes: u32,
//! }
//!
//! impl FsmContext for DoorContext {}
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), marquee_fsm::FsmError> {
//!     let machine = FsmBuilder::<Door, DoorEvent, DoorContext, DoorAction>::new(Door::Closed)
//!         .when("Closed")
//!         .on("Push", |_s, _e, ctx: &mut DoorContext| {
//!             ctx.pushes += 1;
//!             goto(Door::Opening)
//!         })
//!         .done()
//!         .when("Opening")
//!         .invoke("motor", |_s, _ctx, invocation| DoorAction::RunMotor(invocation))
//!         .on("Opened", |_s, _e, _ctx| goto(Door::Open))
//!         .done()
//!         .build()?;
//!
//!     let mut door = marquee_fsm::Service::new(machine, DoorContext::default(), ());
//!     door.send(DoorEvent::Push)?;
//!     assert!(door.has_tag("busy"));
//!
//!     door.settle().await?;
//!     assert_eq!(door.state(), &Door::Open);
//!     assert_eq!(door.context().pushes, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Nested states
//!
//! A variant marked `#[fsm(nested)]` wraps a sub-state enum. Its path is dot-joined
//! (`ShowingLogin.LoggingIn`), handlers registered on `ShowingLogin` apply to every sub-state
//! that does not handle the event itself, and moving between sub-states does not exit the
//! parent.
//!
//! ## Actors
//!
//! Machines only name their actor slots. Each machine module has an `*Actors` struct whose
//! `Default` leaves every slot unbound; invoking an unbound slot logs an error and reports
//! `UNKNOWN_ERROR`. `bind(...)` wires the slots to the clients in [`clients`]; tests use the
//! `with_*` builders to plug in fakes.

// Lets derive expansions that name `::marquee_fsm::...` work inside this crate.
extern crate self as marquee_fsm;

pub mod actor;
pub mod api_error;
pub mod builder;
pub mod clients;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod machine;
pub mod machines;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod validate;

pub use actor::Actor;
pub use api_error::{ApiError, ErrorKind};
pub use builder::FsmBuilder;
pub use config::{Config, ConfigError};
pub use error::FsmError;
pub use machine::StateMachine;
pub use service::{Service, Snapshot};
pub use types::{
    EventVariant, FsmAction, FsmContext, FsmResult, Invocation, StateVariant, Transition,
};

// Derives share their names with the traits they implement.
pub use marquee_fsm_macros::{EventVariant, StateVariant};
