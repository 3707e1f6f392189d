// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Engine semantics, independent of the application machines.
//!
//! What it tests:
//! - Handler lookup walks from the leaf state to its ancestors, then the wildcard
//! - Guarded candidates fire in registration order with the unguarded one as fallback
//! - Eventless transitions resolve on entry and are bounded
//! - Invocations live as long as the scope that declared them
//! - Derived paths and tags through nested states
//!
//! Why it matters:
//! - The auth forms rely on nested lookup and the startup check on eventless resolution
//! - Stale-result rejection depends on invocation scoping being exact

use marquee_fsm::builder::transitions::{goto, stay};
use marquee_fsm::{
    EventVariant, FsmAction, FsmBuilder, FsmContext, FsmError, Invocation, StateMachine,
    StateVariant,
};

#[derive(Clone, Debug, PartialEq, StateVariant)]
enum Track {
    Playing,
    #[fsm(tag = "buffering")]
    Buffering,
}

#[derive(Clone, Debug, PartialEq, StateVariant)]
enum Player {
    Stopped,
    #[fsm(nested, tag = "active")]
    Active(Track),
    Checking,
    Done,
}

#[derive(Clone, Debug, EventVariant)]
enum PlayerEvent {
    Start,
    Stall,
    Resume,
    Stop,
    Check,
    Verify,
    Bump,
    Chunk { invocation: Invocation },
}

#[derive(Clone, Debug, PartialEq)]
enum PlayerAction {
    Stream(Invocation),
    Note(&'static str),
}

#[async_trait::async_trait]
impl FsmAction for PlayerAction {
    type Event = PlayerEvent;
    type Actors = ();

    fn invocation(&self) -> Option<&Invocation> {
        match self {
            PlayerAction::Stream(invocation) => Some(invocation),
            PlayerAction::Note(_) => None,
        }
    }

    async fn execute(&self, _actors: &()) -> Option<PlayerEvent> {
        None
    }
}

#[derive(Clone, Debug, Default)]
struct PlayerContext {
    count: u32,
    verified: bool,
    log: Vec<&'static str>,
}

impl FsmContext for PlayerContext {}

type PlayerMachine = StateMachine<Player, PlayerEvent, PlayerContext, PlayerAction>;

fn player() -> PlayerMachine {
    let builder: FsmBuilder<Player, PlayerEvent, PlayerContext, PlayerAction> =
        FsmBuilder::new(Player::Stopped);
    builder
        .from_any()
        .on("Bump", |state, _event, ctx| {
            ctx.count += 1;
            stay(state)
        })
        .on("Verify", |_state, _event, _ctx| goto(Player::Checking))
        .done()
        .when("Stopped")
        .on("Start", |_state, _event, _ctx| goto(Player::Active(Track::Playing)))
        .on_if(
            "Check",
            |ctx| ctx.count > 1,
            |_state, _event, _ctx| goto(Player::Done),
        )
        .on_if(
            "Check",
            |ctx| ctx.count > 0,
            |state, _event, ctx| {
                ctx.log.push("one");
                stay(state)
            },
        )
        .on("Check", |state, _event, ctx| {
            ctx.log.push("fallback");
            stay(state)
        })
        .done()
        .when("Active")
        .invoke("stream", |_state, _ctx, invocation| PlayerAction::Stream(invocation))
        .on_entry(|_state, _ctx| vec![PlayerAction::Note("entered active")])
        .on("Stall", |_state, _event, ctx| {
            ctx.log.push("parent stall");
            goto(Player::Active(Track::Buffering))
        })
        .on("Stop", |_state, _event, _ctx| goto(Player::Stopped))
        .done()
        .when("Active.Playing")
        .on("Stall", |_state, _event, ctx| {
            ctx.log.push("child stall");
            goto(Player::Active(Track::Buffering))
        })
        .done()
        .when("Active.Buffering")
        .on("Resume", |_state, _event, _ctx| goto(Player::Active(Track::Playing)))
        .done()
        .when("Checking")
        .always_if(|ctx| ctx.verified, |_state, _ctx| goto(Player::Done))
        .always(|_state, _ctx| goto(Player::Stopped))
        .done()
        .build()
        .unwrap()
}

fn stream_invocation(actions: &[PlayerAction]) -> Invocation {
    actions
        .iter()
        .find_map(|a| a.invocation().copied())
        .expect("stream invocation")
}

#[test]
fn test_derived_paths_and_tags() {
    let state = Player::Active(Track::Buffering);
    assert_eq!(state.variant_name(), "Active");
    assert_eq!(state.state_path(), "Active.Buffering");
    assert!(state.matches("Active"));
    assert!(state.matches("Active.Buffering"));
    assert!(!state.matches("Active.Playing"));
    assert!(!state.matches("Act"));
    assert!(state.has_tag("active"));
    assert!(state.has_tag("buffering"));
    assert!(!Player::Active(Track::Playing).has_tag("buffering"));
    assert!(!Player::Stopped.has_tag("active"));

    let event = PlayerEvent::Chunk {
        invocation: Invocation {
            slot: "stream",
            token: 4,
        },
    };
    assert_eq!(event.variant_name(), "Chunk");
    assert_eq!(event.invocation().map(|i| i.token), Some(4));
    assert!(PlayerEvent::Stop.invocation().is_none());
}

#[test]
fn test_leaf_handler_wins_over_parent() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    fsm.handle(PlayerEvent::Start, &mut ctx).unwrap();
    fsm.handle(PlayerEvent::Stall, &mut ctx).unwrap();
    assert_eq!(fsm.state(), &Player::Active(Track::Buffering));

    // Buffering has no Stall handler of its own.
    fsm.handle(PlayerEvent::Stall, &mut ctx).unwrap();
    assert_eq!(ctx.log, vec!["child stall", "parent stall"]);

    // Stop is only registered on the parent.
    fsm.handle(PlayerEvent::Stop, &mut ctx).unwrap();
    assert_eq!(fsm.state(), &Player::Stopped);
}

#[test]
fn test_wildcard_applies_everywhere() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    fsm.handle(PlayerEvent::Bump, &mut ctx).unwrap();
    fsm.handle(PlayerEvent::Start, &mut ctx).unwrap();
    fsm.handle(PlayerEvent::Bump, &mut ctx).unwrap();
    assert_eq!(ctx.count, 2);
    assert_eq!(fsm.state(), &Player::Active(Track::Playing));
}

#[test]
fn test_guards_fire_in_registration_order() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    fsm.handle(PlayerEvent::Check, &mut ctx).unwrap();
    assert_eq!(ctx.log, vec!["fallback"]);

    ctx.count = 1;
    fsm.handle(PlayerEvent::Check, &mut ctx).unwrap();
    assert_eq!(ctx.log, vec!["fallback", "one"]);
    assert_eq!(fsm.state(), &Player::Stopped);

    ctx.count = 5;
    fsm.handle(PlayerEvent::Check, &mut ctx).unwrap();
    assert_eq!(fsm.state(), &Player::Done);
    assert_eq!(ctx.log.len(), 2);
}

#[test]
fn test_eventless_transitions_resolve_on_entry() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    fsm.handle(PlayerEvent::Verify, &mut ctx).unwrap();
    assert_eq!(fsm.state(), &Player::Stopped);

    ctx.verified = true;
    fsm.handle(PlayerEvent::Verify, &mut ctx).unwrap();
    assert_eq!(fsm.state(), &Player::Done);
}

#[test]
fn test_eventless_cycle_is_reported() {
    let builder: FsmBuilder<Player, PlayerEvent, PlayerContext, PlayerAction> =
        FsmBuilder::new(Player::Stopped);
    let mut fsm = builder
        .when("Stopped")
        .on("Verify", |_state, _event, _ctx| goto(Player::Checking))
        .done()
        .when("Checking")
        .always(|_state, _ctx| goto(Player::Done))
        .done()
        .when("Done")
        .always(|_state, _ctx| goto(Player::Checking))
        .done()
        .build()
        .unwrap();

    let err = fsm
        .handle(PlayerEvent::Verify, &mut PlayerContext::default())
        .unwrap_err();
    assert!(matches!(err, FsmError::EventlessLoop { .. }), "{err:?}");
}

#[test]
fn test_parent_invocation_survives_child_moves() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    let actions = fsm.handle(PlayerEvent::Start, &mut ctx).unwrap();
    assert_eq!(actions[0], PlayerAction::Note("entered active"));
    let stream = stream_invocation(&actions);

    let actions = fsm.handle(PlayerEvent::Stall, &mut ctx).unwrap();
    assert!(actions.is_empty(), "moving between children must not re-enter the parent");
    fsm.handle(PlayerEvent::Resume, &mut ctx).unwrap();
    assert!(fsm.is_current(&stream));
    assert_eq!(fsm.active_invocations(), vec![stream]);

    fsm.handle(PlayerEvent::Stop, &mut ctx).unwrap();
    assert!(!fsm.is_current(&stream));
    assert!(fsm.active_invocations().is_empty());

    // A late chunk from the cancelled stream changes nothing.
    let actions = fsm
        .handle(PlayerEvent::Chunk { invocation: stream }, &mut ctx)
        .unwrap();
    assert!(actions.is_empty());
    assert_eq!(fsm.state(), &Player::Stopped);
}

#[test]
fn test_stay_does_not_reenter() {
    let mut fsm = player();
    let mut ctx = PlayerContext::default();

    let stream = stream_invocation(&fsm.handle(PlayerEvent::Start, &mut ctx).unwrap());
    let actions = fsm.handle(PlayerEvent::Bump, &mut ctx).unwrap();
    assert!(actions.is_empty());
    assert!(fsm.is_current(&stream));
}

#[test]
fn test_unhandled_event_goes_to_hook() {
    let builder: FsmBuilder<Player, PlayerEvent, PlayerContext, PlayerAction> =
        FsmBuilder::new(Player::Stopped);
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut fsm = builder
        .when_unhandled(move |state, event| {
            sink.lock()
                .unwrap()
                .push(format!("{}:{}", state.state_path(), event.variant_name()));
        })
        .build()
        .unwrap();

    let actions = fsm
        .handle(PlayerEvent::Resume, &mut PlayerContext::default())
        .unwrap();
    assert!(actions.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec!["Stopped:Resume".to_string()]);
}

#[test]
fn test_builder_rejects_bad_invocations() {
    let builder: FsmBuilder<Player, PlayerEvent, PlayerContext, PlayerAction> =
        FsmBuilder::new(Player::Stopped);
    let duplicate = builder
        .when("Active")
        .invoke("stream", |_s, _c, inv| PlayerAction::Stream(inv))
        .invoke("stream", |_s, _c, inv| PlayerAction::Stream(inv))
        .done()
        .build();
    assert!(matches!(
        duplicate,
        Err(FsmError::DuplicateHandler { ref state, ref slot }) if state == "Active" && slot == "stream"
    ));

    let builder: FsmBuilder<Player, PlayerEvent, PlayerContext, PlayerAction> =
        FsmBuilder::new(Player::Stopped);
    let wildcard = builder
        .from_any()
        .invoke("stream", |_s, _c, inv| PlayerAction::Stream(inv))
        .done()
        .build();
    assert!(matches!(wildcard, Err(FsmError::BuilderError(_))));
}
