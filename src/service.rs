// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Host loop that runs a [`StateMachine`] against injected actors.
//!
//! The service owns the machine, its context and a mailbox. `send` applies a transition
//! synchronously; every effect it returns runs on its own tokio task and reports back
//! through the mailbox. Hosts drain the mailbox with [`Service::settle_next`] or
//! [`Service::settle`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::machine::StateMachine;
use crate::types::{EventVariant, FsmAction, FsmContext, FsmResult, Invocation, StateVariant};

/// Point-in-time view of a machine for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<S, C> {
    pub state: S,
    pub context: C,
}

impl<S: StateVariant, C> Snapshot<S, C> {
    pub fn matches(&self, path: &str) -> bool {
        self.state.matches(path)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.state.has_tag(tag)
    }
}

struct InFlight {
    invocation: Invocation,
    task: JoinHandle<()>,
}

pub struct Service<S, E, C, A>
where
    A: FsmAction<Event = E>,
{
    machine: StateMachine<S, E, C, A>,
    context: C,
    actors: Arc<A::Actors>,
    mailbox_tx: mpsc::UnboundedSender<E>,
    mailbox_rx: mpsc::UnboundedReceiver<E>,
    in_flight: HashMap<&'static str, InFlight>,
    snapshots: watch::Sender<Snapshot<S, C>>,
}

impl<S, E, C, A> Service<S, E, C, A>
where
    S: StateVariant,
    E: EventVariant,
    C: FsmContext,
    A: FsmAction<Event = E>,
{
    pub fn new(machine: StateMachine<S, E, C, A>, context: C, actors: A::Actors) -> Self {
        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(Snapshot {
            state: machine.state().clone(),
            context: context.clone(),
        });
        Self {
            machine,
            context,
            actors: Arc::new(actors),
            mailbox_tx,
            mailbox_rx,
            in_flight: HashMap::new(),
            snapshots,
        }
    }

    pub fn state(&self) -> &S {
        self.machine.state()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn matches(&self, path: &str) -> bool {
        self.machine.matches(path)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.machine.has_tag(tag)
    }

    pub fn snapshot(&self) -> Snapshot<S, C> {
        Snapshot {
            state: self.machine.state().clone(),
            context: self.context.clone(),
        }
    }

    /// Receive a fresh snapshot after every processed event.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<S, C>> {
        self.snapshots.subscribe()
    }

    /// Number of actor invocations still running.
    pub fn pending_invocations(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply `event` and start whatever effects the transition produced.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send(&mut self, event: E) -> FsmResult<()> {
        let actions = self.machine.handle(event, &mut self.context)?;

        let machine = &self.machine;
        self.in_flight.retain(|slot, flight| {
            let live = machine.is_current(&flight.invocation);
            if !live {
                debug!("cancelling superseded invocation {} in slot {}", flight.invocation, slot);
                flight.task.abort();
            }
            live
        });

        for action in actions {
            self.dispatch(action);
        }

        self.snapshots.send_replace(self.snapshot());
        Ok(())
    }

    fn dispatch(&mut self, action: A) {
        trace!(action = %action.describe(), context = %self.context.describe(), "dispatching action");

        let invocation = action.invocation().copied();
        let actors = Arc::clone(&self.actors);
        let mailbox = self.mailbox_tx.clone();
        let task = tokio::spawn(async move {
            if let Some(event) = action.execute(&actors).await {
                // The receiver lives as long as the service; a send error means it is gone.
                let _ = mailbox.send(event);
            }
        });

        if let Some(invocation) = invocation {
            let flight = InFlight { invocation, task };
            if let Some(previous) = self.in_flight.insert(invocation.slot, flight) {
                previous.task.abort();
            }
        }
    }

    /// Deliver the next actor outcome, waiting for one if invocations are still running.
    ///
    /// Returns `false` once nothing is queued and nothing is in flight.
    pub async fn settle_next(&mut self) -> FsmResult<bool> {
        let event = match self.mailbox_rx.try_recv() {
            Ok(event) => event,
            Err(_) if self.in_flight.values().all(|f| f.task.is_finished()) => {
                // Finished tasks have already queued their event, if any.
                match self.mailbox_rx.try_recv() {
                    Ok(event) => event,
                    Err(_) => {
                        self.in_flight.clear();
                        return Ok(false);
                    }
                }
            }
            Err(_) => match self.mailbox_rx.recv().await {
                Some(event) => event,
                None => return Ok(false),
            },
        };

        self.send(event)?;
        Ok(true)
    }

    /// Keep delivering actor outcomes until the machine is quiescent.
    pub async fn settle(&mut self) -> FsmResult<()> {
        while self.settle_next().await? {}
        Ok(())
    }
}

impl<S, E, C, A> Drop for Service<S, E, C, A>
where
    A: FsmAction<Event = E>,
{
    fn drop(&mut self) {
        for flight in self.in_flight.values() {
            flight.task.abort();
        }
    }
}
