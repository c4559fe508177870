//! Device action execution
//!
//! Executing an action builds its state machine once, starts an [`Actor`]
//! over it and translates every actor snapshot into a [`DeviceActionState`].
//! The states are multicast through a replaying, reference counted stream:
//! all subscribers observe the same single run, and dropping the last one
//! stops the actor.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, debug_span};

use crate::actor::{Actor, ActorStatus, ObserverId, Snapshot};
use crate::api::InternalApi;
use crate::machine::StateMachine;
use crate::replay::{ReplaySubject, SharedStream, StateStream};
use crate::{DeviceActionState, MachineFault};

/// Progress state type of machine `M`
pub type ActionState<M> = DeviceActionState<
    <M as StateMachine>::Output,
    <M as StateMachine>::Error,
    <M as StateMachine>::IntermediateValue,
>;

/// An operation performed against a device
pub trait DeviceAction: Send + Sync {
    /// Machine implementing the action
    type Machine: StateMachine;

    /// Input the machine starts from
    fn input(&self) -> <Self::Machine as StateMachine>::Input;

    /// Log the internal state alongside every pending state
    fn inspect(&self) -> bool {
        false
    }

    /// Build the machine for one execution
    fn make_state_machine(&self, api: Arc<dyn InternalApi>) -> Self::Machine;

    /// Run the action
    ///
    /// The machine starts right away. Its states can be observed through the
    /// returned handle, which also cancels the run.
    fn execute(&self, api: Arc<dyn InternalApi>) -> ExecuteDeviceAction<Self::Machine> {
        let machine = self.make_state_machine(api);
        ExecuteDeviceAction::run(machine, self.input(), self.inspect())
    }
}

/// Handle on a running device action
pub struct ExecuteDeviceAction<M: StateMachine> {
    observable: SharedStream<ActionState<M>, MachineFault>,
    cancel: CancelHandle,
}

impl<M: StateMachine> fmt::Debug for ExecuteDeviceAction<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteDeviceAction")
            .field("subscribers", &self.observable.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl<M: StateMachine> ExecuteDeviceAction<M> {
    /// Start `machine` with `input`
    pub fn run(machine: M, input: M::Input, inspect: bool) -> Self {
        let span = debug_span!("device_action", id = machine.id());
        let _entered = span.enter();
        debug!(?input, "Executing device action");

        let actor = Actor::new(machine, input);
        let subject = ReplaySubject::new();
        let observer = {
            let subject = subject.clone();
            actor.subscribe(move |snapshot| {
                publish(&subject, snapshot, inspect);
            })
        };

        let run = Arc::new(Run {
            actor,
            subject: subject.clone(),
            observer: Mutex::new(Some(observer)),
            inspect,
        });
        let observable = {
            let run = Arc::clone(&run);
            SharedStream::new(subject, move || run.shutdown())
        };

        run.actor.start();

        Self {
            observable,
            cancel: CancelHandle { run },
        }
    }

    /// Shared state stream of this run
    pub const fn observable(&self) -> &SharedStream<ActionState<M>, MachineFault> {
        &self.observable
    }

    /// Subscribe to the state stream, replaying the states seen so far
    pub fn subscribe(&self) -> StateStream<ActionState<M>, MachineFault> {
        self.observable.subscribe()
    }

    /// Stop the run. Subscribers receive a final [`DeviceActionState::Stopped`]
    /// unless the action had already finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Detached cancel handle, usable after this handle is dropped
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

/// Cancels a running device action
#[derive(Clone)]
pub struct CancelHandle {
    run: Arc<dyn Shutdown>,
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}

impl CancelHandle {
    /// Stop the run. Calling it again does nothing.
    pub fn cancel(&self) {
        self.run.shutdown();
    }
}

trait Shutdown: Send + Sync {
    fn shutdown(&self);
}

struct Run<M: StateMachine> {
    actor: Actor<M>,
    subject: ReplaySubject<ActionState<M>, MachineFault>,
    observer: Mutex<Option<ObserverId>>,
    inspect: bool,
}

impl<M: StateMachine> Shutdown for Run<M> {
    fn shutdown(&self) {
        self.actor.stop();
        if let Some(observer) = self.observer.lock().take() {
            self.actor.unsubscribe(observer);
        }
        // a stopped actor publishes nothing on its own
        self.actor
            .with_snapshot(|snapshot| publish(&self.subject, snapshot, self.inspect));
    }
}

fn publish<M: StateMachine>(
    subject: &ReplaySubject<ActionState<M>, MachineFault>,
    snapshot: &Snapshot<'_, M>,
    inspect: bool,
) {
    let context = snapshot.context;
    match snapshot.status {
        ActorStatus::Active => {
            if inspect {
                debug!(state = ?context.state, internal_state = ?context.internal_state, "State");
            } else {
                debug!(state = ?context.state, "State");
            }
            subject.next(DeviceActionState::Pending {
                intermediate_value: context.intermediate_value.clone(),
            });
        }
        ActorStatus::Done(Ok(output)) => {
            subject.next(DeviceActionState::Completed {
                output: output.clone(),
            });
            subject.complete();
        }
        ActorStatus::Done(Err(error)) => {
            subject.next(DeviceActionState::Error {
                error: error.clone(),
            });
            subject.complete();
        }
        ActorStatus::Fault(fault) => subject.error(fault.clone()),
        ActorStatus::Stopped => {
            subject.next(DeviceActionState::Stopped);
            subject.complete();
        }
    }
}
