//! Single-run driver of a [`StateMachine`]
//!
//! The actor owns the machine context and an event queue. Events are
//! processed one at a time under a lock. Events the machine raises for itself
//! are drained in the same pass, and observers get one [`Snapshot`] per
//! external event, once the machine has settled. Effects run on the Tokio
//! runtime and are aborted when the actor stops.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable, BoxFuture};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{Instrument, Span, debug, debug_span, trace, warn};

use crate::MachineFault;
use crate::machine::{Context, StateMachine, Step};

/// Lifecycle status of an actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActorStatus<Output, Error> {
    /// Running
    Active,
    /// Finished with an output or a domain error
    Done(Result<Output, Error>),
    /// The machine itself failed
    Fault(MachineFault),
    /// Stopped before finishing
    Stopped,
}

impl<O, E> ActorStatus<O, E> {
    /// Whether the actor still processes events
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// View of an actor at one point in time
pub struct Snapshot<'a, M: StateMachine> {
    /// Lifecycle status
    pub status: &'a ActorStatus<M::Output, M::Error>,
    /// Machine context
    pub context: &'a Context<M>,
}

impl<M: StateMachine> fmt::Debug for Snapshot<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("status", self.status)
            .field("state", &self.context.state)
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`Actor::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer<M> = Box<dyn Fn(&Snapshot<'_, M>) + Send + Sync>;

struct ActorCore<M: StateMachine> {
    context: Context<M>,
    status: ActorStatus<M::Output, M::Error>,
    queue: VecDeque<M::Event>,
    effect: Option<AbortHandle>,
    observers: Vec<(ObserverId, Observer<M>)>,
    next_observer: u64,
    started: bool,
}

impl<M: StateMachine> ActorCore<M> {
    fn notify(&self) {
        let snapshot = Snapshot {
            status: &self.status,
            context: &self.context,
        };
        for (_, observer) in &self.observers {
            observer(&snapshot);
        }
    }

    fn abort_effect(&mut self) {
        if let Some(effect) = self.effect.take() {
            effect.abort();
        }
    }
}

/// Runs one machine instance
pub struct Actor<M: StateMachine> {
    machine: Arc<M>,
    core: Arc<Mutex<ActorCore<M>>>,
    span: Span,
}

impl<M: StateMachine> Clone for Actor<M> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            core: Arc::clone(&self.core),
            span: self.span.clone(),
        }
    }
}

impl<M: StateMachine> fmt::Debug for Actor<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.machine.id())
            .finish_non_exhaustive()
    }
}

impl<M: StateMachine> Actor<M> {
    /// Create an actor, not started yet
    pub fn new(machine: M, input: M::Input) -> Self {
        let context = machine.initial_context(input);
        let span = debug_span!("device_action", id = machine.id());
        Self {
            machine: Arc::new(machine),
            core: Arc::new(Mutex::new(ActorCore {
                context,
                status: ActorStatus::Active,
                queue: VecDeque::new(),
                effect: None,
                observers: Vec::new(),
                next_observer: 0,
                started: false,
            })),
            span,
        }
    }

    /// Register an observer called with every snapshot
    ///
    /// Observers run while the actor is locked and must not call back into it.
    pub fn subscribe(
        &self,
        observer: impl Fn(&Snapshot<'_, M>) + Send + Sync + 'static,
    ) -> ObserverId {
        let mut core = self.core.lock();
        let id = ObserverId(core.next_observer);
        core.next_observer += 1;
        core.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was already removed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut core = self.core.lock();
        let before = core.observers.len();
        core.observers.retain(|(observer, _)| *observer != id);
        core.observers.len() != before
    }

    /// Run the entry step of the machine. Later calls do nothing.
    pub fn start(&self) {
        let _entered = self.span.enter();
        let mut guard = self.core.lock();
        let core = &mut *guard;
        if core.started || !core.status.is_active() {
            return;
        }
        core.started = true;
        debug!("Starting actor");
        let step = self.machine.start(&mut core.context);
        self.run(core, step);
    }

    /// Stop the actor
    ///
    /// Pending events are dropped, the running effect is aborted and the
    /// machine's stop hook is called. Returns false if the actor had already
    /// finished or stopped, in which case nothing happens.
    pub fn stop(&self) -> bool {
        let _entered = self.span.enter();
        let mut guard = self.core.lock();
        let core = &mut *guard;
        if !core.status.is_active() {
            return false;
        }
        core.status = ActorStatus::Stopped;
        core.queue.clear();
        core.abort_effect();
        self.machine.on_stop(&core.context);
        debug!("Actor stopped");
        true
    }

    /// Inspect the current snapshot
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&Snapshot<'_, M>) -> R) -> R {
        let core = self.core.lock();
        f(&Snapshot {
            status: &core.status,
            context: &core.context,
        })
    }

    /// Whether the actor still processes events
    pub fn is_active(&self) -> bool {
        self.core.lock().status.is_active()
    }

    fn dispatch(&self, event: M::Event) {
        let _entered = self.span.enter();
        let mut guard = self.core.lock();
        let core = &mut *guard;
        core.effect = None;
        if !core.status.is_active() {
            trace!(?event, "Dropping event for inactive actor");
            return;
        }
        let step = self.machine.transition(&mut core.context, event);
        self.run(core, step);
    }

    fn run(&self, core: &mut ActorCore<M>, mut step: Result<Step<M>, MachineFault>) {
        loop {
            match step {
                Ok(Step::Raise(event)) => core.queue.push_back(event),
                Ok(Step::Invoke(effect)) => {
                    if let Err(fault) = self.spawn_effect(core, effect) {
                        core.status = ActorStatus::Fault(fault);
                    }
                }
                Ok(Step::Done(result)) => core.status = ActorStatus::Done(result),
                Err(fault) => {
                    warn!(%fault, state = ?core.context.state, "State machine fault");
                    core.status = ActorStatus::Fault(fault);
                }
            }

            if !core.status.is_active() {
                core.queue.clear();
                core.abort_effect();
                debug!("Actor finished");
                break;
            }
            let Some(event) = core.queue.pop_front() else {
                break;
            };
            step = self.machine.transition(&mut core.context, event);
        }
        // raised events settle before observers see the result
        core.notify();
    }

    fn spawn_effect(
        &self,
        core: &mut ActorCore<M>,
        effect: BoxFuture<'static, M::Event>,
    ) -> Result<(), MachineFault> {
        let runtime = Handle::try_current().map_err(|_| MachineFault::NoRuntime)?;
        let (handle, registration) = AbortHandle::new_pair();
        // leaving the invoking state cancels its effect
        if let Some(previous) = core.effect.replace(handle) {
            previous.abort();
        }

        let actor = self.clone();
        let effect = Abortable::new(effect, registration);
        runtime.spawn(
            async move {
                if let Ok(event) = effect.await {
                    actor.dispatch(event);
                }
            }
            .instrument(self.span.clone()),
        );
        Ok(())
    }
}
