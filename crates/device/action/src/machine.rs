//! State machine contract of a device action
//!
//! A machine is a tagged-union `State` plus a transition function. It reacts
//! to its own events and to the results of effects it asks the actor to run,
//! and eventually settles on an output or a domain error.

use std::fmt;

use futures::future::BoxFuture;

use crate::MachineFault;

/// Per-execution data of a running machine
///
/// The input is fixed for the whole run. The other slots are owned by the
/// machine and only change inside its transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext<Input, State, IntermediateValue, InternalState> {
    /// Input the action was executed with
    pub input: Input,
    /// Current machine state
    pub state: State,
    /// Public progress value, published with every pending state
    pub intermediate_value: IntermediateValue,
    /// Private working data
    pub internal_state: InternalState,
}

/// Context type of machine `M`
pub type Context<M> = ActionContext<
    <M as StateMachine>::Input,
    <M as StateMachine>::State,
    <M as StateMachine>::IntermediateValue,
    <M as StateMachine>::InternalState,
>;

/// What the actor does after a transition
pub enum Step<M: StateMachine> {
    /// Queue an event, processed right after the current one
    Raise(M::Event),
    /// Run a future and feed its result back as the next event
    Invoke(BoxFuture<'static, M::Event>),
    /// Finish with an output or a domain error
    Done(Result<M::Output, M::Error>),
}

impl<M: StateMachine> fmt::Debug for Step<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raise(event) => f.debug_tuple("Raise").field(event).finish(),
            Self::Invoke(_) => f.write_str("Invoke(..)"),
            Self::Done(result) => f.debug_tuple("Done").field(result).finish(),
        }
    }
}

/// A device action state machine
pub trait StateMachine: Sized + Send + Sync + 'static {
    /// Input the action is executed with
    type Input: Clone + fmt::Debug + Send + Sync + 'static;
    /// Successful result
    type Output: Clone + fmt::Debug + Send + Sync + 'static;
    /// Domain error
    type Error: Clone + fmt::Debug + Send + Sync + 'static;
    /// Public progress value
    type IntermediateValue: Clone + fmt::Debug + Send + Sync + 'static;
    /// Private working data
    type InternalState: fmt::Debug + Send + Sync + 'static;
    /// Tagged-union state
    type State: fmt::Debug + Send + Sync + 'static;
    /// Events driving transitions
    type Event: fmt::Debug + Send + 'static;

    /// Identifier used to tag log output
    fn id(&self) -> &'static str;

    /// Build the starting context from the input
    fn initial_context(&self, input: Self::Input) -> Context<Self>;

    /// Entry step of the initial state
    fn start(&self, context: &mut Context<Self>) -> Result<Step<Self>, MachineFault>;

    /// Handle one event
    fn transition(
        &self,
        context: &mut Context<Self>,
        event: Self::Event,
    ) -> Result<Step<Self>, MachineFault>;

    /// Release resources when stopped before finishing. Called at most once.
    fn on_stop(&self, _context: &Context<Self>) {}
}
