//! Observable, cancellable device actions
//!
//! A device action is a multi-step conversation with a hardware device,
//! expressed as a [`StateMachine`]. Executing it yields a stream of
//! [`DeviceActionState`]s shared by every subscriber, and a way to cancel the
//! run.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use futures::{StreamExt, executor::block_on};
//! use nexum_apdu_core::{Apdu, ApduResponse};
//! use nexum_apdu_framing::SessionError;
//! use nexum_device_action::prelude::*;
//!
//! #[derive(Debug)]
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl InternalApi for Offline {
//!     async fn send_command(&self, _apdu: Apdu) -> Result<ApduResponse, SessionError> {
//!         Err(nexum_apdu_framing::TransportError::Closed.into())
//!     }
//! }
//!
//! /// Finishes immediately with its input
//! #[derive(Debug)]
//! struct Echo;
//!
//! impl StateMachine for Echo {
//!     type Input = u8;
//!     type Output = u8;
//!     type Error = ();
//!     type IntermediateValue = ();
//!     type InternalState = ();
//!     type State = ();
//!     type Event = ();
//!
//!     fn id(&self) -> &'static str {
//!         "echo"
//!     }
//!
//!     fn initial_context(&self, input: u8) -> Context<Self> {
//!         ActionContext { input, state: (), intermediate_value: (), internal_state: () }
//!     }
//!
//!     fn start(&self, context: &mut Context<Self>) -> Result<Step<Self>, MachineFault> {
//!         Ok(Step::Done(Ok(context.input)))
//!     }
//!
//!     fn transition(&self, _: &mut Context<Self>, event: ()) -> Result<Step<Self>, MachineFault> {
//!         Err(MachineFault::unexpected(&event, &()))
//!     }
//! }
//!
//! struct EchoAction(u8);
//!
//! impl DeviceAction for EchoAction {
//!     type Machine = Echo;
//!
//!     fn input(&self) -> u8 {
//!         self.0
//!     }
//!
//!     fn make_state_machine(&self, _api: Arc<dyn InternalApi>) -> Echo {
//!         Echo
//!     }
//! }
//!
//! let run = EchoAction(7).execute(Arc::new(Offline));
//! let states: Vec<_> = block_on(run.subscribe().collect());
//! assert_eq!(states, vec![Ok(DeviceActionState::Completed { output: 7 })]);
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod action;
pub mod actor;
pub mod api;
pub mod error;
pub mod machine;
pub mod replay;
pub mod status;

pub use action::{ActionState, CancelHandle, DeviceAction, ExecuteDeviceAction};
pub use actor::{Actor, ActorStatus, ObserverId, Snapshot};
pub use api::{DeviceSessionApi, InternalApi};
pub use error::{CommandError, MachineFault};
pub use machine::{ActionContext, Context, StateMachine, Step};
pub use replay::{ReplaySubject, SharedStream, StateStream};
pub use status::{
    DeviceActionIntermediateValue, DeviceActionState, DeviceActionStatus, UserInteractionRequired,
};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        ActionContext, ActionState, CancelHandle, CommandError, Context, DeviceAction,
        DeviceActionIntermediateValue, DeviceActionState, DeviceActionStatus, DeviceSessionApi,
        ExecuteDeviceAction, InternalApi, MachineFault, StateMachine, StateStream, Step,
        UserInteractionRequired,
    };
}
