//! Progress states published by a running device action

use derive_more::Display;

/// Tag of a [`DeviceActionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DeviceActionStatus {
    /// Still running
    #[display("pending")]
    Pending,
    /// Finished with an output
    #[display("completed")]
    Completed,
    /// Finished with a domain error
    #[display("error")]
    Error,
    /// Stopped before finishing
    #[display("stopped")]
    Stopped,
}

/// A progress update of a device action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceActionState<Output, Error, IntermediateValue> {
    /// Still running, with the latest public progress value
    Pending {
        /// Progress value, e.g. which interaction the user must perform
        intermediate_value: IntermediateValue,
    },
    /// Finished successfully
    Completed {
        /// Action output
        output: Output,
    },
    /// Finished with a domain error
    Error {
        /// Action error
        error: Error,
    },
    /// Stopped by cancellation or because every observer went away
    Stopped,
}

impl<O, E, I> DeviceActionState<O, E, I> {
    /// Status tag of this state
    pub const fn status(&self) -> DeviceActionStatus {
        match self {
            Self::Pending { .. } => DeviceActionStatus::Pending,
            Self::Completed { .. } => DeviceActionStatus::Completed,
            Self::Error { .. } => DeviceActionStatus::Error,
            Self::Stopped => DeviceActionStatus::Stopped,
        }
    }

    /// Whether no further state follows this one
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

/// Interaction the user must perform on the device for the action to progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum UserInteractionRequired {
    /// Nothing expected from the user
    #[default]
    #[display("none")]
    None,
    /// Unlock the device with its PIN
    #[display("unlock-device")]
    UnlockDevice,
    /// Confirm opening an application
    #[display("confirm-open-app")]
    ConfirmOpenApp,
    /// Allow listing installed applications
    #[display("allow-list-apps")]
    AllowListApps,
    /// Allow a secure connection to the manager
    #[display("allow-secure-connection")]
    AllowSecureConnection,
    /// Review and sign a transaction
    #[display("sign-transaction")]
    SignTransaction,
    /// Review and sign typed data
    #[display("sign-typed-data")]
    SignTypedData,
    /// Review and sign a personal message
    #[display("sign-personal-message")]
    SignPersonalMessage,
    /// Verify an address on screen
    #[display("verify-address")]
    VerifyAddress,
    /// Register a wallet policy
    #[display("register-wallet")]
    RegisterWallet,
}

/// Common intermediate value carrying the required user interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceActionIntermediateValue {
    /// What the user must do on the device
    pub required_user_interaction: UserInteractionRequired,
}

impl DeviceActionIntermediateValue {
    /// Intermediate value waiting on `interaction`
    pub const fn new(interaction: UserInteractionRequired) -> Self {
        Self {
            required_user_interaction: interaction,
        }
    }
}
