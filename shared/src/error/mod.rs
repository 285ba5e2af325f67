// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use serde::{Deserialize, Serialize};

/// ExitCode defines the exit code from the VM invocation.
///
/// Codes `1..=15` are reserved for the system, `16..` are available to actors. Negative codes
/// never come from actor code: [`ExitCode::FATAL`] marks a violation of the contract between the
/// bridge and its host.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitCode {
    value: i32,
}

impl ExitCode {
    pub const fn new(value: i32) -> Self {
        Self { value }
    }

    pub fn value(self) -> i32 {
        self.value
    }

    /// Returns true if the exit code was a success
    pub fn is_success(self) -> bool {
        self.value == 0
    }

    /// Returns true if the error code is in the range of exit codes reserved for the VM
    /// (including Ok).
    pub fn is_system_error(self) -> bool {
        (0..Self::FIRST_USER_EXIT_CODE).contains(&self.value)
    }

    /// Returns true if the exit code marks a bridge contract violation.
    pub fn is_fatal(self) -> bool {
        self == Self::FATAL
    }
}

impl From<i32> for ExitCode {
    fn from(value: i32) -> Self {
        ExitCode { value }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl ExitCode {
    // Exit codes which originate inside the VM.
    // These values may not be used by actors when aborting.

    /// The code indicating successful execution.
    pub const OK: ExitCode = ExitCode::new(0);
    /// The message sender doesn't exist.
    pub const SYS_SENDER_INVALID: ExitCode = ExitCode::new(1);
    /// The message sender was not in a valid state to send this message.
    pub const SYS_SENDER_STATE_INVALID: ExitCode = ExitCode::new(2);
    /// The method number does not exist on the receiving actor.
    pub const SYS_INVALID_METHOD: ExitCode = ExitCode::new(3);
    /// Reserved; used for catching panics in earlier versions of the system.
    pub const SYS_ACTOR_PANIC: ExitCode = ExitCode::new(4);
    /// The message receiver doesn't exist and can't be automatically created
    pub const SYS_INVALID_RECEIVER: ExitCode = ExitCode::new(5);
    /// The message sender didn't have the requisite funds.
    pub const SYS_INSUFFICIENT_FUNDS: ExitCode = ExitCode::new(6);
    /// Message execution (including subcalls) used more gas than the specified limit.
    pub const SYS_OUT_OF_GAS: ExitCode = ExitCode::new(7);
    /// The caller is not permitted to invoke this method.
    pub const SYS_FORBIDDEN: ExitCode = ExitCode::new(8);
    /// Actor code performed a disallowed operation: mutating state outside a transaction,
    /// sending from inside one, skipping or repeating caller validation.
    pub const SYS_ILLEGAL_ACTOR: ExitCode = ExitCode::new(9);
    /// An invalid argument was passed to a runtime method.
    pub const SYS_ILLEGAL_ARGUMENT: ExitCode = ExitCode::new(10);

    /// The lowest exit code that an actor may abort with.
    pub const FIRST_USER_EXIT_CODE: i32 = 16;

    // Standard exit codes according to the built-in actors' calling convention.
    /// The method parameters are invalid.
    pub const USR_ILLEGAL_ARGUMENT: ExitCode = ExitCode::new(16);
    /// The requested resource does not exist.
    pub const USR_NOT_FOUND: ExitCode = ExitCode::new(17);
    /// The requested operation is forbidden.
    pub const USR_FORBIDDEN: ExitCode = ExitCode::new(18);
    /// The actor has insufficient funds to perform the requested operation.
    pub const USR_INSUFFICIENT_FUNDS: ExitCode = ExitCode::new(19);
    /// The actor's internal state is invalid.
    pub const USR_ILLEGAL_STATE: ExitCode = ExitCode::new(20);
    /// There was a de/serialization failure within actor code.
    pub const USR_SERIALIZATION: ExitCode = ExitCode::new(21);
    /// An internal assertion failed.
    pub const USR_ASSERTION_FAILED: ExitCode = ExitCode::new(22);

    /// A violation of the bridge contract: the host answered with something the bridge cannot
    /// interpret, or the bridge reached a state it should never reach.
    pub const FATAL: ExitCode = ExitCode::new(-1);
}
