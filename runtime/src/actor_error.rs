// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use actor_bridge_shared::error::ExitCode;
use thiserror::Error;

/// The error type returned by actor method calls and by every runtime capability.
///
/// It doubles as the bridge's abort: an explicit abort from actor code, a non-success exit code
/// reported by the host, and a contract violation detected by the bridge all travel up the stack
/// as this value until the dispatcher turns it into the invocation's exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ActorError(exit_code: {exit_code}, msg: {msg})")]
pub struct ActorError {
    /// The exit code for this invocation, must not be `0`.
    exit_code: ExitCode,
    /// Message for debugging purposes,
    msg: String,
}

impl ActorError {
    pub fn new(exit_code: ExitCode, msg: String) -> Self {
        Self { exit_code, msg }
    }

    /// Returns the exit code of the error.
    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// Returns true when the exit code is `Ok`.
    pub fn is_ok(&self) -> bool {
        self.exit_code == ExitCode::OK
    }

    /// Error message of the actor error.
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Prefix error message with a string message.
    pub fn wrap(mut self, msg: impl AsRef<str>) -> Self {
        self.msg = format!("{}: {}", msg.as_ref(), self.msg);
        self
    }

    /// Recovers the abort carried by a failed syscall. A host-reported failure comes back
    /// unchanged; any other failure (the oracle said no) becomes `code`.
    pub fn from_syscall(err: anyhow::Error, code: ExitCode) -> Self {
        match err.downcast::<ActorError>() {
            Ok(abort) => abort,
            Err(other) => ActorError::new(code, format!("{:#}", other)),
        }
    }

    // Constructors for the builtin actors' calling convention.

    pub fn illegal_argument(msg: String) -> Self {
        Self::new(ExitCode::USR_ILLEGAL_ARGUMENT, msg)
    }
    pub fn not_found(msg: String) -> Self {
        Self::new(ExitCode::USR_NOT_FOUND, msg)
    }
    pub fn forbidden(msg: String) -> Self {
        Self::new(ExitCode::USR_FORBIDDEN, msg)
    }
    pub fn insufficient_funds(msg: String) -> Self {
        Self::new(ExitCode::USR_INSUFFICIENT_FUNDS, msg)
    }
    pub fn illegal_state(msg: String) -> Self {
        Self::new(ExitCode::USR_ILLEGAL_STATE, msg)
    }
    pub fn serialization(msg: String) -> Self {
        Self::new(ExitCode::USR_SERIALIZATION, msg)
    }
    pub fn assertion_failed(msg: String) -> Self {
        Self::new(ExitCode::USR_ASSERTION_FAILED, msg)
    }

    // Aborts raised by the runtime itself.

    pub fn sys_forbidden(msg: String) -> Self {
        Self::new(ExitCode::SYS_FORBIDDEN, msg)
    }
    pub fn sys_illegal_actor(msg: String) -> Self {
        Self::new(ExitCode::SYS_ILLEGAL_ACTOR, msg)
    }
    pub fn sys_illegal_argument(msg: String) -> Self {
        Self::new(ExitCode::SYS_ILLEGAL_ARGUMENT, msg)
    }
    pub fn fatal(msg: String) -> Self {
        Self::new(ExitCode::FATAL, msg)
    }
}

impl From<actor_bridge_encoding::Error> for ActorError {
    fn from(e: actor_bridge_encoding::Error) -> Self {
        Self {
            exit_code: ExitCode::USR_SERIALIZATION,
            msg: e.to_string(),
        }
    }
}

/// Performs conversions from a bare exit code, as reported by the host, to ActorErrors.
impl From<ExitCode> for ActorError {
    fn from(e: ExitCode) -> Self {
        ActorError {
            exit_code: e,
            msg: "".to_string(),
        }
    }
}

/// Returned (inside an `anyhow::Error`) by syscalls whose host oracle rejected the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("verification failed: {0}")]
pub struct VerificationFailed(pub &'static str);

/// Convenience macro for generating Actor Errors
#[macro_export]
macro_rules! actor_error {
    // Error with only one stringable expression
    ( $code:ident; $msg:expr ) => { $crate::ActorError::$code($msg.to_string()) };

    // String with positional arguments
    ( $code:ident; $msg:literal $(, $ex:expr)+ ) => {
        $crate::ActorError::$code(format!($msg, $($ex,)*))
    };

    // Error with only one stringable expression, with comma separator
    ( $code:ident, $msg:expr ) => { $crate::actor_error!($code; $msg) };

    // String with positional arguments, with comma separator
    ( $code:ident, $msg:literal $(, $ex:expr)+ ) => {
        $crate::actor_error!($code; $msg $(, $ex)*)
    };
}
