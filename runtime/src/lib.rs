// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The actor side of the bridge: everything an actor method sees while it runs.
//!
//! A host invokes an actor through the dispatcher in the `actor_bridge` crate. For the length of
//! that invocation, the actor is handed a [`BridgeRuntime`], which turns each capability (state,
//! sends, randomness, proof verification, ...) into a single round trip over a [`Channel`].

pub use actor_bridge_shared::error::ExitCode;

pub use self::actor_error::*;
pub use self::channel::{Channel, ChannelError, HostCall, Response};
pub use self::generation::Generation;
pub use self::policy::Policy;
pub use self::runtime::*;

mod actor_error;
pub mod channel;
pub mod generation;
pub mod policy;
pub mod runtime;
pub mod sys;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
