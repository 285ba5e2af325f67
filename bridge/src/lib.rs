// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The host-facing half of the bridge.
//!
//! A host registers actor code under content identifiers in a [`Registry`], hands it to a
//! [`Dispatcher`] together with a [`Channel`] back to itself, and then invokes methods by
//! `(code, method)`. Every invocation yields an [`InvokeResponse`], whatever happens inside the
//! actor.
//!
//! For hosts living on the other side of a C ABI, [`export_bridge!`] generates the entry points.

pub use actor_bridge_runtime::{sys, Channel, ExitCode, Policy};

pub use self::config::{decode_policy, encode_policy, ConfigError};
pub use self::dispatcher::{Dispatcher, EXIT_UNEXPECTED};
pub use self::registry::{Registry, RegistryError};
pub use self::wire::{InvokeRequest, InvokeResponse};

mod config;
mod dispatcher;
pub mod ffi;
mod registry;
mod wire;
