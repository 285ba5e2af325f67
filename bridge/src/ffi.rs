// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process-wide bridge state behind the C entry points.
//!
//! The host initializes the bridge with its channel, may configure the policy any number of
//! times, and then invokes. The first invocation freezes the dispatcher: from then on it is
//! shared by every invoking thread without locking, and configuration is refused.

use std::slice;
use std::sync::{Mutex, MutexGuard, PoisonError};

use actor_bridge_encoding::Encoder;
use actor_bridge_runtime::{Channel, Policy};
use actor_bridge_shared::codec::EncoderExt;
use actor_bridge_shared::error::ExitCode;
use log::{error, info};
use once_cell::sync::OnceCell;

use crate::{decode_policy, ConfigError, Dispatcher, InvokeResponse};

pub struct Bridge<C> {
    setup: Mutex<Option<Dispatcher<C>>>,
    live: OnceCell<Dispatcher<C>>,
}

impl<C> Default for Bridge<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Bridge<C> {
    pub const fn new() -> Self {
        Bridge {
            setup: Mutex::new(None),
            live: OnceCell::new(),
        }
    }

    fn setup(&self) -> MutexGuard<'_, Option<Dispatcher<C>>> {
        self.setup.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Bridge<C>
where
    C: Channel + Clone + 'static,
{
    /// Installs the dispatcher. May be repeated until the first invocation.
    pub fn install(&self, dispatcher: Dispatcher<C>) -> Result<(), ConfigError> {
        let mut setup = self.setup();
        if self.live.get().is_some() {
            return Err(ConfigError::Frozen);
        }
        info!(
            "actor bridge initialized with {} actor codes",
            dispatcher.registry().len()
        );
        *setup = Some(dispatcher);
        Ok(())
    }

    pub fn configure(&self, policy: Policy) -> Result<(), ConfigError> {
        let mut setup = self.setup();
        if self.live.get().is_some() {
            return Err(ConfigError::Frozen);
        }
        match setup.as_mut() {
            Some(dispatcher) => {
                dispatcher.configure(policy);
                Ok(())
            }
            None => Err(ConfigError::NotInitialized),
        }
    }

    /// The frozen dispatcher, freezing it on first use.
    pub fn dispatcher(&self) -> Result<&Dispatcher<C>, ConfigError> {
        self.live
            .get_or_try_init(|| self.setup().take().ok_or(ConfigError::NotInitialized))
    }

    /// Handles a configuration request, answering `[exit code, message?]`.
    pub fn config_raw(&self, request: &[u8]) -> Vec<u8> {
        let result = decode_policy(request).and_then(|policy| self.configure(policy));
        let mut enc = Encoder::new();
        match result {
            Ok(()) => {
                enc.exit_code(ExitCode::OK);
            }
            Err(e) => {
                let code = match e {
                    ConfigError::Frozen | ConfigError::NotInitialized => ExitCode::FATAL,
                    _ => ExitCode::SYS_ILLEGAL_ARGUMENT,
                };
                error!("configuration rejected: {}", e);
                enc.exit_code(code).text(&e.to_string());
            }
        }
        enc.into_bytes()
    }

    /// Handles an invoke request, answering an encoded [`InvokeResponse`].
    pub fn invoke_raw(&self, request: &[u8]) -> Vec<u8> {
        match self.dispatcher() {
            Ok(dispatcher) => dispatcher.invoke_raw(request),
            Err(e) => {
                error!("invoke before initialization: {}", e);
                InvokeResponse::abort(ExitCode::FATAL, &e.to_string()).encode()
            }
        }
    }
}

/// Borrows a request passed across the C ABI. A null pointer reads as empty.
///
/// # Safety
///
/// A non-null `data` must point to `len` readable bytes that outlive `'a`.
pub unsafe fn borrow_request<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() {
        &[]
    } else {
        slice::from_raw_parts(data, len)
    }
}

/// Generates the C entry points of a bridge serving the actors of `$registry`, an expression
/// evaluated once, at initialization:
///
/// - `actor_bridge_init(call_fn, release_fn) -> i32`: installs the host channel, returning `0`
///   or the fatal exit code once invocations have begun;
/// - `actor_bridge_config(data, len) -> Raw`: replaces the policy;
/// - `actor_bridge_invoke(data, len) -> Raw`: runs one invocation;
/// - `actor_bridge_release(buf)`: frees a buffer returned by the two functions above.
#[macro_export]
macro_rules! export_bridge {
    ($registry:expr) => {
        static BRIDGE: $crate::ffi::Bridge<$crate::sys::FfiChannel> = $crate::ffi::Bridge::new();

        /// # Safety
        ///
        /// `call_fn` and `release_fn` must follow the ownership rules of the channel ABI.
        #[no_mangle]
        pub unsafe extern "C" fn actor_bridge_init(
            call_fn: $crate::sys::CallFn,
            release_fn: $crate::sys::ReleaseFn,
        ) -> i32 {
            let channel = $crate::sys::FfiChannel::new(call_fn, release_fn);
            match BRIDGE.install($crate::Dispatcher::new($registry, channel)) {
                Ok(()) => 0,
                Err(_) => $crate::ExitCode::FATAL.value(),
            }
        }

        /// # Safety
        ///
        /// `data` must point to `len` readable bytes, or be null.
        #[no_mangle]
        pub unsafe extern "C" fn actor_bridge_config(
            data: *const u8,
            len: usize,
        ) -> $crate::sys::Raw {
            let request = $crate::ffi::borrow_request(data, len);
            $crate::sys::Raw::from_vec(BRIDGE.config_raw(request))
        }

        /// # Safety
        ///
        /// `data` must point to `len` readable bytes, or be null.
        #[no_mangle]
        pub unsafe extern "C" fn actor_bridge_invoke(
            data: *const u8,
            len: usize,
        ) -> $crate::sys::Raw {
            let request = $crate::ffi::borrow_request(data, len);
            $crate::sys::Raw::from_vec(BRIDGE.invoke_raw(request))
        }

        /// # Safety
        ///
        /// `buf` must have been returned by this bridge and not released before.
        #[no_mangle]
        pub unsafe extern "C" fn actor_bridge_release(buf: $crate::sys::Raw) {
            drop(buf.into_vec());
        }
    };
}
