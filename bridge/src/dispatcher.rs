// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use actor_bridge_runtime::{ActorError, BridgeRuntime, Channel, Generation, Policy};
use actor_bridge_shared::builtin;
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::ActorsVersion;
use actor_bridge_shared::MethodNum;
use cid::Cid;
use log::{debug, error};

use crate::{InvokeRequest, InvokeResponse, Registry};

/// Exit code of an invocation that failed in a way the actor did not anticipate, such as a panic.
pub const EXIT_UNEXPECTED: ExitCode = ExitCode::new(1);

thread_local! {
    /// Where the last panic on this thread happened.
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = RefCell::new(None);
}

static PANIC_HOOK: Once = Once::new();

/// Chains a panic hook that records a backtrace for each panic, so caught panics can be logged
/// with it.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            PANIC_BACKTRACE.with(|bt| *bt.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_panic_backtrace() -> Option<Backtrace> {
    PANIC_BACKTRACE.with(|bt| bt.borrow_mut().take())
}

/// Routes invocations to registered actor code and turns whatever happens into an
/// [`InvokeResponse`].
pub struct Dispatcher<C> {
    registry: Registry<BridgeRuntime<C>>,
    policy: Arc<Policy>,
    channel: C,
}

impl<C> Dispatcher<C>
where
    C: Channel + Clone + 'static,
{
    /// A dispatcher over `registry` with the default policy. Each invocation gets a clone of
    /// `channel`.
    pub fn new(registry: Registry<BridgeRuntime<C>>, channel: C) -> Self {
        install_panic_hook();
        Dispatcher {
            registry,
            policy: Arc::new(Policy::default()),
            channel,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.configure(policy);
        self
    }

    /// Replaces the policy. Exclusive access guarantees no invocation observes the change
    /// half-way.
    pub fn configure(&mut self, policy: Policy) {
        debug!("bridge policy configured: {:?}", policy);
        self.policy = Arc::new(policy);
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn registry(&self) -> &Registry<BridgeRuntime<C>> {
        &self.registry
    }

    /// Runs one method of one actor. Never fails: routing failures, aborts, and panics all become
    /// exit codes.
    pub fn invoke(&self, request: InvokeRequest) -> InvokeResponse {
        let InvokeRequest {
            context,
            code,
            method,
            params,
        } = request;
        let id = context.id;

        let table = match self.registry.get(&code) {
            Some(table) => table,
            None => {
                debug!("invocation {}: unknown actor code {}", id, code);
                return InvokeResponse::abort(
                    ExitCode::SYS_ILLEGAL_ACTOR,
                    &format!("unknown actor code {}", code),
                );
            }
        };
        let handler = match table.get(method) {
            Some(handler) => handler,
            None => {
                debug!("invocation {}: actor {} has no method {}", id, code, method);
                return InvokeResponse::abort(
                    ExitCode::SYS_INVALID_METHOD,
                    &format!("actor {} has no method {}", code, method),
                );
            }
        };

        // Builtin code ids carry their generation; anything else follows the network.
        let version = builtin::resolve(&code)
            .map(|(_, version)| version)
            .unwrap_or_else(|| ActorsVersion::for_network(context.network_version));
        let mut rt = BridgeRuntime::new(
            context,
            self.channel.clone(),
            self.policy.clone(),
            Generation::of(version),
        );

        take_panic_backtrace();
        match panic::catch_unwind(AssertUnwindSafe(|| handler(&mut rt, &params))) {
            Ok(Ok(ret)) => InvokeResponse::ok(ret),
            Ok(Err(err)) => abort(id, &code, method, err),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                match take_panic_backtrace() {
                    Some(backtrace) => error!(
                        "invocation {}: actor {} method {} panicked: {}\n{}",
                        id, code, method, msg, backtrace
                    ),
                    None => error!(
                        "invocation {}: actor {} method {} panicked: {}",
                        id, code, method, msg
                    ),
                }
                InvokeResponse::abort(EXIT_UNEXPECTED, &format!("actor panicked: {}", msg))
            }
        }
    }

    /// Decodes a request, invokes it, and encodes the response. A request that cannot be decoded
    /// is fatal.
    pub fn invoke_raw(&self, request: &[u8]) -> Vec<u8> {
        let response = match InvokeRequest::decode(request) {
            Ok(request) => self.invoke(request),
            Err(e) => {
                error!(
                    "malformed invoke request: {}\n{}",
                    e,
                    Backtrace::force_capture()
                );
                InvokeResponse::abort(ExitCode::FATAL, &format!("malformed invoke request: {}", e))
            }
        };
        response.encode()
    }
}

fn abort(id: u64, code: &Cid, method: MethodNum, err: ActorError) -> InvokeResponse {
    if err.is_ok() {
        error!(
            "invocation {}: actor {} method {} aborted with exit code 0: {}",
            id,
            code,
            method,
            err.msg()
        );
        return InvokeResponse::abort(
            ExitCode::SYS_ILLEGAL_ACTOR,
            &format!("aborted with a success exit code: {}", err.msg()),
        );
    }
    if err.exit_code().is_fatal() {
        error!(
            "invocation {}: fatal error in actor {} method {}: {}\n{}",
            id,
            code,
            method,
            err,
            Backtrace::force_capture()
        );
    } else {
        debug!(
            "invocation {}: actor {} method {} aborted: {}",
            id, code, method, err
        );
    }
    InvokeResponse::abort(err.exit_code(), err.msg())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
