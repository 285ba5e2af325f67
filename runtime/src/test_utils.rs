// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! A host stand-in that answers each call from a script, for testing the runtime one round trip
//! at a time.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use actor_bridge_encoding::Encoder;
use actor_bridge_shared::address::Address;
use actor_bridge_shared::codec::EncoderExt;
use actor_bridge_shared::econ::TokenAmount;
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::{ActorsVersion, NetworkVersion};

use crate::channel::{Channel, ChannelError, HostCall};
use crate::{BridgeRuntime, Generation, InvocationContext, Policy};

pub const TEST_INVOCATION_ID: u64 = 77;
pub const TEST_CALLER: u64 = 101;
pub const TEST_RECEIVER: u64 = 1000;
pub const TEST_BASE_FEE: u64 = 100;

#[derive(Default)]
struct Script {
    expected: VecDeque<(HostCall, Vec<u8>)>,
    calls: Vec<(HostCall, Vec<u8>)>,
}

/// Answers host calls with queued responses, in order, and records every request.
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    script: Rc<RefCell<Script>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the response to the next call, which must be `call`.
    pub fn expect(&self, call: HostCall, response: Vec<u8>) {
        self.script.borrow_mut().expected.push_back((call, response));
    }

    /// The requests received so far.
    pub fn calls(&self) -> Vec<(HostCall, Vec<u8>)> {
        self.script.borrow().calls.clone()
    }

    pub fn assert_done(&self) {
        let script = self.script.borrow();
        assert!(
            script.expected.is_empty(),
            "expected calls never made: {:?}",
            script.expected.iter().map(|(c, _)| *c).collect::<Vec<_>>()
        );
    }
}

impl Channel for ScriptedChannel {
    type Buffer = Vec<u8>;

    fn call(&self, call: HostCall, request: &[u8]) -> Result<Vec<u8>, ChannelError> {
        let mut script = self.script.borrow_mut();
        script.calls.push((call, request.to_vec()));
        match script.expected.pop_front() {
            Some((expected, response)) => {
                assert_eq!(expected, call, "unexpected host call");
                Ok(response)
            }
            None => Err(ChannelError::Host(call, "no response scripted".to_string())),
        }
    }
}

/// A response that succeeded; chain the body onto it.
pub fn ok() -> Encoder {
    let mut enc = Encoder::new();
    enc.exit_code(ExitCode::OK);
    enc
}

/// A response that failed with `code`.
pub fn fail(code: ExitCode) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.exit_code(code);
    enc.into_bytes()
}

pub fn test_context() -> InvocationContext {
    InvocationContext {
        id: TEST_INVOCATION_ID,
        network_version: NetworkVersion::V13,
        base_fee: TokenAmount::from_atto(TEST_BASE_FEE),
        caller: Address::new_id(TEST_CALLER),
        receiver: Address::new_id(TEST_RECEIVER),
        epoch: 1234,
        value: TokenAmount::from_atto(0),
    }
}

/// A runtime over `channel` with the default policy.
pub fn runtime<C: Channel + Clone>(channel: &C, version: ActorsVersion) -> BridgeRuntime<C> {
    BridgeRuntime::new(
        test_context(),
        channel.clone(),
        Arc::new(Policy::default()),
        Generation::of(version),
    )
}
