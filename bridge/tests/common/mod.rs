// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
#![allow(dead_code)]

//! An in-memory host, and a small actor to exercise the bridge with.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use actor_bridge::{Dispatcher, InvokeRequest, InvokeResponse, Policy, Registry};
use actor_bridge_encoding::de::DeserializeOwned;
use actor_bridge_encoding::ser::Serialize;
use actor_bridge_encoding::tuple::*;
use actor_bridge_encoding::{
    cid_of, from_slice, to_vec, Decoder, Encoder, Error as EncodingError, RawBytes,
    EMPTY_ARR_CID,
};
use actor_bridge_runtime::channel::{ChannelError, HostCall};
use actor_bridge_runtime::{
    actor_error, ActorCode, ActorError, BridgeRuntime, Channel, Exports, InvocationContext,
    Runtime,
};
use actor_bridge_shared::address::Address;
use actor_bridge_shared::builtin::Type;
use actor_bridge_shared::codec::{DecoderExt, EncoderExt};
use actor_bridge_shared::crypto::signature::Signature;
use actor_bridge_shared::econ::TokenAmount;
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::{ActorsVersion, NetworkVersion};
use actor_bridge_shared::{ActorID, MethodNum};
use cid::Cid;
use log::Level;

pub const CALLER: ActorID = 100;

pub fn counter_code() -> Cid {
    cid_of(b"counter")
}

/// An actor with one counter, and a method for each way an invocation can go.
pub struct Counter;

#[repr(u64)]
#[derive(Clone, Copy, Debug)]
pub enum Method {
    Constructor = 1,
    Increment = 2,
    Get = 3,
    SendInTransaction = 4,
    Forward = 5,
    MutateThenAbort = 6,
    SkipValidation = 7,
    ValidateTwice = 8,
    Panic = 9,
    AbortOk = 10,
    BurnGas = 11,
    CheckSignature = 12,
    CreateSingleton = 13,
    Log = 14,
    TransactBeforeValidation = 15,
    CreateBeforeValidation = 16,
}

#[derive(Serialize_tuple, Deserialize_tuple, Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub count: i64,
}

/// Passes the increment through each actor in `hops`; the last one applies it.
#[derive(Serialize_tuple, Deserialize_tuple, Debug, Clone, PartialEq, Eq)]
pub struct ForwardParams {
    pub hops: Vec<ActorID>,
    pub by: i64,
}

#[derive(Serialize_tuple, Deserialize_tuple, Debug, Clone, PartialEq, Eq)]
pub struct SignatureParams {
    pub signer: ActorID,
    #[serde(with = "actor_bridge_encoding::serde_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "actor_bridge_encoding::serde_bytes")]
    pub data: Vec<u8>,
}

impl Counter {
    fn constructor<RT: Runtime>(rt: &mut RT, initial: i64) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.create(&State { count: initial })
    }

    fn increment<RT: Runtime>(rt: &mut RT, by: i64) -> Result<i64, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.transaction(|st: &mut State, _| {
            st.count += by;
            Ok(st.count)
        })
    }

    fn get<RT: Runtime>(rt: &mut RT) -> Result<i64, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        Ok(rt.state::<State>()?.count)
    }

    fn send_in_transaction<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let me = rt.message().receiver();
        rt.transaction(|st: &mut State, rt| {
            st.count += 1;
            rt.send(
                &me,
                Method::Get as MethodNum,
                RawBytes::default(),
                TokenAmount::from_atto(0),
            )?;
            Ok(())
        })
    }

    fn forward<RT: Runtime>(rt: &mut RT, params: ForwardParams) -> Result<i64, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let (next, rest) = match params.hops.split_first() {
            Some((next, rest)) => (*next, rest.to_vec()),
            None => {
                return rt.transaction(|st: &mut State, _| {
                    st.count += params.by;
                    Ok(st.count)
                })
            }
        };
        let inner = to_vec(&ForwardParams {
            hops: rest,
            by: params.by,
        })?;
        let ret = rt.send(
            &Address::new_id(next),
            Method::Forward as MethodNum,
            RawBytes::new(inner),
            TokenAmount::from_atto(0),
        )?;
        Ok(from_slice(&ret)?)
    }

    fn mutate_then_abort<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.transaction(|st: &mut State, _| {
            st.count += 100;
            Err(actor_error!(illegal_state; "changed my mind"))
        })
    }

    fn skip_validation<RT: Runtime>(_: &mut RT) -> Result<(), ActorError> {
        Ok(())
    }

    fn validate_twice<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.validate_immediate_caller_accept_any()
    }

    fn panic<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        panic!("counter exploded")
    }

    fn abort_ok<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        Err(ActorError::new(ExitCode::OK, "all is well".to_string()))
    }

    fn burn_gas<RT: Runtime>(rt: &mut RT, amount: i64) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.charge_gas("burn", amount)
    }

    fn check_signature<RT: Runtime>(rt: &mut RT, params: SignatureParams) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.verify_signature(
            &Signature::new_secp256k1(params.signature),
            &Address::new_id(params.signer),
            &params.data,
        )
        .map_err(|e| ActorError::from_syscall(e, ExitCode::USR_ILLEGAL_ARGUMENT))
    }

    fn create_singleton<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        let code = Type::Power.code_id(rt.actors_version());
        rt.create_actor(code, &Address::new_id(4))
    }

    fn log<RT: Runtime>(rt: &mut RT, msg: String) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.log(Level::Debug, &msg);
        rt.log(Level::Info, &msg);
        Ok(())
    }

    fn transact_before_validation<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.transaction(|st: &mut State, _| {
            st.count += 1;
            Ok(())
        })?;
        rt.validate_immediate_caller_accept_any()
    }

    fn create_before_validation<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.create(&State { count: 7 })?;
        rt.validate_immediate_caller_accept_any()
    }
}

impl ActorCode for Counter {
    fn exports<RT: Runtime + 'static>() -> Exports<RT> {
        Exports::new()
            .nothing()
            .method(Self::constructor)
            .method(Self::increment)
            .method0(Self::get)
            .method0(Self::send_in_transaction)
            .method(Self::forward)
            .method0(Self::mutate_then_abort)
            .method0(Self::skip_validation)
            .method0(Self::validate_twice)
            .method0(Self::panic)
            .method0(Self::abort_ok)
            .method(Self::burn_gas)
            .method(Self::check_signature)
            .method0(Self::create_singleton)
            .method(Self::log)
            .method0(Self::transact_before_validation)
            .method0(Self::create_before_validation)
    }
}

pub fn record_code() -> Cid {
    cid_of(b"record")
}

/// An actor with nothing but a constructor at method 0 and a getter at method 1.
pub struct RecordActor;

#[derive(Serialize_tuple, Deserialize_tuple, Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub entries: Vec<String>,
}

impl RecordActor {
    fn construct<RT: Runtime>(rt: &mut RT) -> Result<(), ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.create(&Record::default())
    }

    fn get<RT: Runtime>(rt: &mut RT) -> Result<Record, ActorError> {
        rt.validate_immediate_caller_accept_any()?;
        rt.state()
    }
}

impl ActorCode for RecordActor {
    fn exports<RT: Runtime + 'static>() -> Exports<RT> {
        Exports::new()
            .method0(Self::construct)
            .method0(Self::get)
    }
}

/// The counter under its own code id, and under the multisig code ids of two generations.
pub fn counter_registry() -> Registry<BridgeRuntime<TestHost>> {
    let mut registry = Registry::new();
    registry.register::<Counter>(counter_code()).unwrap();
    registry
        .register_builtin::<Counter>(Type::Multisig, &[ActorsVersion::V2, ActorsVersion::V5])
        .unwrap();
    registry
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub code: Cid,
    pub state: Option<Vec<u8>>,
}

impl Actor {
    fn head(&self) -> Cid {
        match &self.state {
            Some(state) => cid_of(state),
            None => *EMPTY_ARR_CID,
        }
    }
}

pub struct World {
    pub network_version: NetworkVersion,
    pub actors: BTreeMap<ActorID, Actor>,
    pub blocks: HashMap<Cid, Vec<u8>>,
    /// Receiver of each invocation in flight.
    pub frames: HashMap<u64, ActorID>,
    pub calls: Vec<HostCall>,
    pub commits: usize,
    pub logs: Vec<(u64, String)>,
    pub gas_used: i64,
    pub gas_limit: i64,
    pub signatures_valid: bool,
    pub invocations: u64,
}

impl Default for World {
    fn default() -> Self {
        World {
            network_version: NetworkVersion::V13,
            actors: BTreeMap::new(),
            blocks: HashMap::new(),
            frames: HashMap::new(),
            calls: Vec::new(),
            commits: 0,
            logs: Vec::new(),
            gas_used: 0,
            gas_limit: i64::MAX,
            signatures_valid: true,
            invocations: 0,
        }
    }
}

struct Inner {
    world: RefCell<World>,
    dispatcher: RefCell<Weak<Dispatcher<TestHost>>>,
}

/// A host keeping actors and blocks in memory. Sends are dispatched back into the bridge, and
/// the actors of a failed invocation are rolled back.
#[derive(Clone)]
pub struct TestHost {
    inner: Rc<Inner>,
}

impl TestHost {
    pub fn world(&self) -> Ref<'_, World> {
        self.inner.world.borrow()
    }

    pub fn world_mut(&self) -> RefMut<'_, World> {
        self.inner.world.borrow_mut()
    }

    pub fn add_actor(&self, id: ActorID, code: Cid) {
        self.world_mut()
            .actors
            .insert(id, Actor { code, state: None });
    }

    /// The decoded state of `id`.
    pub fn state<S: DeserializeOwned>(&self, id: ActorID) -> Option<S> {
        let world = self.world();
        let state = world.actors.get(&id)?.state.as_ref()?;
        Some(from_slice(state).unwrap())
    }

    pub fn calls_to(&self, call: HostCall) -> usize {
        self.world().calls.iter().filter(|c| **c == call).count()
    }

    /// Runs `method` of `to` on behalf of `from`, through the encoded invoke entry point.
    pub fn invoke(
        &self,
        from: ActorID,
        to: ActorID,
        method: MethodNum,
        params: Vec<u8>,
    ) -> InvokeResponse {
        let (id, code, network_version, snapshot) = {
            let mut world = self.world_mut();
            let code = match world.actors.get(&to) {
                Some(actor) => actor.code,
                None => {
                    return InvokeResponse::abort(ExitCode::SYS_INVALID_RECEIVER, "no such actor")
                }
            };
            world.invocations += 1;
            let id = world.invocations;
            world.frames.insert(id, to);
            (id, code, world.network_version, world.actors.clone())
        };

        let request = InvokeRequest {
            context: InvocationContext {
                id,
                network_version,
                base_fee: TokenAmount::from_atto(100),
                caller: Address::new_id(from),
                receiver: Address::new_id(to),
                epoch: 10,
                value: TokenAmount::from_atto(0),
            },
            code,
            method,
            params: RawBytes::new(params),
        };
        let dispatcher = self
            .inner
            .dispatcher
            .borrow()
            .upgrade()
            .expect("dispatcher dropped");
        let response = InvokeResponse::decode(&dispatcher.invoke_raw(&request.encode()))
            .expect("malformed invoke response");

        let mut world = self.world_mut();
        world.frames.remove(&id);
        if !response.exit_code.is_success() {
            world.actors = snapshot;
        }
        response
    }

    fn handle(&self, call: HostCall, mut dec: Decoder<'_>) -> Result<Vec<u8>, EncodingError> {
        let id = dec.uint()?;
        let me = match self.world().frames.get(&id).copied() {
            Some(me) => me,
            None => return Ok(fail(ExitCode::SYS_FORBIDDEN)),
        };
        let mut resp = ok();
        match call {
            HostCall::StateGet => {
                let want_cid = dec.bool()?;
                let world = self.world();
                let actor = &world.actors[&me];
                match &actor.state {
                    Some(state) => {
                        resp.bool(true).bytes(state);
                        if want_cid {
                            resp.cid(&actor.head());
                        }
                    }
                    None => {
                        resp.bool(false);
                    }
                }
            }
            HostCall::StateCommit => {
                let state = dec.bytes()?.to_vec();
                let base = dec.cid()?;
                let mut world = self.world_mut();
                let actor = world.actors.get_mut(&me).expect("receiver exists");
                if actor.head() != base {
                    return Ok(fail(ExitCode::SYS_ILLEGAL_ARGUMENT));
                }
                actor.state = Some(state);
                world.commits += 1;
            }
            HostCall::Send => {
                let to = dec.addr()?;
                let method = dec.uint()?;
                let params = dec.bytes()?.to_vec();
                let _value = dec.token()?;
                let to = to.id().unwrap_or(ActorID::MAX);
                let response = self.invoke(me, to, method, params);
                resp.exit_code(response.exit_code);
                if response.exit_code.is_success() {
                    resp.bytes(&response.payload);
                } else {
                    resp.bytes(&[]);
                }
            }
            HostCall::GetActorCodeCid => {
                let addr = dec.addr()?;
                let world = self.world();
                match addr.id().ok().and_then(|id| world.actors.get(&id)) {
                    Some(actor) => {
                        resp.bool(true).cid(&actor.code);
                    }
                    None => {
                        resp.bool(false);
                    }
                }
            }
            HostCall::ChargeGas => {
                let compute = dec.int()?;
                let mut world = self.world_mut();
                world.gas_used += compute;
                if world.gas_used > world.gas_limit {
                    return Ok(fail(ExitCode::SYS_OUT_OF_GAS));
                }
            }
            HostCall::Log => {
                let level = dec.uint()?;
                let msg = dec.text()?.to_string();
                self.world_mut().logs.push((level, msg));
            }
            HostCall::VerifySignature => {
                dec.signature()?;
                dec.addr()?;
                dec.bytes()?;
                resp.bool(self.world().signatures_valid);
            }
            HostCall::StorePut => {
                let block = dec.bytes()?.to_vec();
                let cid = cid_of(&block);
                self.world_mut().blocks.insert(cid, block);
                resp.cid(&cid);
            }
            HostCall::StoreGet => {
                let cid = dec.cid()?;
                match self.world().blocks.get(&cid) {
                    Some(block) => {
                        resp.bool(true).bytes(block);
                    }
                    None => {
                        resp.bool(false);
                    }
                }
            }
            _ => return Ok(fail(ExitCode::SYS_FORBIDDEN)),
        }
        dec.finish()?;
        Ok(resp.into_bytes())
    }
}

impl Channel for TestHost {
    type Buffer = Vec<u8>;

    fn call(&self, call: HostCall, request: &[u8]) -> Result<Vec<u8>, ChannelError> {
        self.world_mut().calls.push(call);
        self.handle(call, Decoder::new(request))
            .map_err(|e| ChannelError::Host(call, e.to_string()))
    }
}

fn ok() -> Encoder {
    let mut enc = Encoder::new();
    enc.exit_code(ExitCode::OK);
    enc
}

fn fail(code: ExitCode) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.exit_code(code);
    enc.into_bytes()
}

/// A host wired to a dispatcher over `registry`.
pub struct Harness {
    pub host: TestHost,
    pub dispatcher: Rc<Dispatcher<TestHost>>,
}

impl Harness {
    pub fn new(registry: Registry<BridgeRuntime<TestHost>>) -> Self {
        Self::with_policy(registry, Policy::default())
    }

    pub fn with_policy(registry: Registry<BridgeRuntime<TestHost>>, policy: Policy) -> Self {
        let host = TestHost {
            inner: Rc::new(Inner {
                world: RefCell::new(World::default()),
                dispatcher: RefCell::new(Weak::new()),
            }),
        };
        let dispatcher = Rc::new(Dispatcher::new(registry, host.clone()).with_policy(policy));
        *host.inner.dispatcher.borrow_mut() = Rc::downgrade(&dispatcher);
        Harness { host, dispatcher }
    }

    /// Adds a counter actor under `code` and runs its constructor.
    pub fn counter(&self, id: ActorID, code: Cid, initial: i64) {
        self.host.add_actor(id, code);
        let resp = self.call(id, Method::Constructor, &initial);
        assert_eq!(resp.exit_code, ExitCode::OK, "{:?}", resp.message());
    }

    pub fn call<P: Serialize>(&self, to: ActorID, method: Method, params: &P) -> InvokeResponse {
        self.host
            .invoke(CALLER, to, method as MethodNum, to_vec(params).unwrap())
    }

    pub fn call0(&self, to: ActorID, method: Method) -> InvokeResponse {
        self.host.invoke(CALLER, to, method as MethodNum, Vec::new())
    }

    pub fn count(&self, id: ActorID) -> i64 {
        self.host.state::<State>(id).expect("no state").count
    }
}

/// Decodes the return value of a successful invocation.
pub fn ret<T: DeserializeOwned>(resp: &InvokeResponse) -> T {
    assert_eq!(resp.exit_code, ExitCode::OK, "{:?}", resp.message());
    from_slice(&resp.payload).unwrap()
}
