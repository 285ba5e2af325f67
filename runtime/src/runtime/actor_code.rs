// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use actor_bridge_encoding::de::DeserializeOwned;
use actor_bridge_encoding::ser::Serialize;
use actor_bridge_encoding::{from_slice, to_vec, Error as EncodingError, RawBytes};
use actor_bridge_shared::MethodNum;

use crate::{actor_error, ActorError, Generation, Runtime};

/// CBOR `null`. Empty parameters decode as this, and a return value encoding to it is returned
/// as empty bytes.
const NULL: [u8; 1] = [0xf6];

/// A uniform method handler: raw parameters in, raw return value out.
pub type Handler<RT> = Box<dyn Fn(&mut RT, &RawBytes) -> Result<RawBytes, ActorError> + Send + Sync>;

/// Interface for the method list of an actor.
pub trait ActorCode {
    /// The actor's methods in order: the method number is the index in the list. Unimplemented
    /// numbers are filled with [`Exports::nothing`].
    fn exports<RT: Runtime + 'static>() -> Exports<RT>;
}

/// Builds the method table of an actor from its typed methods.
pub struct Exports<RT> {
    methods: Vec<Option<Handler<RT>>>,
}

impl<RT: Runtime + 'static> Default for Exports<RT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RT: Runtime + 'static> Exports<RT> {
    pub fn new() -> Self {
        Exports {
            methods: Vec::new(),
        }
    }

    /// Appends a method taking decoded parameters.
    pub fn method<P, R>(mut self, f: fn(&mut RT, P) -> Result<R, ActorError>) -> Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
    {
        self.methods.push(Some(Box::new(move |rt: &mut RT, params: &RawBytes| {
            let params = rt.deserialize_params(params)?;
            let ret = f(rt, params)?;
            complete(rt, &ret)
        })));
        self
    }

    /// Appends a method that ignores its parameters, whatever they are.
    pub fn method0<R>(mut self, f: fn(&mut RT) -> Result<R, ActorError>) -> Self
    where
        R: Serialize + 'static,
    {
        self.methods.push(Some(Box::new(move |rt: &mut RT, _: &RawBytes| {
            let ret = f(rt)?;
            complete(rt, &ret)
        })));
        self
    }

    /// Leaves the next method number unimplemented.
    pub fn nothing(mut self) -> Self {
        self.methods.push(None);
        self
    }

    pub fn build(self) -> MethodTable<RT> {
        MethodTable {
            methods: self.methods,
        }
    }
}

/// Enforces the caller validation postcondition, then encodes the return value.
fn complete<RT: Runtime, R: Serialize>(rt: &RT, ret: &R) -> Result<RawBytes, ActorError> {
    if !rt.caller_validated() {
        return Err(actor_error!(sys_illegal_actor; "Caller validation not performed"));
    }
    encode_result(ret).map_err(|e| {
        ActorError::new(
            Generation::of(rt.actors_version()).result_encode_exit,
            format!("failed to encode return value: {}", e),
        )
    })
}

/// The methods of one actor, indexed by method number.
pub struct MethodTable<RT> {
    methods: Vec<Option<Handler<RT>>>,
}

impl<RT> MethodTable<RT> {
    pub fn get(&self, method: MethodNum) -> Option<&Handler<RT>> {
        let index = usize::try_from(method).ok()?;
        self.methods.get(index)?.as_ref()
    }

    /// The method numbers that have a handler.
    pub fn methods(&self) -> impl Iterator<Item = MethodNum> + '_ {
        self.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_some())
            .map(|(i, _)| i as MethodNum)
    }
}

/// Decodes method parameters. Empty parameters decode as `null`.
pub fn decode_params<P: DeserializeOwned>(params: &[u8]) -> Result<P, EncodingError> {
    if params.is_empty() {
        from_slice(&NULL)
    } else {
        from_slice(params)
    }
}

/// Encodes a return value. A `null` return value (such as `()`) is returned as no bytes.
pub fn encode_result<R: Serialize>(ret: &R) -> Result<RawBytes, EncodingError> {
    let bz = to_vec(ret)?;
    if bz == NULL {
        Ok(RawBytes::default())
    } else {
        Ok(RawBytes::new(bz))
    }
}
