// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Encoding of the invoke entry point's request and response.

use actor_bridge_encoding::{Decoder, Encoder, Error, RawBytes};
use actor_bridge_runtime::InvocationContext;
use actor_bridge_shared::codec::{DecoderExt, EncoderExt};
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::NetworkVersion;
use actor_bridge_shared::MethodNum;
use cid::Cid;

/// One invocation, as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub context: InvocationContext,
    pub code: Cid,
    pub method: MethodNum,
    pub params: RawBytes,
}

impl InvokeRequest {
    /// Decodes `[id, network version, base fee, caller, receiver, epoch, value, code, method,
    /// params]`.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = Decoder::new(bytes);
        let id = dec.uint()?;
        let network_version = u32::try_from(dec.uint()?).map_err(|_| Error::Overflow)?;
        let context = InvocationContext {
            id,
            network_version: NetworkVersion::new(network_version),
            base_fee: dec.token()?,
            caller: dec.addr()?,
            receiver: dec.addr()?,
            epoch: dec.int()?,
            value: dec.token()?,
        };
        let code = dec.cid()?;
        let method = dec.uint()?;
        let params = RawBytes::new(dec.bytes()?.to_vec());
        dec.finish()?;
        Ok(InvokeRequest {
            context,
            code,
            method,
            params,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let ctx = &self.context;
        let mut enc = Encoder::new();
        enc.uint(ctx.id)
            .uint(u32::from(ctx.network_version) as u64)
            .token(&ctx.base_fee)
            .addr(&ctx.caller)
            .addr(&ctx.receiver)
            .int(ctx.epoch)
            .token(&ctx.value)
            .cid(&self.code)
            .uint(self.method)
            .bytes(&self.params);
        enc.into_bytes()
    }
}

/// The outcome of one invocation: the exit code, then the return value on success or the abort
/// message otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse {
    pub exit_code: ExitCode,
    pub payload: Vec<u8>,
}

impl InvokeResponse {
    pub fn ok(ret: RawBytes) -> Self {
        InvokeResponse {
            exit_code: ExitCode::OK,
            payload: ret.into(),
        }
    }

    pub fn abort(exit_code: ExitCode, msg: &str) -> Self {
        InvokeResponse {
            exit_code,
            payload: msg.as_bytes().to_vec(),
        }
    }

    /// The abort message, when the invocation failed.
    pub fn message(&self) -> Option<String> {
        if self.exit_code.is_success() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.payload).into_owned())
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(self.payload.len() + 16);
        enc.exit_code(self.exit_code).bytes(&self.payload);
        enc.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = Decoder::new(bytes);
        let exit_code = dec.exit_code()?;
        let payload = dec.bytes()?.to_vec();
        dec.finish()?;
        Ok(InvokeResponse { exit_code, payload })
    }
}

#[cfg(test)]
mod tests {
    use actor_bridge_shared::address::Address;
    use actor_bridge_shared::econ::TokenAmount;
    use pretty_assertions::assert_eq;

    use super::*;

    fn request() -> InvokeRequest {
        InvokeRequest {
            context: InvocationContext {
                id: 9,
                network_version: NetworkVersion::V13,
                base_fee: TokenAmount::from_atto(100),
                caller: Address::new_id(101),
                receiver: Address::new_id(1000),
                epoch: -1,
                value: TokenAmount::from_whole(1),
            },
            code: actor_bridge_encoding::cid_of(b"code"),
            method: 2,
            params: RawBytes::new(vec![0x82, 0x01, 0x02]),
        }
    }

    #[test]
    fn request_layout() {
        let req = request();
        let bz = req.encode();
        let mut dec = Decoder::new(&bz);
        assert_eq!(dec.uint().unwrap(), 9);
        assert_eq!(dec.uint().unwrap(), 13);
        assert_eq!(InvokeRequest::decode(&bz).unwrap(), req);
    }

    #[test]
    fn request_must_be_complete() {
        let bz = request().encode();
        for n in 0..bz.len() {
            assert!(InvokeRequest::decode(&bz[..n]).is_err(), "prefix {}", n);
        }
        let mut long = bz;
        long.push(0x00);
        assert_eq!(
            InvokeRequest::decode(&long),
            Err(Error::TrailingBytes(1))
        );
    }

    #[test]
    fn responses() {
        let ok = InvokeResponse::ok(RawBytes::new(vec![0x07]));
        assert_eq!(ok.encode(), vec![0x00, 0x41, 0x07]);
        assert_eq!(ok.message(), None);
        let abort = InvokeResponse::abort(ExitCode::USR_NOT_FOUND, "gone");
        assert_eq!(InvokeResponse::decode(&abort.encode()).unwrap(), abort);
        assert_eq!(abort.message().as_deref(), Some("gone"));
        let fatal = InvokeResponse::abort(ExitCode::FATAL, "");
        assert_eq!(fatal.encode(), vec![0x20, 0x40]);
    }
}
