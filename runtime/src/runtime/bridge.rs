// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::backtrace::Backtrace;
use std::fmt::Display;
use std::sync::Arc;

use actor_bridge_encoding::de::DeserializeOwned;
use actor_bridge_encoding::ser::Serialize;
use actor_bridge_encoding::{
    from_slice, to_vec, Decoder, Encoder, Error as EncodingError, RawBytes, EMPTY_ARR_CID,
};
use actor_bridge_shared::address::Address;
use actor_bridge_shared::builtin;
use actor_bridge_shared::clock::ChainEpoch;
use actor_bridge_shared::codec::{DecoderExt, EncoderExt};
use actor_bridge_shared::consensus::{ConsensusFault, ConsensusFaultType};
use actor_bridge_shared::crypto::randomness::DomainSeparationTag;
use actor_bridge_shared::crypto::signature::Signature;
use actor_bridge_shared::econ::TokenAmount;
use actor_bridge_shared::piece::PieceInfo;
use actor_bridge_shared::randomness::Randomness;
use actor_bridge_shared::sector::{
    AggregateSealVerifyProofAndInfos, RegisteredSealProof, ReplicaUpdateInfo, SealVerifyInfo,
    WindowPoStVerifyInfo,
};
use actor_bridge_shared::version::{ActorsVersion, NetworkVersion};
use actor_bridge_shared::MethodNum;
use cid::Cid;
use log::{debug, error, log, trace};
use num_traits::{FromPrimitive, Zero};

use super::{InvocationContext, MessageInfo, Runtime, Syscalls};
use crate::channel::{Channel, HostCall, Response};
use crate::{actor_error, ActorError, Generation, Policy, VerificationFailed};

/// Log target under which actor log messages are mirrored.
pub const ACTOR_LOG_TARGET: &str = "actor_bridge::actor";

/// The runtime handed to an actor for the length of one invocation. Every capability is a single
/// round trip to the host over `C`.
pub struct BridgeRuntime<C> {
    ctx: InvocationContext,
    channel: C,
    policy: Arc<Policy>,
    generation: &'static Generation,
    /// Set once any caller validation has run. A second validation aborts.
    caller_validated: bool,
    /// Indicates whether we are in a state transaction. During such, sending
    /// messages is prohibited.
    in_transaction: bool,
}

impl<C: Channel> BridgeRuntime<C> {
    pub fn new(
        ctx: InvocationContext,
        channel: C,
        policy: Arc<Policy>,
        generation: &'static Generation,
    ) -> Self {
        BridgeRuntime {
            ctx,
            channel,
            policy,
            generation,
            caller_validated: false,
            in_transaction: false,
        }
    }

    pub fn context(&self) -> &InvocationContext {
        &self.ctx
    }

    pub fn generation(&self) -> &'static Generation {
        self.generation
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Starts a request to the host; every request leads with the invocation id.
    fn request(&self) -> Encoder {
        let mut req = Encoder::new();
        req.uint(self.ctx.id);
        req
    }

    /// Performs one round trip. A non-success exit code from the host aborts with that code; a
    /// response that cannot be decoded in full is fatal.
    fn round_trip<T, F>(&self, call: HostCall, req: Encoder, decode: F) -> Result<T, ActorError>
    where
        F: FnOnce(&mut Decoder<'_>) -> Result<T, EncodingError>,
    {
        let buf = self.channel.call(call, req.as_slice()).map_err(|e| {
            error!("invocation {}: {}", self.ctx.id, e);
            actor_error!(fatal; e)
        })?;
        let resp = Response::new(buf).map_err(|e| self.malformed(call, e))?;
        let exit_code = resp.exit_code();
        if !exit_code.is_success() {
            debug!(
                "invocation {}: host call {} aborted with exit code {}",
                self.ctx.id, call, exit_code
            );
            return Err(ActorError::new(
                exit_code,
                format!("host call {} failed", call),
            ));
        }
        let mut dec = resp.decoder();
        let out = decode(&mut dec).map_err(|e| self.malformed(call, e))?;
        dec.finish().map_err(|e| self.malformed(call, e))?;
        Ok(out)
    }

    fn malformed(&self, call: HostCall, err: impl Display) -> ActorError {
        error!(
            "invocation {}: malformed response to {}: {}\n{}",
            self.ctx.id,
            call,
            err,
            Backtrace::force_capture()
        );
        actor_error!(fatal; "malformed response to {}: {}", call, err)
    }

    fn assert_not_validated(&mut self) -> Result<(), ActorError> {
        if self.caller_validated {
            return Err(actor_error!(sys_illegal_actor;
                "Method must validate caller identity exactly once"));
        }
        self.caller_validated = true;
        Ok(())
    }

    /// State may only change once the caller is known.
    fn assert_validated(&self) -> Result<(), ActorError> {
        if !self.caller_validated {
            return Err(actor_error!(sys_illegal_actor; "caller not validated"));
        }
        Ok(())
    }

    /// Fetches the receiver's state blob, and its CID when asked for.
    fn state_get(&self, want_cid: bool) -> Result<Option<(Vec<u8>, Option<Cid>)>, ActorError> {
        let mut req = self.request();
        req.bool(want_cid);
        self.round_trip(HostCall::StateGet, req, |dec| {
            if !dec.bool()? {
                return Ok(None);
            }
            let state = dec.bytes()?.to_vec();
            let cid = if want_cid { Some(dec.cid()?) } else { None };
            Ok(Some((state, cid)))
        })
    }

    fn state_commit(&self, state: &[u8], base: &Cid) -> Result<(), ActorError> {
        let mut req = self.request();
        req.bytes(state).cid(base);
        self.round_trip(HostCall::StateCommit, req, |_| Ok(()))
    }

    /// Decodes a value the host hands back verbatim. The host stores what actors wrote, so a
    /// failure here means the bridge contract is broken.
    fn decode_host_value<T: DeserializeOwned>(&self, what: &str, bz: &[u8]) -> Result<T, ActorError> {
        from_slice(bz).map_err(|e| {
            error!("invocation {}: failed to decode {}: {}", self.ctx.id, what, e);
            actor_error!(fatal; "failed to decode {}: {}", what, e)
        })
    }

    fn randomness(
        &self,
        call: HostCall,
        personalization: DomainSeparationTag,
        rand_epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<Randomness, ActorError> {
        let mut req = self.request();
        req.int(personalization as i64).int(rand_epoch).bytes(entropy);
        self.round_trip(call, req, |dec| Ok(Randomness(dec.bytes()?.to_vec())))
    }

    fn oracle(&self, call: HostCall, req: Encoder, rejection: &'static str) -> anyhow::Result<()> {
        if self.round_trip(call, req, |dec| dec.bool())? {
            Ok(())
        } else {
            Err(VerificationFailed(rejection).into())
        }
    }
}

impl<C: Channel> Runtime for BridgeRuntime<C> {
    fn network_version(&self) -> NetworkVersion {
        self.ctx.network_version
    }

    fn actors_version(&self) -> ActorsVersion {
        self.generation.version
    }

    fn message(&self) -> &dyn MessageInfo {
        &self.ctx
    }

    fn curr_epoch(&self) -> ChainEpoch {
        self.ctx.epoch
    }

    fn base_fee(&self) -> TokenAmount {
        if self.generation.has_base_fee {
            self.ctx.base_fee.clone()
        } else {
            TokenAmount::zero()
        }
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn caller_validated(&self) -> bool {
        self.caller_validated
    }

    fn validate_immediate_caller_accept_any(&mut self) -> Result<(), ActorError> {
        self.assert_not_validated()
    }

    fn validate_immediate_caller_is<'a, I>(&mut self, addresses: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Address>,
    {
        self.assert_not_validated()?;
        let caller = self.ctx.caller;
        if addresses.into_iter().any(|a| *a == caller) {
            Ok(())
        } else {
            Err(actor_error!(sys_forbidden;
                "caller {} is not one of supported", caller))
        }
    }

    fn validate_immediate_caller_type<'a, I>(&mut self, types: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Cid>,
    {
        self.assert_not_validated()?;
        let caller = self.ctx.caller;
        let caller_cid = match self.get_actor_code_cid(&caller)? {
            Some(cid) => cid,
            None => {
                error!(
                    "invocation {}: no code for caller {}",
                    self.ctx.id, caller
                );
                return Err(actor_error!(fatal; "failed to lookup code for caller {}", caller));
            }
        };
        if types.into_iter().any(|c| *c == caller_cid) {
            Ok(())
        } else {
            Err(actor_error!(sys_forbidden;
                "caller cid type {} not one of supported", caller_cid))
        }
    }

    fn current_balance(&self) -> Result<TokenAmount, ActorError> {
        self.round_trip(HostCall::CurrentBalance, self.request(), |dec| dec.token())
    }

    fn resolve_address(&self, address: &Address) -> Result<Option<Address>, ActorError> {
        let mut req = self.request();
        req.addr(address);
        self.round_trip(HostCall::ResolveAddress, req, |dec| {
            if dec.bool()? {
                Ok(Some(dec.addr()?))
            } else {
                Ok(None)
            }
        })
    }

    fn get_actor_code_cid(&self, addr: &Address) -> Result<Option<Cid>, ActorError> {
        let mut req = self.request();
        req.addr(addr);
        self.round_trip(HostCall::GetActorCodeCid, req, |dec| {
            if dec.bool()? {
                Ok(Some(dec.cid()?))
            } else {
                Ok(None)
            }
        })
    }

    fn get_randomness_from_tickets(
        &self,
        personalization: DomainSeparationTag,
        rand_epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<Randomness, ActorError> {
        self.randomness(
            HostCall::RandomnessFromTickets,
            personalization,
            rand_epoch,
            entropy,
        )
    }

    fn get_randomness_from_beacon(
        &self,
        personalization: DomainSeparationTag,
        rand_epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<Randomness, ActorError> {
        self.randomness(
            HostCall::RandomnessFromBeacon,
            personalization,
            rand_epoch,
            entropy,
        )
    }

    fn create<S: Serialize>(&mut self, obj: &S) -> Result<(), ActorError> {
        self.assert_validated()?;
        let state = to_vec(obj).map_err(|e| ActorError::from(e).wrap("failed to encode state"))?;
        self.state_commit(&state, &EMPTY_ARR_CID)
    }

    fn state<S: DeserializeOwned>(&self) -> Result<S, ActorError> {
        match self.state_get(false)? {
            Some((state, _)) => self.decode_host_value("actor state", &state),
            None => Err(actor_error!(sys_illegal_argument;
                "failed to get actor for Readonly state")),
        }
    }

    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>,
    {
        if self.in_transaction {
            return Err(actor_error!(sys_illegal_actor; "nested state transaction"));
        }
        self.assert_validated()?;
        let (state, base) = match self.state_get(true)? {
            Some((state, Some(base))) => (state, base),
            _ => {
                return Err(actor_error!(sys_illegal_actor;
                    "failed to get actor state for transaction"))
            }
        };
        let mut state: S = self.decode_host_value("actor state", &state)?;

        self.in_transaction = true;
        let result = f(&mut state, self);
        self.in_transaction = false;

        let ret = result?;
        let state = to_vec(&state).map_err(|e| ActorError::from(e).wrap("failed to encode state"))?;
        self.state_commit(&state, &base)?;
        Ok(ret)
    }

    fn store_get<T: DeserializeOwned>(&self, cid: &Cid) -> Result<Option<T>, ActorError> {
        let mut req = self.request();
        req.cid(cid);
        let block = self.round_trip(HostCall::StoreGet, req, |dec| {
            if dec.bool()? {
                Ok(Some(dec.bytes()?.to_vec()))
            } else {
                Ok(None)
            }
        })?;
        block
            .map(|bz| self.decode_host_value("block", &bz))
            .transpose()
    }

    fn store_put<T: Serialize>(&self, obj: &T) -> Result<Cid, ActorError> {
        let block = to_vec(obj).map_err(|e| ActorError::from(e).wrap("failed to encode block"))?;
        let mut req = self.request();
        req.bytes(&block);
        self.round_trip(HostCall::StorePut, req, |dec| dec.cid())
    }

    fn send(
        &self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<RawBytes, ActorError> {
        if self.in_transaction {
            return Err(actor_error!(sys_illegal_actor; "runtime.send() is not allowed"));
        }
        let mut req = self.request();
        req.addr(to).uint(method).bytes(&params).token(&value);
        let (exit_code, ret) = self.round_trip(HostCall::Send, req, |dec| {
            let exit_code = dec.exit_code()?;
            let ret = dec.bytes()?.to_vec();
            Ok((exit_code, ret))
        })?;
        if !exit_code.is_success() {
            debug!(
                "invocation {}: send to {} method {} aborted with exit code {}",
                self.ctx.id, to, method, exit_code
            );
            return Err(ActorError::new(
                exit_code,
                format!("send to {} method {} aborted with code {}", to, method, exit_code),
            ));
        }
        Ok(RawBytes::new(ret))
    }

    fn new_actor_address(&mut self) -> Result<Address, ActorError> {
        self.round_trip(HostCall::NewActorAddress, self.request(), |dec| dec.addr())
    }

    fn create_actor(&mut self, code_id: Cid, address: &Address) -> Result<(), ActorError> {
        match builtin::resolve(&code_id) {
            Some((kind, _)) if !kind.is_singleton_actor() => {}
            _ => {
                return Err(actor_error!(sys_illegal_argument;
                    "Can only create built-in actors, not {}", code_id))
            }
        }
        let mut req = self.request();
        req.cid(&code_id).addr(address);
        self.round_trip(HostCall::CreateActor, req, |_| Ok(()))
    }

    fn delete_actor(&mut self, beneficiary: &Address) -> Result<(), ActorError> {
        let mut req = self.request();
        req.addr(beneficiary);
        self.round_trip(HostCall::DeleteActor, req, |_| Ok(()))
    }

    fn total_fil_circ_supply(&self) -> Result<TokenAmount, ActorError> {
        self.round_trip(HostCall::TotalFilCircSupply, self.request(), |dec| dec.token())
    }

    fn charge_gas(&mut self, name: &'static str, compute: i64) -> Result<(), ActorError> {
        trace!("invocation {}: charging {} gas for {}", self.ctx.id, compute, name);
        let mut req = self.request();
        req.int(compute);
        self.round_trip(HostCall::ChargeGas, req, |_| Ok(()))
    }

    fn log(&self, level: log::Level, msg: &str) {
        if level > self.policy.log_level {
            return;
        }
        log!(target: ACTOR_LOG_TARGET, level, "[{}] {}", self.ctx.receiver, msg);
        if !self.generation.has_log {
            return;
        }
        let mut req = self.request();
        req.uint(level as u64).text(msg);
        if let Err(e) = self.round_trip(HostCall::Log, req, |_| Ok(())) {
            debug!("invocation {}: dropped actor log: {}", self.ctx.id, e);
        }
    }
}

impl<C: Channel> Syscalls for BridgeRuntime<C> {
    fn verify_signature(
        &self,
        signature: &Signature,
        signer: &Address,
        plaintext: &[u8],
    ) -> anyhow::Result<()> {
        let mut req = self.request();
        req.signature(signature).addr(signer).bytes(plaintext);
        self.oracle(HostCall::VerifySignature, req, "invalid signature")
    }

    fn hash_blake2b(&self, data: &[u8]) -> anyhow::Result<[u8; 32]> {
        let mut req = self.request();
        req.bytes(data);
        let digest = self.round_trip(HostCall::HashBlake2b, req, |dec| {
            <[u8; 32]>::try_from(dec.bytes()?).map_err(|_| {
                EncodingError::InvalidValue("blake2b digest must be 32 bytes".to_string())
            })
        })?;
        Ok(digest)
    }

    fn compute_unsealed_sector_cid(
        &self,
        proof_type: RegisteredSealProof,
        pieces: &[PieceInfo],
    ) -> anyhow::Result<Cid> {
        let mut req = self.request();
        req.int(proof_type as i64).array(pieces.len());
        for piece in pieces {
            req.value(piece).map_err(ActorError::from)?;
        }
        let cid = self.round_trip(HostCall::ComputeUnsealedSectorCid, req, |dec| {
            if dec.bool()? {
                Ok(Some(dec.cid()?))
            } else {
                Ok(None)
            }
        })?;
        cid.ok_or_else(|| VerificationFailed("failed to compute unsealed sector CID").into())
    }

    fn verify_seal(&self, vi: &SealVerifyInfo) -> anyhow::Result<()> {
        let mut req = self.request();
        req.value(vi).map_err(ActorError::from)?;
        self.oracle(HostCall::VerifySeal, req, "invalid seal")
    }

    fn verify_post(&self, verify_info: &WindowPoStVerifyInfo) -> anyhow::Result<()> {
        let mut req = self.request();
        req.value(verify_info).map_err(ActorError::from)?;
        self.oracle(HostCall::VerifyPost, req, "invalid post")
    }

    fn verify_consensus_fault(
        &self,
        h1: &[u8],
        h2: &[u8],
        extra: &[u8],
    ) -> anyhow::Result<Option<ConsensusFault>> {
        let mut req = self.request();
        req.bytes(h1).bytes(h2).bytes(extra);
        let fault = self.round_trip(HostCall::VerifyConsensusFault, req, |dec| {
            if !dec.bool()? {
                return Ok(None);
            }
            let target = dec.addr()?;
            let epoch = dec.int()?;
            let fault_type = dec.int()?;
            let fault_type = ConsensusFaultType::from_i64(fault_type).ok_or_else(|| {
                EncodingError::InvalidValue(format!("unknown consensus fault type {}", fault_type))
            })?;
            Ok(Some(ConsensusFault {
                target,
                epoch,
                fault_type,
            }))
        })?;
        Ok(fault)
    }

    fn batch_verify_seals(&self, batch: &[SealVerifyInfo]) -> anyhow::Result<Vec<bool>> {
        let mut req = self.request();
        req.uint(batch.len() as u64);
        for vi in batch {
            req.value(vi).map_err(ActorError::from)?;
        }
        let results = self.round_trip(HostCall::BatchVerifySeals, req, |dec| {
            (0..batch.len()).map(|_| dec.bool()).collect()
        })?;
        Ok(results)
    }

    fn verify_aggregate_seals(
        &self,
        aggregate: &AggregateSealVerifyProofAndInfos,
    ) -> anyhow::Result<()> {
        if !self.generation.has_aggregate_seals {
            return Err(actor_error!(sys_illegal_actor;
                "aggregate seal verification is not available to actors {}",
                self.generation.version)
            .into());
        }
        let mut req = self.request();
        req.value(aggregate).map_err(ActorError::from)?;
        self.oracle(HostCall::VerifyAggregateSeals, req, "invalid aggregate")
    }

    fn verify_replica_update(&self, replica: &ReplicaUpdateInfo) -> anyhow::Result<()> {
        if !self.generation.has_replica_update {
            return Err(actor_error!(sys_illegal_actor;
                "replica update verification is not available to actors {}",
                self.generation.version)
            .into());
        }
        let mut req = self.request();
        req.value(replica).map_err(ActorError::from)?;
        self.oracle(HostCall::VerifyReplicaUpdate, req, "invalid replica update")
    }
}
