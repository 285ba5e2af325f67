// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use actor_bridge_encoding::de::DeserializeOwned;
use actor_bridge_encoding::ser::Serialize;
use actor_bridge_encoding::RawBytes;
use actor_bridge_shared::address::Address;
use actor_bridge_shared::clock::ChainEpoch;
use actor_bridge_shared::consensus::ConsensusFault;
use actor_bridge_shared::crypto::randomness::DomainSeparationTag;
use actor_bridge_shared::crypto::signature::Signature;
use actor_bridge_shared::econ::TokenAmount;
use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::piece::PieceInfo;
use actor_bridge_shared::randomness::Randomness;
use actor_bridge_shared::sector::{
    AggregateSealVerifyProofAndInfos, RegisteredSealProof, ReplicaUpdateInfo, SealVerifyInfo,
    WindowPoStVerifyInfo,
};
use actor_bridge_shared::version::{ActorsVersion, NetworkVersion};
use actor_bridge_shared::MethodNum;
use cid::Cid;

pub use self::actor_code::*;
pub use self::bridge::{BridgeRuntime, ACTOR_LOG_TARGET};
use crate::{ActorError, Generation, Policy};

mod actor_code;
mod bridge;

/// Runtime is the VM's internal runtime object.
/// this is everything that is accessible to actors, beyond parameters.
pub trait Runtime: Syscalls {
    /// The network protocol version number at the current epoch.
    fn network_version(&self) -> NetworkVersion;

    /// The actors generation of the code being executed.
    fn actors_version(&self) -> ActorsVersion;

    /// Information related to the current message being executed.
    fn message(&self) -> &dyn MessageInfo;

    /// The current chain epoch number. The genesis block has epoch zero.
    fn curr_epoch(&self) -> ChainEpoch;

    /// The base fee of the current tipset. Zero for generations that cannot observe it.
    fn base_fee(&self) -> TokenAmount;

    /// The process-wide policy.
    fn policy(&self) -> &Policy;

    /// Whether one of the caller validations has run during this invocation.
    fn caller_validated(&self) -> bool;

    /// Validates the caller against some predicate.
    /// Exported actor methods must invoke exactly one caller validation before returning.
    fn validate_immediate_caller_accept_any(&mut self) -> Result<(), ActorError>;
    fn validate_immediate_caller_is<'a, I>(&mut self, addresses: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Address>;
    fn validate_immediate_caller_type<'a, I>(&mut self, types: I) -> Result<(), ActorError>
    where
        I: IntoIterator<Item = &'a Cid>;

    /// The balance of the receiver.
    fn current_balance(&self) -> Result<TokenAmount, ActorError>;

    /// Resolves an address of any protocol to an ID address (via the Init actor's table).
    /// This allows resolution of externally-provided SECP, BLS, or actor addresses to the canonical form.
    /// If the argument is an ID address it is returned directly.
    fn resolve_address(&self, address: &Address) -> Result<Option<Address>, ActorError>;

    /// Look up the code ID at an actor address.
    fn get_actor_code_cid(&self, addr: &Address) -> Result<Option<Cid>, ActorError>;

    /// Randomness returns a (pseudo)random byte array drawing from the latest
    /// ticket chain from a given epoch and incorporating requisite entropy.
    /// This randomness is fork dependant but also biasable because of this.
    fn get_randomness_from_tickets(
        &self,
        personalization: DomainSeparationTag,
        rand_epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<Randomness, ActorError>;

    /// Randomness returns a (pseudo)random byte array drawing from the latest
    /// beacon from a given epoch and incorporating requisite entropy.
    /// This randomness is not tied to any fork of the chain, and is unbiasable.
    fn get_randomness_from_beacon(
        &self,
        personalization: DomainSeparationTag,
        rand_epoch: ChainEpoch,
        entropy: &[u8],
    ) -> Result<Randomness, ActorError>;

    /// Initializes the state object.
    /// This is only valid in a constructor function and when the state has not yet been initialized.
    fn create<S: Serialize>(&mut self, obj: &S) -> Result<(), ActorError>;

    /// Loads a readonly copy of the state of the receiver.
    ///
    /// Nothing loaded this way is ever written back.
    fn state<S: DeserializeOwned>(&self) -> Result<S, ActorError>;

    /// Loads a mutable version of the state and protects the execution from side effects
    /// (including message send).
    ///
    /// The closure may mutate the state. Once it returns successfully, the state is committed
    /// in place of the root observed when the transaction began. If it fails, nothing is
    /// committed and the error is returned.
    fn transaction<S, RT, F>(&mut self, f: F) -> Result<RT, ActorError>
    where
        S: Serialize + DeserializeOwned,
        F: FnOnce(&mut S, &mut Self) -> Result<RT, ActorError>;

    /// Loads a block from the host's store.
    fn store_get<T: DeserializeOwned>(&self, cid: &Cid) -> Result<Option<T>, ActorError>;

    /// Writes a block to the host's store, returning its CID.
    fn store_put<T: Serialize>(&self, obj: &T) -> Result<Cid, ActorError>;

    /// Sends a message to another actor, returning the exit code and return value envelope.
    /// If the invoked method does not return successfully, its state changes
    /// (and that of any messages it sent in turn) will be rolled back.
    fn send(
        &self,
        to: &Address,
        method: MethodNum,
        params: RawBytes,
        value: TokenAmount,
    ) -> Result<RawBytes, ActorError>;

    /// Computes an address for a new actor. The returned address is intended to uniquely refer to
    /// the actor even in the event of a chain re-org (whereas an ID-address might refer to a
    /// different actor after messages are re-ordered).
    /// Always an ActorExec address.
    fn new_actor_address(&mut self) -> Result<Address, ActorError>;

    /// Creates an actor with code `codeID` and address `address`, with empty state.
    /// May only be called by Init actor.
    fn create_actor(&mut self, code_id: Cid, address: &Address) -> Result<(), ActorError>;

    /// Deletes the executing actor from the state tree, transferring any balance to beneficiary.
    /// Aborts if the beneficiary does not exist.
    /// May only be called by the actor itself.
    fn delete_actor(&mut self, beneficiary: &Address) -> Result<(), ActorError>;

    /// Returns the total token supply in circulation at the beginning of the current epoch.
    fn total_fil_circ_supply(&self) -> Result<TokenAmount, ActorError>;

    /// ChargeGas charges specified amount of `gas` for execution.
    /// `name` provides information about gas charging point
    fn charge_gas(&mut self, name: &'static str, compute: i64) -> Result<(), ActorError>;

    /// Logs a message from the actor. Best effort: never fails the invocation.
    fn log(&self, level: log::Level, msg: &str);

    /// Decodes method parameters, failing with the exit code of the current generation.
    fn deserialize_params<O: DeserializeOwned>(&self, params: &RawBytes) -> Result<O, ActorError> {
        decode_params(params).map_err(|e| {
            ActorError::new(
                Generation::of(self.actors_version()).params_decode_exit,
                format!("failed to decode parameters: {}", e),
            )
        })
    }

    /// Aborts the current invocation with `exit_code`.
    fn abort(&self, exit_code: ExitCode) -> ActorError {
        ActorError::from(exit_code)
    }

    fn abort_with_message(&self, exit_code: ExitCode, msg: &str) -> ActorError {
        ActorError::new(exit_code, msg.to_string())
    }
}

/// Message information available to the actor about executing message.
pub trait MessageInfo {
    /// The address of the immediate calling actor. Always an ID-address.
    fn caller(&self) -> Address;

    /// The address of the actor receiving the message. Always an ID-address.
    fn receiver(&self) -> Address;

    /// The value attached to the message being processed, implicitly
    /// added to current_balance() before method invocation.
    fn value_received(&self) -> TokenAmount;
}

/// Everything the host tells the bridge about one invocation. Never changes while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Opaque host handle, echoed at the start of every host call.
    pub id: u64,
    pub network_version: NetworkVersion,
    pub base_fee: TokenAmount,
    pub caller: Address,
    pub receiver: Address,
    pub epoch: ChainEpoch,
    pub value: TokenAmount,
}

impl MessageInfo for InvocationContext {
    fn caller(&self) -> Address {
        self.caller
    }

    fn receiver(&self) -> Address {
        self.receiver
    }

    fn value_received(&self) -> TokenAmount {
        self.value.clone()
    }
}

/// Pure functions implemented as primitives by the runtime.
///
/// A failure is either the oracle rejecting its input or an abort reported by the host, such as
/// running out of gas. The abort travels inside the `anyhow::Error` as an [`ActorError`], so
/// callers should convert with [`ActorError::from_syscall`] rather than mapping every error to
/// one exit code, which would turn a host abort into an ordinary rejection.
pub trait Syscalls {
    /// Verifies that a signature is valid for an address and plaintext.
    fn verify_signature(
        &self,
        signature: &Signature,
        signer: &Address,
        plaintext: &[u8],
    ) -> anyhow::Result<()>;

    /// Hashes input data using blake2b with 256 bit output.
    fn hash_blake2b(&self, data: &[u8]) -> anyhow::Result<[u8; 32]>;

    /// Computes an unsealed sector CID (CommD) from its constituent piece CIDs (CommPs) and sizes.
    fn compute_unsealed_sector_cid(
        &self,
        proof_type: RegisteredSealProof,
        pieces: &[PieceInfo],
    ) -> anyhow::Result<Cid>;

    /// Verifies a sector seal proof.
    fn verify_seal(&self, vi: &SealVerifyInfo) -> anyhow::Result<()>;

    /// Verifies a window proof of spacetime.
    fn verify_post(&self, verify_info: &WindowPoStVerifyInfo) -> anyhow::Result<()>;

    /// Verifies that two block headers provide proof of a consensus fault:
    /// - both headers mined by the same actor
    /// - headers are different
    /// - first header is of the same or lower epoch as the second
    /// - at least one of the headers appears in the current chain at or after epoch `earliest`
    /// - the headers provide evidence of a fault.
    /// The parameters are all serialized block headers. The third "extra" parameter is consulted only for
    /// the "parent grinding fault", in which case it must be the sibling of h1 (same parent tipset) and one of the
    /// blocks in the parent of h2 (i.e. h2's grandparent).
    /// Returns `None` if the headers don't prove a fault.
    fn verify_consensus_fault(
        &self,
        h1: &[u8],
        h2: &[u8],
        extra: &[u8],
    ) -> anyhow::Result<Option<ConsensusFault>>;

    fn batch_verify_seals(&self, batch: &[SealVerifyInfo]) -> anyhow::Result<Vec<bool>> {
        Ok(batch
            .iter()
            .map(|si| self.verify_seal(si).is_ok())
            .collect())
    }

    fn verify_aggregate_seals(
        &self,
        aggregate: &AggregateSealVerifyProofAndInfos,
    ) -> anyhow::Result<()>;

    fn verify_replica_update(&self, replica: &ReplicaUpdateInfo) -> anyhow::Result<()>;
}
