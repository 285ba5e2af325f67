// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Wire format of the configuration entry point:
//! `[minimum verified deal size, consensus miner min power, n, proof_0, ..., proof_n-1, log level?]`.

use actor_bridge_encoding::{Decoder, Encoder, Error as EncodingError};
use actor_bridge_runtime::Policy;
use actor_bridge_shared::codec::{DecoderExt, EncoderExt};
use actor_bridge_shared::sector::RegisteredSealProof;
use log::LevelFilter;
use num_traits::FromPrimitive;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Malformed(#[from] EncodingError),
    #[error("invalid seal proof count {0}")]
    InvalidProofCount(i64),
    #[error("unknown seal proof type {0}")]
    UnknownProof(i64),
    #[error("unknown log level {0}")]
    UnknownLogLevel(u64),
    #[error("configuration is frozen once invocations have begun")]
    Frozen,
    #[error("the bridge has not been initialized")]
    NotInitialized,
}

pub fn decode_policy(bytes: &[u8]) -> Result<Policy, ConfigError> {
    let mut dec = Decoder::new(bytes);
    let minimum_verified_deal_size = dec.big()?;
    let consensus_miner_min_power = dec.big()?;
    // Hosts write the count as a signed integer.
    let n = dec.int()?;
    if n < 0 {
        return Err(ConfigError::InvalidProofCount(n));
    }
    let mut supported_proofs = Vec::new();
    for _ in 0..n {
        let proof = dec.int()?;
        supported_proofs.push(
            RegisteredSealProof::from_i64(proof).ok_or(ConfigError::UnknownProof(proof))?,
        );
    }
    let log_level = if dec.is_empty() {
        LevelFilter::Info
    } else {
        let level = dec.uint()?;
        level_from_u64(level).ok_or(ConfigError::UnknownLogLevel(level))?
    };
    dec.finish()?;
    Ok(Policy::default()
        .with_minimum_verified_deal_size(minimum_verified_deal_size)
        .with_consensus_miner_min_power(consensus_miner_min_power)
        .with_supported_proofs(supported_proofs)
        .with_log_level(log_level))
}

pub fn encode_policy(policy: &Policy) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.big(&policy.minimum_verified_deal_size)
        .big(&policy.consensus_miner_min_power)
        .int(policy.supported_proofs.len() as i64);
    for proof in &policy.supported_proofs {
        enc.int(*proof as i64);
    }
    enc.uint(policy.log_level as u64);
    enc.into_bytes()
}

fn level_from_u64(level: u64) -> Option<LevelFilter> {
    Some(match level {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use actor_bridge_shared::bigint::BigInt;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn policy_roundtrip() {
        let policy = Policy::default()
            .with_minimum_verified_deal_size(256)
            .with_consensus_miner_min_power(2048)
            .with_supported_proofs([
                RegisteredSealProof::StackedDRG2KiBV1,
                RegisteredSealProof::StackedDRG8MiBV1P1,
            ])
            .with_log_level(LevelFilter::Trace);
        assert_eq!(decode_policy(&encode_policy(&policy)).unwrap(), policy);
        assert_eq!(
            decode_policy(&encode_policy(&Policy::default())).unwrap(),
            Policy::default()
        );
    }

    #[test]
    fn log_level_is_optional() {
        let mut enc = Encoder::new();
        enc.big(&BigInt::from(1)).big(&BigInt::from(2)).uint(0);
        let policy = decode_policy(enc.as_slice()).unwrap();
        assert!(policy.supported_proofs.is_empty());
        assert_eq!(policy.log_level, LevelFilter::Info);
        assert_eq!(policy.consensus_miner_min_power, BigInt::from(2));
    }

    #[test]
    fn rejects_bad_configuration() {
        let mut enc = Encoder::new();
        enc.big(&BigInt::from(1)).big(&BigInt::from(2)).uint(1).int(42);
        assert_eq!(
            decode_policy(enc.as_slice()),
            Err(ConfigError::UnknownProof(42))
        );

        let mut enc = Encoder::new();
        enc.big(&BigInt::from(1)).big(&BigInt::from(2)).uint(0).uint(9);
        assert_eq!(
            decode_policy(enc.as_slice()),
            Err(ConfigError::UnknownLogLevel(9))
        );

        let mut enc = Encoder::new();
        enc.big(&BigInt::from(1)).big(&BigInt::from(2)).int(-1);
        assert_eq!(
            decode_policy(enc.as_slice()),
            Err(ConfigError::InvalidProofCount(-1))
        );

        // Claims two proofs, carries one.
        let mut enc = Encoder::new();
        enc.big(&BigInt::from(1)).big(&BigInt::from(2)).uint(2).int(3);
        assert_eq!(
            decode_policy(enc.as_slice()),
            Err(ConfigError::Malformed(EncodingError::Truncated))
        );
    }
}
