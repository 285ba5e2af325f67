// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeSet;

use actor_bridge_shared::bigint::BigInt;
use actor_bridge_shared::sector::RegisteredSealProof;
use log::LevelFilter;

/// Process-wide parameters consulted by actors, set before the first invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// The minimum size of a deal eligible for verified client datacap.
    pub minimum_verified_deal_size: BigInt,
    /// Minimum power of an individual miner to meet the threshold for leader election.
    pub consensus_miner_min_power: BigInt,
    /// Seal proof types miners may use to pre-commit new sectors.
    pub supported_proofs: BTreeSet<RegisteredSealProof>,
    /// Messages an actor logs below this level are dropped without reaching the host.
    pub log_level: LevelFilter,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            minimum_verified_deal_size: BigInt::from(1 << 20),
            consensus_miner_min_power: BigInt::from(10u64 << 40),
            supported_proofs: [
                RegisteredSealProof::StackedDRG32GiBV1P1,
                RegisteredSealProof::StackedDRG64GiBV1P1,
            ]
            .into_iter()
            .collect(),
            log_level: LevelFilter::Info,
        }
    }
}

impl Policy {
    pub fn with_minimum_verified_deal_size(mut self, size: impl Into<BigInt>) -> Self {
        self.minimum_verified_deal_size = size.into();
        self
    }

    pub fn with_consensus_miner_min_power(mut self, power: impl Into<BigInt>) -> Self {
        self.consensus_miner_min_power = power.into();
        self
    }

    pub fn with_supported_proofs<I>(mut self, proofs: I) -> Self
    where
        I: IntoIterator<Item = RegisteredSealProof>,
    {
        self.supported_proofs = proofs.into_iter().collect();
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn is_supported_proof(&self, proof: RegisteredSealProof) -> bool {
        self.supported_proofs.contains(&proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_defaults() {
        let policy = Policy::default();
        assert_eq!(policy.minimum_verified_deal_size, BigInt::from(1_048_576));
        assert_eq!(
            policy.consensus_miner_min_power,
            BigInt::from(10_995_116_277_760u64)
        );
        assert!(policy.is_supported_proof(RegisteredSealProof::StackedDRG32GiBV1P1));
        assert!(!policy.is_supported_proof(RegisteredSealProof::StackedDRG2KiBV1P1));
        assert_eq!(policy.log_level, LevelFilter::Info);
    }

    #[test]
    fn builder() {
        let policy = Policy::default()
            .with_supported_proofs([RegisteredSealProof::StackedDRG2KiBV1P1])
            .with_consensus_miner_min_power(2048)
            .with_log_level(LevelFilter::Debug);
        assert_eq!(policy.supported_proofs.len(), 1);
        assert_eq!(policy.consensus_miner_min_power, BigInt::from(2048));
        assert_eq!(policy.log_level, LevelFilter::Debug);
    }
}
