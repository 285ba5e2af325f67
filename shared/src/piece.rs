// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use actor_bridge_encoding::tuple::*;
use cid::Cid;
use serde::{Deserialize, Serialize};

/// Size of a piece in bytes, after Fr32 padding.
#[derive(PartialEq, Debug, Eq, Clone, Copy, Serialize, Deserialize, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PaddedPieceSize(pub u64);

impl PaddedPieceSize {
    /// A padded size is valid when it is a power of two of at least 128 bytes.
    pub fn validate(self) -> Result<(), &'static str> {
        if self.0 < 128 {
            return Err("minimum piece size is 128 bytes");
        }
        if self.0.count_ones() != 1 {
            return Err("padded piece size must be a power of 2");
        }
        Ok(())
    }
}

/// Piece information for part or a whole file.
#[derive(Serialize_tuple, Deserialize_tuple, PartialEq, Eq, Clone, Debug)]
pub struct PieceInfo {
    /// Size in nodes. For BLS12-381 (capacity 254 bits), must be >= 16. (16 * 8 = 128).
    pub size: PaddedPieceSize,
    /// Content identifier for piece.
    pub cid: Cid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_sizes() {
        assert!(PaddedPieceSize(128).validate().is_ok());
        assert!(PaddedPieceSize(1 << 30).validate().is_ok());
        assert!(PaddedPieceSize(64).validate().is_err());
        assert!(PaddedPieceSize(384).validate().is_err());
    }
}
