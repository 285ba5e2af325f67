// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Behaviour that differs between actors generations, kept as data.

use actor_bridge_shared::error::ExitCode;
use actor_bridge_shared::version::ActorsVersion;

#[derive(Debug, PartialEq, Eq)]
pub struct Generation {
    pub version: ActorsVersion,
    /// Exit code for parameters that fail to decode.
    pub params_decode_exit: ExitCode,
    /// Exit code for a return value that fails to encode.
    pub result_encode_exit: ExitCode,
    pub has_base_fee: bool,
    pub has_log: bool,
    pub has_aggregate_seals: bool,
    pub has_replica_update: bool,
}

// The first two generations predate a dedicated serialization exit code.
const LEGACY_DECODE_EXIT: ExitCode = ExitCode::new(1);
const LEGACY_ENCODE_EXIT: ExitCode = ExitCode::new(2);

static GENERATIONS: [Generation; 5] = [
    Generation {
        version: ActorsVersion::V0,
        params_decode_exit: LEGACY_DECODE_EXIT,
        result_encode_exit: LEGACY_ENCODE_EXIT,
        has_base_fee: false,
        has_log: false,
        has_aggregate_seals: false,
        has_replica_update: false,
    },
    Generation {
        version: ActorsVersion::V2,
        params_decode_exit: LEGACY_DECODE_EXIT,
        result_encode_exit: LEGACY_ENCODE_EXIT,
        has_base_fee: false,
        has_log: false,
        has_aggregate_seals: false,
        has_replica_update: false,
    },
    Generation {
        version: ActorsVersion::V3,
        params_decode_exit: ExitCode::USR_SERIALIZATION,
        result_encode_exit: ExitCode::USR_SERIALIZATION,
        has_base_fee: false,
        has_log: true,
        has_aggregate_seals: false,
        has_replica_update: false,
    },
    Generation {
        version: ActorsVersion::V4,
        params_decode_exit: ExitCode::USR_SERIALIZATION,
        result_encode_exit: ExitCode::USR_SERIALIZATION,
        has_base_fee: true,
        has_log: true,
        has_aggregate_seals: false,
        has_replica_update: false,
    },
    Generation {
        version: ActorsVersion::V5,
        params_decode_exit: ExitCode::USR_SERIALIZATION,
        result_encode_exit: ExitCode::USR_SERIALIZATION,
        has_base_fee: true,
        has_log: true,
        has_aggregate_seals: true,
        has_replica_update: true,
    },
];

impl Generation {
    pub fn of(version: ActorsVersion) -> &'static Generation {
        match version {
            ActorsVersion::V0 => &GENERATIONS[0],
            ActorsVersion::V2 => &GENERATIONS[1],
            ActorsVersion::V3 => &GENERATIONS[2],
            ActorsVersion::V4 => &GENERATIONS[3],
            ActorsVersion::V5 => &GENERATIONS[4],
        }
    }
}
