// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod errors;
mod network;
mod payload;
mod protocol;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub use self::errors::Error;
pub use self::network::{current_network, set_current_network, Network};
pub use self::payload::Payload;
pub use self::protocol::Protocol;
use crate::ActorID;

/// defines the encoder for base32 encoding with the provided string with no padding
const ADDRESS_ENCODER: Encoding = new_encoding! {
    symbols: "abcdefghijklmnopqrstuvwxyz234567",
    padding: None,
};

/// Hash length of payload for Secp and Actor addresses.
pub const PAYLOAD_HASH_LEN: usize = 20;

/// BLS public key length used for validation of BLS addresses.
pub const BLS_PUB_LEN: usize = 48;

/// Length of the checksum hash for string encodings.
pub const CHECKSUM_HASH_LEN: usize = 4;

const MAX_ADDRESS_LEN: usize = 84 + 2;
const MAINNET_PREFIX: &str = "f";
const TESTNET_PREFIX: &str = "t";

/// Address is the struct that defines the protocol and data payload conversion from either
/// a public key or value
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address {
    payload: Payload,
}

impl Address {
    /// Generates new address using ID protocol.
    pub const fn new_id(id: u64) -> Self {
        Self {
            payload: Payload::ID(id),
        }
    }

    /// Generates new address using Secp256k1 pubkey.
    pub fn new_secp256k1(pubkey: &[u8]) -> Self {
        Self {
            payload: Payload::Secp256k1(address_hash(pubkey)),
        }
    }

    /// Generates new address using the Actor protocol.
    pub fn new_actor(data: &[u8]) -> Self {
        Self {
            payload: Payload::Actor(address_hash(data)),
        }
    }

    /// Generates a new address using a BLS public key.
    pub fn new_bls(pubkey: &[u8]) -> Result<Self, Error> {
        let key = pubkey
            .try_into()
            .map_err(|_| Error::InvalidBLSLength(pubkey.len()))?;
        Ok(Self {
            payload: Payload::BLS(key),
        })
    }

    /// Creates address from encoded bytes.
    pub fn from_bytes(bz: &[u8]) -> Result<Self, Error> {
        match bz.split_first() {
            Some((&protocol, payload)) => {
                let protocol = Protocol::from_byte(protocol).ok_or(Error::UnknownProtocol)?;
                Ok(Self {
                    payload: Payload::new(protocol, payload)?,
                })
            }
            None => Err(Error::InvalidLength),
        }
    }

    /// Returns protocol for Address
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.payload)
    }

    /// Returns the `Payload` object from the address, where the respective protocol data is kept
    /// in an enum separated by protocol
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the raw bytes data payload of the Address
    pub fn payload_bytes(&self) -> Vec<u8> {
        self.payload.to_raw_bytes()
    }

    /// Returns encoded bytes of Address
    pub fn to_bytes(self) -> Vec<u8> {
        self.payload.to_bytes()
    }

    /// Get ID of the address. ID protocol only.
    pub fn id(&self) -> Result<ActorID, Error> {
        match self.payload {
            Payload::ID(id) => Ok(id),
            _ => Err(Error::NonIDAddress),
        }
    }

    fn encode_with(&self, network: Network) -> String {
        match self.payload {
            Payload::ID(id) => format!("{}{}{}", network.to_prefix(), Protocol::ID, id),
            payload => {
                let mut data = payload.to_raw_bytes();
                data.extend_from_slice(&checksum(&self.to_bytes()));
                format!(
                    "{}{}{}",
                    network.to_prefix(),
                    self.protocol(),
                    ADDRESS_ENCODER.encode(&data)
                )
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_with(current_network()))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(addr: &str) -> Result<Self, Error> {
        if addr.len() > MAX_ADDRESS_LEN || addr.len() < 3 {
            return Err(Error::InvalidLength);
        }
        // The network prefix only selects the display form; both parse.
        if !addr.starts_with(MAINNET_PREFIX) && !addr.starts_with(TESTNET_PREFIX) {
            return Err(Error::UnknownNetwork);
        }
        let protocol = match &addr[1..2] {
            "0" => Protocol::ID,
            "1" => Protocol::Secp256k1,
            "2" => Protocol::Actor,
            "3" => Protocol::BLS,
            _ => return Err(Error::UnknownProtocol),
        };
        let raw = &addr[2..];

        if protocol == Protocol::ID {
            if raw.len() > 20 {
                // 20 is max u64 as string
                return Err(Error::InvalidLength);
            }
            let id = raw.parse::<u64>()?;
            return Ok(Address::new_id(id));
        }

        let mut payload = ADDRESS_ENCODER.decode(raw.as_bytes())?;
        if payload.len() < CHECKSUM_HASH_LEN {
            return Err(Error::InvalidLength);
        }
        let cksm = payload.split_off(payload.len() - CHECKSUM_HASH_LEN);
        let addr = Address {
            payload: Payload::new(protocol, &payload)?,
        };
        if checksum(&addr.to_bytes()) != cksm.as_slice() {
            return Err(Error::InvalidChecksum);
        }
        Ok(addr)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::Serialize::serialize(self.to_bytes().as_slice(), s)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bz: Cow<'de, [u8]> = serde_bytes::Deserialize::deserialize(deserializer)?;
        Address::from_bytes(&bz).map_err(de::Error::custom)
    }
}

/// Returns an address hash for given data
fn address_hash(ingest: &[u8]) -> [u8; PAYLOAD_HASH_LEN] {
    let digest = blake2b_simd::Params::new()
        .hash_length(PAYLOAD_HASH_LEN)
        .to_state()
        .update(ingest)
        .finalize();

    let mut hash = [0u8; PAYLOAD_HASH_LEN];
    hash.copy_from_slice(digest.as_bytes());
    hash
}

/// Checksum calculates the 4 byte checksum hash
pub fn checksum(ingest: &[u8]) -> Vec<u8> {
    blake2b_simd::Params::new()
        .hash_length(CHECKSUM_HASH_LEN)
        .to_state()
        .update(ingest)
        .finalize()
        .as_bytes()
        .to_vec()
}

/// Validates the checksum against the ingest data
pub fn validate_checksum(ingest: &[u8], expect: Vec<u8>) -> bool {
    let digest = checksum(ingest);
    digest == expect
}

pub(crate) fn to_leb_bytes(id: u64) -> Vec<u8> {
    let mut buf = unsigned_varint::encode::u64_buffer();
    unsigned_varint::encode::u64(id, &mut buf).to_vec()
}

pub(crate) fn from_leb_bytes(bz: &[u8]) -> Result<u64, Error> {
    let (id, remaining) = unsigned_varint::decode::u64(bz)?;
    if !remaining.is_empty() {
        return Err(Error::InvalidPayload);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use actor_bridge_encoding::{from_slice, to_vec};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn id_bytes() {
        let addr = Address::new_id(1024);
        assert_eq!(addr.to_bytes(), vec![0x00, 0x80, 0x08]);
        assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
        assert_eq!(addr.id().unwrap(), 1024);
        assert_eq!(addr.encode_with(Network::Mainnet), "f01024");
    }

    #[test]
    fn key_addresses_roundtrip_through_strings() {
        let secp = Address::new_secp256k1(&[4u8; 65]);
        let actor = Address::new_actor(b"creator");
        let bls = Address::new_bls(&[7u8; BLS_PUB_LEN]).unwrap();
        for addr in [secp, actor, bls] {
            let s = addr.encode_with(Network::Mainnet);
            assert!(s.starts_with('f'));
            assert_eq!(s.parse::<Address>().unwrap(), addr);
            assert_eq!(Address::from_bytes(&addr.to_bytes()).unwrap(), addr);
        }
        assert_eq!(secp.protocol(), Protocol::Secp256k1);
        assert_eq!(secp.id(), Err(Error::NonIDAddress));
    }

    #[test]
    fn network_prefix() {
        let addr = Address::new_id(5);
        assert_eq!(addr.encode_with(Network::Testnet), "t05");
        assert_eq!("t05".parse::<Address>().unwrap(), addr);
        assert_eq!("x05".parse::<Address>(), Err(Error::UnknownNetwork));
    }

    #[test]
    fn bad_checksum() {
        let s = Address::new_actor(b"x").encode_with(Network::Mainnet);
        let mut tampered = s.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(tampered.parse::<Address>().is_err());
    }

    #[test]
    fn invalid_bytes() {
        assert_eq!(Address::from_bytes(&[]), Err(Error::InvalidLength));
        assert_eq!(Address::from_bytes(&[9, 1]), Err(Error::UnknownProtocol));
        assert_eq!(
            Address::from_bytes(&[1, 1, 2]),
            Err(Error::InvalidPayloadLength(2))
        );
        // Trailing bytes after the id varint.
        assert_eq!(Address::from_bytes(&[0, 1, 2]), Err(Error::InvalidPayload));
    }

    #[test]
    fn serde_as_byte_string() {
        let addr = Address::new_id(7);
        let bz = to_vec(&addr).unwrap();
        assert_eq!(bz, vec![0x42, 0x00, 0x07]);
        assert_eq!(from_slice::<Address>(&bz).unwrap(), addr);
    }
}
