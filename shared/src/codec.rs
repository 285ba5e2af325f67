// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! Stream codec support for the domain types that have their own byte layout.

use actor_bridge_encoding::{Decoder, Encoder, Error};
use num_bigint::BigInt;

use crate::address::Address;
use crate::bigint::{from_sign_magnitude, to_sign_magnitude};
use crate::crypto::signature::Signature;
use crate::econ::TokenAmount;
use crate::error::ExitCode;

/// Writers for domain values on top of the primitive [`Encoder`].
pub trait EncoderExt {
    /// A big integer as a sign-magnitude byte string.
    fn big(&mut self, value: &BigInt) -> &mut Self;
    fn token(&mut self, value: &TokenAmount) -> &mut Self;
    /// An address as a byte string of its protocol byte and payload.
    fn addr(&mut self, value: &Address) -> &mut Self;
    /// A signature as a byte string of its type byte and the signature bytes.
    fn signature(&mut self, value: &Signature) -> &mut Self;
    fn exit_code(&mut self, value: ExitCode) -> &mut Self;
}

impl EncoderExt for Encoder {
    fn big(&mut self, value: &BigInt) -> &mut Self {
        self.bytes(&to_sign_magnitude(value))
    }

    fn token(&mut self, value: &TokenAmount) -> &mut Self {
        self.big(value.atto())
    }

    fn addr(&mut self, value: &Address) -> &mut Self {
        self.bytes(&value.to_bytes())
    }

    fn signature(&mut self, value: &Signature) -> &mut Self {
        self.bytes(&value.to_bytes())
    }

    fn exit_code(&mut self, value: ExitCode) -> &mut Self {
        self.int(value.value() as i64)
    }
}

/// Readers mirroring [`EncoderExt`].
pub trait DecoderExt {
    fn big(&mut self) -> Result<BigInt, Error>;
    fn token(&mut self) -> Result<TokenAmount, Error>;
    fn addr(&mut self) -> Result<Address, Error>;
    fn signature(&mut self) -> Result<Signature, Error>;
    fn exit_code(&mut self) -> Result<ExitCode, Error>;
}

impl<'a> DecoderExt for Decoder<'a> {
    fn big(&mut self) -> Result<BigInt, Error> {
        from_sign_magnitude(self.bytes()?).map_err(Error::InvalidValue)
    }

    fn token(&mut self) -> Result<TokenAmount, Error> {
        self.big().map(TokenAmount::from_atto)
    }

    fn addr(&mut self) -> Result<Address, Error> {
        Address::from_bytes(self.bytes()?).map_err(|e| Error::InvalidValue(e.to_string()))
    }

    fn signature(&mut self) -> Result<Signature, Error> {
        Signature::from_bytes(self.bytes()?).map_err(Error::InvalidValue)
    }

    fn exit_code(&mut self) -> Result<ExitCode, Error> {
        let code = i32::try_from(self.int()?).map_err(|_| Error::Overflow)?;
        Ok(ExitCode::new(code))
    }
}
