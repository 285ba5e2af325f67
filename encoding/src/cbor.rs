// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use cid::Cid;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{from_slice, to_vec, Error, CID_TAG};

/// The maximum nesting of arrays, maps and tags a [`Decoder`] will walk through.
pub const MAX_NESTING: usize = 64;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;

/// The major type carried in the top three bits of every header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Major {
    UnsignedInt = 0,
    NegativeInt = 1,
    Bytes = 2,
    Text = 3,
    Array = 4,
    Map = 5,
    Tag = 6,
    Simple = 7,
}

impl Major {
    fn from_header(byte: u8) -> Major {
        match byte >> 5 {
            0 => Major::UnsignedInt,
            1 => Major::NegativeInt,
            2 => Major::Bytes,
            3 => Major::Text,
            4 => Major::Array,
            5 => Major::Map,
            6 => Major::Tag,
            _ => Major::Simple,
        }
    }
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Major::UnsignedInt => "unsigned integer",
            Major::NegativeInt => "negative integer",
            Major::Bytes => "byte string",
            Major::Text => "text string",
            Major::Array => "array",
            Major::Map => "map",
            Major::Tag => "tag",
            Major::Simple => "simple value",
        })
    }
}

/// A streaming encoder writing into one growing buffer.
///
/// Every method appends exactly one value (or one array header) and returns the encoder, so a
/// frame can be built by threading calls:
///
/// ```
/// use actor_bridge_encoding::Encoder;
///
/// let mut enc = Encoder::new();
/// enc.uint(7).int(-1).bytes(b"seed").bool(true);
/// assert_eq!(enc.into_bytes(), vec![0x07, 0x20, 0x44, b's', b'e', b'e', b'd', 0xf5]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn header(&mut self, major: Major, value: u64) -> &mut Self {
        let major = (major as u8) << 5;
        if value < 24 {
            self.buf.push(major | value as u8);
        } else if value <= u8::MAX as u64 {
            self.buf.push(major | 24);
            self.buf.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.buf.push(major | 25);
            self.buf.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.buf.push(major | 26);
            self.buf.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buf.push(major | 27);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
        self
    }

    pub fn uint(&mut self, value: u64) -> &mut Self {
        self.header(Major::UnsignedInt, value)
    }

    /// Writes a signed integer. Negative values are written as `-(n+1)` under the negative
    /// integer major type, so zero only has the unsigned representation.
    pub fn int(&mut self, value: i64) -> &mut Self {
        if value >= 0 {
            self.header(Major::UnsignedInt, value as u64)
        } else {
            self.header(Major::NegativeInt, (-1 - value) as u64)
        }
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.header(Major::Bytes, value.len() as u64);
        self.buf.extend_from_slice(value);
        self
    }

    pub fn text(&mut self, value: &str) -> &mut Self {
        self.header(Major::Text, value.len() as u64);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.push(if value { TRUE } else { FALSE });
        self
    }

    pub fn null(&mut self) -> &mut Self {
        self.buf.push(NULL);
        self
    }

    /// Writes an array header. The caller must follow it with exactly `len` values.
    pub fn array(&mut self, len: usize) -> &mut Self {
        self.header(Major::Array, len as u64)
    }

    /// Writes a content identifier as tag 42 over `0x00 || cid`, the DAG-CBOR link form.
    pub fn cid(&mut self, cid: &Cid) -> &mut Self {
        let mut bytes = Vec::with_capacity(cid.encoded_len() + 1);
        bytes.push(0);
        bytes.extend_from_slice(&cid.to_bytes());
        self.header(Major::Tag, CID_TAG);
        self.bytes(&bytes)
    }

    /// Appends bytes that already hold exactly one encoded value.
    pub fn raw(&mut self, encoded: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(encoded);
        self
    }

    /// Appends a structured value, serialized as DAG-CBOR.
    pub fn value<T>(&mut self, value: &T) -> Result<&mut Self, Error>
    where
        T: Serialize + ?Sized,
    {
        let encoded = to_vec(value)?;
        Ok(self.raw(&encoded))
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl From<Encoder> for Vec<u8> {
    fn from(enc: Encoder) -> Vec<u8> {
        enc.buf
    }
}

/// A streaming decoder over a borrowed buffer. Values are read in the order they were written.
///
/// A failed read leaves the decoder in an unspecified position; callers are expected to give up
/// on the whole buffer.
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: 0 }
    }

    /// Number of bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails unless every byte of the input has been consumed.
    pub fn finish(self) -> Result<(), Error> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < n {
            return Err(Error::Truncated);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn peek_major(&self) -> Result<Major, Error> {
        self.buf
            .get(self.pos)
            .map(|b| Major::from_header(*b))
            .ok_or(Error::Truncated)
    }

    /// Reads a header, returning its major type and argument.
    fn header(&mut self) -> Result<(Major, u64), Error> {
        let first = self.take(1)?[0];
        let major = Major::from_header(first);
        let info = first & 0x1f;
        let value = match info {
            0..=23 => info as u64,
            24 => self.take(1)?[0] as u64,
            25 => u16::from_be_bytes([self.take(1)?[0], self.take(1)?[0]]) as u64,
            26 => {
                let mut be = [0u8; 4];
                be.copy_from_slice(self.take(4)?);
                u32::from_be_bytes(be) as u64
            }
            27 => {
                let mut be = [0u8; 8];
                be.copy_from_slice(self.take(8)?);
                u64::from_be_bytes(be)
            }
            31 => return Err(Error::Unsupported("indefinite length")),
            _ => return Err(Error::Unsupported("reserved header")),
        };
        Ok((major, value))
    }

    fn expect(&mut self, expected: Major, name: &'static str) -> Result<u64, Error> {
        let (major, value) = self.header()?;
        if major != expected {
            return Err(Error::UnexpectedType {
                expected: name,
                found: major,
            });
        }
        Ok(value)
    }

    fn length(&self, len: u64) -> Result<usize, Error> {
        let len = usize::try_from(len).map_err(|_| Error::Overflow)?;
        if len > self.remaining() {
            return Err(Error::Truncated);
        }
        Ok(len)
    }

    pub fn uint(&mut self) -> Result<u64, Error> {
        self.expect(Major::UnsignedInt, "unsigned integer")
    }

    /// Reads a signed integer written under either integer major type.
    pub fn int(&mut self) -> Result<i64, Error> {
        let (major, value) = self.header()?;
        match major {
            Major::UnsignedInt => i64::try_from(value).map_err(|_| Error::Overflow),
            Major::NegativeInt => i64::try_from(value)
                .map(|n| -1 - n)
                .map_err(|_| Error::Overflow),
            found => Err(Error::UnexpectedType {
                expected: "integer",
                found,
            }),
        }
    }

    pub fn bytes(&mut self) -> Result<&'a [u8], Error> {
        let len = self.expect(Major::Bytes, "byte string")?;
        let len = self.length(len)?;
        self.take(len)
    }

    pub fn text(&mut self) -> Result<&'a str, Error> {
        let len = self.expect(Major::Text, "text string")?;
        let len = self.length(len)?;
        std::str::from_utf8(self.take(len)?).map_err(|_| Error::InvalidUtf8)
    }

    pub fn bool(&mut self) -> Result<bool, Error> {
        match self.take(1)?[0] {
            FALSE => Ok(false),
            TRUE => Ok(true),
            other => Err(Error::UnexpectedType {
                expected: "boolean",
                found: Major::from_header(other),
            }),
        }
    }

    /// Consumes a null if one is next, returning whether it did.
    pub fn null(&mut self) -> Result<bool, Error> {
        match self.buf.get(self.pos) {
            Some(&NULL) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::Truncated),
        }
    }

    /// Reads an array header and returns the number of elements that follow.
    pub fn array(&mut self) -> Result<usize, Error> {
        let len = self.expect(Major::Array, "array")?;
        // Every element takes at least one byte.
        self.length(len)
    }

    pub fn cid(&mut self) -> Result<Cid, Error> {
        let tag = self.expect(Major::Tag, "cid")?;
        if tag != CID_TAG {
            return Err(Error::InvalidCid(format!("unexpected tag {}", tag)));
        }
        match self.bytes()? {
            [0, rest @ ..] => Cid::try_from(rest).map_err(|e| Error::InvalidCid(e.to_string())),
            _ => Err(Error::InvalidCid("missing multibase prefix".into())),
        }
    }

    /// Skips exactly one value, including everything nested in it.
    pub fn skip(&mut self) -> Result<(), Error> {
        self.skip_nested(0)
    }

    fn skip_nested(&mut self, depth: usize) -> Result<(), Error> {
        if depth > MAX_NESTING {
            return Err(Error::TooDeep(MAX_NESTING));
        }
        let (major, value) = self.header()?;
        match major {
            Major::UnsignedInt | Major::NegativeInt | Major::Simple => Ok(()),
            Major::Bytes | Major::Text => {
                let len = self.length(value)?;
                self.take(len).map(|_| ())
            }
            Major::Array => {
                for _ in 0..self.length(value)? {
                    self.skip_nested(depth + 1)?;
                }
                Ok(())
            }
            Major::Map => {
                let entries = self.length(value)?;
                for _ in 0..entries {
                    self.skip_nested(depth + 1)?;
                    self.skip_nested(depth + 1)?;
                }
                Ok(())
            }
            Major::Tag => self.skip_nested(depth + 1),
        }
    }

    /// Returns the raw bytes of the next value without interpreting them.
    pub fn raw(&mut self) -> Result<&'a [u8], Error> {
        let start = self.pos;
        self.skip()?;
        Ok(&self.buf[start..self.pos])
    }

    /// Reads the next value as a structured, DAG-CBOR encoded value.
    pub fn value<T>(&mut self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        from_slice(self.raw()?)
    }

    /// Returns the major type of the next value without consuming it.
    pub fn peek(&self) -> Result<Major, Error> {
        self.peek_major()
    }
}
