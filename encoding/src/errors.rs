// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

use crate::Major;

/// A malformed encoding. Returned whenever a buffer cannot be interpreted as the value the
/// caller asked for: it is truncated, carries a different major type, or holds data outside of
/// the supported subset. A decoder never returns a partial value alongside this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("malformed encoding: unexpected end of input")]
    Truncated,
    #[error("malformed encoding: expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: Major,
    },
    #[error("malformed encoding: integer out of range")]
    Overflow,
    #[error("malformed encoding: text is not valid utf-8")]
    InvalidUtf8,
    #[error("malformed encoding: invalid cid: {0}")]
    InvalidCid(String),
    #[error("malformed encoding: invalid value: {0}")]
    InvalidValue(String),
    #[error("malformed encoding: unsupported {0}")]
    Unsupported(&'static str),
    #[error("malformed encoding: nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("malformed encoding: {0} trailing bytes")]
    TrailingBytes(usize),
    #[error("serialization error: {0}")]
    Serde(String),
}
