// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The C ABI of the call channel.
//!
//! Buffers cross the boundary as a pointer and a length. A request the bridge passes to the host
//! is only borrowed for the duration of the call. A buffer returned by either side is owned by
//! the receiver, which must hand it back to the side that allocated it, exactly once:
//!
//! - host responses are released through the host's [`ReleaseFn`] (done by [`RawBuf`]'s drop);
//! - buffers the bridge returns to the host (invoke and configuration results) are created with
//!   [`Raw::from_vec`] and must come back through the bridge's release entry point, which calls
//!   [`Raw::into_vec`].

use std::{ptr, slice};

use crate::channel::{Channel, ChannelError, HostCall};

/// A pointer and length pair, as exchanged across the C ABI.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Raw {
    pub data: *mut u8,
    pub len: usize,
}

impl Raw {
    /// The empty buffer. A host returning it from a call is treated as not responding.
    pub const fn null() -> Self {
        Raw {
            data: ptr::null_mut(),
            len: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Leaks `bytes` into a raw buffer owned by whoever receives it.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let data = Box::into_raw(boxed) as *mut u8;
        Raw { data, len }
    }

    /// Reclaims a buffer created by [`Raw::from_vec`].
    ///
    /// # Safety
    ///
    /// The buffer must have come from [`Raw::from_vec`] and must not have been reclaimed before.
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.data.is_null() {
            return Vec::new();
        }
        Box::from_raw(ptr::slice_from_raw_parts_mut(self.data, self.len)).into_vec()
    }

    /// Views the buffer without taking ownership.
    ///
    /// # Safety
    ///
    /// `data` must point to `len` readable bytes that outlive the returned slice.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        if self.data.is_null() {
            &[]
        } else {
            slice::from_raw_parts(self.data, self.len)
        }
    }
}

/// Performs one host call: call number, then the borrowed request bytes. Returns a buffer owned
/// by the bridge until it is handed back through the matching [`ReleaseFn`].
pub type CallFn = unsafe extern "C" fn(call: u32, data: *const u8, len: usize) -> Raw;

/// Hands a response buffer back to the host.
pub type ReleaseFn = unsafe extern "C" fn(buf: Raw);

/// A host response. Released back to the host when dropped.
pub struct RawBuf {
    raw: Raw,
    release: ReleaseFn,
}

impl AsRef<[u8]> for RawBuf {
    fn as_ref(&self) -> &[u8] {
        // SAFETY: the host guarantees the response stays valid until it is released, which only
        // happens in drop.
        unsafe { self.raw.as_slice() }
    }
}

impl Drop for RawBuf {
    fn drop(&mut self) {
        // SAFETY: a RawBuf is only built from a non-null host response, and drop runs once.
        unsafe { (self.release)(self.raw) }
    }
}

/// A channel to a host reached through a pair of C function pointers.
#[derive(Copy, Clone)]
pub struct FfiChannel {
    call_fn: CallFn,
    release_fn: ReleaseFn,
}

impl FfiChannel {
    /// # Safety
    ///
    /// `call_fn` must honor the ownership rules of this module, and `release_fn` must accept
    /// every non-null buffer `call_fn` returns.
    pub unsafe fn new(call_fn: CallFn, release_fn: ReleaseFn) -> Self {
        FfiChannel {
            call_fn,
            release_fn,
        }
    }
}

impl Channel for FfiChannel {
    type Buffer = RawBuf;

    fn call(&self, call: HostCall, request: &[u8]) -> Result<RawBuf, ChannelError> {
        // SAFETY: the request outlives the call, and the host does not retain it.
        let raw = unsafe { (self.call_fn)(call as u32, request.as_ptr(), request.len()) };
        if raw.is_null() {
            return Err(ChannelError::NoResponse(call));
        }
        Ok(RawBuf {
            raw,
            release: self.release_fn,
        })
    }
}
