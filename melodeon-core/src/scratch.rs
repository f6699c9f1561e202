// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A fixed-capacity scratch arena for tag values.
//!
//! Metadata readers targeting memory constrained players bound the total amount of tag text they
//! keep per file. A [`ScratchArena`] is a bump allocator over a fixed buffer: values are read
//! into its free tail, and are only committed (and copied out as owned strings) if they are kept.
//! An allocation that does not fit is refused; the arena never grows.

use log::debug;

/// A bump-allocated, fixed-capacity byte arena.
pub struct ScratchArena {
    buf: Box<[u8]>,
    used: usize,
}

impl ScratchArena {
    /// Instantiate a new arena with a fixed capacity in bytes.
    pub fn new(capacity: usize) -> Self {
        ScratchArena { buf: vec![0; capacity].into_boxed_slice(), used: 0 }
    }

    /// The number of bytes committed so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// The number of bytes that may still be committed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.used
    }

    /// Get the uncommitted tail of the arena. Data written here is discarded unless committed.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.used..]
    }

    /// Commit a NUL-terminated string from the first `filled` bytes of the spare region.
    ///
    /// The string ends at the first NUL byte, or after `filled` bytes, and is truncated such that
    /// the string plus its terminator occupy at most `max_len` bytes. The terminator is committed
    /// along with the string. Returns `None`, committing nothing, if `filled` is 0 or the string
    /// does not fit.
    pub fn commit_cstr(&mut self, filled: usize, max_len: usize) -> Option<String> {
        if filled == 0 || max_len == 0 {
            return None;
        }

        let spare = &self.buf[self.used..];
        let len = cstr_len(spare, filled, max_len);

        if len > spare.len() {
            debug!("scratch: no room for a {} byte string", len);
            return None;
        }

        let text = String::from_utf8_lossy(&spare[..len - 1]).into_owned();

        self.buf[self.used + len - 1] = 0;
        self.used += len;

        Some(text)
    }

    /// Decode a NUL-terminated string from the first `filled` bytes of the spare region without
    /// committing it. Truncation follows the same rules as [`ScratchArena::commit_cstr`].
    pub fn peek_cstr(&self, filled: usize, max_len: usize) -> Option<String> {
        if filled == 0 || max_len == 0 {
            return None;
        }

        let spare = &self.buf[self.used..];
        let len = cstr_len(spare, filled, max_len).min(spare.len() + 1);

        Some(String::from_utf8_lossy(&spare[..len - 1]).into_owned())
    }

    /// Copy a string, plus a NUL terminator, into the arena. Returns `None`, committing nothing,
    /// if it does not fit.
    pub fn alloc_str(&mut self, value: &str) -> Option<String> {
        let len = value.len() + 1;

        if len > self.remaining() {
            debug!("scratch: no room for a {} byte string", len);
            return None;
        }

        let start = self.used;
        self.buf[start..start + len - 1].copy_from_slice(value.as_bytes());
        self.buf[start + len - 1] = 0;
        self.used += len;

        Some(value.to_owned())
    }
}

/// The length of the string at the start of `buf`, plus its terminator, limited to `max_len`.
fn cstr_len(buf: &[u8], filled: usize, max_len: usize) -> usize {
    let filled = filled.min(buf.len());
    let text_len = buf[..filled].iter().position(|&b| b == 0).unwrap_or(filled);

    (text_len + 1).min(max_len)
}
