// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io;

use super::{FiniteStream, ReadBytes};

/// A `ScopedStream` restricts the number of bytes that may be read to an upper limit.
///
/// Every byte consumed through the scoped stream, whether read or ignored, is deducted from the
/// limit, so [`FiniteStream::bytes_available`] is always the unconsumed remainder of the scope.
///
/// A read that would cross the limit fails without touching the inner stream, and is remembered so
/// that it can be told apart from an error of the inner stream.
pub struct ScopedStream<B: ReadBytes> {
    inner: B,
    len: u64,
    read: u64,
    out_of_bounds: bool,
}

impl<B: ReadBytes> ScopedStream<B> {
    /// Instantiates a new `ScopedStream` with an upper limit on the number of bytes that can be
    /// read from the inner source.
    pub fn new(inner: B, len: u64) -> Self {
        ScopedStream { inner, len, read: 0, out_of_bounds: false }
    }

    /// Returns `true` if a read was refused because it would have crossed the limit.
    pub fn is_out_of_bounds(&self) -> bool {
        self.out_of_bounds
    }

    #[inline(always)]
    fn out_of_bounds_error<T>(&mut self) -> io::Result<T> {
        self.out_of_bounds = true;
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "out of bounds"))
    }

    /// Ignores the remainder of the `ScopedStream`.
    pub fn ignore(&mut self) -> io::Result<()> {
        let remaining = self.len - self.read;
        self.read = self.len;
        self.inner.ignore_bytes(remaining)
    }
}

impl<B: ReadBytes> FiniteStream for ScopedStream<B> {
    /// Returns the length of the the `ScopedStream`.
    fn byte_len(&self) -> u64 {
        self.len
    }

    /// Returns the number of bytes read.
    fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Returns the number of bytes available to read.
    fn bytes_available(&self) -> u64 {
        self.len - self.read
    }
}

impl<B: ReadBytes> ReadBytes for ScopedStream<B> {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        if self.len - self.read < 1 {
            return self.out_of_bounds_error();
        }

        self.read += 1;
        self.inner.read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        if self.len - self.read < 2 {
            return self.out_of_bounds_error();
        }

        self.read += 2;
        self.inner.read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        if self.len - self.read < 4 {
            return self.out_of_bounds_error();
        }

        self.read += 4;
        self.inner.read_quad_bytes()
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Limit read_buf() to the remainder of the scoped bytes if buf has a greater length.
        let scoped_len = cmp::min(self.len - self.read, buf.len() as u64) as usize;
        let result = self.inner.read_buf(&mut buf[0..scoped_len])?;
        self.read += result as u64;
        Ok(result)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.len - self.read < buf.len() as u64 {
            return self.out_of_bounds_error();
        }

        self.read += buf.len() as u64;
        self.inner.read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        if self.len - self.read < count {
            return self.out_of_bounds_error();
        }

        self.read += count;
        self.inner.ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.inner.pos()
    }
}

#[cfg(test)]
mod tests {
    use super::ScopedStream;
    use crate::io::{BufReader, FiniteStream, ReadBytes};

    #[test]
    fn verify_scope_limits_reads() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut reader = BufReader::new(&data);

        {
            let mut scoped = ScopedStream::new(&mut reader, 5);

            assert_eq!(scoped.read_u8().unwrap(), 0);
            assert!(scoped.read_be_u32().is_ok());
            assert_eq!(scoped.bytes_available(), 0);
            assert!(!scoped.is_out_of_bounds());
            assert!(scoped.read_u8().is_err());
            assert!(scoped.is_out_of_bounds());
        }

        assert_eq!(reader.read_u8().unwrap(), 5);
    }

    #[test]
    fn verify_short_buffered_read_is_clamped_to_scope() {
        let data = [9u8; 16];
        let mut reader = BufReader::new(&data);
        let mut scoped = ScopedStream::new(&mut reader, 3);
        let mut buf = [0u8; 8];

        assert_eq!(scoped.read_buf(&mut buf).unwrap(), 3);
        assert_eq!(scoped.bytes_read(), 3);
        assert_eq!(scoped.pos(), 3);
        assert!(!scoped.is_out_of_bounds());
    }

    #[test]
    fn verify_inner_end_of_stream_is_not_out_of_bounds() {
        let data = [0u8, 1];
        let mut reader = BufReader::new(&data);
        let mut scoped = ScopedStream::new(&mut reader, 8);

        assert!(scoped.read_be_u32().is_err());
        assert!(!scoped.is_out_of_bounds());
    }
}
