// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io;
use std::io::SeekFrom;

use super::{MediaSource, ReadBytes};

const END_OF_STREAM_ERROR_STR: &str = "end of stream";

/// `SourceStreamOptions` specifies the buffering behaviour of a `SourceStream`.
pub struct SourceStreamOptions {
    /// The read-ahead buffer size. Must be > 0.
    pub buffer_len: usize,
}

impl Default for SourceStreamOptions {
    fn default() -> Self {
        SourceStreamOptions { buffer_len: 4 * 1024 }
    }
}

/// A `SourceStream` is the common `Read`er type for Melodeon metadata readers. It wraps and hides
/// the inner source behind a small, fixed-size read-ahead buffer so that the many tiny big-endian
/// field reads performed while walking a container do not each cost a system call.
///
/// The stream position is owned by the `SourceStream`. Skips that land within the buffered data
/// are free, while longer skips are forwarded to the inner source as a relative seek and discard
/// the buffer. Absolute seeks are never performed.
pub struct SourceStream {
    /// The source reader.
    inner: Box<dyn MediaSource>,
    /// The read-ahead buffer.
    buf: Box<[u8]>,
    /// The read position within the buffer.
    read_pos: usize,
    /// The end of the valid data within the buffer.
    end_pos: usize,
    /// Absolute position of the inner source.
    abs_pos: u64,
}

impl SourceStream {
    /// Instantiate a new `SourceStream` reading from the current position of `source`. Positions
    /// reported by the stream are absolute positions within `source`.
    pub fn new(mut source: Box<dyn MediaSource>, options: SourceStreamOptions) -> Self {
        assert!(options.buffer_len > 0);

        // A source that cannot report its position is assumed to be at its start.
        let abs_pos = source.stream_position().unwrap_or(0);

        SourceStream {
            inner: source,
            buf: vec![0; options.buffer_len].into_boxed_slice(),
            read_pos: 0,
            end_pos: 0,
            abs_pos,
        }
    }

    /// Gets the total length of the underlying source in bytes, if known.
    pub fn byte_len(&self) -> Option<u64> {
        self.inner.byte_len()
    }

    /// Get the number of bytes buffered but not yet read.
    pub fn unread_buffer_len(&self) -> usize {
        self.end_pos - self.read_pos
    }

    /// Seek relative to the current position of the stream. Returns the new absolute position.
    ///
    /// Seeks landing within the buffered data do not touch the inner source.
    pub fn seek_relative(&mut self, delta: i64) -> io::Result<u64> {
        let pos = self.pos();

        if delta >= 0 && delta as u64 <= self.unread_buffer_len() as u64 {
            self.read_pos += delta as usize;
        }
        else if delta < 0 && delta.unsigned_abs() <= self.read_pos as u64 {
            self.read_pos -= delta.unsigned_abs() as usize;
        }
        else {
            // The inner source is positioned after the buffered data. Account for the unread
            // bytes when forwarding the seek.
            let unread = self.unread_buffer_len() as i64;

            self.abs_pos = self.inner.seek(SeekFrom::Current(delta - unread))?;
            self.read_pos = 0;
            self.end_pos = 0;

            debug_assert_eq!(self.abs_pos as i128, pos as i128 + i128::from(delta));
        }

        Ok(self.pos())
    }

    /// Refill the buffer if it has been exhausted. Returns the number of bytes available.
    fn fetch(&mut self) -> io::Result<usize> {
        if self.read_pos == self.end_pos {
            let len = loop {
                match self.inner.read(&mut self.buf) {
                    Ok(len) => break len,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                }
            };

            self.read_pos = 0;
            self.end_pos = len;
            self.abs_pos += len as u64;
        }

        Ok(self.unread_buffer_len())
    }

    fn fetch_or_eof(&mut self) -> io::Result<()> {
        if self.fetch()? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, END_OF_STREAM_ERROR_STR));
        }
        Ok(())
    }
}

impl ReadBytes for SourceStream {
    #[inline(always)]
    fn read_byte(&mut self) -> io::Result<u8> {
        self.fetch_or_eof()?;

        let value = self.buf[self.read_pos];
        self.read_pos += 1;

        Ok(value)
    }

    fn read_double_bytes(&mut self) -> io::Result<[u8; 2]> {
        let mut bytes = [0; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut read = 0;

        while read < buf.len() {
            if self.fetch()? == 0 {
                break;
            }

            let count = cmp::min(self.unread_buffer_len(), buf.len() - read);

            let src = &self.buf[self.read_pos..self.read_pos + count];
            buf[read..read + count].copy_from_slice(src);

            self.read_pos += count;
            read += count;
        }

        Ok(read)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.read_buf(buf)? < buf.len() {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, END_OF_STREAM_ERROR_STR));
        }
        Ok(())
    }

    fn ignore_bytes(&mut self, count: u64) -> io::Result<()> {
        let delta = i64::try_from(count)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "skip too large"))?;

        self.seek_relative(delta)?;
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.abs_pos - self.unread_buffer_len() as u64
    }
}
