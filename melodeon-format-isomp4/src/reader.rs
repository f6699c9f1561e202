// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::{decode_error, unsupported_error, Result};
use melodeon_core::formats::ParseOptions;
use melodeon_core::io::{MediaSource, ReadBytes, SourceStream, SourceStreamOptions};
use melodeon_core::meta::{CodecType, TrackMetadata};

use crate::container::ContainerWalker;

use log::{debug, warn};

/// Read the metadata of an MP4 file of `total_len` bytes starting at the current position of
/// `reader`.
///
/// The parse fails if the file does not contain an AAC or ALAC audio track with a non-empty sample
/// table and media data.
pub fn read_mp4_metadata<B: ReadBytes>(
    reader: &mut B,
    total_len: u64,
    options: &ParseOptions,
) -> Result<TrackMetadata> {
    let mut walker = ContainerWalker::new(options);

    walker.walk(reader, total_len)?;

    let mut meta = walker.into_metadata();

    if meta.samples == 0 || meta.frequency == 0 || meta.filesize == 0 {
        warn!(
            "isomp4: no audio track found (samples={}, frequency={}, filesize={})",
            meta.samples, meta.frequency, meta.filesize
        );
        return decode_error("isomp4: no audio track found");
    }

    if meta.codec == CodecType::Unknown {
        warn!("isomp4: not an aac or alac file");
        return decode_error("isomp4: not an aac or alac file");
    }

    // ALAC is always variable bitrate, and constant bitrate AAC is very rare.
    meta.vbr = true;

    let frequency = u128::from(meta.frequency);
    let length_ms = (u128::from(meta.samples) * 1000 + frequency / 2) / frequency;

    meta.length_ms = u64::try_from(length_ms).unwrap_or(u64::MAX);

    if meta.length_ms == 0 {
        warn!("isomp4: track length is invalid");
        return decode_error("isomp4: track length is invalid");
    }

    let bitrate = u128::from(meta.filesize) * 8 / u128::from(meta.length_ms);

    meta.bitrate = u32::try_from(bitrate).unwrap_or(u32::MAX);

    debug!(
        "isomp4: bitrate {} kbit/s, frequency {} Hz, length {} ms",
        meta.bitrate, meta.frequency, meta.length_ms
    );

    Ok(meta)
}

/// `Mp4MetadataReader` reads the metadata of an MP4 file from a `MediaSource`.
pub struct Mp4MetadataReader;

impl Mp4MetadataReader {
    /// Read the metadata of the MP4 file in `source`, starting at its current position.
    ///
    /// The length of the source must be known.
    pub fn read(source: Box<dyn MediaSource>, options: &ParseOptions) -> Result<TrackMetadata> {
        Mp4MetadataReader::read_with_stream_options(source, options, Default::default())
    }

    /// Like [`Mp4MetadataReader::read`], with explicit options for the buffered stream wrapping
    /// `source`.
    pub fn read_with_stream_options(
        source: Box<dyn MediaSource>,
        options: &ParseOptions,
        stream_options: SourceStreamOptions,
    ) -> Result<TrackMetadata> {
        let mut stream = SourceStream::new(source, stream_options);

        // The file spans the remainder of the source.
        let total_len = match stream.byte_len() {
            Some(len) => len.saturating_sub(stream.pos()),
            None => return unsupported_error("isomp4: source length is unknown"),
        };

        read_mp4_metadata(&mut stream, total_len, options)
    }
}
