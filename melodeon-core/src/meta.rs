// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `meta` module defines the playback metadata record produced by metadata readers.

use std::fmt;

/// The codec of the audio stream, as reported by the container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CodecType {
    /// The container did not describe a supported audio codec.
    #[default]
    Unknown,
    /// MPEG-4 AAC without Spectral Band Replication.
    Aac,
    /// MPEG-4 AAC with Spectral Band Replication (HE-AAC).
    AacHe,
    /// Apple Lossless.
    Alac,
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecType::Unknown => "unknown",
            CodecType::Aac => "AAC",
            CodecType::AacHe => "AAC-HE",
            CodecType::Alac => "ALAC",
        };
        f.write_str(name)
    }
}

/// The encoding of an embedded image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
}

/// The location of embedded album art. The image itself is never copied out of the stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AlbumArt {
    /// The image encoding.
    pub image_type: ImageType,
    /// Absolute position of the first image byte in the stream.
    pub pos: u64,
    /// Length of the image in bytes.
    pub len: u64,
}

/// ReplayGain loudness normalization values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ReplayGain {
    /// Track gain in dB.
    pub track_gain: Option<f32>,
    /// Album gain in dB.
    pub album_gain: Option<f32>,
    /// Track peak as a linear amplitude.
    pub track_peak: Option<f32>,
    /// Album peak as a linear amplitude.
    pub album_peak: Option<f32>,
}

impl ReplayGain {
    /// Returns `true` if no ReplayGain value is present.
    pub fn is_empty(&self) -> bool {
        self.track_gain.is_none()
            && self.album_gain.is_none()
            && self.track_peak.is_none()
            && self.album_peak.is_none()
    }
}

/// Playback metadata for a single audio file.
///
/// A `TrackMetadata` is populated incrementally while a container is walked. Every tag field
/// follows a "first value wins" policy: once set, later occurrences of the same tag are read but
/// discarded. The derived fields (`length_ms`, `bitrate`, `vbr`) are only valid after a reader
/// returns successfully.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackMetadata {
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Album artist.
    pub album_artist: Option<String>,
    /// Album title.
    pub album: Option<String>,
    /// Composer.
    pub composer: Option<String>,
    /// Comment.
    pub comment: Option<String>,
    /// Genre, either free-text or resolved from a genre index.
    pub genre: Option<String>,
    /// Content grouping.
    pub grouping: Option<String>,
    /// The date, verbatim.
    pub year_string: Option<String>,
    /// The year parsed from the date, if it is a plausible year.
    pub year: Option<u32>,
    /// Track number.
    pub track_num: Option<u32>,
    /// Track number formatted as "number/total", only present if the total is known.
    pub track_string: Option<String>,
    /// Disc number.
    pub disc_num: Option<u32>,
    /// Disc number formatted as "number/total", only present if the total is known.
    pub disc_string: Option<String>,
    /// MusicBrainz track identifier.
    pub mb_track_id: Option<String>,
    /// The major brand of the file.
    pub file_type: Option<[u8; 4]>,
    /// The audio codec.
    pub codec: CodecType,
    /// Output sample rate in Hz.
    pub frequency: u32,
    /// Total number of output samples (per channel).
    pub samples: u64,
    /// Total size of the encoded audio payload in bytes.
    pub filesize: u64,
    /// Duration in milliseconds.
    pub length_ms: u64,
    /// Average bitrate in kbit/s.
    pub bitrate: u32,
    /// True if the stream is variable bitrate.
    pub vbr: bool,
    /// Embedded album art, if any.
    pub album_art: Option<AlbumArt>,
    /// Number of encoder delay samples to discard from the start of the decoded audio.
    pub lead_trim: u32,
    /// Number of padding samples to discard from the end of the decoded audio.
    pub tail_trim: u32,
    /// True if the sample table durations were doubled to account for SBR upsampling.
    pub needs_upsampling_correction: bool,
    /// ReplayGain values.
    pub replay_gain: ReplayGain,
}
