// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `formats` module provides the options common to all metadata readers.

/// `ParseOptions` is a common set of options that all metadata readers use.
#[derive(Copy, Clone, Debug)]
pub struct ParseOptions {
    /// The capacity in bytes of the scratch arena from which all extracted strings are carved.
    ///
    /// Default: `2168`.
    pub scratch_len: usize,
    /// The maximum stored length of a single string tag, including its terminator.
    ///
    /// Default: `240`.
    pub max_item_len: usize,
    /// Assume Spectral Band Replication for AAC streams at or below 24 kHz that do not signal it
    /// explicitly. Disable when the playback decoder has no SBR support.
    ///
    /// Default: `true`.
    pub implicit_sbr: bool,
    /// Locate embedded album art.
    ///
    /// Default: `true`.
    pub read_album_art: bool,
}

impl ParseOptions {
    /// The default scratch capacity: a 1800 byte tag buffer followed by four 92 byte legacy tag
    /// buffers.
    pub const DEFAULT_SCRATCH_LEN: usize = 1800 + 4 * 92;

    /// The default maximum string tag length.
    pub const DEFAULT_MAX_ITEM_LEN: usize = 240;
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            scratch_len: ParseOptions::DEFAULT_SCRATCH_LEN,
            max_item_len: ParseOptions::DEFAULT_MAX_ITEM_LEN,
            implicit_sbr: true,
            read_album_art: true,
        }
    }
}
