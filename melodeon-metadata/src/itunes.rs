// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! iTunes metadata support.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex_lite::Regex;

/// Free-form (`----`) tag names with a dedicated meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FreeformKey {
    /// Composer.
    Composer,
    /// iTunes gapless playback information (encoder delay and padding).
    GaplessInfo,
    /// MusicBrainz track identifier.
    MusicBrainzTrackId,
    /// Album artist.
    AlbumArtist,
}

lazy_static! {
    static ref FREEFORM_KEY_MAP: HashMap<&'static str, FreeformKey> = {
        let mut m = HashMap::new();
        m.insert("composer", FreeformKey::Composer);
        m.insert("iTunSMPB", FreeformKey::GaplessInfo);
        m.insert("musicbrainz track id", FreeformKey::MusicBrainzTrackId);
        m.insert("album artist", FreeformKey::AlbumArtist);
        m
    };
}

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"^\s*(?P<year>[0-9]{1,9})").unwrap();
}

/// The first year accepted as a plausible release year.
const MIN_YEAR: u32 = 1900;

/// Try to map a free-form tag name to a `FreeformKey`. Matching is case-sensitive.
pub fn freeform_key(name: &str) -> Option<FreeformKey> {
    FREEFORM_KEY_MAP.get(name).copied()
}

/// Decode the hexadecimal field at `index` of an `iTunSMPB` value.
///
/// The value is a sequence of whitespace-separated hexadecimal numbers. Field 1 is the encoder
/// delay and field 2 is the padding, both in samples. Parsing stops at the first character that
/// is not a hexadecimal digit. A missing or malformed field decodes as 0.
pub fn smpb_field(value: &str, index: usize) -> u32 {
    value
        .split_ascii_whitespace()
        .nth(index)
        .map(|field| {
            field
                .chars()
                .map_while(|c| c.to_digit(16))
                .fold(0u32, |acc, digit| acc.wrapping_shl(4) | digit)
        })
        .unwrap_or(0)
}

/// Parse the leading year of a date string such as "2005" or "2005-03-01T08:00:00Z".
///
/// Years before 1900 are not plausible release years and are treated as absent.
pub fn year_from_date(date: &str) -> Option<u32> {
    YEAR_RE
        .captures(date)
        .and_then(|caps| caps.name("year"))
        .and_then(|year| year.as_str().parse::<u32>().ok())
        .filter(|&year| year >= MIN_YEAR)
}
