// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ReplayGain key/value tag parsing.

use lazy_static::lazy_static;
use log::debug;
use melodeon_core::meta::ReplayGain;
use regex_lite::Regex;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ReplayGainKey {
    TrackGain,
    AlbumGain,
    TrackPeak,
    AlbumPeak,
}

lazy_static! {
    // Matches the leading decimal number of a value such as "-6.54 dB", "+1.2", or ".98765".
    static ref VALUE_RE: Regex =
        Regex::new(r"^\s*(?P<val>[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))").unwrap();
}

fn replaygain_key(key: &str) -> Option<ReplayGainKey> {
    let key = key.to_ascii_lowercase();

    match key.as_str() {
        "replaygain_track_gain" | "rg_radio" => Some(ReplayGainKey::TrackGain),
        "replaygain_album_gain" | "rg_audiophile" => Some(ReplayGainKey::AlbumGain),
        "replaygain_track_peak" | "rg_peak" => Some(ReplayGainKey::TrackPeak),
        "replaygain_album_peak" => Some(ReplayGainKey::AlbumPeak),
        _ => None,
    }
}

fn parse_value(value: &str) -> Option<f32> {
    VALUE_RE
        .captures(value)
        .and_then(|caps| caps.name("val"))
        .and_then(|val| val.as_str().parse::<f32>().ok())
        .filter(|val| val.is_finite())
}

/// Parse a ReplayGain tag given its key and value, and store it in `gain`.
///
/// Gains are in dB and may carry a "dB" suffix. Peaks are linear amplitudes. The key is matched
/// without regard to ASCII case. If the field is already set, the new value is discarded.
///
/// Returns `true` if the key is a ReplayGain key, whether or not the value was stored.
pub fn parse_replaygain(key: &str, value: &str, gain: &mut ReplayGain) -> bool {
    let field = match replaygain_key(key) {
        Some(ReplayGainKey::TrackGain) => &mut gain.track_gain,
        Some(ReplayGainKey::AlbumGain) => &mut gain.album_gain,
        Some(ReplayGainKey::TrackPeak) => &mut gain.track_peak,
        Some(ReplayGainKey::AlbumPeak) => &mut gain.album_peak,
        None => return false,
    };

    if field.is_none() {
        match parse_value(value) {
            Some(parsed) => *field = Some(parsed),
            None => debug!("replaygain: ignoring malformed value for {}: {:?}", key, value),
        }
    }

    true
}
