// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! This crate implements format-independent helpers shared by the container metadata readers.
//!
//! Tags in a container are usually encoded in a container-specific way, but their values often
//! follow conventions inherited from other metadata formats: genres are indexed into the ID3v1
//! genre table, iTunes stores gapless playback information in a hexadecimal string, and
//! ReplayGain values are free-form key/value pairs. Each of these conventions is implemented in
//! a separate module.

pub mod id3v1;
pub mod itunes;
pub mod replaygain;
