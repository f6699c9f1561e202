// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An ISO/MP4 metadata reader for AAC and ALAC audio files.
//!
//! The reader walks the atom tree of a file once, front to back, and extracts the properties of
//! the first audio track together with the iTunes tags. No sample data is read.

mod atoms;
mod container;
mod fourcc;
mod reader;

pub use reader::{read_mp4_metadata, Mp4MetadataReader};
