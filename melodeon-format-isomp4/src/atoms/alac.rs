// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::atoms::{Atom, AtomHeader, AtomType, AUDIO_SAMPLE_ENTRY_LEN};

/// Apple Lossless audio sample entry.
#[derive(Debug)]
pub struct AlacAtom {
    /// The sample rate from the ALAC magic cookie, if the entry carries one.
    pub sample_rate: Option<u32>,
}

impl Atom for AlacAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        let size_left = header.data_len().saturating_sub(AUDIO_SAMPLE_ENTRY_LEN);

        // The sample entry is too short to contain a configuration atom.
        if size_left < AtomHeader::HEADER_SIZE {
            return Ok(AlacAtom { sample_rate: None });
        }

        reader.ignore_bytes(AUDIO_SAMPLE_ENTRY_LEN)?;

        let (config, _) = AtomHeader::read(reader, size_left)?;

        // The magic cookie is stored in a nested atom that is also named "alac".
        let sample_rate = match config.atom_type() {
            AtomType::AudioSampleEntryAlac if config.data_len() >= 28 => {
                // Version, flags, and the stream parameters preceding the sample rate.
                reader.ignore_bytes(24)?;
                Some(reader.read_be_u32()?)
            }
            _ => None,
        };

        Ok(AlacAtom { sample_rate })
    }
}
