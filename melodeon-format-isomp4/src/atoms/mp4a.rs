// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::atoms::{Atom, AtomHeader, AtomType, EsdsAtom, AUDIO_SAMPLE_ENTRY_LEN};

/// MPEG-4 audio sample entry.
#[derive(Debug)]
pub struct Mp4aAtom {
    /// The elementary stream descriptor, if it directly follows the sample entry fields.
    pub esds: Option<EsdsAtom>,
}

impl Atom for Mp4aAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        let size_left = header.data_len().saturating_sub(AUDIO_SAMPLE_ENTRY_LEN);

        // The sample entry is too short to contain a configuration atom.
        if size_left < AtomHeader::HEADER_SIZE {
            return Ok(Mp4aAtom { esds: None });
        }

        reader.ignore_bytes(AUDIO_SAMPLE_ENTRY_LEN)?;

        let (esds, _) = AtomHeader::read(reader, size_left)?;

        let esds = match esds.atom_type() {
            AtomType::Esds => {
                // The descriptors may not extend past the sample entry.
                let size_left = size_left.saturating_sub(AtomHeader::HEADER_SIZE);
                Some(EsdsAtom::read(reader, cmp::min(esds.data_len(), size_left)))
            }
            _ => None,
        };

        Ok(Mp4aAtom { esds })
    }
}
