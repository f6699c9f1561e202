// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::atoms::{Atom, AtomHeader};

/// Chapter timestamps are in units of 100 ns.
const CHAPTER_TIMESCALE: u128 = 10_000_000;

/// Nero chapter list atom.
///
/// Only the first chapter is read. Nero encoders store the encoder delay as the start time of the
/// first chapter.
#[derive(Debug)]
pub struct ChplAtom {
    /// Start time of the first chapter in 100 ns units.
    pub first_chapter_ts: Option<u64>,
}

impl ChplAtom {
    /// Get the encoder delay in samples at the given sample rate.
    pub fn lead_trim(&self, frequency: u32) -> Option<u32> {
        self.first_chapter_ts.map(|ts| {
            let trim = u128::from(ts) * u128::from(frequency) / CHAPTER_TIMESCALE;
            u32::try_from(trim).unwrap_or(u32::MAX)
        })
    }
}

impl Atom for ChplAtom {
    fn read<B: ReadBytes>(reader: &mut B, _header: AtomHeader) -> Result<Self> {
        // Version, flags, and reserved.
        reader.ignore_bytes(8)?;

        let chapter_count = reader.read_u8()?;

        let first_chapter_ts = match chapter_count {
            0 => None,
            _ => Some(reader.read_be_u64()?),
        };

        Ok(ChplAtom { first_chapter_ts })
    }
}
