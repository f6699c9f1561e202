// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::atoms::{Atom, AtomHeader};

use log::warn;

/// The largest frame duration, in samples, of an HE-AAC stream that still reports the duration of
/// the core AAC stream.
const MAX_CORE_FRAME_LEN: u32 = 1024;

#[derive(Debug)]
pub struct SampleDurationEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// Time-to-sample atom.
#[derive(Debug)]
pub struct SttsAtom {
    pub entries: Vec<SampleDurationEntry>,
}

impl SttsAtom {
    /// Get the total number of samples described by the atom.
    ///
    /// If `upsampled` is `true`, the stream is HE-AAC and its output sample rate is double that of
    /// the core AAC stream. Frame durations of up-to 1024 samples then describe the core stream and
    /// are doubled. Returns the total, and `true` if any duration was doubled.
    pub fn total_samples(&self, upsampled: bool) -> (u64, bool) {
        let mut total = 0u64;
        let mut corrected = false;

        for entry in &self.entries {
            let mut delta = entry.sample_delta;

            if upsampled && delta <= MAX_CORE_FRAME_LEN {
                delta *= 2;
                corrected = true;
            }

            total = total.saturating_add(u64::from(entry.sample_count) * u64::from(delta));
        }

        (total, corrected)
    }
}

impl Atom for SttsAtom {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self> {
        // Version and flags.
        reader.ignore_bytes(4)?;

        let mut entry_count = reader.read_be_u32()?;

        // Do not trust the entry count to allocate.
        let max_entry_count = header.data_len().saturating_sub(8) / 8;
        let max_entry_count = u32::try_from(max_entry_count).unwrap_or(u32::MAX);

        if entry_count > max_entry_count {
            warn!("isomp4: stts entry count {} exceeds atom size", entry_count);
            entry_count = max_entry_count;
        }

        let mut entries = Vec::with_capacity(entry_count as usize);

        for _ in 0..entry_count {
            let sample_count = reader.read_be_u32()?;
            let sample_delta = reader.read_be_u32()?;

            entries.push(SampleDurationEntry { sample_count, sample_delta });
        }

        Ok(SttsAtom { entries })
    }
}
