// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::atoms::{Atom, AtomHeader};
use crate::fourcc::FourCc;

use log::debug;

/// File type atom.
#[derive(Debug)]
pub struct FtypAtom {
    /// The major brand, for example `M4A `, `M4B `, `mp42`, or `isom`.
    pub major_brand: [u8; 4],
}

impl Atom for FtypAtom {
    fn read<B: ReadBytes>(reader: &mut B, _header: AtomHeader) -> Result<Self> {
        let major_brand = reader.read_quad_bytes()?;

        // The minor version and compatible brands are not used.
        debug!("isomp4: file type {:?}", FourCc::new(major_brand));

        Ok(FtypAtom { major_brand })
    }
}
