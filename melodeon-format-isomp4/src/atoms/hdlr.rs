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

/// Handler type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandlerType {
    /// Audio handler.
    Sound,
    /// iTunes metadata directory handler.
    MetadataDirectory,
    /// Any other handler type.
    Other([u8; 4]),
}

/// Handler atom.
#[derive(Debug)]
pub struct HdlrAtom {
    /// Handler type.
    pub handler_type: HandlerType,
}

impl Atom for HdlrAtom {
    fn read<B: ReadBytes>(reader: &mut B, _header: AtomHeader) -> Result<Self> {
        // Version and flags, then the QuickTime component type.
        reader.ignore_bytes(8)?;

        let hdlr = reader.read_quad_bytes()?;

        debug!("isomp4: handler {:?}", FourCc::new(hdlr));

        let handler_type = match &hdlr {
            b"soun" => HandlerType::Sound,
            b"mdir" => HandlerType::MetadataDirectory,
            _ => HandlerType::Other(hdlr),
        };

        Ok(HdlrAtom { handler_type })
    }
}
