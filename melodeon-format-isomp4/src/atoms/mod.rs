// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use melodeon_core::errors::Result;
use melodeon_core::io::ReadBytes;

use crate::fourcc::FourCc;

use log::warn;

pub(crate) mod alac;
pub(crate) mod chpl;
pub(crate) mod esds;
pub(crate) mod ftyp;
pub(crate) mod hdlr;
pub(crate) mod ilst;
pub(crate) mod mp4a;
pub(crate) mod stts;

pub use alac::AlacAtom;
pub use chpl::ChplAtom;
pub use esds::EsdsAtom;
pub use ftyp::FtypAtom;
pub use hdlr::{HandlerType, HdlrAtom};
pub use mp4a::Mp4aAtom;
pub use stts::SttsAtom;

/// Size of the audio sample entry fields preceding the codec configuration atom.
pub(crate) const AUDIO_SAMPLE_ENTRY_LEN: u64 = 28;

/// Atom types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AtomType {
    AlbumArtistTag,
    AlbumTag,
    ArtistTag,
    AudioSampleEntryAlac,
    AudioSampleEntryMp4a,
    ChapterList,
    CommentTag,
    ComposerTag,
    CoverTag,
    CustomGenreTag,
    DateTag,
    DiskNumberTag,
    Esds,
    FileType,
    FreeFormTag,
    GenreTag,
    GroupingTag,
    Handler,
    Media,
    MediaData,
    MediaInfo,
    Meta,
    MetaList,
    Movie,
    SampleDescription,
    SampleTable,
    TimeToSample,
    Track,
    TrackNumberTag,
    TrackTitleTag,
    UserData,
    Other([u8; 4]),
}

impl From<[u8; 4]> for AtomType {
    fn from(val: [u8; 4]) -> Self {
        match &val {
            b"alac" => AtomType::AudioSampleEntryAlac,
            b"chpl" => AtomType::ChapterList,
            b"esds" => AtomType::Esds,
            b"ftyp" => AtomType::FileType,
            b"hdlr" => AtomType::Handler,
            b"ilst" => AtomType::MetaList,
            b"mdat" => AtomType::MediaData,
            b"mdia" => AtomType::Media,
            b"meta" => AtomType::Meta,
            b"minf" => AtomType::MediaInfo,
            b"moov" => AtomType::Movie,
            b"mp4a" => AtomType::AudioSampleEntryMp4a,
            b"stbl" => AtomType::SampleTable,
            b"stsd" => AtomType::SampleDescription,
            b"stts" => AtomType::TimeToSample,
            b"trak" => AtomType::Track,
            b"udta" => AtomType::UserData,
            // Metadata Boxes
            b"----" => AtomType::FreeFormTag,
            b"aART" => AtomType::AlbumArtistTag,
            b"covr" => AtomType::CoverTag,
            b"disk" => AtomType::DiskNumberTag,
            b"gnre" => AtomType::GenreTag,
            b"trkn" => AtomType::TrackNumberTag,
            b"\xa9alb" => AtomType::AlbumTag,
            b"\xa9ART" => AtomType::ArtistTag,
            b"\xa9cmt" => AtomType::CommentTag,
            b"\xa9day" => AtomType::DateTag,
            b"\xa9gen" => AtomType::CustomGenreTag,
            b"\xa9grp" => AtomType::GroupingTag,
            b"\xa9nam" => AtomType::TrackTitleTag,
            b"\xa9wrt" => AtomType::ComposerTag,
            _ => AtomType::Other(val),
        }
    }
}

/// Common atom header.
///
/// Reading a header also charges the whole atom against the byte budget of its parent. The budget
/// never underflows: an atom that claims more bytes than its parent has left exhausts the parent.
#[derive(Copy, Clone, Debug)]
pub struct AtomHeader {
    /// The atom type.
    atom_type: AtomType,
    /// The size of the atom payload.
    data_len: u64,
}

impl AtomHeader {
    /// Size of a standard atom header.
    pub const HEADER_SIZE: u64 = 8;
    /// Size of a standard atom header with a 64-bit size.
    pub const LARGE_HEADER_SIZE: u64 = AtomHeader::HEADER_SIZE + 8;

    /// Reads an atom header from the provided `ReadBytes` given the number of bytes left in the
    /// parent. Returns the header and the number of bytes left in the parent after this atom.
    ///
    /// An atom with a declared size of 0 spans the remainder of its parent.
    ///
    /// An atom with a 64-bit size is never interpreted. Its type is cleared so that it is skipped
    /// in full.
    pub fn read<B: ReadBytes>(reader: &mut B, size_left: u64) -> Result<(AtomHeader, u64)> {
        let atom_len = u64::from(reader.read_be_u32()?);
        let atom_type = reader.read_quad_bytes()?;

        let (atom_len, header) = match atom_len {
            0 => {
                let data_len = size_left.saturating_sub(AtomHeader::HEADER_SIZE);

                (size_left, AtomHeader { atom_type: atom_type.into(), data_len })
            }
            1 => {
                let atom_len = reader.read_be_u64()?.max(AtomHeader::LARGE_HEADER_SIZE);

                warn!(
                    "isomp4: skipping {:?} atom with unsupported 64-bit size {}",
                    FourCc::new(atom_type),
                    atom_len
                );

                let data_len = atom_len - AtomHeader::LARGE_HEADER_SIZE;
                let atom_type = AtomType::Other([0; 4]);

                (atom_len, AtomHeader { atom_type, data_len })
            }
            _ => {
                if atom_len < AtomHeader::HEADER_SIZE {
                    warn!("isomp4: atom {:?} size {} is invalid", FourCc::new(atom_type), atom_len);
                }

                let atom_len = atom_len.max(AtomHeader::HEADER_SIZE);
                let data_len = atom_len - AtomHeader::HEADER_SIZE;

                (atom_len, AtomHeader { atom_type: atom_type.into(), data_len })
            }
        };

        Ok((header, size_left.saturating_sub(atom_len)))
    }

    /// Get the atom type.
    pub fn atom_type(&self) -> AtomType {
        self.atom_type
    }

    /// Get the size of the atom payload.
    pub fn data_len(&self) -> u64 {
        self.data_len
    }
}

/// An atom that is read in full from its payload.
///
/// The reader passed to `read` is scoped to the payload of the atom. Any payload the atom does not
/// read is skipped by the caller.
pub trait Atom: Sized {
    fn read<B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Self>;
}
