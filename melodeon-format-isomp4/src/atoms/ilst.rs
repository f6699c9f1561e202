// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading of the iTunes metadata list (`ilst`) atom.
//!
//! Every tag atom in the list wraps its value in a `data` atom. The 16 byte `data` header (atom
//! header, data type, and locale) is skipped, and the value is interpreted according to the tag.
//!
//! Strings are carved out of the scratch arena. The first value of a tag wins: later occurrences
//! of the same tag are read, to stay positioned, but are discarded.

use std::cmp;

use melodeon_core::errors::{Error, Result};
use melodeon_core::formats::ParseOptions;
use melodeon_core::io::{FiniteStream, ReadBytes, ScopedStream};
use melodeon_core::meta::{AlbumArt, ImageType, TrackMetadata};
use melodeon_core::scratch::ScratchArena;
use melodeon_metadata::id3v1;
use melodeon_metadata::itunes::{self, FreeformKey};
use melodeon_metadata::replaygain::parse_replaygain;

use crate::atoms::{AtomHeader, AtomType};

use log::{debug, warn};

/// Size of the `data` atom header preceding every tag value.
const DATA_HEADER_LEN: u64 = 16;

/// Free-form tag names are truncated to this length.
const MAX_TAG_NAME_LEN: usize = 31;

/// Size of the buffer an `iTunSMPB` value is read into, including the terminator.
const MAX_SMPB_VALUE_LEN: usize = 128;

const JPEG_SIGNATURE: &[u8] = b"\xff\xd8\xff\xe0";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Decode a NUL-terminated string.
fn c_str_lossy(buf: &[u8]) -> String {
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

/// Read up-to `buf.len()` bytes of a tag value. Returns the number of bytes read, or 0 if the
/// value is empty or could not be read in full.
fn read_tag_data<B: ReadBytes + FiniteStream>(reader: &mut B, buf: &mut [u8]) -> Result<usize> {
    if reader.bytes_available() < DATA_HEADER_LEN {
        return Ok(0);
    }

    reader.ignore_bytes(DATA_HEADER_LEN)?;

    let len = cmp::min(reader.bytes_available(), buf.len() as u64) as usize;

    match reader.read_buf(&mut buf[..len])? {
        read if read == len => Ok(read),
        _ => Ok(0),
    }
}

/// Read a string tag into the scratch arena, and store it in `dest` if it is not already set.
fn read_string_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    arena: &mut ScratchArena,
    max_item_len: usize,
    dest: &mut Option<String>,
) -> Result<()> {
    // Leave room for the terminator.
    let spare = arena.spare_mut();
    let spare_len = spare.len().saturating_sub(1);

    let read = read_tag_data(reader, &mut spare[..spare_len])?;

    if read > 0 && dest.is_none() {
        *dest = arena.commit_cstr(read, max_item_len);
    }

    Ok(())
}

/// Read an ID3v1 genre index.
fn read_genre_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    genre: &mut Option<String>,
) -> Result<()> {
    let mut buf = [0; 2];

    if read_tag_data(reader, &mut buf)? == buf.len() && genre.is_none() {
        *genre = id3v1::genre_name_one_based(u16::from_be_bytes(buf)).map(String::from);
    }

    Ok(())
}

/// Read an "m of n" tag such as the track or disc number. A "m/n" string is only generated if the
/// total is known.
fn read_m_of_n_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    arena: &mut ScratchArena,
    num: &mut Option<u32>,
    num_string: &mut Option<String>,
) -> Result<()> {
    // Reserved, number, and total. Track numbers carry 2 more reserved bytes which are ignored.
    let mut buf = [0; 6];

    if read_tag_data(reader, &mut buf)? != buf.len() || num.is_some() {
        return Ok(());
    }

    let m = u16::from_be_bytes([buf[2], buf[3]]);
    let n = u16::from_be_bytes([buf[4], buf[5]]);

    *num = Some(u32::from(m));

    if n > 0 {
        *num_string = arena.alloc_str(&format!("{}/{}", m, n));
    }

    Ok(())
}

/// Locate embedded album art. Only the signature of the image is read.
fn read_cover_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    album_art: &mut Option<AlbumArt>,
) -> Result<()> {
    if album_art.is_some() {
        return Ok(());
    }

    let pos = reader.pos() + DATA_HEADER_LEN;
    let len = reader.bytes_available().saturating_sub(DATA_HEADER_LEN);

    let mut sig = [0; 8];
    let read = read_tag_data(reader, &mut sig)?;

    let image_type = if read >= JPEG_SIGNATURE.len() && sig.starts_with(JPEG_SIGNATURE) {
        Some(ImageType::Jpeg)
    }
    else if read >= PNG_SIGNATURE.len() && sig.starts_with(PNG_SIGNATURE) {
        Some(ImageType::Png)
    }
    else {
        None
    };

    if let Some(image_type) = image_type {
        *album_art = Some(AlbumArt { image_type, pos, len });
    }

    Ok(())
}

/// Read a free-form tag: a `mean` atom, a `name` atom, then the value.
fn read_freeform_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    meta: &mut TrackMetadata,
    arena: &mut ScratchArena,
    options: &ParseOptions,
) -> Result<()> {
    // The namespace is not used.
    let mean_len = u64::from(reader.read_be_u32()?).saturating_sub(4);
    reader.ignore_bytes(cmp::min(mean_len, reader.bytes_available()))?;

    // The name follows the atom type, version, and flags.
    let name_len = u64::from(reader.read_be_u32()?);
    reader.ignore_bytes(8)?;

    let name_len = cmp::min(name_len.saturating_sub(12), reader.bytes_available());

    let mut name_buf = [0; MAX_TAG_NAME_LEN];
    let read_len = cmp::min(name_len, MAX_TAG_NAME_LEN as u64) as usize;

    let name = match reader.read_buf(&mut name_buf[..read_len])? {
        read if read == read_len => c_str_lossy(&name_buf[..read]),
        _ => String::new(),
    };

    reader.ignore_bytes(name_len - read_len as u64)?;

    let max_item_len = options.max_item_len;

    match itunes::freeform_key(&name) {
        Some(FreeformKey::Composer) => {
            read_string_tag(reader, arena, max_item_len, &mut meta.composer)?;
        }
        Some(FreeformKey::GaplessInfo) => {
            let mut value = [0; MAX_SMPB_VALUE_LEN];
            let read = read_tag_data(reader, &mut value[..MAX_SMPB_VALUE_LEN - 1])?;
            let value = c_str_lossy(&value[..read]);

            meta.lead_trim = itunes::smpb_field(&value, 1);
            meta.tail_trim = itunes::smpb_field(&value, 2);

            debug!("isomp4: lead_trim {}, tail_trim {}", meta.lead_trim, meta.tail_trim);
        }
        Some(FreeformKey::MusicBrainzTrackId) => {
            read_string_tag(reader, arena, max_item_len, &mut meta.mb_track_id)?;
        }
        Some(FreeformKey::AlbumArtist) => {
            read_string_tag(reader, arena, max_item_len, &mut meta.album_artist)?;
        }
        None => {
            // Borrow the free space of the arena without committing the value.
            let spare = arena.spare_mut();
            let spare_len = spare.len().saturating_sub(1);

            let read = read_tag_data(reader, &mut spare[..spare_len])?;

            if let Some(value) = arena.peek_cstr(read, max_item_len) {
                parse_replaygain(&name, &value, &mut meta.replay_gain);
            }
        }
    }

    Ok(())
}

fn read_tag<B: ReadBytes + FiniteStream>(
    reader: &mut B,
    atom_type: AtomType,
    meta: &mut TrackMetadata,
    arena: &mut ScratchArena,
    options: &ParseOptions,
) -> Result<()> {
    let max_item_len = options.max_item_len;

    match atom_type {
        AtomType::TrackTitleTag => read_string_tag(reader, arena, max_item_len, &mut meta.title),
        AtomType::ArtistTag => read_string_tag(reader, arena, max_item_len, &mut meta.artist),
        AtomType::AlbumArtistTag => {
            read_string_tag(reader, arena, max_item_len, &mut meta.album_artist)
        }
        AtomType::GroupingTag => read_string_tag(reader, arena, max_item_len, &mut meta.grouping),
        AtomType::AlbumTag => read_string_tag(reader, arena, max_item_len, &mut meta.album),
        AtomType::ComposerTag => read_string_tag(reader, arena, max_item_len, &mut meta.composer),
        AtomType::CommentTag => read_string_tag(reader, arena, max_item_len, &mut meta.comment),
        AtomType::CustomGenreTag => read_string_tag(reader, arena, max_item_len, &mut meta.genre),
        AtomType::DateTag => {
            read_string_tag(reader, arena, max_item_len, &mut meta.year_string)?;
            meta.year = meta.year_string.as_deref().and_then(itunes::year_from_date);
            Ok(())
        }
        AtomType::GenreTag => read_genre_tag(reader, &mut meta.genre),
        AtomType::TrackNumberTag => {
            read_m_of_n_tag(reader, arena, &mut meta.track_num, &mut meta.track_string)
        }
        AtomType::DiskNumberTag => {
            read_m_of_n_tag(reader, arena, &mut meta.disc_num, &mut meta.disc_string)
        }
        AtomType::CoverTag if options.read_album_art => {
            read_cover_tag(reader, &mut meta.album_art)
        }
        AtomType::FreeFormTag => read_freeform_tag(reader, meta, arena, options),
        _ => Ok(()),
    }
}

/// Read the tags of a metadata list atom with a payload of `size_left` bytes into `meta`.
pub fn read_ilst<B: ReadBytes>(
    reader: &mut B,
    mut size_left: u64,
    meta: &mut TrackMetadata,
    arena: &mut ScratchArena,
    options: &ParseOptions,
) -> Result<()> {
    while size_left >= AtomHeader::HEADER_SIZE {
        let (header, rest) = AtomHeader::read(reader, size_left)?;
        size_left = rest;

        let mut scoped = ScopedStream::new(&mut *reader, header.data_len());

        match read_tag(&mut scoped, header.atom_type(), meta, arena, options) {
            Ok(()) => (),
            Err(Error::IoError(err)) if scoped.is_out_of_bounds() => {
                warn!("isomp4: skipping malformed {:?} tag: {}", header.atom_type(), err);
            }
            Err(err) => return Err(err),
        }

        // Skip the remainder of the tag.
        scoped.ignore()?;
    }

    // Trailing bytes too short to be an atom.
    reader.ignore_bytes(size_left)?;

    Ok(())
}
