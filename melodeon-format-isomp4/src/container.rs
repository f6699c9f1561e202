// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;

use melodeon_core::errors::{limit_error, Error, Result};
use melodeon_core::formats::ParseOptions;
use melodeon_core::io::{ReadBytes, ScopedStream};
use melodeon_core::meta::{CodecType, TrackMetadata};
use melodeon_core::scratch::ScratchArena;

use crate::atoms::ilst::read_ilst;
use crate::atoms::{Atom, AtomHeader, AtomType, HandlerType};
use crate::atoms::{AlacAtom, ChplAtom, FtypAtom, HdlrAtom, Mp4aAtom, SttsAtom};

use log::{debug, warn};

/// The maximum nesting depth of container atoms.
const MAX_CONTAINER_DEPTH: usize = 32;

/// The outcome of walking a container.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Walk {
    /// The container was consumed in full.
    Continue,
    /// All required information was found. The walk stops at every level.
    Done,
}

/// Reads a leaf atom. The payload not consumed by the atom is skipped.
///
/// An atom too short for its own fields is skipped, and `None` is returned.
fn read_atom<A: Atom, B: ReadBytes>(reader: &mut B, header: AtomHeader) -> Result<Option<A>> {
    let mut scoped = ScopedStream::new(reader, header.data_len());

    let atom = match A::read(&mut scoped, header) {
        Ok(atom) => Some(atom),
        Err(Error::IoError(err)) if scoped.is_out_of_bounds() => {
            warn!("isomp4: skipping malformed {:?} atom: {}", header.atom_type(), err);
            None
        }
        Err(err) => return Err(err),
    };

    scoped.ignore()?;

    Ok(atom)
}

/// Skips a fixed-length prefix of a container payload. Returns the remaining payload length.
fn skip_prefix<B: ReadBytes>(reader: &mut B, data_len: u64, prefix_len: u64) -> Result<u64> {
    let prefix_len = cmp::min(prefix_len, data_len);

    reader.ignore_bytes(prefix_len)?;

    Ok(data_len - prefix_len)
}

/// `ContainerWalker` walks the atom tree of a file, accumulating the metadata of the first audio
/// track and the iTunes tags into a `TrackMetadata`.
///
/// Atoms are visited in file order. The handler type of the most recent `hdlr` atom at each level
/// gates its siblings: a `minf` atom is only entered for a sound track, and an `ilst` atom is only
/// read under a metadata directory handler.
pub struct ContainerWalker<'a> {
    meta: TrackMetadata,
    arena: ScratchArena,
    options: &'a ParseOptions,
    depth: usize,
}

impl<'a> ContainerWalker<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        ContainerWalker {
            meta: TrackMetadata::default(),
            arena: ScratchArena::new(options.scratch_len),
            options,
            depth: 0,
        }
    }

    /// Consume the walker and return the accumulated metadata.
    pub fn into_metadata(self) -> TrackMetadata {
        self.meta
    }

    /// Walk the sibling atoms contained in the next `size_left` bytes of the stream.
    pub fn walk<B: ReadBytes>(&mut self, reader: &mut B, size_left: u64) -> Result<Walk> {
        if self.depth >= MAX_CONTAINER_DEPTH {
            return limit_error("isomp4: atoms are nested too deeply");
        }

        self.depth += 1;
        let walk = self.walk_siblings(reader, size_left);
        self.depth -= 1;

        walk
    }

    fn walk_siblings<B: ReadBytes>(&mut self, reader: &mut B, mut size_left: u64) -> Result<Walk> {
        let mut handler = None;

        while size_left >= AtomHeader::HEADER_SIZE {
            let (header, rest) = AtomHeader::read(reader, size_left)?;
            size_left = rest;

            let data_len = header.data_len();

            let walk = match header.atom_type() {
                AtomType::Movie
                | AtomType::UserData
                | AtomType::Media
                | AtomType::SampleTable
                | AtomType::Track => self.walk(reader, data_len)?,
                AtomType::Meta => {
                    // Version and flags.
                    let data_len = skip_prefix(reader, data_len, 4)?;
                    self.walk(reader, data_len)?
                }
                AtomType::SampleDescription => {
                    // Version, flags, and the entry count.
                    let data_len = skip_prefix(reader, data_len, 8)?;
                    self.walk(reader, data_len)?
                }
                AtomType::MediaInfo => {
                    if handler == Some(HandlerType::Sound) {
                        self.walk(reader, data_len)?
                    }
                    else {
                        reader.ignore_bytes(data_len)?;
                        Walk::Continue
                    }
                }
                AtomType::MetaList => {
                    if handler == Some(HandlerType::MetadataDirectory)
                        && data_len > AtomHeader::HEADER_SIZE
                    {
                        let meta = &mut self.meta;
                        read_ilst(reader, data_len, meta, &mut self.arena, self.options)?;
                    }
                    else {
                        reader.ignore_bytes(data_len)?;
                    }
                    Walk::Continue
                }
                AtomType::Handler => {
                    let hdlr = read_atom::<HdlrAtom, _>(reader, header)?;
                    handler = hdlr.map(|hdlr| hdlr.handler_type);
                    Walk::Continue
                }
                AtomType::TimeToSample => {
                    // The last sample table read describes the track.
                    if let Some(stts) = read_atom::<SttsAtom, _>(reader, header)? {
                        let upsampled = self.meta.codec == CodecType::AacHe;
                        let (samples, corrected) = stts.total_samples(upsampled);

                        self.meta.samples = samples;
                        self.meta.needs_upsampling_correction = corrected;
                    }
                    Walk::Continue
                }
                AtomType::AudioSampleEntryMp4a => {
                    let mp4a = read_atom::<Mp4aAtom, _>(reader, header)?;

                    if let Some(esds) = mp4a.as_ref().and_then(|mp4a| mp4a.esds.as_ref()) {
                        let sbr = esds.apply(&mut self.meta.frequency, self.options.implicit_sbr);

                        self.meta.codec = if sbr { CodecType::AacHe } else { CodecType::Aac };
                    }
                    Walk::Continue
                }
                AtomType::AudioSampleEntryAlac => {
                    let alac = read_atom::<AlacAtom, _>(reader, header)?;

                    if let Some(sample_rate) = alac.and_then(|alac| alac.sample_rate) {
                        self.meta.frequency = sample_rate;
                        self.meta.codec = CodecType::Alac;
                    }
                    Walk::Continue
                }
                AtomType::MediaData => self.read_media_data(reader, data_len)?,
                AtomType::ChapterList => {
                    let chpl = read_atom::<ChplAtom, _>(reader, header)?;
                    let frequency = self.meta.frequency;

                    if let Some(lead_trim) = chpl.and_then(|chpl| chpl.lead_trim(frequency)) {
                        debug!("isomp4: chapter lead trim {}", lead_trim);
                        self.meta.lead_trim = lead_trim;
                    }
                    Walk::Continue
                }
                AtomType::FileType => {
                    let ftyp = read_atom::<FtypAtom, _>(reader, header)?;

                    if self.meta.file_type.is_none() {
                        self.meta.file_type = ftyp.map(|ftyp| ftyp.major_brand);
                    }
                    Walk::Continue
                }
                _ => {
                    reader.ignore_bytes(data_len)?;
                    Walk::Continue
                }
            };

            if walk == Walk::Done {
                return Ok(Walk::Done);
            }
        }

        // Trailing bytes too short to be an atom.
        reader.ignore_bytes(size_left)?;

        Ok(Walk::Continue)
    }

    fn read_media_data<B: ReadBytes>(&mut self, reader: &mut B, data_len: u64) -> Result<Walk> {
        // Some encoders write empty placeholder media data atoms.
        if data_len == 0 {
            return Ok(Walk::Continue);
        }

        self.meta.filesize = self.meta.filesize.saturating_add(data_len);

        // Once the sample table is known, the media data is the last atom of interest.
        if self.meta.samples > 0 {
            return Ok(Walk::Done);
        }

        reader.ignore_bytes(data_len)?;

        Ok(Walk::Continue)
    }
}
