// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;

use melodeon_core::errors::Result;
use melodeon_core::io::{FiniteStream, ReadBytes, ScopedStream};

use log::{debug, warn};

const ES_DESCRIPTOR: u8 = 0x03;
const DECODER_CONFIG_DESCRIPTOR: u8 = 0x04;
const DECODER_SPECIFIC_DESCRIPTOR: u8 = 0x05;

const MIN_ES_DESCRIPTOR_LEN: u32 = 20;
const MIN_DECODER_CONFIG_DESCRIPTOR_LEN: u32 = 13;

/// The maximum number of decoder specific info bytes that are inspected.
const MAX_AUDIO_SPECIFIC_CONFIG_LEN: usize = 8;

const AAC_SAMPLE_RATES: [u32; 12] =
    [96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000];

/// The audio object type of Spectral Band Replication.
const AOT_SBR: u32 = 5;

/// A sample rate index indicating an explicit 24-bit sample rate follows.
const ESCAPE_SAMPLE_RATE_INDEX: u32 = 15;

/// The sync word preceding a backwards-compatible extension audio object type.
const SYNC_EXTENSION_TYPE: u32 = 0x2b7;

/// The highest sample rate at which SBR is assumed when it is not signalled.
const MAX_IMPLICIT_SBR_CORE_RATE: u32 = 24000;

/// Read the length of a descriptor. The length is coded in 1 to 4 bytes, each contributing 7 bits.
/// Decoding stops early if the stream is exhausted.
pub fn read_descriptor_len<B: ReadBytes + FiniteStream>(reader: &mut B) -> Result<u32> {
    let mut len = 0;

    for _ in 0..4 {
        let val = reader.read_u8()?;
        len = (len << 7) | u32::from(val & 0x7f);

        if val & 0x80 == 0 || reader.bytes_available() == 0 {
            break;
        }
    }

    Ok(len)
}

fn sample_rate_from_index(index: u32) -> Option<u32> {
    AAC_SAMPLE_RATES.get(index as usize).copied()
}

/// The leading bytes of an MPEG-4 `AudioSpecificConfig`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    buf: [u8; MAX_AUDIO_SPECIFIC_CONFIG_LEN],
    len: usize,
}

impl AudioSpecificConfig {
    pub fn new(data: &[u8]) -> Self {
        let len = cmp::min(data.len(), MAX_AUDIO_SPECIFIC_CONFIG_LEN);

        let mut buf = [0; MAX_AUDIO_SPECIFIC_CONFIG_LEN];
        buf[..len].copy_from_slice(&data[..len]);

        AudioSpecificConfig { buf, len }
    }

    fn word_at(&self, offset: usize) -> u32 {
        let mut word = [0; 4];
        word.copy_from_slice(&self.buf[offset..offset + 4]);
        u32::from_be_bytes(word)
    }

    /// Update `frequency` with the output sample rate described by the configuration, and return
    /// `true` if Spectral Band Replication (SBR) is in effect.
    ///
    /// SBR may be signalled explicitly by the audio object type, or by an extension audio object
    /// type following the core configuration. If SBR is not signalled either way, `implicit_sbr`
    /// is set, and the core sample rate is at most 24 kHz, SBR is assumed.
    ///
    /// If a sample rate index is invalid, `frequency` keeps its previous value.
    pub fn apply(&self, frequency: &mut u32, implicit_sbr: bool) -> bool {
        let mut sbr = false;
        let mut sbr_signalled = false;

        // Audio object type (5 bits), sample rate index (4 bits), channel configuration (4 bits).
        let bits = self.word_at(0);
        let object_type = bits >> 27;
        let index = (bits >> 23) & 0xf;

        if let Some(rate) = sample_rate_from_index(index) {
            *frequency = rate;
        }

        if object_type == AOT_SBR {
            sbr = true;

            let ext_index = (bits >> 15) & 0xf;

            if ext_index == ESCAPE_SAMPLE_RATE_INDEX {
                *frequency = (self.word_at(2) >> 7) & 0x00ff_ffff;
            }
            else if let Some(rate) = sample_rate_from_index(ext_index) {
                *frequency = rate;
            }

            if ext_index == index {
                // Downsampled SBR.
                *frequency = frequency.saturating_mul(2);
            }
        }
        else if self.len >= 4 && ((bits >> 5) & 0x7ff) == SYNC_EXTENSION_TYPE {
            let ext_object_type = bits & 0x1f;
            let bits = self.word_at(4);

            if ext_object_type == AOT_SBR {
                sbr = bits >> 31 == 1;
                sbr_signalled = true;

                if sbr {
                    let ext_index = (bits >> 27) & 0xf;

                    if ext_index == ESCAPE_SAMPLE_RATE_INDEX {
                        *frequency = (bits >> 3) & 0x00ff_ffff;
                    }
                    else if let Some(rate) = sample_rate_from_index(ext_index) {
                        *frequency = rate;
                    }

                    if ext_index == index {
                        // Downsampled SBR.
                        *frequency = frequency.saturating_mul(2);
                    }
                }
            }
        }

        if implicit_sbr && !sbr && !sbr_signalled && *frequency <= MAX_IMPLICIT_SBR_CORE_RATE {
            *frequency = frequency.saturating_mul(2);
            sbr = true;
        }

        sbr
    }
}

fn read_audio_specific_config<B: ReadBytes + FiniteStream>(
    reader: &mut B,
) -> Result<Option<AudioSpecificConfig>> {
    // Version and flags.
    reader.ignore_bytes(4)?;

    match reader.read_u8()? {
        ES_DESCRIPTOR => {
            if read_descriptor_len(reader)? < MIN_ES_DESCRIPTOR_LEN {
                return Ok(None);
            }

            // Elementary stream ID and flags.
            reader.ignore_bytes(3)?;
        }
        _ => {
            // Some encoders omit the elementary stream descriptor tag.
            reader.ignore_bytes(2)?;
        }
    }

    let desc = reader.read_u8()?;

    if desc != DECODER_CONFIG_DESCRIPTOR {
        warn!("isomp4: expected decoder config descriptor, got desc={}", desc);
        return Ok(None);
    }

    if read_descriptor_len(reader)? < MIN_DECODER_CONFIG_DESCRIPTOR_LEN {
        return Ok(None);
    }

    // Object type indication, stream type, buffer size, and bit rates.
    reader.ignore_bytes(13)?;

    let desc = reader.read_u8()?;

    if desc != DECODER_SPECIFIC_DESCRIPTOR {
        warn!("isomp4: expected decoder specific descriptor, got desc={}", desc);
        return Ok(None);
    }

    let len = u64::from(read_descriptor_len(reader)?);
    let len = cmp::min(len, reader.bytes_available());
    let len = cmp::min(len, MAX_AUDIO_SPECIFIC_CONFIG_LEN as u64) as usize;

    let mut buf = [0; MAX_AUDIO_SPECIFIC_CONFIG_LEN];
    reader.read_buf(&mut buf[..len])?;

    Ok(Some(AudioSpecificConfig::new(&buf[..len])))
}

/// Elementary stream descriptor atom.
#[derive(Debug)]
pub struct EsdsAtom {
    /// The leading bytes of the decoder specific info, if the descriptors could be read.
    pub config: Option<AudioSpecificConfig>,
}

impl EsdsAtom {
    /// Read the elementary stream descriptors within the next `len` bytes of `reader`.
    ///
    /// Malformed or truncated descriptors are not an error. The atom is returned without a
    /// configuration instead.
    pub fn read<B: ReadBytes>(reader: &mut B, len: u64) -> EsdsAtom {
        let mut scoped = ScopedStream::new(reader, len);

        let config = match read_audio_specific_config(&mut scoped) {
            Ok(config) => config,
            Err(err) => {
                debug!("isomp4: esds descriptors are incomplete: {}", err);
                None
            }
        };

        EsdsAtom { config }
    }

    /// Update `frequency` with the output sample rate of the stream, and return `true` if Spectral
    /// Band Replication is in effect. See [`AudioSpecificConfig::apply`].
    pub fn apply(&self, frequency: &mut u32, implicit_sbr: bool) -> bool {
        match &self.config {
            Some(config) => config.apply(frequency, implicit_sbr),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{read_descriptor_len, AudioSpecificConfig, EsdsAtom};
    use melodeon_core::io::{BufReader, FiniteStream, ReadBytes, ScopedStream};

    fn apply(data: &[u8], implicit_sbr: bool) -> (u32, bool) {
        let mut frequency = 0;
        let sbr = AudioSpecificConfig::new(data).apply(&mut frequency, implicit_sbr);
        (frequency, sbr)
    }

    #[test]
    fn verify_read_descriptor_len() {
        let data = [0x80, 0x80, 0x80, 0x22, 0xff];
        let mut reader = BufReader::new(&data);
        assert_eq!(read_descriptor_len(&mut reader).unwrap(), 0x22);
        assert_eq!(reader.bytes_available(), 1);

        // At most 4 bytes are read.
        let data = [0x81, 0x81, 0x81, 0x81, 0x01];
        let mut reader = BufReader::new(&data);
        assert_eq!(read_descriptor_len(&mut reader).unwrap(), 0x0020_4081);
        assert_eq!(reader.bytes_available(), 1);

        // Decoding stops when the scope is exhausted.
        let data = [0x81, 0x01, 0x00];
        let mut reader = BufReader::new(&data);
        let mut scoped = ScopedStream::new(&mut reader, 1);
        assert_eq!(read_descriptor_len(&mut scoped).unwrap(), 0x01);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
    }

    #[test]
    fn verify_aac_lc() {
        assert_eq!(apply(&[0x12, 0x10], true), (44100, false));
    }

    #[test]
    fn verify_explicit_sbr() {
        // Core 24 kHz, extension 22.05 kHz.
        assert_eq!(apply(&[0x2b, 0x13, 0x80, 0x00], true), (22050, true));
        // Extension sample rate coded explicitly.
        assert_eq!(apply(&[0x29, 0x97, 0x80, 0x3e, 0x80, 0x00], true), (32000, true));
        // Downsampled SBR.
        assert_eq!(apply(&[0x2b, 0x0b, 0x00, 0x00], true), (48000, true));
    }

    #[test]
    fn verify_extension_sbr() {
        let signalled = [0x13, 0x90, 0x56, 0xe5, 0xa0, 0x00, 0x00, 0x00];
        assert_eq!(apply(&signalled, true), (44100, true));

        // SBR explicitly signalled as absent suppresses implicit SBR.
        let absent = [0x13, 0x90, 0x56, 0xe5, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(apply(&absent, true), (22050, false));
    }

    #[test]
    fn verify_extension_sbr_with_explicit_sample_rate() {
        // Extension sample rate index 15, followed by a 24-bit rate of 44.1 kHz.
        let escaped = [0x13, 0x90, 0x56, 0xe5, 0xf8, 0x05, 0x62, 0x20];
        assert_eq!(apply(&escaped, true), (44100, true));
    }

    #[test]
    fn verify_implicit_sbr() {
        assert_eq!(apply(&[0x13, 0x90], true), (44100, true));
        assert_eq!(apply(&[0x13, 0x90], false), (22050, false));
    }

    #[test]
    fn verify_invalid_sample_rate_index_is_ignored() {
        let mut frequency = 44100;
        // Object type 2, sample rate index 13.
        let sbr = AudioSpecificConfig::new(&[0x16, 0x90]).apply(&mut frequency, true);
        assert_eq!((frequency, sbr), (44100, false));
    }

    #[test]
    fn verify_esds_atom() {
        #[rustfmt::skip]
        let data = [
            0, 0, 0, 0,
            0x03, 0x19, 0x00, 0x01, 0x00,
            0x04, 0x11, 0x40, 0x15, 0x00, 0x00, 0x00, 0x00, 0x01, 0xf4, 0x00, 0x00, 0x01, 0xf4,
            0x00,
            0x05, 0x02, 0x12, 0x10,
            0x06, 0x01, 0x02,
        ];

        let mut reader = BufReader::new(&data);
        let esds = EsdsAtom::read(&mut reader, data.len() as u64);

        let mut frequency = 0;
        assert!(!esds.apply(&mut frequency, true));
        assert_eq!(frequency, 44100);
    }

    #[test]
    fn verify_truncated_esds_atom() {
        let data = [0, 0, 0, 0, 0x03, 0x19, 0x00, 0x01, 0x00, 0x04];

        let mut reader = BufReader::new(&data);
        let esds = EsdsAtom::read(&mut reader, data.len() as u64);

        assert!(esds.config.is_none());

        // A short elementary stream descriptor is not parsed.
        let data = [0, 0, 0, 0, 0x03, 0x10, 0x00, 0x01, 0x00, 0x04];

        let mut reader = BufReader::new(&data);
        assert!(EsdsAtom::read(&mut reader, data.len() as u64).config.is_none());
    }

    #[test]
    fn verify_esds_without_es_descriptor() {
        #[rustfmt::skip]
        let data = [
            0, 0, 0, 0,
            0x00, 0x00, 0x01,
            0x04, 0x11, 0x40, 0x15, 0x00, 0x00, 0x00, 0x00, 0x01, 0xf4, 0x00, 0x00, 0x01, 0xf4,
            0x00,
            0x05, 0x02, 0x12, 0x10,
        ];

        let mut reader = BufReader::new(&data);
        let esds = EsdsAtom::read(&mut reader, data.len() as u64);

        assert_eq!(esds.config, Some(AudioSpecificConfig::new(&[0x12, 0x10])));
    }

    #[test]
    fn verify_malformed_descriptors() {
        fn esds(decoder_tag: u8, decoder_len: u8, specific_tag: u8) -> Option<AudioSpecificConfig> {
            let mut data = vec![0, 0, 0, 0, 0x03, 0x19, 0x00, 0x01, 0x00];
            data.extend_from_slice(&[decoder_tag, decoder_len]);
            data.extend_from_slice(&[0x40, 0x15, 0, 0, 0, 0, 0x01, 0xf4, 0, 0, 0x01, 0xf4, 0]);
            data.extend_from_slice(&[specific_tag, 0x02, 0x12, 0x10]);

            let mut reader = BufReader::new(&data);
            EsdsAtom::read(&mut reader, data.len() as u64).config
        }

        assert!(esds(0x04, 0x11, 0x05).is_some());
        // Wrong decoder config descriptor tag.
        assert!(esds(0x07, 0x11, 0x05).is_none());
        // Short decoder config descriptor.
        assert!(esds(0x04, 0x0c, 0x05).is_none());
        // Wrong decoder specific descriptor tag.
        assert!(esds(0x04, 0x11, 0x06).is_none());
    }
}
