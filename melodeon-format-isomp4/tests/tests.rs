use melodeon_core::errors::{self, Result};
use melodeon_core::formats::ParseOptions;
use melodeon_core::io::{BufReader, SourceStreamOptions};
use melodeon_core::meta::{CodecType, ImageType, TrackMetadata};
use melodeon_format_isomp4::{read_mp4_metadata, Mp4MetadataReader};

/// AAC-LC, 44.1 kHz, stereo.
const AAC_LC_44100: [u8; 2] = [0x12, 0x10];
/// SBR, 24 kHz core, 22.05 kHz extension, stereo.
const SBR_22050: [u8; 4] = [0x2b, 0x13, 0x80, 0x00];

fn atom(atom_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(atom_type);
    buf.extend_from_slice(payload);
    buf
}

fn ftyp() -> Vec<u8> {
    atom(b"ftyp", b"M4A \0\0\0\0M4A mp42isom")
}

fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut payload = vec![0; 8];
    payload.extend_from_slice(handler);
    payload.extend_from_slice(&[0; 13]);
    atom(b"hdlr", &payload)
}

fn esds(config: &[u8]) -> Vec<u8> {
    let mut decoder_config = vec![0x40, 0x15, 0, 0, 0, 0, 0, 0xfa, 0, 0, 0, 0xfa, 0];
    decoder_config.push(0x05);
    decoder_config.push(config.len() as u8);
    decoder_config.extend_from_slice(config);

    let mut es = vec![0, 1, 0];
    es.push(0x04);
    es.push(decoder_config.len() as u8);
    es.extend(decoder_config);
    // Sync layer config.
    es.extend_from_slice(&[0x06, 0x01, 0x02]);

    let mut payload = vec![0; 4];
    payload.push(0x03);
    payload.push(es.len() as u8);
    payload.extend(es);
    atom(b"esds", &payload)
}

fn mp4a(config: &[u8]) -> Vec<u8> {
    let mut payload = vec![0; 28];
    payload.extend(esds(config));
    atom(b"mp4a", &payload)
}

fn stts(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut payload = vec![0; 4];
    payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for &(count, delta) in entries {
        payload.extend_from_slice(&count.to_be_bytes());
        payload.extend_from_slice(&delta.to_be_bytes());
    }
    atom(b"stts", &payload)
}

/// A sound track with the given sample entry and time-to-sample table.
fn trak(sample_entry: &[u8], entries: &[(u32, u32)]) -> Vec<u8> {
    let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
    stsd.extend_from_slice(sample_entry);

    let mut stbl = atom(b"stsd", &stsd);
    stbl.extend(stts(entries));

    let mut mdia = hdlr(b"soun");
    mdia.extend(atom(b"minf", &atom(b"stbl", &stbl)));

    atom(b"trak", &atom(b"mdia", &mdia))
}

fn tag(atom_type: &[u8; 4], value: &[u8]) -> Vec<u8> {
    let mut data = vec![0, 0, 0, 1, 0, 0, 0, 0];
    data.extend_from_slice(value);
    atom(atom_type, &atom(b"data", &data))
}

/// User data with a metadata list holding the given tags.
fn udta(tags: &[Vec<u8>]) -> Vec<u8> {
    let mut meta = vec![0; 4];
    meta.extend(hdlr(b"mdir"));
    meta.extend(atom(b"ilst", &tags.concat()));

    atom(b"udta", &atom(b"meta", &meta))
}

fn file(moov: &[Vec<u8>], mdat_len: usize) -> Vec<u8> {
    let mut data = ftyp();
    data.extend(atom(b"moov", &moov.concat()));
    data.extend(atom(b"mdat", &vec![0; mdat_len]));
    data
}

fn read(data: &[u8]) -> Result<TrackMetadata> {
    read_mp4_metadata(&mut BufReader::new(data), data.len() as u64, &ParseOptions::default())
}

#[test]
fn aac_lc_file() {
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)])], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.file_type, Some(*b"M4A "));
    assert_eq!(meta.codec, CodecType::Aac);
    assert_eq!(meta.frequency, 44100);
    assert_eq!(meta.samples, 102400);
    assert_eq!(meta.length_ms, 2322);
    assert_eq!(meta.filesize, 2000);
    assert_eq!(meta.bitrate, 6);
    assert!(meta.vbr);
    assert!(!meta.needs_upsampling_correction);
}

#[test]
fn explicit_sbr_file() {
    // 48 kHz core sample rate.
    let other_core = [0x29, 0x93, 0x80, 0x00];

    for config in [&SBR_22050[..], &other_core[..]] {
        let data = file(&[trak(&mp4a(config), &[(100, 2048)])], 2000);

        let meta = read(&data).unwrap();

        assert_eq!(meta.codec, CodecType::AacHe);
        assert_eq!(meta.frequency, 22050);
    }
}

#[test]
fn implicit_sbr_can_be_disabled() {
    // AAC-LC, 22.05 kHz.
    let config = [0x13, 0x90];
    let data = file(&[trak(&mp4a(&config), &[(100, 1024)])], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.codec, CodecType::AacHe);
    assert_eq!(meta.frequency, 44100);

    let options = ParseOptions { implicit_sbr: false, ..Default::default() };
    let mut reader = BufReader::new(&data);
    let meta = read_mp4_metadata(&mut reader, data.len() as u64, &options).unwrap();

    assert_eq!(meta.codec, CodecType::Aac);
    assert_eq!(meta.frequency, 22050);
}

#[test]
fn upsampled_sample_table() {
    let data = file(&[trak(&mp4a(&SBR_22050), &[(10, 1024), (5, 2048)])], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.samples, 10 * 2048 + 5 * 2048);
    assert!(meta.needs_upsampling_correction);
}

#[test]
fn parsing_is_idempotent() {
    let tags = [
        tag(b"\xa9nam", b"Title"),
        tag(b"\xa9ART", b"Artist"),
        tag(b"trkn", &[0, 0, 0, 1, 0, 9]),
        tag(b"covr", b"\x89PNG\r\n\x1a\n"),
    ];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    assert_eq!(read(&data).unwrap(), read(&data).unwrap());
}

#[test]
fn first_tag_value_wins() {
    let tags = [tag(b"\xa9nam", b"First"), tag(b"\xa9nam", b"Second"), tag(b"\xa9alb", b"Album")];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.title.as_deref(), Some("First"));
    assert_eq!(meta.album.as_deref(), Some("Album"));
}

#[test]
fn track_number_without_total() {
    let tags = [tag(b"trkn", &[0, 0, 0, 3, 0, 0]), tag(b"disk", &[0, 0, 0, 1, 0, 2])];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.track_num, Some(3));
    assert_eq!(meta.track_string, None);
    assert_eq!(meta.disc_num, Some(1));
    assert_eq!(meta.disc_string.as_deref(), Some("1/2"));
}

#[test]
fn tags_require_metadata_handler() {
    let mut meta = vec![0; 4];
    meta.extend(hdlr(b"mdta"));
    meta.extend(atom(b"ilst", &tag(b"\xa9nam", b"Title")));

    let udta = atom(b"udta", &atom(b"meta", &meta));
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.title, None);
    assert_eq!(meta.frequency, 44100);
}

#[test]
fn cover_art_position() {
    let jpeg = [0xff, 0xd8, 0xff, 0xe0, 0, 0x10, b'J', b'F', b'I', b'F'];
    let udta = udta(&[tag(b"covr", &jpeg)]);

    let mut moov = trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]);
    // Position of the image: ftyp, moov header, the track, then the udta, meta, hdlr, ilst, covr,
    // and data headers.
    let pos = ftyp().len() + 8 + moov.len() + 8 + 12 + 33 + 8 + 8 + 16;
    moov.extend(udta);

    let data = file(&[moov], 2000);

    let art = read(&data).unwrap().album_art.unwrap();

    assert_eq!(art.image_type, ImageType::Jpeg);
    assert_eq!(art.pos, pos as u64);
    assert_eq!(art.len, jpeg.len() as u64);
    assert_eq!(&data[pos..pos + 4], &jpeg[..4]);
}

#[test]
fn empty_media_data_is_ignored() {
    let mut data = ftyp();
    data.extend(atom(b"mdat", &[]));
    data.extend(atom(b"moov", &trak(&mp4a(&AAC_LC_44100), &[(100, 1024)])));
    data.extend(atom(b"mdat", &[]));
    data.extend(atom(b"mdat", &[0; 1500]));

    let meta = read(&data).unwrap();

    assert_eq!(meta.filesize, 1500);
}

#[test]
fn media_data_accumulates() {
    let mut data = ftyp();
    data.extend(atom(b"mdat", &[0; 700]));
    data.extend(atom(b"mdat", &[0; 300]));
    data.extend(atom(b"moov", &trak(&mp4a(&AAC_LC_44100), &[(100, 1024)])));
    data.extend(atom(b"mdat", &[0; 1000]));

    let meta = read(&data).unwrap();

    assert_eq!(meta.filesize, 2000);
}

#[test]
fn large_atom_is_skipped() {
    // A 64-bit sized atom of 24 bytes between the file type and movie atoms.
    let mut large = vec![0, 0, 0, 1];
    large.extend_from_slice(b"moov");
    large.extend_from_slice(&24u64.to_be_bytes());
    large.extend_from_slice(&[0xff; 8]);

    let mut data = ftyp();
    data.extend(large);
    data.extend(atom(b"moov", &trak(&mp4a(&AAC_LC_44100), &[(100, 1024)])));
    data.extend(atom(b"mdat", &[0; 2000]));

    let meta = read(&data).unwrap();

    assert_eq!(meta.frequency, 44100);
    assert_eq!(meta.samples, 102400);
    assert_eq!(meta.filesize, 2000);
}

#[test]
fn missing_codec_fails() {
    let mut stbl = atom(b"stsd", &[0, 0, 0, 0, 0, 0, 0, 0]);
    stbl.extend(stts(&[(100, 1024)]));

    let mut mdia = hdlr(b"soun");
    mdia.extend(atom(b"minf", &atom(b"stbl", &stbl)));

    let data = file(&[atom(b"trak", &atom(b"mdia", &mdia))], 2000);

    match read(&data) {
        Err(errors::Error::DecodeError("isomp4: no audio track found")) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn alac_without_magic_cookie_fails() {
    let mut entry = vec![0; 28];
    entry.extend(atom(b"wave", &[0; 4]));

    let data = file(&[trak(&atom(b"alac", &entry), &[(100, 1024)])], 2000);

    match read(&data) {
        Err(errors::Error::DecodeError(_)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn malformed_freeform_tag_is_skipped() {
    // A free-form tag without a name or value.
    let freeform = atom(b"----", &atom(b"mean", b"\0\0\0\0com.apple.iTunes"));
    let tags = [freeform, tag(b"\xa9nam", b"Title")];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.title.as_deref(), Some("Title"));
    assert_eq!(meta.samples, 102400);
}

#[test]
fn short_chapter_list_is_skipped() {
    let udta = atom(b"udta", &atom(b"chpl", &[0; 8]));
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta], 2000);

    let meta = read(&data).unwrap();

    assert_eq!(meta.lead_trim, 0);
    assert_eq!(meta.length_ms, 2322);
}

#[test]
fn short_metadata_handler_is_skipped() {
    let mut meta = vec![0; 4];
    meta.extend(atom(b"hdlr", &[0; 4]));
    meta.extend(atom(b"ilst", &tag(b"\xa9nam", b"Title")));

    let udta = atom(b"udta", &atom(b"meta", &meta));
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta], 2000);

    let meta = read(&data).unwrap();

    // Without a handler the tags are not read.
    assert_eq!(meta.title, None);
    assert_eq!(meta.frequency, 44100);
}

#[test]
fn read_from_media_source() {
    let tags = [tag(b"\xa9nam", b"Title")];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    let expected = read(&data).unwrap();

    let source = Box::new(std::io::Cursor::new(data.clone()));
    let meta = Mp4MetadataReader::read(source, &ParseOptions::default()).unwrap();

    assert_eq!(meta, expected);

    // A buffer smaller than most atoms.
    let source = Box::new(std::io::Cursor::new(data));
    let options = SourceStreamOptions { buffer_len: 7 };
    let meta = Mp4MetadataReader::read_with_stream_options(source, &Default::default(), options)
        .unwrap();

    assert_eq!(meta, expected);
}

#[test]
fn read_from_media_source_offset() {
    let jpeg = [0xff, 0xd8, 0xff, 0xe0, 0, 0x10, b'J', b'F', b'I', b'F'];
    let tags = [tag(b"covr", &jpeg)];
    let data = file(&[trak(&mp4a(&AAC_LC_44100), &[(100, 1024)]), udta(&tags)], 2000);

    let expected = read(&data).unwrap().album_art.unwrap();

    // The file is embedded after some unrelated bytes.
    let mut source = vec![0xaa; 100];
    source.extend_from_slice(&data);

    let mut source = std::io::Cursor::new(source);
    source.set_position(100);

    let options = SourceStreamOptions { buffer_len: 16 };
    let meta = Mp4MetadataReader::read_with_stream_options(
        Box::new(source),
        &Default::default(),
        options,
    )
    .unwrap();

    let art = meta.album_art.unwrap();

    assert_eq!(art.pos, expected.pos + 100);
    assert_eq!(art.len, expected.len);
    assert_eq!(meta.filesize, 2000);
}
