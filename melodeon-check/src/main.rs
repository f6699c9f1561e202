// Melodeon Check Tool
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// Justification: Fields on ParseOptions may change at any time, but melodeon-check doesn't want to
// be updated every time those fields change, therefore always fill in the remaining fields with
// default values.
#![allow(clippy::needless_update)]

use std::fs::File;
use std::path::Path;

use melodeon_core::errors::Result;
use melodeon_core::formats::ParseOptions;
use melodeon_core::io::SourceStreamOptions;
use melodeon_core::meta::TrackMetadata;
use melodeon_format_isomp4::Mp4MetadataReader;

use clap::{value_parser, Arg, ArgAction};
use log::{error, LevelFilter};

/// The width of the key column.
const PAD: usize = 18;

fn print_pair<T: std::fmt::Display>(key: &str, value: T) {
    println!("|  {:<pad$} {}", key, value, pad = PAD);
}

fn print_opt<T: std::fmt::Display>(key: &str, value: &Option<T>) {
    if let Some(value) = value {
        print_pair(key, value);
    }
}

fn print_metadata(meta: &TrackMetadata) {
    println!("| // Track //");
    print_pair("Codec:", meta.codec);
    if let Some(file_type) = meta.file_type {
        print_pair("File Type:", String::from_utf8_lossy(&file_type));
    }
    print_pair("Sample Rate:", format!("{} Hz", meta.frequency));
    print_pair("Samples:", meta.samples);
    print_pair("Duration:", format!("{} ms", meta.length_ms));
    let mode = if meta.vbr { "VBR" } else { "CBR" };
    print_pair("Bitrate:", format!("{} kbit/s ({})", meta.bitrate, mode));
    print_pair("Audio Size:", format!("{} bytes", meta.filesize));
    print_pair("Lead Trim:", meta.lead_trim);
    print_pair("Tail Trim:", meta.tail_trim);
    if meta.needs_upsampling_correction {
        print_pair("Upsampled:", "yes");
    }

    println!("|");
    println!("| // Tags //");
    print_opt("Title:", &meta.title);
    print_opt("Artist:", &meta.artist);
    print_opt("Album Artist:", &meta.album_artist);
    print_opt("Album:", &meta.album);
    print_opt("Composer:", &meta.composer);
    print_opt("Grouping:", &meta.grouping);
    print_opt("Genre:", &meta.genre);
    print_opt("Date:", &meta.year_string);
    print_opt("Year:", &meta.year);
    match &meta.track_string {
        Some(track) => print_pair("Track:", track),
        None => print_opt("Track:", &meta.track_num),
    }
    match &meta.disc_string {
        Some(disc) => print_pair("Disc:", disc),
        None => print_opt("Disc:", &meta.disc_num),
    }
    print_opt("Comment:", &meta.comment);
    print_opt("MusicBrainz Track:", &meta.mb_track_id);

    let gain = &meta.replay_gain;
    if !gain.is_empty() {
        print_opt("Track Gain:", &gain.track_gain);
        print_opt("Track Peak:", &gain.track_peak);
        print_opt("Album Gain:", &gain.album_gain);
        print_opt("Album Peak:", &gain.album_peak);
    }

    if let Some(art) = &meta.album_art {
        println!("|");
        println!("| // Album Art //");
        print_pair("Type:", format!("{:?}", art.image_type));
        print_pair("Position:", art.pos);
        print_pair("Size:", format!("{} bytes", art.len));
    }
}

fn run(path: &Path, options: &ParseOptions, buffer_len: usize) -> Result<TrackMetadata> {
    let file = Box::new(File::open(path)?);

    Mp4MetadataReader::read_with_stream_options(file, options, SourceStreamOptions { buffer_len })
}

fn main() {
    let matches = clap::Command::new("Melodeon Check")
        .version("1.0")
        .author("The Project Melodeon Developers")
        .about("Print the metadata Melodeon reads from MP4 audio files")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Log the atoms as they are read (debug builds only)"),
        )
        .arg(
            Arg::new("no-implicit-sbr")
                .long("no-implicit-sbr")
                .action(ArgAction::SetTrue)
                .help("Do not assume SBR for low sample rate AAC streams"),
        )
        .arg(
            Arg::new("no-album-art")
                .long("no-album-art")
                .action(ArgAction::SetTrue)
                .help("Do not locate embedded album art"),
        )
        .arg(
            Arg::new("buffer-len")
                .long("buffer-len")
                .value_name("BYTES")
                .value_parser(value_parser!(usize))
                .default_value("4096")
                .help("The read-ahead buffer size"),
        )
        .arg(
            Arg::new("INPUT")
                .help("The input file paths")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .get_matches();

    let mut logger = pretty_env_logger::formatted_builder();

    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }

    if matches.get_flag("verbose") {
        logger.filter_level(LevelFilter::Debug);
    }

    logger.init();

    let options = ParseOptions {
        implicit_sbr: !matches.get_flag("no-implicit-sbr"),
        read_album_art: !matches.get_flag("no-album-art"),
        ..Default::default()
    };

    let buffer_len = matches.get_one::<usize>("buffer-len").copied().unwrap_or(4096).max(1);

    let mut n_failed = 0;

    for path in matches.get_many::<String>("INPUT").into_iter().flatten() {
        println!("Input Path: {}", path);
        println!("|");

        match run(Path::new(path), &options, buffer_len) {
            Ok(meta) => print_metadata(&meta),
            Err(err) => {
                error!("{}: {}", path, err);
                println!("| FAIL");
                n_failed += 1;
            }
        }

        println!();
    }

    std::process::exit(if n_failed == 0 { 0 } else { 1 })
}
