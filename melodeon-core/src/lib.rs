// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project Melodeon shared structs, traits, and I/O used by the metadata readers.

pub mod errors;
pub mod formats;
pub mod io;
pub mod meta;
pub mod scratch;
