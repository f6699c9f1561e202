// Melodeon
// Copyright (c) 2026 The Project Melodeon Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// A four character code, printed as text when it is valid UTF-8.
#[derive(PartialEq, Eq, Clone, Copy)]
#[repr(transparent)]
pub struct FourCc {
    val: [u8; 4],
}

impl FourCc {
    /// Construct a new FourCC code from the given byte array.
    pub fn new(val: [u8; 4]) -> Self {
        Self { val }
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.val) {
            Ok(name) => write!(f, "'{}'", name),
            _ => write!(f, "{:x?}", self.val),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FourCc;

    #[test]
    fn verify_fourcc_debug() {
        assert_eq!(format!("{:?}", FourCc::new(*b"M4A ")), "'M4A '");
        assert_eq!(format!("{:?}", FourCc::new([0xa9, b'n', b'a', b'm'])), "[a9, 6e, 61, 6d]");
    }
}
