// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Imports
//==============================================================================

use ::libc::{c_int, EIO};
use ::std::{error, fmt, io};

//==============================================================================
// Structures
//==============================================================================

/// Error value for every fallible engine operation.
///
/// Each failure carries the errno it classifies as plus a human-readable
/// cause. The engine draws from a small taxonomy: `EBADMSG` for segments
/// the codec rejects, `EBADF` for stale connection ids, and whatever errno
/// the host's I/O layers report for substrate or sink trouble. Hosts
/// following C conventions can surface the errno directly as an exit or
/// return code.
#[derive(Clone, Debug)]
pub struct Fail {
    /// Errno classifying the failure.
    pub errno: c_int,
    /// What went wrong.
    pub cause: String,
}

//==============================================================================
// Associate Functions
//==============================================================================

impl Fail {
    pub fn new(errno: c_int, cause: &str) -> Self {
        Self {
            errno,
            cause: cause.to_string(),
        }
    }
}

//==============================================================================
// Trait Implementations
//==============================================================================

impl fmt::Display for Fail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", self.cause, self.errno)
    }
}

impl error::Error for Fail {}

/// Host I/O errors keep their OS errno when they carry one; synthesized
/// errors (e.g. `WouldBlock` surfaced by a wrapper) fall back to `EIO`.
impl From<io::Error> for Fail {
    fn from(e: io::Error) -> Self {
        Self {
            errno: e.raw_os_error().unwrap_or(EIO),
            cause: e.to_string(),
        }
    }
}
