// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Exports
//======================================================================================================================


//======================================================================================================================
// Imports
//======================================================================================================================

use crate::protocols::ctcp::segment::CtcpHeader;
use ::anyhow::Result;

//======================================================================================================================
// Helper Functions
//======================================================================================================================

/// Parses a frame captured off a test substrate, failing the test on a
/// codec reject.
pub fn parse_frame(frame: &[u8]) -> Result<(CtcpHeader, Vec<u8>)> {
    match CtcpHeader::parse(frame) {
        Ok((header, payload)) => Ok((header, payload.to_vec())),
        Err(e) => anyhow::bail!("test frame failed to parse: {:?}", e),
    }
}

/// Cooks a patterned buffer so misordered delivery is caught by a plain
/// equality check.
pub fn cook_buffer(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}
