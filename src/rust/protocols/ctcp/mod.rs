// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

pub mod established;
pub mod peer;
pub mod segment;
mod sequence_number;

#[cfg(test)]
mod tests;

pub use self::{
    established::{ControlBlock, Disposition, State},
    segment::{CtcpHeader, Flags, CTCP_HEADER_SIZE},
    sequence_number::SeqNumber,
};
