// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//==============================================================================
// Exports
//==============================================================================

pub mod config;
pub mod consts;

//==============================================================================
// Imports
//==============================================================================

use crate::runtime::fail::Fail;

//==============================================================================
// Structures
//==============================================================================

/// Outcome of polling the application for input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputPoll {
    /// The application reached end-of-stream; no further input will come.
    Closed,
    /// No bytes are ready right now.
    NotReady,
    /// This many bytes were read into the caller's buffer.
    Read(usize),
}

//==============================================================================
// Traits
//==============================================================================

/// The datagram substrate underneath a connection.
///
/// The substrate is connected to a single pre-bound peer, is non-blocking,
/// and is best-effort: a short write counts as success because the datagram
/// protocol preserves record boundaries, and lost datagrams are recovered by
/// retransmission above.
pub trait DatagramLayer {
    /// Hands one encoded segment to the substrate.
    fn transmit(&mut self, bytes: &[u8]) -> Result<usize, Fail>;

    /// Releases substrate resources. Called exactly once, on teardown.
    fn close(&mut self);
}

/// The application byte source and sink on top of a connection.
pub trait ApplicationLayer {
    /// Polls the application for outbound bytes, reading at most
    /// `buf.len()`.
    fn input(&mut self, buf: &mut [u8]) -> InputPoll;

    /// Delivers in-order bytes to the application's downstream sink. The
    /// engine only calls this after checking `free_space()`, so the sink
    /// must accept the full slice.
    fn output(&mut self, buf: &[u8]) -> Result<(), Fail>;

    /// Free capacity of the application sink, in bytes.
    fn free_space(&self) -> usize;
}
