// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::{
    protocols::ctcp::established::{ControlBlock, Disposition},
    runtime::{
        fail::Fail,
        network::{config::CtcpConfig, ApplicationLayer, DatagramLayer},
    },
};
use ::libc::EBADF;
use ::slab::Slab;
use ::std::{fmt, time::Instant};

//======================================================================================================================
// Structures
//======================================================================================================================

/// Stable handle to a live connection in a [`CtcpPeer`] registry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnId(u32);

/// Registry and dispatcher for live connections.
///
/// The host event loop owns one peer per process, registers a connection
/// whenever the substrate hands it a live channel, and fans the three serial
/// callbacks out to the per-connection engines. When a callback reports a
/// terminal [`Disposition`] the connection is removed from the registry and
/// destroyed before the call returns; the stale [`ConnId`] then fails with
/// `EBADF`.
pub struct CtcpPeer<D: DatagramLayer, A: ApplicationLayer> {
    table: Slab<ControlBlock<D, A>>,
}

//======================================================================================================================
// Associated Functions
//======================================================================================================================

impl<D: DatagramLayer, A: ApplicationLayer> CtcpPeer<D, A> {
    pub fn new() -> Self {
        Self { table: Slab::new() }
    }

    /// Registers a live connection, taking ownership of its substrate and
    /// application handles.
    pub fn register(&mut self, substrate: D, app: A, config: CtcpConfig) -> ConnId {
        let index: usize = self.table.insert(ControlBlock::new(substrate, app, config));
        let conn: ConnId = ConnId(index as u32);
        debug!("registered connection {}", conn);
        conn
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Borrows a connection's engine state.
    pub fn get(&self, conn: ConnId) -> Result<&ControlBlock<D, A>, Fail> {
        match self.table.get(conn.0 as usize) {
            Some(cb) => Ok(cb),
            None => Err(Fail::new(EBADF, "invalid connection id")),
        }
    }

    /// Application input became readable on the given connection.
    pub fn poll_input(&mut self, conn: ConnId, now: Instant) -> Result<Disposition, Fail> {
        let disposition: Disposition = self.get_mut(conn)?.poll_input(now)?;
        self.reap(conn, disposition)
    }

    /// A datagram arrived on the given connection's substrate.
    pub fn receive(&mut self, conn: ConnId, datagram: &[u8], now: Instant) -> Result<Disposition, Fail> {
        let disposition: Disposition = self.get_mut(conn)?.receive(datagram, now)?;
        self.reap(conn, disposition)
    }

    /// Periodic tick: ages retransmission timers (and retries application
    /// delivery) on every live connection. Returns the connections that
    /// reached a terminal disposition; each has already been destroyed.
    pub fn poll_timeouts(&mut self, now: Instant) -> Result<Vec<(ConnId, Disposition)>, Fail> {
        let conns: Vec<usize> = self.table.iter().map(|(index, _)| index).collect();

        let mut events: Vec<(ConnId, Disposition)> = Vec::new();
        for index in conns {
            let conn: ConnId = ConnId(index as u32);
            let disposition: Disposition = match self.table.get_mut(index) {
                Some(cb) => cb.poll_timeouts(now)?,
                None => continue,
            };
            if disposition != Disposition::Alive {
                self.reap(conn, disposition)?;
                events.push((conn, disposition));
            }
        }
        Ok(events)
    }

    /// Removes a connection from the registry and destroys it: all buffered
    /// segments are freed and the substrate handle is closed. Removal
    /// precedes destruction, so no further callback can reach the state.
    pub fn destroy(&mut self, conn: ConnId) -> Result<(), Fail> {
        if !self.table.contains(conn.0 as usize) {
            return Err(Fail::new(EBADF, "invalid connection id"));
        }
        debug!("destroying connection {}", conn);
        let cb: ControlBlock<D, A> = self.table.remove(conn.0 as usize);
        cb.destroy();
        Ok(())
    }

    fn get_mut(&mut self, conn: ConnId) -> Result<&mut ControlBlock<D, A>, Fail> {
        match self.table.get_mut(conn.0 as usize) {
            Some(cb) => Ok(cb),
            None => Err(Fail::new(EBADF, "invalid connection id")),
        }
    }

    fn reap(&mut self, conn: ConnId, disposition: Disposition) -> Result<Disposition, Fail> {
        match disposition {
            Disposition::Alive => Ok(disposition),
            Disposition::Closed | Disposition::Expired => {
                self.destroy(conn)?;
                Ok(disposition)
            },
        }
    }
}

//======================================================================================================================
// Trait Implementations
//======================================================================================================================

impl<D: DatagramLayer, A: ApplicationLayer> Default for CtcpPeer<D, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ConnId> for u32 {
    fn from(conn: ConnId) -> u32 {
        conn.0
    }
}

impl From<u32> for ConnId {
    fn from(index: u32) -> Self {
        ConnId(index)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
