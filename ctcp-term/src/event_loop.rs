// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use crate::runtime::{StdioApplication, UdpSubstrate};
use ::anyhow::Result;
use ::ctcp::{runtime::Clock, ConnId, CtcpPeer, Disposition};
use ::libc::{pollfd, POLLHUP, POLLIN};
use ::log::{debug, warn};
use ::std::{
    io,
    net::UdpSocket,
    os::fd::AsRawFd,
    time::{Duration, Instant},
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// How often the engine's retransmission timers are polled.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Receive buffer for inbound datagrams; comfortably above the largest
/// segment the codec accepts.
const RECV_BUFFER_SIZE: usize = 2048;

//======================================================================================================================
// Event Loop
//======================================================================================================================

/// Serial dispatcher for the engine's three callbacks.
///
/// A single `poll(2)` watches the substrate socket and stdin; its timeout
/// doubles as the timer tick. Callbacks never overlap, matching the
/// engine's single-threaded contract. The loop ends when the connection
/// reaches a terminal disposition: exit code 0 for an orderly close,
/// non-zero for a retransmission-cap breach.
pub struct EventLoop {
    peer: CtcpPeer<UdpSubstrate, StdioApplication>,
    conn: ConnId,
    socket: UdpSocket,
    clock: Clock,
}

impl EventLoop {
    pub fn new(peer: CtcpPeer<UdpSubstrate, StdioApplication>, conn: ConnId, socket: UdpSocket) -> Self {
        Self {
            peer,
            conn,
            socket,
            clock: Clock::new(Instant::now()),
        }
    }

    pub fn run(mut self) -> Result<i32> {
        let mut fds: [pollfd; 2] = [
            pollfd {
                fd: self.socket.as_raw_fd(),
                events: POLLIN,
                revents: 0,
            },
            pollfd {
                fd: libc::STDIN_FILENO,
                events: POLLIN,
                revents: 0,
            },
        ];
        let mut last_tick: Instant = self.clock.now();

        // Input may already be waiting before the first readiness event.
        self.peer.poll_input(self.conn, self.clock.now())?;

        loop {
            let rc: i32 = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, TICK_INTERVAL.as_millis() as i32) };
            if rc < 0 {
                let e: io::Error = io::Error::last_os_error();
                if e.raw_os_error() == Some(libc::EINTR) {
                    continue;
                }
                return Err(e.into());
            }

            // One timestamp per iteration: every callback dispatched below
            // observes the same instant.
            self.clock.advance_clock(Instant::now());
            let now: Instant = self.clock.now();

            if fds[0].revents & POLLIN != 0 {
                if let Some(code) = self.drain_socket(now)? {
                    return Ok(code);
                }
            }

            if fds[1].revents & (POLLIN | POLLHUP) != 0 {
                if let Some(code) = exit_code(self.peer.poll_input(self.conn, now)?) {
                    return Ok(code);
                }
                // Once end-of-stream has been read the engine takes no more
                // input; drop stdin from the poll set so a closed descriptor
                // cannot spin the loop.
                if self.peer.get(self.conn)?.sender().fin_sent() {
                    debug!("end-of-stream read; no longer polling stdin");
                    fds[1].fd = -1;
                }
            }

            if now.duration_since(last_tick) >= TICK_INTERVAL {
                last_tick = now;
                for (_, disposition) in self.peer.poll_timeouts(now)? {
                    if let Some(code) = exit_code(disposition) {
                        return Ok(code);
                    }
                }
            }
        }
    }

    /// Feeds every queued datagram to the engine.
    fn drain_socket(&mut self, now: Instant) -> Result<Option<i32>> {
        let mut buf: [u8; RECV_BUFFER_SIZE] = [0u8; RECV_BUFFER_SIZE];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(nread) => {
                    let disposition: Disposition = self.peer.receive(self.conn, &buf[..nread], now)?;
                    if let Some(code) = exit_code(disposition) {
                        return Ok(Some(code));
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => {
                    // A connected UDP socket surfaces ICMP errors (e.g. the
                    // peer is not up yet) as recv failures. Retransmission
                    // handles the gap.
                    warn!("recv failed: {:?}", e);
                    return Ok(None);
                },
            }
        }
    }
}

//======================================================================================================================
// Standalone Functions
//======================================================================================================================

fn exit_code(disposition: Disposition) -> Option<i32> {
    match disposition {
        Disposition::Alive => None,
        Disposition::Closed => Some(0),
        Disposition::Expired => Some(1),
    }
}
