// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::ctcp::{ApplicationLayer, DatagramLayer, Fail, InputPoll};
use ::libc::EIO;
use ::log::{debug, warn};
use ::std::{
    io::{self, Write},
    net::UdpSocket,
};

//======================================================================================================================
// Constants
//======================================================================================================================

/// Free space reported for the stdout sink. Writes to it are blocking and
/// complete in full, so this only bounds how much one delivery pass hands
/// over.
const STDOUT_FREE_SPACE: usize = 64 * 1024;

//======================================================================================================================
// UDP Substrate
//======================================================================================================================

/// The datagram substrate: a connected, non-blocking UDP socket.
pub struct UdpSubstrate {
    socket: UdpSocket,
}

impl UdpSubstrate {
    pub fn new(socket: UdpSocket) -> Self {
        Self { socket }
    }
}

impl DatagramLayer for UdpSubstrate {
    /// Best-effort transmission. A datagram refused by the local stack is
    /// indistinguishable from one lost on the wire; the retransmission
    /// timer covers both, so send errors never surface to the engine.
    fn transmit(&mut self, bytes: &[u8]) -> Result<usize, Fail> {
        match self.socket.send(bytes) {
            Ok(nsent) => Ok(nsent),
            Err(e) => {
                warn!("send failed, treating as loss: {:?}", e);
                Ok(0)
            },
        }
    }

    fn close(&mut self) {
        // UDP holds no per-connection state; the descriptor is released
        // when the engine drops this handle.
        debug!("substrate handle released");
    }
}

//======================================================================================================================
// Stdio Application
//======================================================================================================================

/// The application layer: bytes come from stdin and go to stdout.
pub struct StdioApplication {
    stdout: io::Stdout,
}

impl StdioApplication {
    /// Puts stdin into non-blocking mode so the engine's input poll never
    /// stalls the event loop.
    pub fn new() -> Result<Self, Fail> {
        let flags: i32 = unsafe { libc::fcntl(libc::STDIN_FILENO, libc::F_GETFL) };
        if flags < 0 {
            return Err(Fail::new(EIO, "failed to read stdin flags"));
        }
        if unsafe { libc::fcntl(libc::STDIN_FILENO, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
            return Err(Fail::new(EIO, "failed to set stdin non-blocking"));
        }
        Ok(Self { stdout: io::stdout() })
    }
}

impl ApplicationLayer for StdioApplication {
    fn input(&mut self, buf: &mut [u8]) -> InputPoll {
        let nread: isize =
            unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        match nread {
            0 => InputPoll::Closed,
            n if n > 0 => InputPoll::Read(n as usize),
            _ => {
                let e: io::Error = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::WouldBlock {
                    InputPoll::NotReady
                } else {
                    warn!("stdin read failed, treating as end-of-stream: {:?}", e);
                    InputPoll::Closed
                }
            },
        }
    }

    fn output(&mut self, buf: &[u8]) -> Result<(), Fail> {
        self.stdout.write_all(buf)?;
        self.stdout.flush()?;
        Ok(())
    }

    fn free_space(&self) -> usize {
        STDOUT_FREE_SPACE
    }
}
