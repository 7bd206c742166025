// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    protocols::ctcp::{
        established::{ControlBlock, Disposition},
        peer::{ConnId, CtcpPeer},
    },
    runtime::{fail::Fail, network::config::CtcpConfig},
    test_helpers::runtime::SharedTestRuntime,
};
use ::std::{collections::VecDeque, time::Instant};

/// One endpoint under test: a single-connection peer wired to a
/// [`SharedTestRuntime`] standing in for both the substrate and the
/// application.
pub struct TestEngine {
    pub peer: CtcpPeer<SharedTestRuntime, SharedTestRuntime>,
    pub conn: ConnId,
    rt: SharedTestRuntime,
}

impl TestEngine {
    pub fn new(config: CtcpConfig, sink_capacity: usize) -> Self {
        let rt: SharedTestRuntime = SharedTestRuntime::new(sink_capacity);
        let mut peer: CtcpPeer<SharedTestRuntime, SharedTestRuntime> = CtcpPeer::new();
        let conn: ConnId = peer.register(rt.clone(), rt.clone(), config);
        Self { peer, conn, rt }
    }

    pub fn rt(&self) -> &SharedTestRuntime {
        &self.rt
    }

    pub fn push_input(&self, bytes: &[u8]) {
        self.rt.push_input(bytes);
    }

    pub fn close_input(&self) {
        self.rt.close_input();
    }

    pub fn pop_frames(&self) -> VecDeque<Vec<u8>> {
        self.rt.pop_frames()
    }

    pub fn output(&self) -> Vec<u8> {
        self.rt.output()
    }

    pub fn poll_input(&mut self, now: Instant) -> Result<Disposition, Fail> {
        self.peer.poll_input(self.conn, now)
    }

    pub fn receive(&mut self, frame: &[u8], now: Instant) -> Result<Disposition, Fail> {
        self.peer.receive(self.conn, frame, now)
    }

    pub fn poll_timeouts(&mut self, now: Instant) -> Result<Vec<(ConnId, Disposition)>, Fail> {
        self.peer.poll_timeouts(now)
    }

    /// Borrows the engine state of the connection under test.
    pub fn cb(&self) -> &ControlBlock<SharedTestRuntime, SharedTestRuntime> {
        self.peer.get(self.conn).expect("connection is live")
    }
}
