// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    protocols::ctcp::{
        established::{receiver::Receiver, sender::Sender},
        segment::{CtcpHeader, Flags},
        SeqNumber,
    },
    runtime::{
        fail::Fail,
        network::{config::CtcpConfig, ApplicationLayer, DatagramLayer, InputPoll},
    },
};
use ::std::time::Instant;

// Without a handshake, both directions of every connection start here.
const INITIAL_SEQNO: u32 = 1;

/// Connection teardown state, derived from which of the four close events
/// have occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Neither side has sent a FIN.
    Open,
    /// Our FIN is enqueued or in flight; the peer's has not arrived.
    ClosingLocal,
    /// The peer's FIN arrived; ours has not been sent.
    ClosingRemote,
    /// Both FINs observed, ours not yet acknowledged.
    ClosingBoth,
    /// Both halves closed: our FIN acknowledged and the peer's received.
    Closed,
}

/// What became of a connection during a callback.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// Still exchanging data.
    Alive,
    /// Teardown completed on both halves; destroy the connection.
    Closed,
    /// Retransmission cap breached; destroy the connection and report
    /// failure.
    Expired,
}

/// Per-connection engine state.
///
/// Owns both halves of the connection plus the substrate and application
/// handles. The host drives it through three serial callbacks (application
/// input became readable, [`Self::poll_input`]; a datagram arrived,
/// [`Self::receive`]; a periodic tick, [`Self::poll_timeouts`]) and
/// destroys it when any callback reports a terminal [`Disposition`].
pub struct ControlBlock<D: DatagramLayer, A: ApplicationLayer> {
    substrate: D,
    app: A,
    config: CtcpConfig,
    sender: Sender,
    receiver: Receiver,
}

impl<D: DatagramLayer, A: ApplicationLayer> ControlBlock<D, A> {
    pub fn new(substrate: D, app: A, config: CtcpConfig) -> Self {
        let sender: Sender = Sender::new(SeqNumber::from(INITIAL_SEQNO), &config);
        let receiver: Receiver = Receiver::new(SeqNumber::from(INITIAL_SEQNO), &config);
        Self {
            substrate,
            app,
            config,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> State {
        match (
            self.sender.fin_sent(),
            self.receiver.fin_recv(),
            self.sender.fin_acked(),
        ) {
            (false, false, _) => State::Open,
            (true, false, _) => State::ClosingLocal,
            (false, true, _) => State::ClosingRemote,
            (true, true, false) => State::ClosingBoth,
            (true, true, true) => State::Closed,
        }
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    /// The application signalled that input may be readable: pull bytes (up
    /// to the free send-buffer space), fragment and enqueue them, and
    /// transmit whatever the peer's window can absorb. An end-of-stream
    /// enqueues the FIN instead.
    pub fn poll_input(&mut self, now: Instant) -> Result<Disposition, Fail> {
        if self.sender.fin_sent() {
            // Nothing more will be accepted from the application.
            return Ok(Disposition::Alive);
        }

        let avail: usize = self.sender.window_avail();
        if avail == 0 {
            // Back-pressure: the send buffer is full.
            return Ok(Disposition::Alive);
        }

        let mut buf: Vec<u8> = vec![0u8; avail];
        let ackno: SeqNumber = self.receiver.ackno();
        let window: u16 = self.advertised_window();
        match self.app.input(&mut buf) {
            InputPoll::Closed => {
                debug!("application end-of-stream; enqueueing FIN");
                self.sender.enqueue_fin(ackno, window, now);
            },
            InputPoll::NotReady => (),
            InputPoll::Read(count) => {
                debug_assert!(count <= avail);
                if count > 0 {
                    self.sender.enqueue_data(&buf[..count], ackno, window, now);
                }
            },
        }

        self.sender.push_unsent(&mut self.substrate, now)?;
        self.check_invariants();
        Ok(Disposition::Alive)
    }

    /// A datagram arrived from the substrate.
    ///
    /// Corrupt segments are dropped silently (no acknowledgement; the peer's
    /// timer covers them). Valid segments run teardown hooks, then the
    /// acknowledgement path, then the data path, and finally elicit an ACK
    /// whenever they carried data or a FIN, even if the payload itself was
    /// dropped, so the peer relearns our cumulative acknowledgement and
    /// window.
    pub fn receive(&mut self, datagram: &[u8], now: Instant) -> Result<Disposition, Fail> {
        let (header, payload): (CtcpHeader, &[u8]) = match CtcpHeader::parse(datagram) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("dropping corrupted segment: {:?}", e);
                return Ok(Disposition::Alive);
            },
        };
        trace!("receive: {} payload={}", header, payload.len());

        let mut must_ack: bool = false;

        if header.flags.fin {
            if self.receiver.on_fin() {
                debug!("peer FIN received (state={:?})", self.state());
            } else {
                trace!("duplicate peer FIN");
            }
            must_ack = true;
        }

        if header.flags.ack {
            self.sender.process_ack(header.ackno, header.window);

            // The acknowledgement may have opened the peer's window; held
            // segments get their first transmission here.
            self.sender.push_unsent(&mut self.substrate, now)?;
        }

        if !payload.is_empty() {
            self.receiver.accept(header.seqno, payload);
            self.receiver.deliver(&mut self.app)?;
            must_ack = true;
        }

        if must_ack {
            self.send_ack()?;
        }

        self.check_invariants();
        if self.state() == State::Closed {
            debug!("teardown complete");
            return Ok(Disposition::Closed);
        }
        Ok(Disposition::Alive)
    }

    /// Periodic tick: age in-flight segments and retransmit the overdue
    /// ones, then retry application delivery in case the sink freed space
    /// (advertising the reopened window when it did).
    pub fn poll_timeouts(&mut self, now: Instant) -> Result<Disposition, Fail> {
        let expired: bool = self.sender.poll_retransmissions(
            &mut self.substrate,
            now,
            self.config.get_rt_timeout(),
            self.config.get_max_retransmits(),
        )?;
        if expired {
            error!("retransmission cap exceeded; killing connection");
            return Ok(Disposition::Expired);
        }

        let delivered: usize = self.receiver.deliver(&mut self.app)?;
        if delivered > 0 {
            self.send_ack()?;
        }

        self.check_invariants();
        Ok(Disposition::Alive)
    }

    /// Tears the connection down, releasing the substrate. Called exactly
    /// once, by the registry, after a terminal disposition.
    pub fn destroy(mut self) {
        self.substrate.close();
    }

    /// Emits a bare ACK carrying the current cumulative acknowledgement and
    /// receive window.
    fn send_ack(&mut self) -> Result<(), Fail> {
        let header: CtcpHeader = CtcpHeader::new(
            self.sender.next_seqno(),
            self.receiver.ackno(),
            Flags { ack: true, fin: false },
            self.advertised_window(),
        );
        let wire: Vec<u8> = header.serialize(&[]);
        self.substrate.transmit(&wire)?;
        trace!("sent ACK: {}", header);
        Ok(())
    }

    fn advertised_window(&self) -> u16 {
        self.receiver.window_avail().min(u16::MAX as usize) as u16
    }

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        self.sender.check_invariants(self.config.get_send_window());
        self.receiver.check_invariants(self.config.get_recv_window());
    }

    #[cfg(not(debug_assertions))]
    fn check_invariants(&self) {}
}
