// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    collections::slab_list::{NodeId, SlabList},
    protocols::ctcp::SeqNumber,
    runtime::{
        fail::Fail,
        network::{config::CtcpConfig, ApplicationLayer},
    },
};

// A segment received but not yet delivered to the application.
struct RecvSegment {
    seqno: SeqNumber,
    data: Vec<u8>,
}

pub struct Receiver {
    //
    // Receive Sequence Space:
    //
    //                      |<-------------------recv window-------------------->|
    //                      |                                                    |
    //               next_byte_consume           ackno          next_byte_consume + recv window
    //                      v                      v                             v
    // ... -----------------|----------------------|-----------------------------|---------------------------
    //   delivered to app   |  received, in order  |  willing to receive         |  future sequence numbers
    //

    // Lowest sequence number not yet received in order: the cumulative
    // acknowledgement value.
    ackno: SeqNumber,

    // Lowest sequence number not yet delivered to the application.
    next_byte_consume: SeqNumber,

    // Segments received but undelivered, ascending by seqno. Contains the
    // contiguous run [next_byte_consume, ackno) plus any out-of-order
    // segments beyond the gap.
    received: SlabList<RecvSegment>,

    // Free bytes in the local receive buffer; advertised to the peer.
    recv_window_avail: usize,

    // Set once the peer's FIN has been observed (and its one sequence
    // number consumed).
    fin_recv: bool,
}

impl Receiver {
    pub fn new(initial_seqno: SeqNumber, config: &CtcpConfig) -> Self {
        Self {
            ackno: initial_seqno,
            next_byte_consume: initial_seqno,
            received: SlabList::new(),
            recv_window_avail: config.get_recv_window(),
            fin_recv: false,
        }
    }

    /// The cumulative acknowledgement: the next in-order byte we expect.
    pub fn ackno(&self) -> SeqNumber {
        self.ackno
    }

    pub fn next_byte_consume(&self) -> SeqNumber {
        self.next_byte_consume
    }

    /// Free receive-buffer space, as advertised to the peer.
    pub fn window_avail(&self) -> usize {
        self.recv_window_avail
    }

    pub fn fin_recv(&self) -> bool {
        self.fin_recv
    }

    /// Number of received segments awaiting delivery.
    pub fn pending_segments(&self) -> usize {
        self.received.len()
    }

    /// Observes an inbound FIN. The FIN consumes exactly one sequence
    /// number, exactly once; a retransmitted FIN must not re-advance the
    /// cumulative acknowledgement.
    pub fn on_fin(&mut self) -> bool {
        if self.fin_recv {
            return false;
        }
        self.fin_recv = true;
        self.ackno = self.ackno + SeqNumber::from(1);
        true
    }

    /// Places an inbound data segment into the reorder buffer.
    ///
    /// Duplicates (already delivered, or already queued under the same
    /// sequence number) and segments that would overflow the receive buffer
    /// are dropped; the caller acknowledges regardless, so the peer relearns
    /// our window.
    pub fn accept(&mut self, seqno: SeqNumber, data: &[u8]) {
        debug_assert!(!data.is_empty());
        let data_len: usize = data.len();

        if seqno < self.ackno {
            trace!("dropping duplicate of delivered data (seqno={})", seqno);
            return;
        }

        if self.recv_window_avail < data_len {
            warn!(
                "dropping segment that overflows the receive buffer (seqno={}, len={}, avail={})",
                seqno, data_len, self.recv_window_avail
            );
            return;
        }

        // Find the insertion point, keeping the queue ascending by seqno.
        let mut insert_after: Option<NodeId> = None;
        let mut cursor: Option<NodeId> = self.received.front_id();
        while let Some(id) = cursor {
            let entry: &RecvSegment = self.received.get(id);
            if entry.seqno == seqno {
                trace!("dropping duplicate of queued data (seqno={})", seqno);
                return;
            }
            if entry.seqno > seqno {
                break;
            }
            insert_after = Some(id);
            cursor = self.received.next_id(id);
        }

        let segment: RecvSegment = RecvSegment {
            seqno,
            data: data.to_vec(),
        };
        let inserted: NodeId = match insert_after {
            Some(id) => self.received.insert_after(id, segment),
            None => self.received.push_front(segment),
        };
        self.recv_window_avail -= data_len;

        // If the segment landed on the window edge, advance the cumulative
        // acknowledgement across everything now contiguous.
        if seqno == self.ackno {
            let mut cursor: Option<NodeId> = Some(inserted);
            while let Some(id) = cursor {
                let entry: &RecvSegment = self.received.get(id);
                if entry.seqno != self.ackno {
                    break;
                }
                self.ackno = self.ackno + SeqNumber::from(entry.data.len() as u32);
                cursor = self.received.next_id(id);
            }
            trace!("cumulative ack advanced to {}", self.ackno);
        } else {
            debug!("queued out-of-order segment (seqno={}, ackno={})", seqno, self.ackno);
        }
    }

    /// Hands the contiguous prefix of the reorder buffer to the
    /// application, stopping at the first gap or when the application sink
    /// runs out of space. Returns the number of bytes delivered.
    pub fn deliver<A: ApplicationLayer>(&mut self, app: &mut A) -> Result<usize, Fail> {
        let mut delivered: usize = 0;
        while let Some(id) = self.received.front_id() {
            let (seqno, len): (SeqNumber, usize) = {
                let entry: &RecvSegment = self.received.get(id);
                (entry.seqno, entry.data.len())
            };
            if seqno != self.next_byte_consume {
                break;
            }
            if app.free_space() < len {
                debug!("application back-pressure; {} bytes still queued", len);
                break;
            }

            app.output(&self.received.get(id).data)?;
            self.received.remove(id);
            self.next_byte_consume = self.next_byte_consume + SeqNumber::from(len as u32);
            self.recv_window_avail += len;
            delivered += len;
        }
        Ok(delivered)
    }

    #[cfg(debug_assertions)]
    pub fn check_invariants(&self, recv_window: usize) {
        assert!(self.next_byte_consume <= self.ackno);

        let mut queued: usize = 0;
        let mut prev: Option<SeqNumber> = None;
        for entry in self.received.iter() {
            queued += entry.data.len();
            if let Some(prev) = prev {
                assert!(entry.seqno > prev);
            }
            prev = Some(entry.seqno);
        }
        assert_eq!(self.recv_window_avail + queued, recv_window);
    }
}
