// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    collections::slab_list::{NodeId, SlabList},
    protocols::ctcp::{
        segment::{CtcpHeader, Flags},
        SeqNumber,
    },
    runtime::{
        fail::Fail,
        network::{config::CtcpConfig, DatagramLayer},
    },
};
use ::std::time::{Duration, Instant};

// Structure of entries on our unacknowledged queue.
//
// An entry is enqueued when application data is fragmented, long before it
// necessarily goes on the wire: `sent` distinguishes in-flight entries from
// ones held back because the peer's advertised window is full. The sequence
// number is assigned (and the segment encoded) at first transmission, so
// retransmissions re-hand the exact same bytes to the substrate.
pub struct SentSegment {
    header: CtcpHeader,
    // Payload bytes; empty for the end-of-send (FIN) marker.
    payload: Vec<u8>,
    // Encoded segment, filled at first transmission.
    wire: Vec<u8>,
    time_sent: Instant,
    retransmit_count: usize,
    sent: bool,
}

impl SentSegment {
    /// Sequence-number space this entry occupies: its payload length, except
    /// that the FIN marker consumes exactly one number.
    fn seq_len(&self) -> u32 {
        if self.payload.is_empty() {
            1
        } else {
            self.payload.len() as u32
        }
    }
}

pub struct Sender {
    //
    // Send Sequence Space:
    //
    //                     |<---------------send window size---------------->|
    //                     |                                                 |
    //                 send_base                next_seqno       send_base + send window
    //                     v                        v                        v
    // ... ----------------|------------------------|------------------------|-----------------------------
    //       acknowledged  |  in flight or enqueued |     allowed to send    |  future sequence number space
    //

    // Lowest unacknowledged sequence number.
    send_base: SeqNumber,

    // Sequence number to assign to the next byte put on the wire.
    next_seqno: SeqNumber,

    // Queue of segments awaiting acknowledgement, ascending by seqno.
    // Insertion is always at the tail because assignment is monotonic.
    sent: SlabList<SentSegment>,

    // Free bytes in the local send buffer.
    send_window_avail: usize,

    // Peer's most recently advertised receive window. Until the first ACK
    // arrives this assumes a peer configured symmetrically to us.
    advertised_window: usize,

    // Set once the application hits end-of-stream and the FIN is enqueued.
    fin_sent: bool,

    // Sequence number our FIN went out with, once transmitted.
    fin_seqno: Option<SeqNumber>,

    // Set once an inbound ACK covers the FIN.
    fin_acked: bool,

    // Maximum payload bytes per segment.
    mss: usize,
}

impl Sender {
    pub fn new(initial_seqno: SeqNumber, config: &CtcpConfig) -> Self {
        Self {
            send_base: initial_seqno,
            next_seqno: initial_seqno,
            sent: SlabList::new(),
            send_window_avail: config.get_send_window(),
            advertised_window: config.get_send_window(),
            fin_sent: false,
            fin_seqno: None,
            fin_acked: false,
            mss: config.get_mss(),
        }
    }

    pub fn send_base(&self) -> SeqNumber {
        self.send_base
    }

    pub fn next_seqno(&self) -> SeqNumber {
        self.next_seqno
    }

    /// Free bytes in the local send buffer.
    pub fn window_avail(&self) -> usize {
        self.send_window_avail
    }

    pub fn fin_sent(&self) -> bool {
        self.fin_sent
    }

    pub fn fin_acked(&self) -> bool {
        self.fin_acked
    }

    /// Number of segments awaiting acknowledgement (sent or held).
    pub fn unacked_segments(&self) -> usize {
        self.sent.len()
    }

    /// Number of enqueued segments not yet put on the wire.
    pub fn unsent_segments(&self) -> usize {
        self.sent.iter().filter(|entry| !entry.sent).count()
    }

    /// Fragments application bytes into segments of at most MSS and appends
    /// them to the unacknowledged queue. The caller guarantees `data` fits
    /// in `window_avail()`.
    pub fn enqueue_data(&mut self, data: &[u8], ackno: SeqNumber, window: u16, now: Instant) {
        debug_assert!(!data.is_empty());
        debug_assert!(data.len() <= self.send_window_avail);
        debug_assert!(!self.fin_sent);

        for chunk in data.chunks(self.mss) {
            let header: CtcpHeader = CtcpHeader::new(
                SeqNumber::from(0),
                ackno,
                Flags { ack: true, fin: false },
                window,
            );
            self.sent.push_back(SentSegment {
                header,
                payload: chunk.to_vec(),
                wire: Vec::new(),
                time_sent: now,
                retransmit_count: 0,
                sent: false,
            });
            self.send_window_avail -= chunk.len();
        }
    }

    /// Enqueues the end-of-send marker: a zero-payload `FIN|ACK` segment
    /// consuming one sequence number.
    pub fn enqueue_fin(&mut self, ackno: SeqNumber, window: u16, now: Instant) {
        debug_assert!(!self.fin_sent);
        self.fin_sent = true;

        let header: CtcpHeader = CtcpHeader::new(
            SeqNumber::from(0),
            ackno,
            Flags { ack: true, fin: true },
            window,
        );
        self.sent.push_back(SentSegment {
            header,
            payload: Vec::new(),
            wire: Vec::new(),
            time_sent: now,
            retransmit_count: 0,
            sent: false,
        });
    }

    /// Transmits enqueued segments the peer's advertised window can absorb,
    /// assigning sequence numbers in order at first transmission.
    pub fn push_unsent<D: DatagramLayer>(&mut self, substrate: &mut D, now: Instant) -> Result<(), Fail> {
        let in_flight: usize = u32::from(self.next_seqno - self.send_base) as usize;
        let mut budget: usize = self.advertised_window.saturating_sub(in_flight);

        let mut cursor: Option<NodeId> = self.sent.front_id();
        while let Some(id) = cursor {
            cursor = self.sent.next_id(id);
            let entry: &mut SentSegment = self.sent.get_mut(id);
            if entry.sent {
                continue;
            }
            if budget == 0 {
                break;
            }

            // The sequence number is final from here on; encode once and
            // keep the bytes for retransmission.
            entry.header.seqno = self.next_seqno;
            entry.wire = entry.header.serialize(&entry.payload);
            substrate.transmit(&entry.wire)?;
            entry.time_sent = now;
            entry.retransmit_count += 1;
            entry.sent = true;
            trace!("transmitted: {} payload={}", entry.header, entry.payload.len());

            if entry.payload.is_empty() {
                self.fin_seqno = Some(entry.header.seqno);
            }
            let seq_len: u32 = entry.seq_len();
            budget = budget.saturating_sub(entry.payload.len());
            self.next_seqno = self.next_seqno + SeqNumber::from(seq_len);
        }
        Ok(())
    }

    /// Processes the acknowledgement fields of an inbound segment: adopts
    /// the peer's advertised window and, when `ackno` moves past
    /// `send_base`, frees every fully acknowledged entry at the head of the
    /// queue.
    pub fn process_ack(&mut self, ackno: SeqNumber, peer_window: u16) {
        self.advertised_window = peer_window as usize;

        if ackno > self.send_base {
            if ackno > self.next_seqno {
                warn!("ignoring ACK of data we have yet to send (ackno={})", ackno);
                return;
            }

            self.send_base = ackno;

            while let Some(id) = self.sent.front_id() {
                let entry: &SentSegment = self.sent.get(id);
                if !entry.sent {
                    break;
                }
                let end: SeqNumber = entry.header.seqno + SeqNumber::from(entry.seq_len());
                if end <= self.send_base {
                    let entry: SentSegment = self.sent.remove(id);
                    self.send_window_avail += entry.payload.len();
                } else {
                    break;
                }
            }

            if let Some(fin_seqno) = self.fin_seqno {
                if !self.fin_acked && ackno > fin_seqno {
                    debug!("FIN acknowledged (ackno={})", ackno);
                    self.fin_acked = true;
                }
            }
        } else if ackno == self.send_base {
            // No new data acknowledged: a gap exists upstream. The timer
            // covers it.
            trace!("ACK below window edge (ackno={})", ackno);
        } else {
            trace!("stale ACK (ackno={})", ackno);
        }
    }

    /// Ages every in-flight entry, retransmitting those past the timeout.
    /// Returns `true` when some entry's retransmit count has passed the cap
    /// and the connection must be destroyed.
    ///
    /// Entries held back for a closed window are not aged; they are
    /// first-transmitted by [`Self::push_unsent`] once an ACK reopens the
    /// window.
    pub fn poll_retransmissions<D: DatagramLayer>(
        &mut self,
        substrate: &mut D,
        now: Instant,
        rt_timeout: Duration,
        max_retransmits: usize,
    ) -> Result<bool, Fail> {
        let mut cursor: Option<NodeId> = self.sent.front_id();
        while let Some(id) = cursor {
            cursor = self.sent.next_id(id);
            let entry: &mut SentSegment = self.sent.get_mut(id);
            if !entry.sent {
                continue;
            }
            if entry.retransmit_count > max_retransmits {
                return Ok(true);
            }
            if now.duration_since(entry.time_sent) > rt_timeout {
                // Byte-identical to the original: same seqno, same payload,
                // same checksum.
                substrate.transmit(&entry.wire)?;
                entry.time_sent = now;
                entry.retransmit_count += 1;
                debug!(
                    "retransmitted: {} (count={})",
                    entry.header, entry.retransmit_count
                );
            }
        }
        Ok(false)
    }

    #[cfg(debug_assertions)]
    pub fn check_invariants(&self, send_window: usize) {
        assert!(self.send_base <= self.next_seqno);

        let mut enqueued: usize = 0;
        let mut prev: Option<SeqNumber> = None;
        for entry in self.sent.iter() {
            enqueued += entry.payload.len();
            if entry.sent {
                assert!(entry.header.seqno >= self.send_base);
                if let Some(prev) = prev {
                    assert!(entry.header.seqno > prev);
                }
                prev = Some(entry.header.seqno);
            }
        }
        assert_eq!(self.send_window_avail + enqueued, send_window);
    }
}
