// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::runtime::{
    fail::Fail,
    network::{ApplicationLayer, DatagramLayer, InputPoll},
};
use ::std::{cell::RefCell, collections::VecDeque, rc::Rc};

// Backing state for one side of a test connection: the frames the engine
// handed to the substrate, the bytes staged as application input, and the
// bytes the engine delivered to the application sink.
struct TestRuntimeState {
    outgoing: VecDeque<Vec<u8>>,
    input: VecDeque<u8>,
    input_closed: bool,
    output: Vec<u8>,
    sink_capacity: usize,
    substrate_closed: bool,
}

/// A test double standing in for both consumed contracts: the datagram
/// substrate (captures transmitted frames for the test to shuttle) and the
/// application (byte queues the test stages and inspects). Cloning shares
/// the underlying state, so one instance can be registered as both layers.
#[derive(Clone)]
pub struct SharedTestRuntime(Rc<RefCell<TestRuntimeState>>);

impl SharedTestRuntime {
    pub fn new(sink_capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(TestRuntimeState {
            outgoing: VecDeque::new(),
            input: VecDeque::new(),
            input_closed: false,
            output: Vec::new(),
            sink_capacity,
            substrate_closed: false,
        })))
    }

    /// Stages bytes for the engine to read as application input.
    pub fn push_input(&self, bytes: &[u8]) {
        self.0.borrow_mut().input.extend(bytes.iter().copied());
    }

    /// Marks the application input as end-of-stream once drained.
    pub fn close_input(&self) {
        self.0.borrow_mut().input_closed = true;
    }

    /// Takes every frame the engine has transmitted since the last call.
    pub fn pop_frames(&self) -> VecDeque<Vec<u8>> {
        ::std::mem::take(&mut self.0.borrow_mut().outgoing)
    }

    /// Bytes delivered to the application sink so far.
    pub fn output(&self) -> Vec<u8> {
        self.0.borrow().output.clone()
    }

    pub fn output_len(&self) -> usize {
        self.0.borrow().output.len()
    }

    /// Resizes the application sink, e.g. to lift back-pressure mid-test.
    pub fn set_sink_capacity(&self, capacity: usize) {
        self.0.borrow_mut().sink_capacity = capacity;
    }

    pub fn substrate_closed(&self) -> bool {
        self.0.borrow().substrate_closed
    }
}

impl DatagramLayer for SharedTestRuntime {
    fn transmit(&mut self, bytes: &[u8]) -> Result<usize, Fail> {
        self.0.borrow_mut().outgoing.push_back(bytes.to_vec());
        Ok(bytes.len())
    }

    fn close(&mut self) {
        self.0.borrow_mut().substrate_closed = true;
    }
}

impl ApplicationLayer for SharedTestRuntime {
    fn input(&mut self, buf: &mut [u8]) -> InputPoll {
        let mut state = self.0.borrow_mut();
        if state.input.is_empty() {
            return if state.input_closed {
                InputPoll::Closed
            } else {
                InputPoll::NotReady
            };
        }
        let count: usize = buf.len().min(state.input.len());
        for (dst, src) in buf.iter_mut().zip(state.input.drain(..count)) {
            *dst = src;
        }
        InputPoll::Read(count)
    }

    fn output(&mut self, buf: &[u8]) -> Result<(), Fail> {
        let mut state = self.0.borrow_mut();
        debug_assert!(state.output.len() + buf.len() <= state.sink_capacity);
        state.output.extend_from_slice(buf);
        Ok(())
    }

    fn free_space(&self) -> usize {
        let state = self.0.borrow();
        state.sink_capacity.saturating_sub(state.output.len())
    }
}
