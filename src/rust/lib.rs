// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! cTCP: a reliable, bidirectional byte-stream transport layered over an
//! unreliable datagram substrate.
//!
//! The crate is a per-connection protocol engine: a sliding-window sender, a
//! reordering receiver, a timer-driven retransmitter, and a four-event
//! teardown state machine. It performs no I/O of its own; the host supplies a
//! datagram channel and an application byte source/sink (see
//! [`runtime::network`]) and drives the engine through three serial
//! callbacks: input became readable, a datagram arrived, and a periodic tick.

#![cfg_attr(feature = "strict", deny(warnings))]
#![deny(clippy::all)]

mod collections;

pub mod runtime;

pub mod protocols;

#[macro_use]
extern crate log;

#[cfg(test)]
pub mod test_helpers;

pub use crate::{
    protocols::ctcp::{
        peer::{ConnId, CtcpPeer},
        Disposition, SeqNumber, State,
    },
    runtime::{
        fail::Fail,
        network::{
            config::CtcpConfig,
            ApplicationLayer, DatagramLayer, InputPoll,
        },
    },
};

/// Asserts that two expressions are equal, bailing out of the enclosing
/// `Result`-returning test instead of panicking.
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        if *left != *right {
            anyhow::bail!(
                "ensure_eq!({}, {}) failed: {:?} != {:?} at {}:{}",
                stringify!($left),
                stringify!($right),
                left,
                right,
                file!(),
                line!()
            );
        }
    }};
}

/// Asserts that two expressions are not equal, bailing out of the enclosing
/// `Result`-returning test instead of panicking.
#[macro_export]
macro_rules! ensure_neq {
    ($left:expr, $right:expr) => {{
        let left = &$left;
        let right = &$right;
        if *left == *right {
            anyhow::bail!(
                "ensure_neq!({}, {}) failed: both are {:?} at {}:{}",
                stringify!($left),
                stringify!($right),
                left,
                file!(),
                line!()
            );
        }
    }};
}
