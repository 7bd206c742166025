// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

#![deny(clippy::all)]

//======================================================================================================================
// Imports
//======================================================================================================================

mod args;
mod config;
mod event_loop;
mod runtime;

use crate::{
    args::ProgramArguments,
    config::FileConfig,
    event_loop::EventLoop,
    runtime::{StdioApplication, UdpSubstrate},
};
use ::anyhow::Result;
use ::ctcp::{ConnId, CtcpConfig, CtcpPeer};
use ::log::info;
use ::std::{net::UdpSocket, process};

//======================================================================================================================
// Entry Point
//======================================================================================================================

fn main() -> Result<()> {
    ctcp::runtime::logging::initialize();

    let args: ProgramArguments = ProgramArguments::new(
        "ctcp-term",
        "Microsoft Corporation",
        "Reliable byte-stream terminal over an unreliable datagram substrate",
    )?;

    let file: FileConfig = match args.config_path() {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config: CtcpConfig = CtcpConfig::new(
        args.send_window().or(file.send_window),
        args.recv_window().or(file.recv_window),
        args.rt_timeout().or(file.rt_timeout),
        args.max_retransmits().or(file.max_retransmits),
        args.mss().or(file.mss),
    );

    // One engine instance per peer: the socket is bound and connected up
    // front, so every datagram on it belongs to this connection.
    let socket: UdpSocket = UdpSocket::bind(args.local())?;
    socket.connect(args.peer())?;
    socket.set_nonblocking(true)?;
    info!("connected {} <-> {}", args.local(), args.peer());

    let substrate: UdpSubstrate = UdpSubstrate::new(socket.try_clone()?);
    let app: StdioApplication = StdioApplication::new()?;

    let mut peer: CtcpPeer<UdpSubstrate, StdioApplication> = CtcpPeer::new();
    let conn: ConnId = peer.register(substrate, app, config);

    let exit_code: i32 = EventLoop::new(peer, conn, socket).run()?;
    process::exit(exit_code)
}
