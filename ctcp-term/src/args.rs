// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//======================================================================================================================
// Imports
//======================================================================================================================

use ::anyhow::Result;
use ::clap::{Arg, ArgMatches, Command};
use ::std::{net::SocketAddr, str::FromStr, time::Duration};

//======================================================================================================================
// Program Arguments
//======================================================================================================================

/// Program Arguments
#[derive(Debug)]
pub struct ProgramArguments {
    /// Local socket address to bind.
    local: SocketAddr,
    /// Remote peer socket address.
    peer: SocketAddr,
    /// Optional YAML configuration file.
    config_path: Option<String>,
    /// Send buffer size (in bytes).
    send_window: Option<usize>,
    /// Receive buffer size (in bytes).
    recv_window: Option<usize>,
    /// Retransmission timeout (in milliseconds).
    rt_timeout: Option<Duration>,
    /// Retransmission cap.
    max_retransmits: Option<usize>,
    /// Maximum segment size (in bytes).
    mss: Option<usize>,
}

/// Associate functions for Program Arguments
impl ProgramArguments {
    /// Parses the program arguments from the command line interface.
    pub fn new(app_name: &'static str, app_author: &'static str, app_about: &'static str) -> Result<Self> {
        let matches: ArgMatches = Command::new(app_name)
            .author(app_author)
            .about(app_about)
            .arg(
                Arg::new("local")
                    .long("local")
                    .value_parser(clap::value_parser!(String))
                    .required(true)
                    .value_name("ADDRESS:PORT")
                    .help("Sets local socket address"),
            )
            .arg(
                Arg::new("peer")
                    .long("peer")
                    .value_parser(clap::value_parser!(String))
                    .required(true)
                    .value_name("ADDRESS:PORT")
                    .help("Sets remote peer socket address"),
            )
            .arg(
                Arg::new("config")
                    .long("config")
                    .value_parser(clap::value_parser!(String))
                    .required(false)
                    .value_name("FILE")
                    .help("Sets configuration file"),
            )
            .arg(
                Arg::new("send-window")
                    .long("send-window")
                    .value_parser(clap::value_parser!(usize))
                    .required(false)
                    .value_name("BYTES")
                    .help("Sets send buffer size"),
            )
            .arg(
                Arg::new("recv-window")
                    .long("recv-window")
                    .value_parser(clap::value_parser!(usize))
                    .required(false)
                    .value_name("BYTES")
                    .help("Sets receive buffer size"),
            )
            .arg(
                Arg::new("rt-timeout")
                    .long("rt-timeout")
                    .value_parser(clap::value_parser!(u64))
                    .required(false)
                    .value_name("MILLISECONDS")
                    .help("Sets retransmission timeout"),
            )
            .arg(
                Arg::new("max-retransmits")
                    .long("max-retransmits")
                    .value_parser(clap::value_parser!(usize))
                    .required(false)
                    .value_name("NUMBER")
                    .help("Sets retransmission cap"),
            )
            .arg(
                Arg::new("mss")
                    .long("mss")
                    .value_parser(clap::value_parser!(usize))
                    .required(false)
                    .value_name("BYTES")
                    .help("Sets maximum segment size"),
            )
            .get_matches();

        let local: SocketAddr = {
            let addr: &String = matches.get_one::<String>("local").expect("missing local address");
            SocketAddr::from_str(addr)?
        };
        let peer: SocketAddr = {
            let addr: &String = matches.get_one::<String>("peer").expect("missing peer address");
            SocketAddr::from_str(addr)?
        };

        Ok(Self {
            local,
            peer,
            config_path: matches.get_one::<String>("config").cloned(),
            send_window: matches.get_one::<usize>("send-window").copied(),
            recv_window: matches.get_one::<usize>("recv-window").copied(),
            rt_timeout: matches.get_one::<u64>("rt-timeout").copied().map(Duration::from_millis),
            max_retransmits: matches.get_one::<usize>("max-retransmits").copied(),
            mss: matches.get_one::<usize>("mss").copied(),
        })
    }

    pub fn local(&self) -> SocketAddr {
        self.local
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    pub fn send_window(&self) -> Option<usize> {
        self.send_window
    }

    pub fn recv_window(&self) -> Option<usize> {
        self.recv_window
    }

    pub fn rt_timeout(&self) -> Option<Duration> {
        self.rt_timeout
    }

    pub fn max_retransmits(&self) -> Option<usize> {
        self.max_retransmits
    }

    pub fn mss(&self) -> Option<usize> {
        self.mss
    }
}
