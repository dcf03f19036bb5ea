//! CLI (CommandLine Interface) utilities for the triplet demo and benchmarks.
//!
//! Here, you can know the options of a run through enum types and structs.
//! See [triplet](crate::triplet) for what the options mean to the protocol.

use crate::channel_utils::sync_channel::{create_unix_channel_pair, UnixChannel};
use crate::channel_utils::sync_channel_by_cb::{create_crossbeam_channel_pair, CrossbeamChannel};
use crate::channel_utils::tcp_channel::{create_tcp_channel_pair, TcpChannel};
use crate::fixed_point::{ElementKind, FIXED_POINT_COMPENSATION};
use crate::triplet::{TripletConfig, TRIPLET_STEP};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scuttlebutt::AbstractChannel;
use std::fmt::Display;

/// Channel types. Channels are used to communicate between parties. More details: [channel_utils](crate::channel_utils).
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum ChannelType {
    /// Unix domain socket. See [UnixChannel].
    Unix,
    /// TCP socket on localhost. See [TcpChannel].
    Tcp,
    /// Native channel of Rust. See [CrossbeamChannel].
    CrossBeam,
}

impl Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Unix => write!(f, "unix"),
            ChannelType::Tcp => write!(f, "tcp"),
            ChannelType::CrossBeam => write!(f, "crossbeam"),
        }
    }
}

/// Which tuples to generate.
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum TupleType {
    /// `(a, b, c)` with `c = a*b`.
    Triplet,
    /// `(a, alpha, b, a*b, alpha*b)`.
    Penta,
}

impl Display for TupleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TupleType::Triplet => write!(f, "triplet"),
            TupleType::Penta => write!(f, "penta"),
        }
    }
}

/// Arguments for the triplet generation demo.
/// This struct implements [clap::Parser] to make that this binary has CommandLine Arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct TripletArgs {
    /// Number of tuples each party requests.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    /// Kind of tuples.
    #[arg(short = 't', long = "tuple", default_value_t = TupleType::Triplet)]
    pub tuple_type: TupleType,

    /// Element kind. Only `i64` is generated; other kinds show the rejection path.
    #[arg(short = 'e', long = "element", default_value_t = ElementKind::I64)]
    pub element_kind: ElementKind,

    /// Tuples produced per refill.
    #[arg(short = 's', long = "step", default_value_t = TRIPLET_STEP)]
    pub triplet_step: usize,

    /// Bias compensation per set fractional bit of the OT receiver's operand.
    #[arg(long, default_value_t = FIXED_POINT_COMPENSATION)]
    pub compensation: f64,

    /// Channel Types.
    #[arg(short = 'c', long = "channel", default_value_t = ChannelType::Unix)]
    pub channel_type: ChannelType,

    /// Port number for TCP channel.
    ///
    /// The port is used on localhost only.
    #[arg(short = 'p', long = "port", default_value_t = 10000)]
    pub port: u16,

    /// Verbose mode.
    ///
    /// If specified, log protocol rounds at debug level and print the first reconstructed tuples.
    #[arg(long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

impl TripletArgs {
    /// Generator configuration described by the arguments.
    pub fn config(&self) -> TripletConfig {
        TripletConfig {
            element_kind: self.element_kind,
            triplet_step: self.triplet_step,
            compensation: self.compensation,
        }
    }
}

/// Enum type to handle multiple channel types on runtime. Please ignore it :)
pub enum ChannelUnion {
    /// Unix domain socket. See [UnixChannel].
    Unix(UnixChannel),
    /// TCP socket. See [TcpChannel].
    Tcp(TcpChannel),
    /// Native channel of Rust. See [CrossbeamChannel].
    CrossBeam(CrossbeamChannel),
}

use ChannelUnion::*;

impl AbstractChannel for ChannelUnion {
    #[inline(always)]
    fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.write_bytes(bytes),
            Tcp(c) => c.write_bytes(bytes),
            CrossBeam(c) => c.write_bytes(bytes),
        }
    }

    #[inline(always)]
    fn read_bytes(&mut self, bytes: &mut [u8]) -> std::io::Result<()> {
        match self {
            Unix(c) => c.read_bytes(bytes),
            Tcp(c) => c.read_bytes(bytes),
            CrossBeam(c) => c.read_bytes(bytes),
        }
    }

    #[inline(always)]
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Unix(c) => c.flush(),
            Tcp(c) => c.flush(),
            CrossBeam(c) => c.flush(),
        }
    }

    #[inline(always)]
    fn clone(&self) -> Self {
        match self {
            Unix(c) => Unix(c.clone()),
            Tcp(c) => Tcp(c.clone()),
            CrossBeam(c) => CrossBeam(c.clone()),
        }
    }
}

/// Create the channels of both parties. Return `(channel of p0, channel of p1)`. Runtime utility.
pub fn create_channel_pair(type_: ChannelType, port: u16) -> Result<(ChannelUnion, ChannelUnion)> {
    match type_ {
        ChannelType::Unix => {
            let (p0, p1) =
                create_unix_channel_pair().with_context(|| format!("@{}:{}", file!(), line!()))?;
            Ok((Unix(p0), Unix(p1)))
        }
        ChannelType::Tcp => {
            let (p0, p1) = create_tcp_channel_pair(port)
                .with_context(|| format!("port={} @{}:{}", port, file!(), line!()))?;
            Ok((Tcp(p0), Tcp(p1)))
        }
        ChannelType::CrossBeam => {
            let (p0, p1) = create_crossbeam_channel_pair();
            Ok((CrossBeam(p0), CrossBeam(p1)))
        }
    }
}
