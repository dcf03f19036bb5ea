//! Module about tcp channel. See [TcpStream].
//! This module provides functions to connect the two parties over tcp: `p0` listens and `p1` connects.

use crate::party::PartyId;
use anyhow::{bail, Context, Result};
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::sleep;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Buffered tcp channel.
pub type TcpChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

fn tcp_channel(stream: TcpStream) -> Result<TcpChannel> {
    stream
        .set_nodelay(true)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(BufReader::new(reader), BufWriter::new(stream)))
}

// exchange party ids so that two processes started with the same role fail fast
fn handshake(stream: &mut TcpStream, me: PartyId) -> Result<()> {
    let m = (me.index() as u64).to_be_bytes();
    stream
        .write_all(&m)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let mut buf = [0u8; 8];
    stream
        .read_exact(&mut buf)
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    let them = u64::from_be_bytes(buf) as usize;
    if them != me.peer().index() {
        bail!(
            "peer announced party {} but {} expects {} @{}:{}",
            them,
            me,
            me.peer(),
            file!(),
            line!()
        );
    }
    Ok(())
}

/// Listen on `127.0.0.1:port` and accept the connection of `p1`.
pub fn accept_tcp_channel(port: u16) -> Result<TcpChannel> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener =
        TcpListener::bind(addr).with_context(|| format!("addr={} @{}:{}", addr, file!(), line!()))?;

    let (mut stream, _) = listener
        .accept()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    handshake(&mut stream, PartyId::P0)?;

    tcp_channel(stream)
}

/// Connect to `p0` on `127.0.0.1:port`, retrying until the listener is up or [TIMEOUT] passes.
pub fn connect_tcp_channel(port: u16) -> Result<TcpChannel> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let start = Instant::now();

    let mut stream = loop {
        match TcpStream::connect_timeout(&addr, TIMEOUT) {
            Ok(s) => break s,
            Err(e) if start.elapsed() < TIMEOUT => {
                tracing::trace!(%addr, error = %e, "p0 not listening yet");
                sleep(RETRY_INTERVAL);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("addr={} @{}:{}", addr, file!(), line!()))
            }
        }
    };
    handshake(&mut stream, PartyId::P1)?;

    tcp_channel(stream)
}

/// Open the channel of `me` on `port`.
pub fn create_tcp_channel(me: PartyId, port: u16) -> Result<TcpChannel> {
    match me {
        PartyId::P0 => accept_tcp_channel(port),
        PartyId::P1 => connect_tcp_channel(port),
    }
}

/// Create both ends of a local tcp connection. Return `(channel of p0, channel of p1)`.
pub fn create_tcp_channel_pair(port: u16) -> Result<(TcpChannel, TcpChannel)> {
    let p0_handle = std::thread::spawn(move || accept_tcp_channel(port));
    let p1 = connect_tcp_channel(port)?;

    let p0 = p0_handle
        .join()
        .map_err(|_| anyhow::anyhow!("p0 listener panicked @{}:{}", file!(), line!()))??;

    Ok((p0, p1))
}
