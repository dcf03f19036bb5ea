//! Channels between the two parties and the framing of protocol messages.
//!
//! Every message is a `usize` length prefix followed by the payload. The reader states how many
//! elements the protocol requires and a different prefix is reported as
//! [ProtocolDesync](TripletError::ProtocolDesync) instead of being read.

use crate::errors::{Result, TripletError};
use scuttlebutt::{AbstractChannel, Block};

pub mod sync_channel;
pub mod sync_channel_by_cb;
pub mod tcp_channel;

const U64_BYTES: usize = std::mem::size_of::<u64>();

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(TripletError::ProtocolDesync {
            what,
            got,
            expected,
        });
    }
    Ok(())
}

/// Write blocks with their count, then flush. Returns the count.
pub fn write_blocks<C: AbstractChannel>(channel: &mut C, v: &[Block]) -> Result<usize> {
    let len = v.len();

    channel.write_usize(len)?;
    for b in v {
        channel.write_block(b)?;
    }
    channel.flush()?;

    Ok(len)
}

/// Read exactly `expected` blocks written by [write_blocks].
pub fn read_blocks<C: AbstractChannel>(
    channel: &mut C,
    expected: usize,
    what: &'static str,
) -> Result<Vec<Block>> {
    let len = channel.read_usize()?;
    check_len(what, len, expected)?;

    let res = (0..len)
        .map(|_| channel.read_block())
        .collect::<std::io::Result<Vec<_>>>()?;

    Ok(res)
}

/// Write words (little endian) with their count, then flush. Returns the count.
pub fn write_u64s<C: AbstractChannel>(channel: &mut C, v: &[u64]) -> Result<usize> {
    let bytes = v.iter().flat_map(|x| x.to_le_bytes()).collect::<Vec<_>>();

    let len = v.len();

    channel.write_usize(len)?;
    channel.write_bytes(&bytes)?;
    channel.flush()?;

    Ok(len)
}

/// Read exactly `expected` words written by [write_u64s].
pub fn read_u64s<C: AbstractChannel>(
    channel: &mut C,
    expected: usize,
    what: &'static str,
) -> Result<Vec<u64>> {
    let len = channel.read_usize()?;
    check_len(what, len, expected)?;

    let mut bytes = vec![0u8; len * U64_BYTES];
    channel.read_bytes(&mut bytes)?;

    let res = bytes
        .chunks_exact(U64_BYTES)
        .map(|x| {
            let mut b = [0u8; U64_BYTES];
            b.copy_from_slice(x);
            u64::from_le_bytes(b)
        })
        .collect();

    Ok(res)
}
