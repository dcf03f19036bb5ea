//! Module about unix domain socket channel. See [UnixStream].
//! This module provides a function to create a connected pair of unix domain socket channels for the two parties.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::{
    io::{BufReader, BufWriter},
    os::unix::net::UnixStream,
};

/// Buffered unix socket channel.
pub type UnixChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

fn unix_channel(stream: UnixStream) -> Result<UnixChannel> {
    let reader = stream
        .try_clone()
        .with_context(|| format!("@{}:{}", file!(), line!()))?;
    Ok(SyncChannel::new(BufReader::new(reader), BufWriter::new(stream)))
}

/// Create a connected pair of unix domain socket channels. See [UnixStream].
///
/// Return `(channel of p0, channel of p1)`.
pub fn create_unix_channel_pair() -> Result<(UnixChannel, UnixChannel)> {
    let (s, r) = UnixStream::pair().with_context(|| format!("@{}:{}", file!(), line!()))?;

    let left = unix_channel(s).with_context(|| format!("@{}:{}", file!(), line!()))?;
    let right = unix_channel(r).with_context(|| format!("@{}:{}", file!(), line!()))?;

    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::AbstractChannel;

    #[test]
    fn test_pair() {
        let (mut left, mut right) = create_unix_channel_pair().unwrap();

        let handle = std::thread::spawn(move || {
            let n = right.read_u64().unwrap();
            right.write_u64(n + 1).unwrap();
            right.flush().unwrap();
        });

        left.write_u64(41).unwrap();
        left.flush().unwrap();
        assert_eq!(left.read_u64().unwrap(), 42);

        handle.join().unwrap();
    }
}
