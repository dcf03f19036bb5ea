//! Party identities and the per-party execution context.

use crate::errors::{Result, TripletError};
use clap::ValueEnum;
use rand::distributions::{Distribution, Standard};
use rand::{CryptoRng, Rng};
use scuttlebutt::AbstractChannel;
use std::fmt::Display;

/// One of the two parties of the protocol.
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq, Hash)]
pub enum PartyId {
    /// Party 0. Runs the base OTs as sender first.
    P0,
    /// Party 1.
    P1,
}

impl PartyId {
    /// The other party.
    pub fn peer(self) -> Self {
        match self {
            PartyId::P0 => PartyId::P1,
            PartyId::P1 => PartyId::P0,
        }
    }

    /// Position of the party, `0` or `1`.
    pub fn index(self) -> usize {
        match self {
            PartyId::P0 => 0,
            PartyId::P1 => 1,
        }
    }

    /// Party at position `i`.
    pub fn from_index(i: usize) -> Result<Self> {
        match i {
            0 => Ok(PartyId::P0),
            1 => Ok(PartyId::P1),
            _ => Err(TripletError::InvalidConfig(format!(
                "party index must be 0 or 1 (now {})",
                i
            ))),
        }
    }
}

impl Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyId::P0 => write!(f, "p0"),
            PartyId::P1 => write!(f, "p1"),
        }
    }
}

/// Everything a party brings to the protocol: who it is, the channel to its peer and a private RNG.
///
/// The channel is owned here and lent to the protocol rounds; nothing in this crate shares it
/// between generators.
pub struct PartyContext<C, RNG>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    party: PartyId,
    channel: C,
    rng: RNG,
}

impl<C, RNG> PartyContext<C, RNG>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    /// Context of `party` talking to its peer over `channel`.
    pub fn new(party: PartyId, channel: C, rng: RNG) -> Self {
        Self {
            party,
            channel,
            rng,
        }
    }

    /// Who this party is.
    pub fn party(&self) -> PartyId {
        self.party
    }

    /// Who the peer is.
    pub fn peer(&self) -> PartyId {
        self.party.peer()
    }

    /// Channel to the peer.
    pub fn network(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Sample a value only this party knows.
    pub fn gen_random_private<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.rng.gen()
    }

    /// Channel and RNG at once, for primitives that need both.
    pub fn split(&mut self) -> (&mut C, &mut RNG) {
        (&mut self.channel, &mut self.rng)
    }

    /// Give back the channel and RNG.
    pub fn into_parts(self) -> (C, RNG) {
        (self.channel, self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id() {
        assert_eq!(PartyId::P0.peer(), PartyId::P1);
        assert_eq!(PartyId::P1.peer(), PartyId::P0);
        assert_eq!(PartyId::from_index(1).unwrap(), PartyId::P1);
        assert_eq!(PartyId::P1.index(), 1);
        assert!(matches!(
            PartyId::from_index(2),
            Err(TripletError::InvalidConfig(_))
        ));
    }
}
