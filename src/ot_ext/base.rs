//! Session bootstrap: the base OTs from which both extension directions are derived.

use super::{PrgOtExtReceiver, PrgOtExtSender};
use crate::block_utils::{block_bits, BLOCK_BITS};
use crate::errors::Result;
use crate::party::PartyId;
use ocelot::ot::{
    NaorPinkasReceiver, NaorPinkasSender, Receiver as OtReceiver, Sender as OtSender,
};
use rand::{CryptoRng, Rng};
use scuttlebutt::{AbstractChannel, Block};
use tracing::{debug, instrument};

/// Base-OT sender/receiver pair bound to one private choice block.
///
/// Every generator owns its own instance. Reusing the choice block across sessions would let the
/// peer correlate the extended instances, so it is drawn at construction and never exposed outside
/// the crate.
pub struct BaseOt<S = NaorPinkasSender, R = NaorPinkasReceiver>
where
    S: OtSender<Msg = Block>,
    R: OtReceiver<Msg = Block>,
{
    choices: Block,
    sender: S,
    receiver: R,
}

impl<S, R> BaseOt<S, R>
where
    S: OtSender<Msg = Block>,
    R: OtReceiver<Msg = Block>,
{
    /// Draw the private choice block and set up both base-OT roles.
    ///
    /// Naor-Pinkas needs no messages here. Primitives whose `init` talks to the peer (Chou-Orlandi)
    /// must be constructed by both parties at the same point of the conversation.
    pub fn new<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self> {
        let choices: Block = rng.gen();
        let sender = S::init(channel, rng)?;
        let receiver = R::init(channel, rng)?;

        Ok(Self {
            choices,
            sender,
            receiver,
        })
    }

    pub(crate) fn choices(&self) -> Block {
        self.choices
    }

    /// Run the base OTs in both directions and derive the extension endpoints.
    ///
    /// `P0` acts as base-OT sender first and `P1` as receiver first, so the two parties never wait
    /// on each other.
    #[instrument(level = "debug", fields(party = %party), skip_all, err)]
    pub fn extend<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        party: PartyId,
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<(PrgOtExtSender, PrgOtExtReceiver)> {
        let pairs = (0..BLOCK_BITS)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<_>>();
        let choice_bits = block_bits(self.choices);

        let keys = match party {
            PartyId::P0 => {
                self.sender.send(channel, &pairs, rng)?;
                self.receiver.receive(channel, &choice_bits, rng)?
            }
            PartyId::P1 => {
                let keys = self.receiver.receive(channel, &choice_bits, rng)?;
                self.sender.send(channel, &pairs, rng)?;
                keys
            }
        };
        debug!(n = BLOCK_BITS, "base OTs done");

        Ok((
            PrgOtExtSender::new(self.choices, keys),
            PrgOtExtReceiver::new(pairs),
        ))
    }
}
