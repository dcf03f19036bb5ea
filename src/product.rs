//! Secure product engine.
//!
//! The OT sender holds $`x`$ and the OT receiver holds $`y`$. For every bit $`i`$ of $`y`$ the sender
//! offers the pair $`(r_i, r_i + \lfloor x 2^i / 2^N \rfloor)`$ through one extended OT and the receiver
//! picks with $`y_i`$. The sender keeps $`-\sum r_i`$ and the receiver $`\sum`$ of what it picked, so
//!
//! ```math
//! \mathsf{share}_S + \mathsf{share}_R \equiv \sum_i y_i \lfloor x 2^i / 2^N \rfloor \pmod{2^{64}}
//! ```
//!
//! which is $`\lfloor xy / 2^N \rfloor`$ up to at most $`N`$ lost units. Only bits $`i < N`$ lose
//! anything, so the receiver adds `compensation * popcount(y mod 2^N)` to pull the expected error
//! back toward zero.
//!
//! Bit 63 carries weight $`-2^{63}`$, so $`y`$ is read as a signed word.
//!
//! In this implementation the pad $`r_i`$ is the hash of the sender's extended instance, tweaked
//! with the instance index, and the sender only transmits the correction for the "1" message;
//! the "0" message is the pad itself.

use crate::block_utils::hash_block;
use crate::channel_utils::{read_blocks, read_u64s, write_blocks, write_u64s};
use crate::errors::{Result, TripletError};
use crate::fixed_point::{compensation, fractional_weight, scaled_shift};
use crate::masks::{gen_ot_masks_i64, WORD_WIDTH};
use crate::ot_ext::{BaseOt, OtExtReceiver, OtExtSender, PrgOtExtReceiver, PrgOtExtSender};
use crate::party::{PartyContext, PartyId};
use rand::distributions::{Distribution, Standard};
use rand::{CryptoRng, Rng};
use scuttlebutt::{AbstractChannel, Block};
use tracing::{instrument, trace};

/// What this party does in one OT exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Offers the scaled multiples of its operand.
    Sender,
    /// Chooses with the bits of its operand.
    Receiver,
}

impl Role {
    /// Role of `me` in an exchange where `ot_sender` sends.
    pub fn resolve(me: PartyId, ot_sender: PartyId) -> Self {
        if me == ot_sender {
            Role::Sender
        } else {
            Role::Receiver
        }
    }
}

/// 64-bit slice `j` of a 128-bit hash. One OT instance can pad up to two products.
#[inline]
fn key(h: u128, j: usize) -> u64 {
    (h >> (64 * j)) as u64
}

/// Sender half of one exchange over `operands.len()` (1 or 2) operand vectors of equal length.
///
/// Returns one share vector per operand.
pub(crate) fn send_products<C, S, const N: usize>(
    channel: &mut C,
    ot_ext_sender: &mut S,
    operands: &[&[i64]],
) -> Result<Vec<Vec<i64>>>
where
    C: AbstractChannel,
    S: OtExtSender,
{
    let k = operands.len();
    let m = operands.first().map_or(0, |x| x.len());
    let s = ot_ext_sender.choices();
    let first = ot_ext_sender.consumed();

    let ot_masks = read_blocks(channel, m * WORD_WIDTH, "ot masks")?;

    let mut shares = vec![vec![0i64; m]; k];
    let mut s1_buffer: Vec<u64> = Vec::with_capacity(m * WORD_WIDTH * k);

    for (e, masks) in ot_masks.chunks_exact(WORD_WIDTH).enumerate() {
        for (idx, round_ot_mask) in masks.iter().enumerate() {
            let index = first + e * WORD_WIDTH + idx;
            let q = ot_ext_sender.get_ot_instance() ^ (*round_ot_mask & s);

            let h0 = hash_block(index, q);
            let h1 = hash_block(index, q ^ s);

            for (j, operand) in operands.iter().enumerate() {
                let s0 = key(h0, j);
                let s1 = key(h1, j);
                let shifted = scaled_shift::<N>(operand[e], idx) as u64;

                s1_buffer.push(s1 ^ shifted.wrapping_sub(s0));
                shares[j][e] = shares[j][e].wrapping_add(s0 as i64);
            }
        }
    }

    write_u64s(channel, &s1_buffer)?;
    trace!(m, k, "sent ot messages");

    Ok(shares)
}

/// Receiver half of one exchange. `choice` supplies the OT choice bits, `k` is the number of
/// operands the sender offers per bit.
pub(crate) fn receive_products<C, R, const N: usize>(
    channel: &mut C,
    ot_ext_recver: &mut R,
    choice: &[i64],
    k: usize,
    bias: f64,
) -> Result<Vec<Vec<i64>>>
where
    C: AbstractChannel,
    R: OtExtReceiver,
{
    let m = choice.len();
    let first = ot_ext_recver.consumed();

    let (ot_masks, t0_buffer) = gen_ot_masks_i64(ot_ext_recver, choice)?;
    write_blocks(channel, &ot_masks)?;

    let ot_msg = read_u64s(channel, m * WORD_WIDTH * k, "ot messages")?;

    let mut shares = vec![vec![0i64; m]; k];

    for (e, y) in choice.iter().enumerate() {
        let y = *y as u64;

        for idx in 0..WORD_WIDTH {
            let pos = e * WORD_WIDTH + idx;
            let t0_hash = hash_block(first + pos, t0_buffer[pos]);
            let y_i = (y >> idx) & 1 == 1;

            for (j, share) in shares.iter_mut().enumerate() {
                let key = key(t0_hash, j);
                let round_ot_msg = ot_msg[pos * k + j];
                let v = if y_i {
                    round_ot_msg ^ key
                } else {
                    key.wrapping_neg()
                };
                share[e] = share[e].wrapping_add(v as i64);
            }
        }

        // compensation for precision loss, only fractional bits truncate
        let comp = compensation(bias, fractional_weight::<N>(y as i64));
        for share in shares.iter_mut() {
            share[e] = share[e].wrapping_add(comp);
        }
    }

    Ok(shares)
}

/// Derived OT-extension endpoints of one party.
struct OtExtEndpoints {
    sender: PrgOtExtSender,
    receiver: PrgOtExtReceiver,
}

/// Computes additive shares of products between the two parties' operands.
///
/// Both parties must issue the same sequence of calls with the same `ot_sender` and lengths;
/// the extended OT instances are consumed in lock-step.
///
/// Any failure after the first message of an exchange has been sent poisons the engine and every
/// later call returns [TripletError::SessionAborted].
pub struct ProductEngine<C, RNG, const N: usize>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    ctx: PartyContext<C, RNG>,
    base_ot: BaseOt,
    ot_ext: Option<OtExtEndpoints>,
    compensation: f64,
    poisoned: bool,
}

impl<C, RNG, const N: usize> ProductEngine<C, RNG, N>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    /// Draw fresh base-OT material. No message is exchanged until [init](Self::init).
    pub fn new(mut ctx: PartyContext<C, RNG>, compensation: f64) -> Result<Self> {
        let (channel, rng) = ctx.split();
        let base_ot = BaseOt::new(channel, rng)?;

        Ok(Self {
            ctx,
            base_ot,
            ot_ext: None,
            compensation,
            poisoned: false,
        })
    }

    /// Party of this engine.
    pub fn party(&self) -> PartyId {
        self.ctx.party()
    }

    /// Whether the extension endpoints have been derived.
    pub fn is_initialized(&self) -> bool {
        self.ot_ext.is_some()
    }

    pub(crate) fn base_ot_choices(&self) -> Block {
        self.base_ot.choices()
    }

    pub(crate) fn gen_random_private<T>(&mut self) -> T
    where
        Standard: Distribution<T>,
    {
        self.ctx.gen_random_private()
    }

    /// Give back the context.
    pub fn into_context(self) -> PartyContext<C, RNG> {
        self.ctx
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.poisoned {
            return Err(TripletError::SessionAborted);
        }
        let res = f(self);
        if res.is_err() {
            self.poisoned = true;
        }
        res
    }

    /// Run the base OTs and derive the extension endpoints. Idempotent.
    #[instrument(level = "debug", fields(party = %self.ctx.party()), skip_all, err)]
    pub fn init(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(TripletError::SessionAborted);
        }
        if self.ot_ext.is_some() {
            return Ok(());
        }

        self.guarded(|this| {
            let party = this.ctx.party();
            let (channel, rng) = this.ctx.split();
            let (sender, receiver) = this.base_ot.extend(party, channel, rng)?;
            this.ot_ext = Some(OtExtEndpoints { sender, receiver });
            Ok(())
        })
    }

    fn ready(&mut self) -> Result<(&mut C, &mut OtExtEndpoints)> {
        self.init()?;
        let (channel, _) = self.ctx.split();
        match self.ot_ext.as_mut() {
            Some(ext) => Ok((channel, ext)),
            None => Err(TripletError::SessionAborted),
        }
    }

    /// This party's share of `x * y >> N` per element, where `ot_sender` contributes `x` and its
    /// peer contributes `y`. `input` is `x` or `y` depending on which side this party is on.
    #[instrument(
        level = "debug",
        fields(party = %self.ctx.party(), ot_sender = %ot_sender, n = input.len()),
        skip_all,
        err
    )]
    pub fn gen_product(&mut self, ot_sender: PartyId, input: &[i64]) -> Result<Vec<i64>> {
        let role = Role::resolve(self.ctx.party(), ot_sender);

        let mut shares = self.guarded(|this| {
            let bias = this.compensation;
            let (channel, ext) = this.ready()?;
            match role {
                Role::Sender => send_products::<_, _, N>(channel, &mut ext.sender, &[input]),
                Role::Receiver => {
                    receive_products::<_, _, N>(channel, &mut ext.receiver, input, 1, bias)
                }
            }
        })?;

        Ok(shares.pop().unwrap_or_default())
    }

    /// Two products sharing the receiver's operand in a single exchange.
    ///
    /// The OT sender passes its two operands `x` and `x'` as `input0` and `input1` (equal lengths);
    /// the receiver passes its operand `y` as `input0` and an empty `input1`. Both get
    /// `(share of x*y >> N, share of x'*y >> N)` per element.
    #[instrument(
        level = "debug",
        fields(party = %self.ctx.party(), ot_sender = %ot_sender, n = input0.len()),
        skip_all,
        err
    )]
    pub fn gen_product_pair(
        &mut self,
        ot_sender: PartyId,
        input0: &[i64],
        input1: &[i64],
    ) -> Result<Vec<(i64, i64)>> {
        let role = Role::resolve(self.ctx.party(), ot_sender);

        match role {
            Role::Sender if input0.len() != input1.len() => {
                return Err(TripletError::InvalidConfig(format!(
                    "operands of the OT sender differ in length ({} != {})",
                    input0.len(),
                    input1.len()
                )));
            }
            Role::Receiver if !input1.is_empty() => {
                return Err(TripletError::InvalidConfig(format!(
                    "the OT receiver takes a single operand (got a second one of length {})",
                    input1.len()
                )));
            }
            _ => {}
        }

        let shares = self.guarded(|this| {
            let bias = this.compensation;
            let (channel, ext) = this.ready()?;
            match role {
                Role::Sender => {
                    send_products::<_, _, N>(channel, &mut ext.sender, &[input0, input1])
                }
                Role::Receiver => {
                    receive_products::<_, _, N>(channel, &mut ext.receiver, input0, 2, bias)
                }
            }
        })?;

        let mut shares = shares.into_iter();
        let first = shares.next().unwrap_or_default();
        let second = shares.next().unwrap_or_default();

        Ok(first.into_iter().zip(second).collect())
    }
}
