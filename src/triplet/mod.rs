//! Beaver triplets on demand.
//!
//! A [TripletGenerator] serves additive shares of
//!
//! - triplets $`(a, b, c)`$ with $`c_0 + c_1 \approx (a_0 + a_1)(b_0 + b_1) / 2^N`$,
//! - penta-triplets $`(a, \alpha, b, c, \gamma)`$ with $`c \approx ab / 2^N`$ and
//!   $`\gamma \approx \alpha b / 2^N`$, for two products that share the masked operand $`b`$.
//!
//! Tuples are produced `triplet_step` at a time by the secure product engine and queued in a
//! [TripletBuffer]. Both parties must request the same kinds of tuples in the same order, since
//! a refill on one side is a protocol round that the other side has to join.
//!
//! ```no_run
//! use ot_beaver_triplets::channel_utils::tcp_channel::create_tcp_channel;
//! use ot_beaver_triplets::party::{PartyContext, PartyId};
//! use ot_beaver_triplets::triplet::{TripletConfig, TripletGenerator};
//! use scuttlebutt::AesRng;
//!
//! let channel = create_tcp_channel(PartyId::P0, 10000).unwrap();
//! let ctx = PartyContext::new(PartyId::P0, channel, AesRng::new());
//! let mut generator = TripletGenerator::<i64, _, _, 16>::new(ctx, TripletConfig::default()).unwrap();
//! let [a, b, c] = generator.get_triplet().unwrap();
//! ```

use crate::errors::{Result, TripletError};
use crate::fixed_point::{mul, ElementKind, FixedPointElement, FIXED_POINT_COMPENSATION};
use crate::party::{PartyContext, PartyId};
use crate::product::ProductEngine;
use itertools::izip;
use rand::{CryptoRng, Rng};
use scuttlebutt::AbstractChannel;
use tracing::{debug, instrument};

mod buffer;
pub use buffer::TripletBuffer;

/// Tuples generated per refill when not configured otherwise.
pub const TRIPLET_STEP: usize = 256;

/// Shares `(a, b, c)`.
pub type Triplet<T> = [T; 3];

/// Shares `(a, alpha, b, a*b, alpha*b)`.
pub type PentaTriplet<T> = [T; 5];

/// Configuration of a [TripletGenerator]. Both parties must use the same values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TripletConfig {
    /// Element kind the caller expects. Only [ElementKind::I64] is generated.
    pub element_kind: ElementKind,
    /// Tuples per refill.
    pub triplet_step: usize,
    /// Bias compensation per set fractional bit of the OT receiver's operand.
    pub compensation: f64,
}

impl Default for TripletConfig {
    fn default() -> Self {
        Self {
            element_kind: ElementKind::I64,
            triplet_step: TRIPLET_STEP,
            compensation: FIXED_POINT_COMPENSATION,
        }
    }
}

impl TripletConfig {
    /// Check the values that do not depend on the element type.
    pub fn validate(&self) -> Result<()> {
        if self.triplet_step == 0 {
            return Err(TripletError::InvalidConfig(
                "triplet_step must be positive".to_string(),
            ));
        }
        if !self.compensation.is_finite() {
            return Err(TripletError::InvalidConfig(format!(
                "compensation must be finite (now {})",
                self.compensation
            )));
        }
        Ok(())
    }
}

fn from_raw<T: FixedPointElement, const K: usize>(raw: [i64; K]) -> [T; K] {
    raw.map(T::from_raw)
}

fn random_vec<C, RNG, const N: usize>(engine: &mut ProductEngine<C, RNG, N>, n: usize) -> Vec<i64>
where
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    (0..n).map(|_| engine.gen_random_private::<i64>()).collect()
}

/// The operand this party brings to an exchange where `ot_sender` sends.
fn pick<'a>(me: PartyId, ot_sender: PartyId, mine: &'a [i64], other: &'a [i64]) -> &'a [i64] {
    if me == ot_sender {
        mine
    } else {
        other
    }
}

#[instrument(level = "debug", fields(party = %engine.party()), skip(engine), err)]
fn fill_triplets<T, C, RNG, const N: usize>(
    engine: &mut ProductEngine<C, RNG, N>,
    step: usize,
) -> Result<Vec<Triplet<T>>>
where
    T: FixedPointElement,
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    let me = engine.party();
    let a = random_vec(engine, step);
    let b = random_vec(engine, step);

    // p0 offers a0 against b1, then p1 offers a1 against b0
    let ab0 = engine.gen_product(PartyId::P0, pick(me, PartyId::P0, &a, &b))?;
    let ab1 = engine.gen_product(PartyId::P1, pick(me, PartyId::P1, &a, &b))?;

    let res = izip!(&a, &b, &ab0, &ab1)
        .map(|(&a, &b, &x, &y)| {
            let c = mul::<N>(a, b).wrapping_add(x).wrapping_add(y);
            from_raw([a, b, c])
        })
        .collect::<Vec<_>>();

    debug!(n = res.len(), "generated triplets");
    Ok(res)
}

#[instrument(level = "debug", fields(party = %engine.party()), skip(engine), err)]
fn fill_penta_triplets<T, C, RNG, const N: usize>(
    engine: &mut ProductEngine<C, RNG, N>,
    step: usize,
) -> Result<Vec<PentaTriplet<T>>>
where
    T: FixedPointElement,
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    let me = engine.party();
    let a = random_vec(engine, step);
    let alpha = random_vec(engine, step);
    let b = random_vec(engine, step);

    let mut cross = Vec::with_capacity(2);
    for ot_sender in [PartyId::P0, PartyId::P1] {
        let shares = if me == ot_sender {
            engine.gen_product_pair(ot_sender, &a, &alpha)?
        } else {
            engine.gen_product_pair(ot_sender, &b, &[])?
        };
        cross.push(shares);
    }

    let res = izip!(&a, &alpha, &b, &cross[0], &cross[1])
        .map(|(&a, &alpha, &b, &(x0, x1), &(y0, y1))| {
            let c = mul::<N>(a, b).wrapping_add(x0).wrapping_add(y0);
            let gamma = mul::<N>(alpha, b).wrapping_add(x1).wrapping_add(y1);
            from_raw([a, alpha, b, c, gamma])
        })
        .collect::<Vec<_>>();

    debug!(n = res.len(), "generated penta triplets");
    Ok(res)
}

/// `(c_0 + c_1) - (a_0 + a_1)(b_0 + b_1) / 2^N` for the shares of one product slot.
///
/// The operand shares are summed in i128 so that a sum leaving the i64 range is still the real
/// operand; only the product slot wraps.
pub fn reconstruction_error<const N: usize>(
    lhs: [i64; 2],
    rhs: [i64; 2],
    product: [i64; 2],
) -> i64 {
    let x = lhs[0] as i128 + lhs[1] as i128;
    let y = rhs[0] as i128 + rhs[1] as i128;
    product[0]
        .wrapping_add(product[1])
        .wrapping_sub((x.wrapping_mul(y) >> N) as i64)
}

/// Writes `tuples` slot-major into `out`: slot `s` of tuple `i` lands at `out[s * n + i]`.
fn write_slot_major<T: Copy, const K: usize>(tuples: &[[T; K]], out: &mut [T]) {
    let n = tuples.len();
    for (i, t) in tuples.iter().enumerate() {
        for (s, v) in t.iter().enumerate() {
            out[s * n + i] = *v;
        }
    }
}

fn check_sink_len(len: usize, k: usize) -> Result<usize> {
    if len % k != 0 {
        return Err(TripletError::InvalidConfig(format!(
            "output of length {} does not hold whole {}-tuples",
            len, k
        )));
    }
    Ok(len / k)
}

/// Two-party generator of fixed-point Beaver triplets with `N` fractional bits.
pub struct TripletGenerator<T, C, RNG, const N: usize>
where
    T: FixedPointElement,
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    engine: ProductEngine<C, RNG, N>,
    config: TripletConfig,
    triplet_buffer: TripletBuffer<T, 3>,
    penta_triplet_buffer: TripletBuffer<T, 5>,
}

impl<T, C, RNG, const N: usize> TripletGenerator<T, C, RNG, N>
where
    T: FixedPointElement,
    C: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    /// Validate `config` and draw this generator's base-OT material. No network I/O happens
    /// before the first tuple is requested or [init](Self::init) is called.
    pub fn new(ctx: PartyContext<C, RNG>, config: TripletConfig) -> Result<Self> {
        if config.element_kind != T::KIND {
            return Err(TripletError::UnsupportedElementKind(config.element_kind));
        }
        config.validate()?;

        let party = ctx.party();
        let engine = ProductEngine::new(ctx, config.compensation)?;
        debug!(%party, step = config.triplet_step, "triplet generator created");

        Ok(Self {
            engine,
            config,
            triplet_buffer: TripletBuffer::new(config.triplet_step),
            penta_triplet_buffer: TripletBuffer::new(config.triplet_step),
        })
    }

    /// Run the base OTs now instead of on the first refill.
    pub fn init(&mut self) -> Result<()> {
        self.engine.init()
    }

    /// Party of this generator.
    pub fn party(&self) -> PartyId {
        self.engine.party()
    }

    /// Configuration in use.
    pub fn config(&self) -> &TripletConfig {
        &self.config
    }

    /// Whether the base OTs have run.
    pub fn is_initialized(&self) -> bool {
        self.engine.is_initialized()
    }

    /// Triplet batches generated so far.
    pub fn triplet_refills(&self) -> usize {
        self.triplet_buffer.refills()
    }

    /// Penta-triplet batches generated so far.
    pub fn penta_triplet_refills(&self) -> usize {
        self.penta_triplet_buffer.refills()
    }

    #[cfg(test)]
    pub(crate) fn base_ot_choices(&self) -> scuttlebutt::Block {
        self.engine.base_ot_choices()
    }

    /// Next triplet share.
    pub fn get_triplet(&mut self) -> Result<Triplet<T>> {
        let engine = &mut self.engine;
        self.triplet_buffer
            .next(|step| fill_triplets::<T, C, RNG, N>(engine, step))
    }

    /// Next penta-triplet share.
    pub fn get_penta_triplet(&mut self) -> Result<PentaTriplet<T>> {
        let engine = &mut self.engine;
        self.penta_triplet_buffer
            .next(|step| fill_penta_triplets::<T, C, RNG, N>(engine, step))
    }

    /// Fill `out` with `out.len() / 3` triplet shares, slot-major: all `a`, then all `b`,
    /// then all `c`.
    pub fn get_triplets(&mut self, out: &mut [T]) -> Result<()> {
        let n = check_sink_len(out.len(), 3)?;
        let engine = &mut self.engine;
        let tuples = self
            .triplet_buffer
            .take(n, |step| fill_triplets::<T, C, RNG, N>(engine, step))?;
        write_slot_major(&tuples, out);
        Ok(())
    }

    /// Fill `out` with `out.len() / 5` penta-triplet shares, slot-major.
    pub fn get_penta_triplets(&mut self, out: &mut [T]) -> Result<()> {
        let n = check_sink_len(out.len(), 5)?;
        let engine = &mut self.engine;
        let tuples = self
            .penta_triplet_buffer
            .take(n, |step| fill_penta_triplets::<T, C, RNG, N>(engine, step))?;
        write_slot_major(&tuples, out);
        Ok(())
    }

    /// Give back the context.
    pub fn into_context(self) -> PartyContext<C, RNG> {
        self.engine.into_context()
    }
}
