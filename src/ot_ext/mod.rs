//! OT extension endpoints.
//!
//! A few expensive base OTs (see [base]) seed $`128`$ pairs of PRGs. Stacking one output bit of every
//! PRG gives one extended OT instance, so both endpoints can produce as many instances as needed
//! without talking to each other. The receiver later sends a correction mask per instance
//! ([gen_ot_masks](crate::masks::gen_ot_masks)) which binds the instance to its choice bit.
//!
//! With base-OT choice block $`s`$, the $`i`$-th instances satisfy
//!
//! ```math
//! q_i = t^0_i \oplus (s \wedge (t^0_i \oplus t^1_i))
//! ```
//!
//! and after the sender folds in the receiver's mask $`u_i = c_i \oplus t^0_i \oplus t^1_i`$ it holds
//! $`q_i \oplus (u_i \wedge s) = t^0_i \oplus (c_i \wedge s)`$.
//!
//! Both parties must draw instances in the same order. Nothing here checks that; a skipped instance
//! shows up as garbage products.

use crate::block_utils::{transpose_128, BLOCK_BITS};
use rand::{Rng, SeedableRng};
use scuttlebutt::{AesRng, Block};

pub mod base;
pub use base::BaseOt;

/// Sender side of the OT extension.
pub trait OtExtSender {
    /// The base-OT choice block `s` this sender was derived with.
    fn choices(&self) -> Block;

    /// The next instance `q_i`.
    fn get_ot_instance(&mut self) -> Block;

    /// Number of instances drawn so far, i.e. the index of the next one.
    fn consumed(&self) -> usize;
}

/// Receiver side of the OT extension.
pub trait OtExtReceiver {
    /// The next instance `[t0_i, t1_i]`.
    fn get_ot_instance(&mut self) -> [Block; 2];

    /// Number of instances drawn so far, i.e. the index of the next one.
    fn consumed(&self) -> usize;
}

/// [OtExtSender] expanding the keys received in the base OTs.
pub struct PrgOtExtSender {
    choices: Block,
    rngs: Vec<AesRng>,
    buffer: Vec<Block>,
    consumed: usize,
}

impl PrgOtExtSender {
    /// `keys[j]` must be the message chosen by bit `j` of `choices` in the `j`-th base OT.
    pub fn new(choices: Block, keys: Vec<Block>) -> Self {
        debug_assert_eq!(keys.len(), BLOCK_BITS);
        let rngs = keys.into_iter().map(AesRng::from_seed).collect();
        Self {
            choices,
            rngs,
            buffer: Vec::new(),
            consumed: 0,
        }
    }

    fn refill(&mut self) {
        let mut rows = [0u128; BLOCK_BITS];
        for (row, rng) in rows.iter_mut().zip(self.rngs.iter_mut()) {
            *row = rng.gen();
        }
        self.buffer = transpose_128(&rows)
            .into_iter()
            .rev()
            .map(Block::from)
            .collect();
    }
}

impl OtExtSender for PrgOtExtSender {
    fn choices(&self) -> Block {
        self.choices
    }

    fn get_ot_instance(&mut self) -> Block {
        if self.buffer.is_empty() {
            self.refill();
        }
        self.consumed += 1;
        // refill() leaves at least one block in the buffer
        self.buffer.pop().unwrap_or_default()
    }

    fn consumed(&self) -> usize {
        self.consumed
    }
}

/// [OtExtReceiver] expanding both messages of every base OT it sent.
pub struct PrgOtExtReceiver {
    rngs: Vec<(AesRng, AesRng)>,
    buffer: Vec<[Block; 2]>,
    consumed: usize,
}

impl PrgOtExtReceiver {
    /// `pairs[j]` are the two messages offered in the `j`-th base OT.
    pub fn new(pairs: Vec<(Block, Block)>) -> Self {
        debug_assert_eq!(pairs.len(), BLOCK_BITS);
        let rngs = pairs
            .into_iter()
            .map(|(k0, k1)| (AesRng::from_seed(k0), AesRng::from_seed(k1)))
            .collect();
        Self {
            rngs,
            buffer: Vec::new(),
            consumed: 0,
        }
    }

    fn refill(&mut self) {
        let mut rows0 = [0u128; BLOCK_BITS];
        let mut rows1 = [0u128; BLOCK_BITS];
        for ((r0, r1), (g0, g1)) in rows0
            .iter_mut()
            .zip(rows1.iter_mut())
            .zip(self.rngs.iter_mut())
        {
            *r0 = g0.gen();
            *r1 = g1.gen();
        }
        let t0 = transpose_128(&rows0);
        let t1 = transpose_128(&rows1);
        self.buffer = t0
            .into_iter()
            .zip(t1)
            .rev()
            .map(|(a, b)| [Block::from(a), Block::from(b)])
            .collect();
    }
}

impl OtExtReceiver for PrgOtExtReceiver {
    fn get_ot_instance(&mut self) -> [Block; 2] {
        if self.buffer.is_empty() {
            self.refill();
        }
        self.consumed += 1;
        self.buffer.pop().unwrap_or_default()
    }

    fn consumed(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::block_utils::{block_bits, choice_block};
    use scuttlebutt::AesRng;

    /// A matching sender/receiver pair with the base OTs done in the clear.
    pub(crate) fn local_ot_ext_pair(rng: &mut AesRng) -> (PrgOtExtSender, PrgOtExtReceiver) {
        let choices: Block = rng.gen();
        let pairs = (0..BLOCK_BITS)
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<_>>();
        let keys = block_bits(choices)
            .into_iter()
            .zip(pairs.iter())
            .map(|(s, (k0, k1))| if s { *k1 } else { *k0 })
            .collect();
        (
            PrgOtExtSender::new(choices, keys),
            PrgOtExtReceiver::new(pairs),
        )
    }

    #[test]
    fn test_instance_correlation() {
        let mut rng = AesRng::new();
        let (mut sender, mut receiver) = local_ot_ext_pair(&mut rng);
        let s = sender.choices();

        for _ in 0..1000 {
            let q = sender.get_ot_instance();
            let [t0, t1] = receiver.get_ot_instance();
            assert_eq!(q, t0 ^ (s & (t0 ^ t1)));

            let bit: bool = rng.gen();
            let u = choice_block(bit) ^ t0 ^ t1;
            let q = q ^ (u & s);
            assert_eq!(q, t0 ^ (choice_block(bit) & s));
        }

        assert_eq!(sender.consumed(), 1000);
        assert_eq!(receiver.consumed(), 1000);
    }

    #[test]
    fn test_instances_are_fresh() {
        let mut rng = AesRng::new();
        let (_, mut receiver) = local_ot_ext_pair(&mut rng);
        let instances = (0..300)
            .map(|_| receiver.get_ot_instance()[0])
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(instances.len(), 300);
    }
}
