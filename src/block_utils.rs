//! Block encodings and the correlation-robust hash used to derive OT pads.

use scuttlebutt::{Block, AES_HASH};

/// Width in bits of one [Block], and therefore the number of base OTs per direction.
pub const BLOCK_BITS: usize = 128;

/// Block encoding the bit 0.
pub const ZERO_BLOCK: u128 = 0;
/// Block encoding the bit 1: every bit set.
pub const ONE_BLOCK: u128 = u128::MAX;

/// [ONE_BLOCK] for `true`, [ZERO_BLOCK] for `false`.
#[inline]
pub fn choice_block(bit: bool) -> Block {
    if bit {
        Block::from(ONE_BLOCK)
    } else {
        Block::from(ZERO_BLOCK)
    }
}

/// Bits of `b`, least significant first.
#[inline]
pub fn block_bits(b: Block) -> Vec<bool> {
    let x: u128 = b.into();
    (0..BLOCK_BITS).map(|j| (x >> j) & 1 == 1).collect()
}

/// H: (index, Block) -> {0,1}^128, the tweakable correlation-robust AES hash keyed by the OT
/// instance index.
///
/// Both ends of an extended OT must hash with the same `index`.
#[inline]
pub fn hash_block(index: usize, b: Block) -> u128 {
    AES_HASH.tccr_hash(Block::from(index as u128), b).into()
}

/// Transpose a 128x128 bit matrix given as rows.
///
/// Bit `i` of output word `j` is bit `j` of input word `i`.
pub fn transpose_128(rows: &[u128; BLOCK_BITS]) -> [u128; BLOCK_BITS] {
    let mut cols = [0u128; BLOCK_BITS];
    for (j, row) in rows.iter().enumerate() {
        for (i, col) in cols.iter_mut().enumerate() {
            *col |= ((row >> i) & 1) << j;
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use scuttlebutt::AesRng;

    #[test]
    fn test_choice_block() {
        let zero: u128 = choice_block(false).into();
        let one: u128 = choice_block(true).into();
        assert_eq!(zero, 0);
        assert_eq!(one, u128::MAX);

        let mut rng = AesRng::new();
        let b: Block = rng.gen();
        assert_eq!(b & choice_block(true), b);
        assert_eq!(b & choice_block(false), Block::default());
    }

    #[test]
    fn test_block_bits() {
        let b = Block::from(0b1011u128 | (1 << 127));
        let bits = block_bits(b);
        assert_eq!(bits.len(), BLOCK_BITS);
        assert!(bits[0] && bits[1] && !bits[2] && bits[3] && bits[127]);
        assert_eq!(bits.iter().filter(|&&x| x).count(), 4);
    }

    #[test]
    fn test_hash_block() {
        let mut rng = AesRng::new();
        let x: Block = rng.gen();

        let h = hash_block(7, x);
        let expected: u128 = AES_HASH.tccr_hash(Block::from(7u128), x).into();

        assert_eq!(h, expected);
        assert_eq!(h, hash_block(7, x));
        assert_ne!(h, hash_block(8, x));
        assert_ne!(h, hash_block(7, x ^ Block::from(1u128)));
    }

    #[test]
    fn test_transpose_128() {
        let mut rng = AesRng::new();
        let mut rows = [0u128; BLOCK_BITS];
        for r in rows.iter_mut() {
            *r = rng.gen();
        }

        let cols = transpose_128(&rows);
        for i in 0..BLOCK_BITS {
            for j in 0..BLOCK_BITS {
                assert_eq!((cols[i] >> j) & 1, (rows[j] >> i) & 1);
            }
        }
        assert_eq!(transpose_128(&cols), rows);
    }
}
