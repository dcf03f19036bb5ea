//! Correction masks sent by the OT-extension receiver.
//!
//! For bit $`i`$ of an input word the receiver draws an instance $`(t^0_i, t^1_i)`$ and sends
//!
//! ```math
//! u_i = c(x_i) \oplus t^0_i \oplus t^1_i
//! ```
//!
//! where $`c(0)`$ is the all-zero block and $`c(1)`$ the all-one block. It keeps $`t^0_i`$, which is
//! the key it will use to open the sender's reply for that bit.

use crate::block_utils::choice_block;
use crate::errors::{Result, TripletError};
use crate::ot_ext::OtExtReceiver;
use scuttlebutt::Block;

/// Bits per input word when the caller does not ask otherwise.
pub const WORD_WIDTH: usize = 8 * std::mem::size_of::<u64>();

fn check_word_width(word_width: usize) -> Result<()> {
    if word_width == 0 || word_width > WORD_WIDTH {
        return Err(TripletError::InvalidConfig(format!(
            "word width must be in 1..={} (now {})",
            WORD_WIDTH, word_width
        )));
    }
    Ok(())
}

/// Masks for the low `word_width` bits of one word, appended to `ot_masks` and `t0_buffer`.
pub fn gen_ot_masks_word<R: OtExtReceiver>(
    ot_ext_recver: &mut R,
    input: u64,
    ot_masks: &mut Vec<Block>,
    t0_buffer: &mut Vec<Block>,
    word_width: usize,
) -> Result<()> {
    check_word_width(word_width)?;

    for idx in 0..word_width {
        let [t0, t1] = ot_ext_recver.get_ot_instance();
        let choice = choice_block((input >> idx) & 1 == 1);

        t0_buffer.push(t0);
        ot_masks.push(choice ^ t0 ^ t1);
    }

    Ok(())
}

/// Masks for every word of `input`, in order. Returns `(ot_masks, t0_buffer)`, each of length
/// `word_width` times the number of words.
pub fn gen_ot_masks<R, I>(
    ot_ext_recver: &mut R,
    input: I,
    word_width: usize,
) -> Result<(Vec<Block>, Vec<Block>)>
where
    R: OtExtReceiver,
    I: IntoIterator,
    I::Item: Into<u64>,
{
    check_word_width(word_width)?;

    let input = input.into_iter();
    let (lower, _) = input.size_hint();
    let mut ot_masks = Vec::with_capacity(lower * word_width);
    let mut t0_buffer = Vec::with_capacity(lower * word_width);

    for x in input {
        gen_ot_masks_word(
            ot_ext_recver,
            x.into(),
            &mut ot_masks,
            &mut t0_buffer,
            word_width,
        )?;
    }

    Ok((ot_masks, t0_buffer))
}

/// [gen_ot_masks] over signed fixed-point words at the default width.
pub fn gen_ot_masks_i64<R: OtExtReceiver>(
    ot_ext_recver: &mut R,
    input: &[i64],
) -> Result<(Vec<Block>, Vec<Block>)> {
    gen_ot_masks(ot_ext_recver, input.iter().map(|&x| x as u64), WORD_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_utils::ONE_BLOCK;
    use crate::ot_ext::tests::local_ot_ext_pair;
    use crate::ot_ext::OtExtSender;
    use rand::Rng;
    use scuttlebutt::AesRng;

    #[test]
    fn test_mask_sizes() {
        let mut rng = AesRng::new();
        let (_, mut receiver) = local_ot_ext_pair(&mut rng);

        for m in [0usize, 1, 3, 17] {
            let input = (0..m).map(|_| rng.gen::<u64>()).collect::<Vec<_>>();
            let (masks, t0s) =
                gen_ot_masks(&mut receiver, input.iter().copied(), WORD_WIDTH).unwrap();
            assert_eq!(masks.len(), m * WORD_WIDTH);
            assert_eq!(t0s.len(), m * WORD_WIDTH);

            let (masks, t0s) = gen_ot_masks(&mut receiver, input.iter().copied(), 8).unwrap();
            assert_eq!(masks.len(), m * 8);
            assert_eq!(t0s.len(), m * 8);
        }
    }

    #[test]
    fn test_masks_encode_bits_in_order() {
        let mut rng = AesRng::new();
        let (mut sender, mut receiver) = local_ot_ext_pair(&mut rng);
        let s = sender.choices();

        let input = (0..5).map(|_| rng.gen::<i64>()).collect::<Vec<_>>();
        let (masks, t0s) = gen_ot_masks_i64(&mut receiver, &input).unwrap();

        // the sender folds each mask in and compares against t0 to learn c & s
        for (k, x) in input.iter().enumerate() {
            for i in 0..WORD_WIDTH {
                let idx = k * WORD_WIDTH + i;
                let q = sender.get_ot_instance() ^ (masks[idx] & s);
                let bit = (*x as u64 >> i) & 1 == 1;
                let expected = if bit { t0s[idx] ^ s } else { t0s[idx] };
                assert_eq!(q, expected);
            }
        }
    }

    #[test]
    fn test_single_word_appends() {
        let mut rng = AesRng::new();
        let (_, mut receiver) = local_ot_ext_pair(&mut rng);
        let mut masks = vec![Block::from(ONE_BLOCK)];
        let mut t0s = vec![];
        gen_ot_masks_word(&mut receiver, 0b101, &mut masks, &mut t0s, 3).unwrap();
        assert_eq!(masks.len(), 4);
        assert_eq!(t0s.len(), 3);
        assert_eq!(masks[0], Block::from(ONE_BLOCK));
    }

    #[test]
    fn test_bad_word_width() {
        let mut rng = AesRng::new();
        let (_, mut receiver) = local_ot_ext_pair(&mut rng);
        assert!(matches!(
            gen_ot_masks(&mut receiver, [1u64], 65),
            Err(TripletError::InvalidConfig(_))
        ));
        assert!(matches!(
            gen_ot_masks(&mut receiver, Vec::<u64>::new(), 0),
            Err(TripletError::InvalidConfig(_))
        ));
    }
}
