//! FIFO of pre-generated correlated tuples.

use crate::errors::{Result, TripletError};
use std::collections::VecDeque;

/// Queue of `K`-tuples filled one batch at a time.
///
/// The buffer does not know how tuples are produced; callers pass a refill closure that is
/// asked for exactly [batch_size](Self::batch_size) tuples whenever the queue runs dry.
#[derive(Debug)]
pub struct TripletBuffer<T, const K: usize> {
    queue: VecDeque<[T; K]>,
    batch_size: usize,
    refills: usize,
}

impl<T: Copy, const K: usize> TripletBuffer<T, K> {
    /// Empty buffer refilled `batch_size` tuples at a time.
    pub fn new(batch_size: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(batch_size),
            batch_size,
            refills: 0,
        }
    }

    /// Tuples per refill.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Tuples ready to pop.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no tuple is ready.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of batches appended so far.
    pub fn refills(&self) -> usize {
        self.refills
    }

    /// Pop the oldest tuple without refilling.
    pub fn try_next(&mut self) -> Option<[T; K]> {
        self.queue.pop_front()
    }

    fn refill<F>(&mut self, refill: F) -> Result<()>
    where
        F: FnOnce(usize) -> Result<Vec<[T; K]>>,
    {
        if self.batch_size == 0 {
            return Err(TripletError::InvalidConfig(
                "batch size of a triplet buffer must be positive".to_string(),
            ));
        }

        let batch = refill(self.batch_size)?;
        if batch.len() != self.batch_size {
            return Err(TripletError::ProtocolDesync {
                what: "refill batch",
                got: batch.len(),
                expected: self.batch_size,
            });
        }

        self.queue.extend(batch);
        self.refills += 1;

        Ok(())
    }

    /// Pop the oldest tuple, refilling once first if the buffer is empty.
    pub fn next<F>(&mut self, refill: F) -> Result<[T; K]>
    where
        F: FnOnce(usize) -> Result<Vec<[T; K]>>,
    {
        if self.queue.is_empty() {
            self.refill(refill)?;
        }

        self.queue.pop_front().ok_or(TripletError::ProtocolDesync {
            what: "refill batch",
            got: 0,
            expected: self.batch_size,
        })
    }

    /// Pop the `n` oldest tuples, refilling as many times as needed.
    ///
    /// On failure nothing is popped.
    pub fn take<F>(&mut self, n: usize, mut refill: F) -> Result<Vec<[T; K]>>
    where
        F: FnMut(usize) -> Result<Vec<[T; K]>>,
    {
        while self.queue.len() < n {
            self.refill(&mut refill)?;
        }

        Ok(self.queue.drain(..n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(next: &mut i64) -> impl FnMut(usize) -> Result<Vec<[i64; 2]>> + '_ {
        move |n| {
            Ok((0..n)
                .map(|_| {
                    *next += 1;
                    [*next, -*next]
                })
                .collect())
        }
    }

    #[test]
    fn test_fifo_across_refills() {
        let mut next = 0;
        let mut buffer = TripletBuffer::<i64, 2>::new(256);

        for i in 1..=257 {
            let t = buffer.next(counter(&mut next)).unwrap();
            assert_eq!(t, [i, -i]);
        }

        assert_eq!(buffer.refills(), 2);
        assert_eq!(buffer.len(), 255);
    }

    #[test]
    fn test_try_next_does_not_refill() {
        let mut next = 0;
        let mut buffer = TripletBuffer::<i64, 2>::new(4);
        assert!(buffer.try_next().is_none());

        buffer.next(counter(&mut next)).unwrap();
        assert_eq!(buffer.try_next(), Some([2, -2]));
        assert_eq!(buffer.refills(), 1);
    }

    #[test]
    fn test_take() {
        let mut next = 0;
        let mut buffer = TripletBuffer::<i64, 2>::new(3);

        let v = buffer.take(7, counter(&mut next)).unwrap();
        assert_eq!(v.len(), 7);
        assert_eq!(v[6], [7, -7]);
        assert_eq!(buffer.refills(), 3);
        assert_eq!(buffer.len(), 2);

        let v = buffer.take(0, counter(&mut next)).unwrap();
        assert!(v.is_empty());
        assert_eq!(buffer.refills(), 3);
    }

    #[test]
    fn test_wrong_batch_size() {
        let mut buffer = TripletBuffer::<i64, 2>::new(4);

        let res = buffer.next(|_| Ok(vec![[0, 0]; 3]));
        assert!(matches!(
            res,
            Err(TripletError::ProtocolDesync {
                got: 3,
                expected: 4,
                ..
            })
        ));
        assert!(buffer.is_empty());
        assert_eq!(buffer.refills(), 0);
    }

    #[test]
    fn test_zero_batch_rejected() {
        let mut next = 0;
        let mut buffer = TripletBuffer::<i64, 2>::new(0);
        assert!(matches!(
            buffer.take(1, counter(&mut next)),
            Err(TripletError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_refill_error_propagates() {
        let mut buffer = TripletBuffer::<i64, 2>::new(4);
        let res = buffer.next(|_| Err(TripletError::SessionAborted));
        assert!(matches!(res, Err(TripletError::SessionAborted)));
    }
}
