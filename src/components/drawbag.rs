//! Shuffle-bag sampling over a fixed candidate set.
//!
//! Every candidate index is drawn exactly once before any repeats; the bag
//! refills with the full set when it runs dry. This keeps rare templates from
//! being starved the way independent uniform draws could.

use fastrand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawBag {
    size: usize,
    remaining: Vec<usize>,
}

impl DrawBag {
    /// New full bag over indices `0..size`.
    pub fn new(size: usize) -> Self {
        DrawBag {
            size,
            remaining: (0..size).collect(),
        }
    }

    /// Number of indices left before the next refill.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn refill(&mut self) {
        self.remaining.clear();
        self.remaining.extend(0..self.size);
    }

    /// Draw one index without replacement, refilling first if empty.
    ///
    /// Returns `None` only when the candidate set itself is empty.
    pub fn draw(&mut self, rng: &mut Rng) -> Option<usize> {
        if self.size == 0 {
            return None;
        }
        if self.remaining.is_empty() {
            self.refill();
        }
        let pick = rng.usize(..self.remaining.len());
        Some(self.remaining.swap_remove(pick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn empty_bag_draws_nothing() {
        let mut bag = DrawBag::new(0);
        assert_eq!(bag.draw(&mut Rng::with_seed(1)), None);
    }

    #[test]
    fn every_index_once_per_cycle() {
        for seed in 0..20 {
            let mut rng = Rng::with_seed(seed);
            let mut bag = DrawBag::new(5);
            for _cycle in 0..3 {
                let drawn: FxHashSet<usize> = (0..5).filter_map(|_| bag.draw(&mut rng)).collect();
                assert_eq!(drawn.len(), 5, "seed {seed} repeated an index");
                assert_eq!(bag.remaining(), 0);
            }
        }
    }

    #[test]
    fn refills_when_empty() {
        let mut rng = Rng::with_seed(3);
        let mut bag = DrawBag::new(2);
        bag.draw(&mut rng);
        bag.draw(&mut rng);
        assert_eq!(bag.remaining(), 0);
        assert!(bag.draw(&mut rng).is_some());
        assert_eq!(bag.remaining(), 1);
    }
}
