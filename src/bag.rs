//! 7-bag randomizer for piece generation
//!
//! All 7 pieces are dealt out in a random order before the next bag is
//! drawn. This prevents long droughts and floods of a single type.

use crate::tetromino::PieceType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Default length of the "next" preview
pub const DEFAULT_PREVIEW_LEN: usize = 5;

/// Draw one random permutation of the 7 piece types.
///
/// Each slot re-rolls until it lands on a type not yet in the bag; the last
/// slot takes whatever type is left.
pub fn draw_bag<R: Rng + ?Sized>(rng: &mut R) -> [PieceType; 7] {
    let mut bag = [PieceType::I; 7];
    let mut used = [false; 7];

    for slot in bag.iter_mut().take(6) {
        let pick = loop {
            let index = rng.gen_range(0..7);
            if !used[index] {
                break index;
            }
        };
        used[pick] = true;
        *slot = PieceType::ALL[pick];
    }

    let last = used
        .iter()
        .position(|&taken| !taken)
        .expect("six draws leave exactly one type unused");
    bag[6] = PieceType::ALL[last];
    bag
}

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    rng: ChaCha8Rng,
    /// Preview queue for upcoming pieces
    queue: VecDeque<PieceType>,
    /// Backing store the queue is refilled from
    store: Vec<PieceType>,
    preview_len: usize,
}

impl Bag {
    /// Create a bag seeded from entropy
    pub fn new(preview_len: usize) -> Self {
        Self::with_seed(rand::random(), preview_len)
    }

    /// Create a deterministic bag (same seed, same piece order)
    pub fn with_seed(seed: u64, preview_len: usize) -> Self {
        let mut bag = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            queue: VecDeque::with_capacity(preview_len.max(1)),
            store: Vec::with_capacity(7),
            preview_len: preview_len.max(1),
        };
        while bag.queue.len() < bag.preview_len {
            let next = bag.pop_store();
            bag.queue.push_back(next);
        }
        bag
    }

    /// Take the head of the preview queue and top the queue back up
    pub fn pop_next(&mut self) -> PieceType {
        let next = self.pop_store();
        self.queue.push_back(next);
        self.queue
            .pop_front()
            .expect("preview queue holds at least one piece")
    }

    /// Head of the preview queue without removing it
    pub fn peek(&self) -> PieceType {
        self.queue[0]
    }

    /// The upcoming pieces, nearest first
    pub fn preview(&self) -> Vec<PieceType> {
        self.queue.iter().copied().collect()
    }

    fn pop_store(&mut self) -> PieceType {
        if self.store.is_empty() {
            let mut fresh = draw_bag(&mut self.rng);
            // Stored reversed so `pop` deals the bag in drawn order
            fresh.reverse();
            self.store.extend(fresh);
        }
        self.store.pop().expect("store was just refilled")
    }
}
