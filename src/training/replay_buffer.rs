use rand::rngs::StdRng;
use rand::seq::index;

use crate::ai::Transition;

/// Fixed-capacity ring buffer for storing training transitions.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
    len: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Buffer whose sampling draws from the given generator.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay capacity must be > 0");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            len: 0,
            rng,
        }
    }

    /// Add a transition to the buffer. Overwrites the oldest when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Sample `batch_size` distinct transitions uniformly at random.
    pub fn sample(&mut self, batch_size: usize) -> Vec<Transition> {
        assert!(batch_size <= self.len, "Not enough transitions to sample");
        let indices = index::sample(&mut self.rng, self.len, batch_size);
        indices.iter().map(|i| self.buffer[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let (newer, older) = if self.len < self.capacity {
            (&self.buffer[..], &self.buffer[..0])
        } else {
            self.buffer.split_at(self.position)
        };
        older.iter().chain(newer.iter())
    }
}
