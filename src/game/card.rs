use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Number of distinct ranks in a deck.
pub const NUM_RANKS: u8 = 13;

/// Cards in a single deck.
pub const DECK_SIZE: usize = 52;

/// A card rank in `0..13`.
///
/// `0` is the Ace, `1..=8` are the pips 2 through 9 and `9..=12` are the
/// ten-valued ranks (10, Jack, Queen, King). Suits never matter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(u8);

impl Rank {
    pub const ACE: Rank = Rank(0);
    pub const TEN: Rank = Rank(9);
    pub const KING: Rank = Rank(12);

    /// Build a rank from its index, rejecting anything outside `0..13`.
    pub fn new(index: u8) -> Option<Rank> {
        (index < NUM_RANKS).then_some(Rank(index))
    }

    /// The rank holding the given pip value (2..=10). Tens map to the `10`
    /// rank rather than a face card.
    pub fn from_pip(pip: u8) -> Option<Rank> {
        match pip {
            2..=9 => Some(Rank(pip - 2)),
            10 => Some(Rank::TEN),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_ace(self) -> bool {
        self.0 == 0
    }

    /// Blackjack value with the Ace counted high (11).
    pub fn value(self) -> u32 {
        match self.0 {
            0 => 11,
            9..=12 => 10,
            pip => pip as u32 + 2,
        }
    }
}

/// Shuffled pool of one or more decks. Drawing from an empty shoe refills
/// and reshuffles it first, so draws never fail.
pub struct Shoe {
    cards: Vec<Rank>,
    num_decks: usize,
    rng: StdRng,
}

impl Shoe {
    pub fn new(num_decks: usize, rng: StdRng) -> Self {
        assert!(num_decks > 0, "shoe needs at least one deck");
        let mut shoe = Shoe {
            cards: Vec::with_capacity(DECK_SIZE * num_decks),
            num_decks,
            rng,
        };
        shoe.reset();
        shoe
    }

    /// Refill to `num_decks` full decks and shuffle.
    pub fn reset(&mut self) {
        self.cards.clear();
        self.cards.extend(
            (0..DECK_SIZE * self.num_decks).map(|i| Rank((i % NUM_RANKS as usize) as u8)),
        );
        self.cards.shuffle(&mut self.rng);
    }

    pub fn draw(&mut self) -> Rank {
        if self.cards.is_empty() {
            tracing::debug!(num_decks = self.num_decks, "shoe exhausted, reshuffling");
            self.reset();
        }
        // Non-empty: reset() always refills at least one deck.
        self.cards.pop().unwrap_or(Rank::ACE)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}
