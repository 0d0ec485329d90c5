use super::card::Rank;

/// Dealer stands on any total at or above this.
pub const DEALER_STAND_TOTAL: u32 = 17;

/// Highest non-busting total.
pub const BLACKJACK: u32 = 21;

/// Settled result of a hand from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Push,
    Loss,
}

impl Outcome {
    pub fn reward(self) -> f32 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Push => 0.0,
            Outcome::Loss => -1.0,
        }
    }
}

/// Best total for a hand: Aces start at 11 and drop to 1, one at a time,
/// while the total is over 21. If every Ace is already reduced the raw
/// total is returned even when it busts.
pub fn hand_value(cards: &[Rank]) -> u32 {
    let mut total: u32 = cards.iter().map(|c| c.value()).sum();
    let mut aces = cards.iter().filter(|c| c.is_ace()).count();

    while total > BLACKJACK && aces > 0 {
        total -= 10;
        aces -= 1;
    }
    total
}

pub fn is_bust(cards: &[Rank]) -> bool {
    hand_value(cards) > BLACKJACK
}

/// Play out the dealer from the upcard: draw while under 17, stand at 17 or
/// more. Soft 17 is not distinguished, so the dealer stands on it.
pub fn dealer_resolve(upcard: Rank, mut draw: impl FnMut() -> Rank) -> Vec<Rank> {
    let mut cards = vec![upcard];
    while hand_value(&cards) < DEALER_STAND_TOTAL {
        cards.push(draw());
    }
    cards
}

/// Settle a standing player total against the dealer's final total.
/// A player bust never reaches here; it is a loss decided before the dealer
/// plays.
pub fn outcome(player_value: u32, dealer_value: u32) -> Outcome {
    if dealer_value > BLACKJACK || player_value > dealer_value {
        Outcome::Win
    } else if player_value == dealer_value {
        Outcome::Push
    } else {
        Outcome::Loss
    }
}
