use super::card::Rank;
use super::hand::hand_value;

/// Width of the encoded state.
pub const STATE_SIZE: usize = 5;

/// Fixed 5-feature view of a player decision point:
///
/// ```text
/// [0] player_total / 21        (not clamped, a bust reads > 1.0)
/// [1] dealer_upcard_value / 11
/// [2] has_ace                  (0 or 1)
/// [3] can_split                (0 or 1, exactly two cards of equal rank)
/// [4] hand_size / 5
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector(pub [f32; STATE_SIZE]);

impl StateVector {
    pub fn as_array(&self) -> &[f32; STATE_SIZE] {
        &self.0
    }

    pub fn player_total_norm(&self) -> f32 {
        self.0[0]
    }

    pub fn dealer_upcard_norm(&self) -> f32 {
        self.0[1]
    }

    pub fn has_ace(&self) -> bool {
        self.0[2] > 0.5
    }

    pub fn can_split(&self) -> bool {
        self.0[3] > 0.5
    }

    pub fn hand_size_norm(&self) -> f32 {
        self.0[4]
    }
}

/// Encode the player's cards against the dealer upcard.
pub fn encode_state(player_cards: &[Rank], dealer_upcard: Rank) -> StateVector {
    let has_ace = player_cards.iter().any(|c| c.is_ace());
    let can_split = player_cards.len() == 2 && player_cards[0] == player_cards[1];

    StateVector([
        hand_value(player_cards) as f32 / 21.0,
        dealer_upcard.value() as f32 / 11.0,
        if has_ace { 1.0 } else { 0.0 },
        if can_split { 1.0 } else { 0.0 },
        player_cards.len() as f32 / 5.0,
    ])
}
