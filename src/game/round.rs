use rand::rngs::StdRng;

use super::action::Action;
use super::card::{Rank, Shoe};
use super::hand::{dealer_resolve, hand_value, is_bust, outcome, Outcome};
use super::state::{encode_state, StateVector};
use crate::error::GameError;

/// Where a single hand is in its life:
///
/// ```text
/// Playing --hit--> Playing | Bust
/// Playing --stand/double--> Settled (after the dealer plays)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPhase {
    Playing,
    Bust,
    Settled(Outcome),
}

/// Result of applying one action to a round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub next_state: StateVector,
    pub reward: f32,
    pub done: bool,
}

/// One hand in progress: the player's cards, the dealer upcard and, once
/// resolved, the dealer's full hand.
#[derive(Debug, Clone)]
pub struct Round {
    player_cards: Vec<Rank>,
    dealer_upcard: Rank,
    dealer_cards: Vec<Rank>,
    phase: HandPhase,
}

impl Round {
    pub fn new(player_cards: Vec<Rank>, dealer_upcard: Rank) -> Self {
        Round {
            player_cards,
            dealer_upcard,
            dealer_cards: vec![dealer_upcard],
            phase: HandPhase::Playing,
        }
    }

    pub fn state(&self) -> StateVector {
        encode_state(&self.player_cards, self.dealer_upcard)
    }

    pub fn player_cards(&self) -> &[Rank] {
        &self.player_cards
    }

    pub fn dealer_upcard(&self) -> Rank {
        self.dealer_upcard
    }

    pub fn dealer_cards(&self) -> &[Rank] {
        &self.dealer_cards
    }

    pub fn player_value(&self) -> u32 {
        hand_value(&self.player_cards)
    }

    pub fn phase(&self) -> HandPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, HandPhase::Bust | HandPhase::Settled(_))
    }

    /// Final result, once the hand is over.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            HandPhase::Bust => Some(Outcome::Loss),
            HandPhase::Settled(o) => Some(o),
            HandPhase::Playing => None,
        }
    }

    /// Advance the hand by one player action, drawing from `shoe` as
    /// needed. A bust is settled immediately; the dealer only plays once the
    /// player stands.
    pub fn apply(&mut self, action: Action, shoe: &mut Shoe) -> Result<StepOutcome, GameError> {
        if self.phase != HandPhase::Playing {
            return Err(GameError::HandFinished);
        }

        match action {
            Action::Hit => {
                self.player_cards.push(shoe.draw());
                let next_state = self.state();
                if is_bust(&self.player_cards) {
                    self.phase = HandPhase::Bust;
                    Ok(StepOutcome {
                        next_state,
                        reward: Outcome::Loss.reward(),
                        done: true,
                    })
                } else {
                    Ok(StepOutcome {
                        next_state,
                        reward: 0.0,
                        done: false,
                    })
                }
            }
            Action::Stand | Action::Double => {
                self.dealer_cards = dealer_resolve(self.dealer_upcard, || shoe.draw());
                let result = outcome(self.player_value(), hand_value(&self.dealer_cards));
                self.phase = HandPhase::Settled(result);
                Ok(StepOutcome {
                    next_state: self.state(),
                    reward: result.reward(),
                    done: true,
                })
            }
        }
    }
}

/// Hand simulator: owns the shoe and deals rounds from it.
pub struct Simulator {
    shoe: Shoe,
    initial_player_cards: usize,
}

impl Simulator {
    pub fn new(num_decks: usize, initial_player_cards: usize, rng: StdRng) -> Self {
        Simulator {
            shoe: Shoe::new(num_decks, rng),
            initial_player_cards,
        }
    }

    /// Deal a new round. Player cards come off the shoe first, then the
    /// dealer upcard.
    pub fn deal(&mut self) -> Round {
        let player_cards = (0..self.initial_player_cards)
            .map(|_| self.shoe.draw())
            .collect();
        let dealer_upcard = self.shoe.draw();
        Round::new(player_cards, dealer_upcard)
    }

    pub fn step(&mut self, round: &mut Round, action: Action) -> Result<StepOutcome, GameError> {
        round.apply(action, &mut self.shoe)
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }
}
