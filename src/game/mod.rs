//! Blackjack hand simulation: card ranks, the reshuffling shoe, hand
//! arithmetic, the dealer policy, and the per-hand state machine.

mod action;
mod card;
mod hand;
mod round;
mod state;

pub use action::{argmax, Action, NUM_ACTIONS};
pub use card::{Rank, Shoe, DECK_SIZE, NUM_RANKS};
pub use hand::{dealer_resolve, hand_value, is_bust, outcome, Outcome, BLACKJACK, DEALER_STAND_TOTAL};
pub use round::{HandPhase, Round, Simulator, StepOutcome};
pub use state::{encode_state, StateVector, STATE_SIZE};
