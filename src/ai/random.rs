use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::Agent;
use crate::error::TrainingError;
use crate::game::{Action, StateVector, NUM_ACTIONS};

/// An agent that picks hit, stand or double uniformly at random.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_rng(rng: StdRng) -> Self {
        RandomAgent { rng }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn select_action(&mut self, _state: &StateVector, _training: bool) -> Result<Action, TrainingError> {
        let idx = self.rng.random_range(0..NUM_ACTIONS);
        Ok(Action::ALL[idx])
    }

    fn name(&self) -> &str {
        "Random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{encode_state, Rank, Round, Shoe};

    #[test]
    fn test_random_agent_covers_all_actions() {
        let mut agent = RandomAgent::with_rng(StdRng::seed_from_u64(4));
        let state = encode_state(&[Rank::TEN], Rank::ACE);
        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..200 {
            let action = agent.select_action(&state, false).unwrap();
            seen[action.index()] = true;
        }
        assert!(seen.iter().all(|&s| s), "seen: {:?}", seen);
    }

    #[test]
    fn test_random_agent_plays_full_hand() {
        let mut agent = RandomAgent::with_rng(StdRng::seed_from_u64(8));
        let mut shoe = Shoe::new(1, StdRng::seed_from_u64(8));
        let mut round = Round::new(vec![shoe.draw()], shoe.draw());

        while !round.is_terminal() {
            let action = agent.select_action(&round.state(), false).unwrap();
            round.apply(action, &mut shoe).unwrap();
        }
        assert!(round.outcome().is_some());
    }

    #[test]
    fn test_random_agent_name() {
        let agent = RandomAgent::new();
        assert_eq!(agent.name(), "Random");
    }
}
