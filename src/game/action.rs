/// Number of player actions the value network scores.
pub const NUM_ACTIONS: usize = 3;

/// Player actions, indexed as the value network's output columns.
///
/// `Double` ends the turn exactly like `Stand`; stakes are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hit = 0,
    Stand = 1,
    Double = 2,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [Action::Hit, Action::Stand, Action::Double];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double",
        }
    }

    /// Whether this action ends the player's turn.
    pub fn ends_turn(self) -> bool {
        !matches!(self, Action::Hit)
    }
}

/// Index of the first maximum. Ties keep the earliest action; an empty
/// slice yields 0.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best_value = v;
            best = i;
        }
    }
    best
}
