use serde::{Deserialize, Serialize};

/// Paddle command chosen by the agent. The discriminant is the index of the
/// matching network output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Down = 0,
    Stay = 1,
    Up = 2,
}

impl Action {
    pub const COUNT: usize = 3;
    pub const ALL: [Action; Action::COUNT] = [Action::Down, Action::Stay, Action::Up];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
    pub fn index(self) -> usize {
        self as usize
    }
    /// Value sent to the simulator: `-1`, `0` or `1`.
    pub fn paddle_direction(self) -> i8 {
        self as i8 - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_direction_is_index_minus_one() {
        assert_eq!(Action::Down.paddle_direction(), -1);
        assert_eq!(Action::Stay.paddle_direction(), 0);
        assert_eq!(Action::Up.paddle_direction(), 1);
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()), Some(action));
        }
        assert_eq!(Action::from_index(3), None);
    }
}
