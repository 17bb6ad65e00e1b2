use super::GameError;

/// Direction the snake can move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All directions in action-index order
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Returns true if turning from self to other would be a 180-degree turn
    pub fn is_opposite(&self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// The direction on the snake's right-hand side when heading this way
    pub fn clockwise(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// The direction on the snake's left-hand side when heading this way
    pub fn counter_clockwise(&self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Right => Direction::Up,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
        }
    }

    /// Returns the delta (dx, dy) for moving in this direction.
    /// The y axis grows downward.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Index of this direction in the agent's action space
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑ UP",
            Direction::Right => "→ RIGHT",
            Direction::Down => "↓ DOWN",
            Direction::Left => "← LEFT",
        }
    }
}

impl TryFrom<usize> for Direction {
    type Error = GameError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Direction::ALL
            .get(index)
            .copied()
            .ok_or(GameError::InvalidAction(index))
    }
}

/// Action that can be taken in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Request a heading change
    Move(Direction),
    /// Keep the current heading (a tick with no key pressed)
    Continue,
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        Action::Move(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_directions() {
        assert!(Direction::Up.is_opposite(Direction::Down));
        assert!(Direction::Down.is_opposite(Direction::Up));
        assert!(Direction::Left.is_opposite(Direction::Right));
        assert!(Direction::Right.is_opposite(Direction::Left));

        assert!(!Direction::Up.is_opposite(Direction::Left));
        assert!(!Direction::Up.is_opposite(Direction::Up));
    }

    #[test]
    fn test_rotation_table() {
        assert_eq!(Direction::Up.clockwise(), Direction::Right);
        assert_eq!(Direction::Right.clockwise(), Direction::Down);
        assert_eq!(Direction::Down.clockwise(), Direction::Left);
        assert_eq!(Direction::Left.clockwise(), Direction::Up);

        for dir in Direction::ALL {
            assert_eq!(dir.clockwise().counter_clockwise(), dir);
            assert_eq!(dir.clockwise().clockwise(), dir.opposite());
        }
    }

    #[test]
    fn test_index_round_trip() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::try_from(i).unwrap(), *dir);
        }
    }

    #[test]
    fn test_invalid_index_is_rejected() {
        assert!(matches!(
            Direction::try_from(4),
            Err(GameError::InvalidAction(4))
        ));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }
}
