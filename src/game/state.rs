use super::action::Direction;

/// A cell on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The neighbouring cell in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// The snake: body cells head-first plus the current heading
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
    /// Current heading
    pub direction: Direction,
}

impl Snake {
    /// Create a straight snake of `length` cells trailing behind `head`
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let (dx, dy) = direction.delta();
        let body = (0..length.max(1) as i32)
            .map(|i| head.moved_by(-dx * i, -dy * i))
            .collect();

        Self { body, direction }
    }

    /// Create a snake from explicit cells, head first
    pub fn from_cells(body: Vec<Position>, direction: Direction) -> Self {
        debug_assert!(!body.is_empty(), "snake body must hold at least the head");
        Self { body, direction }
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Whether any cell of the body (tail included) occupies `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Prepend a new head cell
    pub(crate) fn push_head(&mut self, pos: Position) {
        self.body.insert(0, pos);
    }

    /// Drop the last cell, never the head
    pub(crate) fn pop_tail(&mut self) {
        if self.body.len() > 1 {
            self.body.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// A snake always has a head, so this is false for every reachable state
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake left the grid
    Wall,
    /// Snake ran into its own body
    SelfCollision,
    /// Too many ticks without eating
    Stall,
    /// No free cell left for food
    BoardFull,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub grid_width: usize,
    pub grid_height: usize,
    pub score: u32,
    /// Ticks taken this episode
    pub steps: u32,
    /// Ticks since food was last eaten (anti-stall counter)
    pub steps_since_food: u32,
    pub terminal: bool,
}

impl GameState {
    pub fn new(snake: Snake, food: Position, grid_width: usize, grid_height: usize) -> Self {
        Self {
            snake,
            food,
            grid_width,
            grid_height,
            score: 0,
            steps: 0,
            steps_since_food: 0,
            terminal: false,
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.grid_width as i32
            && pos.y >= 0
            && pos.y < self.grid_height as i32
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }

    /// A cell the head must not enter: outside the grid or on the body
    pub fn is_danger(&self, pos: Position) -> bool {
        !self.is_in_bounds(pos) || self.is_occupied_by_snake(pos)
    }

    pub fn body(&self) -> &[Position] {
        &self.snake.body
    }

    pub fn heading(&self) -> Direction {
        self.snake.direction
    }

    pub fn is_alive(&self) -> bool {
        !self.terminal
    }
}
