//! Fixed-length feature encoding of the game state
//!
//! Layout of the 12 features:
//!
//! ```text
//! [0..4)  heading one-hot: Up, Right, Down, Left
//! [4]     danger ahead
//! [5]     danger to the right of the heading
//! [6]     danger to the left of the heading
//! [7]     food is left of the head
//! [8]     food is right of the head
//! [9]     food is above the head
//! [10]    food is below the head
//! [11]    body length / number of cells
//! ```

use burn::tensor::{backend::Backend, Tensor, TensorData};

use crate::game::GameState;

/// Number of features in an [`EncodedState`]
pub const STATE_SIZE: usize = 12;

/// The agent's view of a game state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedState(pub [f32; STATE_SIZE]);

impl EncodedState {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Danger flags (ahead, right, left)
    pub fn dangers(&self) -> [bool; 3] {
        [self.0[4] > 0.5, self.0[5] > 0.5, self.0[6] > 0.5]
    }

    /// Single-row tensor `[1, STATE_SIZE]`
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(TensorData::new(self.0.to_vec(), [1, STATE_SIZE]), device)
    }
}

/// Stack states into a `[batch, STATE_SIZE]` tensor
pub fn batch_tensor<'a, B: Backend>(
    states: impl ExactSizeIterator<Item = &'a EncodedState>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch = states.len();
    let data: Vec<f32> = states.flat_map(|s| s.0).collect();

    Tensor::from_data(TensorData::new(data, [batch, STATE_SIZE]), device)
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encode a game state into the agent's feature vector
pub fn encode_state(state: &GameState) -> EncodedState {
    let mut features = [0.0; STATE_SIZE];

    let heading = state.heading();
    features[heading.index()] = 1.0;

    let head = state.snake.head();
    features[4] = flag(state.is_danger(head.moved_in_direction(heading)));
    features[5] = flag(state.is_danger(head.moved_in_direction(heading.clockwise())));
    features[6] = flag(state.is_danger(head.moved_in_direction(heading.counter_clockwise())));

    let food = state.food;
    features[7] = flag(food.x < head.x);
    features[8] = flag(food.x > head.x);
    features[9] = flag(food.y < head.y);
    features[10] = flag(food.y > head.y);

    features[11] = state.snake.len() as f32 / (state.grid_width * state.grid_height) as f32;

    EncodedState(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, Position, Snake};
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn state(snake: Snake, food: Position) -> GameState {
        GameState::new(snake, food, 20, 20)
    }

    #[test]
    fn test_heading_one_hot() {
        for dir in Direction::ALL {
            let s = state(Snake::new(Position::new(10, 10), dir, 1), Position::new(0, 0));
            let encoded = encode_state(&s);

            let one_hot = &encoded.as_slice()[0..4];
            assert_eq!(one_hot.iter().sum::<f32>(), 1.0);
            assert_eq!(one_hot[dir.index()], 1.0);
        }
    }

    #[test]
    fn test_no_danger_in_open_field() {
        let s = state(
            Snake::new(Position::new(10, 10), Direction::Right, 1),
            Position::new(15, 10),
        );
        assert_eq!(encode_state(&s).dangers(), [false, false, false]);
    }

    #[test]
    fn test_wall_dangers_relative_to_heading() {
        // Heading right in the top-right corner: wall ahead and on the left (up)
        let s = state(
            Snake::new(Position::new(19, 0), Direction::Right, 1),
            Position::new(5, 5),
        );
        assert_eq!(encode_state(&s).dangers(), [true, false, true]);

        // Heading up in the top-left corner: wall ahead and on the left
        let s = state(
            Snake::new(Position::new(0, 0), Direction::Up, 1),
            Position::new(5, 5),
        );
        assert_eq!(encode_state(&s).dangers(), [true, false, true]);

        // Heading down along the left wall: right of heading is the left wall
        let s = state(
            Snake::new(Position::new(0, 5), Direction::Down, 1),
            Position::new(5, 5),
        );
        assert_eq!(encode_state(&s).dangers(), [false, true, false]);
    }

    #[test]
    fn test_body_danger() {
        // Head at (5,5) heading up; body curls to the right of the head
        let snake = Snake::from_cells(
            vec![
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(6, 6),
                Position::new(6, 5),
            ],
            Direction::Up,
        );
        let s = state(snake, Position::new(0, 0));
        assert_eq!(encode_state(&s).dangers(), [false, true, false]);
    }

    #[test]
    fn test_food_direction_bits() {
        let s = state(
            Snake::new(Position::new(10, 10), Direction::Right, 1),
            Position::new(3, 15),
        );
        let f = encode_state(&s);
        assert_eq!(&f.as_slice()[7..11], &[1.0, 0.0, 0.0, 1.0]);

        let s = state(
            Snake::new(Position::new(10, 10), Direction::Right, 1),
            Position::new(10, 2),
        );
        let f = encode_state(&s);
        assert_eq!(&f.as_slice()[7..11], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_length_is_normalized() {
        let s = state(
            Snake::new(Position::new(10, 10), Direction::Right, 4),
            Position::new(0, 0),
        );
        let f = encode_state(&s);
        assert!((f.as_slice()[11] - 4.0 / 400.0).abs() < 1e-7);
    }

    #[test]
    fn test_batch_tensor_shape() {
        let device = NdArrayDevice::default();
        let s = state(
            Snake::new(Position::new(10, 10), Direction::Right, 1),
            Position::new(0, 0),
        );
        let encoded = [encode_state(&s); 3];

        let batch = batch_tensor::<TestBackend>(encoded.iter(), &device);
        assert_eq!(batch.dims(), [3, STATE_SIZE]);

        let single = encoded[0].to_tensor::<TestBackend>(&device);
        assert_eq!(single.dims(), [1, STATE_SIZE]);
    }
}
