pub mod evaluate;
pub mod human;
pub mod play;
mod terminal;
pub mod train;

pub use evaluate::EvaluateMode;
pub use human::HumanMode;
pub use play::PlayMode;
pub use train::{TrainConfig, TrainMode};
