pub mod export;
pub mod session;
pub mod training_stats;

pub use export::{MetricsWriter, ScoreSummary};
pub use session::SessionMetrics;
pub use training_stats::{EpisodeSummary, TrainingStats};
