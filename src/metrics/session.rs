use std::time::{Duration, Instant};

/// Running tally for interactive sessions (human or agent play)
pub struct SessionMetrics {
    game_start: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    total_score: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            game_start: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            total_score: 0,
        }
    }

    /// Refresh the elapsed time of the current game
    pub fn tick(&mut self) {
        self.elapsed_time = self.game_start.elapsed();
    }

    pub fn on_game_start(&mut self) {
        self.game_start = Instant::now();
        self.elapsed_time = Duration::ZERO;
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        self.total_score += u64::from(final_score);
        self.high_score = self.high_score.max(final_score);
    }

    /// Mean final score over finished games
    pub fn mean_score(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.total_score as f32 / self.games_played as f32
        }
    }

    /// Elapsed time as `MM:SS`
    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
