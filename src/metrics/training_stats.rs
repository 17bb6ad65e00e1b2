//! Training statistics tracking for DQN
//!
//! Tracks episode-level metrics (scores, rewards, lengths) and the loss of
//! each gradient step using rolling windows, plus the full score history
//! for charts and the final summary.

use std::collections::VecDeque;

/// Per-episode scalar summary handed to logging and export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based episode index
    pub episode: usize,
    /// Food eaten
    pub score: u32,
    /// Sum of rewards over the episode
    pub total_reward: f32,
    /// Ticks taken
    pub steps: usize,
    /// Exploration rate at the end of the episode
    pub epsilon: f64,
}

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use snake_dqn::metrics::{EpisodeSummary, TrainingStats};
///
/// let mut stats = TrainingStats::new(100);
///
/// stats.record_episode(&EpisodeSummary {
///     episode: 1,
///     score: 5,
///     total_reward: 480.0,
///     steps: 150,
///     epsilon: 0.9,
/// });
/// stats.record_loss(12.5);
///
/// assert_eq!(stats.best_score(), Some(5));
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in steps (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Episode scores (rolling window)
    episode_scores: VecDeque<u32>,

    /// Training losses (rolling window)
    losses: VecDeque<f32>,

    /// Every score recorded so far
    score_history: Vec<u32>,

    best_score: Option<u32>,

    total_episodes: usize,

    total_steps: usize,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker averaging over the last `window_size` values
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_scores: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            score_history: Vec::new(),
            best_score: None,
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record the completion of an episode.
    ///
    /// Returns `true` when the score beats every earlier episode.
    pub fn record_episode(&mut self, summary: &EpisodeSummary) -> bool {
        Self::push_deque(&mut self.episode_rewards, summary.total_reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, summary.steps, self.window_size);
        Self::push_deque(&mut self.episode_scores, summary.score, self.window_size);
        self.score_history.push(summary.score);
        self.total_episodes += 1;
        self.total_steps += summary.steps;

        let improved = self.best_score.map_or(true, |best| summary.score > best);
        if improved {
            self.best_score = Some(summary.score);
        }
        improved
    }

    /// Record the loss of one gradient step
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
    }

    /// Mean score over the rolling window
    pub fn mean_episode_score(&self) -> f32 {
        if self.episode_scores.is_empty() {
            0.0
        } else {
            self.episode_scores.iter().sum::<u32>() as f32 / self.episode_scores.len() as f32
        }
    }

    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(&self.episode_rewards)
    }

    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f32 / self.episode_lengths.len() as f32
        }
    }

    pub fn mean_loss(&self) -> f32 {
        Self::mean(&self.losses)
    }

    /// Highest score so far, `None` before the first episode
    pub fn best_score(&self) -> Option<u32> {
        self.best_score
    }

    /// All scores in episode order
    pub fn score_history(&self) -> &[u32] {
        &self.score_history
    }

    /// The last `n` scores (fewer if not enough episodes ran)
    pub fn recent_scores(&self, n: usize) -> &[u32] {
        let start = self.score_history.len().saturating_sub(n);
        &self.score_history[start..]
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the rolling statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Avg score: {:.2} | Best: {} | Reward: {:.2} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_score(),
            self.best_score.unwrap_or(0),
            self.mean_episode_reward(),
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
