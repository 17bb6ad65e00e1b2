//! Headless evaluation of a saved model
//!
//! Plays a fixed number of greedy episodes and reports the mean and max
//! score.

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use std::path::Path;
use tracing::info;

use crate::game::GameConfig;
use crate::metrics::ScoreSummary;
use crate::rl::{GreedyPolicy, SnakeEnvironment};

pub struct EvaluateMode<B: Backend> {
    policy: GreedyPolicy<B>,
    env: SnakeEnvironment,
    num_episodes: usize,
}

impl<B: Backend> EvaluateMode<B> {
    pub fn new(
        model_path: &Path,
        config: GameConfig,
        device: B::Device,
        num_episodes: usize,
    ) -> Result<Self> {
        let policy = GreedyPolicy::load(model_path, device)
            .with_context(|| format!("Failed to load model from {:?}", model_path))?;
        let env = SnakeEnvironment::new(config).context("Invalid game configuration")?;

        Ok(Self {
            policy,
            env,
            num_episodes,
        })
    }

    /// Play every episode and summarize the scores
    pub fn run(&mut self) -> Result<Option<ScoreSummary>> {
        let mut scores = Vec::with_capacity(self.num_episodes);

        for episode in 1..=self.num_episodes {
            let (score, steps) = self.play_episode()?;
            info!("Test episode {}/{}: score = {}, steps = {}", episode, self.num_episodes, score, steps);
            scores.push(score);
        }

        let summary = ScoreSummary::from_scores(&scores);
        if let Some(summary) = &summary {
            info!(
                "Mean score over {} episodes: {:.2} | Max score: {}",
                summary.episodes, summary.mean, summary.max
            );
        }

        Ok(summary)
    }

    fn play_episode(&mut self) -> Result<(u32, u32)> {
        let mut observation = self.env.reset();

        loop {
            let step = self.env.step(self.policy.act(&observation))?;
            if step.done {
                let state = self.env.state();
                return Ok((state.score, state.steps));
            }
            observation = step.observation;
        }
    }
}
