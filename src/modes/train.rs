//! Training mode for the DQN agent
//!
//! Runs episodes in the Snake environment, training the agent on replayed
//! experience after every tick. Every `target_sync_every` episodes the target
//! network is refreshed from the live one. The harness saves a checkpoint
//! every `checkpoint_every` episodes, the best-scoring model whenever the
//! record is beaten, and a final model at the end.
//!
//! With `render_every` set, every N-th episode is drawn live in the terminal
//! with a training overlay; the episodes in between still run at full speed.
//!
//! # Example
//!
//! ```rust,no_run
//! use snake_dqn::modes::{TrainConfig, TrainMode};
//! use snake_dqn::rl::{default_device, TrainingBackend};
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = TrainConfig::new(1000, PathBuf::from("models/snake_model"));
//! let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
//! train_mode.run()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{ensure, Context, Result};
use burn::tensor::backend::AutodiffBackend;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::{FutureExt, StreamExt};
use ratatui::Frame;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, Interval};
use tracing::{debug, info};

use super::terminal::{restore_terminal, setup_terminal, Tui};
use crate::game::{Direction, GameConfig};
use crate::input::{InputHandler, KeyAction, PlaybackSpeed};
use crate::metrics::{EpisodeSummary, MetricsWriter, ScoreSummary, TrainingStats};
use crate::render::{AgentOverlay, Renderer, SPARKLINE_HISTORY};
use crate::rl::{
    DqnAgent, DqnConfig, EncodedState, PersistenceError, SnakeEnvironment, Transition,
};

/// Episodes averaged for the running score
const SCORE_WINDOW: usize = 100;

/// Scores above this are always logged
const NOTABLE_SCORE: u32 = 3;

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Minibatch size for each gradient step
    pub batch_size: usize,

    /// Copy the live network into the target every N episodes
    pub target_sync_every: usize,

    /// Save a checkpoint every N episodes
    pub checkpoint_every: usize,

    /// Draw every N-th episode in the terminal; `None` trains headless
    pub render_every: Option<usize>,

    /// Log progress every N episodes
    pub log_every: usize,

    /// Frame rate for rendered episodes
    pub fps: u32,

    /// Final model location (also the resume source)
    pub save_path: PathBuf,

    /// Best-scoring model location
    pub best_path: PathBuf,

    /// Directory for periodic checkpoints
    pub checkpoint_dir: PathBuf,

    /// Per-episode CSV; `None` disables export
    pub metrics_path: Option<PathBuf>,

    /// Start from the model at `save_path` if one exists
    pub resume: bool,

    pub game_config: GameConfig,

    pub dqn_config: DqnConfig,
}

impl TrainConfig {
    /// Defaults with sibling paths derived from `save_path`
    ///
    /// ```rust
    /// use snake_dqn::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(1000, PathBuf::from("models/snake_model"));
    /// assert_eq!(config.best_path, PathBuf::from("models/snake_model_best"));
    /// assert_eq!(config.checkpoint_dir, PathBuf::from("models"));
    /// ```
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        let dir = save_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let stem = save_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snake_model".to_string());

        Self {
            num_episodes,
            batch_size: 64,
            target_sync_every: 5,
            checkpoint_every: 100,
            render_every: None,
            log_every: 10,
            fps: 30,
            best_path: dir.join(format!("{stem}_best")),
            metrics_path: Some(dir.join("training_metrics.csv")),
            checkpoint_dir: dir,
            save_path,
            resume: false,
            game_config: GameConfig::default(),
            dqn_config: DqnConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.target_sync_every > 0, "target_sync_every must be at least 1");
        ensure!(self.checkpoint_every > 0, "checkpoint_every must be at least 1");
        ensure!(self.log_every > 0, "log_every must be at least 1");
        ensure!(self.fps > 0, "fps must be at least 1");
        ensure!(
            self.render_every != Some(0),
            "render_every must be at least 1 when set"
        );
        Ok(())
    }

    /// Location of the checkpoint written after `episode`
    pub fn checkpoint_path(&self, episode: usize) -> PathBuf {
        self.checkpoint_dir
            .join(format!("snake_model_checkpoint_{episode}"))
    }
}

/// Running totals of the episode in progress
#[derive(Debug, Clone)]
struct EpisodeProgress {
    observation: EncodedState,
    /// Danger bits the last action was chosen on
    dangers: [bool; 3],
    cumulative_reward: f32,
    last_action: Option<Direction>,
    done: bool,
}

impl EpisodeProgress {
    fn new(observation: EncodedState) -> Self {
        Self {
            observation,
            dangers: observation.dangers(),
            cumulative_reward: 0.0,
            last_action: None,
            done: false,
        }
    }
}

/// Training mode for the DQN agent
pub struct TrainMode<B: AutodiffBackend> {
    agent: DqnAgent<B>,

    env: SnakeEnvironment,

    /// Harness-owned history: scores, best score, counters
    stats: TrainingStats,

    config: TrainConfig,

    metrics_writer: Option<MetricsWriter>,

    renderer: Renderer,

    input_handler: InputHandler,

    current_episode: usize,

    should_quit: bool,

    paused: bool,

    speed: PlaybackSpeed,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Build the agent and environment, resuming from `save_path` when asked.
    ///
    /// A missing model on resume starts fresh; an unusable one is an error.
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        config.validate().context("Invalid training configuration")?;

        let env = SnakeEnvironment::new(config.game_config.clone())
            .context("Invalid game configuration")?;
        let mut agent = DqnAgent::new(config.dqn_config.clone(), device)
            .context("Invalid agent configuration")?;

        if config.resume {
            match agent.restore(&config.save_path) {
                Ok(metadata) => info!(
                    path = ?config.save_path,
                    episodes_trained = metadata.episodes_trained,
                    "Resuming from saved model"
                ),
                Err(PersistenceError::NotFound { path }) => {
                    info!(?path, "No saved model found, starting fresh")
                }
                Err(e) => {
                    return Err(e).context("Failed to resume from saved model");
                }
            }
        }

        let metrics_writer = config
            .metrics_path
            .as_deref()
            .map(MetricsWriter::create)
            .transpose()?;

        Ok(Self {
            agent,
            env,
            stats: TrainingStats::new(SCORE_WINDOW),
            metrics_writer,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            current_episode: 0,
            should_quit: false,
            paused: false,
            speed: PlaybackSpeed::from_fps(config.fps),
            config,
        })
    }

    /// Train headless for the configured number of episodes
    pub fn run(&mut self) -> Result<()> {
        self.log_header();

        for episode in 1..=self.config.num_episodes {
            self.current_episode = episode;
            let progress = self.run_episode()?;
            self.finish_episode(episode, &progress)?;
        }

        self.finish()
    }

    /// Train with every `render_every`-th episode drawn in the terminal.
    ///
    /// Quitting abandons the episode in progress and still saves the model.
    pub async fn run_rendered(&mut self) -> Result<()> {
        self.log_header();

        let mut terminal = setup_terminal()?;
        let result = self.run_rendered_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result?;

        self.finish()
    }

    async fn run_rendered_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let render_every = self.config.render_every.unwrap_or(1);
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(self.speed.tick_interval());
        let mut render_timer = interval(Duration::from_millis(33));

        for episode in 1..=self.config.num_episodes {
            self.current_episode = episode;

            let progress = if episode % render_every == 0 {
                self.run_episode_rendered(
                    terminal,
                    &mut event_stream,
                    &mut tick_timer,
                    &mut render_timer,
                )
                .await?
            } else {
                let progress = self.run_episode()?;
                terminal
                    .draw(|frame| self.draw(frame, &progress))
                    .context("Failed to draw frame")?;

                // Drain keys typed while the episode ran unrendered
                while let Some(Some(Ok(event))) = event_stream.next().now_or_never() {
                    self.handle_event(event, &mut tick_timer);
                }
                progress
            };

            if progress.done {
                self.finish_episode(episode, &progress)?;
            }

            if self.should_quit {
                info!(episode, "Training interrupted");
                break;
            }
        }

        Ok(())
    }

    async fn run_episode_rendered(
        &mut self,
        terminal: &mut Tui,
        event_stream: &mut EventStream,
        tick_timer: &mut Interval,
        render_timer: &mut Interval,
    ) -> Result<EpisodeProgress> {
        let mut progress = EpisodeProgress::new(self.env.reset());

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, tick_timer);
                    }
                }

                _ = tick_timer.tick() => {
                    if !self.paused {
                        self.tick(&mut progress)?;
                    }
                }

                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.draw(frame, &progress);
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit || progress.done {
                break;
            }
        }

        Ok(progress)
    }

    /// Play one episode to the end without rendering
    fn run_episode(&mut self) -> Result<EpisodeProgress> {
        let mut progress = EpisodeProgress::new(self.env.reset());

        while !progress.done {
            self.tick(&mut progress)?;
        }

        Ok(progress)
    }

    /// select -> step -> remember -> train
    fn tick(&mut self, progress: &mut EpisodeProgress) -> Result<()> {
        let action = self.agent.select_action(&progress.observation, true);
        let step = self.env.step(action)?;

        self.agent.remember(Transition {
            state: progress.observation,
            action,
            reward: step.reward,
            next_state: step.observation,
            done: step.done,
        });

        if let Some(loss) = self.agent.train_step(self.config.batch_size) {
            self.stats.record_loss(loss);
        }

        progress.dangers = progress.observation.dangers();
        progress.observation = step.observation;
        progress.cumulative_reward += step.reward;
        progress.last_action = Direction::try_from(action).ok();
        progress.done = step.done;

        Ok(())
    }

    fn finish_episode(&mut self, episode: usize, progress: &EpisodeProgress) -> Result<EpisodeSummary> {
        let state = self.env.state();
        let summary = EpisodeSummary {
            episode,
            score: state.score,
            total_reward: progress.cumulative_reward,
            steps: state.steps as usize,
            epsilon: self.agent.epsilon(),
        };

        let previous_best = self.stats.best_score().unwrap_or(0);
        self.stats.record_episode(&summary);
        self.agent.increment_episode();

        if episode % self.config.target_sync_every == 0 {
            self.agent.sync_target();
        }

        let avg_score = self.stats.mean_episode_score();
        if let Some(writer) = self.metrics_writer.as_mut() {
            writer.write_episode(&summary, avg_score)?;
        }

        if episode % self.config.log_every == 0 || summary.score > NOTABLE_SCORE {
            info!(
                "[Episode {}/{}] Score: {} | Avg score: {:.2} | Reward: {:.1} | Steps: {} | Epsilon: {:.4}",
                episode,
                self.config.num_episodes,
                summary.score,
                avg_score,
                summary.total_reward,
                summary.steps,
                summary.epsilon,
            );
        }

        if summary.score > previous_best {
            self.agent
                .persist(&self.config.best_path)
                .with_context(|| format!("Failed to save best model to {:?}", self.config.best_path))?;
            info!(score = summary.score, path = ?self.config.best_path, "New best score, model saved");
        }

        if episode % self.config.checkpoint_every == 0 {
            let path = self.config.checkpoint_path(episode);
            self.agent
                .persist(&path)
                .with_context(|| format!("Failed to save checkpoint to {:?}", path))?;
            info!(?path, "Checkpoint saved");
        }

        debug!(
            episode,
            buffer = self.agent.buffer_len(),
            training_steps = self.agent.training_steps(),
            "Episode finished"
        );

        Ok(summary)
    }

    /// Final save and summary
    fn finish(&mut self) -> Result<()> {
        self.agent.persist(&self.config.save_path).with_context(|| {
            format!("Failed to save final model to {:?}", self.config.save_path)
        })?;

        info!(path = ?self.config.save_path, "Training complete, final model saved");
        info!("{}", self.stats.format_summary());

        if let Some(summary) = ScoreSummary::from_scores(self.stats.score_history()) {
            for line in summary.format().lines() {
                info!("{line}");
            }
        }
        if let Some(writer) = &self.metrics_writer {
            info!(path = ?writer.path(), "Episode metrics written");
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event, tick_timer: &mut Interval) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::TogglePause => self.paused = !self.paused,
            KeyAction::SetSpeed(speed) => {
                self.speed = speed;
                *tick_timer = interval(speed.tick_interval());
            }
            KeyAction::Steer(_) | KeyAction::Restart | KeyAction::None => {}
        }
    }

    fn draw(&self, frame: &mut Frame, progress: &EpisodeProgress) {
        let overlay = AgentOverlay {
            title: "Training",
            episode: self.current_episode,
            total_episodes: Some(self.config.num_episodes),
            cumulative_reward: progress.cumulative_reward,
            epsilon: Some(self.agent.epsilon()),
            best_score: self.stats.best_score(),
            last_action: progress.last_action,
            dangers: progress.dangers,
            recent_scores: self
                .stats
                .recent_scores(SPARKLINE_HISTORY)
                .iter()
                .map(|&s| u64::from(s))
                .collect(),
            paused: self.paused,
            speed: self.speed,
        };

        self.renderer.render_agent(frame, self.env.state(), &overlay);
    }

    fn log_header(&self) {
        let dqn = &self.config.dqn_config;
        info!(
            episodes = self.config.num_episodes,
            grid = %format!("{}x{}", self.config.game_config.grid_width, self.config.game_config.grid_height),
            "DQN training"
        );
        info!(
            learning_rate = dqn.learning_rate,
            gamma = dqn.gamma,
            epsilon = self.agent.epsilon(),
            epsilon_min = dqn.epsilon_min,
            epsilon_decay = dqn.epsilon_decay,
            replay_capacity = dqn.replay_capacity,
            batch_size = self.config.batch_size,
            "Agent configuration"
        );
        info!(
            target_sync_every = self.config.target_sync_every,
            checkpoint_every = self.config.checkpoint_every,
            save_path = ?self.config.save_path,
            "Harness configuration"
        );
    }

    pub fn agent(&self) -> &DqnAgent<B> {
        &self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}
