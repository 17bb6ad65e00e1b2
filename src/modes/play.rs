//! Watch a trained agent play
//!
//! Loads a saved model and lets it play greedily in the terminal,
//! restarting automatically after each game over.
//!
//! # Controls
//!
//! - Space: Pause/unpause
//! - R: Reset episode
//! - 1-4: Speed control (1=slow, 2=normal, 3=fast, 4=very fast)
//! - Q/Esc: Quit

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use ratatui::Frame;
use std::path::Path;
use std::time::Duration;
use tokio::time::{interval, Interval};
use tracing::info;

use super::terminal::{restore_terminal, setup_terminal, Tui};
use crate::game::{Direction, GameConfig};
use crate::input::{InputHandler, KeyAction, PlaybackSpeed};
use crate::metrics::SessionMetrics;
use crate::render::{AgentOverlay, Renderer, SPARKLINE_HISTORY};
use crate::rl::{EncodedState, GreedyPolicy, SnakeEnvironment};

/// Agent play mode
pub struct PlayMode<B: Backend> {
    policy: GreedyPolicy<B>,

    env: SnakeEnvironment,

    observation: EncodedState,

    renderer: Renderer,

    input_handler: InputHandler,

    metrics: SessionMetrics,

    /// Final scores of finished games, oldest first
    scores: Vec<u32>,

    cumulative_reward: f32,

    last_action: Option<Direction>,

    should_quit: bool,

    paused: bool,

    speed: PlaybackSpeed,

    /// 1-based index of the game on screen
    episode: usize,
}

impl<B: Backend> PlayMode<B> {
    pub fn new(model_path: &Path, config: GameConfig, device: B::Device, fps: u32) -> Result<Self> {
        let policy = GreedyPolicy::load(model_path, device)
            .with_context(|| format!("Failed to load model from {:?}", model_path))?;

        let metadata = policy.metadata();
        info!(
            path = ?model_path,
            episodes_trained = metadata.episodes_trained,
            training_steps = metadata.training_steps,
            version = %metadata.version,
            "Loaded model"
        );

        let mut env = SnakeEnvironment::new(config).context("Invalid game configuration")?;
        let observation = env.reset();

        Ok(Self {
            policy,
            env,
            observation,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            metrics: SessionMetrics::new(),
            scores: Vec::new(),
            cumulative_reward: 0.0,
            last_action: None,
            should_quit: false,
            paused: false,
            speed: PlaybackSpeed::from_fps(fps),
            episode: 1,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;

        let result = self.run_loop(&mut terminal).await;

        restore_terminal(&mut terminal)?;

        info!(
            games = self.metrics.games_played,
            high_score = self.metrics.high_score,
            mean_score = self.metrics.mean_score(),
            "Playback finished"
        );

        result
    }

    async fn run_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut tick_timer = interval(self.speed.tick_interval());
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event, &mut tick_timer);
                    }
                }

                _ = tick_timer.tick() => {
                    if !self.paused {
                        self.advance()?;
                    }
                }

                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.draw(frame);
                    }).context("Failed to draw frame")?;
                }

                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// One tick: restart after a game over, otherwise take the greedy action
    fn advance(&mut self) -> Result<()> {
        if !self.env.state().is_alive() {
            self.restart();
            return Ok(());
        }

        let action = self.policy.act(&self.observation);
        let step = self.env.step(action)?;

        self.observation = step.observation;
        self.cumulative_reward += step.reward;
        self.last_action = Direction::try_from(action).ok();

        if step.done {
            let score = self.env.state().score;
            self.metrics.on_game_over(score);
            self.scores.push(score);
        }

        Ok(())
    }

    fn restart(&mut self) {
        self.observation = self.env.reset();
        self.cumulative_reward = 0.0;
        self.last_action = None;
        self.episode += 1;
        self.metrics.on_game_start();
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
            KeyAction::Restart => self.restart(),
            KeyAction::SetSpeed(speed) => {
                self.speed = speed;
                *tick_timer = interval(speed.tick_interval());
            }
            KeyAction::Steer(_) | KeyAction::None => {}
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let start = self.scores.len().saturating_sub(SPARKLINE_HISTORY);
        let overlay = AgentOverlay {
            title: "Playing",
            episode: self.episode,
            total_episodes: None,
            cumulative_reward: self.cumulative_reward,
            epsilon: None,
            best_score: self.scores.iter().copied().max(),
            last_action: self.last_action,
            dangers: self.observation.dangers(),
            recent_scores: self.scores[start..].iter().map(|&s| u64::from(s)).collect(),
            paused: self.paused,
            speed: self.speed,
        };

        self.renderer.render_agent(frame, self.env.state(), &overlay);
    }
}
