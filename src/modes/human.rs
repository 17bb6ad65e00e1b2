use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use super::terminal::{restore_terminal, setup_terminal, Tui};
use crate::game::{Action, Direction, GameConfig, GameEngine, GameState};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::SessionMetrics;
use crate::render::Renderer;

/// Keyboard-controlled game
pub struct HumanMode {
    engine: GameEngine,
    state: GameState,
    metrics: SessionMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
    paused: bool,
    pending_direction: Option<Direction>,
}

impl HumanMode {
    /// Start a game; the stall limit only applies to agents
    pub fn new(config: GameConfig) -> Result<Self> {
        let mut engine = GameEngine::new(config.without_stall_limit())
            .context("Invalid game configuration")?;
        let state = engine.reset();

        Ok(Self {
            engine,
            state,
            metrics: SessionMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
            paused: false,
            pending_direction: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;

        let result = self.run_game_loop(&mut terminal).await;

        restore_terminal(&mut terminal)?;

        info!(
            games = self.metrics.games_played,
            high_score = self.metrics.high_score,
            mean_score = self.metrics.mean_score(),
            "Session finished"
        );

        result
    }

    async fn run_game_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Game ticks at 8 Hz (125ms per tick)
        let mut tick_timer = interval(Duration::from_millis(125));

        // Render at 30 FPS
        let mut render_timer = interval(Duration::from_millis(33));

        loop {
            tokio::select! {
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                _ = tick_timer.tick() => {
                    if self.state.is_alive() && !self.paused {
                        self.update_game();
                    }
                }

                _ = render_timer.tick() => {
                    if self.state.is_alive() {
                        self.metrics.tick();
                    }
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.state, &self.metrics);
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

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };

        // Only process key press events, not release
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.input_handler.handle_key_event(key) {
            KeyAction::Steer(dir) => self.pending_direction = Some(dir),
            KeyAction::Restart => {
                if !self.state.is_alive() {
                    self.reset_game();
                }
            }
            KeyAction::TogglePause => self.paused = !self.paused,
            KeyAction::Quit => self.should_quit = true,
            KeyAction::SetSpeed(_) | KeyAction::None => {}
        }
    }

    fn update_game(&mut self) {
        if !self.state.is_alive() {
            return;
        }

        let action = self
            .pending_direction
            .take()
            .map(Action::Move)
            .unwrap_or(Action::Continue);

        let result = self.engine.step(&mut self.state, action);

        if result.terminated {
            self.metrics.on_game_over(self.state.score);
        }
    }

    fn reset_game(&mut self) {
        self.state = self.engine.reset();
        self.metrics.on_game_start();
        self.pending_direction = None;
        self.paused = false;
    }
}
