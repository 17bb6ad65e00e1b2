use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Sparkline},
    Frame,
};

use crate::game::{Direction, GameState, Position};
use crate::input::PlaybackSpeed;
use crate::metrics::SessionMetrics;

/// Episode scores shown in the sparkline
pub const SPARKLINE_HISTORY: usize = 100;

/// Side panel contents while an agent is playing
#[derive(Debug, Clone)]
pub struct AgentOverlay {
    /// Panel title, e.g. "Training" or "Playing"
    pub title: &'static str,
    /// 1-based episode index
    pub episode: usize,
    /// Total episodes when known
    pub total_episodes: Option<usize>,
    pub cumulative_reward: f32,
    /// Exploration rate; `None` for greedy play
    pub epsilon: Option<f64>,
    pub best_score: Option<u32>,
    pub last_action: Option<Direction>,
    /// Danger ahead, right, left as seen by the agent
    pub dangers: [bool; 3],
    /// Recent final scores, oldest first
    pub recent_scores: Vec<u64>,
    pub paused: bool,
    pub speed: PlaybackSpeed,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Human play: stats header, grid (or game over panel), controls footer
    pub fn render(&self, frame: &mut Frame, state: &GameState, metrics: &SessionMetrics) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(state, metrics), chunks[0]);

        let game_area = Self::centered(chunks[1]);
        if state.is_alive() {
            frame.render_widget(self.render_grid(state), game_area);
        } else {
            frame.render_widget(self.render_game_over(state), game_area);
        }

        frame.render_widget(
            Self::render_controls(&[("↑↓←→/WASD", "move"), ("Space", "pause"), ("Q", "quit")]),
            chunks[2],
        );
    }

    /// Agent play or training: grid on the left, overlay on the right
    pub fn render_agent(&self, frame: &mut Frame, state: &GameState, overlay: &AgentOverlay) {
        let rows = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);

        frame.render_widget(self.render_grid(state), columns[0]);

        let side = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Min(12), Constraint::Length(7)])
            .split(columns[1]);

        frame.render_widget(self.render_overlay(state, overlay), side[0]);

        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Last {} scores ", overlay.recent_scores.len())),
            )
            .style(Style::default().fg(Color::Yellow))
            .data(&overlay.recent_scores);
        frame.render_widget(sparkline, side[1]);

        frame.render_widget(
            Self::render_controls(&[
                ("Space", "pause"),
                ("1-4", "speed"),
                ("R", "reset"),
                ("Q", "quit"),
            ]),
            rows[1],
        );
    }

    fn centered(area: Rect) -> Rect {
        Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(area)[1]
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'static> {
        let head = state.snake.head();
        let mut lines = Vec::with_capacity(state.grid_height);

        for y in 0..state.grid_height {
            let mut spans = Vec::with_capacity(state.grid_width);

            for x in 0..state.grid_width {
                let pos = Position::new(x as i32, y as i32);

                let cell = if pos == head {
                    Span::styled(
                        "■ ",
                        Style::default()
                            .fg(if state.terminal { Color::Red } else { Color::Cyan })
                            .add_modifier(Modifier::BOLD),
                    )
                } else if state.is_occupied_by_snake(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if pos == state.food {
                    Span::styled(
                        "O ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, state: &GameState, metrics: &SessionMetrics) -> Paragraph<'static> {
        let text = vec![Line::from(vec![
            Self::label("Score: "),
            Span::styled(
                state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Self::label("Best: "),
            Self::value(metrics.high_score.to_string()),
            Span::raw("    "),
            Self::label("Steps: "),
            Self::value(state.steps.to_string()),
            Span::raw("    "),
            Self::label("Time: "),
            Self::value(metrics.format_time()),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_overlay(&self, state: &GameState, overlay: &AgentOverlay) -> Paragraph<'static> {
        let episode = match overlay.total_episodes {
            Some(total) => format!("{}/{}", overlay.episode, total),
            None => overlay.episode.to_string(),
        };

        let mut lines = vec![
            Line::from(vec![Self::label("Episode: "), Self::value(episode)]),
            Line::from(vec![Self::label("Score: "), Self::value(state.score.to_string())]),
            Line::from(vec![Self::label("Steps: "), Self::value(state.steps.to_string())]),
            Line::from(vec![
                Self::label("Reward: "),
                Self::value(format!("{:.1}", overlay.cumulative_reward)),
            ]),
        ];

        if let Some(epsilon) = overlay.epsilon {
            lines.push(Line::from(vec![
                Self::label("Epsilon: "),
                Self::value(format!("{epsilon:.4}")),
            ]));
        }

        lines.push(Line::from(vec![
            Self::label("Best: "),
            Self::value(overlay.best_score.map_or("-".to_string(), |s| s.to_string())),
        ]));
        lines.push(Line::from(vec![
            Self::label("Action: "),
            Self::value(overlay.last_action.map_or("-", |d| d.arrow()).to_string()),
        ]));

        let mut danger = vec![Self::label("Danger: ")];
        for (name, hot) in ["ahead", "right", "left"].into_iter().zip(overlay.dangers) {
            let style = if hot {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            danger.push(Span::styled(format!("{name} "), style));
        }
        lines.push(Line::from(danger));

        lines.push(Line::from(vec![
            Self::label("Speed: "),
            Self::value(overlay.speed.as_str().to_string()),
        ]));

        if overlay.paused {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "PAUSED",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(format!(" {} ", overlay.title)),
        )
    }

    fn render_game_over(&self, state: &GameState) -> Paragraph<'static> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Self::label("Final Score: "),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(keys: &[(&'static str, &'static str)]) -> Paragraph<'static> {
        let mut spans = Vec::new();
        for (i, (key, what)) in keys.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" | "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::raw(format!(" {what}")));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn label(text: &'static str) -> Span<'static> {
        Span::styled(text, Style::default().fg(Color::Yellow))
    }

    fn value(text: String) -> Span<'static> {
        Span::styled(text, Style::default().fg(Color::White))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
