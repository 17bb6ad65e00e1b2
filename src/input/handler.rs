use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use crate::game::Direction;

/// Tick rate presets for watching a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSpeed {
    /// 2 Hz
    Slow,
    /// 8 Hz, same as human play
    Normal,
    /// 30 Hz
    Fast,
    /// 60 Hz
    VeryFast,
}

impl PlaybackSpeed {
    pub fn tick_interval(&self) -> Duration {
        match self {
            Self::Slow => Duration::from_millis(500),
            Self::Normal => Duration::from_millis(125),
            Self::Fast => Duration::from_millis(33),
            Self::VeryFast => Duration::from_millis(16),
        }
    }

    /// Closest preset for a frame rate given on the command line
    pub fn from_fps(fps: u32) -> Self {
        match fps {
            0..=4 => Self::Slow,
            5..=15 => Self::Normal,
            16..=45 => Self::Fast,
            _ => Self::VeryFast,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "Slow",
            Self::Normal => "Normal",
            Self::Fast => "Fast",
            Self::VeryFast => "Very Fast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Steer(Direction),
    Restart,
    TogglePause,
    SetSpeed(PlaybackSpeed),
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Up => KeyAction::Steer(Direction::Up),
            KeyCode::Down => KeyAction::Steer(Direction::Down),
            KeyCode::Left => KeyAction::Steer(Direction::Left),
            KeyCode::Right => KeyAction::Steer(Direction::Right),

            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'w' => KeyAction::Steer(Direction::Up),
                's' => KeyAction::Steer(Direction::Down),
                'a' => KeyAction::Steer(Direction::Left),
                'd' => KeyAction::Steer(Direction::Right),
                'q' => KeyAction::Quit,
                'r' => KeyAction::Restart,
                ' ' | 'p' => KeyAction::TogglePause,
                '1' => KeyAction::SetSpeed(PlaybackSpeed::Slow),
                '2' => KeyAction::SetSpeed(PlaybackSpeed::Normal),
                '3' => KeyAction::SetSpeed(PlaybackSpeed::Fast),
                '4' => KeyAction::SetSpeed(PlaybackSpeed::VeryFast),
                _ => KeyAction::None,
            },

            KeyCode::Esc => KeyAction::Quit,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyAction {
        InputHandler::new().handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(press(KeyCode::Up), KeyAction::Steer(Direction::Up));
        assert_eq!(press(KeyCode::Down), KeyAction::Steer(Direction::Down));
        assert_eq!(press(KeyCode::Left), KeyAction::Steer(Direction::Left));
        assert_eq!(press(KeyCode::Right), KeyAction::Steer(Direction::Right));
    }

    #[test]
    fn test_wasd_keys() {
        assert_eq!(press(KeyCode::Char('w')), KeyAction::Steer(Direction::Up));
        assert_eq!(press(KeyCode::Char('a')), KeyAction::Steer(Direction::Left));
        assert_eq!(press(KeyCode::Char('s')), KeyAction::Steer(Direction::Down));
        assert_eq!(press(KeyCode::Char('D')), KeyAction::Steer(Direction::Right));
    }

    #[test]
    fn test_controls() {
        assert_eq!(press(KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(press(KeyCode::Char('Q')), KeyAction::Quit);
        assert_eq!(press(KeyCode::Esc), KeyAction::Quit);
        assert_eq!(press(KeyCode::Char('r')), KeyAction::Restart);
        assert_eq!(press(KeyCode::Char(' ')), KeyAction::TogglePause);
        assert_eq!(press(KeyCode::Char('x')), KeyAction::None);
        assert_eq!(press(KeyCode::Tab), KeyAction::None);
    }

    #[test]
    fn test_speed_keys() {
        assert_eq!(
            press(KeyCode::Char('1')),
            KeyAction::SetSpeed(PlaybackSpeed::Slow)
        );
        assert_eq!(
            press(KeyCode::Char('4')),
            KeyAction::SetSpeed(PlaybackSpeed::VeryFast)
        );
    }

    #[test]
    fn test_ctrl_c() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(InputHandler::new().handle_key_event(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_playback_speed() {
        assert_eq!(PlaybackSpeed::Slow.tick_interval(), Duration::from_millis(500));
        assert_eq!(PlaybackSpeed::Normal.tick_interval(), Duration::from_millis(125));
        assert_eq!(PlaybackSpeed::from_fps(30), PlaybackSpeed::Fast);
        assert_eq!(PlaybackSpeed::from_fps(8), PlaybackSpeed::Normal);
        assert_eq!(PlaybackSpeed::from_fps(120), PlaybackSpeed::VeryFast);
    }
}
