//! Window data and state machine
//!
//! ```text
//! Normal     → Minimized | Maximized | Fullscreen | Hidden
//! Minimized  → Normal | Maximized | Hidden
//! Maximized  → Normal | Minimized | Fullscreen | Hidden
//! Fullscreen → Normal | Maximized | Hidden
//! Hidden     → Normal | Maximized | Fullscreen
//! ```
//!
//! Fullscreen and hidden windows remember the state they came from; leaving
//! those states returns to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::Result;

/// Largest edge accepted for a window, in logical pixels
pub const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
    Hidden,
}

impl WindowState {
    pub fn can_transition_to(&self, target: WindowState) -> bool {
        use WindowState::*;

        match (self, target) {
            (a, b) if *a == b => true,
            (_, Hidden) => true,
            (Hidden, Normal | Maximized | Fullscreen) => true,
            (Normal, Minimized | Maximized | Fullscreen) => true,
            (Minimized, Normal | Maximized) => true,
            (Maximized, Normal | Minimized | Fullscreen) => true,
            (Fullscreen, Normal | Maximized) => true,
            _ => false,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, WindowState::Hidden | WindowState::Minimized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowState::Normal => "normal",
            WindowState::Minimized => "minimized",
            WindowState::Maximized => "maximized",
            WindowState::Fullscreen => "fullscreen",
            WindowState::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for WindowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WindowState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(WindowState::Normal),
            "minimized" => Ok(WindowState::Minimized),
            "maximized" => Ok(WindowState::Maximized),
            "fullscreen" => Ok(WindowState::Fullscreen),
            "hidden" => Ok(WindowState::Hidden),
            _ => Err(format!("Unknown window state: {}", s)),
        }
    }
}

/// Parameters for a new window. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    pub title: String,
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub visible: bool,
    pub fullscreen: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Hostlink".to_string(),
            url: None,
            width: 800,
            height: 600,
            x: 0,
            y: 0,
            visible: true,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: String,
    pub title: String,
    /// Page loaded in the window's web view
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub state: WindowState,
    /// Where `show` and leaving fullscreen return to
    pub restore_state: WindowState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Window {
    pub fn new(options: WindowOptions) -> Result<Self> {
        validate_size(options.width, options.height)?;

        let url = match options.url {
            Some(raw) => Some(url::Url::parse(&raw)?.to_string()),
            None => None,
        };

        let now = Utc::now();
        let mut window = Self {
            id: Uuid::new_v4().to_string(),
            title: options.title,
            url,
            width: options.width,
            height: options.height,
            x: options.x,
            y: options.y,
            state: WindowState::Normal,
            restore_state: WindowState::Normal,
            created_at: now,
            updated_at: now,
        };

        if options.fullscreen {
            window.transition_to(WindowState::Fullscreen)?;
        }
        if !options.visible {
            window.hide()?;
        }

        Ok(window)
    }

    /// Attempt to transition to a new state
    pub fn transition_to(&mut self, new_state: WindowState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(CoreError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        if self.state == new_state {
            return Ok(());
        }

        tracing::debug!(
            window_id = %self.id,
            from = %self.state,
            to = %new_state,
            "Window state transition"
        );

        if matches!(new_state, WindowState::Hidden | WindowState::Fullscreen) {
            self.restore_state = match self.state {
                WindowState::Maximized => WindowState::Maximized,
                WindowState::Fullscreen if new_state == WindowState::Hidden => {
                    WindowState::Fullscreen
                }
                _ => WindowState::Normal,
            };
        }

        self.state = new_state;
        self.touch();
        Ok(())
    }

    pub fn show(&mut self) -> Result<()> {
        match self.state {
            WindowState::Hidden => self.transition_to(self.restore_state),
            WindowState::Minimized => self.transition_to(WindowState::Normal),
            _ => Ok(()),
        }
    }

    pub fn hide(&mut self) -> Result<()> {
        self.transition_to(WindowState::Hidden)
    }

    pub fn minimize(&mut self) -> Result<()> {
        self.transition_to(WindowState::Minimized)
    }

    pub fn maximize(&mut self) -> Result<()> {
        self.transition_to(WindowState::Maximized)
    }

    /// Back to a normal, visible window from any state.
    pub fn restore(&mut self) -> Result<()> {
        self.transition_to(WindowState::Normal)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        if self.state == WindowState::Fullscreen {
            let target = match self.restore_state {
                WindowState::Maximized => WindowState::Maximized,
                _ => WindowState::Normal,
            };
            self.transition_to(target)
        } else {
            self.transition_to(WindowState::Fullscreen)
        }
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.touch();
    }

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        validate_size(width, height)?;
        self.width = width;
        self.height = height;
        self.touch();
        Ok(())
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CoreError::InvalidSize { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(WindowState::Normal.can_transition_to(WindowState::Minimized));
        assert!(WindowState::Normal.can_transition_to(WindowState::Fullscreen));
        assert!(WindowState::Minimized.can_transition_to(WindowState::Normal));
        assert!(WindowState::Maximized.can_transition_to(WindowState::Fullscreen));
        assert!(WindowState::Fullscreen.can_transition_to(WindowState::Maximized));
        assert!(WindowState::Hidden.can_transition_to(WindowState::Normal));
        assert!(WindowState::Fullscreen.can_transition_to(WindowState::Hidden));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!WindowState::Minimized.can_transition_to(WindowState::Fullscreen));
        assert!(!WindowState::Fullscreen.can_transition_to(WindowState::Minimized));
        assert!(!WindowState::Hidden.can_transition_to(WindowState::Minimized));
    }

    #[test]
    fn test_new_window_defaults() {
        let window = Window::new(WindowOptions::default()).unwrap();
        assert_eq!(window.state, WindowState::Normal);
        assert_eq!((window.width, window.height), (800, 600));
        assert!(window.url.is_none());
    }

    #[test]
    fn test_new_window_validates() {
        let err = Window::new(WindowOptions {
            width: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSize { width: 0, .. }));

        let err = Window::new(WindowOptions {
            url: Some("not a url".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CoreError::Url(_)));
    }

    #[test]
    fn test_hidden_fullscreen_window() {
        let mut window = Window::new(WindowOptions {
            visible: false,
            fullscreen: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(window.state, WindowState::Hidden);

        window.show().unwrap();
        assert_eq!(window.state, WindowState::Fullscreen);
    }

    #[test]
    fn test_fullscreen_returns_to_maximized() {
        let mut window = Window::new(WindowOptions::default()).unwrap();
        window.maximize().unwrap();
        window.toggle_fullscreen().unwrap();
        assert_eq!(window.state, WindowState::Fullscreen);

        window.toggle_fullscreen().unwrap();
        assert_eq!(window.state, WindowState::Maximized);
    }

    #[test]
    fn test_minimized_cannot_go_fullscreen() {
        let mut window = Window::new(WindowOptions::default()).unwrap();
        window.minimize().unwrap();

        let err = window.toggle_fullscreen().unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(window.state, WindowState::Minimized);

        window.show().unwrap();
        assert_eq!(window.state, WindowState::Normal);
    }

    #[test]
    fn test_state_parse() {
        assert_eq!("Hidden".parse::<WindowState>().unwrap(), WindowState::Hidden);
        assert!("docked".parse::<WindowState>().is_err());
    }
}
