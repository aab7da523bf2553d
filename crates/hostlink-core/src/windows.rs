//! Window Manager
//!
//! Registry of open windows. Only the owner thread mutates it (through
//! `ShellRouter`); other threads read cloned snapshots.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CoreError;
use crate::window::{Window, WindowOptions};
use crate::Result;

pub struct WindowManager {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    focused: Arc<RwLock<Option<String>>>,
}

impl WindowManager {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            focused: Arc::new(RwLock::new(None)),
        }
    }

    pub fn create(&self, options: WindowOptions) -> Result<Window> {
        let window = Window::new(options)?;
        let visible = window.state.is_visible();

        self.windows
            .write()
            .insert(window.id.clone(), window.clone());

        if visible {
            *self.focused.write() = Some(window.id.clone());
        }

        tracing::info!(window_id = %window.id, title = %window.title, "Created window");

        Ok(window)
    }

    pub fn get(&self, window_id: &str) -> Result<Window> {
        self.find(window_id)
            .ok_or_else(|| CoreError::WindowNotFound(window_id.to_string()))
    }

    /// Snapshot of a window, if it is still open
    pub fn find(&self, window_id: &str) -> Option<Window> {
        self.windows.read().get(window_id).cloned()
    }

    /// Open windows, oldest first
    pub fn list(&self) -> Vec<Window> {
        let mut windows: Vec<Window> = self.windows.read().values().cloned().collect();
        windows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        windows
    }

    /// Apply `change` to a copy of the window and store it only if it succeeds.
    pub fn update<F>(&self, window_id: &str, change: F) -> Result<Window>
    where
        F: FnOnce(&mut Window) -> Result<()>,
    {
        let mut windows = self.windows.write();
        let window = windows
            .get_mut(window_id)
            .ok_or_else(|| CoreError::WindowNotFound(window_id.to_string()))?;

        let mut updated = window.clone();
        change(&mut updated)?;
        *window = updated.clone();

        Ok(updated)
    }

    /// Bring a window to the front, showing it first if needed.
    pub fn focus(&self, window_id: &str) -> Result<Window> {
        let window = self.update(window_id, |window| window.show())?;
        *self.focused.write() = Some(window.id.clone());
        tracing::debug!(window_id = %window.id, "Focused window");
        Ok(window)
    }

    pub fn focused(&self) -> Option<Window> {
        let focused = self.focused.read().clone()?;
        self.find(&focused)
    }

    pub fn close(&self, window_id: &str) -> Result<Window> {
        let window = self
            .windows
            .write()
            .remove(window_id)
            .ok_or_else(|| CoreError::WindowNotFound(window_id.to_string()))?;

        let mut focused = self.focused.write();
        if focused.as_deref() == Some(window_id) {
            *focused = None;
        }

        tracing::info!(window_id = %window.id, "Closed window");

        Ok(window)
    }

    /// Close every window, returning how many were open
    pub fn close_all(&self) -> usize {
        let closed = {
            let mut windows = self.windows.write();
            let count = windows.len();
            windows.clear();
            count
        };
        *self.focused.write() = None;

        tracing::info!(count = closed, "Closed all windows");
        closed
    }

    pub fn len(&self) -> usize {
        self.windows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.read().is_empty()
    }
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WindowManager {
    fn clone(&self) -> Self {
        Self {
            windows: Arc::clone(&self.windows),
            focused: Arc::clone(&self.focused),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowState;

    #[test]
    fn test_create_and_list() {
        let manager = WindowManager::new();
        let first = manager.create(WindowOptions::default()).unwrap();
        let second = manager
            .create(WindowOptions {
                title: "Second".to_string(),
                ..Default::default()
            })
            .unwrap();

        let ids: Vec<String> = manager.list().into_iter().map(|w| w.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id));
        assert_eq!(manager.focused().unwrap().id, second.id);
    }

    #[test]
    fn test_failed_update_leaves_window_untouched() {
        let manager = WindowManager::new();
        let window = manager.create(WindowOptions::default()).unwrap();

        let err = manager
            .update(&window.id, |w| {
                w.set_title("changed".to_string());
                w.set_size(0, 10)
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidSize { .. }));
        assert_eq!(manager.get(&window.id).unwrap().title, "Hostlink");
    }

    #[test]
    fn test_focus_shows_hidden_window() {
        let manager = WindowManager::new();
        let window = manager
            .create(WindowOptions {
                visible: false,
                ..Default::default()
            })
            .unwrap();
        assert!(manager.focused().is_none());

        let focused = manager.focus(&window.id).unwrap();
        assert_eq!(focused.state, WindowState::Normal);
        assert_eq!(manager.focused().unwrap().id, window.id);
    }

    #[test]
    fn test_close() {
        let manager = WindowManager::new();
        let window = manager.create(WindowOptions::default()).unwrap();

        manager.close(&window.id).unwrap();
        assert!(manager.focused().is_none());
        assert!(matches!(
            manager.close(&window.id),
            Err(CoreError::WindowNotFound(_))
        ));

        manager.create(WindowOptions::default()).unwrap();
        manager.create(WindowOptions::default()).unwrap();
        assert_eq!(manager.close_all(), 2);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let manager = WindowManager::new();
        let reader = manager.clone();

        let window = manager.create(WindowOptions::default()).unwrap();
        assert_eq!(reader.find(&window.id).unwrap().id, window.id);
    }
}
