//! Application-level theme state.
//!
//! Dark mode lives in one explicit store with a defined contract: read
//! the current mode, toggle it, subscribe to changes. Nothing else
//! holds theme state.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn parse_lenient(value: &str) -> ThemeMode {
        match value.trim().to_lowercase().as_str() {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }
}

#[derive(Clone)]
pub struct ThemeStore {
    tx: Arc<watch::Sender<ThemeMode>>,
}

impl ThemeStore {
    pub fn new(initial: ThemeMode) -> ThemeStore {
        let (tx, _rx) = watch::channel(initial);
        ThemeStore { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ThemeMode {
        *self.tx.borrow()
    }

    /// Flips the mode and returns the new value. Subscribers observe the
    /// change through their receivers.
    pub fn toggle(&self) -> ThemeMode {
        let mut next = ThemeMode::Light;
        self.tx.send_modify(|mode| {
            *mode = mode.toggled();
            next = *mode;
        });
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_and_reports_the_new_mode() {
        let store = ThemeStore::new(ThemeMode::Light);
        assert_eq!(store.current(), ThemeMode::Light);
        assert_eq!(store.toggle(), ThemeMode::Dark);
        assert_eq!(store.current(), ThemeMode::Dark);
        assert_eq!(store.toggle(), ThemeMode::Light);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let store = ThemeStore::new(ThemeMode::Light);
        let mut rx = store.subscribe();

        store.toggle();
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow(), ThemeMode::Dark);
    }

    #[test]
    fn lenient_parse_defaults_to_light() {
        assert_eq!(ThemeMode::parse_lenient("dark"), ThemeMode::Dark);
        assert_eq!(ThemeMode::parse_lenient("DARK"), ThemeMode::Dark);
        assert_eq!(ThemeMode::parse_lenient("light"), ThemeMode::Light);
        assert_eq!(ThemeMode::parse_lenient("anything"), ThemeMode::Light);
    }
}
