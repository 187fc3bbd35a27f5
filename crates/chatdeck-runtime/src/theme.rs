//! Light/dark theme preference.

use std::sync::Arc;

use chatdeck_layout::ButtonConfig;
use serde::{Deserialize, Serialize};

use crate::kv_store::{KeyValueStore, StorageResult, load_json, save_json};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Label of the toggle button: it names the theme a click switches to.
    #[must_use]
    pub const fn toggle_label(self) -> &'static str {
        match self {
            Theme::Light => "Dark mode",
            Theme::Dark => "Light mode",
        }
    }

    #[must_use]
    pub const fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Light => "fa-regular fa-moon fa-2xl",
            Theme::Dark => "fa-regular fa-sun fa-2xl",
        }
    }
}

/// Stored theme with a system-preference fallback.
pub struct ThemePreference {
    store: Arc<dyn KeyValueStore>,
    current: Theme,
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("current", &self.current)
            .finish()
    }
}

impl ThemePreference {
    /// Resolve the saved theme, or the system one when nothing is saved.
    #[must_use]
    pub fn resolve(store: Arc<dyn KeyValueStore>, prefers_dark: bool) -> Self {
        let current = load_json::<Theme>(store.as_ref(), THEME_KEY).unwrap_or(if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        });
        Self { store, current }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.current
    }

    /// Flip and persist.
    pub fn toggle(&mut self) -> StorageResult<Theme> {
        let next = self.current.toggled();
        save_json(self.store.as_ref(), THEME_KEY, &next)?;
        self.current = next;
        tracing::debug!(theme = ?next, "theme toggled");
        Ok(next)
    }

    /// Configuration for the sidebar toggle button in the current theme.
    #[must_use]
    pub fn toggle_button(&self) -> ButtonConfig {
        ButtonConfig::new(self.current.toggle_label())
            .icon(self.current.toggle_icon())
            .icon_and_text(true)
    }
}
