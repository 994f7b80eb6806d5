//! Core domain types for Folio.

use serde::{Deserialize, Serialize};

mod assets;
mod catalog;
mod contact;
mod i18n;
mod notes;

pub use assets::{AssetSource, FetchError};
pub use catalog::{BookId, BookRecord, Catalog, CatalogError, CategoryRecord, Rgb};
pub use contact::{ContactError, ContactMessage, ContactReceipt, ContactService};
pub use i18n::{Language, TextKey};
pub use notes::{NotesDocument, parse_notes};

pub const RECENT_BOOKS_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub language: Language,
    pub view_mode: ViewMode,
    pub reduced_motion: bool,
    pub asset_root: Option<String>,
    pub recent_books: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Scene,
    Grid,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Scene => "scene",
            ViewMode::Grid => "grid",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewMode {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scene" | "3d" => Ok(ViewMode::Scene),
            "grid" | "2d" => Ok(ViewMode::Grid),
            _ => Err("unknown view mode"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            language: Language::English,
            view_mode: ViewMode::Scene,
            reduced_motion: false,
            asset_root: None,
            recent_books: Vec::new(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.asset_root = self
            .asset_root
            .as_deref()
            .map(str::trim)
            .filter(|root| !root.is_empty())
            .map(str::to_string);

        let mut seen = std::collections::HashSet::new();
        self.recent_books = self
            .recent_books
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .take(RECENT_BOOKS_LIMIT)
            .collect();
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }

    pub fn cycle_language(&mut self) {
        self.language = match self.language {
            Language::English => Language::Chinese,
            Language::Chinese => Language::English,
        };
    }

    pub fn cycle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Scene => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Scene,
        };
    }

    /// Moves `id` to the front of the recently opened list.
    pub fn record_opened(&mut self, id: &BookId) {
        self.recent_books.retain(|existing| existing != id.as_str());
        self.recent_books.insert(0, id.as_str().to_string());
        self.recent_books.truncate(RECENT_BOOKS_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_view_mode_rotates() {
        let mut settings = Settings::default();
        assert_eq!(settings.view_mode, ViewMode::Scene);
        settings.cycle_view_mode();
        assert_eq!(settings.view_mode, ViewMode::Grid);
        settings.cycle_view_mode();
        assert_eq!(settings.view_mode, ViewMode::Scene);
    }

    #[test]
    fn cycle_theme_and_language_toggle() {
        let mut settings = Settings::default();
        settings.cycle_theme();
        assert_eq!(settings.theme, Theme::Light);
        settings.cycle_language();
        assert_eq!(settings.language, Language::Chinese);
        settings.cycle_language();
        assert_eq!(settings.language, Language::English);
    }

    #[test]
    fn view_mode_parses_strings() {
        assert_eq!("scene".parse::<ViewMode>().unwrap(), ViewMode::Scene);
        assert_eq!(" GRID ".parse::<ViewMode>().unwrap(), ViewMode::Grid);
        assert_eq!("3d".parse::<ViewMode>().unwrap(), ViewMode::Scene);
        assert!("list".parse::<ViewMode>().is_err());
    }

    #[test]
    fn theme_parses_strings() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn settings_normalizes_asset_root_and_recent() {
        let mut settings = Settings {
            asset_root: Some("   ".to_string()),
            recent_books: vec![
                " a ".to_string(),
                "b".to_string(),
                "a".to_string(),
                String::new(),
            ],
            ..Settings::default()
        };
        settings.normalize();
        assert_eq!(settings.asset_root, None);
        assert_eq!(settings.recent_books, vec!["a".to_string(), "b".to_string()]);

        settings.asset_root = Some(" /srv/site ".to_string());
        settings.normalize();
        assert_eq!(settings.asset_root.as_deref(), Some("/srv/site"));
    }

    #[test]
    fn record_opened_moves_to_front_and_caps() {
        let mut settings = Settings::default();
        for i in 0..10 {
            settings.record_opened(&BookId::new(format!("book-{i}")));
        }
        settings.record_opened(&BookId::new("book-5"));
        assert_eq!(settings.recent_books.len(), RECENT_BOOKS_LIMIT);
        assert_eq!(settings.recent_books[0], "book-5");
        assert_eq!(
            settings.recent_books.iter().filter(|id| *id == "book-5").count(),
            1
        );
    }
}
