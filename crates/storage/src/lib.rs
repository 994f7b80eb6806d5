//! Sqlite-backed persistence and the filesystem asset origin.

use std::path::Path;

use anyhow::Context as _;
use folio_core::{
    ContactError, ContactMessage, ContactReceipt, ContactService, Language, Settings, Theme,
    ViewMode,
};
use rusqlite::{Connection, OptionalExtension as _};

mod assets;

pub use assets::AssetOrigin;

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

/// A contact submission as stored in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                theme TEXT NOT NULL,
                language TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, theme, language)
            VALUES (1, 'dark', 'en');

            CREATE TABLE IF NOT EXISTS contact_messages (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;

        self.add_column(
            "ALTER TABLE settings ADD COLUMN view_mode TEXT NOT NULL DEFAULT 'scene'",
            "add settings.view_mode column",
        )?;
        self.add_column(
            "ALTER TABLE settings ADD COLUMN reduced_motion INTEGER NOT NULL DEFAULT 0",
            "add settings.reduced_motion column",
        )?;
        self.add_column(
            "ALTER TABLE settings ADD COLUMN asset_root TEXT",
            "add settings.asset_root column",
        )?;
        self.add_column(
            "ALTER TABLE settings ADD COLUMN recent_books_json TEXT NOT NULL DEFAULT '[]'",
            "add settings.recent_books_json column",
        )?;

        Ok(())
    }

    fn add_column(&self, sql: &str, what: &'static str) -> anyhow::Result<()> {
        match self.conn.execute(sql, []) {
            Ok(_) => Ok(()),
            Err(err) => {
                let msg = err.to_string();
                if msg.contains("duplicate column name") {
                    Ok(())
                } else {
                    Err(err).context(what)
                }
            }
        }
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT theme, language, view_mode, reduced_motion, asset_root, recent_books_json FROM settings WHERE id = 1",
                [],
                |row| {
                    let theme: String = row.get(0)?;
                    let language: String = row.get(1)?;
                    let view_mode: String = row.get(2)?;
                    let reduced_motion: i64 = row.get(3)?;
                    let asset_root: Option<String> = row.get(4)?;
                    let recent_books_json: String = row.get(5)?;
                    Ok((theme, language, view_mode, reduced_motion, asset_root, recent_books_json))
                },
            )
            .optional()?;

        let Some((theme, language, view_mode, reduced_motion, asset_root, recent_books_json)) = row
        else {
            return Ok(Settings::default());
        };

        let defaults = Settings::default();
        let recent_books: Vec<String> =
            serde_json::from_str(&recent_books_json).unwrap_or_else(|_| Vec::new());

        let mut settings = Settings {
            theme: theme.parse::<Theme>().unwrap_or(defaults.theme),
            language: language.parse::<Language>().unwrap_or(defaults.language),
            view_mode: view_mode.parse::<ViewMode>().unwrap_or(defaults.view_mode),
            reduced_motion: reduced_motion != 0,
            asset_root,
            recent_books,
        };
        settings.normalize();
        log::debug!("loaded settings: {settings:?}");
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        let recent_books_json = serde_json::to_string(&settings.recent_books)?;

        self.conn.execute(
            "UPDATE settings SET theme = ?, language = ?, view_mode = ?, reduced_motion = ?, asset_root = ?, recent_books_json = ? WHERE id = 1",
            (
                settings.theme.as_str(),
                settings.language.as_str(),
                settings.view_mode.as_str(),
                settings.reduced_motion as i64,
                settings.asset_root.as_deref(),
                recent_books_json,
            ),
        )?;
        Ok(())
    }

    pub fn list_outbox(&self) -> anyhow::Result<Vec<OutboxEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, message FROM contact_messages ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(OutboxEntry {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                message: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl ContactService for Storage {
    fn submit(&mut self, message: &ContactMessage) -> Result<ContactReceipt, ContactError> {
        self.conn
            .execute(
                "INSERT INTO contact_messages (name, email, message) VALUES (?, ?, ?)",
                (message.name(), message.email(), message.message()),
            )
            .map_err(|err| {
                log::warn!("contact outbox write failed: {err}");
                ContactError::Delivery(err.to_string())
            })?;
        let id = self.conn.last_insert_rowid();
        log::info!("contact message {id} queued");
        Ok(ContactReceipt { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_db_yields_default_settings() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        assert_eq!(storage.load_settings()?, Settings::default());
        Ok(())
    }

    #[test]
    fn settings_roundtrip() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        let mut settings = storage.load_settings()?;
        settings.theme = Theme::Light;
        settings.language = Language::Chinese;
        settings.view_mode = ViewMode::Grid;
        settings.reduced_motion = true;
        settings.asset_root = Some("  /srv/folio  ".to_string());
        settings.recent_books = vec!["geb".to_string(), "ddia".to_string()];
        storage.save_settings(&settings)?;

        let settings2 = storage.load_settings()?;
        assert_eq!(settings2.theme, Theme::Light);
        assert_eq!(settings2.language, Language::Chinese);
        assert_eq!(settings2.view_mode, ViewMode::Grid);
        assert!(settings2.reduced_motion);
        assert_eq!(settings2.asset_root.as_deref(), Some("/srv/folio"));
        assert_eq!(settings2.recent_books, vec!["geb".to_string(), "ddia".to_string()]);
        Ok(())
    }

    #[test]
    fn unparseable_columns_fall_back_to_defaults() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        storage.conn.execute(
            "UPDATE settings SET theme = 'neon', view_mode = 'vr', recent_books_json = 'nope' WHERE id = 1",
            [],
        )?;
        let settings = storage.load_settings()?;
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.view_mode, ViewMode::Scene);
        assert!(settings.recent_books.is_empty());
        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> anyhow::Result<()> {
        let storage = Storage::open_in_memory()?;
        storage.migrate()?;
        storage.migrate()?;
        Ok(())
    }

    #[test]
    fn contact_messages_land_in_outbox() -> anyhow::Result<()> {
        let mut storage = Storage::open_in_memory()?;
        let message = ContactMessage::new("Ada", "ada@example.org", "Loved the shelf.")?;
        let first = storage.submit(&message)?;
        let second = storage.submit(&message)?;
        assert!(second.id > first.id);

        let outbox = storage.list_outbox()?;
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0].name, "Ada");
        assert_eq!(outbox[0].email, "ada@example.org");
        assert_eq!(outbox[0].message, "Loved the shelf.");
        Ok(())
    }
}
