use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::{now, uuid_column, Database};
use crate::error::{Result, StoreError};
use crate::models::AppSetting;

/// URL of the logo shown across the app; empty means none
pub const APP_LOGO_URL: &str = "app_logo_url";

/// Settings present in every database, with their initial values
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[(APP_LOGO_URL, "")];

const SETTING_COLUMNS: &str = "id, key, value, created_at, updated_at";

fn setting_from_row(row: &Row) -> rusqlite::Result<AppSetting> {
    Ok(AppSetting {
        id: uuid_column(row, "id")?,
        key: row.get("key")?,
        value: row.get("value")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert each default whose key is absent. Existing rows, including
/// ones changed from their default, are left alone.
pub(super) fn seed_defaults(conn: &Connection) -> Result<usize> {
    let ts = now();
    let mut inserted = 0;
    for (key, value) in DEFAULT_SETTINGS {
        inserted += conn.execute(
            "INSERT INTO app_settings (id, key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (key) DO NOTHING",
            params![Uuid::new_v4().to_string(), key, value, ts],
        )?;
    }
    if inserted > 0 {
        debug!(inserted, "seeded default settings");
    }
    Ok(inserted)
}

fn default_value(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

impl Database {
    /// Keys are matched after trimming, as `set_setting` stores them
    pub fn get_setting(&self, key: &str) -> Result<Option<AppSetting>> {
        let key = key.trim();
        let sql = format!("SELECT {} FROM app_settings WHERE key = ?1", SETTING_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, [key], setting_from_row)
            .optional()?)
    }

    /// Stored value, falling back to the documented default for known keys
    pub fn setting_or_default(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .get_setting(key)?
            .map(|s| s.value)
            .or_else(|| default_value(key.trim()).map(str::to_string)))
    }

    /// Insert or overwrite a setting
    pub fn set_setting(&self, key: &str, value: &str) -> Result<AppSetting> {
        let key = key.trim();
        if key.is_empty() {
            return Err(StoreError::Validation("setting key must not be blank".to_string()));
        }

        let sql = format!(
            "INSERT INTO app_settings (id, key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
             RETURNING {}",
            SETTING_COLUMNS
        );
        let setting = self.conn.query_row(
            &sql,
            params![Uuid::new_v4().to_string(), key, value, now()],
            setting_from_row,
        )?;
        Ok(setting)
    }

    pub fn list_settings(&self) -> Result<Vec<AppSetting>> {
        let sql = format!("SELECT {} FROM app_settings ORDER BY key", SETTING_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let settings = stmt
            .query_map([], setting_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(settings)
    }

    /// Re-run the default seed; returns how many rows were inserted
    pub fn seed_default_settings(&self) -> Result<usize> {
        seed_defaults(&self.conn)
    }
}
