//! Key/value site configuration with typed hints. Read by every rendered
//! surface for display defaults; written from the admin settings screen.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::db::Database;

/// Rendering hint for a setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    Textarea,
    Boolean,
    Json,
}

impl SettingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "boolean" => Some(Self::Boolean),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub setting_type: SettingType,
}

#[derive(Clone)]
pub struct SettingsStore {
    db: Database,
}

impl SettingsStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read a setting, falling back to `default` when the key is absent.
    pub fn get(&self, key: &str, default: &str) -> String {
        let result: Result<Option<String>> = (|| {
            let conn = self.db.conn();
            let value = conn
                .query_row(
                    "SELECT setting_value FROM site_settings WHERE setting_key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .context("failed to read setting")?;
            Ok(value)
        })();

        match result {
            Ok(Some(value)) => value,
            Ok(None) => default.to_string(),
            Err(err) => {
                tracing::warn!("settings lookup for {key} failed: {err:#}");
                default.to_string()
            }
        }
    }

    /// Insert or overwrite a setting.
    pub fn set(&self, key: &str, value: &str, setting_type: SettingType) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO site_settings (setting_key, setting_value, setting_type)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(setting_key) DO UPDATE SET
                 setting_value = excluded.setting_value,
                 updated_at = CURRENT_TIMESTAMP",
            params![key, value, setting_type.as_str()],
        )
        .with_context(|| format!("failed to upsert setting {key}"))?;
        Ok(())
    }

    /// All settings, sorted by key.
    pub fn all(&self) -> Result<Vec<SettingRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                "SELECT setting_key, setting_value, setting_type
                 FROM site_settings ORDER BY setting_key",
            )
            .context("failed to prepare settings query")?;
        let rows = stmt
            .query_map([], |row| {
                let type_str: String = row.get(2)?;
                Ok(SettingRecord {
                    key: row.get(0)?,
                    value: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    setting_type: SettingType::parse(&type_str).unwrap_or(SettingType::Text),
                })
            })
            .context("failed to list settings")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn store() -> SettingsStore {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        SettingsStore::new(db)
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let store = store();
        assert_eq!(store.get("site_name", "Fallback"), "Fallback");
    }

    #[test]
    fn set_then_get_roundtrips() {
        let store = store();
        store
            .set("site_name", "Echhapa News", SettingType::Text)
            .expect("set");
        assert_eq!(store.get("site_name", ""), "Echhapa News");
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = store();
        store.set("site_name", "First", SettingType::Text).expect("set");
        store.set("site_name", "Second", SettingType::Text).expect("set again");
        assert_eq!(store.get("site_name", ""), "Second");

        let all = store.all().expect("all");
        assert_eq!(all.iter().filter(|s| s.key == "site_name").count(), 1);
    }
}
