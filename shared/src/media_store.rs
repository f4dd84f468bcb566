//! Metadata rows for uploaded files. The bytes themselves live on disk under
//! the uploads directory; only the backend's upload handler writes there.

use anyhow::{Context, Result};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_by: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMediaInput {
    pub filename: String,
    pub original_name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub uploaded_by: Option<i64>,
}

#[derive(Clone)]
pub struct MediaStore {
    db: Database,
}

impl MediaStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn record_upload(&self, input: NewMediaInput) -> Result<i64> {
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO media (filename, original_name, file_path, file_type, file_size, uploaded_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.filename,
                input.original_name,
                input.file_path,
                input.file_type,
                input.file_size,
                input.uploaded_by,
            ],
        )
        .with_context(|| format!("failed to record upload {}", input.filename))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list(&self) -> Result<Vec<MediaRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, filename, original_name, file_path, file_type, file_size,
                        uploaded_by, created_at
                 FROM media ORDER BY created_at DESC, id DESC",
            )
            .context("failed to prepare media list")?;
        let rows = stmt
            .query_map([], media_from_row)
            .context("failed to list media")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
    Ok(MediaRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        original_name: row.get(2)?,
        file_path: row.get(3)?,
        file_type: row.get(4)?,
        file_size: row.get(5)?,
        uploaded_by: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn record_then_list_roundtrips() {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        let store = MediaStore::new(db);

        let id = store
            .record_upload(NewMediaInput {
                filename: "abc123.png".to_string(),
                original_name: "photo.png".to_string(),
                file_path: "uploads/abc123.png".to_string(),
                file_type: Some("image/png".to_string()),
                file_size: Some(2048),
                uploaded_by: None,
            })
            .expect("record");

        let all = store.list().expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].original_name, "photo.png");
    }

    #[test]
    fn list_returns_newest_first() {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        let store = MediaStore::new(db);

        for name in ["first.pdf", "second.pdf", "third.pdf"] {
            store
                .record_upload(NewMediaInput {
                    filename: format!("gen-{name}"),
                    original_name: name.to_string(),
                    file_path: format!("uploads/gen-{name}"),
                    file_type: Some("application/pdf".to_string()),
                    file_size: Some(100),
                    uploaded_by: None,
                })
                .expect("record");
        }

        let all = store.list().expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].original_name, "third.pdf");
        assert_eq!(all[2].original_name, "first.pdf");
    }
}
