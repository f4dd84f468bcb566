//! Categories (optionally hierarchical) and tags. Pure reference data:
//! categories are managed from the admin screen, tags are created lazily when
//! an article first references them and are never deleted.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{db::Database, slug::generate_slug};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Clone)]
pub struct TaxonomyStore {
    db: Database,
}

impl TaxonomyStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_category(&self, input: NewCategoryInput) -> Result<CategoryRecord> {
        let slug = input
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO categories (name, slug, description, parent_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![input.name, slug, input.description, input.parent_id],
        )
        .with_context(|| format!("failed to create category {slug}"))?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.category_by_id(id)?
            .context("category vanished after insert")
    }

    pub fn update_category(&self, id: i64, input: NewCategoryInput) -> Result<()> {
        let slug = input
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE categories SET name = ?1, slug = ?2, description = ?3, parent_id = ?4
                 WHERE id = ?5",
                params![input.name, slug, input.description, input.parent_id, id],
            )
            .with_context(|| format!("failed to update category {id}"))?;
        anyhow::ensure!(updated == 1, "category {id} not found");
        Ok(())
    }

    /// Delete a category. Articles keep their rows; their `category_id` is
    /// detached to NULL by the foreign key. Child categories are likewise
    /// detached, not deleted.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM categories WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete category {id}"))?;
        anyhow::ensure!(deleted == 1, "category {id} not found");
        Ok(())
    }

    pub fn category_by_id(&self, id: i64) -> Result<Option<CategoryRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT id, name, slug, description, parent_id FROM categories WHERE id = ?1",
            params![id],
            category_from_row,
        )
        .optional()
        .context("failed to fetch category")
    }

    pub fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT id, name, slug, description, parent_id FROM categories WHERE slug = ?1",
            params![slug],
            category_from_row,
        )
        .optional()
        .context("failed to fetch category by slug")
    }

    /// All categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, slug, description, parent_id FROM categories ORDER BY name")
            .context("failed to prepare category list")?;
        let rows = stmt
            .query_map([], category_from_row)
            .context("failed to list categories")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Find or lazily create the tag named `name`.
    pub fn ensure_tag(&self, name: &str) -> Result<TagRecord> {
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "tag name is empty");
        let slug = generate_slug(name);

        let conn = self.db.conn();
        conn.execute(
            "INSERT OR IGNORE INTO tags (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .with_context(|| format!("failed to ensure tag {name}"))?;
        conn.query_row(
            "SELECT id, name, slug FROM tags WHERE name = ?1",
            params![name],
            |row| {
                Ok(TagRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                })
            },
        )
        .with_context(|| format!("tag {name} missing after ensure"))
    }

    pub fn list_tags(&self) -> Result<Vec<TagRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, slug FROM tags ORDER BY name")
            .context("failed to prepare tag list")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TagRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                })
            })
            .context("failed to list tags")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        parent_id: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn store() -> TaxonomyStore {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        TaxonomyStore::new(db)
    }

    fn new_category(name: &str) -> NewCategoryInput {
        NewCategoryInput {
            name: name.to_string(),
            slug: None,
            description: None,
            parent_id: None,
        }
    }

    #[test]
    fn create_generates_slug_from_name() {
        let store = store();
        let cat = store.create_category(new_category("World News")).expect("create");
        assert_eq!(cat.slug, "world-news");
    }

    #[test]
    fn deleting_parent_detaches_children() {
        let store = store();
        let parent = store.create_category(new_category("News")).expect("parent");
        let child = store
            .create_category(NewCategoryInput {
                parent_id: Some(parent.id),
                ..new_category("Local")
            })
            .expect("child");

        store.delete_category(parent.id).expect("delete");
        let child = store
            .category_by_id(child.id)
            .expect("fetch")
            .expect("child still exists");
        assert_eq!(child.parent_id, None);
    }

    #[test]
    fn deleting_category_detaches_articles() {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        let store = TaxonomyStore::new(db.clone());

        let cat = store.create_category(new_category("Politics")).expect("create");
        {
            let conn = db.conn();
            conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES ('desk', 'desk@example.com', 'x')",
                [],
            )
            .expect("user");
            conn.execute(
                "INSERT INTO articles (title, slug, content, author_id, category_id, status)
                 VALUES ('Budget Vote', 'budget-vote', 'body', 1, ?1, 'published')",
                [cat.id],
            )
            .expect("article");
        }

        store.delete_category(cat.id).expect("delete");

        let category_id: Option<i64> = db
            .conn()
            .query_row(
                "SELECT category_id FROM articles WHERE slug = 'budget-vote'",
                [],
                |row| row.get(0),
            )
            .expect("article survives");
        assert_eq!(category_id, None);
    }

    #[test]
    fn ensure_tag_is_lazy_and_stable() {
        let store = store();
        let first = store.ensure_tag("Breaking News").expect("first");
        let second = store.ensure_tag("Breaking News").expect("second");
        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, "breaking-news");
        assert_eq!(store.list_tags().expect("list").len(), 1);
    }

    #[test]
    fn duplicate_category_slug_is_rejected() {
        let store = store();
        store.create_category(new_category("Business")).expect("first");
        assert!(store.create_category(new_category("Business")).is_err());
    }
}
