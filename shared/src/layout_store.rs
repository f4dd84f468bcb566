//! Homepage layout: the ordered section registry and the section-to-article
//! assignment table behind the drag-and-drop admin screen.
//!
//! Every multi-statement mutation runs in a single transaction, so a failure
//! mid-sequence cannot strand an article without an assignment or leave two
//! sections claiming the same row.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::article_store::{ArticleRecord, ArticleStatus};
use crate::db::Database;
use crate::slug::generate_slug;

/// Rendering style for a homepage section. Dispatch over this value is the
/// composer's job; the store only persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    Featured,
    Grid,
    List,
    Carousel,
}

impl LayoutType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Grid => "grid",
            Self::List => "list",
            Self::Carousel => "carousel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "featured" => Some(Self::Featured),
            "grid" => Some(Self::Grid),
            "list" => Some(Self::List),
            "carousel" => Some(Self::Carousel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub layout_type: LayoutType,
    pub max_articles: i64,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSectionInput {
    pub name: String,
    pub slug: Option<String>,
    pub layout_type: LayoutType,
    pub max_articles: i64,
}

/// An article resolved through its section assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedArticle {
    #[serde(flatten)]
    pub article: ArticleRecord,
    pub position: i64,
    pub is_featured: bool,
}

#[derive(Clone)]
pub struct LayoutStore {
    db: Database,
}

impl LayoutStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a section at the end of the homepage (`sort_order = max + 1`).
    pub fn create_section(&self, input: NewSectionInput) -> Result<SectionRecord> {
        let slug = input
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));
        let conn = self.db.conn();
        conn.execute(
            "INSERT INTO homepage_sections (name, slug, layout_type, max_articles, sort_order)
             SELECT ?1, ?2, ?3, ?4, COALESCE(MAX(sort_order), 0) + 1 FROM homepage_sections",
            params![input.name, slug, input.layout_type.as_str(), input.max_articles],
        )
        .with_context(|| format!("failed to create section {slug}"))?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.section_by_id(id)?.context("section vanished after insert")
    }

    pub fn update_section(&self, id: i64, input: NewSectionInput) -> Result<()> {
        let slug = input
            .slug
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_slug(&input.name));
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE homepage_sections
                 SET name = ?1, slug = ?2, layout_type = ?3, max_articles = ?4
                 WHERE id = ?5",
                params![input.name, slug, input.layout_type.as_str(), input.max_articles, id],
            )
            .with_context(|| format!("failed to update section {id}"))?;
        anyhow::ensure!(updated == 1, "section {id} not found");
        Ok(())
    }

    /// Soft-disable or re-enable a section without touching its assignments.
    pub fn set_active(&self, id: i64, is_active: bool) -> Result<()> {
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE homepage_sections SET is_active = ?1 WHERE id = ?2",
                params![is_active, id],
            )
            .with_context(|| format!("failed to toggle section {id}"))?;
        anyhow::ensure!(updated == 1, "section {id} not found");
        Ok(())
    }

    /// Delete a section; its assignment rows cascade.
    pub fn delete_section(&self, id: i64) -> Result<()> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM homepage_sections WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete section {id}"))?;
        anyhow::ensure!(deleted == 1, "section {id} not found");
        Ok(())
    }

    /// Overwrite `sort_order` for every listed section to its array index.
    /// One idempotent "set order" command applied transactionally.
    pub fn reorder_sections(&self, ordered_section_ids: &[i64]) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        for (index, section_id) in ordered_section_ids.iter().enumerate() {
            tx.execute(
                "UPDATE homepage_sections SET sort_order = ?1 WHERE id = ?2",
                params![index as i64, section_id],
            )
            .with_context(|| format!("failed to reorder section {section_id}"))?;
        }
        tx.commit().context("failed to commit section reorder")
    }

    pub fn section_by_id(&self, id: i64) -> Result<Option<SectionRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT id, name, slug, layout_type, max_articles, sort_order, is_active
             FROM homepage_sections WHERE id = ?1",
            params![id],
            section_from_row,
        )
        .optional()
        .context("failed to fetch section")
    }

    /// Active sections in homepage order.
    pub fn active_sections(&self) -> Result<Vec<SectionRecord>> {
        self.sections_where("WHERE is_active = 1")
    }

    /// Every section, active or not, in homepage order. Admin listing.
    pub fn all_sections(&self) -> Result<Vec<SectionRecord>> {
        self.sections_where("")
    }

    fn sections_where(&self, filter: &str) -> Result<Vec<SectionRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, name, slug, layout_type, max_articles, sort_order, is_active
                 FROM homepage_sections {filter} ORDER BY sort_order"
            ))
            .context("failed to prepare section list")?;
        let rows = stmt
            .query_map([], section_from_row)
            .context("failed to list sections")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Move an article into a section, evicting it from wherever it was.
    ///
    /// Delete-then-insert in one transaction; the article lands at position 0
    /// and belongs to exactly one section afterwards.
    pub fn assign(&self, article_id: i64, section_id: i64) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "DELETE FROM section_articles WHERE article_id = ?1",
            params![article_id],
        )
        .with_context(|| format!("failed to clear assignment for article {article_id}"))?;
        tx.execute(
            "INSERT INTO section_articles (section_id, article_id, position)
             VALUES (?1, ?2, 0)",
            params![section_id, article_id],
        )
        .with_context(|| format!("failed to assign article {article_id} to section {section_id}"))?;
        tx.commit().context("failed to commit assignment")
    }

    /// Remove an article's assignment, wherever it is.
    pub fn unassign(&self, article_id: i64) -> Result<()> {
        self.db
            .conn()
            .execute(
                "DELETE FROM section_articles WHERE article_id = ?1",
                params![article_id],
            )
            .with_context(|| format!("failed to unassign article {article_id}"))?;
        Ok(())
    }

    /// Overwrite `position` for every listed article in the section to its
    /// array index. Idempotent full-list command, applied transactionally.
    pub fn reorder_articles(&self, section_id: i64, ordered_article_ids: &[i64]) -> Result<()> {
        let mut conn = self.db.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        for (index, article_id) in ordered_article_ids.iter().enumerate() {
            tx.execute(
                "UPDATE section_articles SET position = ?1
                 WHERE section_id = ?2 AND article_id = ?3",
                params![index as i64, section_id, article_id],
            )
            .with_context(|| format!("failed to reposition article {article_id}"))?;
        }
        tx.commit().context("failed to commit article reorder")
    }

    /// Flip the featured flag on one assignment row.
    pub fn toggle_featured(&self, article_id: i64, section_id: i64, is_featured: bool) -> Result<()> {
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE section_articles SET is_featured = ?1
                 WHERE article_id = ?2 AND section_id = ?3",
                params![is_featured, article_id, section_id],
            )
            .with_context(|| format!("failed to toggle featured on article {article_id}"))?;
        anyhow::ensure!(
            updated == 1,
            "article {article_id} is not assigned to section {section_id}"
        );
        Ok(())
    }

    /// Published articles assigned to a section, in presentation order:
    /// featured first, then ascending position, then newest publication.
    /// `limit` of `None` returns the full list (admin view).
    pub fn section_articles(&self, section_id: i64, limit: Option<i64>) -> Result<Vec<AssignedArticle>> {
        let conn = self.db.conn();
        let mut sql = String::from(
            "SELECT a.id, a.title, a.slug, a.excerpt, a.content, a.featured_image,
                    a.author_id, u.username, a.category_id, c.name,
                    a.status, a.published_at, a.views, a.created_at, a.updated_at,
                    sa.position, sa.is_featured
             FROM section_articles sa
             JOIN articles a ON sa.article_id = a.id
             LEFT JOIN users u ON a.author_id = u.id
             LEFT JOIN categories c ON a.category_id = c.id
             WHERE sa.section_id = ?1 AND a.status = 'published'
             ORDER BY sa.is_featured DESC, sa.position ASC, a.published_at DESC",
        );
        if limit.is_some() {
            sql.push_str(" LIMIT ?2");
        }

        let mut stmt = conn.prepare(&sql).context("failed to prepare section articles")?;
        let rows = match limit {
            Some(limit) => stmt.query_map(params![section_id, limit], assigned_from_row),
            None => stmt.query_map(params![section_id], assigned_from_row),
        }
        .context("failed to fetch section articles")?
        .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The section an article is currently assigned to, if any.
    pub fn assignment_for(&self, article_id: i64) -> Result<Option<(i64, i64, bool)>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT section_id, position, is_featured
             FROM section_articles WHERE article_id = ?1",
            params![article_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .context("failed to fetch assignment")
    }
}

fn section_from_row(row: &Row<'_>) -> rusqlite::Result<SectionRecord> {
    let layout_str: String = row.get(3)?;
    Ok(SectionRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        layout_type: LayoutType::parse(&layout_str).unwrap_or(LayoutType::Grid),
        max_articles: row.get(4)?,
        sort_order: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn assigned_from_row(row: &Row<'_>) -> rusqlite::Result<AssignedArticle> {
    let status_str: String = row.get(10)?;
    Ok(AssignedArticle {
        article: ArticleRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            excerpt: row.get(3)?,
            content: row.get(4)?,
            featured_image: row.get(5)?,
            author_id: row.get(6)?,
            author_name: row.get(7)?,
            category_id: row.get(8)?,
            category_name: row.get(9)?,
            status: ArticleStatus::parse(&status_str).unwrap_or(ArticleStatus::Draft),
            published_at: row.get(11)?,
            views: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        },
        position: row.get(15)?,
        is_featured: row.get(16)?,
    })
}
