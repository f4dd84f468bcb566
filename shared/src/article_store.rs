//! Article repository: CRUD, the flat status-transition set, tag links, and
//! the published-article queries the reader site is built from.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::slug::generate_slug;

/// Publication state. Transitions are flat: any status may be set from any
/// other, with `published_at` adjusted as a side effect (see
/// [`ArticleStore::set_status`]). Nothing sweeps scheduled articles to
/// published; that transition happens by external time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Scheduled,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "scheduled" => Some(Self::Scheduled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticleInput {
    pub title: String,
    /// Explicit slug; generated from the title when empty.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub status: ArticleStatus,
    /// Publication timestamp for `scheduled` articles.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub author_id: i64,
    pub author_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub status: ArticleStatus,
    pub published_at: Option<String>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

const ARTICLE_SELECT: &str = "SELECT a.id, a.title, a.slug, a.excerpt, a.content,
        a.featured_image, a.author_id, u.username, a.category_id, c.name,
        a.status, a.published_at, a.views, a.created_at, a.updated_at
    FROM articles a
    LEFT JOIN users u ON a.author_id = u.id
    LEFT JOIN categories c ON a.category_id = c.id";

#[derive(Clone)]
pub struct ArticleStore {
    db: Database,
}

impl ArticleStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an article together with its tag links (one transaction).
    ///
    /// A duplicate slug fails the insert; nothing is written.
    pub fn create(&self, input: NewArticleInput) -> Result<i64> {
        let slug = normalized_slug(&input)?;
        let published_at = published_at_for(input.status, input.scheduled_at)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "INSERT INTO articles
                 (title, slug, excerpt, content, featured_image, author_id, category_id,
                  status, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                input.title,
                slug,
                input.excerpt,
                input.content,
                input.featured_image,
                input.author_id,
                input.category_id,
                input.status.as_str(),
                published_at,
            ],
        )
        .with_context(|| format!("failed to insert article with slug {slug}"))?;
        let id = tx.last_insert_rowid();
        replace_tags(&tx, id, &input.tags)?;
        tx.commit().context("failed to commit article create")?;
        Ok(id)
    }

    /// Update an article in place, replacing its tag links (one transaction).
    pub fn update(&self, id: i64, input: NewArticleInput) -> Result<()> {
        let slug = normalized_slug(&input)?;
        let published_at = published_at_for(input.status, input.scheduled_at)?;

        let mut conn = self.db.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        let updated = tx
            .execute(
                "UPDATE articles SET title = ?1, slug = ?2, excerpt = ?3, content = ?4,
                     featured_image = ?5, category_id = ?6, status = ?7, published_at = ?8,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?9",
                params![
                    input.title,
                    slug,
                    input.excerpt,
                    input.content,
                    input.featured_image,
                    input.category_id,
                    input.status.as_str(),
                    published_at,
                    id,
                ],
            )
            .with_context(|| format!("failed to update article {id}"))?;
        if updated != 1 {
            bail!("article {id} not found");
        }
        replace_tags(&tx, id, &input.tags)?;
        tx.commit().context("failed to commit article update")?;
        Ok(())
    }

    /// Delete an article. Tag links and section assignments cascade.
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM articles WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete article {id}"))?;
        anyhow::ensure!(deleted == 1, "article {id} not found");
        Ok(())
    }

    /// Set the publication status.
    ///
    /// `published` stamps `published_at` with the current time, `scheduled`
    /// takes the caller-supplied timestamp, `draft` clears it. No guard
    /// rejects any source status and no check requires a scheduled date to be
    /// in the future.
    pub fn set_status(
        &self,
        id: i64,
        status: ArticleStatus,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let published_at = published_at_for(status, scheduled_at)?;
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE articles SET status = ?1, published_at = ?2,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?3",
                params![status.as_str(), published_at, id],
            )
            .with_context(|| format!("failed to set status on article {id}"))?;
        anyhow::ensure!(updated == 1, "article {id} not found");
        Ok(())
    }

    /// Bump the view counter. A single relative UPDATE, atomic in SQLite.
    pub fn record_view(&self, id: i64) -> Result<()> {
        self.db
            .conn()
            .execute(
                "UPDATE articles SET views = views + 1 WHERE id = ?1",
                params![id],
            )
            .with_context(|| format!("failed to record view on article {id}"))?;
        Ok(())
    }

    pub fn by_id(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            &format!("{ARTICLE_SELECT} WHERE a.id = ?1"),
            params![id],
            article_from_row,
        )
        .optional()
        .context("failed to fetch article")
    }

    /// Reader-site lookup: published articles only.
    pub fn published_by_slug(&self, slug: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            &format!("{ARTICLE_SELECT} WHERE a.slug = ?1 AND a.status = 'published'"),
            params![slug],
            article_from_row,
        )
        .optional()
        .context("failed to fetch article by slug")
    }

    /// Published listing, newest first, optionally scoped to a category.
    pub fn list_published(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<ArticleRecord>> {
        let conn = self.db.conn();
        let mut sql = format!("{ARTICLE_SELECT} WHERE a.status = 'published'");
        if category_id.is_some() {
            sql.push_str(" AND a.category_id = ?3");
        }
        sql.push_str(" ORDER BY a.published_at DESC, a.created_at DESC LIMIT ?1 OFFSET ?2");

        let mut stmt = conn.prepare(&sql).context("failed to prepare article list")?;
        let rows = match category_id {
            Some(cat) => stmt.query_map(params![limit, offset, cat], article_from_row),
            None => stmt.query_map(params![limit, offset], article_from_row),
        }
        .context("failed to list articles")?
        .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every article regardless of status, newest first. Admin listing.
    pub fn list_all(&self) -> Result<Vec<ArticleRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "{ARTICLE_SELECT} ORDER BY a.created_at DESC, a.id DESC"
            ))
            .context("failed to prepare admin article list")?;
        let rows = stmt
            .query_map([], article_from_row)
            .context("failed to list all articles")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_published(&self, category_id: Option<i64>) -> Result<i64> {
        let conn = self.db.conn();
        let count = match category_id {
            Some(cat) => conn.query_row(
                "SELECT COUNT(*) FROM articles WHERE status = 'published' AND category_id = ?1",
                params![cat],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT COUNT(*) FROM articles WHERE status = 'published'",
                [],
                |row| row.get(0),
            ),
        }
        .context("failed to count published articles")?;
        Ok(count)
    }

    /// Same-category articles for the "related" block, excluding the article
    /// itself.
    pub fn related(&self, article_id: i64, category_id: Option<i64>, limit: i64) -> Result<Vec<ArticleRecord>> {
        let Some(category_id) = category_id else {
            return Ok(Vec::new());
        };
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(&format!(
                "{ARTICLE_SELECT}
                 WHERE a.status = 'published' AND a.category_id = ?1 AND a.id != ?2
                 ORDER BY a.published_at DESC, a.created_at DESC LIMIT ?3"
            ))
            .context("failed to prepare related query")?;
        let rows = stmt
            .query_map(params![category_id, article_id, limit], article_from_row)
            .context("failed to fetch related articles")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Tag names linked to an article, sorted.
    pub fn tags_for(&self, article_id: i64) -> Result<Vec<String>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                "SELECT t.name FROM tags t
                 JOIN article_tags at ON at.tag_id = t.id
                 WHERE at.article_id = ?1 ORDER BY t.name",
            )
            .context("failed to prepare tag lookup")?;
        let rows = stmt
            .query_map(params![article_id], |row| row.get(0))
            .context("failed to fetch article tags")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn normalized_slug(input: &NewArticleInput) -> Result<String> {
    let slug = input
        .slug
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate_slug(&input.title));
    anyhow::ensure!(!slug.is_empty(), "article slug is empty");
    Ok(slug)
}

fn published_at_for(
    status: ArticleStatus,
    scheduled_at: Option<DateTime<Utc>>,
) -> Result<Option<String>> {
    match status {
        ArticleStatus::Draft => Ok(None),
        ArticleStatus::Published => Ok(Some(now_timestamp())),
        ArticleStatus::Scheduled => {
            let at = scheduled_at.context("scheduled status requires a publish date")?;
            Ok(Some(at.to_rfc3339_opts(SecondsFormat::Secs, true)))
        }
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Lazily create any unknown tags, then replace the article's tag links.
/// Runs inside the caller's transaction so a failure cannot leave the
/// article with half its tags.
fn replace_tags(tx: &rusqlite::Transaction<'_>, article_id: i64, tags: &[String]) -> Result<()> {
    tx.execute(
        "DELETE FROM article_tags WHERE article_id = ?1",
        params![article_id],
    )
    .context("failed to clear tag links")?;

    for raw in tags {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        tx.execute(
            "INSERT OR IGNORE INTO tags (name, slug) VALUES (?1, ?2)",
            params![name, generate_slug(name)],
        )
        .with_context(|| format!("failed to ensure tag {name}"))?;
        tx.execute(
            "INSERT OR IGNORE INTO article_tags (article_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2",
            params![article_id, name],
        )
        .with_context(|| format!("failed to link tag {name}"))?;
    }
    Ok(())
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    let status_str: String = row.get(10)?;
    Ok(ArticleRecord {
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
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema, user_store::tests::seed_user};

    fn stores() -> (Database, ArticleStore) {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        let store = ArticleStore::new(db.clone());
        (db, store)
    }

    fn draft(author_id: i64, title: &str) -> NewArticleInput {
        NewArticleInput {
            title: title.to_string(),
            slug: None,
            excerpt: None,
            content: "body".to_string(),
            featured_image: None,
            author_id,
            category_id: None,
            status: ArticleStatus::Draft,
            scheduled_at: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let (db, store) = stores();
        let author = seed_user(&db);
        store.create(draft(author, "Same Title")).expect("first");
        let err = store.create(draft(author, "Same Title"));
        assert!(err.is_err(), "second insert with identical slug must fail");
    }

    #[test]
    fn draft_has_no_published_at() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let id = store.create(draft(author, "A draft")).expect("create");
        let article = store.by_id(id).expect("fetch").expect("exists");
        assert_eq!(article.status, ArticleStatus::Draft);
        assert_eq!(article.published_at, None);
    }

    #[test]
    fn publish_stamps_current_time() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let id = store.create(draft(author, "To publish")).expect("create");

        let before = Utc::now();
        store
            .set_status(id, ArticleStatus::Published, None)
            .expect("publish");
        let after = Utc::now();

        let article = store.by_id(id).expect("fetch").expect("exists");
        let stamp = article.published_at.expect("published_at set");
        let stamp = DateTime::parse_from_rfc3339(&stamp).expect("rfc3339");
        assert!(stamp >= before - chrono::Duration::seconds(1));
        assert!(stamp <= after + chrono::Duration::seconds(1));

        // Now visible to reader queries.
        let found = store
            .published_by_slug("to-publish")
            .expect("query")
            .expect("published article is queryable");
        assert_eq!(found.id, id);
    }

    #[test]
    fn back_to_draft_clears_published_at() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let id = store.create(draft(author, "Cycle")).expect("create");
        store
            .set_status(id, ArticleStatus::Published, None)
            .expect("publish");
        store
            .set_status(id, ArticleStatus::Draft, None)
            .expect("unpublish");
        let article = store.by_id(id).expect("fetch").expect("exists");
        assert_eq!(article.published_at, None);
        assert!(store.published_by_slug("cycle").expect("query").is_none());
    }

    #[test]
    fn scheduled_requires_a_publish_date() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let id = store.create(draft(author, "Later")).expect("create");
        assert!(store.set_status(id, ArticleStatus::Scheduled, None).is_err());

        let when = Utc::now() + chrono::Duration::days(2);
        store
            .set_status(id, ArticleStatus::Scheduled, Some(when))
            .expect("schedule");
        let article = store.by_id(id).expect("fetch").expect("exists");
        assert!(article.published_at.is_some());
        // Scheduled articles are not served to readers.
        assert!(store.published_by_slug("later").expect("query").is_none());
    }

    #[test]
    fn tag_replacement_is_exact() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let mut input = draft(author, "Tagged");
        input.tags = vec!["politics".to_string(), "economy".to_string()];
        let id = store.create(input.clone()).expect("create");
        assert_eq!(store.tags_for(id).expect("tags"), vec!["economy", "politics"]);

        input.tags = vec!["economy".to_string(), "markets".to_string()];
        store.update(id, input).expect("update");
        assert_eq!(store.tags_for(id).expect("tags"), vec!["economy", "markets"]);
    }

    #[test]
    fn view_counter_increments() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let id = store.create(draft(author, "Viewed")).expect("create");
        store.record_view(id).expect("view");
        store.record_view(id).expect("view");
        let article = store.by_id(id).expect("fetch").expect("exists");
        assert_eq!(article.views, 2);
    }

    #[test]
    fn category_filter_scopes_listing() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let cat: i64 = {
            let conn = db.conn();
            conn.execute(
                "INSERT INTO categories (name, slug) VALUES ('Tech', 'tech')",
                [],
            )
            .expect("category");
            conn.last_insert_rowid()
        };

        let mut in_cat = draft(author, "In category");
        in_cat.category_id = Some(cat);
        in_cat.status = ArticleStatus::Published;
        store.create(in_cat).expect("create");

        let mut out_cat = draft(author, "Outside");
        out_cat.status = ArticleStatus::Published;
        store.create(out_cat).expect("create");

        let scoped = store.list_published(10, 0, Some(cat)).expect("list");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].slug, "in-category");
        assert_eq!(store.count_published(Some(cat)).expect("count"), 1);
        assert_eq!(store.count_published(None).expect("count"), 2);
    }

    #[test]
    fn related_excludes_self_and_other_categories() {
        let (db, store) = stores();
        let author = seed_user(&db);
        let cat: i64 = {
            let conn = db.conn();
            conn.execute(
                "INSERT INTO categories (name, slug) VALUES ('World', 'world')",
                [],
            )
            .expect("category");
            conn.last_insert_rowid()
        };

        let mut ids = Vec::new();
        for title in ["One", "Two", "Three"] {
            let mut input = draft(author, title);
            input.category_id = Some(cat);
            input.status = ArticleStatus::Published;
            ids.push(store.create(input).expect("create"));
        }

        let related = store.related(ids[0], Some(cat), 4).expect("related");
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|a| a.id != ids[0]));
    }
}
