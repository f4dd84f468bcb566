//! Idempotent schema creation and default seed data.
//!
//! Every statement is safe to re-run; `init` doubles as the install step and
//! as a boot-time guard on an existing database.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::db::Database;

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'author' CHECK (role IN ('admin', 'editor', 'author')),
        is_active INTEGER NOT NULL DEFAULT 1,
        last_login TEXT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        description TEXT,
        parent_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        excerpt TEXT,
        content TEXT NOT NULL,
        featured_image TEXT,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'published', 'scheduled')),
        published_at TEXT,
        views INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS article_tags (
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (article_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS homepage_sections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        layout_type TEXT NOT NULL DEFAULT 'grid' CHECK (layout_type IN ('featured', 'grid', 'list', 'carousel')),
        max_articles INTEGER NOT NULL DEFAULT 6,
        sort_order INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS section_articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        section_id INTEGER NOT NULL REFERENCES homepage_sections(id) ON DELETE CASCADE,
        article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        position INTEGER NOT NULL DEFAULT 0,
        is_featured INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS site_settings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        setting_key TEXT UNIQUE NOT NULL,
        setting_value TEXT,
        setting_type TEXT NOT NULL DEFAULT 'text' CHECK (setting_type IN ('text', 'textarea', 'boolean', 'json')),
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        original_name TEXT NOT NULL,
        file_path TEXT NOT NULL,
        file_type TEXT,
        file_size INTEGER,
        uploaded_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
];

const INDEXES: &[&str] = &[
    // One section per article: reassignment replaces, never duplicates.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_section_articles_article
        ON section_articles(article_id)",
    "CREATE INDEX IF NOT EXISTS idx_articles_status_published
        ON articles(status, published_at)",
    "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_section_articles_section
        ON section_articles(section_id, position)",
];

/// Default categories seeded at install time.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Top Stories", "top-stories"),
    ("World News", "world-news"),
    ("Business", "business"),
    ("Technology", "technology"),
    ("Sports", "sports"),
    ("Entertainment", "entertainment"),
    ("Health", "health"),
    ("Politics", "politics"),
];

/// Default homepage sections: (name, slug, layout, max_articles, sort_order).
const DEFAULT_SECTIONS: &[(&str, &str, &str, i64, i64)] = &[
    ("Top Stories", "top-stories", "featured", 3, 1),
    ("World News", "world-news", "grid", 6, 2),
    ("Business", "business", "list", 4, 3),
    ("Technology", "technology", "grid", 6, 4),
    ("Sports", "sports", "list", 4, 5),
];

/// Default site settings: (key, value, type hint).
const DEFAULT_SETTINGS: &[(&str, &str, &str)] = &[
    ("site_name", "Echhapa News", "text"),
    (
        "site_description",
        "Your trusted source for news and information",
        "text",
    ),
    (
        "site_keywords",
        "news, breaking news, world news, politics, business",
        "text",
    ),
    ("contact_email", "contact@echhapa.com", "text"),
    ("social_facebook", "", "text"),
    ("social_twitter", "", "text"),
    ("social_instagram", "", "text"),
    ("analytics_code", "", "textarea"),
    ("header_code", "", "textarea"),
    ("footer_code", "", "textarea"),
];

/// Create all tables and indexes if they do not exist yet.
pub fn create_tables(db: &Database) -> Result<()> {
    let conn = db.conn();
    for statement in TABLES.iter().chain(INDEXES) {
        conn.execute(statement, [])
            .with_context(|| format!("schema statement failed: {statement}"))?;
    }
    Ok(())
}

/// Insert default categories, homepage sections, and site settings.
///
/// Rows already present (matched by slug / key) are left untouched, so this
/// can run on every boot.
pub fn seed_defaults(db: &Database) -> Result<()> {
    let conn = db.conn();

    for (name, slug) in DEFAULT_CATEGORIES {
        if !row_exists(&conn, "SELECT 1 FROM categories WHERE slug = ?1", slug)? {
            conn.execute(
                "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
                params![name, slug],
            )
            .with_context(|| format!("failed to seed category {slug}"))?;
        }
    }

    for (name, slug, layout, max_articles, sort_order) in DEFAULT_SECTIONS {
        if !row_exists(
            &conn,
            "SELECT 1 FROM homepage_sections WHERE slug = ?1",
            slug,
        )? {
            conn.execute(
                "INSERT INTO homepage_sections (name, slug, layout_type, max_articles, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![name, slug, layout, max_articles, sort_order],
            )
            .with_context(|| format!("failed to seed section {slug}"))?;
        }
    }

    for (key, value, type_hint) in DEFAULT_SETTINGS {
        if !row_exists(&conn, "SELECT 1 FROM site_settings WHERE setting_key = ?1", key)? {
            conn.execute(
                "INSERT INTO site_settings (setting_key, setting_value, setting_type)
                 VALUES (?1, ?2, ?3)",
                params![key, value, type_hint],
            )
            .with_context(|| format!("failed to seed setting {key}"))?;
        }
    }

    Ok(())
}

/// Convenience wrapper: tables, indexes, and seed data in one call.
pub fn init(db: &Database) -> Result<()> {
    create_tables(db)?;
    seed_defaults(db)
}

fn row_exists(conn: &Connection, sql: &str, key: &str) -> Result<bool> {
    let mut stmt = conn.prepare(sql)?;
    Ok(stmt.exists(params![key])?)
}
