//! End-to-end checks for the schema a fresh `init` produces.

use echhapa_shared::{schema, settings_store::SettingsStore, Database};
use tempfile::TempDir;

fn fresh_db(dir: &TempDir) -> Database {
    let db = Database::open(dir.path().join("echhapa.db")).expect("open db");
    schema::init(&db).expect("init schema");
    db
}

#[test]
fn init_creates_every_table() {
    let dir = TempDir::new().expect("tempdir");
    let db = fresh_db(&dir);

    let conn = db.conn();
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .expect("prepare");
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("rows");

    for expected in [
        "article_tags",
        "articles",
        "categories",
        "homepage_sections",
        "media",
        "section_articles",
        "site_settings",
        "tags",
        "users",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing table {expected}");
    }
}

#[test]
fn seed_rows_are_present_and_stable() {
    let dir = TempDir::new().expect("tempdir");
    let db = fresh_db(&dir);

    let count = |sql: &str| -> i64 {
        db.conn()
            .query_row(sql, [], |row| row.get(0))
            .expect("count query")
    };

    assert_eq!(count("SELECT COUNT(*) FROM categories"), 8);
    assert_eq!(count("SELECT COUNT(*) FROM homepage_sections"), 5);
    assert_eq!(count("SELECT COUNT(*) FROM site_settings"), 10);

    // Re-running init must not duplicate seeds.
    schema::init(&db).expect("re-init");
    assert_eq!(count("SELECT COUNT(*) FROM categories"), 8);
    assert_eq!(count("SELECT COUNT(*) FROM homepage_sections"), 5);
    assert_eq!(count("SELECT COUNT(*) FROM site_settings"), 10);
}

#[test]
fn duplicate_section_assignment_is_impossible() {
    let dir = TempDir::new().expect("tempdir");
    let db = fresh_db(&dir);

    let conn = db.conn();
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role) VALUES ('a', 'a@x.com', 'h', 'author')",
        [],
    )
    .expect("user");
    conn.execute(
        "INSERT INTO articles (title, slug, content, author_id, status) VALUES ('t', 't', 'c', 1, 'draft')",
        [],
    )
    .expect("article");
    conn.execute(
        "INSERT INTO section_articles (section_id, article_id, position) VALUES (1, 1, 0)",
        [],
    )
    .expect("first assignment");

    let second = conn.execute(
        "INSERT INTO section_articles (section_id, article_id, position) VALUES (2, 1, 0)",
        [],
    );
    assert!(second.is_err(), "unique index must reject a second section");
}

#[test]
fn settings_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    {
        let db = fresh_db(&dir);
        let settings = SettingsStore::new(db);
        settings
            .set(
                "site_name",
                "Reopened Gazette",
                echhapa_shared::settings_store::SettingType::Text,
            )
            .expect("set");
    }

    let db = Database::open(dir.path().join("echhapa.db")).expect("reopen");
    let settings = SettingsStore::new(db);
    assert_eq!(settings.get("site_name", "fallback"), "Reopened Gazette");
}
