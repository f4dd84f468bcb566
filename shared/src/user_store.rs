//! Accounts and the three-tier role model. Permission is purely ordinal:
//! author < editor < admin, compared with `>=`. Resource-level ownership
//! (an author editing their own article) is layered on by the write paths
//! that need it, not here.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author = 1,
    Editor = 2,
    Admin = 3,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "author" => Some(Self::Author),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Ordinal permission check: `true` when this role meets `required`.
    pub fn has_permission(self, required: Role) -> bool {
        self >= required
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

use crate::db::Database;

#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a user. Fails when the username or email is already taken.
    pub fn create(&self, input: NewUserInput) -> Result<UserRecord> {
        let conn = self.db.conn();
        let taken: bool = conn
            .prepare("SELECT 1 FROM users WHERE username = ?1 OR email = ?2")?
            .exists(params![input.username, input.email])?;
        anyhow::ensure!(!taken, "username or email already exists");

        let hash = hash_password(&input.password)?;
        conn.execute(
            "INSERT INTO users (username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
            params![input.username, input.email, hash, input.role.as_str()],
        )
        .with_context(|| format!("failed to create user {}", input.username))?;
        let id = conn.last_insert_rowid();
        drop(conn);
        self.by_id(id)?.context("user vanished after insert")
    }

    /// Verify credentials for an active account. `login` may be the username
    /// or the email address. On success, stamps `last_login`.
    pub fn authenticate(&self, login: &str, password: &str) -> Result<Option<UserRecord>> {
        let conn = self.db.conn();
        let row = conn
            .query_row(
                "SELECT id, password_hash, is_active FROM users
                 WHERE username = ?1 OR email = ?1",
                params![login],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()
            .context("failed to look up user")?;

        let Some((id, stored_hash, is_active)) = row else {
            return Ok(None);
        };
        if !is_active || !verify_password(password, &stored_hash) {
            return Ok(None);
        }

        conn.execute(
            "UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )
        .context("failed to stamp last_login")?;
        drop(conn);
        self.by_id(id)
    }

    pub fn by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT id, username, email, role, is_active, last_login, created_at
             FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .context("failed to fetch user")
    }

    pub fn list(&self) -> Result<Vec<UserRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(
                "SELECT id, username, email, role, is_active, last_login, created_at
                 FROM users ORDER BY created_at DESC, id DESC",
            )
            .context("failed to prepare user list")?;
        let rows = stmt
            .query_map([], user_from_row)
            .context("failed to list users")?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update(&self, id: i64, username: &str, email: &str, role: Role) -> Result<()> {
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE users SET username = ?1, email = ?2, role = ?3,
                     updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?4",
                params![username, email, role.as_str(), id],
            )
            .with_context(|| format!("failed to update user {id}"))?;
        anyhow::ensure!(updated == 1, "user {id} not found");
        Ok(())
    }

    pub fn set_active(&self, id: i64, is_active: bool) -> Result<()> {
        let updated = self
            .db
            .conn()
            .execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                params![is_active, id],
            )
            .with_context(|| format!("failed to toggle user {id}"))?;
        anyhow::ensure!(updated == 1, "user {id} not found");
        Ok(())
    }

    /// Delete a user. The caller is responsible for blocking self-deletion;
    /// articles authored by the user cascade with them.
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self
            .db
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .with_context(|| format!("failed to delete user {id}"))?;
        anyhow::ensure!(deleted == 1, "user {id} not found");
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role_str: String = row.get(3)?;
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: Role::parse(&role_str).unwrap_or(Role::Author),
        is_active: row.get(4)?,
        last_login: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::schema;

    /// Insert a minimal author row for fixtures in other store tests.
    /// Skips argon2 hashing, which is deliberately slow.
    pub fn seed_user(db: &Database) -> i64 {
        let conn = db.conn();
        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES ('writer', 'writer@example.com', 'x')",
            [],
        )
        .expect("seed user");
        conn.last_insert_rowid()
    }

    fn store() -> UserStore {
        let db = Database::open_in_memory().expect("open");
        schema::create_tables(&db).expect("schema");
        UserStore::new(db)
    }

    fn new_user(username: &str, role: Role) -> NewUserInput {
        NewUserInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[test]
    fn role_ordering_matches_the_permission_ladder() {
        assert!(Role::Admin.has_permission(Role::Editor));
        assert!(Role::Editor.has_permission(Role::Author));
        assert!(Role::Editor.has_permission(Role::Editor));
        assert!(!Role::Author.has_permission(Role::Editor));
        assert!(!Role::Editor.has_permission(Role::Admin));
    }

    #[test]
    fn authenticate_accepts_username_or_email() {
        let store = store();
        store.create(new_user("alice", Role::Editor)).expect("create");

        let by_name = store
            .authenticate("alice", "correct horse")
            .expect("auth")
            .expect("logged in");
        assert_eq!(by_name.role, Role::Editor);
        assert!(by_name.last_login.is_some());

        assert!(store
            .authenticate("alice@example.com", "correct horse")
            .expect("auth")
            .is_some());
    }

    #[test]
    fn authenticate_rejects_bad_password_and_unknown_user() {
        let store = store();
        store.create(new_user("bob", Role::Author)).expect("create");
        assert!(store.authenticate("bob", "wrong").expect("auth").is_none());
        assert!(store.authenticate("nobody", "wrong").expect("auth").is_none());
    }

    #[test]
    fn authenticate_rejects_inactive_accounts() {
        let store = store();
        let user = store.create(new_user("carol", Role::Admin)).expect("create");
        store.set_active(user.id, false).expect("deactivate");
        assert!(store
            .authenticate("carol", "correct horse")
            .expect("auth")
            .is_none());
    }

    #[test]
    fn duplicate_username_or_email_is_rejected() {
        let store = store();
        store.create(new_user("dave", Role::Author)).expect("create");
        assert!(store.create(new_user("dave", Role::Author)).is_err());

        let clashing_email = NewUserInput {
            username: "different".to_string(),
            ..new_user("dave", Role::Author)
        };
        assert!(store.create(clashing_email).is_err());
    }
}
