use std::path::Path;

use anyhow::{ensure, Context, Result};
use echhapa_shared::{
    schema,
    settings_store::{SettingType, SettingsStore},
    user_store::{NewUserInput, Role, UserStore},
    Database,
};

/// One-shot site setup: schema, seed rows, the first admin account, and the
/// site name. Safe to re-run against an existing database; only the admin
/// account insert fails if the username is already taken.
pub fn run(
    db_path: &Path,
    site_name: &str,
    admin_username: &str,
    admin_email: &str,
    admin_password: &str,
) -> Result<()> {
    ensure!(
        admin_password.len() >= 8,
        "admin password must be at least 8 characters"
    );

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let db = Database::open(db_path)?;
    schema::init(&db)?;
    tracing::info!("Schema created and defaults seeded");

    let users = UserStore::new(db.clone());
    let admin = users.create(NewUserInput {
        username: admin_username.to_string(),
        email: admin_email.to_string(),
        password: admin_password.to_string(),
        role: Role::Admin,
    })?;
    tracing::info!("Admin account '{}' created (id {})", admin.username, admin.id);

    let settings = SettingsStore::new(db);
    settings.set("site_name", site_name, SettingType::Text)?;

    tracing::info!("Site initialized at {}", db_path.display());
    Ok(())
}
