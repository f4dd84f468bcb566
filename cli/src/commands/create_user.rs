use std::path::Path;

use anyhow::{ensure, Result};
use echhapa_shared::{
    schema,
    user_store::{NewUserInput, Role, UserStore},
    Database,
};

pub fn run(db_path: &Path, username: &str, email: &str, password: &str, role: Role) -> Result<()> {
    ensure!(password.len() >= 8, "password must be at least 8 characters");
    ensure!(
        !username.trim().is_empty() && !email.trim().is_empty(),
        "username and email are required"
    );

    let db = Database::open(db_path)?;
    schema::init(&db)?;

    let users = UserStore::new(db);
    let user = users.create(NewUserInput {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role,
    })?;

    tracing::info!(
        "User '{}' created (id {}, role {})",
        user.username,
        user.id,
        user.role.as_str()
    );
    Ok(())
}
