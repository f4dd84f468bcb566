pub mod create_user;
pub mod init;

use anyhow::Result;
use echhapa_shared::user_store::Role;

use crate::cli::{Cli, Commands, RoleArg};

impl RoleArg {
    pub fn into_role(self) -> Role {
        match self {
            Self::Author => Role::Author,
            Self::Editor => Role::Editor,
            Self::Admin => Role::Admin,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            db_path,
            site_name,
            admin_username,
            admin_email,
            admin_password,
        } => init::run(
            &db_path,
            &site_name,
            &admin_username,
            &admin_email,
            &admin_password,
        ),
        Commands::CreateUser {
            db_path,
            username,
            email,
            password,
            role,
        } => create_user::run(&db_path, &username, &email, &password, role.into_role()),
    }
}
