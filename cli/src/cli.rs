use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Author,
    Editor,
    Admin,
}

#[derive(Parser)]
#[command(name = "echhapa-cli", version, about = "Echhapa site management CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema, seed defaults, and set up the first
    /// admin account.
    Init {
        /// SQLite database path.
        #[arg(long, default_value = "./data/echhapa.db")]
        db_path: PathBuf,
        /// Site name stored in settings.
        #[arg(long, default_value = "Echhapa News")]
        site_name: String,
        /// Admin username.
        #[arg(long, default_value = "admin")]
        admin_username: String,
        /// Admin email address.
        #[arg(long)]
        admin_email: String,
        /// Admin password (minimum 8 characters).
        #[arg(long)]
        admin_password: String,
    },
    /// Create an additional user account.
    CreateUser {
        /// SQLite database path.
        #[arg(long, default_value = "./data/echhapa.db")]
        db_path: PathBuf,
        /// Username.
        #[arg(long)]
        username: String,
        /// Email address.
        #[arg(long)]
        email: String,
        /// Password (minimum 8 characters).
        #[arg(long)]
        password: String,
        /// Role on the author/editor/admin ladder.
        #[arg(long, value_enum, default_value_t = RoleArg::Author)]
        role: RoleArg,
    },
}
