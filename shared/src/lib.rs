//! Shared data layer for the Echhapa news CMS: SQLite schema and one store
//! per domain concern. Stores are synchronous and cheap to clone; callers on
//! the async side hold the lock only for the duration of a single operation.

pub mod article_store;
pub mod db;
pub mod layout_store;
pub mod media_store;
pub mod schema;
pub mod settings_store;
pub mod slug;
pub mod taxonomy_store;
pub mod user_store;

pub use db::Database;
