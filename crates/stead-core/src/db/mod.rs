//! Storage layer for Stead drafts

mod connection;
mod drafts;
mod migrations;

pub use connection::Database;
pub use drafts::{DraftStore, SqliteDraftStore};
