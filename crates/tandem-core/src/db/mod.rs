//! libSQL-backed local note store

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::LibSqlNoteStore;
