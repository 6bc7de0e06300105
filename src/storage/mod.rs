// Storage module: metrics history between runs.

pub mod sqlite;

pub use sqlite::SqliteStorage;
