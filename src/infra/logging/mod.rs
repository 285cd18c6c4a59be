#[cfg(test)]
pub mod in_memory;
pub mod sqlite_store;

pub use sqlite_store::SqliteGuildSettingsStore;
