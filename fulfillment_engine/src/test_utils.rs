use log::*;

use crate::SqliteDatabase;

/// A fresh, fully migrated in-memory database. One connection only, since every connection to
/// `sqlite::memory:` is its own database.
pub async fn new_test_database() -> SqliteDatabase {
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    SqliteDatabase::new("sqlite::memory:", 1).await.expect("Error creating in-memory database")
}
