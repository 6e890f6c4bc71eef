pub mod application_repository;
pub mod job_repository;
pub mod notification_repository;
pub mod user_repository;

use redb::{Database as RedbDatabase, Error, TableDefinition};
use std::sync::Arc;

/// Primary rows, keyed by uuid string, bincode-encoded payloads.
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
pub const JOBS: TableDefinition<&str, &[u8]> = TableDefinition::new("jobs");
pub const APPLICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("applications");
pub const NOTIFICATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("notifications");

/// Secondary indexes. Email and phone are the uniqueness source of truth:
/// the duplicate check and the insert run in the same write transaction.
pub const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");
pub const USERS_BY_PHONE: TableDefinition<&str, &str> = TableDefinition::new("users_by_phone");

#[derive(Clone)]
pub struct Database {
    pub db: Arc<RedbDatabase>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, Error> {
        let db = RedbDatabase::create(path)?;
        let database = Database { db: Arc::new(db) };
        database.create_tables()?;
        Ok(database)
    }

    pub fn in_memory() -> Result<Self, Error> {
        // Create a temporary file for in-memory testing
        let temp_dir = std::env::temp_dir();
        let temp_path = temp_dir.join(format!("test-{}.redb", uuid::Uuid::new_v4()));
        let db = RedbDatabase::create(&temp_path)?;
        let database = Database { db: Arc::new(db) };
        database.create_tables()?;
        Ok(database)
    }

    // Opening a table in a read transaction fails if it was never created,
    // so every table is materialized once at startup.
    fn create_tables(&self) -> Result<(), Error> {
        let txn = self.db.begin_write()?;
        {
            txn.open_table(USERS)?;
            txn.open_table(JOBS)?;
            txn.open_table(APPLICATIONS)?;
            txn.open_table(NOTIFICATIONS)?;
            txn.open_table(USERS_BY_EMAIL)?;
            txn.open_table(USERS_BY_PHONE)?;
        }
        txn.commit()?;
        Ok(())
    }
}
