//! Managing the test database.
//!
//! Tests using it only run when `TEST_DATABASE_URL` points to a PostgreSQL
//! database they may freely clear. Otherwise they are skipped.

use diesel::{Connection, connection::SimpleConnection, pg::PgConnection};
use failure::Error;
use parking_lot::{Mutex, MutexGuard, const_mutex};
use pressroom::{db::Pool, store::PgStore};
use r2d2_diesel::ConnectionManager;
use std::{sync::Arc, time::Duration};

use super::Fixture;

/// Tests sharing one database must not run at the same time.
static LOCK: Mutex<()> = const_mutex(());

const CLEAR_DATABASE: &str =
    "TRUNCATE transitions, contents, categories RESTART IDENTITY CASCADE";

/// Exclusive access to a freshly cleared test database.
pub struct Database {
    _guard: MutexGuard<'static, ()>,
    pub pool: Pool,
}

impl Database {
    /// Obtain an exclusive lock to the test database, if one is configured.
    pub fn lock() -> Option<Database> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL is not set, skipping");
                return None;
            }
        };

        let guard = LOCK.lock();
        let pool = setup(&url).expect("Cannot set up test database");

        Some(Database { _guard: guard, pool })
    }

    /// Build a workflow fixture over this database.
    pub fn fixture(&self, timeout: Duration) -> Fixture<PgStore> {
        Fixture::with_store(Arc::new(PgStore::new(self.pool.clone())), timeout)
    }
}

/// Apply pending migrations, clear all data, and connect a pool.
fn setup(url: &str) -> Result<Pool, Error> {
    let conn = PgConnection::establish(url)?;
    diesel_migrations::run_pending_migrations(&conn)?;
    conn.batch_execute(CLEAR_DATABASE)?;

    let pool = Pool::builder()
        .max_size(16)
        .build(ConnectionManager::new(url))?;

    Ok(pool)
}
