//! Test utilities for database setup.
//!
//! Reuses the production schema initialization so tests never carry their own
//! copy of the schema.

use axum_test::TestServer;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::db::{self, DbPool};
use crate::handlers::router;
use crate::state::AppState;

/// Migrated study database inside a temporary directory, removed on drop.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("study.db"))?;
        db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Consume the environment into a shared pool, keeping the directory alive
    pub fn into_pool(self) -> (TempDir, DbPool) {
        (self.temp, Arc::new(Mutex::new(self.conn)))
    }
}

/// API server over a fresh database. Keep the directory alive for the test's duration.
pub fn test_server() -> (TempDir, TestServer) {
    let (temp, pool) = TestEnv::new().expect("test database").into_pool();
    let server = TestServer::new(router(AppState::new(pool))).expect("test server");
    (temp, server)
}

/// Same as [`test_server`], also returning the pool for seeding and inspection
pub fn test_server_with_pool() -> (TempDir, DbPool, TestServer) {
    let (temp, pool) = TestEnv::new().expect("test database").into_pool();
    let server = TestServer::new(router(AppState::new(pool.clone()))).expect("test server");
    (temp, pool, server)
}
