//! Common test utilities and helpers
//!
//! Shared infrastructure for the integration tests: environment-derived
//! connection strings and per-test database reset.

use kinegres::config::ConnectionTarget;
use kinegres::db::connect::connect;
use tokio_postgres::Client;

/// Build a test DSN for the given database from the environment
pub fn test_dsn(database: &str) -> String {
    let host = std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("TEST_DB_PORT").unwrap_or_else(|_| "5432".to_string());
    let user = std::env::var("TEST_DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    format!("postgres://{user}:{password}@{host}:{port}/{database}?sslmode=disable")
}

/// Connect to the server's maintenance database.
///
/// Returns None (after logging a skip notice) when no server is reachable,
/// so tests degrade to no-ops on machines without PostgreSQL.
pub async fn root_client() -> Option<Client> {
    let target = ConnectionTarget::parse(&test_dsn("postgres")).unwrap();
    match connect(&target, None).await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping test: Database not available - {}", e);
            None
        }
    }
}

/// Drop the given test database so the test starts from a clean slate.
///
/// Returns false when the server is unreachable (test should skip).
pub async fn reset_database(name: &str) -> bool {
    let Some(client) = root_client().await else {
        return false;
    };
    let sql = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", name);
    if let Err(e) = client.execute(sql.as_str(), &[]).await {
        eprintln!("Skipping test: could not reset database {} - {}", name, e);
        return false;
    }
    true
}

/// Open a verification connection bound to the given test database
pub async fn db_client(database: &str) -> Option<Client> {
    let target = ConnectionTarget::parse(&test_dsn(database)).unwrap();
    connect(&target, None).await.ok()
}
