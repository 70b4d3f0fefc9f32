//! Database existence ensurer
//!
//! Guarantees the target database exists before the pooled engine opens.
//! Safe to run on every process start and against concurrent bootstrappers:
//! every create is conditional in effect (duplicate-database errors count as
//! success).
//!
//! The two-phase fallback breaks a chicken-and-egg problem: the driver needs
//! a valid existing database to open a connection at all, so when the first
//! attempt fails with a server error the create is retried from a connection
//! to the server root (maintenance database) instead.

use crate::config::{ConnectionTarget, TlsPolicy};
use crate::db::connect::{ConnectFailure, try_connect};
use crate::db::dialect;
use crate::error::{EngineError, EngineResult};

/// Where the ensurer is in its two-phase attempt sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnsureState {
    TriedWithDatabase,
    TriedWithoutDatabase,
}

/// Classified result of a single create attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnsureOutcome {
    /// The database was created
    Created,
    /// Existence conflict: another bootstrapper got there first
    AlreadyExists,
    /// A recognized dialect server error (retryable from the server root)
    ServerError,
    /// Transport, TLS, or other non-server failure
    Fatal,
}

/// Next move after an attempt completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnsureStep {
    Done,
    RetryWithoutDatabase,
    Fail,
}

/// Pure transition function for the ensure state machine.
///
/// The database-less fallback is taken at most once, and only for errors
/// the dialect recognizes as server errors.
pub(crate) fn next_step(state: EnsureState, outcome: EnsureOutcome) -> EnsureStep {
    match (state, outcome) {
        (_, EnsureOutcome::Created | EnsureOutcome::AlreadyExists) => EnsureStep::Done,
        (EnsureState::TriedWithDatabase, EnsureOutcome::ServerError) => {
            EnsureStep::RetryWithoutDatabase
        }
        (EnsureState::TriedWithDatabase, EnsureOutcome::Fatal) => EnsureStep::Fail,
        (EnsureState::TriedWithoutDatabase, _) => EnsureStep::Fail,
    }
}

/// Ensure the target's database exists, creating it if necessary.
pub async fn ensure_database(
    target: &ConnectionTarget,
    tls: Option<&TlsPolicy>,
) -> EngineResult<()> {
    let db = target.database_name().to_string();
    tracing::debug!(database = %db, "ensuring target database exists");

    let mut state = EnsureState::TriedWithDatabase;
    let mut attempt_target = target.clone();

    loop {
        let (outcome, err) = attempt_create(&attempt_target, &db, tls).await;
        match next_step(state, outcome) {
            EnsureStep::Done => {
                if outcome == EnsureOutcome::Created {
                    tracing::info!(database = %db, "created target database");
                } else {
                    tracing::debug!(database = %db, "target database already exists");
                }
                return Ok(());
            }
            EnsureStep::RetryWithoutDatabase => {
                tracing::warn!(
                    database = %db,
                    "create failed in target context, retrying from server root"
                );
                state = EnsureState::TriedWithoutDatabase;
                attempt_target = target.without_database();
            }
            EnsureStep::Fail => {
                return Err(err.unwrap_or_else(|| {
                    EngineError::QueryFailed("database creation failed".into())
                }));
            }
        }
    }
}

/// One connect-and-create attempt, with its error classified.
async fn attempt_create(
    target: &ConnectionTarget,
    db: &str,
    tls: Option<&TlsPolicy>,
) -> (EnsureOutcome, Option<EngineError>) {
    let client = match try_connect(target, tls).await {
        Ok(client) => client,
        Err(ConnectFailure::Tls(e)) => return (EnsureOutcome::Fatal, Some(e)),
        Err(ConnectFailure::Driver(e)) => return classify(e),
    };

    match client.execute(create_database_sql(db).as_str(), &[]).await {
        Ok(_) => (EnsureOutcome::Created, None),
        Err(e) => classify(e),
    }
}

fn classify(err: tokio_postgres::Error) -> (EnsureOutcome, Option<EngineError>) {
    if dialect::is_existence_conflict(&err) {
        return (EnsureOutcome::AlreadyExists, None);
    }
    match err.as_db_error() {
        Some(db) => (
            EnsureOutcome::ServerError,
            Some(EngineError::Server {
                code: db.code().code().to_string(),
                message: db.message().to_string(),
            }),
        ),
        None => (
            EnsureOutcome::Fatal,
            Some(EngineError::ConnectionFailed(err.to_string())),
        ),
    }
}

/// CREATE DATABASE cannot take bind parameters; the name is quoted as an
/// identifier instead.
fn create_database_sql(db: &str) -> String {
    format!("CREATE DATABASE \"{}\"", db.replace('"', "\"\""))
}
