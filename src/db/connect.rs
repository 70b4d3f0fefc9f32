//! Transient connections
//!
//! Single, short-lived connections used by the bootstrap before the pooled
//! engine exists (database existence ensuring, schema provisioning). The
//! pooled engine opens its connections through the same TLS split.

use crate::config::tls::effective_policy;
use crate::config::{ConnectionTarget, TlsPolicy};
use crate::error::{EngineError, EngineResult};
use tokio_postgres::Client;

/// Why a transient connection could not be opened.
///
/// The split matters to the existence ensurer: driver errors may carry a
/// server-side SQLSTATE (e.g. connecting to a database that does not exist
/// yet) and are candidates for the database-less fallback, while TLS setup
/// failures are always fatal.
#[derive(Debug)]
pub enum ConnectFailure {
    /// TLS configuration could not be built
    Tls(EngineError),
    /// The driver reported an error (server-side or transport)
    Driver(tokio_postgres::Error),
}

impl ConnectFailure {
    pub fn into_engine_error(self) -> EngineError {
        match self {
            ConnectFailure::Tls(e) => e,
            ConnectFailure::Driver(e) => EngineError::ConnectionFailed(e.to_string()),
        }
    }
}

/// Open a single connection to the target, honoring the TLS policy.
///
/// The connection driver task is spawned in the background; when the caller
/// drops the client the task winds down with it.
pub async fn try_connect(
    target: &ConnectionTarget,
    tls: Option<&TlsPolicy>,
) -> Result<Client, ConnectFailure> {
    let config = target.to_pg_config();

    match effective_policy(target.ssl_mode, tls) {
        None => {
            let (client, connection) = config
                .connect(tokio_postgres::NoTls)
                .await
                .map_err(ConnectFailure::Driver)?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "transient connection closed");
                }
            });
            Ok(client)
        }
        Some(policy) => {
            let connector = policy.make_connector().map_err(ConnectFailure::Tls)?;
            let (client, connection) = config
                .connect(connector)
                .await
                .map_err(ConnectFailure::Driver)?;
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::debug!(error = %e, "transient connection closed");
                }
            });
            Ok(client)
        }
    }
}

/// [`try_connect`] with the failure collapsed into an [`EngineError`]
pub async fn connect(
    target: &ConnectionTarget,
    tls: Option<&TlsPolicy>,
) -> EngineResult<Client> {
    try_connect(target, tls)
        .await
        .map_err(ConnectFailure::into_engine_error)
}
