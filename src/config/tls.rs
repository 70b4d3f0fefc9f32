//! TLS policy for backend connections
//!
//! The policy is caller-owned; the bootstrap only reads it to build the
//! rustls client configuration attached to every connection it opens,
//! transient and pooled alike. A minimum protocol floor of TLS 1.2 is
//! always enforced.

use crate::config::target::SslMode;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Transport security settings for backend connections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsPolicy {
    /// Trust certificates from the OS store; Mozilla webpki roots are used
    /// as fallback when no native certificate loads
    #[serde(default = "default_native_roots")]
    pub native_roots: bool,
}

fn default_native_roots() -> bool {
    true
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self { native_roots: true }
    }
}

impl TlsPolicy {
    /// Build a rustls ClientConfig honoring the policy.
    ///
    /// The protocol floor is TLS 1.2: only TLS 1.2 and 1.3 are offered.
    pub fn client_config(&self) -> EngineResult<rustls::ClientConfig> {
        let mut root_store = rustls::RootCertStore::empty();

        let mut loaded = 0;
        if self.native_roots {
            let native_certs = rustls_native_certs::load_native_certs();
            for cert in native_certs.certs {
                if root_store.add(cert).is_ok() {
                    loaded += 1;
                }
            }
        }
        if loaded == 0 {
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        if root_store.is_empty() {
            return Err(EngineError::Tls("no trusted root certificates".into()));
        }

        Ok(rustls::ClientConfig::builder_with_protocol_versions(&[
            &rustls::version::TLS12,
            &rustls::version::TLS13,
        ])
        .with_root_certificates(root_store)
        .with_no_client_auth())
    }

    /// Build the connector handed to the driver alongside the target.
    ///
    /// tokio-postgres takes the connector inline at connect time, so the
    /// policy does not need to be registered under a named slot; it stays
    /// visible to every connection open made by this process.
    pub fn make_connector(&self) -> EngineResult<tokio_postgres_rustls::MakeRustlsConnect> {
        Ok(tokio_postgres_rustls::MakeRustlsConnect::new(
            self.client_config()?,
        ))
    }
}

/// Resolve the policy governing a connection open.
///
/// `Prefer` and `Require` targets always get a TLS connector: when the
/// caller supplied no policy the default one applies. A target that asked
/// for TLS is never silently downgraded to plaintext.
pub(crate) fn effective_policy(
    ssl_mode: SslMode,
    supplied: Option<&TlsPolicy>,
) -> Option<TlsPolicy> {
    match ssl_mode {
        SslMode::Disable => None,
        SslMode::Prefer | SslMode::Require => Some(supplied.cloned().unwrap_or_default()),
    }
}
