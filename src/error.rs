//! Error types for kinegres
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.

/// Main error type for the kinegres crate
#[derive(Debug, thiserror::Error)]
pub enum KinegresError {
    /// Connection-string parsing/normalization errors
    #[error("DSN error: {0}")]
    Dsn(#[from] DsnError),

    /// Engine and server-side errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Connection-string parsing errors
#[derive(Debug, thiserror::Error)]
pub enum DsnError {
    /// Empty connection string
    #[error("Connection string is empty")]
    Empty,

    /// Missing or unrecognized URL scheme
    #[error("Connection string must start with postgres:// or postgresql://")]
    MissingScheme,

    /// Structurally invalid connection string
    #[error("Invalid connection string: {0}")]
    Invalid(String),

    /// Port component did not parse
    #[error("Invalid port: {0}")]
    InvalidPort(String),
}

/// Engine operation errors
///
/// `KeyExists` is the canonical existence error the generic engine exposes
/// to upper layers; the dialect's error translator maps unique-constraint
/// violations onto it so optimistic-concurrency retry never has to inspect
/// dialect error shapes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Canonical existence conflict (unique-constraint violation)
    #[error("key already exists")]
    KeyExists,

    /// Dialect server error that was not translated
    #[error("server error {code}: {message}")]
    Server { code: String, message: String },

    /// Failed to establish a connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS setup failed
    #[error("TLS configuration failed: {0}")]
    Tls(String),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query execution failed (non-server failure, e.g. transport)
    #[error("Query execution failed: {0}")]
    QueryFailed(String),
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Profile file not found or unreadable
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Backend profile not found
    #[error("Backend profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Specialized Result type for kinegres operations
pub type Result<T> = std::result::Result<T, KinegresError>;

/// Specialized Result type for DSN handling
pub type DsnResult<T> = std::result::Result<T, DsnError>;

/// Specialized Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
