use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depscan operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ScanError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed project manifest (pom.xml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check that the scanned directory contains a well-formed pom.xml"))]
    Manifest { message: String },

    /// A manifest could not be resolved from any configured source.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Invalid configuration file.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.depscan/config.toml for syntax errors"))]
    Config { message: String },

    /// Traversal bookkeeping was violated. Never caused by input data.
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(depscan::internal),
        help("This is a bug in depscan; please report it with the scanned pom.xml")
    )]
    Internal { message: String },

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
