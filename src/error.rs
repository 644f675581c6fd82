// src/error.rs
use std::path::PathBuf;

/// Errors coming back from external collaborators (registry, token issuer,
/// client factory) cross the trait seams boxed.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading SSH public key file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("computing fingerprint of SSH public key {path:?}")]
    Fingerprint {
        path: PathBuf,
        #[source]
        source: FingerprintError,
    },

    #[error("SSH public key {name} already exists, but fingerprints don't match (expected: {expected:?}, got: {got:?})")]
    KeyConflict {
        name: String,
        expected: String,
        got: String,
    },

    #[error("describing EC2 key pair {}", .name.as_deref().unwrap_or("<all>"))]
    Describe {
        name: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("importing SSH public key as {name:?}")]
    Import {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("deleting EC2 key pair {name:?}")]
    Delete {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("unexpected number of EC2 key pairs named {name:?} (expected: 1, got: {found})")]
    AmbiguousOrMissingKey { name: String, found: usize },

    #[error("could not get token for cluster {cluster:?}")]
    TokenIssuance {
        cluster: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to create API client for context {context:?}")]
    ClientConstruction {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid caller identity {identity:?}: {reason}")]
    InvalidCallerIdentity { identity: String, reason: String },

    #[error("invalid API server endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid cluster identity: {0}")]
    InvalidClusterIdentity(String),

    #[error("config file {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("kubeconfig {path:?}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Public key material that cannot be fingerprinted.
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("public key is not valid UTF-8 text")]
    NotText,

    #[error("not a well-formed OpenSSH public key")]
    Parse(#[from] ssh_key::Error),

    #[error("unsupported key algorithm {0}")]
    UnsupportedAlgorithm(String),

    #[error("RSA key component is not a positive integer")]
    InvalidRsaComponent,

    #[error("encoding public key")]
    Encoding(#[from] openssl::error::ErrorStack),
}
