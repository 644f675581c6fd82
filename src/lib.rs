//! SSH key pair reconciliation and API client configuration for newly
//! created EKS clusters.
//!
//! [`keypair::SshKeyProvisioner`] derives a deterministic key pair name from
//! the cluster name and the key's fingerprint, imports the key only when the
//! registry lacks it, and refuses to delete anything it cannot attribute
//! unambiguously. [`kubeconfig::ClientConfigBuilder`] produces the client
//! configuration for the cluster's control plane, authenticated either by an
//! exec plugin or by an embedded token.

pub mod aws;
pub mod config;
pub mod error;
pub mod keypair;
pub mod kubeconfig;
pub mod types;
pub mod utils;

pub use error::{BoxError, Error, FingerprintError, Result};
pub use types::{ClusterIdentity, KeyPairRecord, ProvisionedKey};
