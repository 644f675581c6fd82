// types.rs
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name and region of the cluster being created. Fixed once the creation
/// request is formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    pub name: String,
    pub region: String,
}

impl ClusterIdentity {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        let identity = Self {
            name: name.into(),
            region: region.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    /// EKS cluster names: alphanumeric first character, then alphanumerics
    /// and hyphens.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.name.chars();
        match chars.next() {
            None => {
                return Err(Error::InvalidClusterIdentity(
                    "cluster name is empty".to_string(),
                ))
            }
            Some(first) if !first.is_ascii_alphanumeric() => {
                return Err(Error::InvalidClusterIdentity(format!(
                    "cluster name {:?} must start with a letter or digit",
                    self.name
                )))
            }
            Some(_) => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::InvalidClusterIdentity(format!(
                "cluster name {:?} may only contain letters, digits and hyphens",
                self.name
            )));
        }
        if self.region.trim().is_empty() {
            return Err(Error::InvalidClusterIdentity(
                "region is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// A named key pair as reported by the remote registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairRecord {
    pub name: String,
    pub fingerprint: String,
}

impl KeyPairRecord {
    pub fn new(name: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// Result of a provisioning pass, handed back to the caller instead of being
/// written into shared cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedKey {
    pub key_name: String,
    /// Raw public key bytes; `None` when an existing registry key pair was
    /// adopted by name.
    pub public_key: Option<Vec<u8>>,
}
