// src/keypair/registry.rs
use async_trait::async_trait;

use crate::error::BoxError;
use crate::types::KeyPairRecord;

/// Remote store of named key pairs.
///
/// `describe(Some(name))` returns an empty list when no such key pair exists;
/// only transport or service failures are errors. `describe(None)` lists
/// every key pair in the account and region.
#[async_trait]
pub trait KeyPairRegistry: Send + Sync {
    async fn describe(&self, name: Option<&str>) -> Result<Vec<KeyPairRecord>, BoxError>;

    async fn import(&self, name: &str, public_key: &[u8]) -> Result<(), BoxError>;

    async fn delete(&self, name: &str) -> Result<(), BoxError>;
}
