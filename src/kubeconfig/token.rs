// src/kubeconfig/token.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BoxError;

/// A short-lived bearer token for a cluster's API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues bearer tokens for a named cluster.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue_token(&self, cluster_name: &str) -> Result<IssuedToken, BoxError>;
}
