// src/aws/eks.rs
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use super::{AwsCli, CommandError};
use crate::error::BoxError;
use crate::kubeconfig::{IssuedToken, TokenIssuer};

#[derive(Debug, Deserialize)]
struct ExecCredential {
    status: ExecCredentialStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecCredentialStatus {
    token: String,
    #[serde(default)]
    expiration_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DescribeClusterOutput {
    cluster: ClusterDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterDescription {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    certificate_authority: Option<CertificateAuthority>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CertificateAuthority {
    #[serde(default)]
    data: Option<String>,
}

/// API server endpoint and CA of a created cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPlane {
    pub endpoint: String,
    pub certificate_authority_data: Vec<u8>,
}

impl ClusterDescription {
    fn into_control_plane(self, command: &str) -> Result<ControlPlane, CommandError> {
        let invalid = |message: &str| CommandError::Invalid {
            command: command.to_string(),
            message: message.to_string(),
        };

        let endpoint = self
            .endpoint
            .filter(|e| !e.is_empty())
            .ok_or_else(|| invalid("cluster has no endpoint yet"))?;
        let data = self
            .certificate_authority
            .and_then(|ca| ca.data)
            .ok_or_else(|| invalid("cluster has no certificate authority data"))?;
        let certificate_authority_data = general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| invalid(&format!("certificate authority data: {}", e)))?;

        Ok(ControlPlane {
            endpoint,
            certificate_authority_data,
        })
    }
}

impl AwsCli {
    pub async fn describe_cluster(&self, name: &str) -> Result<ControlPlane, CommandError> {
        let args = ["eks", "describe-cluster", "--name", name];
        let output: DescribeClusterOutput = self.run_json(&args).await?;
        if let Some(status) = output.cluster.status.as_deref().filter(|s| *s != "ACTIVE") {
            warn!("cluster {:?} is {}", name, status);
        }
        output.cluster.into_control_plane(&self.display(&args))
    }
}

#[async_trait]
impl TokenIssuer for AwsCli {
    async fn issue_token(&self, cluster_name: &str) -> Result<IssuedToken, BoxError> {
        let credential: ExecCredential = self
            .run_json(&["eks", "get-token", "--cluster-name", cluster_name])
            .await?;
        Ok(IssuedToken {
            token: credential.status.token,
            expires_at: credential.status.expiration_timestamp,
        })
    }
}
