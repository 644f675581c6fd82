// src/kubeconfig/builder.rs
use tracing::{debug, info};

use super::client::ClientFactory;
use super::identity::{cluster_name, context_name, username_from_arn};
use super::token::TokenIssuer;
use super::types::{
    AuthInfo, AuthStrategy, ClientConfig, ClusterEndpointInfo, ContextInfo, ExecConfig, ExecEnvVar,
};
use crate::error::{Error, Result};
use crate::types::ClusterIdentity;

pub const AUTHENTICATOR_COMMAND: &str = "aws-iam-authenticator";
pub const EXEC_API_VERSION: &str = "client.authentication.k8s.io/v1beta1";
pub const PROFILE_ENV_VAR: &str = "AWS_PROFILE";

/// Assembles the client configuration for a cluster whose control plane
/// endpoint is known.
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    cluster: ClusterIdentity,
    profile: Option<String>,
}

impl ClientConfigBuilder {
    pub fn new(cluster: ClusterIdentity) -> Self {
        Self {
            cluster,
            profile: None,
        }
    }

    /// Named credentials profile handed to the exec plugin. Empty names are
    /// ignored.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile.filter(|p| !p.is_empty());
        self
    }

    /// One cluster, one context and one empty AuthInfo, all wired to the
    /// context name derived from `caller_arn`.
    pub fn build(&self, endpoint: &str, ca_data: &[u8], caller_arn: &str) -> Result<ClusterClientConfig> {
        url::Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let cluster_name = cluster_name(&self.cluster);
        let username = username_from_arn(caller_arn)?;
        let context_name = context_name(&username, &cluster_name);
        debug!("building client config for context {:?}", context_name);

        let mut client = ClientConfig {
            current_context: context_name.clone(),
            ..Default::default()
        };
        client.clusters.insert(
            cluster_name.clone(),
            ClusterEndpointInfo {
                server: endpoint.to_string(),
                certificate_authority_data: ca_data.to_vec(),
            },
        );
        client.contexts.insert(
            context_name.clone(),
            ContextInfo {
                cluster: cluster_name.clone(),
                auth_info: context_name.clone(),
            },
        );
        client
            .auth_infos
            .insert(context_name.clone(), AuthInfo::default());

        Ok(ClusterClientConfig {
            client,
            cluster: self.cluster.clone(),
            cluster_name,
            context_name,
            profile: self.profile.clone(),
        })
    }
}

/// A client configuration together with the names it was built from.
///
/// The `with_*` decorators never modify `self`; each returns a new value
/// whose AuthInfo was constructed fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterClientConfig {
    pub client: ClientConfig,
    pub cluster: ClusterIdentity,
    pub cluster_name: String,
    pub context_name: String,
    profile: Option<String>,
}

impl ClusterClientConfig {
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn auth_strategy(&self) -> Option<&AuthStrategy> {
        self.client
            .auth_info(&self.context_name)
            .and_then(|auth| auth.strategy.as_ref())
    }

    /// Authenticates through the external authenticator binary at connection
    /// time.
    pub fn with_exec_plugin(&self) -> ClusterClientConfig {
        let env = self
            .profile
            .iter()
            .map(|profile| ExecEnvVar {
                name: PROFILE_ENV_VAR.to_string(),
                value: profile.clone(),
            })
            .collect();

        let exec = ExecConfig {
            api_version: EXEC_API_VERSION.to_string(),
            command: AUTHENTICATOR_COMMAND.to_string(),
            args: vec!["token".to_string(), "-i".to_string(), self.cluster.name.clone()],
            env,
        };
        self.with_strategy(AuthStrategy::ExecPlugin(exec))
    }

    /// Embeds a freshly issued bearer token. The token expires with the
    /// issuer's TTL and has to be refreshed by calling this again.
    pub async fn with_embedded_token(&self, issuer: &dyn TokenIssuer) -> Result<ClusterClientConfig> {
        let issued = issuer
            .issue_token(&self.cluster.name)
            .await
            .map_err(|source| Error::TokenIssuance {
                cluster: self.cluster.name.clone(),
                source,
            })?;

        match issued.expires_at {
            Some(expires_at) => info!(
                "embedded token for cluster {:?} expires at {}",
                self.cluster.name, expires_at
            ),
            None => debug!("embedded token for cluster {:?}", self.cluster.name),
        }
        Ok(self.with_strategy(AuthStrategy::EmbeddedToken(issued.token)))
    }

    pub async fn to_client_handle<F>(&self, factory: &F) -> Result<F::Handle>
    where
        F: ClientFactory + ?Sized,
    {
        factory
            .create(&self.client)
            .await
            .map_err(|source| Error::ClientConstruction {
                context: self.context_name.clone(),
                source,
            })
    }

    pub async fn to_client_handle_with_embedded_token<F>(
        &self,
        issuer: &dyn TokenIssuer,
        factory: &F,
    ) -> Result<F::Handle>
    where
        F: ClientFactory + ?Sized,
    {
        self.with_embedded_token(issuer)
            .await?
            .to_client_handle(factory)
            .await
    }

    fn with_strategy(&self, strategy: AuthStrategy) -> ClusterClientConfig {
        ClusterClientConfig {
            client: self.client.with_auth_strategy(&self.context_name, strategy),
            ..self.clone()
        }
    }
}
