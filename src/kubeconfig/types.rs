// src/kubeconfig/types.rs
use std::collections::BTreeMap;

/// In-memory client configuration keyed by entry name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfig {
    pub clusters: BTreeMap<String, ClusterEndpointInfo>,
    pub contexts: BTreeMap<String, ContextInfo>,
    pub auth_infos: BTreeMap<String, AuthInfo>,
    pub current_context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpointInfo {
    pub server: String,
    /// PEM bytes of the cluster CA.
    pub certificate_authority_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub cluster: String,
    pub auth_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthInfo {
    pub strategy: Option<AuthStrategy>,
}

/// How the client authenticates. An AuthInfo carries at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    ExecPlugin(ExecConfig),
    EmbeddedToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    pub api_version: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<ExecEnvVar>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

impl ClientConfig {
    /// Returns a copy with a fresh AuthInfo for `name` carrying `strategy`.
    /// Any strategy previously attached to that entry is replaced.
    pub fn with_auth_strategy(&self, name: &str, strategy: AuthStrategy) -> ClientConfig {
        let mut copy = self.clone();
        copy.auth_infos.insert(
            name.to_string(),
            AuthInfo {
                strategy: Some(strategy),
            },
        );
        copy
    }

    pub fn auth_info(&self, name: &str) -> Option<&AuthInfo> {
        self.auth_infos.get(name)
    }
}
