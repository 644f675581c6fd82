// src/kubeconfig/mod.rs
mod builder;
mod client;
mod document;
pub mod identity;
mod token;
mod types;

pub use builder::{
    ClientConfigBuilder, ClusterClientConfig, AUTHENTICATOR_COMMAND, EXEC_API_VERSION,
    PROFILE_ENV_VAR,
};
pub use client::{ClientFactory, KubeClientFactory};
pub use document::write_kubeconfig;
pub use token::{IssuedToken, TokenIssuer};
pub use types::{
    AuthInfo, AuthStrategy, ClientConfig, ClusterEndpointInfo, ContextInfo, ExecConfig, ExecEnvVar,
};
