// src/kubeconfig/client.rs
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};

use super::types::ClientConfig;
use crate::error::BoxError;

/// Turns a finished [`ClientConfig`] into an API client.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Handle: Send;

    async fn create(&self, config: &ClientConfig) -> Result<Self::Handle, BoxError>;
}

/// Builds a [`kube::Client`] for the config's current context.
#[derive(Debug, Default, Clone, Copy)]
pub struct KubeClientFactory;

#[async_trait]
impl ClientFactory for KubeClientFactory {
    type Handle = kube::Client;

    async fn create(&self, config: &ClientConfig) -> Result<kube::Client, BoxError> {
        let kubeconfig = Kubeconfig::from_yaml(&config.to_yaml()?)?;
        let options = KubeConfigOptions {
            context: Some(config.current_context.clone()),
            ..Default::default()
        };
        let client_config = kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        Ok(kube::Client::try_from(client_config)?)
    }
}
