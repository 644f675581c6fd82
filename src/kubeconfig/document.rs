// src/kubeconfig/document.rs
//! Rendering of [`ClientConfig`] as a kubeconfig file.

use std::fs;
use std::io;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use tracing::debug;

use super::types::{AuthStrategy, ClientConfig};
use crate::error::{BoxError, Error, Result};

#[derive(Debug, Serialize)]
struct KubeConfigDocument {
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    kind: &'static str,
    clusters: Vec<NamedCluster>,
    contexts: Vec<NamedContext>,
    users: Vec<NamedUser>,
    #[serde(rename = "current-context")]
    current_context: String,
}

#[derive(Debug, Serialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Serialize)]
struct ClusterEntry {
    server: String,
    #[serde(
        rename = "certificate-authority-data",
        skip_serializing_if = "Option::is_none"
    )]
    certificate_authority_data: Option<String>,
}

#[derive(Debug, Serialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Serialize)]
struct ContextEntry {
    cluster: String,
    user: String,
}

#[derive(Debug, Serialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Default, Serialize)]
struct UserEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exec: Option<ExecEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecEntry {
    api_version: String,
    command: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<EnvEntry>,
}

#[derive(Debug, Serialize)]
struct EnvEntry {
    name: String,
    value: String,
}

impl From<&ClientConfig> for KubeConfigDocument {
    fn from(config: &ClientConfig) -> Self {
        let clusters = config
            .clusters
            .iter()
            .map(|(name, cluster)| NamedCluster {
                name: name.clone(),
                cluster: ClusterEntry {
                    server: cluster.server.clone(),
                    certificate_authority_data: (!cluster.certificate_authority_data.is_empty())
                        .then(|| general_purpose::STANDARD.encode(&cluster.certificate_authority_data)),
                },
            })
            .collect();

        let contexts = config
            .contexts
            .iter()
            .map(|(name, context)| NamedContext {
                name: name.clone(),
                context: ContextEntry {
                    cluster: context.cluster.clone(),
                    user: context.auth_info.clone(),
                },
            })
            .collect();

        let users = config
            .auth_infos
            .iter()
            .map(|(name, auth)| {
                let user = match &auth.strategy {
                    None => UserEntry::default(),
                    Some(AuthStrategy::EmbeddedToken(token)) => UserEntry {
                        token: Some(token.clone()),
                        exec: None,
                    },
                    Some(AuthStrategy::ExecPlugin(exec)) => UserEntry {
                        token: None,
                        exec: Some(ExecEntry {
                            api_version: exec.api_version.clone(),
                            command: exec.command.clone(),
                            args: exec.args.clone(),
                            env: exec
                                .env
                                .iter()
                                .map(|var| EnvEntry {
                                    name: var.name.clone(),
                                    value: var.value.clone(),
                                })
                                .collect(),
                        }),
                    },
                };
                NamedUser {
                    name: name.clone(),
                    user,
                }
            })
            .collect();

        KubeConfigDocument {
            api_version: "v1",
            kind: "Config",
            clusters,
            contexts,
            users,
            current_context: config.current_context.clone(),
        }
    }
}

impl ClientConfig {
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&KubeConfigDocument::from(self))
    }
}

/// Writes `config` to `path` as a kubeconfig file readable only by the owner.
pub fn write_kubeconfig(config: &ClientConfig, path: &Path) -> Result<()> {
    let kubeconfig_error = |source: BoxError| Error::Kubeconfig {
        path: path.to_path_buf(),
        source,
    };

    let yaml = config.to_yaml().map_err(|e| kubeconfig_error(e.into()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| kubeconfig_error(e.into()))?;
        }
    }
    fs::write(path, yaml).map_err(|e| kubeconfig_error(e.into()))?;
    set_owner_only(path).map_err(|e| kubeconfig_error(e.into()))?;

    debug!("wrote kubeconfig to {:?}", path);
    Ok(())
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}
