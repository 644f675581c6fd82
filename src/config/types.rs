// config/types.rs
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};
use crate::types::ClusterIdentity;

pub const DEFAULT_SSH_PUBLIC_KEY_PATH: &str = "~/.ssh/id_rsa.pub";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub region: String,
    /// Path to an OpenSSH public key, or the name of an existing key pair.
    #[serde(default = "default_ssh_public_key_path")]
    pub ssh_public_key_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<String>,
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cluster_name: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub ssh_public_key_path: Option<String>,
}

fn default_ssh_public_key_path() -> String {
    DEFAULT_SSH_PUBLIC_KEY_PATH.to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            region: String::new(),
            ssh_public_key_path: default_ssh_public_key_path(),
            profile: None,
            endpoint: None,
            certificate_authority_path: None,
            kubeconfig_path: None,
        }
    }
}

impl BootstrapConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str =
            fs::read_to_string(path).map_err(|e| Error::config(path, e.to_string()))?;
        serde_json::from_str(&config_str).map_err(|e| Error::config(path, e.to_string()))
    }

    /// Like [`load_from_file`](Self::load_from_file), but a missing file
    /// yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::metadata(path) {
            Ok(_) => Self::load_from_file(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::config(path, e.to_string())),
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let config_str =
            serde_json::to_string_pretty(self).map_err(|e| Error::config(path, e.to_string()))?;
        fs::write(path, config_str).map_err(|e| Error::config(path, e.to_string()))
    }

    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(name) = overrides.cluster_name {
            self.cluster_name = name;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(profile) = overrides.profile {
            self.profile = Some(profile);
        }
        if let Some(path) = overrides.ssh_public_key_path {
            self.ssh_public_key_path = path;
        }
        self
    }

    /// Validates the cluster fields and returns the identity they describe.
    pub fn validate(&self) -> Result<ClusterIdentity> {
        if self.ssh_public_key_path.trim().is_empty() {
            return Err(Error::InvalidClusterIdentity(
                "ssh_public_key_path is empty".to_string(),
            ));
        }
        ClusterIdentity::new(self.cluster_name.clone(), self.region.clone())
    }

    /// Where `write-kubeconfig` puts its output unless told otherwise:
    /// `~/.kube/eksctl/clusters/<cluster name>`.
    pub fn kubeconfig_output_path(&self) -> Option<PathBuf> {
        match &self.kubeconfig_path {
            Some(path) => Some(PathBuf::from(shellexpand::tilde(path).to_string())),
            None => dirs::home_dir().map(|home| {
                home.join(".kube")
                    .join("eksctl")
                    .join("clusters")
                    .join(&self.cluster_name)
            }),
        }
    }

    /// Reads the CA bundle named by `certificate_authority_path`, if any.
    pub fn read_certificate_authority(&self) -> Result<Option<Vec<u8>>> {
        let Some(path) = &self.certificate_authority_path else {
            return Ok(None);
        };
        let path = PathBuf::from(shellexpand::tilde(path).to_string());
        fs::read(&path)
            .map(Some)
            .map_err(|source| Error::Io { path, source })
    }
}
