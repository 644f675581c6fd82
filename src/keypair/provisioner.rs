// src/keypair/provisioner.rs
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::fingerprint::Fingerprinter;
use super::naming::{is_generated_for, key_pair_name};
use super::registry::KeyPairRegistry;
use crate::error::{Error, Result};
use crate::types::{ClusterIdentity, KeyPairRecord, ProvisionedKey};

/// Contents of the configured public key path. `raw_bytes` is `None` when
/// nothing exists at the path.
#[derive(Debug, Clone)]
pub struct LocalKeyMaterial {
    pub path: PathBuf,
    pub raw_bytes: Option<Vec<u8>>,
}

impl LocalKeyMaterial {
    pub async fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Self {
                path,
                raw_bytes: Some(bytes),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self {
                path,
                raw_bytes: None,
            }),
            Err(source) => Err(Error::Io { path, source }),
        }
    }
}

/// What [`SshKeyProvisioner::cleanup_candidate_keys`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    NothingToDelete,
    Deleted(String),
    /// More than one key pair looked like ours; none were touched.
    Ambiguous(Vec<String>),
}

/// Reconciles a local SSH public key with the key pair registry.
///
/// Callers must not run two passes for the same cluster concurrently: the
/// describe-then-import and describe-then-delete sequences are not atomic.
pub struct SshKeyProvisioner<'a> {
    registry: &'a dyn KeyPairRegistry,
    fingerprinter: &'a dyn Fingerprinter,
}

impl<'a> SshKeyProvisioner<'a> {
    pub fn new(registry: &'a dyn KeyPairRegistry, fingerprinter: &'a dyn Fingerprinter) -> Self {
        Self {
            registry,
            fingerprinter,
        }
    }

    /// Resolves the key pair name for `path`, importing the key if the
    /// registry does not have it yet. When no file exists at `path`, the
    /// path string itself is taken as the name of an existing key pair.
    pub async fn load_or_import(
        &self,
        path: &str,
        cluster: &ClusterIdentity,
    ) -> Result<ProvisionedKey> {
        let expanded = expand_path(path)?;
        let local = LocalKeyMaterial::read(&expanded).await?;

        match local.raw_bytes {
            None => self.adopt_by_name(&expanded).await,
            Some(bytes) => self.import_if_needed(&local.path, bytes, cluster).await,
        }
    }

    async fn adopt_by_name(&self, name: &str) -> Result<ProvisionedKey> {
        info!(
            "SSH public key file {:?} does not exist; will assume existing EC2 key pair",
            name
        );
        let existing = self.describe_one(name).await?;
        info!("found EC2 key pair {:?}", existing.name);
        Ok(ProvisionedKey {
            key_name: existing.name,
            public_key: None,
        })
    }

    async fn import_if_needed(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        cluster: &ClusterIdentity,
    ) -> Result<ProvisionedKey> {
        let fingerprint = self
            .fingerprinter
            .fingerprint(&bytes)
            .map_err(|source| Error::Fingerprint {
                path: path.to_path_buf(),
                source,
            })?;
        let key_name = key_pair_name(&cluster.name, Some(&fingerprint));

        let existing = self.describe(Some(&key_name)).await?;
        match existing.as_slice() {
            [] => {
                info!("importing SSH public key {:?} as {:?}", path, key_name);
                self.registry
                    .import(&key_name, &bytes)
                    .await
                    .map_err(|source| Error::Import {
                        name: key_name.clone(),
                        source,
                    })?;
            }
            [record] if record.fingerprint == fingerprint => {
                debug!("SSH public key {} already exists", key_name);
            }
            [record] => {
                return Err(Error::KeyConflict {
                    name: key_name,
                    expected: fingerprint,
                    got: record.fingerprint.clone(),
                });
            }
            records => {
                return Err(Error::AmbiguousOrMissingKey {
                    name: key_name,
                    found: records.len(),
                });
            }
        }

        Ok(ProvisionedKey {
            key_name,
            public_key: Some(bytes),
        })
    }

    /// Deletes the key pair this tool generated for `cluster`, if exactly
    /// one can be identified. Ambiguity is not an error; nothing is deleted.
    pub async fn cleanup_candidate_keys(&self, cluster: &ClusterIdentity) -> Result<CleanupOutcome> {
        let prefix = key_pair_name(&cluster.name, None);
        let existing = self.describe(None).await?;

        let mut matching = Vec::new();
        for record in existing {
            if !record.name.starts_with(&prefix) {
                continue;
            }
            debug!("existing key {:?} matches prefix", record.name);
            if is_generated_for(&record, &cluster.name) {
                debug!("existing key {:?} matches fingerprint", record.name);
                matching.push(record.name);
            }
        }

        match matching.len() {
            0 => {
                debug!("no key pairs found for cluster {:?}", cluster.name);
                Ok(CleanupOutcome::NothingToDelete)
            }
            1 => {
                let name = matching.remove(0);
                info!("deleting EC2 key pair {:?}", name);
                self.registry
                    .delete(&name)
                    .await
                    .map_err(|source| Error::Delete {
                        name: name.clone(),
                        source,
                    })?;
                Ok(CleanupOutcome::Deleted(name))
            }
            _ => {
                warn!(
                    "too many matching key pairs for cluster {:?}, will not delete any: {:?}",
                    cluster.name, matching
                );
                Ok(CleanupOutcome::Ambiguous(matching))
            }
        }
    }

    async fn describe(&self, name: Option<&str>) -> Result<Vec<KeyPairRecord>> {
        self.registry
            .describe(name)
            .await
            .map_err(|source| Error::Describe {
                name: name.map(str::to_string),
                source,
            })
    }

    async fn describe_one(&self, name: &str) -> Result<KeyPairRecord> {
        let mut found = self.describe(Some(name)).await?;
        if found.len() != 1 {
            debug!("key pairs named {:?}: {:?}", name, found);
            return Err(Error::AmbiguousOrMissingKey {
                name: name.to_string(),
                found: found.len(),
            });
        }
        Ok(found.remove(0))
    }
}

fn expand_path(path: &str) -> Result<String> {
    shellexpand::full(path)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| Error::Io {
            path: PathBuf::from(path),
            source: io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::error::{BoxError, FingerprintError};

    /// In-memory registry that records every call.
    #[derive(Default)]
    struct FakeRegistry {
        pub records: Mutex<Vec<KeyPairRecord>>,
        pub describes: Mutex<Vec<Option<String>>>,
        pub imports: Mutex<Vec<String>>,
        pub deletes: Mutex<Vec<String>>,
        pub fail_import: bool,
        pub fail_describe: bool,
        pub fail_delete: bool,
    }

    impl FakeRegistry {
        pub fn with_records(records: Vec<KeyPairRecord>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Default::default()
            }
        }

        pub fn import_count(&self) -> usize {
            self.imports.lock().unwrap().len()
        }

        pub fn delete_count(&self) -> usize {
            self.deletes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl KeyPairRegistry for FakeRegistry {
        async fn describe(&self, name: Option<&str>) -> std::result::Result<Vec<KeyPairRecord>, BoxError> {
            self.describes.lock().unwrap().push(name.map(str::to_string));
            if self.fail_describe {
                return Err("RequestLimitExceeded".into());
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| name.map_or(true, |n| r.name == n))
                .cloned()
                .collect())
        }

        async fn import(&self, name: &str, public_key: &[u8]) -> std::result::Result<(), BoxError> {
            self.imports.lock().unwrap().push(name.to_string());
            if self.fail_import {
                return Err("InvalidKey.Format".into());
            }
            let fingerprint = FixedFingerprinter("aa:bb").fingerprint(public_key)?;
            self.records
                .lock()
                .unwrap()
                .push(KeyPairRecord::new(name, fingerprint));
            Ok(())
        }

        async fn delete(&self, name: &str) -> std::result::Result<(), BoxError> {
            self.deletes.lock().unwrap().push(name.to_string());
            if self.fail_delete {
                return Err("UnauthorizedOperation".into());
            }
            self.records.lock().unwrap().retain(|r| r.name != name);
            Ok(())
        }
    }

    struct FixedFingerprinter(pub &'static str);

    impl Fingerprinter for FixedFingerprinter {
        fn fingerprint(&self, public_key: &[u8]) -> std::result::Result<String, FingerprintError> {
            if public_key.is_empty() {
                return Err(FingerprintError::UnsupportedAlgorithm("empty".to_string()));
            }
            Ok(self.0.to_string())
        }
    }

    fn key_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ssh-rsa AAAAB3NzaC1yc2E test@example").unwrap();
        file
    }

    fn prod() -> ClusterIdentity {
        ClusterIdentity::new("prod", "us-east-1").unwrap()
    }

    #[tokio::test]
    async fn imports_missing_key_once() {
        let registry = FakeRegistry::default();
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);
        let file = key_file();
        let path = file.path().to_str().unwrap();

        let first = provisioner.load_or_import(path, &prod()).await.unwrap();
        let second = provisioner.load_or_import(path, &prod()).await.unwrap();

        assert_eq!(first.key_name, "eksctl-prod-aa:bb");
        assert_eq!(first, second);
        assert!(first.public_key.is_some());
        assert_eq!(registry.import_count(), 1);
    }

    #[tokio::test]
    async fn fingerprint_mismatch_is_a_conflict() {
        let registry =
            FakeRegistry::with_records(vec![KeyPairRecord::new("eksctl-prod-aa:bb", "cc:dd")]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);
        let file = key_file();

        let err = provisioner
            .load_or_import(file.path().to_str().unwrap(), &prod())
            .await
            .unwrap_err();

        match err {
            Error::KeyConflict {
                name,
                expected,
                got,
            } => {
                assert_eq!(name, "eksctl-prod-aa:bb");
                assert_eq!(expected, "aa:bb");
                assert_eq!(got, "cc:dd");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(registry.import_count(), 0);
        assert_eq!(registry.delete_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_adopts_existing_key_pair_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("team-key").to_str().unwrap().to_string();
        let registry = FakeRegistry::with_records(vec![KeyPairRecord::new(&name, "11:22")]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let key = provisioner.load_or_import(&name, &prod()).await.unwrap();

        assert_eq!(key.key_name, name);
        assert_eq!(key.public_key, None);
        assert_eq!(*registry.describes.lock().unwrap(), vec![Some(name)]);
        assert_eq!(registry.import_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_without_key_pair_fails() {
        let registry = FakeRegistry::default();
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let err = provisioner
            .load_or_import("no-such-key-pair", &prod())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AmbiguousOrMissingKey { found: 0, .. }));
        assert_eq!(registry.describes.lock().unwrap().len(), 1);
        assert_eq!(registry.import_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_with_duplicate_key_pairs_fails() {
        let registry = FakeRegistry::with_records(vec![
            KeyPairRecord::new("team-key", "11:22"),
            KeyPairRecord::new("team-key", "33:44"),
        ]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let err = provisioner
            .load_or_import("team-key", &prod())
            .await
            .unwrap_err();

        assert!(
            matches!(&err, Error::AmbiguousOrMissingKey { name, found: 2 } if name == "team-key")
        );
        assert_eq!(registry.import_count(), 0);
    }

    #[tokio::test]
    async fn unreadable_path_is_an_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FakeRegistry::default();
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        // Reading a directory fails with something other than NotFound.
        let err = provisioner
            .load_or_import(dir.path().to_str().unwrap(), &prod())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(registry.describes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_key_is_a_fingerprint_error() {
        let file = NamedTempFile::new().unwrap();
        let registry = FakeRegistry::default();
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let err = provisioner
            .load_or_import(file.path().to_str().unwrap(), &prod())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fingerprint { .. }));
    }

    #[tokio::test]
    async fn import_failure_names_the_key() {
        let registry = FakeRegistry {
            fail_import: true,
            ..Default::default()
        };
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);
        let file = key_file();

        let err = provisioner
            .load_or_import(file.path().to_str().unwrap(), &prod())
            .await
            .unwrap_err();

        assert!(matches!(&err, Error::Import { name, .. } if name == "eksctl-prod-aa:bb"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn cleanup_deletes_single_candidate() {
        let registry = FakeRegistry::with_records(vec![
            KeyPairRecord::new("eksctl-prod-aa:bb", "aa:bb"),
            KeyPairRecord::new("eksctl-prod-laptop", "ee:ff"),
            KeyPairRecord::new("unrelated", "aa:bb"),
        ]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let outcome = provisioner.cleanup_candidate_keys(&prod()).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::Deleted("eksctl-prod-aa:bb".to_string()));
        assert_eq!(*registry.deletes.lock().unwrap(), vec!["eksctl-prod-aa:bb"]);
    }

    #[tokio::test]
    async fn cleanup_refuses_ambiguous_candidates() {
        let registry = FakeRegistry::with_records(vec![
            KeyPairRecord::new("eksctl-prod-aa:bb", "aa:bb"),
            KeyPairRecord::new("eksctl-prod-cc:dd", "cc:dd"),
        ]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let outcome = provisioner.cleanup_candidate_keys(&prod()).await.unwrap();

        assert!(matches!(outcome, CleanupOutcome::Ambiguous(ref names) if names.len() == 2));
        assert_eq!(registry.delete_count(), 0);
    }

    #[tokio::test]
    async fn cleanup_without_candidates_is_a_no_op() {
        let registry =
            FakeRegistry::with_records(vec![KeyPairRecord::new("eksctl-prod-laptop", "aa:bb")]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let outcome = provisioner.cleanup_candidate_keys(&prod()).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::NothingToDelete);
        assert_eq!(registry.delete_count(), 0);
    }

    #[tokio::test]
    async fn cleanup_skips_keys_of_longer_cluster_names() {
        let registry = FakeRegistry::with_records(vec![
            KeyPairRecord::new("eksctl-production-aa:bb", "aa:bb"),
            KeyPairRecord::new("eksctl-prod-east-cc:dd", "cc:dd"),
        ]);
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let outcome = provisioner.cleanup_candidate_keys(&prod()).await.unwrap();

        assert_eq!(outcome, CleanupOutcome::NothingToDelete);
        assert_eq!(registry.delete_count(), 0);
        assert_eq!(registry.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cleanup_surfaces_delete_failure() {
        let registry = FakeRegistry {
            records: Mutex::new(vec![KeyPairRecord::new("eksctl-prod-aa:bb", "aa:bb")]),
            fail_delete: true,
            ..Default::default()
        };
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let err = provisioner.cleanup_candidate_keys(&prod()).await.unwrap_err();

        assert!(matches!(&err, Error::Delete { name, .. } if name == "eksctl-prod-aa:bb"));
        assert!(err.to_string().contains("eksctl-prod-aa:bb"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "UnauthorizedOperation");
        assert_eq!(registry.delete_count(), 1);
    }

    #[tokio::test]
    async fn cleanup_surfaces_describe_failure() {
        let registry = FakeRegistry {
            records: Mutex::new(vec![KeyPairRecord::new("eksctl-prod-aa:bb", "aa:bb")]),
            fail_describe: true,
            ..Default::default()
        };
        let fingerprinter = FixedFingerprinter("aa:bb");
        let provisioner = SshKeyProvisioner::new(&registry, &fingerprinter);

        let err = provisioner.cleanup_candidate_keys(&prod()).await.unwrap_err();

        assert!(matches!(err, Error::Describe { name: None, .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(registry.delete_count(), 0);
    }
}
