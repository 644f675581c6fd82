// src/keypair/naming.rs
//! Deterministic key pair names: `eksctl-<cluster>[-<fingerprint>]`.

use crate::types::KeyPairRecord;

pub const KEY_NAME_PREFIX: &str = "eksctl";
const SEPARATOR: char = '-';

/// Builds the registry name for a cluster's key. Without a fingerprint this
/// is the prefix shared by every key generated for the cluster.
pub fn key_pair_name(cluster_name: &str, fingerprint: Option<&str>) -> String {
    let mut parts = vec![KEY_NAME_PREFIX, cluster_name];
    if let Some(fingerprint) = fingerprint {
        parts.push(fingerprint);
    }
    parts.join(&SEPARATOR.to_string())
}

/// Returns the segment after the last `-`, or `None` if the name has no
/// separator or ends with one.
pub fn fingerprint_segment(name: &str) -> Option<&str> {
    let (_, last) = name.rsplit_once(SEPARATOR)?;
    if last.is_empty() {
        None
    } else {
        Some(last)
    }
}

/// A record was generated by this naming scheme for `cluster_name` when its
/// name carries the cluster prefix, its trailing segment is its own
/// fingerprint, and nothing sits between the two. The last condition keeps
/// `eksctl-production-<fp>` and `eksctl-prod-east-<fp>` out of `prod`.
pub fn is_generated_for(record: &KeyPairRecord, cluster_name: &str) -> bool {
    let prefix = key_pair_name(cluster_name, None);
    if !record.name.starts_with(&prefix) {
        return false;
    }
    fingerprint_segment(&record.name) == Some(record.fingerprint.as_str())
        && record.name == key_pair_name(cluster_name, Some(&record.fingerprint))
}
