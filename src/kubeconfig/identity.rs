// src/kubeconfig/identity.rs
//! Names derived from the cluster identity and the caller's ARN.

use crate::error::{Error, Result};
use crate::types::ClusterIdentity;

/// Username used when the caller ARN has no path, i.e. the account root.
pub const ROOT_ACCOUNT_USERNAME: &str = "iam-root-account";

const CLUSTER_DOMAIN: &str = "eksctl.io";

/// `<name>.<region>.eksctl.io`
pub fn cluster_name(cluster: &ClusterIdentity) -> String {
    format!("{}.{}.{}", cluster.name, cluster.region, CLUSTER_DOMAIN)
}

/// `<username>@<cluster name>`
pub fn context_name(username: &str, cluster_name: &str) -> String {
    format!("{}@{}", username, cluster_name)
}

/// Extracts the username from a caller ARN: the last `/`-separated segment
/// (`arn:aws:iam::111:user/alice` gives `alice`), or
/// [`ROOT_ACCOUNT_USERNAME`] when the ARN has no `/` at all.
///
/// Empty identities and identities ending in `/` are rejected.
pub fn username_from_arn(caller_arn: &str) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidCallerIdentity {
        identity: caller_arn.to_string(),
        reason: reason.to_string(),
    };

    let arn = caller_arn.trim();
    if arn.is_empty() {
        return Err(invalid("identity is empty"));
    }

    match arn.rsplit_once('/') {
        None => Ok(ROOT_ACCOUNT_USERNAME.to_string()),
        Some((_, "")) => Err(invalid("identity ends with '/'")),
        Some((_, username)) => Ok(username.to_string()),
    }
}
