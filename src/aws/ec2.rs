// src/aws/ec2.rs
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use super::AwsCli;
use crate::error::BoxError;
use crate::keypair::KeyPairRegistry;
use crate::types::KeyPairRecord;

const KEY_PAIR_NOT_FOUND: &str = "InvalidKeyPair.NotFound";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeKeyPairsOutput {
    #[serde(default)]
    key_pairs: Vec<KeyPairInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyPairInfo {
    key_name: String,
    key_fingerprint: String,
}

impl DescribeKeyPairsOutput {
    fn into_records(self) -> Vec<KeyPairRecord> {
        self.key_pairs
            .into_iter()
            .map(|kp| KeyPairRecord::new(kp.key_name, kp.key_fingerprint))
            .collect()
    }
}

#[async_trait]
impl KeyPairRegistry for AwsCli {
    async fn describe(&self, name: Option<&str>) -> Result<Vec<KeyPairRecord>, BoxError> {
        let mut args = vec!["ec2", "describe-key-pairs"];
        if let Some(name) = name {
            args.extend(["--key-names", name]);
        }
        match self.run_json::<DescribeKeyPairsOutput>(&args).await {
            Ok(output) => Ok(output.into_records()),
            Err(e) if name.is_some() && e.is_service_error(KEY_PAIR_NOT_FOUND) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn import(&self, name: &str, public_key: &[u8]) -> Result<(), BoxError> {
        let material = general_purpose::STANDARD.encode(public_key);
        self.run(&[
            "ec2",
            "import-key-pair",
            "--key-name",
            name,
            "--public-key-material",
            material.as_str(),
        ])
        .await?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), BoxError> {
        self.run(&["ec2", "delete-key-pair", "--key-name", name]).await?;
        Ok(())
    }
}
