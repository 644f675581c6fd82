// src/aws/sts.rs
use serde::Deserialize;

use super::{AwsCli, CommandError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    arn: String,
}

impl AwsCli {
    /// ARN of the credentials in use.
    pub async fn caller_arn(&self) -> Result<String, CommandError> {
        let identity: CallerIdentity = self.run_json(&["sts", "get-caller-identity"]).await?;
        Ok(identity.arn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_caller_identity() {
        let json = r#"{
            "UserId": "AIDAEXAMPLE",
            "Account": "111122223333",
            "Arn": "arn:aws:iam::111122223333:user/alice"
        }"#;
        let identity: CallerIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.arn, "arn:aws:iam::111122223333:user/alice");
    }
}
