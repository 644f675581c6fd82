// src/aws/mod.rs
//! Registry, token and identity implementations backed by the `aws` command
//! line tool.

mod ec2;
mod eks;
mod sts;

use std::io;
use std::process::ExitStatus;

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

pub use eks::ControlPlane;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {program:?}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unexpected output from `{command}`")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected output from `{command}`: {message}")]
    Invalid { command: String, message: String },
}

impl CommandError {
    /// True when the command failed with the given AWS error code, e.g.
    /// `InvalidKeyPair.NotFound`.
    pub fn is_service_error(&self, code: &str) -> bool {
        match self {
            CommandError::Failed { stderr, .. } => stderr.contains(code),
            _ => false,
        }
    }
}

/// Runs `aws` subcommands for one region and optional named profile.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCli {
    pub fn new(region: Option<String>, profile: Option<String>) -> Self {
        Self {
            program: "aws".to_string(),
            region: region.filter(|r| !r.is_empty()),
            profile: profile.filter(|p| !p.is_empty()),
        }
    }

    /// Uses `program` instead of `aws` from `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.extend(["--output".to_string(), "json".to_string()]);
        if let Some(region) = &self.region {
            full.extend(["--region".to_string(), region.clone()]);
        }
        if let Some(profile) = &self.profile {
            full.extend(["--profile".to_string(), profile.clone()]);
        }
        full
    }

    /// Service and operation only; argument values may carry key material.
    fn display(&self, args: &[&str]) -> String {
        let mut shown = vec![self.program.as_str()];
        shown.extend(args.iter().take(2));
        shown.join(" ")
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, CommandError> {
        let command = self.display(args);
        debug!("running {}", command);

        let output = Command::new(&self.program)
            .args(self.command_args(args))
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, CommandError> {
        let stdout = self.run(args).await?;
        serde_json::from_slice(&stdout).map_err(|source| CommandError::Parse {
            command: self.display(args),
            source,
        })
    }
}
