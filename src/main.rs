// src/main.rs
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use cluster_access::aws::{AwsCli, ControlPlane};
use cluster_access::config::{BootstrapConfig, ConfigOverrides};
use cluster_access::keypair::{CleanupOutcome, Ec2Fingerprinter, SshKeyProvisioner};
use cluster_access::kubeconfig::{
    write_kubeconfig, ClientConfigBuilder, ClusterClientConfig, KubeClientFactory,
};
use cluster_access::utils::logging::init_logging;
use cluster_access::ClusterIdentity;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(short, long, global = true, default_value = "cluster_config.json")]
    pub config: PathBuf,
    #[arg(short, long, global = true)]
    pub debug: bool,
    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
    #[command(flatten)]
    pub cluster: ClusterArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct ClusterArgs {
    /// Cluster name
    #[arg(long, global = true)]
    pub name: Option<String>,
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,
    /// Named AWS credentials profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,
    /// SSH public key file, or the name of an existing EC2 key pair
    #[arg(long, global = true)]
    pub ssh_public_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save the effective settings (file plus flags) to the config file
    InitConfig,
    /// Import the SSH public key as an EC2 key pair unless it already exists
    ImportKey,
    /// Delete the key pair imported for the cluster, if it can be identified
    DeleteKey,
    /// Write a kubeconfig for the cluster
    WriteKubeconfig {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = AuthMode::Exec)]
        auth: AuthMode,
        /// API server endpoint; looked up with `aws eks describe-cluster` if omitted
        #[arg(long)]
        endpoint: Option<String>,
        /// PEM file with the cluster CA
        #[arg(long)]
        ca_file: Option<PathBuf>,
    },
    /// Connect to the API server with an embedded token and print its version
    CheckAccess,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthMode {
    /// Run aws-iam-authenticator on every connection
    Exec,
    /// Embed a short-lived token
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log_file.as_deref()).context("initializing logging")?;

    if let Err(err) = run(args).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = BootstrapConfig::load_or_default(&args.config)?.apply_overrides(ConfigOverrides {
        cluster_name: args.cluster.name,
        region: args.cluster.region,
        profile: args.cluster.profile,
        ssh_public_key_path: args.cluster.ssh_public_key,
    });
    let cluster = config.validate()?;
    let aws = AwsCli::new(Some(cluster.region.clone()), config.profile.clone());
    let fingerprinter = Ec2Fingerprinter;

    match args.command {
        Command::InitConfig => {
            config.save_to_file(&args.config)?;
            info!("saved config for cluster {:?} as {:?}", cluster.name, args.config);
            println!("{}", args.config.display());
        }
        Command::ImportKey => {
            let provisioner = SshKeyProvisioner::new(&aws, &fingerprinter);
            let key = provisioner
                .load_or_import(&config.ssh_public_key_path, &cluster)
                .await?;
            println!("{}", key.key_name);
        }
        Command::DeleteKey => {
            let provisioner = SshKeyProvisioner::new(&aws, &fingerprinter);
            match provisioner.cleanup_candidate_keys(&cluster).await? {
                CleanupOutcome::Deleted(name) => println!("deleted {}", name),
                CleanupOutcome::NothingToDelete => println!("no key pair to delete"),
                CleanupOutcome::Ambiguous(names) => {
                    println!("not deleting, several candidates: {}", names.join(", "))
                }
            }
        }
        Command::WriteKubeconfig {
            output,
            auth,
            endpoint,
            ca_file,
        } => {
            let base = build_client_config(&config, &cluster, &aws, endpoint, ca_file).await?;
            let client_config = match auth {
                AuthMode::Exec => base.with_exec_plugin(),
                AuthMode::Token => base.with_embedded_token(&aws).await?,
            };

            let Some(path) = output.or_else(|| config.kubeconfig_output_path()) else {
                bail!("no kubeconfig output path; pass --output");
            };
            write_kubeconfig(&client_config.client, &path)?;
            info!("saved kubeconfig as {:?}", path);
            println!("{}", path.display());
        }
        Command::CheckAccess => {
            let base = build_client_config(&config, &cluster, &aws, None, None).await?;
            let client = base
                .to_client_handle_with_embedded_token(&aws, &KubeClientFactory)
                .await?;
            let version = client
                .apiserver_version()
                .await
                .with_context(|| format!("querying API server of {}", base.cluster_name))?;
            println!("{}: Kubernetes {}", base.context_name, version.git_version);
        }
    }
    Ok(())
}

async fn build_client_config(
    config: &BootstrapConfig,
    cluster: &ClusterIdentity,
    aws: &AwsCli,
    endpoint: Option<String>,
    ca_file: Option<PathBuf>,
) -> Result<ClusterClientConfig> {
    let control_plane = resolve_control_plane(config, cluster, aws, endpoint, ca_file).await?;
    let caller_arn = aws
        .caller_arn()
        .await
        .context("looking up caller identity")?;

    let builder = ClientConfigBuilder::new(cluster.clone()).with_profile(config.profile.clone());
    Ok(builder.build(
        &control_plane.endpoint,
        &control_plane.certificate_authority_data,
        &caller_arn,
    )?)
}

/// Explicit endpoint and CA win; anything missing comes from the EKS API.
async fn resolve_control_plane(
    config: &BootstrapConfig,
    cluster: &ClusterIdentity,
    aws: &AwsCli,
    endpoint: Option<String>,
    ca_file: Option<PathBuf>,
) -> Result<ControlPlane> {
    let endpoint = endpoint.or_else(|| config.endpoint.clone());
    let ca_data = match ca_file {
        Some(path) => Some(
            std::fs::read(&path).with_context(|| format!("reading CA file {:?}", path))?,
        ),
        None => config.read_certificate_authority()?,
    };

    if let (Some(endpoint), Some(certificate_authority_data)) = (&endpoint, &ca_data) {
        return Ok(ControlPlane {
            endpoint: endpoint.clone(),
            certificate_authority_data: certificate_authority_data.clone(),
        });
    }

    let described = aws
        .describe_cluster(&cluster.name)
        .await
        .with_context(|| format!("describing cluster {:?}", cluster.name))?;
    Ok(ControlPlane {
        endpoint: endpoint.unwrap_or(described.endpoint),
        certificate_authority_data: ca_data.unwrap_or(described.certificate_authority_data),
    })
}
