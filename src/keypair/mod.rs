// src/keypair/mod.rs
mod fingerprint;
pub mod naming;
mod provisioner;
mod registry;

pub use fingerprint::{Ec2Fingerprinter, Fingerprinter};
pub use provisioner::{CleanupOutcome, LocalKeyMaterial, SshKeyProvisioner};
pub use registry::KeyPairRegistry;
