mod types;

pub use types::{BootstrapConfig, ConfigOverrides, DEFAULT_SSH_PUBLIC_KEY_PATH};
