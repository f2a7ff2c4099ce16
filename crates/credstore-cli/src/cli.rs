use clap::{Parser, Subcommand};

/// CLI surface definition: a thin caller over the credential store.
#[derive(Parser, Debug)]
#[command(
    name = "credstore",
    about = "Keep API credentials on this machine with the secret encrypted at rest",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encrypt and store credentials. The secret is read from
    /// CREDSTORE_SECRET_KEY or the first line of stdin.
    Save {
        /// Encryption container; falls back to `container` in the config.
        #[arg(long)]
        container: Option<String>,
        #[arg(long)]
        access_key_id: String,
        /// Storage location, e.g. `Software/SnowCode/S3BuildPublisher`.
        #[arg(long)]
        location: Option<String>,
    },
    /// Load and decrypt stored credentials.
    Load {
        #[arg(long)]
        container: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Print the decrypted secret instead of a redacted marker.
        #[arg(long)]
        reveal: bool,
    },
    /// Round-trip a probe record through the configured store.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
