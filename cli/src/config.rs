//! Configuration management for the sync command.

use allowlist_engine::{RetentionPolicy, SyncOptions, VersionTag, DEFAULT_COLLECTION};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments. Every option can also come from the environment
/// (or a `.env` file).
#[derive(Debug, Parser)]
#[command(name = "allowlist-sync")]
#[command(about = "Keep a Hasura query allow-list in sync with local GraphQL documents")]
pub struct Cli {
    /// Hasura endpoint, e.g. http://localhost:8080
    #[arg(long, env = "HASURA_ENDPOINT")]
    pub host: Option<String>,

    /// Hasura admin secret
    #[arg(short = 's', long, env = "HASURA_ADMIN_SECRET", hide_env_values = true)]
    pub admin_secret: Option<String>,

    /// Files or directories holding .graphql / .gql documents
    #[arg(short = 'p', long = "path", num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Replace changed queries without asking
    #[arg(short = 'f', long)]
    pub force_replace: bool,

    /// Allow-list the introspection query
    #[arg(short = 'i', long)]
    pub allow_introspection: bool,

    /// Drop the whole collection before publishing
    #[arg(short = 'r', long)]
    pub reset: bool,

    /// Publish changed queries as new versions with this tag instead of
    /// replacing them
    #[arg(short = 'v', long = "version", env = "ALLOWLIST_VERSION")]
    pub version: Option<String>,

    /// Keep versions younger than this many days (0 disables)
    #[arg(
        long,
        env = "ALLOWLIST_VERSION_MAX_DAY",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub version_max_day: i64,

    /// Keep at most this many versions per query (0 disables)
    #[arg(
        long,
        env = "ALLOWLIST_VERSION_MAX_VERSION",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub version_max_version: i64,

    /// Write the collection to this JSON file instead of the Hasura instance
    #[arg(long, env = "ALLOWLIST_COLLECTION_PATH")]
    pub query_collection_path: Option<PathBuf>,

    /// Name of the query collection
    #[arg(long, env = "ALLOWLIST_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,
}

/// Where the collection is read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetConfig {
    /// A Hasura instance reached over its metadata API
    Remote {
        endpoint: String,
        admin_secret: Option<String>,
    },
    /// A local JSON collection file
    File(PathBuf),
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: TargetConfig,
    pub paths: Vec<PathBuf>,
    pub collection: String,
    pub force_replace: bool,
    pub allow_introspection: bool,
    pub sync: SyncOptions,
}

impl Config {
    /// Validate parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.paths.is_empty() {
            return Err(ConfigError::MissingPaths);
        }

        let target = match (cli.host, cli.query_collection_path) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTargets),
            (None, None) => return Err(ConfigError::MissingTarget),
            (Some(host), None) => TargetConfig::Remote {
                endpoint: host.trim_end_matches('/').to_string(),
                admin_secret: cli.admin_secret,
            },
            (None, Some(path)) => TargetConfig::File(path),
        };

        let version = cli
            .version
            .map(VersionTag::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidVersion(e.to_string()))?;
        if version.is_some() && cli.force_replace {
            return Err(ConfigError::VersionWithForceReplace);
        }

        Ok(Self {
            target,
            paths: cli.paths,
            collection: cli.collection,
            force_replace: cli.force_replace,
            allow_introspection: cli.allow_introspection,
            sync: SyncOptions {
                version,
                retention: RetentionPolicy::new(cli.version_max_day, cli.version_max_version),
                reset: cli.reset,
            },
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one --path is required")]
    MissingPaths,

    #[error("either --host (HASURA_ENDPOINT) or --query-collection-path is required")]
    MissingTarget,

    #[error("--host and --query-collection-path cannot be used together")]
    ConflictingTargets,

    #[error("--version cannot be used with --force-replace")]
    VersionWithForceReplace,

    #[error("Invalid --version value: {0}")]
    InvalidVersion(String),
}
