//! Environment-backed configuration, loaded and validated once at startup.
//!
//! Both orchestrators receive the same `AppConfig` by reference; nothing
//! re-reads the environment after this module returns, so a backup run and a
//! later cleanup run agree on every derived value as long as the environment
//! matches.

pub mod groups;

use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::{AppError, Result};
use crate::storage::provider::{EndpointRule, ProviderProfile, RegionRule, resolve_provider};
use groups::{BackupGroup, parse_groups};

/// Which flow this invocation runs; decides which settings are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Backup,
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbDriver {
    Postgres,
    Mysql,
    Mariadb,
}

impl FromStr for DbDriver {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(DbDriver::Postgres),
            "mysql" => Ok(DbDriver::Mysql),
            "mariadb" => Ok(DbDriver::Mariadb),
            other => Err(AppError::Config(format!(
                "unsupported DB_DRIVER '{other}': expected postgres, mysql or mariadb"
            ))),
        }
    }
}

/// Everything the transport layer needs to reach the bucket.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub profile: ProviderProfile,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Always `Some` after validation when the profile needs one, including
    /// the Cloudflare `auto` default.
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub path_prefix: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub driver: DbDriver,
    pub groups: Vec<BackupGroup>,
    pub storage: StorageConfig,
    pub extra_transport_flags: Vec<String>,
    /// Retention threshold in days; present iff this is a cleanup run.
    pub retention_days: Option<u32>,
    pub dry_run: bool,
}

impl AppConfig {
    /// Loads and validates the whole configuration, failing before any group
    /// is touched if anything is missing or illegal.
    pub fn load_from_env(operation: Operation) -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_map(&vars, operation)
    }

    pub fn from_map(vars: &HashMap<String, String>, operation: Operation) -> Result<Self> {
        let driver: DbDriver = required(vars, "DB_DRIVER")?.parse()?;
        let groups = parse_groups(
            &required(vars, "DATABASES")?,
            &required(vars, "DIRECTORIES_TO_BACKUP")?,
        )?;

        let storage = load_storage(vars)?;

        let extra_transport_flags = optional(vars, "RCLONE_EXTRA_FLAGS")
            .map(|flags| flags.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let retention_days = match operation {
            Operation::Backup => None,
            Operation::Cleanup => Some(parse_retention_days(vars)?),
        };

        let dry_run = optional(vars, "DRY_RUN")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(AppConfig {
            driver,
            groups,
            storage,
            extra_transport_flags,
            retention_days,
            dry_run,
        })
    }
}

fn load_storage(vars: &HashMap<String, String>) -> Result<StorageConfig> {
    let provider_name = required(vars, "S3_PROVIDER")?;
    let profile = resolve_provider(&provider_name);

    let region = match profile.region {
        RegionRule::Required => match optional(vars, "S3_REGION") {
            Some(region) => Some(region),
            None => {
                return Err(AppError::Config(format!(
                    "S3_REGION must be set for provider '{provider_name}'"
                )));
            }
        },
        RegionRule::OptionalWithDefault(default) => {
            // Applied here so both flows render the same transport config.
            Some(optional(vars, "S3_REGION").unwrap_or_else(|| default.to_string()))
        }
    };

    let endpoint = match profile.endpoint {
        EndpointRule::Required => match optional(vars, "S3_ENDPOINT") {
            Some(endpoint) => Some(endpoint),
            None => {
                return Err(AppError::Config(format!(
                    "S3_ENDPOINT must be set for provider '{provider_name}'"
                )));
            }
        },
        EndpointRule::Forbidden => {
            if optional(vars, "S3_ENDPOINT").is_some() {
                return Err(AppError::Config(format!(
                    "S3_ENDPOINT must not be set for provider '{provider_name}'"
                )));
            }
            None
        }
    };

    Ok(StorageConfig {
        profile,
        bucket: required(vars, "BUCKET_NAME")?,
        access_key_id: required(vars, "S3_ACCESS_KEY_ID")?,
        secret_access_key: required(vars, "S3_SECRET_ACCESS_KEY")?,
        region,
        endpoint,
        path_prefix: optional(vars, "BACKUP_PATH_PREFIX")
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty()),
    })
}

fn parse_retention_days(vars: &HashMap<String, String>) -> Result<u32> {
    let raw = required(vars, "NUMBER_OF_DAYS")?;
    match raw.parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(AppError::Config(format!(
            "NUMBER_OF_DAYS must be a positive integer, got '{raw}'"
        ))),
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String> {
    optional(vars, name).ok_or_else(|| AppError::Config(format!("{name} must be set")))
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
