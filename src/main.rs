//! Group Backup Tool
//!
//! Backs up application groups (databases plus directories) into compressed
//! archives on S3-compatible storage, and prunes archives past a retention
//! threshold. Invoked by an external scheduler as `groupbackup backup` or
//! `groupbackup cleanup`.

mod backup;
mod cleanup;
mod config;
mod errors;
mod orchestrate;
mod storage;

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::{error, info};

use config::{AppConfig, Operation};

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run_app() {
        Ok(_) => {
            info!("operation completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let operation = match args.get(1).map(String::as_str) {
        Some("backup") => Operation::Backup,
        Some("cleanup") => Operation::Cleanup,
        other => anyhow::bail!(
            "usage: groupbackup <backup|cleanup> (got {:?})",
            other.unwrap_or("nothing")
        ),
    };

    // Fails fast on any configuration problem before a group is touched.
    let app_config =
        AppConfig::load_from_env(operation).context("failed to load configuration")?;
    info!("loaded configuration with {} group(s)", app_config.groups.len());

    match operation {
        Operation::Backup => {
            info!("starting backup run");
            backup::run_backup_flow(&app_config).context("backup run failed")
        }
        Operation::Cleanup => {
            info!("starting cleanup run");
            cleanup::run_cleanup_flow(&app_config).context("cleanup run failed")
        }
    }
}
