mod logic;
pub(crate) mod archive;
pub(crate) mod db_dump;

use anyhow::Result;

use crate::config::AppConfig;

/// Public entry point for the backup flow.
pub fn run_backup_flow(config: &AppConfig) -> Result<()> {
    logic::perform_backup_orchestration(config)
}
