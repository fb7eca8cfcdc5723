mod logic;

use anyhow::Result;

use crate::config::AppConfig;

/// Public entry point for the retention-cleanup flow.
pub fn run_cleanup_flow(config: &AppConfig) -> Result<()> {
    logic::perform_cleanup_orchestration(config)
}
