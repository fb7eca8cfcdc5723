//! Dispatches one database to the dump program matching the declared driver.
//!
//! Connection parameters travel as an environment overlay scoped to the
//! single child invocation; the parent environment and sibling invocations
//! never see them.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use log::info;
use which::which;

use crate::config::DbDriver;
use crate::config::groups::{DatabaseSpec, sanitize_identifier};

/// Resolves the dump executable for a driver. Missing tooling is fatal to the
/// whole run, so this is called once before any group starts.
pub fn find_dump_executable(driver: DbDriver) -> Result<PathBuf> {
    match driver {
        DbDriver::Postgres => which("pg_dump")
            .context("pg_dump not found in PATH. Install the PostgreSQL client tools."),
        DbDriver::Mysql => {
            which("mysqldump").context("mysqldump not found in PATH. Install the MySQL client tools.")
        }
        // MariaDB images ship mariadb-dump; older ones only have the
        // mysqldump compatibility name.
        DbDriver::Mariadb => which("mariadb-dump")
            .or_else(|_| which("mysqldump"))
            .context("neither mariadb-dump nor mysqldump found in PATH."),
    }
}

/// Dumps one database into `<workdir>/<name>.sql`. The adapter's stdout is
/// the dump byte stream; a non-zero exit fails the calling group only.
pub fn dump_database(
    driver: DbDriver,
    dump_exe: &Path,
    spec: &DatabaseSpec,
    workdir: &Path,
) -> Result<PathBuf> {
    let out_path = workdir.join(dump_file_name(spec));
    info!("dumping database '{}' to {}", spec.name, out_path.display());

    let out_file = File::create(&out_path)
        .with_context(|| format!("failed to create dump file {}", out_path.display()))?;

    let (args, envs) = adapter_invocation(driver, spec);
    let child = Command::new(dump_exe)
        .args(&args)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::from(out_file))
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute {}", dump_exe.display()))?;

    let output = child
        .wait_with_output()
        .with_context(|| format!("failed to wait for {}", dump_exe.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "dump of database '{}' exited with {}: {}",
            spec.name,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(out_path)
}

fn dump_file_name(spec: &DatabaseSpec) -> String {
    format!("{}.sql", sanitize_identifier(&spec.name))
}

/// Builds the adapter call: the database name as the sole positional
/// argument, connection details as the scoped environment overlay (postgres)
/// or flags plus a password overlay (mysql/mariadb).
fn adapter_invocation(driver: DbDriver, spec: &DatabaseSpec) -> (Vec<String>, Vec<(String, String)>) {
    match driver {
        DbDriver::Postgres => (
            vec![spec.name.clone()],
            vec![
                ("PGHOST".to_string(), spec.host.clone()),
                ("PGPORT".to_string(), spec.port.clone()),
                ("PGUSER".to_string(), spec.user.clone()),
                ("PGPASSWORD".to_string(), spec.password.clone()),
            ],
        ),
        DbDriver::Mysql | DbDriver::Mariadb => (
            vec![
                "-h".to_string(),
                spec.host.clone(),
                "-P".to_string(),
                spec.port.clone(),
                "-u".to_string(),
                spec.user.clone(),
                spec.name.clone(),
            ],
            vec![("MYSQL_PWD".to_string(), spec.password.clone())],
        ),
    }
}
