//! Renders the ephemeral rclone configuration consumed by every transport
//! invocation of one run.
//!
//! The file is created with owner-only permissions and unlinked when the
//! `TransportConfig` drops, so credentials never outlive the process on any
//! exit path.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};

/// Name of the single remote declared in the rendered config.
pub const REMOTE_NAME: &str = "remote";

/// The rendered transport configuration plus the remote-path roots derived
/// from it. Built once per run and shared read-only across all groups.
pub struct TransportConfig {
    file: NamedTempFile,
    bucket: String,
    path_prefix: Option<String>,
}

impl TransportConfig {
    pub fn render(storage: &StorageConfig) -> Result<Self> {
        let contents = render_remote_section(storage);
        let mut file = NamedTempFile::new()
            .map_err(|e| AppError::TransportSetup(format!("cannot create config file: {e}")))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| AppError::TransportSetup(format!("cannot write config file: {e}")))?;

        Ok(TransportConfig {
            file,
            bucket: storage.bucket.clone(),
            path_prefix: storage.path_prefix.clone(),
        })
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// Remote folder for one group: `remote:{bucket}/{prefix}/{identifier}`.
    /// Backup uploads into this folder and cleanup deletes under it, so both
    /// must go through this one function.
    pub fn remote_dir(&self, identifier: &str) -> String {
        match &self.path_prefix {
            Some(prefix) => format!("{REMOTE_NAME}:{}/{}/{}", self.bucket, prefix, identifier),
            None => format!("{REMOTE_NAME}:{}/{}", self.bucket, identifier),
        }
    }

    /// Full remote destination of one archive file.
    pub fn remote_object(&self, identifier: &str, file_name: &str) -> String {
        format!("{}/{}", self.remote_dir(identifier), file_name)
    }
}

/// Renders the single-remote INI section. The endpoint line is empty only for
/// profiles that forbid an endpoint (AWS); the region has already been
/// defaulted by configuration validation where the profile allows it.
fn render_remote_section(storage: &StorageConfig) -> String {
    format!(
        "[{REMOTE_NAME}]\n\
         type = s3\n\
         provider = {}\n\
         access_key_id = {}\n\
         secret_access_key = {}\n\
         region = {}\n\
         endpoint = {}\n\
         acl = private\n",
        storage.profile.kind,
        storage.access_key_id,
        storage.secret_access_key,
        storage.region.as_deref().unwrap_or(""),
        storage.endpoint.as_deref().unwrap_or(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::provider::resolve_provider;

    fn storage(provider: &str, region: Option<&str>, endpoint: Option<&str>) -> StorageConfig {
        StorageConfig {
            profile: resolve_provider(provider),
            bucket: "backups".to_string(),
            access_key_id: "AKIA123".to_string(),
            secret_access_key: "s3cr3t".to_string(),
            region: region.map(str::to_string),
            endpoint: endpoint.map(str::to_string),
            path_prefix: None,
        }
    }

    #[test]
    fn aws_renders_empty_endpoint_and_given_region() {
        let rendered = render_remote_section(&storage("aws", Some("eu-central-1"), None));
        assert!(rendered.contains("provider = AWS\n"));
        assert!(rendered.contains("region = eu-central-1\n"));
        assert!(rendered.contains("endpoint = \n"));
        assert!(rendered.contains("acl = private\n"));
    }

    #[test]
    fn cloudflare_renders_defaulted_auto_region() {
        // Validation fills the default before rendering.
        let rendered = render_remote_section(&storage(
            "cloudflare",
            Some("auto"),
            Some("https://accid.r2.cloudflarestorage.com"),
        ));
        assert!(rendered.contains("provider = Cloudflare\n"));
        assert!(rendered.contains("region = auto\n"));
        assert!(rendered.contains("endpoint = https://accid.r2.cloudflarestorage.com\n"));
    }

    #[test]
    fn remote_paths_compose_bucket_prefix_and_identifier() {
        let mut cfg = storage("aws", Some("us-east-1"), None);
        let transport = TransportConfig::render(&cfg).unwrap();
        assert_eq!(transport.remote_dir("appdb"), "remote:backups/appdb");

        cfg.path_prefix = Some("nightly".to_string());
        let transport = TransportConfig::render(&cfg).unwrap();
        assert_eq!(transport.remote_dir("appdb"), "remote:backups/nightly/appdb");
        assert_eq!(
            transport.remote_object("appdb", "appdb_backup_x.tar.gz"),
            "remote:backups/nightly/appdb/appdb_backup_x.tar.gz"
        );
    }

    #[test]
    fn config_file_exists_until_drop() {
        let transport = TransportConfig::render(&storage("aws", Some("us-east-1"), None)).unwrap();
        let path = transport.config_path().to_path_buf();
        assert!(path.exists());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[remote]\n"));
        drop(transport);
        assert!(!path.exists());
    }
}
