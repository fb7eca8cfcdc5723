use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Group count mismatch: DATABASES declares {databases} group(s) but \
         DIRECTORIES_TO_BACKUP declares {directories}"
    )]
    GroupCardinalityMismatch { databases: usize, directories: usize },

    #[error("Group {index} is empty: both the database and directory positions are NONE")]
    EmptyGroup { index: usize },

    #[error("Malformed connection string '{token}': expected name:host:port:user:password")]
    MalformedConnectionString { token: String },

    #[error("Malformed directory list '{0}': empty path segment")]
    MalformedDirectoryList(String),

    #[error("Transport setup failed: {0}")]
    TransportSetup(String),

    #[error("Group '{identifier}' failed: {reason}")]
    Group { identifier: String, reason: String },

    #[error("{failed} of {total} group(s) failed")]
    RunSummary { total: usize, failed: usize },
}

pub type Result<T> = std::result::Result<T, AppError>;
