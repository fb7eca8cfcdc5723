//! Group grammar: two parallel environment strings describe N backup groups.
//!
//! `DATABASES` and `DIRECTORIES_TO_BACKUP` are each a whitespace-separated
//! list of tokens; token i of one pairs with token i of the other. A token may
//! be double-quoted to hold interior spaces (multi-database groups). The
//! literal `NONE` marks an empty position.

use std::path::PathBuf;

use crate::errors::{AppError, Result};

/// Marker for "no databases" / "no directories" in a group position.
const NONE_TOKEN: &str = "NONE";

/// One backup unit: a set of databases plus a set of directories, addressed
/// remotely by a single derived identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupGroup {
    pub identifier: String,
    pub databases: Vec<DatabaseSpec>,
    pub directories: Vec<PathBuf>,
}

/// Connection parameters for one database, parsed from a
/// `name:host:port:user:password` token. Fields are not individually
/// validated here; a wrong host or password surfaces when the dump adapter
/// fails to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub name: String,
    pub host: String,
    pub port: String,
    pub user: String,
    pub password: String,
}

impl DatabaseSpec {
    pub fn parse(token: &str) -> Result<Self> {
        let fields: Vec<&str> = token.split(':').collect();
        if fields.len() != 5 {
            return Err(AppError::MalformedConnectionString {
                token: token.to_string(),
            });
        }
        Ok(DatabaseSpec {
            name: fields[0].to_string(),
            host: fields[1].to_string(),
            port: fields[2].to_string(),
            user: fields[3].to_string(),
            password: fields[4].to_string(),
        })
    }
}

/// Parses the two parallel group strings into ordered `BackupGroup`s.
///
/// Both strings must yield the same number of top-level tokens; a group with
/// `NONE` in both positions is rejected with its 1-based index.
pub fn parse_groups(databases: &str, directories: &str) -> Result<Vec<BackupGroup>> {
    let db_tokens = split_top_level(databases);
    let dir_tokens = split_top_level(directories);

    if db_tokens.len() != dir_tokens.len() {
        return Err(AppError::GroupCardinalityMismatch {
            databases: db_tokens.len(),
            directories: dir_tokens.len(),
        });
    }

    let mut groups = Vec::with_capacity(db_tokens.len());
    for (index, (db_token, dir_token)) in db_tokens.iter().zip(&dir_tokens).enumerate() {
        if db_token == NONE_TOKEN && dir_token == NONE_TOKEN {
            return Err(AppError::EmptyGroup { index: index + 1 });
        }

        let databases = if db_token == NONE_TOKEN {
            Vec::new()
        } else {
            db_token
                .split_whitespace()
                .map(DatabaseSpec::parse)
                .collect::<Result<Vec<_>>>()?
        };

        let directories = if dir_token == NONE_TOKEN {
            Vec::new()
        } else {
            parse_directory_list(dir_token)?
        };

        let identifier = resolve_identifier(&databases, &directories);
        groups.push(BackupGroup {
            identifier,
            databases,
            directories,
        });
    }

    Ok(groups)
}

/// Splits a directory token on `:` into absolute paths. Empty segments
/// (leading, trailing, or doubled `:`) are grammar errors.
fn parse_directory_list(token: &str) -> Result<Vec<PathBuf>> {
    let segments: Vec<&str> = token.split(':').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(AppError::MalformedDirectoryList(token.to_string()));
    }
    Ok(segments.iter().map(PathBuf::from).collect())
}

/// Derives a group's stable identifier: the first database name, else the
/// base name of the first directory. Both the backup and cleanup flows call
/// this same function, so the remote folder a backup writes is exactly the
/// folder a later cleanup prunes.
///
/// Identifiers are not checked for uniqueness across groups; two groups that
/// resolve to the same string share a remote folder.
fn resolve_identifier(databases: &[DatabaseSpec], directories: &[PathBuf]) -> String {
    let raw = match databases.first() {
        Some(db) => db.name.clone(),
        None => directories
            .first()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| {
                directories
                    .first()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default()
            }),
    };
    sanitize_identifier(&raw)
}

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Splits on whitespace while honoring double quotes, so a quoted token can
/// carry interior spaces. Quote characters are stripped from the result.
fn split_top_level(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in input.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_matching_group_counts() {
        let groups = parse_groups(
            "appdb:host:5432:u:p otherdb:host:5432:u:p",
            "/data/app1 /data/app2",
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn rejects_cardinality_mismatch() {
        let err = parse_groups("appdb:host:5432:u:p", "/a /b /c").unwrap_err();
        match err {
            AppError::GroupCardinalityMismatch {
                databases,
                directories,
            } => {
                assert_eq!(databases, 1);
                assert_eq!(directories, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_doubly_empty_group_with_index() {
        let err = parse_groups("db:h:1:u:p NONE", "/data NONE").unwrap_err();
        match err {
            AppError::EmptyGroup { index } => assert_eq!(index, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quoted_token_holds_multiple_databases() {
        let groups = parse_groups("\"db1:h:5432:u:p db2:h:5432:u:p\"", "NONE").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].databases.len(), 2);
        assert_eq!(groups[0].identifier, "db1");
        assert!(groups[0].directories.is_empty());
    }

    #[test]
    fn connection_string_needs_exactly_five_fields() {
        assert!(matches!(
            DatabaseSpec::parse("db:host:5432:user"),
            Err(AppError::MalformedConnectionString { .. })
        ));
        assert!(matches!(
            DatabaseSpec::parse("db:host:5432:user:pw:extra"),
            Err(AppError::MalformedConnectionString { .. })
        ));
        let spec = DatabaseSpec::parse("db:host:5432:user:pw").unwrap();
        assert_eq!(spec.name, "db");
        assert_eq!(spec.port, "5432");
    }

    #[test]
    fn empty_fields_pass_the_parser() {
        // Emptiness is the dump adapter's problem, not the grammar's.
        let spec = DatabaseSpec::parse("db:::u:").unwrap();
        assert_eq!(spec.host, "");
        assert_eq!(spec.password, "");
    }

    #[test]
    fn directory_list_rejects_empty_segments() {
        for bad in ["/a:", ":/a", "/a::/b"] {
            let err = parse_groups("NONE", bad).unwrap_err();
            assert!(
                matches!(err, AppError::MalformedDirectoryList(_)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn identifier_prefers_first_database_name() {
        let groups = parse_groups("appdb:h:5432:u:p", "/data/elsewhere").unwrap();
        assert_eq!(groups[0].identifier, "appdb");
    }

    #[test]
    fn identifier_falls_back_to_first_directory_basename() {
        let groups = parse_groups("NONE", "/var/log/app2:/etc/app2").unwrap();
        assert_eq!(groups[0].identifier, "app2");
    }

    #[test]
    fn identifier_is_sanitized_and_stable() {
        assert_eq!(sanitize_identifier("my db@v2"), "my_db_v2");
        assert_eq!(sanitize_identifier("ok_name.0-1"), "ok_name.0-1");
        // Idempotent: sanitizing twice changes nothing.
        assert_eq!(
            sanitize_identifier(&sanitize_identifier("a/b c")),
            sanitize_identifier("a/b c")
        );
    }

    #[test]
    fn same_input_resolves_identically_across_calls() {
        let a = parse_groups("appdb:h:5432:u:p", "/data").unwrap();
        let b = parse_groups("appdb:h:5432:u:p", "/data").unwrap();
        assert_eq!(a[0].identifier, b[0].identifier);
    }

    #[test]
    fn end_to_end_two_group_scenario() {
        let groups = parse_groups(
            "appdb:host:5432:u:p NONE",
            "/data/app1:/etc/app1 /var/log/app2",
        )
        .unwrap();
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].identifier, "appdb");
        assert_eq!(groups[0].databases.len(), 1);
        assert_eq!(
            groups[0].directories,
            vec![PathBuf::from("/data/app1"), PathBuf::from("/etc/app1")]
        );

        assert_eq!(groups[1].identifier, "app2");
        assert!(groups[1].databases.is_empty());
        assert_eq!(groups[1].directories, vec![PathBuf::from("/var/log/app2")]);
    }
}
