//! Migration records and the section parser.
//!
//! A [`Migration`] is the discovery-time record of one on-disk file; calling
//! [`Migration::parse`] reads the file through the configured filesystem and
//! splits it into its `up` and `down` sections. Parsing is purely textual;
//! no SQL is interpreted here.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// One discovered migration file.
#[derive(Debug, Clone)]
pub struct Migration {
    /// The leading digit run of the filename; identity in the ledger and
    /// sort key.
    pub version: String,
    /// Basename of the file.
    pub file_name: String,
    /// The path as discovered (absolute iff the configured root was
    /// absolute).
    pub file_path: PathBuf,
    /// Whether the ledger currently records this version. Set by
    /// reconciliation; `false` straight out of discovery.
    pub applied: bool,
    pub(crate) fs: Arc<dyn FileSystem>,
}

impl Migration {
    /// Read and parse the migration file.
    pub fn parse(&self) -> Result<ParsedMigration> {
        let bytes = self.fs.read(&self.file_path)?;
        let path = self.file_path.display().to_string();
        let contents = String::from_utf8(bytes)
            .map_err(|_| Error::parse(&path, "file is not valid UTF-8"))?;
        parse_migration(&contents, &path)
    }
}

/// The parsed form of one migration file.
#[derive(Debug, Clone)]
pub struct ParsedMigration {
    /// The complete original file contents, line endings preserved.
    pub contents: String,
    /// The `up` section.
    pub up: MigrationSection,
    /// The `down` section, if the file has one.
    pub down: Option<MigrationSection>,
}

/// One section of a migration file, starting at its directive line.
#[derive(Debug, Clone)]
pub struct MigrationSection {
    /// The section text, including the directive line itself.
    pub sql: String,
    /// Options parsed from the directive line.
    pub options: MigrationOptions,
    /// Byte offset of the section start within the original file.
    pub offset: usize,
}

/// Per-section options carried on a directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Whether to wrap the section in a transaction. Defaults to `true`.
    pub transaction: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self { transaction: true }
    }
}

enum Directive {
    Up,
    Down,
}

/// Recognize a directive line. Returns the directive kind and the raw
/// options text that follows it. Leading whitespace is tolerated; the `--`
/// may or may not be followed by a space.
fn split_directive(line: &str) -> Option<(Directive, &str)> {
    let rest = line.trim().strip_prefix("--")?;
    let rest = rest.trim_start().strip_prefix("migrate:")?;
    if let Some(options) = rest.strip_prefix("up") {
        if options.is_empty() || options.starts_with(char::is_whitespace) {
            return Some((Directive::Up, options));
        }
    } else if let Some(options) = rest.strip_prefix("down") {
        if options.is_empty() || options.starts_with(char::is_whitespace) {
            return Some((Directive::Down, options));
        }
    }
    None
}

fn parse_options(raw: &str, path: &str, line_no: usize) -> Result<MigrationOptions> {
    let mut options = MigrationOptions::default();
    for token in raw.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            return Err(Error::parse(
                path,
                format!("line {line_no}: malformed option '{token}', expected key:value"),
            ));
        };
        match key {
            "transaction" => {
                options.transaction = match value {
                    "true" => true,
                    "false" => false,
                    other => {
                        return Err(Error::parse(
                            path,
                            format!("line {line_no}: invalid value '{other}' for transaction option"),
                        ));
                    }
                };
            }
            other => {
                return Err(Error::parse(
                    path,
                    format!("line {line_no}: unknown option '{other}'"),
                ));
            }
        }
    }
    Ok(options)
}

/// Split a migration file into sections.
pub fn parse_migration(contents: &str, path: &str) -> Result<ParsedMigration> {
    let mut up: Option<(usize, MigrationOptions)> = None;
    let mut down: Option<(usize, MigrationOptions)> = None;
    let mut preamble_has_content = false;

    let mut offset = 0;
    for (index, line) in contents.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        match split_directive(line) {
            Some((Directive::Up, raw)) => {
                if up.is_some() {
                    return Err(Error::parse(
                        path,
                        format!("line {line_no}: duplicate '-- migrate:up' directive"),
                    ));
                }
                up = Some((offset, parse_options(raw, path, line_no)?));
            }
            Some((Directive::Down, raw)) => {
                if up.is_none() {
                    return Err(Error::parse(
                        path,
                        format!(
                            "line {line_no}: '-- migrate:down' directive appears before '-- migrate:up'"
                        ),
                    ));
                }
                if down.is_some() {
                    return Err(Error::parse(
                        path,
                        format!("line {line_no}: duplicate '-- migrate:down' directive"),
                    ));
                }
                down = Some((offset, parse_options(raw, path, line_no)?));
            }
            None => {
                if up.is_none() {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with("--") {
                        preamble_has_content = true;
                    }
                }
            }
        }
        offset += line.len();
    }

    let Some((up_start, up_options)) = up else {
        return Err(Error::parse(path, "missing '-- migrate:up' directive"));
    };
    if preamble_has_content {
        warn!("{path}: ignoring content before '-- migrate:up' directive");
    }

    let (up_end, down_section) = match down {
        Some((down_start, down_options)) => (
            down_start,
            Some(MigrationSection {
                sql: contents[down_start..].to_string(),
                options: down_options,
                offset: down_start,
            }),
        ),
        None => (contents.len(), None),
    };

    Ok(ParsedMigration {
        contents: contents.to_string(),
        up: MigrationSection {
            sql: contents[up_start..up_end].to_string(),
            options: up_options,
            offset: up_start,
        },
        down: down_section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<ParsedMigration> {
        parse_migration(contents, "test.sql")
    }

    #[test]
    fn test_parse_up_and_down() {
        let parsed = parse(
            "-- migrate:up\ncreate table users (id serial, name text);\n-- migrate:down\ndrop table users;\n",
        )
        .unwrap();
        assert_eq!(
            parsed.up.sql,
            "-- migrate:up\ncreate table users (id serial, name text);\n"
        );
        assert!(parsed.up.options.transaction);
        let down = parsed.down.unwrap();
        assert_eq!(down.sql, "-- migrate:down\ndrop table users;\n");
        assert!(down.options.transaction);
        assert_eq!(down.offset, 57);
    }

    #[test]
    fn test_parse_up_only() {
        let parsed = parse("-- migrate:up\ncreate table t (id int);\n").unwrap();
        assert!(parsed.down.is_none());
        assert_eq!(parsed.up.sql, parsed.contents);
        assert_eq!(parsed.up.offset, 0);
    }

    #[test]
    fn test_sections_reassemble_to_original() {
        let contents = "-- a comment\n-- migrate:up\nselect 1;\n-- migrate:down\nselect 2;\n";
        let parsed = parse(contents).unwrap();
        let reassembled = format!(
            "{}{}{}",
            &contents[..parsed.up.offset],
            parsed.up.sql,
            parsed.down.as_ref().map(|d| d.sql.as_str()).unwrap_or("")
        );
        assert_eq!(reassembled, contents);
    }

    #[test]
    fn test_directive_without_space_and_indented() {
        let parsed = parse("  -- migrate:up\nselect 1;\n--migrate:down\nselect 2;\n").unwrap();
        assert_eq!(parsed.up.sql, "  -- migrate:up\nselect 1;\n");
        assert_eq!(parsed.down.unwrap().sql, "--migrate:down\nselect 2;\n");
    }

    #[test]
    fn test_crlf_endings_preserved() {
        let parsed = parse("-- migrate:up\r\nselect 1;\r\n-- migrate:down\r\nselect 2;\r\n").unwrap();
        assert_eq!(parsed.up.sql, "-- migrate:up\r\nselect 1;\r\n");
        assert_eq!(parsed.down.unwrap().offset, 26);
    }

    #[test]
    fn test_transaction_option() {
        let parsed = parse(
            "-- migrate:up transaction:false\nselect 1;\n-- migrate:down transaction:true\nselect 2;\n",
        )
        .unwrap();
        assert!(!parsed.up.options.transaction);
        assert!(parsed.down.unwrap().options.transaction);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let err = parse("-- migrate:up lock:true\nselect 1;\n").unwrap_err();
        assert!(err.to_string().contains("unknown option 'lock'"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_malformed_option_is_rejected() {
        let err = parse("-- migrate:up transaction\nselect 1;\n").unwrap_err();
        assert!(err.to_string().contains("malformed option"));
    }

    #[test]
    fn test_invalid_transaction_value() {
        let err = parse("-- migrate:up transaction:maybe\nselect 1;\n").unwrap_err();
        assert!(err.to_string().contains("invalid value 'maybe'"));
    }

    #[test]
    fn test_missing_up_directive() {
        let err = parse("select 1;\n").unwrap_err();
        assert!(err.to_string().contains("missing '-- migrate:up'"));
        let err = parse("").unwrap_err();
        assert!(err.to_string().contains("missing '-- migrate:up'"));
    }

    #[test]
    fn test_down_before_up() {
        let err = parse("-- migrate:down\nselect 1;\n-- migrate:up\n").unwrap_err();
        assert!(err.to_string().contains("before '-- migrate:up'"));
    }

    #[test]
    fn test_duplicate_directives() {
        let err = parse("-- migrate:up\n-- migrate:up\n").unwrap_err();
        assert!(err.to_string().contains("duplicate '-- migrate:up'"));
        let err = parse("-- migrate:up\n-- migrate:down\n-- migrate:down\n").unwrap_err();
        assert!(err.to_string().contains("duplicate '-- migrate:down'"));
    }

    #[test]
    fn test_similar_comment_is_not_a_directive() {
        let parsed = parse("-- migrate:up\n-- migrate:upgrade notes below\nselect 1;\n").unwrap();
        assert!(parsed.down.is_none());
        assert!(parsed.up.sql.contains("upgrade notes"));
    }

    #[test]
    fn test_preamble_is_excluded_from_up_section() {
        let parsed = parse("select 0;\n-- migrate:up\nselect 1;\n").unwrap();
        assert_eq!(parsed.up.offset, 10);
        assert_eq!(parsed.up.sql, "-- migrate:up\nselect 1;\n");
    }
}
