//! `.env` file loading.
//!
//! Values read from the file take precedence over the process environment,
//! matching what `source .env` does in a shell. Keys the file does not
//! define fall back to the process environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a `.env` file.
#[derive(Debug, Error)]
pub enum DotenvError {
    #[error("Environment file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Key/value pairs from a `.env` file layered over the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
    inherit: bool,
}

impl EnvFile {
    /// Load and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self, DotenvError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DotenvError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(DotenvError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let vars = parse(&content)?.into_iter().collect();
        tracing::debug!(path = %path.display(), "Loaded environment file");

        Ok(Self {
            vars,
            inherit: true,
        })
    }

    /// Build from explicit pairs without falling back to the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            inherit: false,
        }
    }

    /// Look up a key: file first, then the process environment.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.vars.get(key) {
            return Some(value.clone());
        }
        if self.inherit {
            return std::env::var(key).ok();
        }
        None
    }
}

/// Parse `.env` content into ordered key/value pairs.
///
/// Supported: `KEY=VALUE`, optional `export ` prefix, `#` comment lines,
/// blank lines, single quotes (literal), double quotes (with `\n`, `\"`,
/// `\\` escapes), and ` #` trailing comments after unquoted values.
pub fn parse(content: &str) -> Result<Vec<(String, String)>, DotenvError> {
    let mut pairs = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some((key, rest)) = line.split_once('=') else {
            return Err(DotenvError::Malformed {
                line: line_no,
                reason: "expected KEY=VALUE".to_string(),
            });
        };

        let key = key.trim();
        if !is_valid_key(key) {
            return Err(DotenvError::Malformed {
                line: line_no,
                reason: format!("invalid key '{key}'"),
            });
        }

        let value = parse_value(rest.trim_start(), line_no)?;
        pairs.push((key.to_string(), value));
    }

    Ok(pairs)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_value(rest: &str, line: usize) -> Result<String, DotenvError> {
    let unterminated = || DotenvError::Malformed {
        line,
        reason: "unterminated quoted value".to_string(),
    };

    let (value, tail) = match rest.chars().next() {
        Some('\'') => {
            let body = &rest[1..];
            let end = body.find('\'').ok_or_else(unterminated)?;
            (body[..end].to_string(), &body[end + 1..])
        }
        Some('"') => {
            let body = &rest[1..];
            let mut value = String::new();
            let mut chars = body.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, other)) => value.push(other),
                        None => return Err(unterminated()),
                    },
                    '"' => {
                        end = Some(i);
                        break;
                    }
                    other => value.push(other),
                }
            }
            let end = end.ok_or_else(unterminated)?;
            (value, &body[end + 1..])
        }
        _ => {
            let value = match rest.find(" #") {
                Some(pos) => &rest[..pos],
                None => rest,
            };
            return Ok(value.trim_end().to_string());
        }
    };

    let tail = tail.trim();
    if !tail.is_empty() && !tail.starts_with('#') {
        return Err(DotenvError::Malformed {
            line,
            reason: format!("unexpected text after closing quote: '{tail}'"),
        });
    }

    Ok(value)
}
