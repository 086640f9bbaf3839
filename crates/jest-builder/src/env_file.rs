//! `.env` loading.
//!
//! The host calls [`load_env_file`] once, before reading [`BuilderConfig`],
//! so variables defined in the workspace's env file reach both the builder
//! configuration and the Jest child process.
//!
//! [`BuilderConfig`]: crate::BuilderConfig

use std::{env, io};

use jest_builder_paths::AbsoluteSystemPath;
use tracing::debug;

use crate::Error;

/// Parses `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed, and matching single or double quotes around
/// the value are removed. Unquoted values lose trailing ` #` comments.
pub fn parse_env_file(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    match value.find(" #") {
        Some(comment) => value[..comment].trim_end(),
        None => value,
    }
}

/// Loads `path` into the process environment without overwriting variables
/// that are already set. A missing file is not an error.
///
/// Returns the names of the variables that were set.
pub fn load_env_file(path: &AbsoluteSystemPath) -> Result<Vec<String>, Error> {
    let contents = match path.read_to_string() {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no env file at {path}");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(Error::EnvFile {
                path: path.to_owned(),
                source,
            })
        }
    };

    let mut loaded = Vec::new();
    for (key, value) in parse_env_file(&contents) {
        if env::var_os(&key).is_none() {
            env::set_var(&key, value);
            loaded.push(key);
        }
    }
    debug!("loaded {} variables from {path}", loaded.len());
    Ok(loaded)
}
