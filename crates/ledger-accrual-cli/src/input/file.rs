//! Record and configuration files named on the command line.

use serde::de::DeserializeOwned;
use std::error::Error;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file into `T`.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn Error>> {
    let (resolved, contents) = read_source(path)?;
    serde_json::from_str(&contents).map_err(|e| invalid_contents(&resolved, e))
}

/// Read a YAML file into `T`.
pub fn read_yaml<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn Error>> {
    let (resolved, contents) = read_source(path)?;
    serde_yaml::from_str(&contents).map_err(|e| invalid_contents(&resolved, e))
}

fn invalid_contents(path: &Path, e: impl Display) -> Box<dyn Error> {
    format!("{}: invalid contents: {e}", path.display()).into()
}

fn read_source(path: &str) -> Result<(PathBuf, String), Box<dyn Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("{}: unreadable: {e}", resolved.display()))?;
    Ok((resolved, contents))
}

/// Relative paths resolve against the working directory. The target must be
/// an existing regular file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn Error>> {
    let resolved = std::env::current_dir()?.join(path);
    if !resolved.is_file() {
        let problem = if resolved.exists() {
            "not a regular file"
        } else {
            "no such file"
        };
        return Err(format!("{}: {problem}", resolved.display()).into());
    }
    Ok(resolved)
}
