//! Raw records piped on stdin.

use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::{self, Read};

/// Parse JSON piped on stdin. `Ok(None)` when stdin is a terminal or the
/// pipe carries only whitespace, so the caller can report what is missing.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().lock().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(buffer: &str) -> Result<Option<T>, Box<dyn Error>> {
    let body = buffer.trim();
    if body.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| format!("stdin: invalid JSON: {e}").into())
}
