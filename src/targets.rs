//! Target list loading

use std::io;
use std::path::Path;

/// Read the URL list: one target per line, trimmed, blank lines ignored.
pub fn load(path: &Path) -> io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
