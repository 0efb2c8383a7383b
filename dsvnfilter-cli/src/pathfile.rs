//! Reads a `--file <path>` path list: one path per line, `#`-comments and
//! blank lines skipped.
//!
//! Grounded on `dsvn-admin-cli/src/main.rs`'s plain `std::fs::File`/
//! `BufReader` usage for the dump file argument, applied here to a
//! line-oriented config file instead of a dump stream.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn read_paths(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("opening path list {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line.with_context(|| format!("reading path list {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        paths.push(trimmed.to_string());
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trunk/foo").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# a comment").unwrap();
        writeln!(file, "  trunk/bar  ").unwrap();
        let paths = read_paths(file.path()).unwrap();
        assert_eq!(paths, vec!["trunk/foo".to_string(), "trunk/bar".to_string()]);
    }
}
