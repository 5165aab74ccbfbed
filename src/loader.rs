//! Token and proxy file loading

use crate::services::ProxyDescriptor;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read a file and return its trimmed, non-empty lines in order
pub fn load_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load bearer tokens. An empty file is an error: there is nothing to poll.
pub fn load_tokens(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let tokens = load_lines(path)?;
    if tokens.is_empty() {
        anyhow::bail!("No tokens found in {}", path.display());
    }
    Ok(tokens)
}

/// Load and parse proxy descriptors, failing on the first malformed line
pub fn load_proxies(path: impl AsRef<Path>) -> Result<Vec<ProxyDescriptor>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<ProxyDescriptor>()
                .with_context(|| format!("{} line {}", path.display(), i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_lines_are_trimmed_and_blanks_dropped() {
        let file = file_with("  tok-a  \r\n\n\ttok-b\n   \ntok-c");
        let lines = load_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["tok-a", "tok-b", "tok-c"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_tokens("/definitely/not/here/token.txt").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_empty_token_file_is_an_error() {
        let file = file_with("\n  \n");
        let err = load_tokens(file.path()).unwrap_err();
        assert!(err.to_string().contains("No tokens found"));
    }

    #[test]
    fn test_load_proxies() {
        let file = file_with("http://u:p@10.0.0.1:8080\n\nsocks5://u2:p2@10.0.0.2:1080\n");
        let proxies = load_proxies(file.path()).unwrap();
        assert_eq!(proxies.len(), 2);
        assert_eq!(proxies[0].label(), "10.0.0.1:8080");
        assert_eq!(proxies[1].scheme, "socks5");
    }

    #[test]
    fn test_malformed_proxy_reports_line_number() {
        let file = file_with("http://u:p@10.0.0.1:8080\n\n10.0.0.2:3128\n");
        let err = load_proxies(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }
}
