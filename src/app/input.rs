use std::path::Path;

use anyhow::{Context, Result};

/// Reads one candidate name per line.
pub fn load_candidates(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    Ok(parse_candidates(&content))
}

/// 按行切分（兼容 `\r\n`），去掉首尾空白；空行保留，交给流水线判为畸形
pub fn parse_candidates(content: &str) -> Vec<String> {
    content.lines().map(|l| l.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_and_trims() {
        let names = parse_candidates("a.example.com\r\n  b.example.com \n\nc.other.com\n");
        assert_eq!(
            names,
            vec!["a.example.com", "b.example.com", "", "c.other.com"]
        );
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.txt");
        std::fs::write(&path, "www.example.com\nmail.example.com\n").unwrap();

        let names = load_candidates(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1], "mail.example.com");
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_candidates(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.to_string().contains("failed to open input file"));
    }
}
