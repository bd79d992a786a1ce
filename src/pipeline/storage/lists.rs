//! Newline-delimited name lists: the candidate list, the blacklist and the manual list.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Names in file order, trimmed, blank lines dropped.
pub fn parse_names(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_names<S: AsRef<str>>(names: &[S]) -> String {
    let mut out = String::new();
    for name in names {
        out.push_str(name.as_ref().trim());
        out.push('\n');
    }
    out
}

pub fn read_names(path: &Path) -> Result<Vec<String>> {
    Ok(parse_names(&fs::read_to_string(path)?))
}

/// Like [`read_names`], but a missing file is an empty list.
pub fn read_names_or_empty(path: &Path) -> Result<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(parse_names(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist, treating as empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_skips_blanks() {
        assert_eq!(
            parse_names("  WASP-12 \n\n\tKepler-9\r\n   \n"),
            vec!["WASP-12".to_string(), "Kepler-9".to_string()]
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, format_names(&["HD 1", " HD 2 "])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "HD 1\nHD 2\n");
        assert_eq!(read_names(&path).unwrap(), vec!["HD 1", "HD 2"]);
    }

    #[test]
    fn test_missing_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.txt");
        assert!(read_names(&path).is_err());
        assert!(read_names_or_empty(&path).unwrap().is_empty());
    }
}
