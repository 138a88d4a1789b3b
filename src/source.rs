//! Reading request files.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Path argument that stands for standard input.
pub const STDIN_PATH: &str = "-";

/// Reads the file at `path`, or all of stdin when `path` is `-`.
///
/// # Arguments
///
/// * `path` - File to read, or `-`
///
/// # Returns
///
/// The content as UTF-8 text, or the underlying I/O error.
pub fn read_source(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref();
    if path == Path::new(STDIN_PATH) {
        let mut text = String::new();
        io::stdin().lock().read_to_string(&mut text)?;
        return Ok(text);
    }

    log::debug!("reading {}", path.display());
    fs::read_to_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Host: https://serenity.co\r\n\r\nGET /cargo\r\n").unwrap();

        let text = read_source(file.path()).unwrap();
        assert_eq!(text, "Host: https://serenity.co\r\n\r\nGET /cargo\r\n");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(dir.path().join("missing.pie")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
