//! Env file reading.
//!
//! Files use the dotenv dialect: `KEY=VALUE` (or `KEY: VALUE`) lines, `#`
//! comments, optional `export` prefix and quoted values. Every physical line
//! stands alone: a line that does not parse is skipped and never affects its
//! neighbours. Values are taken literally, `$VAR` is not expanded.
//!
//! A file that cannot be read at all yields an error the caller may ignore.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Error reading an env file that exists.
#[derive(Debug, thiserror::Error)]
#[error("failed to read env file {}: {source}", path.display())]
pub struct EnvFileError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Read `path` into a key/value map.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_env_file(path: &Path) -> Result<Option<HashMap<String, String>>, EnvFileError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| EnvFileError {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(parse_env(&contents, path)))
}

/// Parse env file contents. Later declarations of a key win.
fn parse_env(contents: &str, path: &Path) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for (index, line) in contents.lines().enumerate() {
        match parse_line(line) {
            Some((key, value)) => {
                vars.insert(key.to_string(), value);
            }
            None if is_blank_or_comment(line) => {}
            None => {
                tracing::debug!(
                    path = %path.display(),
                    line = index + 1,
                    "Ignoring malformed env file line"
                );
            }
        }
    }
    vars
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

fn parse_line(line: &str) -> Option<(&str, String)> {
    let line = line.trim_start();
    let line = strip_export(line);

    let key_len = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'))
        .unwrap_or(line.len());
    if key_len == 0 {
        return None;
    }
    let (key, rest) = line.split_at(key_len);

    let value = if let Some(after) = rest.trim_start().strip_prefix('=') {
        after
    } else {
        // `KEY: value` needs whitespace after the colon.
        let after = rest.strip_prefix(':')?;
        if !after.starts_with(char::is_whitespace) {
            return None;
        }
        after
    };

    Some((key, parse_value(value)))
}

fn strip_export(line: &str) -> &str {
    match line.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => line,
    }
}

fn parse_value(raw: &str) -> String {
    let raw = raw.trim_start();

    if let Some(quoted) = quoted_value(raw) {
        return quoted;
    }

    // Unquoted, or a quote that is never closed on this line: the value runs
    // up to a comment and is taken as written.
    let end = raw.find('#').unwrap_or(raw.len());
    raw[..end].trim().to_string()
}

/// A value wrapped in `'`, `"` or `` ` `` followed only by an optional
/// comment. Double-quoted values expand `\n` and `\r`.
fn quoted_value(raw: &str) -> Option<String> {
    let quote = raw.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'))?;
    let body = &raw[1..];

    let mut escaped = false;
    let close = body.char_indices().find_map(|(i, c)| {
        if escaped {
            escaped = false;
            None
        } else if c == '\\' {
            escaped = true;
            None
        } else if c == quote {
            Some(i)
        } else {
            None
        }
    })?;

    let trailing = body[close + 1..].trim_start();
    if !(trailing.is_empty() || trailing.starts_with('#')) {
        return None;
    }

    let inner = &body[..close];
    if quote == '"' {
        Some(inner.replace("\\n", "\n").replace("\\r", "\r"))
    } else {
        Some(inner.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> HashMap<String, String> {
        parse_env(contents, Path::new(".env"))
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_env_file(&dir.path().join(".env")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_reads_pairs_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# local overrides\nVITE_PORT=5173\nexport VITE_WEB_SERVER=\"10.0.0.5\"\n",
        )
        .unwrap();

        let vars = read_env_file(&path).unwrap().unwrap();
        assert_eq!(vars.get("VITE_PORT").map(String::as_str), Some("5173"));
        assert_eq!(vars.get("VITE_WEB_SERVER").map(String::as_str), Some("10.0.0.5"));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::create_dir(&path).unwrap();

        assert!(read_env_file(&path).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, b"VITE_WEB_SERVER=\xff\xfe\n").unwrap();

        assert!(read_env_file(&path).is_err());
    }

    #[test]
    fn test_unterminated_quote_only_affects_its_line() {
        let vars = parse("VITE_TITLE=\"my app\nVITE_WEB_SERVER=10.0.0.7\n");

        assert_eq!(vars.get("VITE_TITLE").map(String::as_str), Some("\"my app"));
        assert_eq!(vars.get("VITE_WEB_SERVER").map(String::as_str), Some("10.0.0.7"));
    }

    #[test]
    fn test_dollar_values_are_literal() {
        let vars = parse("VITE_WEB_SERVER=$DEV_ALLOWLIST_LAN,10.0.0.8\nB='${HOME}'\n");

        assert_eq!(
            vars.get("VITE_WEB_SERVER").map(String::as_str),
            Some("$DEV_ALLOWLIST_LAN,10.0.0.8")
        );
        assert_eq!(vars.get("B").map(String::as_str), Some("${HOME}"));
    }

    #[test]
    fn test_quotes_and_inline_comments() {
        let vars = parse(
            "A=10.0.0.1 # office\n\
             B=\" 10.0.0.2 , 10.0.0.3 \" # spaced\n\
             C='a#b'\n\
             D=\"line\\nbreak\"\n\
             E=\"a\" junk\n\
             F=\n\
             G: 10.0.0.4\n\
             H:10.0.0.5\n",
        );

        assert_eq!(vars["A"], "10.0.0.1");
        assert_eq!(vars["B"], " 10.0.0.2 , 10.0.0.3 ");
        assert_eq!(vars["C"], "a#b");
        assert_eq!(vars["D"], "line\nbreak");
        assert_eq!(vars["E"], "\"a\" junk");
        assert_eq!(vars["F"], "");
        assert_eq!(vars["G"], "10.0.0.4");
        assert!(!vars.contains_key("H"));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let vars = parse("not a declaration\n=10.0.0.1\nexport\nexported=1\nLAST=2\nLAST=3\n");

        assert_eq!(vars.len(), 2);
        assert_eq!(vars["exported"], "1");
        assert_eq!(vars["LAST"], "3");
    }
}
