//! Architectural Enforcement Integration Tests
//!
//! Source scanners shared by the enforcement tests in `tests/`:
//! - No sleep() calls in production code
//! - No blocking I/O inside async functions
//!
//! The scanners are line based. They understand enough Rust layout to tell
//! test code and async functions apart, which is all the rules need.

use std::path::{Path, PathBuf};

/// Production source trees, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["conductor/core/src", "surface/src"];

/// Workspace root, derived from this package's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// A loaded source file
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: PathBuf,
    /// File contents split into lines
    pub lines: Vec<String>,
}

impl SourceFile {
    /// Code part of line `idx`, with any trailing `//` comment removed
    pub fn code(&self, idx: usize) -> &str {
        strip_comment(&self.lines[idx])
    }

    /// Whether line `idx` is inside test code
    pub fn in_test_code(&self, idx: usize) -> bool {
        in_test_code(&self.lines, idx)
    }

    /// Whether line `idx` is inside an `async fn`
    pub fn in_async_fn(&self, idx: usize) -> bool {
        enclosing_fn(&self.lines, idx).is_some_and(|fn_idx| is_async_signature(&self.lines[fn_idx]))
    }

    /// `path:line - text` for a violation report
    pub fn violation(&self, idx: usize, what: &str) -> String {
        format!(
            "{}:{} - {what}: {}",
            self.path.display(),
            idx + 1,
            self.lines[idx].trim()
        )
    }
}

/// Load every `.rs` file under the production directories
pub fn production_sources() -> Vec<SourceFile> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        let base = root.join(dir);
        assert!(base.exists(), "missing production directory {}", base.display());

        for entry in walkdir::WalkDir::new(&base)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            files.push(SourceFile {
                path: path.strip_prefix(&root).unwrap_or(path).to_path_buf(),
                lines: content.lines().map(str::to_string).collect(),
            });
        }
    }

    files
}

/// Remove a trailing `//` comment
pub fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

fn without_visibility(line: &str) -> &str {
    let line = line.trim();
    for prefix in ["pub(crate) ", "pub(super) ", "pub "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return rest.trim_start();
        }
    }
    line
}

/// Whether a line opens a function definition
pub fn is_fn_signature(line: &str) -> bool {
    let line = without_visibility(line);
    line.starts_with("fn ") || line.starts_with("async fn ")
}

/// Whether a line opens an `async fn`
pub fn is_async_signature(line: &str) -> bool {
    without_visibility(line).starts_with("async fn ")
}

/// Index of the function definition enclosing line `idx`
pub fn enclosing_fn<S: AsRef<str>>(lines: &[S], idx: usize) -> Option<usize> {
    (0..=idx).rev().find(|&i| is_fn_signature(lines[i].as_ref()))
}

/// Whether line `idx` is test code
///
/// True after a `#[cfg(test)] mod` (test modules sit at the end of a file),
/// or inside a function marked `#[test]` / `#[tokio::test]`.
pub fn in_test_code<S: AsRef<str>>(lines: &[S], idx: usize) -> bool {
    let opens_test_module = |pair: &[S]| {
        pair[0].as_ref().trim().starts_with("#[cfg(test)]")
            && without_visibility(pair[1].as_ref()).starts_with("mod ")
    };
    if idx > 0 && lines[..=idx].windows(2).any(opens_test_module) {
        return true;
    }

    let Some(fn_idx) = enclosing_fn(lines, idx) else {
        return false;
    };
    lines[..fn_idx]
        .iter()
        .rev()
        .map(|l| l.as_ref().trim())
        .take_while(|l| l.starts_with("#[") || l.starts_with("///"))
        .any(|l| l.starts_with("#[test]") || l.starts_with("#[tokio::test"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures() {
        assert!(is_fn_signature("    pub fn load() -> Self {"));
        assert!(is_fn_signature("pub(crate) fn now_ms() -> u64 {"));
        assert!(is_async_signature("    pub async fn submit<O>("));
        assert!(!is_async_signature("    fn render(&mut self) {"));
        assert!(!is_fn_signature("    let f = |x| x;"));
    }

    #[test]
    fn test_async_detection() {
        let lines = [
            "async fn bad_function() {",
            "    let contents = std::fs::read_to_string(\"file.txt\")?;",
            "}",
        ];
        assert_eq!(enclosing_fn(&lines, 1), Some(0));
        assert!(is_async_signature(lines[0]));
    }

    #[test]
    fn test_test_code_detection() {
        let lines = [
            "fn production() {}",
            "#[tokio::test]",
            "async fn test_something() {",
            "    std::fs::read_to_string(\"test.txt\");",
            "}",
        ];
        assert!(!in_test_code(&lines, 0));
        assert!(in_test_code(&lines, 3));

        let module = ["fn a() {}", "#[cfg(test)]", "mod tests {", "    fn helper() {}", "}"];
        assert!(!in_test_code(&module, 0));
        assert!(in_test_code(&module, 3));

        let gated_fn = ["#[cfg(test)]", "fn helper() {}", "fn production() {}"];
        assert!(!in_test_code(&gated_fn, 2));
    }
}
