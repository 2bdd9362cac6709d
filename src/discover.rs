//! Project-wide test discovery.
//!
//! Combines:
//! - File walking ([`crate::walker`])
//! - Tree-sitter parsing and tree building ([`crate::builder`])
//! - Parallel file processing (rayon)

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::abort::AbortSignal;
use crate::builder::TestTreeBuilder;
use crate::config::Config;
use crate::parser;
use crate::types::{self, TestTreeNode};
use crate::walker::Walker;

/// Declarations found in one test file.
#[derive(Debug, Clone, Serialize)]
pub struct FileTests {
    #[serde(skip)]
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub file: String,
    #[serde(skip)]
    pub source: String,
    pub nodes: Vec<TestTreeNode>,
}

/// Result of a [`scan`].
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Files with at least one declaration, sorted by path.
    pub files: Vec<FileTests>,
    pub suite_count: usize,
    pub test_count: usize,
    /// Wall-clock elapsed time.
    pub elapsed: Duration,
}

/// Discover every test file under `root` and build its declaration tree.
///
/// Files that cannot be read or parsed are logged and skipped, as are files
/// that declare nothing.
pub fn scan(root: &Path, config: &Config, signal: &AbortSignal) -> Result<ScanReport> {
    let start = Instant::now();

    let paths = Walker::new(root)
        .include(config.discovery.patterns.iter().cloned())
        .exclude(config.discovery.exclude.iter().cloned())
        .collect_paths()?;
    debug!(candidates = paths.len(), root = %root.display(), "walked test files");

    let files: Vec<FileTests> = paths
        .par_iter()
        .filter_map(|path| scan_one_file(path, root, signal))
        .collect();

    let (suite_count, test_count) = files.iter().fold((0, 0), |(s, t), f| {
        let (fs, ft) = types::count(&f.nodes);
        (s + fs, t + ft)
    });

    let report = ScanReport {
        files,
        suite_count,
        test_count,
        elapsed: start.elapsed(),
    };
    debug!(
        files = report.files.len(),
        suites = report.suite_count,
        tests = report.test_count,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "scan finished"
    );
    Ok(report)
}

/// Parse a single file. Returns `None` for unsupported, unreadable, or
/// declaration-free files.
fn scan_one_file(path: &Path, root: &Path, signal: &AbortSignal) -> Option<FileTests> {
    if signal.is_aborted() {
        return None;
    }
    let lang = parser::detect_language(path)?;

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            warn!(path = %path.display(), %err, "skipping unreadable file");
            return None;
        }
    };

    // Parsers are not Sync, so each file gets its own.
    let mut ts_parser = match parser::get_parser(lang) {
        Ok(p) => p,
        Err(err) => {
            warn!(path = %path.display(), %err, "skipping file");
            return None;
        }
    };
    let nodes = match TestTreeBuilder::build(&mut ts_parser, &source, signal) {
        Ok(nodes) => nodes,
        Err(err) => {
            warn!(path = %path.display(), %err, "skipping file");
            return None;
        }
    };
    if nodes.is_empty() {
        return None;
    }

    let file = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");

    Some(FileTests {
        path: path.to_path_buf(),
        file,
        source,
        nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let p = root.join(relative);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, content).unwrap();
    }

    #[test]
    fn scans_matching_files_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "src/math.test.ts",
            "describe('math', () => {\n  it('adds', () => {});\n  it('subs', () => {});\n});\n",
        );
        write(dir.path(), "src/io.spec.ts", "test('reads', () => {});\n");
        write(dir.path(), "src/math.ts", "test('not a test file', () => {});\n");
        write(dir.path(), "src/empty.test.ts", "export const x = 1;\n");

        let report = scan(dir.path(), &Config::default(), &AbortSignal::never()).unwrap();
        let files: Vec<&str> = report.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, ["src/io.spec.ts", "src/math.test.ts"]);
        assert_eq!(report.suite_count, 1);
        assert_eq!(report.test_count, 3);
    }

    #[test]
    fn honors_configured_patterns_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.test.js", "it('a', () => {});\n");
        write(dir.path(), "fixtures/b.test.js", "it('b', () => {});\n");
        write(dir.path(), "c.test.ts", "it('c', () => {});\n");

        let mut config = Config::default();
        config.discovery.patterns = vec!["**/*.test.js".into()];
        config.discovery.exclude = vec!["fixtures/**".into()];

        let report = scan(dir.path(), &config, &AbortSignal::never()).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].file, "a.test.js");
        assert_eq!(report.files[0].nodes[0].name(), "a");
    }

    #[test]
    fn aborted_scan_finds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.test.ts", "it('a', () => {});\n");

        let controller = AbortController::new();
        controller.abort();
        let report = scan(dir.path(), &Config::default(), &controller.signal()).unwrap();
        assert!(report.files.is_empty());
        assert_eq!(report.test_count, 0);
    }
}
