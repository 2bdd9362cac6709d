//! File walker with gitignore support and default exclusions.
//!
//! Wraps the `ignore` crate's `WalkBuilder` to provide a file walker that:
//! - Respects `.gitignore` rules
//! - Skips dependency and build-output directories by default
//! - Skips hidden files/directories
//! - Keeps only files matching the configured include globs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use tracing::warn;

/// Directories that are always excluded from walks, regardless of `.gitignore`.
const DEFAULT_EXCLUSIONS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "coverage",
    "out",
    ".next",
    ".turbo",
];

/// A file-system walker that respects `.gitignore`, applies default
/// exclusions, and yields only files matching the include globs.
pub struct Walker {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Walker {
    /// Create a new walker rooted at the given path. Without include globs,
    /// every non-excluded file is yielded.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Only yield files matching at least one of these globs.
    pub fn include<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(globs.into_iter().map(Into::into));
        self
    }

    /// Skip paths matching these globs, in addition to the defaults.
    pub fn exclude<I, S>(mut self, globs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(globs.into_iter().map(Into::into));
        self
    }

    /// Build the override matcher.
    ///
    /// In the overrides system a glob WITHOUT `!` whitelists files (and
    /// anything not whitelisted is skipped), while a glob WITH `!` excludes.
    fn make_overrides(&self) -> Result<Override> {
        let mut overrides = OverrideBuilder::new(&self.root);
        for glob in &self.include {
            overrides
                .add(glob)
                .with_context(|| format!("invalid include glob: {glob}"))?;
        }
        for dir in DEFAULT_EXCLUSIONS {
            overrides
                .add(&format!("!{dir}/"))
                .context("default exclusion pattern should be valid")?;
        }
        for glob in &self.exclude {
            overrides
                .add(&format!("!{glob}"))
                .with_context(|| format!("invalid exclude glob: {glob}"))?;
        }
        overrides.build().context("failed to build path filters")
    }

    fn make_builder(&self) -> Result<WalkBuilder> {
        let mut builder = WalkBuilder::new(&self.root);
        builder.standard_filters(true);
        builder.overrides(self.make_overrides()?);
        Ok(builder)
    }

    /// Walk the file tree and collect matching file paths, sorted.
    pub fn collect_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for result in self.make_builder()?.build() {
            let entry = match result {
                Ok(e) => e,
                Err(err) => {
                    warn!(%err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|ft| ft.is_file()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: create a temporary directory tree for testing.
    struct TestDir {
        dir: tempfile::TempDir,
    }

    impl TestDir {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Create a file (and any necessary parent directories).
        fn create_file(&self, relative: &str) {
            let p = self.dir.path().join(relative);
            if let Some(parent) = p.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&p, "content").unwrap();
        }
    }

    /// Collect paths relative to the test root.
    fn relative(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|p| {
                p.strip_prefix(root)
                    .ok()
                    .map(|r| r.to_string_lossy().replace('\\', "/"))
            })
            .collect()
    }

    #[test]
    fn include_globs_select_test_files() {
        let td = TestDir::new();
        td.create_file("src/math.ts");
        td.create_file("src/math.test.ts");
        td.create_file("src/deep/io.spec.ts");
        td.create_file("README.md");

        let walker = Walker::new(td.path()).include(["**/*.test.ts", "**/*.spec.ts"]);
        let rel = relative(td.path(), &walker.collect_paths().unwrap());
        assert_eq!(rel, ["src/deep/io.spec.ts", "src/math.test.ts"]);
    }

    #[test]
    fn skips_default_exclusions() {
        let td = TestDir::new();
        td.create_file("a.test.ts");
        td.create_file("node_modules/pkg/b.test.ts");
        td.create_file("dist/c.test.ts");
        td.create_file("coverage/d.test.ts");

        let walker = Walker::new(td.path()).include(["**/*.test.ts"]);
        let rel = relative(td.path(), &walker.collect_paths().unwrap());
        assert_eq!(rel, ["a.test.ts"]);
    }

    #[test]
    fn skips_hidden_directories() {
        let td = TestDir::new();
        td.create_file("a.test.ts");
        td.create_file(".cache/b.test.ts");

        let rel = relative(td.path(), &Walker::new(td.path()).collect_paths().unwrap());
        assert_eq!(rel, ["a.test.ts"]);
    }

    #[test]
    fn respects_gitignore() {
        let td = TestDir::new();
        // The ignore crate only respects .gitignore inside a git repository.
        fs::create_dir(td.path().join(".git")).unwrap();
        td.create_file("keep.test.ts");
        td.create_file("generated/skip.test.ts");
        fs::write(td.path().join(".gitignore"), "generated/\n").unwrap();

        let walker = Walker::new(td.path()).include(["**/*.test.ts"]);
        let rel = relative(td.path(), &walker.collect_paths().unwrap());
        assert_eq!(rel, ["keep.test.ts"]);
    }

    #[test]
    fn extra_exclusions() {
        let td = TestDir::new();
        td.create_file("src/a.test.ts");
        td.create_file("fixtures/b.test.ts");

        let walker = Walker::new(td.path())
            .include(["**/*.test.ts"])
            .exclude(["fixtures/**"]);
        let rel = relative(td.path(), &walker.collect_paths().unwrap());
        assert_eq!(rel, ["src/a.test.ts"]);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let td = TestDir::new();
        let err = Walker::new(td.path()).include(["src/[bad"]).collect_paths().unwrap_err();
        assert!(format!("{err:#}").contains("invalid include glob"));
    }
}
