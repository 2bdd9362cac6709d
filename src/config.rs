//! Configuration file parsing, defaults, and merging.
//!
//! Configuration is loaded in layers (last wins):
//! 1. Built-in defaults
//! 2. Global config from `~/.vitest-lens/config.toml`
//! 3. Per-project config from `<root>/.vitest-lens/config.toml`
//!
//! Each layer only overrides fields it explicitly sets; absent fields
//! are left at their previous value.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the per-user and per-project config directory.
pub const CONFIG_DIR: &str = ".vitest-lens";

// ---------------------------------------------------------------------------
// Public config types (fully resolved, no Options)
// ---------------------------------------------------------------------------

/// Top-level configuration, fully resolved with defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub runner: RunnerConfig,
    pub output: OutputConfig,
}

/// Which files `scan` treats as test files.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Glob patterns a test file must match.
    pub patterns: Vec<String>,
    /// Extra glob patterns to exclude on top of the built-in exclusions.
    pub exclude: Vec<String>,
}

/// How runner invocations are built.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Program and leading arguments placed before the vitest arguments.
    pub command: Vec<String>,
    /// Pass `--root <dir>` when a vitest config file is found.
    pub add_root: bool,
}

/// Output / display settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Default output format: `"text"` or `"json"`.
    pub format: String,
    /// Color mode: `"auto"`, `"always"`, or `"never"`.
    pub color: String,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.test.ts".to_string(), "**/*.spec.ts".to_string()],
            exclude: Vec::new(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".to_string()],
            add_root: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            color: "auto".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Option-based overlay types (for partial deserialization)
// ---------------------------------------------------------------------------

/// Mirror of [`Config`] where every field is `Option`, so we can
/// deserialize a partial TOML file and overlay only the keys that are
/// present.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigOverlay {
    discovery: Option<DiscoveryOverlay>,
    runner: Option<RunnerOverlay>,
    output: Option<OutputOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiscoveryOverlay {
    patterns: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RunnerOverlay {
    command: Option<Vec<String>>,
    add_root: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputOverlay {
    format: Option<String>,
    color: Option<String>,
}

// ---------------------------------------------------------------------------
// Merge helpers
// ---------------------------------------------------------------------------

impl Config {
    /// Apply an overlay on top of this config, replacing only the fields
    /// that are `Some` in the overlay.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(d) = overlay.discovery {
            if let Some(v) = d.patterns {
                self.discovery.patterns = v;
            }
            if let Some(v) = d.exclude {
                self.discovery.exclude = v;
            }
        }
        if let Some(r) = overlay.runner {
            // An empty command would leave nothing to execute.
            if let Some(v) = r.command.filter(|c| !c.is_empty()) {
                self.runner.command = v;
            }
            if let Some(v) = r.add_root {
                self.runner.add_root = v;
            }
        }
        if let Some(out) = overlay.output {
            if let Some(v) = out.format {
                self.output.format = v;
            }
            if let Some(v) = out.color {
                self.output.color = v;
            }
        }
    }

    /// Whether JSON output is the configured default.
    pub fn json_by_default(&self) -> bool {
        self.output.format == "json"
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Return the user's home directory.
fn home_dir() -> Option<PathBuf> {
    #[allow(deprecated)]
    std::env::home_dir()
}

/// Parse a TOML string into a [`ConfigOverlay`], producing a clear error
/// message on malformed input.
fn parse_overlay(contents: &str, path: &Path) -> Result<ConfigOverlay> {
    toml::from_str(contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Try to read a config file and parse it as an overlay.
/// Returns `Ok(None)` if the file does not exist.
fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let overlay = parse_overlay(&contents, path)?;
            Ok(Some(overlay))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config file {}: {}",
            path.display(),
            e
        )),
    }
}

impl Config {
    /// Load configuration by merging layers:
    /// defaults -> global (`~/.vitest-lens/config.toml`) -> per-project
    /// (`<root>/.vitest-lens/config.toml`).
    pub fn load(project_root: Option<&Path>) -> Result<Config> {
        let global_dir = home_dir().map(|h| h.join(CONFIG_DIR));
        Self::load_with_global_dir(global_dir.as_deref(), project_root)
    }

    /// Internal: load config with an explicit global config directory, so
    /// tests can use a temporary directory instead of the real home.
    fn load_with_global_dir(
        global_dir: Option<&Path>,
        project_root: Option<&Path>,
    ) -> Result<Config> {
        let mut config = Config::default();

        if let Some(dir) = global_dir
            && let Some(overlay) = load_overlay(&dir.join("config.toml"))?
        {
            config.apply_overlay(overlay);
        }

        if let Some(root) = project_root
            && let Some(overlay) = load_overlay(&root.join(CONFIG_DIR).join("config.toml"))?
        {
            config.apply_overlay(overlay);
        }

        Ok(config)
    }
}

/// Find the nearest ancestor of `start` containing a project marker: a
/// `.vitest-lens` directory, `package.json`, or `.git`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            dir.join(CONFIG_DIR).is_dir() || dir.join("package.json").is_file() || dir.join(".git").exists()
        })
        .map(Path::to_path_buf)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
