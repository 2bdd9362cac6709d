//! Vitest invocation building.
//!
//! Turns a declaration name and its file into the command line that runs
//! exactly that declaration. Nothing here spawns processes; callers decide
//! how to execute the [`Invocation`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::RunnerConfig;

/// File names that mark the root of a vitest project.
pub const CONFIG_FILES: &[&str] = &[
    "vitest.config.ts",
    "vitest.config.mts",
    "vitest.config.cts",
    "vitest.config.js",
    "vitest.config.mjs",
    "vitest.config.cjs",
    "vitest.workspace.ts",
    "vitest.workspace.js",
    "vitest.workspace.json",
    "vite.config.ts",
    "vite.config.mts",
    "vite.config.cts",
    "vite.config.js",
    "vite.config.mjs",
    "vite.config.cjs",
];

/// Whether vitest runs once or keeps watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Run,
    Watch,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Run => "run",
            RunMode::Watch => "watch",
        }
    }
}

/// Inputs to [`build_args`].
#[derive(Debug, Clone)]
pub struct ArgsOptions<'a> {
    /// Name pattern of the declaration (wildcards already applied).
    pub case_name: &'a str,
    pub case_path: &'a Path,
    pub mode: RunMode,
    /// Append `--root <dir>` when a config root is found.
    pub add_root: bool,
    /// JSON-quote the name and path, for pasting into a shell.
    pub sanitize: bool,
}

/// Nearest ancestor directory of `file` that holds a vitest/vite config.
pub fn find_root(file: &Path) -> Option<PathBuf> {
    let start = file.parent()?;
    start
        .ancestors()
        .find(|dir| CONFIG_FILES.iter().any(|name| dir.join(name).is_file()))
        .map(Path::to_path_buf)
}

/// `node_modules/.bin/vitest` in the nearest ancestor that has one.
pub fn find_local_runner(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|d| d.join("node_modules").join(".bin").join("vitest"))
        .find(|candidate| candidate.is_file())
}

/// Build `vitest <mode> --testNamePattern <name> <path> [--root <dir>]`.
pub fn build_args(options: &ArgsOptions<'_>) -> Vec<String> {
    let path = options.case_path.to_string_lossy();
    let (name, path) = if options.sanitize {
        (json_quote(options.case_name), json_quote(&path))
    } else {
        (options.case_name.to_string(), path.into_owned())
    };

    let mut args = vec![
        "vitest".to_string(),
        options.mode.as_str().to_string(),
        "--testNamePattern".to_string(),
        name,
        path,
    ];

    if options.add_root
        && let Some(root) = find_root(options.case_path)
    {
        args.push("--root".to_string());
        args.push(root.to_string_lossy().into_owned());
    }

    args
}

fn json_quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Resolve the command that runs `case_name` in `case_path`.
    ///
    /// A project-local `node_modules/.bin/vitest` takes precedence over the
    /// configured command prefix.
    pub fn for_case(config: &RunnerConfig, case_path: &Path, case_name: &str, mode: RunMode) -> Self {
        let file_dir = case_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let cwd = find_root(case_path).unwrap_or_else(|| file_dir.clone());

        let mut args = build_args(&ArgsOptions {
            case_name,
            case_path,
            mode,
            add_root: config.add_root,
            sanitize: false,
        });

        let program = match find_local_runner(&file_dir) {
            Some(local) => {
                args.remove(0);
                local.to_string_lossy().into_owned()
            }
            None => {
                let mut prefix = config.command.iter().cloned();
                let program = prefix.next().unwrap_or_else(|| "npx".to_string());
                let rest: Vec<String> = prefix.collect();
                args.splice(0..0, rest);
                program
            }
        };

        Self { program, args, cwd }
    }
}

impl fmt::Display for Invocation {
    /// Render as a single shell line, quoting arguments where needed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
