use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use vitest_lens::abort::AbortSignal;
use vitest_lens::builder::{TestTreeBuilder, contains_declarations};
use vitest_lens::color::resolve_color;
use vitest_lens::config::{Config, find_project_root};
use vitest_lens::discover::{self, FileTests};
use vitest_lens::errors::{EXIT_ERROR, EXIT_SUCCESS, LensError};
use vitest_lens::explorer::{self, LineIndex};
use vitest_lens::output::{self, Formatter};
use vitest_lens::parser::{self, get_parser, require_language};
use vitest_lens::runner::{Invocation, RunMode};
use vitest_lens::types::{self, TestTreeNode};

use crate::cli::{CheckArgs, Cli, CmdArgs, Command, FileArgs, ScanArgs};

/// Run the parsed command and return the process exit code.
pub fn dispatch(cli: Cli) -> Result<i32, LensError> {
    let config_start = match &cli.command {
        Command::Scan(args) => args.path.clone(),
        Command::Tree(FileArgs { file }) | Command::Items(FileArgs { file }) => parent_dir(file),
        Command::Cmd(args) => parent_dir(&args.file),
        Command::Check(args) => args.files.first().map(|f| parent_dir(f)).unwrap_or_default(),
    };
    let config = load_config(&config_start)?;
    let json = cli.json || config.json_by_default();
    let color = !json && resolve_color(&config.output.color);

    let stdout = std::io::stdout();
    let mut fmt = Formatter::new(stdout.lock(), json, color);

    match cli.command {
        Command::Tree(args) => cmd_tree(&mut fmt, &args),
        Command::Check(args) => cmd_check(&mut fmt, &args),
        Command::Scan(args) => cmd_scan(&mut fmt, &args, &config, json),
        Command::Items(args) => cmd_items(&mut fmt, &args),
        Command::Cmd(args) => cmd_invocation(&mut fmt, &args, &config),
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn load_config(start: &Path) -> Result<Config, LensError> {
    let start = if start.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        std::path::absolute(start)?
    };
    let root = find_project_root(&start);
    debug!(root = ?root, "loading config");
    Ok(Config::load(root.as_deref())?)
}

/// Read a file, keeping the path in the error message.
fn read_source(path: &Path) -> Result<String, LensError> {
    std::fs::read_to_string(path)
        .map_err(|e| LensError::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))))
}

/// Parse one file into its declaration tree.
fn load_file_tests(path: &Path) -> Result<FileTests, LensError> {
    let lang = require_language(path)?;
    let source = read_source(path)?;
    let mut ts_parser = get_parser(lang)?;
    let nodes = TestTreeBuilder::build(&mut ts_parser, &source, &AbortSignal::never())?;
    let (suites, tests) = types::count(&nodes);
    debug!(path = %path.display(), lang = lang.name(), suites, tests, "built declaration tree");
    Ok(FileTests {
        path: path.to_path_buf(),
        file: path.to_string_lossy().into_owned(),
        source,
        nodes,
    })
}

fn cmd_tree<W: Write>(fmt: &mut Formatter<W>, args: &FileArgs) -> Result<i32, LensError> {
    let file = load_file_tests(&args.file)?;
    fmt.format_file_tests(&file)?;
    Ok(EXIT_SUCCESS)
}

/// Exit successfully when at least one file declares something.
fn cmd_check<W: Write>(fmt: &mut Formatter<W>, args: &CheckArgs) -> Result<i32, LensError> {
    let mut any = false;
    for path in &args.files {
        let found = match check_file(path) {
            Ok(found) => found,
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot check file");
                false
            }
        };
        any |= found;
        fmt.format_check(&path.to_string_lossy(), found)?;
    }
    Ok(if any { EXIT_SUCCESS } else { EXIT_ERROR })
}

fn check_file(path: &Path) -> Result<bool, LensError> {
    let lang = require_language(path)?;
    let source = read_source(path)?;
    let mut ts_parser = get_parser(lang)?;
    let tree = parser::parse_source(&mut ts_parser, &source)?;
    Ok(contains_declarations(&tree, &source))
}

fn cmd_scan<W: Write>(
    fmt: &mut Formatter<W>,
    args: &ScanArgs,
    config: &Config,
    json: bool,
) -> Result<i32, LensError> {
    if !args.path.is_dir() {
        return Err(LensError::Usage(format!(
            "not a directory: {}",
            args.path.display()
        )));
    }
    let report = discover::scan(&args.path, config, &AbortSignal::never())?;
    fmt.format_scan(&report)?;
    output::print_scan_summary(&report, json);
    Ok(EXIT_SUCCESS)
}

fn cmd_items<W: Write>(fmt: &mut Formatter<W>, args: &FileArgs) -> Result<i32, LensError> {
    let file = load_file_tests(&args.file)?;
    let items = explorer::mirror(&file.file, &file.source, &file.nodes);
    fmt.format_items(&items)?;
    Ok(EXIT_SUCCESS)
}

fn cmd_invocation<W: Write>(
    fmt: &mut Formatter<W>,
    args: &CmdArgs,
    config: &Config,
) -> Result<i32, LensError> {
    require_language(&args.file)?;
    let name = match (&args.name, args.line) {
        (Some(name), _) => name.clone(),
        (None, Some(line)) => {
            let file = load_file_tests(&args.file)?;
            declaration_at_line(&file, line)
                .map(|node| node.name().to_string())
                .ok_or_else(|| LensError::NoDeclaration(format!("at line {line}")))?
        }
        (None, None) => {
            return Err(LensError::Usage("either a name or --line is required".into()));
        }
    };

    let mode = if args.watch { RunMode::Watch } else { RunMode::Run };
    let case_path = std::path::absolute(&args.file)?;
    let invocation = Invocation::for_case(&config.runner, &case_path, &name, mode);
    fmt.format_invocation(&name, &invocation)?;
    Ok(EXIT_SUCCESS)
}

/// Innermost declaration covering the first non-blank character of a
/// one-based `line`.
fn declaration_at_line(file: &FileTests, line: usize) -> Option<&TestTreeNode> {
    let index = LineIndex::new(&file.source);
    let start = index.line_start(line.checked_sub(1)?)?;
    let indent = file.source[start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    types::find_at(&file.nodes, start + indent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(source: &str) -> FileTests {
        let mut ts_parser = get_parser(parser::Lang::TypeScript).unwrap();
        let nodes = TestTreeBuilder::build(&mut ts_parser, source, &AbortSignal::never()).unwrap();
        FileTests {
            path: PathBuf::from("a.test.ts"),
            file: "a.test.ts".into(),
            source: source.into(),
            nodes,
        }
    }

    #[test]
    fn line_lookup_picks_innermost() {
        let f = file("describe('S', () => {\n\n  it('A', () => {\n    expect(1).toBe(1);\n  });\n});\n");
        assert_eq!(declaration_at_line(&f, 1).unwrap().name(), "S");
        assert_eq!(declaration_at_line(&f, 2).unwrap().name(), "S");
        assert_eq!(declaration_at_line(&f, 3).unwrap().name(), "A");
        assert_eq!(declaration_at_line(&f, 4).unwrap().name(), "A");
        assert_eq!(declaration_at_line(&f, 5).unwrap().name(), "A");
        assert_eq!(declaration_at_line(&f, 6).unwrap().name(), "S");
    }

    #[test]
    fn line_lookup_outside_declarations() {
        let f = file("const x = 1;\nit('A', () => {});\n");
        assert!(declaration_at_line(&f, 0).is_none());
        assert!(declaration_at_line(&f, 1).is_none());
        assert_eq!(declaration_at_line(&f, 2).unwrap().name(), "A");
        assert!(declaration_at_line(&f, 3).is_none());
        assert!(declaration_at_line(&f, 99).is_none());
    }
}
