use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vitest-lens - find and run vitest declarations without running vitest
#[derive(Parser, Debug)]
#[command(name = "vitest-lens", version, about)]
pub struct Cli {
    /// Output results as JSON Lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the declaration tree of a test file
    Tree(FileArgs),

    /// Report which files declare at least one test or suite
    Check(CheckArgs),

    /// Discover test files under a directory and print their trees
    Scan(ScanArgs),

    /// Print the test-explorer items of a test file
    Items(FileArgs),

    /// Print the vitest command that runs one declaration
    Cmd(CmdArgs),
}

#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Test file to parse
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CmdArgs {
    /// Test file containing the declaration
    pub file: PathBuf,

    /// Declaration name (as printed by `tree`)
    #[arg(conflicts_with = "line", required_unless_present = "line")]
    pub name: Option<String>,

    /// Pick the innermost declaration at this one-based line
    #[arg(long)]
    pub line: Option<usize>,

    /// Use watch mode instead of a single run
    #[arg(long)]
    pub watch: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vitest-lens", "tree", "a.test.ts", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Tree(ref a) if a.file == PathBuf::from("a.test.ts")));
    }

    #[test]
    fn scan_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["vitest-lens", "scan"]).unwrap();
        match cli.command {
            Command::Scan(args) => assert_eq!(args.path, PathBuf::from(".")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn check_requires_a_file() {
        assert!(Cli::try_parse_from(["vitest-lens", "check"]).is_err());
    }

    #[test]
    fn cmd_takes_name_or_line() {
        let cli = Cli::try_parse_from(["vitest-lens", "cmd", "a.test.ts", "--line", "3", "--watch"]).unwrap();
        match cli.command {
            Command::Cmd(args) => {
                assert_eq!(args.line, Some(3));
                assert!(args.name.is_none());
                assert!(args.watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["vitest-lens", "cmd", "a.test.ts"]).is_err());
        assert!(Cli::try_parse_from(["vitest-lens", "cmd", "a.test.ts", "A", "--line", "3"]).is_err());
    }
}
