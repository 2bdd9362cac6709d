//! Output formatting: grep-style text (default) and JSON Lines (`--json`).
//!
//! All result data flows through a [`Formatter`] which writes to an
//! arbitrary [`std::io::Write`] destination (typically stdout).
//! Hints, errors and summaries always go to stderr.

use std::fmt::Display;
use std::io::Write;

use serde::Serialize;

use crate::color;
use crate::discover::{FileTests, ScanReport};
use crate::errors::LensError;
use crate::explorer::{LineIndex, TestItem};
use crate::runner::Invocation;
use crate::types::{DeclarationKind, TestTreeNode};

// ---------------------------------------------------------------------------
// Serializable output types
// ---------------------------------------------------------------------------

/// One line of `check` output.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput<'a> {
    pub file: &'a str,
    pub has_declarations: bool,
}

/// One line of `cmd` output.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput<'a> {
    /// Name pattern passed to vitest.
    pub name: &'a str,
    #[serde(flatten)]
    pub invocation: &'a Invocation,
    /// The invocation rendered as one shell line.
    pub command: String,
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Output formatter that renders results either as grep-style text or as
/// JSON Lines (one JSON object per line).
pub struct Formatter<W: Write> {
    writer: W,
    json: bool,
    color: bool,
}

impl<W: Write> Formatter<W> {
    /// Create a new formatter.
    ///
    /// * `writer` - The destination for output (e.g. `std::io::stdout()`).
    /// * `json`   - When `true`, emit JSON Lines; otherwise, emit text.
    /// * `color`  - When `true`, emit ANSI color codes in text output.
    pub fn new(writer: W, json: bool, color: bool) -> Self {
        Self {
            writer,
            json,
            color,
        }
    }

    // -- Color helper methods -----------------------------------------------

    fn write_colored(&mut self, code: &str, value: impl Display) -> std::io::Result<()> {
        if self.color {
            write!(self.writer, "{code}{value}{}", color::RESET)
        } else {
            write!(self.writer, "{value}")
        }
    }

    fn write_file(&mut self, path: &str) -> std::io::Result<()> {
        self.write_colored(color::FILE, path)
    }

    fn write_line_no(&mut self, line: impl Display) -> std::io::Result<()> {
        self.write_colored(color::LINE_NO, line)
    }

    fn write_sep(&mut self) -> std::io::Result<()> {
        self.write_colored(color::SEP, ":")
    }

    fn write_declaration(&mut self, kind: DeclarationKind, name: &str) -> std::io::Result<()> {
        let code = match kind {
            DeclarationKind::Suite => color::SUITE,
            DeclarationKind::Test => color::TEST,
        };
        write!(self.writer, "{kind} ")?;
        self.write_colored(code, name)
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        let line = serde_json::to_string(value).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    // -- Result formatting ---------------------------------------------------

    /// Format the declaration tree of one file.
    ///
    /// Text output has one line per declaration, `file:line:<indent>kind name`,
    /// with one-based line numbers and two spaces of indent per nesting level.
    /// JSON output is a single `{"file", "nodes"}` object.
    pub fn format_file_tests(&mut self, file: &FileTests) -> std::io::Result<()> {
        if self.json {
            return self.write_json(file);
        }
        let index = LineIndex::new(&file.source);
        self.write_nodes(&file.file, &index, &file.nodes, 0)
    }

    fn write_nodes(
        &mut self,
        file: &str,
        index: &LineIndex<'_>,
        nodes: &[TestTreeNode],
        depth: usize,
    ) -> std::io::Result<()> {
        for node in nodes {
            let line = index.position_at(node.position().start).line + 1;
            self.write_file(file)?;
            self.write_sep()?;
            self.write_line_no(line)?;
            self.write_sep()?;
            write!(self.writer, "{:indent$}", "", indent = depth * 2)?;
            self.write_declaration(node.kind(), node.name())?;
            writeln!(self.writer)?;
            self.write_nodes(file, index, node.children(), depth + 1)?;
        }
        Ok(())
    }

    /// Format every file of a scan report.
    pub fn format_scan(&mut self, report: &ScanReport) -> std::io::Result<()> {
        for file in &report.files {
            self.format_file_tests(file)?;
        }
        Ok(())
    }

    /// Format the result of checking one file for declarations.
    ///
    /// Text output lists only files that declare something, like `grep -l`.
    pub fn format_check(&mut self, file: &str, has_declarations: bool) -> std::io::Result<()> {
        if self.json {
            return self.write_json(&CheckOutput {
                file,
                has_declarations,
            });
        }
        if has_declarations {
            self.write_file(file)?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Format explorer items, one top-level item per JSON line.
    pub fn format_items(&mut self, items: &[TestItem]) -> std::io::Result<()> {
        if self.json {
            for item in items {
                self.write_json(item)?;
            }
            return Ok(());
        }
        self.write_items(items, 0)
    }

    fn write_items(&mut self, items: &[TestItem], depth: usize) -> std::io::Result<()> {
        for item in items {
            let r = item.range;
            write!(self.writer, "{:indent$}", "", indent = depth * 2)?;
            self.write_colored(color::FILE, &item.id)?;
            write!(
                self.writer,
                " [{}:{}-{}:{}]",
                r.start.line, r.start.character, r.end.line, r.end.character
            )?;
            writeln!(self.writer)?;
            self.write_items(&item.children, depth + 1)?;
        }
        Ok(())
    }

    /// Format the command line that runs `name`.
    pub fn format_invocation(&mut self, name: &str, invocation: &Invocation) -> std::io::Result<()> {
        if self.json {
            return self.write_json(&CommandOutput {
                name,
                invocation,
                command: invocation.to_string(),
            });
        }
        writeln!(self.writer, "{invocation}")
    }
}

// ---------------------------------------------------------------------------
// stderr helpers
// ---------------------------------------------------------------------------

/// Print a hint message to stderr. Suppressed in JSON mode.
pub fn print_hint(msg: &str, json: bool) {
    if !json {
        eprintln!("hint: {msg}");
    }
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Print the scan totals to stderr. Suppressed in JSON mode so stdout and
/// stderr stay machine-readable.
pub fn print_scan_summary(report: &ScanReport, json: bool) {
    if !json {
        eprintln!("{}", scan_summary(report));
    }
}

fn scan_summary(report: &ScanReport) -> String {
    format!(
        "{} files, {} suites, {} tests in {:.2}s",
        report.files.len(),
        report.suite_count,
        report.test_count,
        report.elapsed.as_secs_f64()
    )
}

/// Format a [`LensError`] to stderr with structured `error:` / `hint:` lines.
///
/// * Always prints `error: <message>` to stderr.
/// * When `json` is `false` and the error carries a contextual hint, also
///   prints `hint: <suggestion>` to stderr.
/// * Returns the appropriate process exit code.
pub fn format_error(err: &LensError, json: bool) -> i32 {
    print_error(&format!("{err}"));
    if let Some(hint) = err.hint() {
        print_hint(hint, json);
    }
    err.exit_code()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::explorer::{LinePosition, Range};
    use crate::types::{Position, SuiteNode, TestNode};

    /// Helper: renders output into a String (no color).
    fn render<F>(json: bool, f: F) -> String
    where
        F: FnOnce(&mut Formatter<&mut Vec<u8>>) -> std::io::Result<()>,
    {
        let mut buf = Vec::new();
        {
            let mut fmt = Formatter::new(&mut buf, json, false);
            f(&mut fmt).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    /// Helper: renders output into a String with color enabled.
    fn render_color<F>(f: F) -> String
    where
        F: FnOnce(&mut Formatter<&mut Vec<u8>>) -> std::io::Result<()>,
    {
        let mut buf = Vec::new();
        {
            let mut fmt = Formatter::new(&mut buf, false, true);
            f(&mut fmt).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> FileTests {
        let source = "describe('S', () => {\n  it('A', () => {});\n});\ntest('B', () => {});\n";
        FileTests {
            path: PathBuf::from("/p/a.test.ts"),
            file: "a.test.ts".into(),
            source: source.into(),
            nodes: vec![
                TestTreeNode::Suite(SuiteNode {
                    name: "S".into(),
                    position: Position::new(0, 45),
                    children: vec![TestTreeNode::Test(TestNode {
                        name: "A".into(),
                        position: Position::new(24, 41),
                    })],
                }),
                TestTreeNode::Test(TestNode {
                    name: "B".into(),
                    position: Position::new(47, 66),
                }),
            ],
        }
    }

    #[test]
    fn tree_text_format() {
        let out = render(false, |fmt| fmt.format_file_tests(&sample()));
        assert_eq!(
            out,
            "a.test.ts:1:suite S\na.test.ts:2:  test A\na.test.ts:4:test B\n"
        );
    }

    #[test]
    fn tree_json_format() {
        let out = render(true, |fmt| fmt.format_file_tests(&sample()));
        assert_eq!(out.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(v["file"], "a.test.ts");
        assert!(v.get("source").is_none());
        assert!(v.get("path").is_none());
        assert_eq!(v["nodes"][0]["type"], "suite");
        assert_eq!(v["nodes"][0]["children"][0]["name"], "A");
        assert_eq!(v["nodes"][1]["position"]["start"], 47);
    }

    #[test]
    fn tree_color_format() {
        let out = render_color(|fmt| fmt.format_file_tests(&sample()));
        assert!(out.contains(&format!("{}a.test.ts{}", color::FILE, color::RESET)));
        assert!(out.contains(&format!("suite {}S{}", color::SUITE, color::RESET)));
        assert!(out.contains(&format!("test {}A{}", color::TEST, color::RESET)));
    }

    #[test]
    fn check_text_lists_only_matches() {
        let out = render(false, |fmt| {
            fmt.format_check("a.test.ts", true)?;
            fmt.format_check("b.ts", false)
        });
        assert_eq!(out, "a.test.ts\n");
    }

    #[test]
    fn check_json_reports_every_file() {
        let out = render(true, |fmt| {
            fmt.format_check("a.test.ts", true)?;
            fmt.format_check("b.ts", false)
        });
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["file"], "b.ts");
        assert_eq!(lines[1]["has_declarations"], false);
    }

    fn item(id: &str, children: Vec<TestItem>) -> TestItem {
        let at = |line, character| LinePosition { line, character };
        TestItem {
            id: id.into(),
            label: id.rsplit('/').next().unwrap().into(),
            kind: if children.is_empty() {
                DeclarationKind::Test
            } else {
                DeclarationKind::Suite
            },
            file: "a.test.ts".into(),
            range: Range {
                start: at(0, 0),
                end: at(2, 2),
            },
            children,
        }
    }

    #[test]
    fn items_text_indents_children() {
        let items = vec![item("a.test.ts/S", vec![item("a.test.ts/A", vec![])])];
        let out = render(false, |fmt| fmt.format_items(&items));
        assert_eq!(out, "a.test.ts/S [0:0-2:2]\n  a.test.ts/A [0:0-2:2]\n");
    }

    #[test]
    fn items_json_one_line_per_root() {
        let items = vec![item("a.test.ts/A", vec![]), item("a.test.ts/B", vec![])];
        let out = render(true, |fmt| fmt.format_items(&items));
        assert_eq!(out.lines().count(), 2);
        let v: serde_json::Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(v["kind"], "test");
        assert_eq!(v["range"]["end"]["character"], 2);
    }

    #[test]
    fn invocation_formats() {
        let inv = Invocation {
            program: "npx".into(),
            args: vec!["vitest".into(), "run".into()],
            cwd: PathBuf::from("/p"),
        };
        assert_eq!(render(false, |fmt| fmt.format_invocation("A", &inv)), "npx vitest run\n");

        let out = render(true, |fmt| fmt.format_invocation("A", &inv));
        let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(v["name"], "A");
        assert_eq!(v["program"], "npx");
        assert_eq!(v["args"][1], "run");
        assert_eq!(v["cwd"], "/p");
        assert_eq!(v["command"], "npx vitest run");
    }

    #[test]
    fn summary_line() {
        let report = ScanReport {
            files: vec![sample()],
            suite_count: 1,
            test_count: 2,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(scan_summary(&report), "1 files, 1 suites, 2 tests in 1.50s");
    }
}
