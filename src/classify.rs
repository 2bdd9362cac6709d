//! Declaration classifier.
//!
//! Decides whether a `call_expression` declares a test or a suite, and if so
//! extracts its display name and span. Recognized callees:
//!
//! - `test(name, fn)`, `it(name, fn)`, `describe(name, fn)`
//! - `<id>.each(table)(name, fn)`
//! - `` <id>.each`rows`(name, fn) ``
//!
//! tree-sitter models a tagged template as a `call_expression` whose
//! `arguments` field is a `template_string`, so both each forms share the
//! same outer structure and differ only in the inner call's arguments.

use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Node;

use crate::types::{DeclarationKind, Position};

/// Callee identifiers that declare tests or suites.
const DECLARING_IDENTS: &[&str] = &["test", "it", "describe"];

/// Wildcard substituted for per-case placeholders in each-form names.
pub const WILDCARD: &str = ".*";

/// printf-style placeholders understood by jest-each / vitest.
static PRINTF_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[sdifjoOp#]").expect("placeholder regex should compile"));

/// `$name` interpolations used with tagged-template tables.
static TEMPLATE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[a-zA-Z_0-9]+").expect("placeholder regex should compile"));

/// How the per-case data of an each form is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EachForm {
    /// `.each([...])(...)`
    Table,
    /// `` .each`...`(...) ``
    Template,
}

/// A recognized declaration, before it is placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub position: Position,
    pub each: Option<EachForm>,
}

/// Classify a `call_expression` node.
///
/// Returns `None` for anything that is not a well-formed declaration: an
/// unknown callee, fewer than two arguments, a non-literal name or a body
/// that is not a function.
pub fn classify(call: Node, src: &str) -> Option<Declaration> {
    let callee = call.child_by_field_name("function")?;
    let (ident, each) = resolve_callee(callee, src)?;

    let args = call.child_by_field_name("arguments")?;
    if args.kind() != "arguments" {
        return None;
    }

    let mut cursor = args.walk();
    let mut operands = args.named_children(&mut cursor).filter(|n| !n.is_extra());
    let name_node = operands.next()?;
    let body = operands.next()?;

    if !is_function_like(body) {
        return None;
    }
    let literal = string_value(name_node, src)?;
    let name = match each {
        Some(_) => normalize_each_name(&literal),
        None => literal,
    };

    Some(Declaration {
        kind: DeclarationKind::from_callee(ident),
        name,
        position: Position::new(call.start_byte(), call.end_byte()),
        each,
    })
}

/// Replace per-case placeholders with [`WILDCARD`].
///
/// printf placeholders are rewritten before `$name` interpolations.
pub fn normalize_each_name(name: &str) -> String {
    let name = PRINTF_PLACEHOLDER.replace_all(name, WILDCARD);
    TEMPLATE_PLACEHOLDER.replace_all(&name, WILDCARD).into_owned()
}

fn is_declaring(name: &str) -> bool {
    DECLARING_IDENTS.contains(&name)
}

/// Resolve the callee of a call to the declaring identifier and each form.
fn resolve_callee<'a>(callee: Node, src: &'a str) -> Option<(&'a str, Option<EachForm>)> {
    match callee.kind() {
        "identifier" => {
            let name = node_text(callee, src);
            is_declaring(name).then_some((name, None))
        }
        "call_expression" => {
            let ident = each_target(callee.child_by_field_name("function")?, src)?;
            let form = match callee.child_by_field_name("arguments")?.kind() {
                "arguments" => EachForm::Table,
                "template_string" => EachForm::Template,
                _ => return None,
            };
            Some((ident, Some(form)))
        }
        _ => None,
    }
}

/// Match `<id>.each` and return `<id>`.
fn each_target<'a>(node: Node, src: &'a str) -> Option<&'a str> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    let property = node.child_by_field_name("property")?;
    if object.kind() != "identifier"
        || property.kind() != "property_identifier"
        || node_text(property, src) != "each"
    {
        return None;
    }
    let ident = node_text(object, src);
    is_declaring(ident).then_some(ident)
}

fn is_function_like(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

/// The cooked value of a string literal or substitution-free template.
fn string_value(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "string" => {}
        "template_string" => {
            let mut cursor = node.walk();
            if node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution")
            {
                return None;
            }
        }
        _ => return None,
    }
    let raw = src.get(node.start_byte() + 1..node.end_byte().checked_sub(1)?)?;
    Some(cook(raw))
}

fn node_text<'a>(node: Node, src: &'a str) -> &'a str {
    node.utf8_text(src.as_bytes()).unwrap_or("")
}

// ---------------------------------------------------------------------------
// Escape decoding
// ---------------------------------------------------------------------------

/// Decode JavaScript escape sequences in the body of a string literal.
fn cook(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else { break };
        match esc {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => out.push('\0'),
            'x' => match read_hex(&mut chars, 2) {
                Some(v) => out.push(char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER)),
                None => out.push('x'),
            },
            'u' => match read_unicode_escape(&mut chars) {
                Some(c) => out.push(c),
                None => out.push('u'),
            },
            // Line continuation.
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    out
}

/// Consume exactly `len` hex digits, or nothing if they are not all present.
fn read_hex(chars: &mut Peekable<Chars<'_>>, len: usize) -> Option<u32> {
    let mut look = chars.clone();
    let mut value = 0;
    for _ in 0..len {
        value = value * 16 + look.next()?.to_digit(16)?;
    }
    *chars = look;
    Some(value)
}

/// Decode the part of a `\u` escape after the `u`, joining surrogate pairs.
fn read_unicode_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    if chars.peek() == Some(&'{') {
        let mut look = chars.clone();
        look.next();
        let mut value: u32 = 0;
        let mut digits = 0;
        loop {
            match look.next()? {
                '}' if digits > 0 => break,
                c => {
                    value = value.checked_mul(16)? + c.to_digit(16)?;
                    digits += 1;
                }
            }
        }
        *chars = look;
        return Some(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    let unit = read_hex(chars, 4)?;
    if (0xD800..0xDC00).contains(&unit) {
        let mut look = chars.clone();
        if look.next() == Some('\\') && look.next() == Some('u') {
            if let Some(low) = read_hex(&mut look, 4)
                && (0xDC00..0xE000).contains(&low)
            {
                *chars = look;
                let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined);
            }
        }
    }
    Some(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER))
}
