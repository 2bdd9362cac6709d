//! Shared types: the declaration tree produced by [`crate::builder`].

use std::fmt;

use serde::Serialize;

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns true if `offset` falls inside this range.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if `other` lies entirely within this range.
    pub fn encloses(&self, other: &Position) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Whether a declaration is a single test or a group of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Test,
    Suite,
}

impl DeclarationKind {
    /// `describe` declares a suite; `test` and `it` declare tests.
    pub fn from_callee(name: &str) -> Self {
        if name == "describe" {
            DeclarationKind::Suite
        } else {
            DeclarationKind::Test
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclarationKind::Test => "test",
            DeclarationKind::Suite => "suite",
        };
        write!(f, "{s}")
    }
}

/// A leaf declaration: one `test(...)` / `it(...)` call or their `.each` forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestNode {
    pub name: String,
    pub position: Position,
}

/// A `describe(...)` declaration and everything declared inside its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteNode {
    pub name: String,
    pub position: Position,
    /// Nested declarations in source order.
    pub children: Vec<TestTreeNode>,
}

/// One node of the declaration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestTreeNode {
    Test(TestNode),
    Suite(SuiteNode),
}

impl TestTreeNode {
    /// Build an empty node of the given kind.
    pub fn new(kind: DeclarationKind, name: String, position: Position) -> Self {
        match kind {
            DeclarationKind::Test => TestTreeNode::Test(TestNode { name, position }),
            DeclarationKind::Suite => TestTreeNode::Suite(SuiteNode {
                name,
                position,
                children: Vec::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TestTreeNode::Test(t) => &t.name,
            TestTreeNode::Suite(s) => &s.name,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            TestTreeNode::Test(t) => t.position,
            TestTreeNode::Suite(s) => s.position,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        match self {
            TestTreeNode::Test(_) => DeclarationKind::Test,
            TestTreeNode::Suite(_) => DeclarationKind::Suite,
        }
    }

    pub fn is_suite(&self) -> bool {
        matches!(self, TestTreeNode::Suite(_))
    }

    /// Child declarations; always empty for tests.
    pub fn children(&self) -> &[TestTreeNode] {
        match self {
            TestTreeNode::Test(_) => &[],
            TestTreeNode::Suite(s) => &s.children,
        }
    }
}

/// Count `(suites, tests)` across a whole tree.
pub fn count(nodes: &[TestTreeNode]) -> (usize, usize) {
    nodes.iter().fold((0, 0), |(suites, tests), node| {
        let (s, t) = count(node.children());
        match node {
            TestTreeNode::Suite(_) => (suites + s + 1, tests + t),
            TestTreeNode::Test(_) => (suites + s, tests + t + 1),
        }
    })
}

/// Find the innermost declaration whose span contains `offset`.
pub fn find_at(nodes: &[TestTreeNode], offset: usize) -> Option<&TestTreeNode> {
    let node = nodes.iter().find(|n| n.position().contains(offset))?;
    find_at(node.children(), offset).or(Some(node))
}
