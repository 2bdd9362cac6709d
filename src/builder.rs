//! Declaration tree builder.
//!
//! Walks a tree-sitter syntax tree in pre-order, classifies every call
//! expression with [`crate::classify`], and assembles recognized declarations
//! into a suite/test tree.
//!
//! Placement relies on traversal order: a call is classified and recorded
//! before any of its descendants are visited, so a declaration nested in a
//! suite's callback always finds the suite when it walks up its syntax
//! parents. The association table lives only for the duration of one build.

use std::collections::HashMap;

use tracing::{debug, trace};
use tree_sitter::{Node, Parser, Tree};

use crate::abort::{AbortController, AbortSignal};
use crate::classify::{self, Declaration};
use crate::errors::ParseError;
use crate::parser;
use crate::types::{SuiteNode, TestNode, TestTreeNode};

/// Receives each declaration as soon as it is recognized, before it is
/// placed in the tree.
///
/// Suites are reported without children. A listener may abort the build
/// through an [`AbortController`] it holds.
pub trait Listener {
    fn on_test(&mut self, _test: &TestNode) {}
    fn on_suite(&mut self, _suite: &SuiteNode) {}
}

/// The no-op listener.
impl Listener for () {}

/// Adapts a closure over [`TestTreeNode`] into a [`Listener`].
pub struct FnListener<F>(pub F);

impl<F: FnMut(&TestTreeNode)> Listener for FnListener<F> {
    fn on_test(&mut self, test: &TestNode) {
        (self.0)(&TestTreeNode::Test(test.clone()));
    }

    fn on_suite(&mut self, suite: &SuiteNode) {
        (self.0)(&TestTreeNode::Suite(suite.clone()));
    }
}

/// Aborts its controller on the first declaration of either kind.
struct AbortOnFirst(AbortController);

impl Listener for AbortOnFirst {
    fn on_test(&mut self, _test: &TestNode) {
        self.0.abort();
    }

    fn on_suite(&mut self, _suite: &SuiteNode) {
        self.0.abort();
    }
}

/// Builds the declaration tree for one source file.
pub struct TestTreeBuilder<'s, 'l> {
    source: &'s str,
    signal: AbortSignal,
    listener: &'l mut dyn Listener,
    /// Every placed or dropped declaration, indexed by insertion order.
    arena: Vec<Slot>,
    roots: Vec<usize>,
    /// Syntax node id -> arena index of the declaration made by that call.
    owners: HashMap<usize, usize>,
}

struct Slot {
    node: Option<TestTreeNode>,
    children: Vec<usize>,
}

impl<'s, 'l> TestTreeBuilder<'s, 'l> {
    /// Parse `source` and build its declaration tree.
    pub fn build(
        parser: &mut Parser,
        source: &str,
        signal: &AbortSignal,
    ) -> Result<Vec<TestTreeNode>, ParseError> {
        TestTreeBuilder::build_with_listener(parser, source, signal, &mut ())
    }

    /// Parse `source` and build its declaration tree, reporting each
    /// declaration to `listener` as it is found.
    pub fn build_with_listener(
        parser: &mut Parser,
        source: &str,
        signal: &AbortSignal,
        listener: &mut dyn Listener,
    ) -> Result<Vec<TestTreeNode>, ParseError> {
        let tree = parser::parse_source(parser, source)?;
        Ok(TestTreeBuilder::build_from_tree(&tree, source, signal, listener))
    }

    /// Build the declaration tree of an already parsed file.
    ///
    /// `tree` must have been parsed from `source`.
    pub fn build_from_tree(
        tree: &Tree,
        source: &'s str,
        signal: &AbortSignal,
        listener: &'l mut dyn Listener,
    ) -> Vec<TestTreeNode> {
        let mut builder = TestTreeBuilder {
            source,
            signal: signal.clone(),
            listener,
            arena: Vec::new(),
            roots: Vec::new(),
            owners: HashMap::new(),
        };
        builder.walk(tree.root_node());
        builder.finish()
    }

    /// Pre-order traversal that stops as soon as the signal is set.
    fn walk(&mut self, root: Node) {
        let mut cursor = root.walk();
        loop {
            if self.signal.is_aborted() {
                debug!("declaration walk aborted");
                return;
            }

            let node = cursor.node();
            if node.kind() == "call_expression" {
                self.visit_call(node);
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn visit_call(&mut self, call: Node) {
        let Some(decl) = classify::classify(call, self.source) else {
            return;
        };
        trace!(
            kind = %decl.kind,
            name = %decl.name,
            start = decl.position.start,
            end = decl.position.end,
            "declaration"
        );
        self.place(call, decl);
    }

    /// Notify the listener, then attach the declaration to its nearest
    /// enclosing declaration or to the roots.
    fn place(&mut self, call: Node, decl: Declaration) {
        let node = TestTreeNode::new(decl.kind, decl.name, decl.position);
        match &node {
            TestTreeNode::Suite(suite) => self.listener.on_suite(suite),
            TestTreeNode::Test(test) => self.listener.on_test(test),
        }
        if self.signal.is_aborted() {
            return;
        }

        let index = self.arena.len();
        self.arena.push(Slot {
            node: Some(node),
            children: Vec::new(),
        });

        match self.enclosing(call) {
            None => self.roots.push(index),
            Some(parent) => {
                if self.arena[parent].node.as_ref().is_some_and(TestTreeNode::is_suite) {
                    self.arena[parent].children.push(index);
                } else {
                    trace!("dropping declaration nested in a test body");
                }
            }
        }

        self.owners.insert(call.id(), index);
    }

    /// Arena index of the nearest ancestor call that made a declaration.
    fn enclosing(&self, call: Node) -> Option<usize> {
        let mut current = call.parent();
        while let Some(node) = current {
            if let Some(&index) = self.owners.get(&node.id()) {
                return Some(index);
            }
            current = node.parent();
        }
        None
    }

    fn finish(mut self) -> Vec<TestTreeNode> {
        debug!(
            declarations = self.arena.len(),
            roots = self.roots.len(),
            "declaration tree built"
        );
        let roots = std::mem::take(&mut self.roots);
        roots
            .into_iter()
            .filter_map(|index| self.materialize(index))
            .collect()
    }

    /// Move a slot and its descendants out of the arena into an owned tree.
    fn materialize(&mut self, index: usize) -> Option<TestTreeNode> {
        let mut node = self.arena[index].node.take()?;
        let children = std::mem::take(&mut self.arena[index].children);
        if let TestTreeNode::Suite(suite) = &mut node {
            suite.children = children
                .into_iter()
                .filter_map(|child| self.materialize(child))
                .collect();
        }
        Some(node)
    }
}

/// Report whether `source` declares at least one test or suite.
///
/// Stops the walk at the first declaration instead of building the tree.
pub fn contains_declarations(tree: &Tree, source: &str) -> bool {
    let controller = AbortController::new();
    let signal = controller.signal();
    let mut listener = AbortOnFirst(controller.clone());
    TestTreeBuilder::build_from_tree(tree, source, &signal, &mut listener);
    controller.is_aborted()
}
