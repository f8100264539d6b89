//! Optimization passes and the protocol every pass implements.
//!
//! A pass is built from a [`PassDescriptor`] with a reference to the shared
//! [`Config`], takes ownership of the tree in [`Pass::transform`] and hands
//! back the tree that the next pass should see.

use crate::ast::Node;
use crate::config::Config;
use crate::rewrite::Rewriter;

pub mod flatten;
pub mod initial_memory;
mod known;
pub mod propagate;
pub mod remove_dead;
pub mod simple_loop;
pub mod stdlib;

/// PassError represents a failure reported by a pass's own logic.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("pass `{pass}` failed: {source}")]
    Failed {
        pass: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PassError {
    pub fn failed(
        pass: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            pass,
            source: source.into(),
        }
    }
}

/// Pass is a single transformation over a program tree.
pub trait Pass {
    /// Reports whether transforming `node` would change it. The default
    /// declares that the pass does nothing.
    fn applies(&self, _node: &Node) -> bool {
        false
    }

    /// Transforms the tree, returning the tree later passes operate on. The
    /// default returns `node` unchanged.
    fn transform(&mut self, node: Node) -> Result<Node, PassError> {
        Ok(node)
    }
}

/// Builds a pass that borrows the shared configuration.
pub type PassConstructor = for<'c> fn(&'c Config) -> Box<dyn Pass + 'c>;

/// PassDescriptor names a pass and knows how to construct it.
#[derive(Clone, Copy)]
pub struct PassDescriptor {
    name: &'static str,
    construct: PassConstructor,
}

impl PassDescriptor {
    pub fn new(name: &'static str, construct: PassConstructor) -> Self {
        Self { name, construct }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn construct<'c>(&self, config: &'c Config) -> Box<dyn Pass + 'c> {
        (self.construct)(config)
    }
}

impl std::fmt::Debug for PassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PassDescriptor").field(&self.name).finish()
    }
}

/// Returns the default optimization schedule. Loop simplification and
/// constant propagation are each scheduled twice.
pub fn default_passes() -> Vec<PassDescriptor> {
    vec![
        flatten::Flatten::descriptor(),
        simple_loop::SimpleLoop::descriptor(),
        initial_memory::InitialMemory::descriptor(),
        propagate::Propagate::descriptor(),
        simple_loop::SimpleLoop::descriptor(),
        propagate::Propagate::descriptor(),
        remove_dead::RemoveDead::descriptor(),
        stdlib::Stdlib::descriptor(),
    ]
}

/// The rewrite chosen for a single element of a scanned body.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Rewrite {
    Keep,
    Remove,
    Replace(Vec<Node>),
    /// Keeps the element and discards everything after it.
    Truncate,
    /// Ends the scan, keeping the element.
    Stop,
}

/// Scans `body` once, applying whatever rewrite `step` picks for each
/// element.
pub(crate) fn rewrite_body<F>(body: &mut Vec<Node>, mut step: F)
where
    F: FnMut(&Node) -> Rewrite,
{
    let mut rewriter = Rewriter::new(body);
    while let Some(mut window) = rewriter.advance() {
        match step(&window.items()[0]) {
            Rewrite::Keep => (),
            Rewrite::Remove => window.remove(),
            Rewrite::Replace(nodes) => window.replace(nodes),
            Rewrite::Truncate => window.truncate(),
            Rewrite::Stop => break,
        }
    }
}

/// Runs `step` over `body` without modifying it, returning true if any
/// element would be rewritten.
pub(crate) fn would_rewrite<F>(body: &[Node], mut step: F) -> bool
where
    F: FnMut(&Node) -> Rewrite,
{
    for (idx, node) in body.iter().enumerate() {
        match step(node) {
            Rewrite::Keep => continue,
            Rewrite::Stop => return false,
            Rewrite::Truncate => return idx + 1 < body.len(),
            Rewrite::Remove | Rewrite::Replace(_) => return true,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Instruction;

    struct Identity;

    impl Pass for Identity {}

    #[test]
    fn should_default_to_identity_that_never_applies() {
        let tree = Node::program(vec![Instruction::Output { offset: 0 }.into()]);
        let mut pass = Identity;

        assert!(!pass.applies(&tree));
        assert_eq!(tree.clone(), pass.transform(tree).unwrap());
    }

    #[test]
    fn should_schedule_default_passes_in_order() {
        let names: Vec<_> = default_passes().iter().map(PassDescriptor::name).collect();

        assert_eq!(
            vec![
                "flatten",
                "simple-loop",
                "initial-memory",
                "propagate",
                "simple-loop",
                "propagate",
                "remove-dead",
                "stdlib",
            ],
            names
        );
    }

    #[test]
    fn should_apply_chosen_rewrites_in_single_scan() {
        let mut body: Vec<Node> = (0..5).map(|n| Instruction::Move(n).into()).collect();

        rewrite_body(&mut body, |node| match node {
            Node::Leaf(Instruction::Move(1)) => Rewrite::Remove,
            Node::Leaf(Instruction::Move(2)) => {
                Rewrite::Replace(vec![Instruction::Move(20).into(), Instruction::Move(2).into()])
            }
            Node::Leaf(Instruction::Move(3)) => Rewrite::Truncate,
            _ => Rewrite::Keep,
        });

        let expected: Vec<Node> = [0, 20, 2, 3]
            .into_iter()
            .map(|n| Instruction::Move(n).into())
            .collect();
        assert_eq!(expected, body);
    }

    #[test]
    fn should_report_pending_rewrites_without_mutating() {
        let body: Vec<Node> = (0..3).map(|n| Instruction::Move(n).into()).collect();

        assert!(would_rewrite(&body, |node| match node {
            Node::Leaf(Instruction::Move(2)) => Rewrite::Remove,
            _ => Rewrite::Keep,
        }));
        assert!(!would_rewrite(&body, |node| match node {
            Node::Leaf(Instruction::Move(1)) => Rewrite::Stop,
            Node::Leaf(Instruction::Move(2)) => Rewrite::Remove,
            _ => Rewrite::Keep,
        }));
    }
}
