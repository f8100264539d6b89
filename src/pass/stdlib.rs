//! Joins constant output into as few writes as possible, so the generated
//! program can hand whole strings to the C standard library.
//!
//! A `Write` may be delayed past any instruction that neither reads nor
//! writes the outside world. Pending bytes are flushed in front of the next
//! `Input`, `Output` or nested block, and at the end of the body.

use super::{Pass, PassDescriptor, PassError};
use crate::ast::{Instruction, Node};
use crate::config::Config;
use crate::rewrite::Rewriter;
use crate::visit;

/// Stdlib depends only on the shape of the tree, never on the cell size.
pub struct Stdlib;

impl Stdlib {
    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("stdlib", construct)
    }
}

fn construct(_config: &Config) -> Box<dyn Pass + '_> {
    Box::new(Stdlib)
}

impl Pass for Stdlib {
    fn applies(&self, node: &Node) -> bool {
        visit::any_block(node, |block| {
            block.body.iter().enumerate().any(|(idx, node)| match node {
                Node::Leaf(Instruction::Write(bytes)) if bytes.is_empty() => true,
                Node::Leaf(Instruction::Write(_)) => block
                    .body
                    .get(idx + 1)
                    .is_some_and(|next| !is_barrier(next)),
                _ => false,
            })
        })
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        let mut joined = 0usize;
        visit::visit_mut(&mut node, &mut |block| {
            joined += join_writes(&mut block.body)
        });

        tracing::trace!(joined, "joined writes");
        Ok(node)
    }
}

/// Elements that output may not be delayed past.
fn is_barrier(node: &Node) -> bool {
    match node {
        Node::Leaf(inst) => matches!(inst, Instruction::Input { .. } | Instruction::Output { .. }),
        Node::Composite(_) => true,
    }
}

/// Joins the writes of a single body, returning the number of writes that
/// were folded into a preceding one.
fn join_writes(body: &mut Vec<Node>) -> usize {
    let mut pending: Vec<u8> = vec![];
    let mut writes = 0usize;
    let mut joined = 0usize;
    let mut rewriter = Rewriter::new(body);

    while let Some(mut window) = rewriter.advance() {
        let barrier = match &mut window.items_mut()[0] {
            Node::Leaf(Instruction::Write(bytes)) => {
                pending.append(bytes);
                writes += 1;
                None
            }
            node => Some(is_barrier(node)),
        };

        match barrier {
            None => window.remove(),
            Some(true) => {
                if let Some(write) = flush(&mut pending, &mut writes, &mut joined) {
                    window.prepend([write]);
                }
            }
            Some(false) => (),
        }
    }

    body.extend(flush(&mut pending, &mut writes, &mut joined));
    joined
}

fn flush(pending: &mut Vec<u8>, writes: &mut usize, joined: &mut usize) -> Option<Node> {
    *joined += writes.saturating_sub(1);
    *writes = 0;
    if pending.is_empty() {
        None
    } else {
        Some(Instruction::Write(std::mem::take(pending)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(bytes: &[u8]) -> Node {
        Instruction::Write(bytes.to_vec()).into()
    }

    #[test]
    fn should_join_writes_across_memory_updates() {
        let tree = Node::program(vec![
            write(b"a"),
            Instruction::Set {
                offset: 0,
                value: 3,
            }
            .into(),
            Instruction::Move(1).into(),
            write(b"b"),
            Instruction::Output { offset: 0 }.into(),
            write(b"c"),
        ]);
        let mut pass = Stdlib;

        assert!(pass.applies(&tree));
        assert_eq!(
            Node::program(vec![
                Instruction::Set {
                    offset: 0,
                    value: 3,
                }
                .into(),
                Instruction::Move(1).into(),
                write(b"ab"),
                Instruction::Output { offset: 0 }.into(),
                write(b"c"),
            ]),
            pass.transform(tree).unwrap()
        );
    }

    #[test]
    fn should_flush_before_nested_blocks() {
        let tree = Node::program(vec![
            write(b"He"),
            write(b"llo"),
            Node::looped(vec![write(b"x"), write(b"y")]),
            write(b"!"),
        ]);

        assert_eq!(
            Node::program(vec![
                write(b"Hello"),
                Node::looped(vec![write(b"xy")]),
                write(b"!"),
            ]),
            Stdlib.transform(tree).unwrap()
        );
    }

    #[test]
    fn should_not_delay_output_past_input() {
        let tree = Node::program(vec![
            write(b"?"),
            Instruction::Input { offset: 0 }.into(),
            write(b"!"),
        ]);
        let mut pass = Stdlib;

        assert!(!pass.applies(&tree));
        assert_eq!(tree.clone(), pass.transform(tree).unwrap());
    }

    #[test]
    fn should_count_joined_writes() {
        let mut body = vec![write(b"a"), write(b"b"), write(b"c")];

        assert_eq!(2, join_writes(&mut body));
        assert_eq!(vec![write(b"abc")], body);
    }
}
