//! Folds pointer movement into instruction offsets and coalesces runs of
//! cell adjustments.
//!
//! Within a block, every `Move` is absorbed into the offsets of the
//! instructions that follow it, and consecutive `Add`s are merged into at
//! most one `Add` per cell. The accumulated movement is only materialized
//! where it must be: in front of a nested loop, which tests the cell under
//! the pointer, and at the end of the block.

use super::{Pass, PassDescriptor, PassError};
use crate::ast::{Instruction, Node, Offset};
use crate::config::Config;
use crate::rewrite::Rewriter;
use crate::visit;
use std::collections::BTreeMap;

pub struct Flatten<'c> {
    config: &'c Config,
}

impl<'c> Flatten<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("flatten", construct)
    }

    fn flatten_body(&self, body: &mut Vec<Node>) {
        let mut pending = Pending::new(self.config);
        let mut rewriter = Rewriter::new(body);

        while let Some(mut window) = rewriter.advance() {
            match classify(&window.items()[0]) {
                Element::Add(offset, delta) => {
                    pending.add(offset, delta);
                    window.remove();
                }
                Element::Move(delta) => {
                    pending.shift += delta;
                    window.remove();
                }
                Element::Other => {
                    let shift = pending.shift;
                    window.replace_with(|nodes| {
                        nodes.into_iter().map(|node| match node {
                            Node::Leaf(inst) => Node::Leaf(inst.shifted(shift)),
                            composite => composite,
                        })
                    });
                    window.prepend(pending.take_adds());
                }
                Element::Composite => window.prepend(pending.take_all()),
            }
        }

        body.extend(pending.take_all());
    }
}

fn construct(config: &Config) -> Box<dyn Pass + '_> {
    Box::new(Flatten::new(config))
}

impl Pass for Flatten<'_> {
    fn applies(&self, node: &Node) -> bool {
        visit::any_block(node, |block| !is_flat(&block.body))
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        visit::visit_mut(&mut node, &mut |block| self.flatten_body(&mut block.body));
        Ok(node)
    }
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Add(Offset, i64),
    Move(Offset),
    Other,
    Composite,
}

fn classify(node: &Node) -> Element {
    match node {
        Node::Leaf(Instruction::Add { offset, delta }) => Element::Add(*offset, *delta),
        Node::Leaf(Instruction::Move(delta)) => Element::Move(*delta),
        Node::Leaf(_) => Element::Other,
        Node::Composite(_) => Element::Composite,
    }
}

/// Pending holds the movement and adjustments that have been scanned but
/// not yet written back.
struct Pending<'c> {
    config: &'c Config,
    shift: Offset,
    adds: BTreeMap<Offset, i64>,
}

impl<'c> Pending<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            config,
            shift: 0,
            adds: BTreeMap::new(),
        }
    }

    fn add(&mut self, offset: Offset, delta: i64) {
        let total = self.adds.entry(self.shift + offset).or_insert(0);
        *total = total.wrapping_add(delta);
    }

    /// Drains the pending adjustments, ordered by offset and without any
    /// that cancel out.
    fn take_adds(&mut self) -> Vec<Node> {
        let cell_size = self.config.cell_size();
        std::mem::take(&mut self.adds)
            .into_iter()
            .filter(|(_, delta)| cell_size.wrap(*delta) != 0)
            .map(|(offset, delta)| Instruction::Add { offset, delta }.into())
            .collect()
    }

    /// Drains the pending adjustments followed by the pending movement.
    fn take_all(&mut self) -> Vec<Node> {
        let mut nodes = self.take_adds();
        if self.shift != 0 {
            nodes.push(Instruction::Move(self.shift).into());
            self.shift = 0;
        }
        nodes
    }
}

/// Reports whether flattening `body` would leave it unchanged: every `Move`
/// directly precedes a loop or ends the block, no `Add` or `Move` is a no-op,
/// and every run of `Add`s has strictly increasing offsets.
fn is_flat(body: &[Node]) -> bool {
    let nop = body.iter().any(|node| {
        matches!(
            node,
            Node::Leaf(Instruction::Add { delta: 0, .. } | Instruction::Move(0))
        )
    });
    let stray_move = body.iter().enumerate().any(|(idx, node)| {
        matches!(node, Node::Leaf(Instruction::Move(_)))
            && body.get(idx + 1).is_some_and(|next| !next.is_composite())
    });
    let unmerged_adds = body.windows(2).any(|pair| {
        matches!(
            pair,
            [
                Node::Leaf(Instruction::Add { offset: a, .. }),
                Node::Leaf(Instruction::Add { offset: b, .. }),
            ] if a >= b
        )
    });

    !(nop || stray_move || unmerged_adds)
}
