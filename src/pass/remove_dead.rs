//! Removes code that cannot affect what a program observably does.

use super::known::KnownCells;
use super::{rewrite_body, would_rewrite, Pass, PassDescriptor, PassError, Rewrite};
use crate::ast::{Block, BlockKind, Node};
use crate::config::Config;
use crate::visit;

pub struct RemoveDead<'c> {
    config: &'c Config,
}

impl<'c> RemoveDead<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("remove-dead", construct)
    }

    /// Memory is all zero when a program starts and unknown when a loop
    /// body starts.
    fn known(&self, block: &Block) -> KnownCells {
        match block.kind {
            BlockKind::Program => KnownCells::zeroed(self.config.cell_size()),
            BlockKind::Loop => KnownCells::unknown(self.config.cell_size()),
        }
    }
}

fn construct(config: &Config) -> Box<dyn Pass + '_> {
    Box::new(RemoveDead::new(config))
}

impl Pass for RemoveDead<'_> {
    fn applies(&self, node: &Node) -> bool {
        visit::any_block(node, |block| {
            let mut known = self.known(block);
            would_rewrite(&block.body, |child| step(&mut known, child))
                || (block.kind == BlockKind::Program && live_len(&block.body) < block.body.len())
        })
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        visit::visit_mut(&mut node, &mut |block| {
            let mut known = self.known(block);
            rewrite_body(&mut block.body, |child| step(&mut known, child));

            if block.kind == BlockKind::Program {
                let live = live_len(&block.body);
                block.body.truncate(live);
            }
        });
        Ok(node)
    }
}

fn step(known: &mut KnownCells, node: &Node) -> Rewrite {
    match node {
        Node::Leaf(inst) if inst.is_nop() => Rewrite::Remove,
        Node::Leaf(inst) => {
            known.apply(inst);
            Rewrite::Keep
        }
        Node::Composite(block) => match known.get(0) {
            Some(0) => Rewrite::Remove,
            // never terminates, so nothing after it can run
            Some(_) if block.body.is_empty() => Rewrite::Truncate,
            _ => {
                known.exit_loop();
                Rewrite::Keep
            }
        },
    }
}

/// Returns the length of the prefix of a program body that ends with its
/// last observable element. Trailing memory updates are never observed once
/// the program exits.
fn live_len(body: &[Node]) -> usize {
    body.iter()
        .rposition(|node| match node {
            Node::Leaf(inst) => inst.is_observable(),
            Node::Composite(_) => true,
        })
        .map_or(0, |idx| idx + 1)
}
