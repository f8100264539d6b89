//! Exploits the all-zero memory a program starts with.
//!
//! Until the first instruction whose effect cannot be predicted, every cell
//! value at the top of a program is known, so adjustments become plain
//! assignments and loops over a zero cell are never entered.

use super::known::KnownCells;
use super::{rewrite_body, would_rewrite, Pass, PassDescriptor, PassError, Rewrite};
use crate::ast::{Block, BlockKind, Instruction, Node};
use crate::config::Config;

pub struct InitialMemory<'c> {
    config: &'c Config,
}

impl<'c> InitialMemory<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("initial-memory", construct)
    }

    fn known(&self) -> KnownCells {
        KnownCells::zeroed(self.config.cell_size())
    }
}

fn construct(config: &Config) -> Box<dyn Pass + '_> {
    Box::new(InitialMemory::new(config))
}

impl Pass for InitialMemory<'_> {
    fn applies(&self, node: &Node) -> bool {
        match node {
            Node::Composite(Block {
                kind: BlockKind::Program,
                body,
            }) => {
                let mut known = self.known();
                would_rewrite(body, |child| step(&mut known, child))
            }
            _ => false,
        }
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        if let Node::Composite(Block {
            kind: BlockKind::Program,
            body,
        }) = &mut node
        {
            let mut known = self.known();
            rewrite_body(body, |child| step(&mut known, child));
        }
        Ok(node)
    }
}

fn step(known: &mut KnownCells, node: &Node) -> Rewrite {
    let inst = match node {
        Node::Leaf(inst) => inst,
        Node::Composite(_) if known.get(0) == Some(0) => return Rewrite::Remove,
        Node::Composite(_) => return Rewrite::Stop,
    };

    match inst {
        Instruction::Add { offset, .. } | Instruction::MulAdd { offset, .. } => {
            known.apply(inst);
            match known.get(*offset) {
                Some(value) => Rewrite::Replace(vec![Instruction::Set {
                    offset: *offset,
                    value,
                }
                .into()]),
                None => Rewrite::Stop,
            }
        }
        Instruction::Input { .. } => Rewrite::Stop,
        Instruction::Set { .. }
        | Instruction::Move(_)
        | Instruction::Output { .. }
        | Instruction::Write(_) => {
            known.apply(inst);
            Rewrite::Keep
        }
    }
}
