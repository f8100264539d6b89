//! Constant propagation of cell values within each block.

use super::known::KnownCells;
use super::{rewrite_body, would_rewrite, Pass, PassDescriptor, PassError, Rewrite};
use crate::ast::{BlockKind, Instruction, Node};
use crate::config::Config;
use crate::visit;

pub struct Propagate<'c> {
    config: &'c Config,
}

impl<'c> Propagate<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("propagate", construct)
    }

    fn known(&self) -> KnownCells {
        KnownCells::unknown(self.config.cell_size())
    }
}

fn construct(config: &Config) -> Box<dyn Pass + '_> {
    Box::new(Propagate::new(config))
}

impl Pass for Propagate<'_> {
    fn applies(&self, node: &Node) -> bool {
        visit::any_block(node, |block| {
            let mut known = self.known();
            would_rewrite(&block.body, |child| step(&mut known, child))
        })
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        visit::visit_mut(&mut node, &mut |block| {
            let mut known = self.known();
            rewrite_body(&mut block.body, |child| step(&mut known, child));
        });
        Ok(node)
    }
}

fn set(offset: i32, value: i64) -> Vec<Node> {
    vec![Instruction::Set { offset, value }.into()]
}

fn step(known: &mut KnownCells, node: &Node) -> Rewrite {
    let inst = match node {
        Node::Leaf(inst) => inst,
        Node::Composite(block) => {
            return match block.kind {
                BlockKind::Loop if known.get(0) == Some(0) => Rewrite::Remove,
                BlockKind::Loop => {
                    known.exit_loop();
                    Rewrite::Keep
                }
                BlockKind::Program => {
                    *known = KnownCells::unknown(known.cell_size());
                    Rewrite::Keep
                }
            };
        }
    };

    let cell_size = known.cell_size();
    match *inst {
        Instruction::Add { offset, delta } => match known.get(offset) {
            Some(value) => {
                known.apply(inst);
                Rewrite::Replace(set(offset, cell_size.wrap(value.wrapping_add(delta))))
            }
            None => Rewrite::Keep,
        },
        Instruction::Set { offset, value } if known.get(offset) == Some(cell_size.wrap(value)) => {
            Rewrite::Remove
        }
        Instruction::MulAdd {
            offset,
            source,
            factor,
        } => {
            let rewrite = match (known.get(offset), known.get(source)) {
                (_, Some(0)) => Rewrite::Remove,
                (Some(value), Some(multiplicand)) => Rewrite::Replace(set(
                    offset,
                    cell_size.wrap(value.wrapping_add(multiplicand.wrapping_mul(factor))),
                )),
                (None, Some(multiplicand)) => Rewrite::Replace(vec![Instruction::Add {
                    offset,
                    delta: cell_size.wrap(multiplicand.wrapping_mul(factor)),
                }
                .into()]),
                (_, None) => Rewrite::Keep,
            };
            known.apply(inst);
            rewrite
        }
        Instruction::Output { offset } => match known.get(offset) {
            Some(value) => Rewrite::Replace(vec![Instruction::Write(vec![value as u8]).into()]),
            None => Rewrite::Keep,
        },
        Instruction::Set { .. }
        | Instruction::Move(_)
        | Instruction::Input { .. }
        | Instruction::Write(_) => {
            known.apply(inst);
            Rewrite::Keep
        }
    }
}
