//! Replaces loops that only adjust cells by a fixed amount per iteration
//! with straight-line multiplication.
//!
//! A loop whose body consists of `Add`s alone, and whose own cell changes by
//! exactly one per iteration, runs a number of times determined by the
//! current cell's value. `[->+++>-<<]` for example becomes
//! `cell[1] += cell[0] * 3; cell[2] -= cell[0]; cell[0] = 0`.

use super::{rewrite_body, would_rewrite, Pass, PassDescriptor, PassError, Rewrite};
use crate::ast::{Block, BlockKind, Instruction, Node, Offset};
use crate::config::Config;
use crate::visit;
use std::collections::BTreeMap;

pub struct SimpleLoop<'c> {
    config: &'c Config,
}

impl<'c> SimpleLoop<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn descriptor() -> PassDescriptor {
        PassDescriptor::new("simple-loop", construct)
    }

    fn step(&self, node: &Node) -> Rewrite {
        match node.as_block().and_then(|block| self.simplify(block)) {
            Some(nodes) => Rewrite::Replace(nodes),
            None => Rewrite::Keep,
        }
    }

    /// Returns the straight-line equivalent of `block`, if it is a simple
    /// loop.
    fn simplify(&self, block: &Block) -> Option<Vec<Node>> {
        if block.kind != BlockKind::Loop {
            return None;
        }

        let mut deltas: BTreeMap<Offset, i64> = BTreeMap::new();
        for inst in block.flat_instructions()? {
            match inst {
                Instruction::Add { offset, delta } => {
                    let total = deltas.entry(*offset).or_insert(0);
                    *total = total.wrapping_add(*delta);
                }
                _ => return None,
            }
        }

        // A loop counting down runs cell[0] times, one counting up runs
        // -cell[0] times modulo the cell width.
        let cell_size = self.config.cell_size();
        let step = cell_size.wrap(deltas.remove(&0)?);
        let direction = if step == 1 {
            -1
        } else if step == cell_size.wrap(-1) {
            1
        } else {
            return None;
        };

        let mut nodes: Vec<Node> = deltas
            .into_iter()
            .filter(|(_, delta)| cell_size.wrap(*delta) != 0)
            .map(|(offset, delta)| {
                Instruction::MulAdd {
                    offset,
                    source: 0,
                    factor: delta.wrapping_mul(direction),
                }
                .into()
            })
            .collect();
        nodes.push(Instruction::Set {
            offset: 0,
            value: 0,
        }
        .into());

        Some(nodes)
    }
}

fn construct(config: &Config) -> Box<dyn Pass + '_> {
    Box::new(SimpleLoop::new(config))
}

impl Pass for SimpleLoop<'_> {
    fn applies(&self, node: &Node) -> bool {
        visit::any_block(node, |block| {
            would_rewrite(&block.body, |child| self.step(child))
        })
    }

    fn transform(&mut self, mut node: Node) -> Result<Node, PassError> {
        let mut simplified = 0usize;
        visit::visit_mut(&mut node, &mut |block| {
            rewrite_body(&mut block.body, |child| {
                let rewrite = self.step(child);
                if rewrite != Rewrite::Keep {
                    simplified += 1;
                }
                rewrite
            })
        });

        tracing::trace!(simplified, "simplified loops");
        Ok(node)
    }
}
