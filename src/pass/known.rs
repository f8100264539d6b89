use crate::ast::{Instruction, Offset};
use crate::config::CellSize;
use std::collections::BTreeMap;

/// KnownCells tracks the cell values that are known at a point of a forward
/// scan, keyed by offset from the current memory pointer.
#[derive(Debug, Clone)]
pub(crate) struct KnownCells {
    cell_size: CellSize,
    values: BTreeMap<Offset, Option<i64>>,
    rest_zero: bool,
}

impl KnownCells {
    /// Nothing is known about any cell.
    pub fn unknown(cell_size: CellSize) -> Self {
        Self {
            cell_size,
            values: BTreeMap::new(),
            rest_zero: false,
        }
    }

    /// Every cell holds zero, as at the start of a program.
    pub fn zeroed(cell_size: CellSize) -> Self {
        Self {
            rest_zero: true,
            ..Self::unknown(cell_size)
        }
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    pub fn get(&self, offset: Offset) -> Option<i64> {
        match self.values.get(&offset) {
            Some(value) => *value,
            None if self.rest_zero => Some(0),
            None => None,
        }
    }

    pub fn set(&mut self, offset: Offset, value: i64) {
        let wrapped = self.cell_size.wrap(value);
        self.values.insert(offset, Some(wrapped));
    }

    pub fn forget(&mut self, offset: Offset) {
        if self.rest_zero {
            self.values.insert(offset, None);
        } else {
            self.values.remove(&offset);
        }
    }

    /// Rebases every offset after the pointer moved by `delta`.
    pub fn shift(&mut self, delta: Offset) {
        self.values = std::mem::take(&mut self.values)
            .into_iter()
            .map(|(offset, value)| (offset - delta, value))
            .collect();
    }

    /// Forgets everything, then records that the current cell is zero, which
    /// holds right after any loop exits.
    pub fn exit_loop(&mut self) {
        self.values.clear();
        self.rest_zero = false;
        self.set(0, 0);
    }

    /// Updates the known state to reflect executing `inst`.
    pub fn apply(&mut self, inst: &Instruction) {
        match inst {
            Instruction::Add { offset, delta } => {
                if let Some(value) = self.get(*offset) {
                    self.set(*offset, value.wrapping_add(*delta));
                }
            }
            Instruction::Set { offset, value } => self.set(*offset, *value),
            Instruction::MulAdd {
                offset,
                source,
                factor,
            } => match (self.get(*offset), self.get(*source)) {
                (_, Some(0)) => (),
                (Some(value), Some(multiplicand)) => {
                    self.set(*offset, value.wrapping_add(multiplicand.wrapping_mul(*factor)))
                }
                _ => self.forget(*offset),
            },
            Instruction::Move(delta) => self.shift(*delta),
            Instruction::Input { offset } => self.forget(*offset),
            Instruction::Output { .. } | Instruction::Write(_) => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_track_values_across_pointer_moves() {
        let mut known = KnownCells::unknown(CellSize::Bits8);
        known.apply(&Instruction::Set {
            offset: 2,
            value: 7,
        });
        known.apply(&Instruction::Move(2));

        assert_eq!(Some(7), known.get(0));
        assert_eq!(None, known.get(2));
    }

    #[test]
    fn should_forget_input_cells_of_zeroed_memory() {
        let mut known = KnownCells::zeroed(CellSize::Bits8);
        known.apply(&Instruction::Input { offset: 1 });

        assert_eq!(Some(0), known.get(0));
        assert_eq!(None, known.get(1));
    }

    #[test]
    fn should_wrap_accumulated_values() {
        let mut known = KnownCells::zeroed(CellSize::Bits8);
        known.apply(&Instruction::Add {
            offset: 0,
            delta: -1,
        });
        known.apply(&Instruction::MulAdd {
            offset: 1,
            source: 0,
            factor: 2,
        });

        assert_eq!(Some(255), known.get(0));
        assert_eq!(Some(254), known.get(1));
    }

    #[test]
    fn should_only_know_current_cell_after_loop() {
        let mut known = KnownCells::zeroed(CellSize::Bits8);
        known.exit_loop();

        assert_eq!(Some(0), known.get(0));
        assert_eq!(None, known.get(1));
    }
}
