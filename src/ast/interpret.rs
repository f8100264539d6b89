//! A reference interpreter for program trees, executing any tree, optimized
//! or not, against an in-memory tape.

use super::{BlockKind, Instruction, Node, Offset};
use crate::config::Config;
use std::collections::VecDeque;

/// The number of cells on the memory tape.
pub const TAPE_LEN: usize = 30_000;

/// InterpretError represents a failure while executing a program tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InterpretError {
    #[error("memory pointer out of bounds: {0}")]
    PointerOutOfBounds(i64),
    #[error("step limit of {0} exceeded")]
    StepLimit(u64),
}

/// Interpreter holds the machine state for a single execution.
pub struct Interpreter<'c> {
    config: &'c Config,
    tape: Vec<i64>,
    pointer: i64,
    input: VecDeque<u8>,
    output: Vec<u8>,
    steps: u64,
    step_limit: Option<u64>,
}

impl<'c> Interpreter<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            tape: vec![0; TAPE_LEN],
            pointer: 0,
            input: VecDeque::new(),
            output: vec![],
            steps: 0,
            step_limit: None,
        }
    }

    /// Provides the bytes consumed by input instructions.
    pub fn with_input(mut self, input: impl IntoIterator<Item = u8>) -> Self {
        self.input = input.into_iter().collect();
        self
    }

    /// Bounds the number of executed instructions and loop tests.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    pub fn run(&mut self, node: &Node) -> Result<(), InterpretError> {
        match node {
            Node::Leaf(inst) => self.step(inst),
            Node::Composite(block) => match block.kind {
                BlockKind::Program => block.body.iter().try_for_each(|node| self.run(node)),
                BlockKind::Loop => {
                    while self.tick().and_then(|_| self.load(0))? != 0 {
                        block.body.iter().try_for_each(|node| self.run(node))?;
                    }
                    Ok(())
                }
            },
        }
    }

    fn step(&mut self, inst: &Instruction) -> Result<(), InterpretError> {
        self.tick()?;

        match inst {
            Instruction::Add { offset, delta } => {
                let value = self.load(*offset)?;
                self.store(*offset, value.wrapping_add(*delta))
            }
            Instruction::Set { offset, value } => self.store(*offset, *value),
            Instruction::MulAdd {
                offset,
                source,
                factor,
            } => {
                let product = self.load(*source)?.wrapping_mul(*factor);
                let value = self.load(*offset)?;
                self.store(*offset, value.wrapping_add(product))
            }
            Instruction::Move(delta) => {
                self.pointer += i64::from(*delta);
                Ok(())
            }
            Instruction::Input { offset } => match self.input.pop_front() {
                Some(byte) => self.store(*offset, i64::from(byte)),
                None => self.address(*offset).map(|_| ()),
            },
            Instruction::Output { offset } => {
                let value = self.load(*offset)?;
                self.output.push(value as u8);
                Ok(())
            }
            Instruction::Write(bytes) => {
                self.output.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    fn tick(&mut self) -> Result<(), InterpretError> {
        self.steps += 1;
        match self.step_limit {
            Some(limit) if self.steps > limit => Err(InterpretError::StepLimit(limit)),
            _ => Ok(()),
        }
    }

    fn address(&self, offset: Offset) -> Result<usize, InterpretError> {
        let addr = self.pointer + i64::from(offset);
        if (0..TAPE_LEN as i64).contains(&addr) {
            Ok(addr as usize)
        } else {
            Err(InterpretError::PointerOutOfBounds(addr))
        }
    }

    fn load(&self, offset: Offset) -> Result<i64, InterpretError> {
        self.address(offset).map(|addr| self.tape[addr])
    }

    fn store(&mut self, offset: Offset, value: i64) -> Result<(), InterpretError> {
        let addr = self.address(offset)?;
        self.tape[addr] = self.config.cell_size().wrap(value);
        Ok(())
    }
}

/// Executes the tree to completion, returning everything it wrote.
pub fn interpret(
    config: &Config,
    node: &Node,
    input: impl IntoIterator<Item = u8>,
) -> Result<Vec<u8>, InterpretError> {
    let mut interpreter = Interpreter::new(config).with_input(input);
    interpreter.run(node).map(|_| interpreter.into_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellSize;

    fn add(offset: Offset, delta: i64) -> Node {
        Instruction::Add { offset, delta }.into()
    }

    #[test]
    fn should_interpret_counted_loop() {
        let config = Config::default();
        // 3 * 11 = 33 ('!')
        let program = Node::program(vec![
            add(0, 3),
            Node::looped(vec![add(1, 11), add(0, -1)]),
            Instruction::Output { offset: 1 }.into(),
        ]);

        assert_eq!(Ok(b"!".to_vec()), interpret(&config, &program, vec![]));
    }

    #[test]
    fn should_wrap_cells_to_configured_width() {
        let narrow = Config::new(CellSize::Bits8, false);
        let wide = Config::new(CellSize::Bits16, false);
        let program = Node::program(vec![
            add(0, -1),
            Instruction::Set {
                offset: 1,
                value: 0,
            }
            .into(),
            Node::looped(vec![add(0, -1), add(1, 1)]),
        ]);

        let mut interpreter = Interpreter::new(&narrow);
        assert_eq!(Ok(()), interpreter.run(&program));
        assert_eq!(255, interpreter.tape[1]);

        let mut interpreter = Interpreter::new(&wide);
        assert_eq!(Ok(()), interpreter.run(&program));
        assert_eq!(65535, interpreter.tape[1]);
    }

    #[test]
    fn should_leave_cell_unchanged_at_end_of_input() {
        let config = Config::default();
        let program = Node::program(vec![
            add(0, 65),
            Instruction::Input { offset: 0 }.into(),
            Instruction::Output { offset: 0 }.into(),
            Instruction::Input { offset: 0 }.into(),
            Instruction::Output { offset: 0 }.into(),
        ]);

        assert_eq!(Ok(b"zz".to_vec()), interpret(&config, &program, vec![b'z']));
        assert_eq!(Ok(b"AA".to_vec()), interpret(&config, &program, vec![]));
    }

    #[test]
    fn should_reject_pointer_moving_off_tape() {
        let config = Config::default();
        let program = Node::program(vec![Instruction::Move(-1).into(), add(0, 1)]);

        assert_eq!(
            Err(InterpretError::PointerOutOfBounds(-1)),
            interpret(&config, &program, vec![])
        );
    }

    #[test]
    fn should_stop_at_step_limit() {
        let config = Config::default();
        let program = Node::program(vec![add(0, 1), Node::looped(vec![])]);

        let mut interpreter = Interpreter::new(&config).with_step_limit(10);
        assert_eq!(Err(InterpretError::StepLimit(10)), interpreter.run(&program));
    }
}
