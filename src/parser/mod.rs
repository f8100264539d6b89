//! Turns Brainfuck source into an unoptimized program tree.

use crate::ast::{Instruction, Node};
use crate::config::Config;
use std::io::Read;
use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::{ModalResult, Parser as _};
use winnow::token::{any, one_of, take_till};

/// Parser produces a program tree from a stream of source bytes.
pub trait Parser {
    type Error: std::error::Error;

    fn new(config: &Config) -> Self;
    fn parse<R: Read>(&mut self, source: R) -> Result<Node, Self::Error>;
}

/// ParseError represents source that could not be read or is not a
/// well-formed program.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unable to read source: {0}")]
    Io(#[from] std::io::Error),
    #[error("unmatched `]` at offset {offset}")]
    UnmatchedClose { offset: usize },
    #[error("unclosed `[` at offset {offset}")]
    UnclosedLoop { offset: usize },
}

const COMMANDS: &[u8] = b"+-<>,.[]";

/// BrainfuckParser maps every command onto a single instruction and every
/// bracket pair onto a loop. All other bytes are comments.
#[derive(Debug)]
pub struct BrainfuckParser {
    config: Config,
}

impl Parser for BrainfuckParser {
    type Error = ParseError;

    fn new(config: &Config) -> Self {
        Self { config: *config }
    }

    fn parse<R: Read>(&mut self, mut source: R) -> Result<Node, Self::Error> {
        let mut buf = vec![];
        source.read_to_end(&mut buf)?;

        let mut remaining = &buf[..];
        match body.parse_next(&mut remaining) {
            Ok(nodes) if remaining.is_empty() => {
                tracing::debug!(
                    bytes = buf.len(),
                    nodes = nodes.len(),
                    cell_size = %self.config.cell_size(),
                    "parsed source"
                );
                Ok(Node::program(nodes))
            }
            _ => Err(unbalanced(&buf)),
        }
    }
}

/// Locates the bracket responsible for `source` failing to parse.
fn unbalanced(source: &[u8]) -> ParseError {
    let mut open = vec![];
    for (offset, byte) in source.iter().enumerate() {
        match byte {
            b'[' => open.push(offset),
            b']' if open.pop().is_none() => return ParseError::UnmatchedClose { offset },
            _ => (),
        }
    }

    match open.first() {
        Some(&offset) => ParseError::UnclosedLoop { offset },
        None => ParseError::UnmatchedClose {
            offset: source.len(),
        },
    }
}

fn command(byte: u8) -> Option<Node> {
    let inst = match byte {
        b'+' => Instruction::Add {
            offset: 0,
            delta: 1,
        },
        b'-' => Instruction::Add {
            offset: 0,
            delta: -1,
        },
        b'>' => Instruction::Move(1),
        b'<' => Instruction::Move(-1),
        b',' => Instruction::Input { offset: 0 },
        b'.' => Instruction::Output { offset: 0 },
        _ => return None,
    };
    Some(inst.into())
}

fn comment(input: &mut &[u8]) -> ModalResult<()> {
    take_till(0.., |byte: u8| COMMANDS.contains(&byte))
        .void()
        .parse_next(input)
}

fn instruction(input: &mut &[u8]) -> ModalResult<Node> {
    any.verify_map(command).parse_next(input)
}

fn looped(input: &mut &[u8]) -> ModalResult<Node> {
    delimited(one_of(b'['), body, one_of(b']'))
        .map(Node::looped)
        .parse_next(input)
}

fn body(input: &mut &[u8]) -> ModalResult<Vec<Node>> {
    preceded(comment, repeat(0.., terminated(alt((instruction, looped)), comment)))
        .parse_next(input)
}
