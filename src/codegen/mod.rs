//! Code generation from an optimized program tree.

use crate::ast::{BlockKind, Node};
use crate::config::Config;

pub mod c;

/// CodeGenerationErr represents an error stemming from a Generator's
/// `generate` or `flush` methods, capturing any point of breakdown within
/// the code generation process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeGenerationErr {
    #[error("cell offset {0} lies outside of the memory tape")]
    OffsetOutOfRange(i64),
    #[error("unexpected {0} block nested inside a body")]
    UnexpectedBlock(BlockKind),
}

/// Generator consumes a program tree and buffers its translation until
/// `flush` is called.
pub trait Generator {
    type Error: std::error::Error;

    fn new(config: &Config) -> Self;
    fn generate(&mut self, node: &Node) -> Result<(), Self::Error>;
    fn flush(&mut self) -> Result<(), Self::Error>;
}
