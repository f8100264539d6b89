pub mod interpret;

/// A cell offset relative to the current memory pointer.
pub type Offset = i32;

/// Node is a single element of a program tree. A leaf is an atomic
/// instruction, while a composite owns an ordered body of child nodes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Node {
    Leaf(Instruction),
    Composite(Block),
}

impl Node {
    /// Constructs a top-level program composite from the given body.
    pub fn program(body: Vec<Node>) -> Self {
        Self::Composite(Block::new(BlockKind::Program, body))
    }

    /// Constructs a loop composite, repeated while the current cell is
    /// non-zero.
    pub fn looped(body: Vec<Node>) -> Self {
        Self::Composite(Block::new(BlockKind::Loop, body))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Self::Leaf(inst) => Some(inst),
            Self::Composite(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Leaf(_) => None,
            Self::Composite(block) => Some(block),
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Leaf(_) => None,
            Self::Composite(block) => Some(block),
        }
    }

    fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Self::Leaf(inst) => writeln!(f, "{}{}", indent, inst),
            Self::Composite(block) => {
                writeln!(f, "{}{}", indent, block.kind)?;
                block
                    .body
                    .iter()
                    .try_for_each(|node| node.fmt_indented(f, depth + 1))
            }
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl From<Instruction> for Node {
    fn from(inst: Instruction) -> Self {
        Self::Leaf(inst)
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Self::Composite(block)
    }
}

/// Distinguishes the role of a composite node.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlockKind {
    Program,
    Loop,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Program => write!(f, "program"),
            Self::Loop => write!(f, "loop"),
        }
    }
}

/// Block is the body of a composite node.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub body: Vec<Node>,
}

impl Block {
    pub fn new(kind: BlockKind, body: Vec<Node>) -> Self {
        Self { kind, body }
    }

    /// Returns the leaf instructions directly in this block's body, or `None`
    /// if the body contains any composite.
    pub fn flat_instructions(&self) -> Option<Vec<&Instruction>> {
        self.body.iter().map(Node::as_instruction).collect()
    }
}

/// Instruction is an atomic operation against the memory tape, addressed
/// relative to the memory pointer.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction {
    /// `cell[offset] += delta`
    Add { offset: Offset, delta: i64 },
    /// `cell[offset] = value`
    Set { offset: Offset, value: i64 },
    /// `cell[offset] += cell[source] * factor`
    MulAdd {
        offset: Offset,
        source: Offset,
        factor: i64,
    },
    /// Moves the memory pointer.
    Move(Offset),
    /// Reads a byte into `cell[offset]`, leaving it unchanged at end of input.
    Input { offset: Offset },
    /// Writes the low byte of `cell[offset]`.
    Output { offset: Offset },
    /// Writes a constant byte string.
    Write(Vec<u8>),
}

impl Instruction {
    /// Returns the instruction with every cell reference shifted by `by`.
    pub fn shifted(self, by: Offset) -> Self {
        match self {
            Self::Add { offset, delta } => Self::Add {
                offset: offset + by,
                delta,
            },
            Self::Set { offset, value } => Self::Set {
                offset: offset + by,
                value,
            },
            Self::MulAdd {
                offset,
                source,
                factor,
            } => Self::MulAdd {
                offset: offset + by,
                source: source + by,
                factor,
            },
            Self::Input { offset } => Self::Input {
                offset: offset + by,
            },
            Self::Output { offset } => Self::Output {
                offset: offset + by,
            },
            inst @ (Self::Move(_) | Self::Write(_)) => inst,
        }
    }

    /// Returns true if executing the instruction has any effect outside of
    /// the memory tape and pointer.
    pub fn is_observable(&self) -> bool {
        matches!(
            self,
            Self::Input { .. } | Self::Output { .. } | Self::Write(_)
        )
    }

    /// Returns true if the instruction does nothing at all.
    pub fn is_nop(&self) -> bool {
        match self {
            Self::Add { delta, .. } => *delta == 0,
            Self::MulAdd { factor, .. } => *factor == 0,
            Self::Move(delta) => *delta == 0,
            Self::Write(bytes) => bytes.is_empty(),
            Self::Set { .. } | Self::Input { .. } | Self::Output { .. } => false,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { offset, delta } => write!(f, "add [{}] {:+}", offset, delta),
            Self::Set { offset, value } => write!(f, "set [{}] {}", offset, value),
            Self::MulAdd {
                offset,
                source,
                factor,
            } => write!(f, "muladd [{}] [{}] * {}", offset, source, factor),
            Self::Move(delta) => write!(f, "move {:+}", delta),
            Self::Input { offset } => write!(f, "input [{}]", offset),
            Self::Output { offset } => write!(f, "output [{}]", offset),
            Self::Write(bytes) => write!(f, "write {:?}", String::from_utf8_lossy(bytes)),
        }
    }
}
