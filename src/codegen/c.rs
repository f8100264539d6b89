//! A generator emitting a self-contained C99 program.

use super::{CodeGenerationErr, Generator};
use crate::ast::interpret::TAPE_LEN;
use crate::ast::{Block, BlockKind, Instruction, Node, Offset};
use crate::config::{CellSize, Config};

const INDENT: &str = "    ";

/// CGenerator buffers the lines of each generated program, exposing them
/// through `output` once flushed.
#[derive(Debug)]
pub struct CGenerator {
    cell_size: CellSize,
    debugging: bool,
    pending: Vec<String>,
    output: String,
}

impl CGenerator {
    /// Returns everything flushed so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Generator for CGenerator {
    type Error = CodeGenerationErr;

    fn new(config: &Config) -> Self {
        Self {
            cell_size: config.cell_size(),
            debugging: config.debugging(),
            pending: vec![],
            output: String::new(),
        }
    }

    fn generate(&mut self, node: &Node) -> Result<(), Self::Error> {
        let body = match node {
            Node::Composite(Block {
                kind: BlockKind::Program,
                body,
            }) => self.codegen_body(body, 1)?,
            other => self.codegen_node(other, 1)?,
        };

        self.pending.extend(codegen_preamble(self.cell_size));
        self.pending.extend(body);
        self.pending.extend(codegen_postamble());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        for line in self.pending.drain(..) {
            self.output.push_str(&line);
            self.output.push('\n');
        }
        Ok(())
    }
}

impl CGenerator {
    fn codegen_body(&self, body: &[Node], depth: usize) -> Result<Vec<String>, CodeGenerationErr> {
        body.iter().try_fold(vec![], |mut lines, node| {
            lines.extend(self.codegen_node(node, depth)?);
            Ok(lines)
        })
    }

    fn codegen_node(&self, node: &Node, depth: usize) -> Result<Vec<String>, CodeGenerationErr> {
        let indent = INDENT.repeat(depth);
        match node {
            Node::Leaf(inst) => {
                let mut lines = vec![];
                if self.debugging {
                    lines.push(format!("{}{}", indent, codegen_comment(inst)));
                }
                lines.push(format!(
                    "{}{}",
                    indent,
                    codegen_instruction(self.cell_size, inst)?
                ));
                Ok(lines)
            }
            Node::Composite(Block {
                kind: BlockKind::Loop,
                body,
            }) => {
                let mut lines = vec![format!("{}while (p[0]) {{", indent)];
                lines.extend(self.codegen_body(body, depth + 1)?);
                lines.push(format!("{}}}", indent));
                Ok(lines)
            }
            Node::Composite(Block { kind, .. }) => Err(CodeGenerationErr::UnexpectedBlock(*kind)),
        }
    }
}

fn codegen_preamble(cell_size: CellSize) -> Vec<String> {
    let cell_type = cell_size.c_type();
    vec![
        String::from("#include <stdint.h>"),
        String::from("#include <stdio.h>"),
        String::new(),
        format!("static {} tape[{}];", cell_type, TAPE_LEN),
        String::new(),
        String::from("int main(void) {"),
        format!("{}{} *p = tape;", INDENT, cell_type),
    ]
}

fn codegen_postamble() -> Vec<String> {
    vec![format!("{}return 0;", INDENT), String::from("}")]
}

fn codegen_comment(inst: &Instruction) -> String {
    format!("/* {} */", inst.to_string().replace("*/", "* /"))
}

fn codegen_instruction(cell_size: CellSize, inst: &Instruction) -> Result<String, CodeGenerationErr> {
    let stmt = match inst {
        Instruction::Add { offset, delta } => {
            let (op, magnitude) = signed(cell_size, *delta);
            format!("{} {}= {};", cell(*offset)?, op, magnitude)
        }
        Instruction::Set { offset, value } => {
            format!("{} = {};", cell(*offset)?, cell_size.wrap(*value))
        }
        Instruction::MulAdd {
            offset,
            source,
            factor,
        } => {
            let (op, magnitude) = signed(cell_size, *factor);
            if magnitude == 1 {
                format!("{} {}= {};", cell(*offset)?, op, cell(*source)?)
            } else {
                format!("{} {}= {} * {};", cell(*offset)?, op, cell(*source)?, magnitude)
            }
        }
        Instruction::Move(delta) => {
            in_range(i64::from(*delta))?;
            match delta.signum() {
                -1 => format!("p -= {};", delta.unsigned_abs()),
                _ => format!("p += {};", delta),
            }
        }
        Instruction::Input { offset } => format!(
            "{{ int c = getchar(); if (c != EOF) {} = ({})c; }}",
            cell(*offset)?,
            cell_size.c_type()
        ),
        Instruction::Output { offset } => format!("putchar({});", cell(*offset)?),
        Instruction::Write(bytes) => match bytes.as_slice() {
            [byte] => format!("putchar({});", byte),
            bytes => format!(
                "fwrite(\"{}\", 1, {}, stdout);",
                escape(bytes),
                bytes.len()
            ),
        },
    };
    Ok(stmt)
}

/// Splits a value into the operator and magnitude that express it in the
/// cell's modular arithmetic, preferring the smaller magnitude.
fn signed(cell_size: CellSize, value: i64) -> (char, i64) {
    let wrapped = cell_size.wrap(value);
    let modulus = cell_size.wrap(-1) + 1;
    if wrapped > modulus / 2 {
        ('-', modulus - wrapped)
    } else {
        ('+', wrapped)
    }
}

fn in_range(offset: i64) -> Result<i64, CodeGenerationErr> {
    if offset.unsigned_abs() < TAPE_LEN as u64 {
        Ok(offset)
    } else {
        Err(CodeGenerationErr::OffsetOutOfRange(offset))
    }
}

fn cell(offset: Offset) -> Result<String, CodeGenerationErr> {
    in_range(i64::from(offset)).map(|offset| format!("p[{}]", offset))
}

/// Renders bytes as the contents of a C string literal. Everything outside
/// of printable ASCII, along with quotes, backslashes and `?`, is written as
/// a three digit octal escape.
fn escape(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| match byte {
            b'"' | b'\\' | b'?' => format!("\\{:03o}", byte),
            b' '..=b'~' => char::from(byte).to_string(),
            _ => format!("\\{:03o}", byte),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(config: &Config, node: &Node) -> CGenerator {
        let mut generator = CGenerator::new(config);
        generator.generate(node).unwrap();
        generator.flush().unwrap();
        generator
    }

    #[test]
    fn should_only_expose_output_after_flush() {
        let config = Config::default();
        let mut generator = CGenerator::new(&config);

        generator.generate(&Node::program(vec![])).unwrap();
        assert_eq!("", generator.output());

        generator.flush().unwrap();
        assert!(generator.output().starts_with("#include <stdint.h>\n"));
    }

    #[test]
    fn should_generate_complete_program() {
        let config = Config::default();
        let tree = Node::program(vec![
            Instruction::Add {
                offset: 0,
                delta: 65,
            }
            .into(),
            Node::looped(vec![
                Instruction::Output { offset: 0 }.into(),
                Instruction::Add {
                    offset: 0,
                    delta: -1,
                }
                .into(),
                Instruction::Move(-2).into(),
            ]),
        ]);

        let expected = "#include <stdint.h>
#include <stdio.h>

static uint8_t tape[30000];

int main(void) {
    uint8_t *p = tape;
    p[0] += 65;
    while (p[0]) {
        putchar(p[0]);
        p[0] -= 1;
        p -= 2;
    }
    return 0;
}
";
        assert_eq!(expected, generate(&config, &tree).output());
    }

    #[test]
    fn should_express_values_in_cell_arithmetic() {
        let cell_size = CellSize::Bits8;
        let muladd = |factor| Instruction::MulAdd {
            offset: 1,
            source: -1,
            factor,
        };

        assert_eq!(
            "p[2] -= 1;",
            codegen_instruction(cell_size, &Instruction::Add { offset: 2, delta: 255 }).unwrap()
        );
        assert_eq!(
            "p[0] = 255;",
            codegen_instruction(cell_size, &Instruction::Set { offset: 0, value: -1 }).unwrap()
        );
        assert_eq!("p[1] += p[-1];", codegen_instruction(cell_size, &muladd(1)).unwrap());
        assert_eq!("p[1] -= p[-1];", codegen_instruction(cell_size, &muladd(-1)).unwrap());
        assert_eq!("p[1] -= p[-1] * 3;", codegen_instruction(cell_size, &muladd(-3)).unwrap());
        assert_eq!(
            "{ int c = getchar(); if (c != EOF) p[0] = (uint16_t)c; }",
            codegen_instruction(CellSize::Bits16, &Instruction::Input { offset: 0 }).unwrap()
        );
    }

    #[test]
    fn should_escape_written_strings() {
        let cell_size = CellSize::Bits8;

        assert_eq!(
            "putchar(10);",
            codegen_instruction(cell_size, &Instruction::Write(vec![b'\n'])).unwrap()
        );
        assert_eq!(
            "fwrite(\"Hi\\042\\077\\012\", 1, 5, stdout);",
            codegen_instruction(cell_size, &Instruction::Write(b"Hi\"?\n".to_vec())).unwrap()
        );
    }

    #[test]
    fn should_annotate_statements_when_debugging() {
        let config = Config::new(CellSize::Bits32, true);
        let tree = Node::program(vec![Instruction::Output { offset: 1 }.into()]);

        let output = generate(&config, &tree).into_output();
        assert!(output.contains("static uint32_t tape[30000];"));
        assert!(output.contains("    /* output [1] */\n    putchar(p[1]);\n"));
    }

    #[test]
    fn should_reject_unrepresentable_trees() {
        let config = Config::default();

        let nested = Node::program(vec![Node::program(vec![])]);
        assert_eq!(
            Err(CodeGenerationErr::UnexpectedBlock(BlockKind::Program)),
            CGenerator::new(&config).generate(&nested)
        );

        let distant = Node::program(vec![Instruction::Output { offset: 30_000 }.into()]);
        assert_eq!(
            Err(CodeGenerationErr::OffsetOutOfRange(30_000)),
            CGenerator::new(&config).generate(&distant)
        );
    }
}
