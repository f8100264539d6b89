pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod parser;
pub mod pass;
pub mod rewrite;
pub mod visit;

pub use compiler::{CompileError, Compiler};
pub use config::{CellSize, Config};

#[cfg(test)]
mod tests {
    use crate::ast::interpret::{InterpretError, Interpreter};
    use crate::ast::Node;
    use crate::codegen::c::CGenerator;
    use crate::parser::{BrainfuckParser, Parser};
    use crate::{CellSize, Compiler, Config};

    const HELLO_WORLD: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]\
        >>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

    const STEP_LIMIT: u64 = 1_000_000;

    /// Interprets `source` before and after optimization, returning both
    /// results. Each run is bounded by `STEP_LIMIT`.
    fn run_both(
        config: Config,
        source: &str,
        input: &[u8],
    ) -> (Result<Vec<u8>, InterpretError>, Result<Vec<u8>, InterpretError>) {
        let compiler = Compiler::<BrainfuckParser, CGenerator>::new(config);
        let parsed = compiler.parse(source.as_bytes()).unwrap();
        let optimized = compiler.optimize(parsed.clone()).unwrap();

        let run = |tree: &Node| {
            let mut interpreter = Interpreter::new(compiler.config())
                .with_input(input.iter().copied())
                .with_step_limit(STEP_LIMIT);
            interpreter.run(tree).map(|_| interpreter.into_output())
        };
        (run(&parsed), run(&optimized))
    }

    #[test]
    fn should_preserve_output_of_hello_world() {
        let (before, after) = run_both(Config::default(), HELLO_WORLD, b"");

        assert_eq!(Ok(b"Hello World!\n".to_vec()), before);
        assert_eq!(before, after);
    }

    #[test]
    fn should_preserve_output_of_input_driven_programs() {
        let programs = [
            // cat, stopping at a zero byte
            ",[.,]",
            // doubles the first byte read
            ",[->++<]>.",
            // prints the bytes read in reverse
            ">,[>,]<[.<]",
            // moves a value two cells over, then prints every cell touched
            ",[->>+<<]>>.<.<.",
        ];

        for source in programs {
            for cell_size in [CellSize::Bits8, CellSize::Bits16] {
                let (before, after) =
                    run_both(Config::new(cell_size, false), source, b"Rust!\0");
                assert!(before.is_ok(), "program {:?} at {} bits", source, cell_size);
                assert_eq!(before, after, "program {:?} at {} bits", source, cell_size);
            }
        }
    }

    #[test]
    fn should_bound_programs_that_never_halt() {
        // end of input leaves the last byte in place, so cat never stops
        let (before, after) = run_both(Config::default(), ",[.,]", b"Rust!");

        assert_eq!(Err(InterpretError::StepLimit(STEP_LIMIT)), before);
        assert_eq!(before, after);
    }

    #[test]
    fn should_wrap_constant_output_to_cell_width() {
        let (before, after) = run_both(Config::default(), "-.>++[>+++<-]>.", b"");

        assert_eq!(Ok(vec![255, 6]), before);
        assert_eq!(before, after);
    }

    #[test]
    fn should_fold_constant_output_into_generated_c() {
        let compiler = Compiler::<BrainfuckParser, CGenerator>::new(Config::default());
        let generated = compiler.compile("+++.>++.".as_bytes()).unwrap().into_output();

        assert!(generated.contains("fwrite(\"\\003\\002\", 1, 2, stdout);"));
        assert!(!generated.contains("putchar(p["));
    }

    #[test]
    fn should_surface_parse_errors_from_compile() {
        let compiler = Compiler::<BrainfuckParser, CGenerator>::new(Config::default());
        let err = compiler.compile("+]".as_bytes()).err().unwrap();

        assert_eq!("unmatched `]` at offset 1", err.to_string());
    }

    #[test]
    fn should_parse_without_compiler() {
        let tree = BrainfuckParser::new(&Config::default())
            .parse("[-]".as_bytes())
            .unwrap();

        assert_eq!("program\n  loop\n    add [0] -1\n", tree.to_string());
    }
}
