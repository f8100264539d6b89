use bfc::ast::interpret::interpret;
use bfc::codegen::c::CGenerator;
use bfc::parser::BrainfuckParser;
use bfc::{CellSize, Compiler, Config};
use clap::Parser;
use std::fs::{File, OpenOptions};
use std::io::{self, prelude::*};

type RuntimeResult<T> = Result<T, RuntimeError>;

/// Represents an error that can return an exit code.
trait ErrorWithExitCode {
    /// Returns an exit status for a given error;
    fn exit_code(&self) -> i32;
}

#[derive(Debug, thiserror::Error)]
enum RuntimeError {
    #[error("file unreadable: {0}")]
    FileUnreadable(String),
    #[error("{0}")]
    Compile(String),
    #[error("{0}")]
    Undefined(String),
}

impl ErrorWithExitCode for RuntimeError {
    fn exit_code(&self) -> i32 {
        match self {
            Self::FileUnreadable(_) => 1,
            Self::Compile(_) => 2,
            Self::Undefined(_) => 127,
        }
    }
}

/// An optimizing Brainfuck to C compiler.
#[derive(Debug, clap::Parser)]
#[command(name = "bfc", version, author)]
struct Args {
    /// an input path for a source file.
    #[arg(short, long)]
    in_file: String,

    /// a C output path.
    #[arg(short, long, default_value = "a.c")]
    out_file: String,

    /// the width of a memory cell in bits: 8, 16 or 32.
    #[arg(short, long, default_value = "8", value_parser = parse_cell_size)]
    cell_size: CellSize,

    /// annotate generated code and log every pass.
    #[arg(short, long)]
    debug: bool,

    /// interpret the optimized program against stdin instead of emitting C.
    #[arg(long)]
    run: bool,
}

fn parse_cell_size(bits: &str) -> Result<CellSize, String> {
    let bits: u32 = bits.parse().map_err(|e| format!("{}", e))?;
    CellSize::try_from(bits).map_err(|e| e.to_string())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn read_src_file(filename: &str) -> RuntimeResult<Vec<u8>> {
    let mut f = File::open(filename).map_err(|e| RuntimeError::FileUnreadable(e.to_string()))?;

    let mut contents = vec![];
    match f.read_to_end(&mut contents) {
        Ok(_) => Ok(contents),
        Err(e) => Err(RuntimeError::Undefined(e.to_string())),
    }
}

fn write_dest_file(filename: &str, data: &[u8]) -> RuntimeResult<()> {
    let mut f = OpenOptions::new()
        .truncate(true)
        .create(true)
        .write(true)
        .open(filename)
        .map_err(|e| RuntimeError::FileUnreadable(e.to_string()))?;

    match f.write_all(data) {
        Ok(_) => Ok(()),
        Err(e) => Err(RuntimeError::Undefined(e.to_string())),
    }
}

fn compile(config: Config, source: &[u8]) -> RuntimeResult<String> {
    Compiler::<BrainfuckParser, CGenerator>::new(config)
        .compile(source)
        .map(CGenerator::into_output)
        .map_err(|e| RuntimeError::Compile(e.to_string()))
}

fn run(config: Config, source: &[u8]) -> RuntimeResult<()> {
    let compiler = Compiler::<BrainfuckParser, CGenerator>::new(config);
    let tree = compiler
        .parse(source)
        .map_err(|e| RuntimeError::Compile(e.to_string()))
        .and_then(|tree| {
            compiler
                .optimize(tree)
                .map_err(|e| RuntimeError::Compile(e.to_string()))
        })?;

    let mut input = vec![];
    io::stdin()
        .read_to_end(&mut input)
        .map_err(|e| RuntimeError::Undefined(e.to_string()))?;

    let output = interpret(compiler.config(), &tree, input)
        .map_err(|e| RuntimeError::Undefined(e.to_string()))?;
    io::stdout()
        .write_all(&output)
        .and_then(|_| io::stdout().flush())
        .map_err(|e| RuntimeError::Undefined(e.to_string()))
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = Config::new(args.cell_size, args.debug);
    let eval_res = read_src_file(&args.in_file).and_then(|source| {
        if args.run {
            run(config, &source)
        } else {
            compile(config, &source).and_then(|c| write_dest_file(&args.out_file, c.as_bytes()))
        }
    });

    if let Err(e) = eval_res {
        eprintln!("{}", e);
        std::process::exit(e.exit_code())
    }
}
