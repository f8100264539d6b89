//! The compilation pipeline: parse, optimize through an ordered list of
//! passes, then generate.

use crate::ast::Node;
use crate::codegen::Generator;
use crate::config::Config;
use crate::parser::Parser;
use crate::pass::{default_passes, PassDescriptor, PassError};
use std::io::Read;
use std::marker::PhantomData;

/// CompileError surfaces the failure of any stage unchanged.
#[derive(Debug, thiserror::Error)]
pub enum CompileError<PE, GE>
where
    PE: std::error::Error,
    GE: std::error::Error,
{
    #[error(transparent)]
    Parse(PE),
    #[error(transparent)]
    Optimize(#[from] PassError),
    #[error(transparent)]
    Generate(GE),
}

/// Compiler owns the configuration of a single compilation and the pass
/// schedule applied between parsing and generation.
pub struct Compiler<P, G> {
    config: Config,
    pub passes: Vec<PassDescriptor>,
    stages: PhantomData<fn() -> (P, G)>,
}

impl<P, G> Compiler<P, G>
where
    P: Parser,
    G: Generator,
{
    /// Returns a compiler scheduled with the default passes.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            passes: default_passes(),
            stages: PhantomData,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Schedules `pass` after every pass already scheduled.
    pub fn add_pass(&mut self, pass: PassDescriptor) -> &mut Self {
        self.passes.push(pass);
        self
    }

    pub fn parse<R: Read>(&self, source: R) -> Result<Node, P::Error> {
        let _span = tracing::info_span!("parse").entered();
        P::new(&self.config).parse(source)
    }

    /// Runs every scheduled pass exactly once, in order, each receiving the
    /// tree returned by the one before it.
    pub fn optimize(&self, node: Node) -> Result<Node, PassError> {
        let _span = tracing::info_span!("optimize", passes = self.passes.len()).entered();

        self.passes
            .iter()
            .enumerate()
            .try_fold(node, |node, (position, descriptor)| {
                let mut pass = descriptor.construct(&self.config);
                tracing::debug!(
                    pass = descriptor.name(),
                    position,
                    applies = pass.applies(&node),
                    "running pass"
                );
                pass.transform(node)
            })
    }

    /// Generates and flushes `node`, returning the generator so its output
    /// can be collected.
    pub fn generate(&self, node: &Node) -> Result<G, G::Error> {
        let _span = tracing::info_span!("generate").entered();
        let mut generator = G::new(&self.config);
        generator.generate(node)?;
        generator.flush()?;
        Ok(generator)
    }

    pub fn compile<R: Read>(&self, source: R) -> Result<G, CompileError<P::Error, G::Error>> {
        let node = self.parse(source).map_err(CompileError::Parse)?;
        let node = self.optimize(node)?;
        self.generate(&node).map_err(CompileError::Generate)
    }
}
