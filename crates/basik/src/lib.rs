#![doc = include_str!("../../../README.md")]

pub mod bytecode;
mod error;
pub mod expressions;
mod module;
mod options;
pub mod parse;
mod program;
pub mod qualname;
mod scope;
pub mod tracer;

pub use crate::{
    bytecode::disasm,
    error::{CompileError, CompileErrorKind, SourceLocation},
    module::{CompiledModule, CompiledUnit, compile_module, root_name},
    options::{CompileOptions, DEFAULT_ENTRY_TAG, DEFAULT_UNIT_KIND, IntWidth, MAX_NESTING_DEPTH},
    parse::{CodeLoc, CodeRange},
    program::Program,
    scope::{NameAccess, Scope},
    tracer::{CompileTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
};

/// Parses and compiles Python source into a module.
///
/// `path` is used for the root unit name (its base file name) and for error
/// locations. On error nothing is produced.
///
/// # Example
/// ```
/// use basik::{CompileOptions, compile_source};
///
/// let module = compile_source("print('hello')", "hello.py", &CompileOptions::default()).unwrap();
/// assert_eq!(module.units().len(), 1);
/// assert_eq!(module.units()[0].name(), "file;hello.py/entry");
/// ```
pub fn compile_source(source: &str, path: &str, options: &CompileOptions) -> Result<CompiledModule, CompileError> {
    compile_source_traced(source, path, options, &mut NoopTracer)
}

/// Like [`compile_source`], reporting compilation events to `tracer`.
pub fn compile_source_traced(
    source: &str,
    path: &str,
    options: &CompileOptions,
    tracer: &mut impl CompileTracer,
) -> Result<CompiledModule, CompileError> {
    let nodes = parse::parse(source, path, options.max_nesting_depth)?;
    compile_module(&nodes, path, options, tracer)
}
