use std::path::Path;

use crate::asm::{Instr, MAX_ALLOCATABLE};
use crate::diagnostic::{render_diagnostics, Diagnostic};
use crate::ir::parse::parse;
use crate::lower::Lowering;
use crate::program::Program;
use crate::span::Span;


/// Options controlling code generation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Usable register count, 1..=4.
    pub registers: u8,
    /// Echo each IR op as a `#` comment line above its code.
    pub comments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            registers: MAX_ALLOCATABLE,
            comments: true,
        }
    }
}

/// A successfully compiled unit.
#[derive(Clone, Debug)]
pub struct Compiled {
    pub program: Program,
    pub asm: String,
    pub warnings: Vec<Diagnostic>,
}

impl Compiled {
    /// Machine instructions, not counting directives, labels and comments.
    pub fn instruction_count(&self) -> usize {
        self.program
            .instructions()
            .iter()
            .filter(|i| !matches!(i, Instr::Meta(_)))
            .count()
    }
}

/// Compile IR text to assembly with default options.
pub fn compile(source: &str, filename: &str) -> Result<String, Vec<Diagnostic>> {
    compile_with_options(source, filename, &CompileOptions::default()).map(|c| c.asm)
}

/// Compile IR text, rendering errors and warnings to stderr.
pub fn compile_with_options(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<Compiled, Vec<Diagnostic>> {
    match compile_silent(source, options) {
        Ok(compiled) => {
            render_diagnostics(&compiled.warnings, filename, source);
            Ok(compiled)
        }
        Err(errors) => {
            render_diagnostics(&errors, filename, source);
            Err(errors)
        }
    }
}

/// Compile IR text without rendering anything.
pub fn compile_silent(source: &str, options: &CompileOptions) -> Result<Compiled, Vec<Diagnostic>> {
    let ops = parse(source)?;
    let lowered = Lowering::new(options.registers)
        .with_comments(options.comments)
        .lower(&ops)
        .map_err(|e| vec![e])?;
    let warnings = lowered.warnings.clone();
    let program = Program::new(lowered);
    let asm = program.to_asm();
    Ok(Compiled {
        program,
        asm,
        warnings,
    })
}

/// Read and compile an IR file. Like `compile_with_options`, renders
/// whatever goes wrong.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<Compiled, Vec<Diagnostic>> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        let diag = Diagnostic::error(
            format!("cannot read '{}': {}", path.display(), e),
            Span::dummy(),
        );
        diag.render_plain();
        vec![diag]
    })?;
    compile_with_options(&source, &path.to_string_lossy(), options)
}
