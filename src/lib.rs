//! yokc: compiles yok scripts into POSIX sh.
//!
//! The pipeline is `lexer` -> `parser` -> `fixer` -> `lower` -> `codegen`. Each stage
//! collects its diagnostics instead of stopping at the first one.

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod error;
pub mod fixer;
pub mod formatter;
pub mod ir;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod span;
pub mod suggest;

pub use codegen::CodegenOptions;
pub use error::{CompileError, Diagnostic, Title};

/// Parses `src` into the source tree without compiling it.
pub fn parse(src: &[u8]) -> Result<ast::Script, CompileError> {
    let (script, errors) = parser::parse(src);
    if !errors.is_empty() {
        return Err(CompileError::Parse(errors));
    }
    Ok(script)
}

/// Compiles `src` into a shell script with default options.
pub fn compile(src: &[u8]) -> Result<String, CompileError> {
    compile_with_options(src, &CodegenOptions::default())
}

/// Compiles `src` with explicit code generation options.
pub fn compile_with_options(src: &[u8], opts: &CodegenOptions) -> Result<String, CompileError> {
    let script = parse(src)?;
    let fixed = fixer::fix(script);
    let lowered = lower::lower(&fixed)?;
    Ok(codegen::emit_with_options(&lowered, opts))
}

/// Re-prints `src` in canonical layout.
pub fn format(src: &[u8]) -> Result<String, CompileError> {
    let script = parse(src)?;
    Ok(formatter::format_script(&script))
}
