//! Lexes, parses, type-checks, interprets, and emits LLVM IR for a small
//! indentation-sensitive scripting language. Modules are organized the way
//! the teacher crate lays out a compiler pipeline: one module per pipeline
//! stage, each owning its own error type.

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod typechecker;
pub mod types;
pub mod value;

use std::error::Error;
use std::fmt::Display;

use ast::Program;
use typechecker::error::TypeCheckError;

/// Any failure from the lex/parse/typecheck/evaluate pipeline, rendered with
/// a caret excerpt against the original source.
#[derive(Debug)]
pub struct PipelineError(pub String);

impl Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for PipelineError {}

fn lex_and_parse(source: &str) -> Result<Program, PipelineError> {
    let tokens = lexer::tokenize(source).map_err(|e| {
        let pos = match &e {
            lexer::LexError::IndentationMismatch { pos, .. } => *pos,
        };
        PipelineError(diagnostics::render(source, pos, &e))
    })?;
    parser::parse(tokens).map_err(|e| PipelineError(diagnostics::render(source, e.pos, &e)))
}

/// Lexes, parses, and type-checks `source`, returning the first structured
/// type error without running the program. Used by callers that only care
/// whether a program is well-typed (for example, the two failure scenarios
/// this language's test suite documents).
pub fn type_check_source(source: &str) -> Result<(), TypeCheckError> {
    let program = lex_and_parse(source).expect("source must already be lexically and syntactically valid");
    typechecker::check(&program)
}

/// Runs `source` end to end (lex, parse, typecheck, interpret) and returns
/// everything the program printed. `input` feeds the `input()` builtin.
pub fn run_to_string(source: &str, input: &str) -> Result<String, Box<dyn Error>> {
    let program = lex_and_parse(source)?;
    typechecker::check(&program)
        .map_err(|e| PipelineError(diagnostics::render(source, e.pos(), &e)))?;

    let mut output = Vec::new();
    {
        let interpreter = interpreter::Interpreter::new(input.as_bytes(), &mut output);
        interpreter
            .run(&program)
            .map_err(|e| PipelineError(diagnostics::render(source, e.pos(), &e)))?;
    }
    Ok(String::from_utf8(output).expect("interpreter only ever writes valid UTF-8"))
}

/// Lexes, parses, type-checks, and lowers `source` to textual LLVM IR.
pub fn emit_llvm_ir(source: &str) -> Result<String, Box<dyn Error>> {
    let program = lex_and_parse(source)?;
    typechecker::check(&program)
        .map_err(|e| PipelineError(diagnostics::render(source, e.pos(), &e)))?;
    Ok(codegen::emit_module(&program)?)
}
