pub mod ast;
pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod scanner;
pub mod scope;
pub mod tokenizer;

#[cfg(test)]
mod tests_evaluation;

pub use ast::{Expr, Program, Span};
pub use error::{EvalError, EvalResult, ParseError, ParseResult};
pub use evaluator::Evaluator;
pub use parser::{parse, Parser};
pub use scanner::{scan_dependencies, scan_identifiers};
pub use scope::{LocalScope, MapScope, Scope};
pub use tokenizer::{tokenize, Token};

#[cfg(feature = "pretty-errors")]
pub use error::format_error;

use filament_common::Value;
use tracing::{debug, instrument};

/// A fragment parsed once and evaluated many times
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    program: Program,
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The name when the whole fragment is one bare identifier (`onClick`).
    pub fn as_identifier(&self) -> Option<&str> {
        match self.program.statements.as_slice() {
            [Expr::Identifier { name, .. }] => Some(name),
            _ => None,
        }
    }

    pub fn evaluate(&self, scope: &dyn Scope) -> EvalResult<Value> {
        Evaluator::new(scope).run(&self.program)
    }

    /// Evaluate with `$event` bound on top of `scope`.
    pub fn evaluate_with_event(&self, scope: &dyn Scope, event: Value) -> EvalResult<Value> {
        let local = LocalScope::new(scope).with("$event", event);
        self.evaluate(&local)
    }
}

/// Parse `source` into a reusable expression. Syntax errors surface here,
/// never at evaluation time.
#[instrument(level = "debug")]
pub fn compile(source: &str) -> ParseResult<CompiledExpression> {
    let program = parse(source)?;
    debug!(statements = program.statements.len(), "compiled expression");
    Ok(CompiledExpression {
        source: source.to_string(),
        program,
    })
}
