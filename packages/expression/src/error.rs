//! Error types for parsing and evaluating template expressions

use crate::ast::Span;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Parse error with location and context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {span}: expected {expected}, found {found}")]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of expression: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Invalid syntax at {span}: {message}")]
    InvalidSyntax { span: Span, message: String },

    #[error("Unrecognized input at {span}: '{text}'")]
    LexerError { span: Span, text: String },
}

impl ParseError {
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: Span, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span,
            message: message.into(),
        }
    }

    pub fn lexer_error(span: Span, text: impl Into<String>) -> Self {
        Self::LexerError {
            span,
            text: text.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::UnexpectedEof { pos, .. } => Span::new(*pos, *pos),
            ParseError::InvalidSyntax { span, .. } => *span,
            ParseError::LexerError { span, .. } => *span,
        }
    }

    /// Shift every position by `offset`, used when a fragment was parsed
    /// out of a larger source (template literal holes).
    pub(crate) fn offset(self, offset: usize) -> Self {
        match self {
            ParseError::UnexpectedToken {
                span,
                expected,
                found,
            } => ParseError::UnexpectedToken {
                span: span.shift(offset),
                expected,
                found,
            },
            ParseError::UnexpectedEof { pos, expected } => ParseError::UnexpectedEof {
                pos: pos + offset,
                expected,
            },
            ParseError::InvalidSyntax { span, message } => ParseError::InvalidSyntax {
                span: span.shift(offset),
                message,
            },
            ParseError::LexerError { span, text } => ParseError::LexerError {
                span: span.shift(offset),
                text,
            },
        }
    }
}

/// Runtime error raised while evaluating an expression
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("'{name}' is not defined")]
    UndefinedVariable { name: String },

    #[error("'{name}' is not a function")]
    NotCallable { name: String },

    #[error("{receiver} has no method '{method}'")]
    UnknownMethod {
        receiver: &'static str,
        method: String,
    },

    #[error("Invalid assignment: {message}")]
    InvalidAssignment { message: String },

    #[error("Type error: {message}")]
    TypeError { message: String },

    /// Failure raised by a scope implementation (a component method, a
    /// property listener) while the expression was running.
    #[error("{0}")]
    External(Box<dyn std::error::Error>),
}

impl EvalError {
    pub fn undefined(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }

    pub fn not_callable(name: impl Into<String>) -> Self {
        Self::NotCallable { name: name.into() }
    }

    pub fn unknown_method(receiver: &'static str, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            receiver,
            method: method.into(),
        }
    }

    pub fn invalid_assignment(message: impl Into<String>) -> Self {
        Self::InvalidAssignment {
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn external(error: impl std::error::Error + 'static) -> Self {
        Self::External(Box::new(error))
    }
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();
    let span = error.span();
    let end = span.end.max(span.start + 1).min(source.len().max(span.start));

    let report = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span.start..end))
                .with_color(Color::Red)
                .with_message(match error {
                    ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
                    ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
                    ParseError::InvalidSyntax { message, .. } => message.clone(),
                    ParseError::LexerError { .. } => "unrecognized input".to_string(),
                }),
        )
        .finish();

    if report
        .write((filename, Source::from(source)), &mut output)
        .is_err()
    {
        return error.to_string();
    }

    String::from_utf8(output).unwrap_or_else(|_| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_moves_spans() {
        let err = ParseError::invalid_syntax(Span::new(1, 3), "bad").offset(10);
        assert_eq!(err.span(), Span::new(11, 13));
    }

    #[cfg(feature = "pretty-errors")]
    #[test]
    fn test_format_error_mentions_message() {
        let err = ParseError::unexpected_token(Span::new(2, 3), "expression", "')'");
        let rendered = format_error("a +) b", "inline", &err);
        assert!(rendered.contains("expected expression"));
    }
}
