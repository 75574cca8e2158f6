use filament_dom::DomError;
use filament_expression::{EvalError, ParseError};
use thiserror::Error;

pub type ObserverResult<T> = Result<T, ObserverError>;

#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("Property '{name}' does not exist")]
    UnknownProperty { name: String },

    #[error("Method '{name}' does not exist")]
    UnknownMethod { name: String },

    #[error("'{name}' is declared more than once")]
    DuplicateName { name: String },

    #[error("Computed property '{name}' depends on itself")]
    ComputedCycle { name: String },

    #[error("Malformed {directive} directive \"{value}\": {message}")]
    MalformedDirective {
        directive: String,
        value: String,
        message: String,
    },

    #[error("Cannot iterate over property '{property}': expected an array, found {found}")]
    InvalidIterationSource {
        property: String,
        found: &'static str,
    },

    #[error("Items property '{property}' must be an array or an object, found {found}")]
    InvalidItemsSource {
        property: String,
        found: &'static str,
    },

    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("Cannot bind <{tag}> of type '{kind}': no adapter for this control")]
    UnsupportedInput { tag: String, kind: String },

    #[error("Property '{name}' holds {found}, not a list")]
    NotAList { name: String, found: &'static str },

    #[error("Cannot {operation} an observer that is {state}")]
    Lifecycle {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Invalid expression \"{fragment}\": {error}")]
    Expression { fragment: String, error: ParseError },

    #[error(transparent)]
    Eval(EvalError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ObserverError {
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    pub fn unknown_method(name: impl Into<String>) -> Self {
        Self::UnknownMethod { name: name.into() }
    }

    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    pub fn malformed(
        directive: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedDirective {
            directive: directive.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn expression(fragment: impl Into<String>, error: ParseError) -> Self {
        Self::Expression {
            fragment: fragment.into(),
            error,
        }
    }

    /// Hand the error to the expression evaluator. An evaluation error
    /// passes through unchanged; anything else travels as `External` and is
    /// recovered by `From<EvalError>` on the way out.
    pub fn into_eval(self) -> EvalError {
        match self {
            ObserverError::Eval(error) => error,
            other => EvalError::External(Box::new(other)),
        }
    }
}

impl From<EvalError> for ObserverError {
    fn from(error: EvalError) -> Self {
        match error {
            EvalError::External(inner) => match inner.downcast::<ObserverError>() {
                Ok(observer) => *observer,
                Err(inner) => ObserverError::Eval(EvalError::External(inner)),
            },
            other => ObserverError::Eval(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_errors_survive_the_evaluator() {
        let original = ObserverError::unknown_property("missing");
        let recovered = ObserverError::from(original.into_eval());
        assert!(matches!(recovered, ObserverError::UnknownProperty { ref name } if name == "missing"));
    }

    #[test]
    fn test_eval_errors_stay_eval_errors() {
        let recovered = ObserverError::from(EvalError::undefined("x"));
        assert!(matches!(
            recovered,
            ObserverError::Eval(EvalError::UndefinedVariable { .. })
        ));
        assert!(matches!(
            recovered.into_eval(),
            EvalError::UndefinedVariable { .. }
        ));
    }
}
