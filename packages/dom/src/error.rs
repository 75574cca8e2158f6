use crate::host::NodeId;
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

/// Error returned by an event handler
pub type HandlerError = Box<dyn std::error::Error>;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Unexpected closing tag </{tag}> at {pos}")]
    UnexpectedClosingTag { tag: String, pos: usize },

    #[error("Malformed markup at {pos}: {message}")]
    MalformedMarkup { pos: usize, message: String },

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Cannot insert {child} into its own descendant {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Handler for '{event}' failed: {error}")]
    Handler { event: String, error: HandlerError },
}

impl DomError {
    pub fn malformed(pos: usize, message: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            pos,
            message: message.into(),
        }
    }

    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
