use crate::error::{DomError, DomResult, HandlerError};
use crate::host::{HostTree, NodeId};
use filament_common::{Object, Value};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// An event dispatched to a node
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: String,
    /// Custom payload (`CustomEvent.detail`)
    pub detail: Option<Value>,
    pub bubbles: bool,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            detail: None,
            bubbles: false,
        }
    }

    pub fn custom(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            detail: Some(detail.into()),
            bubbles: false,
        }
    }

    pub fn bubbling(mut self) -> Self {
        self.bubbles = true;
        self
    }

    /// Script-visible form: `{ type, detail }`
    pub fn to_value(&self) -> Value {
        let mut map = Object::new();
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        map.insert(
            "detail".to_string(),
            self.detail.clone().unwrap_or_default(),
        );
        Value::Object(map)
    }
}

pub type EventHandler = Rc<dyn Fn(&Event) -> Result<(), HandlerError>>;

/// Handle returned when a listener is attached, used to detach it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener:{}", self.0)
    }
}

/// Dispatch `event` at `target`, then at each ancestor when it bubbles.
/// No borrow of the tree is held while handlers run, so handlers may
/// mutate it. Every handler runs; the first failure is returned.
pub fn dispatch_event<H: HostTree>(
    tree: &Rc<RefCell<H>>,
    target: NodeId,
    event: &Event,
) -> DomResult<usize> {
    let path = {
        let tree = tree.borrow();
        tree.kind(target)?;
        let mut path = vec![target];
        if event.bubbles {
            let mut current = tree.parent(target);
            while let Some(id) = current {
                path.push(id);
                current = tree.parent(id);
            }
        }
        path
    };

    let mut invoked = 0;
    let mut first_error = None;
    for node in path {
        let handlers = tree.borrow().handlers(node, &event.kind);
        for handler in handlers {
            invoked += 1;
            if let Err(error) = handler(event) {
                if first_error.is_none() {
                    first_error = Some(DomError::Handler {
                        event: event.kind.clone(),
                        error,
                    });
                } else {
                    debug!(event = %event.kind, node = %node, error = %error, "additional handler failure");
                }
            }
        }
    }

    debug!(event = %event.kind, target = %target, invoked, "dispatched event");
    match first_error {
        Some(error) => Err(error),
        None => Ok(invoked),
    }
}
