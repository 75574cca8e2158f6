pub mod error;
pub mod event;
pub mod host;
pub mod html;
pub mod markup;
pub mod memory;
pub mod selector;

pub use error::{DomError, DomResult, HandlerError};
pub use event::{dispatch_event, Event, EventHandler, ListenerId};
pub use host::{HostTree, NodeId, NodeKind};
pub use memory::MemoryTree;
pub use selector::Selector;
