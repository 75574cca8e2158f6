pub mod component;
pub mod computed;
pub mod config;
pub mod context;
mod directives;
pub mod error;
pub mod events;
pub mod input;
pub mod interpolation;
pub mod iteration;
pub mod list;
pub mod manifest;
pub mod observer;
pub mod property;
pub mod state;
pub mod watcher;

pub use component::{Component, Declarations, Method, WatchDeclaration};
pub use computed::{ComputedListener, ComputedRegistry, Getter};
pub use config::{ObserverConfig, UnsupportedInputPolicy};
pub use context::{BindingContext, ContextScope};
pub use error::{ObserverError, ObserverResult};
pub use events::NodeEventMap;
pub use input::Control;
pub use interpolation::{split_segments, Segment};
pub use list::ObservableList;
pub use manifest::ComponentManifest;
pub use observer::{ComponentObserver, Lifecycle};
pub use property::{PropertyListener, PropertyRegistry};
pub use state::{ComponentState, Emitter};
pub use watcher::{Watcher, WatcherState};
