pub mod check;
pub mod render;

pub use check::{check, CheckArgs};
pub use render::{render, RenderArgs};

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use filament_dom::{DomError, MemoryTree, NodeId};
use filament_expression::format_error;
use filament_observer::{ComponentManifest, ComponentObserver, ObserverError};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A template parsed into a tree with its component connected
pub struct Mounted {
    pub observer: Rc<ComponentObserver<MemoryTree>>,
    pub tree: Rc<RefCell<MemoryTree>>,
    pub root: NodeId,
}

impl Mounted {
    pub fn connect(markup: &str, manifest: &ComponentManifest, config: &Config) -> Result<Self> {
        let (tree, root) =
            MemoryTree::from_markup(markup).map_err(|err| anyhow!("Invalid template: {}", err))?;
        let tree = Rc::new(RefCell::new(tree));
        let observer = ComponentObserver::new(manifest, tree.clone(), root, config.observer.clone());
        observer
            .connect()
            .map_err(|err| observer_error(err, config.pretty))?;
        Ok(Self {
            observer,
            tree,
            root,
        })
    }

    pub fn html(&self) -> String {
        self.tree.borrow().inner_html(self.root)
    }
}

/// Manifest next to a template: `counter.html` -> `counter.json`
pub fn manifest_path(template: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| template.with_extension("json"), Path::to_path_buf)
}

/// Read the manifest for `template`. A template without one gets an empty
/// component named after the file.
pub fn load_manifest(template: &Path, explicit: Option<&Path>) -> Result<ComponentManifest> {
    let path = manifest_path(template, explicit);
    if !path.exists() {
        if explicit.is_some() {
            return Err(anyhow!("Component manifest does not exist: {}", path.display()));
        }
        let name = template
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("component");
        return Ok(ComponentManifest {
            name: name.to_string(),
            ..ComponentManifest::default()
        });
    }

    let source = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    ComponentManifest::from_json(&source)
        .with_context(|| format!("Invalid component manifest {}", path.display()))
}

pub fn mount(template: &Path, component: Option<&Path>, config: &Config) -> Result<Mounted> {
    let markup = fs::read_to_string(template)
        .with_context(|| format!("Cannot read {}", template.display()))?;
    let manifest = load_manifest(template, component)?;
    Mounted::connect(&markup, &manifest, config)
}

/// Observer errors carry non-`Send` payloads, so they are flattened into
/// their message. Expression errors get a source report when `pretty`.
pub fn observer_error(err: ObserverError, pretty: bool) -> anyhow::Error {
    match err {
        ObserverError::Expression { fragment, error } if pretty => {
            anyhow!("\n{}", format_error(&fragment, "expression", &error))
        }
        other => anyhow!("{}", other),
    }
}

pub fn dom_error(err: DomError) -> anyhow::Error {
    anyhow!("{}", err)
}
