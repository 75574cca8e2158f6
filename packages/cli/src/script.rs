//! Event scripts replayed against a mounted template.
//!
//! ```json
//! [
//!   { "action": "dispatch", "selector": "input", "event": "input", "value": "Ada" },
//!   { "action": "dispatch", "selector": "button.add", "event": "click" },
//!   { "action": "set", "property": "filter", "value": "open" }
//! ]
//! ```

use crate::commands::{dom_error, observer_error, Mounted};
use anyhow::{anyhow, Context, Result};
use filament_common::Value;
use filament_dom::{dispatch_event, Event, HostTree};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// Fire `event` at the first element matching `selector`, after putting
    /// the given state into the control
    Dispatch {
        selector: String,
        event: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<Value>,
        #[serde(default)]
        bubbles: bool,
    },
    /// Write a tracked property directly
    Set { property: String, value: Value },
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Invalid event script {}", path.display()))
}

pub fn replay(mounted: &Mounted, steps: &[Step], pretty: bool) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        apply(mounted, step, pretty).with_context(|| format!("Step {} failed", index + 1))?;
    }
    Ok(())
}

fn apply(mounted: &Mounted, step: &Step, pretty: bool) -> Result<()> {
    match step {
        Step::Dispatch {
            selector,
            event,
            value,
            checked,
            detail,
            bubbles,
        } => {
            let target = {
                let mut tree = mounted.tree.borrow_mut();
                let target = tree
                    .query(mounted.root, selector)
                    .map_err(dom_error)?
                    .ok_or_else(|| anyhow!("No element matches '{}'", selector))?;
                if let Some(value) = value {
                    tree.set_value(target, value).map_err(dom_error)?;
                }
                if let Some(checked) = checked {
                    tree.set_checked(target, *checked).map_err(dom_error)?;
                }
                target
            };

            let mut fired = match detail {
                Some(detail) => Event::custom(event.as_str(), detail.clone()),
                None => Event::new(event.as_str()),
            };
            fired.bubbles = *bubbles;
            let invoked = dispatch_event(&mounted.tree, target, &fired).map_err(dom_error)?;
            debug!(%selector, %event, invoked, "replayed dispatch");
        }
        Step::Set { property, value } => {
            mounted
                .observer
                .state()
                .set(property, value.clone())
                .map_err(|err| observer_error(err, pretty))?;
            debug!(%property, "replayed set");
        }
    }
    Ok(())
}
