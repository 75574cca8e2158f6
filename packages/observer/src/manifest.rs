use crate::component::{Component, Declarations, WatchDeclaration};
use filament_common::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A component described entirely in JSON: initial property values,
/// computed expressions, method bodies and watchers.
///
/// ```json
/// {
///   "name": "counter",
///   "properties": { "count": 0 },
///   "computed": { "double": "count * 2" },
///   "methods": { "increment": "count += 1" },
///   "watch": [{ "property": "count", "method": "increment", "immediate": false }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentManifest {
    pub name: String,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub computed: IndexMap<String, String>,
    #[serde(default)]
    pub methods: IndexMap<String, String>,
    #[serde(default)]
    pub watch: Vec<WatchDeclaration>,
}

impl ComponentManifest {
    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }
}

impl Component for ComponentManifest {
    fn name(&self) -> &str {
        &self.name
    }

    fn declare(&self, declarations: &mut Declarations) {
        for (name, value) in &self.properties {
            declarations.property(name.as_str(), value.clone());
        }
        for (name, source) in &self.methods {
            declarations.method_expression(name.as_str(), source.as_str());
        }
        for (name, source) in &self.computed {
            declarations.computed_expression(name.as_str(), source.as_str());
        }
        for watch in &self.watch {
            declarations.watch(watch.property.as_str(), watch.method.as_str(), watch.immediate);
        }
    }
}
