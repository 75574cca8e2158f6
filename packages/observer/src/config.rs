use serde::{Deserialize, Serialize};

/// What to do when `bind` targets a control with no two-way adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedInputPolicy {
    /// Log a warning and leave the control unbound
    #[default]
    Warn,
    /// Fail the connect pass
    Error,
}

/// Observer settings. Every field has a default, so a partial JSON object
/// (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObserverConfig {
    pub interpolation_open: String,
    pub interpolation_close: String,
    /// Field read from object items of a `<select items>` source for the option value
    pub option_value_field: String,
    /// Field read for the option label
    pub option_label_field: String,
    pub unsupported_inputs: UnsupportedInputPolicy,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            interpolation_open: "{{".to_string(),
            interpolation_close: "}}".to_string(),
            option_value_field: "value".to_string(),
            option_label_field: "label".to_string(),
            unsupported_inputs: UnsupportedInputPolicy::Warn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ObserverConfig =
            serde_json::from_str(r#"{ "interpolationOpen": "[[", "unsupportedInputs": "error" }"#)
                .unwrap();
        assert_eq!(config.interpolation_open, "[[");
        assert_eq!(config.interpolation_close, "}}");
        assert_eq!(config.option_label_field, "label");
        assert_eq!(config.unsupported_inputs, UnsupportedInputPolicy::Error);
    }
}
