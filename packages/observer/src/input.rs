//! Two-way binding of form controls: `bind="property"`.
//!
//! Each control kind has an adapter that reads the control as a [`Value`],
//! tells whether the control already shows a value, and writes a value to
//! it. The control writes the property only when the value differs from the
//! property and the property writes the control only when the control shows
//! something else, so a change never echoes back to where it came from.

use crate::config::UnsupportedInputPolicy;
use crate::error::{ObserverError, ObserverResult};
use crate::observer::ComponentObserver;
use filament_common::Value;
use filament_dom::{DomResult, Event, HostTree, NodeId};
use filament_expression::builtins::parse_float_prefix;
use tracing::{debug, warn};

const TEXT_TYPES: &[&str] = &[
    "text",
    "password",
    "color",
    "date",
    "time",
    "email",
    "search",
    "tel",
    "url",
    "datetime-local",
    "month",
    "week",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Text,
    Number,
    Checkbox,
    Radio,
    TextArea,
    Select,
}

impl Control {
    /// Adapter for an element, `None` when `bind` is not supported on it
    pub fn detect(tag: &str, input_type: &str) -> Option<Self> {
        match tag {
            "input" => match input_type {
                "number" | "range" => Some(Control::Number),
                "checkbox" => Some(Control::Checkbox),
                "radio" => Some(Control::Radio),
                kind if TEXT_TYPES.contains(&kind) => Some(Control::Text),
                _ => None,
            },
            "textarea" => Some(Control::TextArea),
            "select" => Some(Control::Select),
            _ => None,
        }
    }

    pub fn events(self) -> &'static [&'static str] {
        match self {
            Control::Text | Control::Number | Control::TextArea => &["input", "change"],
            Control::Checkbox | Control::Radio | Control::Select => &["change"],
        }
    }

    pub fn read<H: HostTree>(self, host: &H, node: NodeId) -> Value {
        match self {
            Control::Number => Value::Number(parse_float_prefix(&host.value(node))),
            Control::Checkbox => Value::Boolean(host.checked(node)),
            Control::Text | Control::Radio | Control::TextArea | Control::Select => {
                Value::String(host.value(node))
            }
        }
    }

    pub fn shows<H: HostTree>(self, host: &H, node: NodeId, value: &Value) -> bool {
        match self {
            Control::Number => {
                let shown = parse_float_prefix(&host.value(node));
                let wanted = value.to_number();
                shown == wanted || (shown.is_nan() && wanted.is_nan())
            }
            Control::Checkbox => host.checked(node) == value.is_truthy(),
            Control::Radio => host.checked(node) == (value.to_string() == host.value(node)),
            Control::Text | Control::TextArea | Control::Select => {
                host.value(node) == value.to_string()
            }
        }
    }

    pub fn write<H: HostTree>(self, host: &mut H, node: NodeId, value: &Value) -> DomResult<()> {
        match self {
            Control::Checkbox => host.set_checked(node, value.is_truthy()),
            Control::Radio => {
                let checked = value.to_string() == host.value(node);
                host.set_checked(node, checked)
            }
            Control::Text | Control::Number => {
                let text = value.to_string();
                host.set_value(node, &text)?;
                host.set_attribute(node, "value", &text)
            }
            Control::TextArea | Control::Select => host.set_value(node, &value.to_string()),
        }
    }
}

/// Option source of a `<select items="...">`
struct OptionSource {
    property: String,
    value_field: String,
    label_field: String,
}

impl OptionSource {
    /// `(value, label)` per option
    fn options(&self, items: &Value) -> ObserverResult<Vec<(String, String)>> {
        match items {
            Value::Array(items) => Ok(items
                .iter()
                .map(|item| match item {
                    Value::Object(fields) => {
                        let value = fields
                            .get(&self.value_field)
                            .map(Value::to_string)
                            .unwrap_or_default();
                        let label = fields
                            .get(&self.label_field)
                            .map_or_else(|| value.clone(), Value::to_string);
                        (value, label)
                    }
                    scalar => (scalar.to_string(), scalar.to_string()),
                })
                .collect()),
            Value::Object(entries) => Ok(entries
                .iter()
                .map(|(label, value)| (value.to_string(), label.clone()))
                .collect()),
            other => Err(ObserverError::InvalidItemsSource {
                property: self.property.clone(),
                found: other.kind(),
            }),
        }
    }
}

impl<H: HostTree + 'static> ComponentObserver<H> {
    pub(crate) fn bind_input(&self, node: NodeId) -> ObserverResult<()> {
        let (property, tag, input_type, items, value_name, label_name) = {
            let host = self.host.borrow();
            (
                host.get_attribute(node, "bind").unwrap_or_default(),
                host.tag_name(node).unwrap_or_default(),
                host.get_attribute(node, "type")
                    .map(|kind| kind.trim().to_ascii_lowercase())
                    .filter(|kind| !kind.is_empty())
                    .unwrap_or_else(|| "text".to_string()),
                host.get_attribute(node, "items"),
                host.get_attribute(node, "value-name"),
                host.get_attribute(node, "label-name"),
            )
        };

        if !self.state.has_property(&property) {
            return Err(ObserverError::unknown_property(property));
        }

        let Some(control) = Control::detect(&tag, &input_type) else {
            let kind = if tag == "input" { input_type } else { tag.clone() };
            return match self.config.unsupported_inputs {
                UnsupportedInputPolicy::Warn => {
                    warn!(%tag, %kind, %property, "bind is not supported on this control, skipping");
                    Ok(())
                }
                UnsupportedInputPolicy::Error => Err(ObserverError::UnsupportedInput { tag, kind }),
            };
        };

        let options = match items {
            Some(items) if control == Control::Select => {
                let items = items.trim().to_string();
                if !self.state.has_property(&items) {
                    return Err(ObserverError::unknown_property(items));
                }
                Some(OptionSource {
                    property: items,
                    value_field: value_name.unwrap_or_else(|| self.config.option_value_field.clone()),
                    label_field: label_name.unwrap_or_else(|| self.config.option_label_field.clone()),
                })
            }
            _ => None,
        };

        for kind in control.events() {
            let property = property.clone();
            self.on_event(node, kind, move |observer, _: &Event| {
                observer.pull_control(node, control, &property)
            })?;
        }

        if let Some(source) = options {
            let items = self.state.get(&source.property)?;
            self.render_options(node, &source, &property, &items)?;
            let bound = property.clone();
            let items_property = source.property.clone();
            self.on_property(&items_property, move |observer, items| {
                observer.render_options(node, &source, &bound, items)
            })?;
        }

        self.on_property(&property, move |observer, value| {
            observer.push_control(node, control, value)
        })?;

        debug!(%node, %property, ?control, "bound input");
        let current = self.state.get(&property)?;
        self.push_control(node, control, &current)
    }

    /// Control -> property
    fn pull_control(&self, node: NodeId, control: Control, property: &str) -> ObserverResult<()> {
        let value = control.read(&*self.host.borrow(), node);
        let current = self.state.get(property)?;
        if !current.strict_equals(&value) {
            self.state.set(property, value)?;
        }
        Ok(())
    }

    /// Property -> control
    fn push_control(&self, node: NodeId, control: Control, value: &Value) -> ObserverResult<()> {
        let mut host = self.host.borrow_mut();
        if !control.shows(&*host, node, value) {
            control.write(&mut *host, node, value)?;
        }
        Ok(())
    }

    fn render_options(
        &self,
        select: NodeId,
        source: &OptionSource,
        property: &str,
        items: &Value,
    ) -> ObserverResult<()> {
        let options = source.options(items)?;
        {
            let mut host = self.host.borrow_mut();
            host.clear_children(select)?;
            for (value, label) in &options {
                let option = host.create_element("option");
                host.set_attribute(option, "value", value)?;
                let text = host.create_text(label);
                host.append_child(option, text)?;
                host.append_child(select, option)?;
            }
        }
        debug!(%select, items = %source.property, options = options.len(), "rebuilt options");

        let selected = self.state.get(property)?;
        self.host
            .borrow_mut()
            .set_value(select, &selected.to_string())?;
        Ok(())
    }
}
