//! Element directives.
//!
//! | Attribute            | Effect                                              |
//! |----------------------|-----------------------------------------------------|
//! | `@event="handler"`   | run a method or statement when `event` fires        |
//! | `if="expr"`          | keep the element in the tree only while truthy      |
//! | `bind="prop"`        | two-way binding of a form control (see `input`)     |
//! | `:name="expr"`       | attribute from an expression, `false` removes it    |
//! | `:style="{...}"`     | inline style properties from an object              |
//! | `:class="{...}"`     | classes toggled by the truthiness of each entry     |
//!
//! Directives are applied in that order. `iterate` is handled before any of
//! them, see `iteration`.

use crate::context::{event_value, BindingContext};
use crate::error::{ObserverError, ObserverResult};
use crate::observer::{ComponentObserver, ConnectPass};
use filament_common::Value;
use filament_dom::{Event, HostTree, NodeId};
use filament_expression::CompiledExpression;
use std::rc::Rc;
use tracing::debug;

const CLASS_DIRECTIVE: &str = ":class";
const STYLE_DIRECTIVE: &str = ":style";

impl<H: HostTree + 'static> ComponentObserver<H> {
    pub(crate) fn bind_element(
        &self,
        node: NodeId,
        context: &Rc<BindingContext>,
        pass: &mut ConnectPass,
    ) -> ObserverResult<()> {
        let (attributes, condition, bound) = {
            let host = self.host.borrow();
            let attributes: Vec<(String, String)> = host
                .attribute_names(node)
                .into_iter()
                .filter_map(|name| host.get_attribute(node, &name).map(|value| (name, value)))
                .collect();
            (
                attributes,
                host.get_attribute(node, "if"),
                host.has_attribute(node, "bind"),
            )
        };

        for (name, source) in &attributes {
            if let Some(event) = name.strip_prefix('@') {
                self.bind_event_handler(node, &event.to_ascii_lowercase(), source, context)?;
            }
        }

        if let Some(condition) = condition {
            self.bind_conditional(node, &condition, context, pass)?;
        }

        if bound {
            self.bind_input(node)?;
        }

        for (name, source) in &attributes {
            if let Some(attribute) = name.strip_prefix(':') {
                if name != CLASS_DIRECTIVE && name != STYLE_DIRECTIVE {
                    self.bind_attribute(node, attribute, source, context)?;
                }
            }
        }

        if let Some((_, source)) = attributes.iter().find(|(name, _)| name == STYLE_DIRECTIVE) {
            self.bind_style(node, source, context)?;
        }

        if let Some((_, source)) = attributes.iter().find(|(name, _)| name == CLASS_DIRECTIVE) {
            self.bind_classes(node, source, context)?;
        }

        Ok(())
    }

    /// `@event="handler"`. A bare method name is called with the event
    /// payload: the custom detail when there is one, the event otherwise.
    /// Anything else is evaluated with `$event` bound.
    fn bind_event_handler(
        &self,
        node: NodeId,
        event: &str,
        source: &str,
        context: &Rc<BindingContext>,
    ) -> ObserverResult<()> {
        let compiled = self.compile_fragment(source)?;
        let context = context.clone();
        debug!(%node, event, handler = %source, "bound event handler");
        self.on_event(node, event, move |observer, fired| {
            observer.handle_event(node, &compiled, &context, fired)
        })
    }

    fn handle_event(
        &self,
        node: NodeId,
        compiled: &CompiledExpression,
        context: &BindingContext,
        event: &Event,
    ) -> ObserverResult<()> {
        let payload = event_value(&*self.host.borrow(), node, event);

        if let Some(method) = compiled
            .as_identifier()
            .filter(|name| self.state.has_method(name))
        {
            let argument = event.detail.clone().unwrap_or(payload);
            self.state.call(method, &[argument])?;
            return Ok(());
        }

        compiled.evaluate_with_event(&context.scope(&self.state), payload)?;
        Ok(())
    }

    /// `if="expr"`. The element and a comment placeholder trade places; the
    /// element keeps its identity. The first evaluation is left to the pass.
    fn bind_conditional(
        &self,
        node: NodeId,
        source: &str,
        context: &Rc<BindingContext>,
        pass: &mut ConnectPass,
    ) -> ObserverResult<()> {
        let placeholder = self
            .host
            .borrow_mut()
            .create_comment(&format!("if: {}", source.trim()));
        self.placeholders.borrow_mut().insert(node, placeholder);

        let listener = self.effect(source, context, move |observer, value| {
            observer.toggle(node, value.is_truthy())
        })?;
        pass.conditionals.push(listener);
        Ok(())
    }

    fn toggle(&self, node: NodeId, visible: bool) -> ObserverResult<()> {
        // released along with a removed iteration item
        let Some(placeholder) = self.placeholders.borrow().get(&node).copied() else {
            return Ok(());
        };
        let mut host = self.host.borrow_mut();
        if visible {
            if host.parent(placeholder).is_some() {
                host.replace(placeholder, node)?;
            }
        } else if host.parent(node).is_some() {
            host.replace(node, placeholder)?;
        }
        Ok(())
    }

    /// `:name="expr"`
    fn bind_attribute(
        &self,
        node: NodeId,
        attribute: &str,
        source: &str,
        context: &Rc<BindingContext>,
    ) -> ObserverResult<()> {
        let attribute = attribute.to_string();
        let listener = self.effect(source, context, move |observer, value| {
            let mut host = observer.host.borrow_mut();
            match value {
                Value::Boolean(false) => host.remove_attribute(node, &attribute)?,
                other => host.set_attribute(node, &attribute, &other.to_string())?,
            }
            Ok(())
        })?;
        listener()
    }

    /// `:style="{ color: c, fontSize: size + 'px' }"`
    fn bind_style(
        &self,
        node: NodeId,
        source: &str,
        context: &Rc<BindingContext>,
    ) -> ObserverResult<()> {
        let listener = self.effect(source, context, move |observer, value| {
            let entries = match value {
                Value::Object(entries) => entries,
                other => {
                    return Err(ObserverError::type_mismatch(format!(
                        "{} must evaluate to an object, found {}",
                        STYLE_DIRECTIVE,
                        other.kind()
                    )))
                }
            };
            let mut host = observer.host.borrow_mut();
            for (property, value) in &entries {
                let value = match value {
                    Value::Null => None,
                    other => Some(other.to_string()),
                };
                host.set_style(node, property, value.as_deref())?;
            }
            Ok(())
        })?;
        listener()
    }

    /// `:class="{ active: isActive }"`
    fn bind_classes(
        &self,
        node: NodeId,
        source: &str,
        context: &Rc<BindingContext>,
    ) -> ObserverResult<()> {
        let listener = self.effect(source, context, move |observer, value| {
            let entries = match value {
                Value::Object(entries) => entries,
                other => {
                    return Err(ObserverError::type_mismatch(format!(
                        "{} must evaluate to an object, found {}",
                        CLASS_DIRECTIVE,
                        other.kind()
                    )))
                }
            };
            let mut host = observer.host.borrow_mut();
            for (class, enabled) in &entries {
                if enabled.is_truthy() {
                    if !host.has_class(node, class) {
                        host.add_class(node, class)?;
                    }
                } else if host.has_class(node, class) {
                    host.remove_class(node, class)?;
                }
            }
            Ok(())
        })?;
        listener()
    }
}
