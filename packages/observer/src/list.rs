use crate::error::{ObserverError, ObserverResult};
use crate::property::PropertyRegistry;
use filament_common::Value;
use filament_expression::builtins::{sort_default, splice};
use std::cmp::Ordering;

/// Mutating view over an array-valued tracked property.
///
/// Each mutation changes the stored array in place and then fires the
/// property's listeners once, the same as assigning a new array.
pub struct ObservableList<'a> {
    registry: &'a PropertyRegistry,
    name: String,
}

impl<'a> ObservableList<'a> {
    pub(crate) fn new(registry: &'a PropertyRegistry, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn update<R>(&self, op: impl FnOnce(&mut Vec<Value>) -> R) -> ObserverResult<R> {
        self.registry.mutate(&self.name, |value| match value {
            Value::Array(items) => Ok(op(items)),
            other => Err(ObserverError::NotAList {
                name: self.name.clone(),
                found: other.kind(),
            }),
        })
    }

    pub fn items(&self) -> ObserverResult<Vec<Value>> {
        match self.registry.get(&self.name)? {
            Value::Array(items) => Ok(items),
            other => Err(ObserverError::NotAList {
                name: self.name.clone(),
                found: other.kind(),
            }),
        }
    }

    pub fn len(&self) -> ObserverResult<usize> {
        Ok(self.items()?.len())
    }

    pub fn is_empty(&self) -> ObserverResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Append an item, returning the new length
    pub fn push(&self, item: impl Into<Value>) -> ObserverResult<usize> {
        let item = item.into();
        self.update(|items| {
            items.push(item);
            items.len()
        })
    }

    pub fn pop(&self) -> ObserverResult<Option<Value>> {
        self.update(|items| items.pop())
    }

    pub fn shift(&self) -> ObserverResult<Option<Value>> {
        self.update(|items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Prepend an item, returning the new length
    pub fn unshift(&self, item: impl Into<Value>) -> ObserverResult<usize> {
        let item = item.into();
        self.update(|items| {
            items.insert(0, item);
            items.len()
        })
    }

    /// Remove `delete` items at `start` and insert `insert` there. Returns
    /// the removed items.
    pub fn splice(
        &self,
        start: usize,
        delete: usize,
        insert: Vec<Value>,
    ) -> ObserverResult<Vec<Value>> {
        self.update(|items| splice(items, start, delete, insert))
    }

    pub fn remove(&self, index: usize) -> ObserverResult<Option<Value>> {
        self.update(|items| {
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        })
    }

    pub fn reverse(&self) -> ObserverResult<()> {
        self.update(|items| items.reverse())
    }

    /// Sort by display string, nulls last
    pub fn sort(&self) -> ObserverResult<()> {
        self.update(|items| sort_default(items))
    }

    /// Sort with a caller comparator. The comparator runs on a copy of the
    /// list with no registry borrow held, so it may read other properties.
    pub fn sort_by(&self, compare: impl FnMut(&Value, &Value) -> Ordering) -> ObserverResult<()> {
        let mut sorted = self.items()?;
        sorted.sort_by(compare);
        self.update(|items| *items = sorted)
    }

    /// Replace the whole list
    pub fn set(&self, items: Vec<Value>) -> ObserverResult<()> {
        self.registry.set(&self.name, Value::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_common::array;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn registry_with_list() -> (PropertyRegistry, Rc<RefCell<Vec<Value>>>) {
        let registry = PropertyRegistry::new();
        registry.define("items", array(["b", "a"]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        registry
            .add_listener(
                "items",
                Rc::new(move |value: &Value| {
                    log.borrow_mut().push(value.clone());
                    Ok(())
                }),
            )
            .unwrap();
        (registry, seen)
    }

    #[test]
    fn test_each_mutation_notifies_once() {
        let (registry, seen) = registry_with_list();
        let list = registry.list("items").unwrap();

        assert_eq!(list.push("c").unwrap(), 3);
        list.sort().unwrap();
        assert_eq!(list.shift().unwrap(), Some(Value::from("a")));
        assert_eq!(list.splice(0, 1, vec![Value::from("x"), Value::from("y")]).unwrap(), vec![Value::from("b")]);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], array(["b", "a", "c"]));
        assert_eq!(seen[1], array(["a", "b", "c"]));
        assert_eq!(seen[3], array(["x", "y", "c"]));
    }

    #[test]
    fn test_sort_by_comparator_can_read_properties() {
        let (registry, seen) = registry_with_list();
        registry.define("descending", Value::from(true));
        let list = registry.list("items").unwrap();

        list.sort_by(|a, b| {
            let descending = registry.get("descending").unwrap().is_truthy();
            let order = a.to_string().cmp(&b.to_string());
            if descending {
                order.reverse()
            } else {
                order
            }
        })
        .unwrap();

        assert_eq!(list.items().unwrap(), vec![Value::from("b"), Value::from("a")]);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_splice_with_oversized_count() {
        let (registry, _) = registry_with_list();
        let list = registry.list("items").unwrap();
        assert_eq!(
            list.splice(1, usize::MAX, Vec::new()).unwrap(),
            vec![Value::from("a")]
        );
        assert_eq!(list.items().unwrap(), vec![Value::from("b")]);
    }

    #[test]
    fn test_list_requires_an_array() {
        let registry = PropertyRegistry::new();
        registry.define("name", Value::from("x"));
        assert!(matches!(
            registry.list("name"),
            Err(ObserverError::NotAList { found: "string", .. })
        ));
    }

    #[test]
    fn test_list_detects_type_change() {
        let (registry, _) = registry_with_list();
        let list = registry.list("items").unwrap();
        registry.set("items", Value::from(3)).unwrap();
        assert!(matches!(list.push(1), Err(ObserverError::NotAList { .. })));
    }
}
