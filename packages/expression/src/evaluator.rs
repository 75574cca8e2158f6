use crate::ast::*;
use crate::builtins;
use crate::error::{EvalError, EvalResult};
use crate::scope::Scope;
use filament_common::{Object, Value};
use std::cmp::Ordering;
use tracing::{instrument, trace};

/// Tree-walking interpreter over a [`Scope`]
pub struct Evaluator<'a> {
    scope: &'a dyn Scope,
}

/// One step of a member/index chain below its root identifier
enum PathStep<'e> {
    Key(&'e str),
    Computed(&'e Expr),
}

/// A resolved step, ready to be applied to a value
enum Segment {
    Key(String),
    Index(f64),
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a dyn Scope) -> Self {
        Self { scope }
    }

    /// Run every statement; the value of the last one is the result.
    #[instrument(level = "trace", skip(self, program), fields(statements = program.statements.len()))]
    pub fn run(&self, program: &Program) -> EvalResult<Value> {
        let mut last = Value::Null;
        for statement in &program.statements {
            last = self.evaluate(statement)?;
        }
        trace!(result = last.kind(), "evaluated program");
        Ok(last)
    }

    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),

            Expr::Identifier { name, .. } => self
                .scope
                .resolve(name)?
                .ok_or_else(|| EvalError::undefined(name.clone())),

            Expr::Template { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Expression(expr) => {
                            out.push_str(&self.evaluate(expr)?.to_string())
                        }
                    }
                }
                Ok(Value::String(out))
            }

            Expr::Array { items, .. } => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<EvalResult<Vec<_>>>()?,
            )),

            Expr::Object { entries, .. } => {
                let mut map = Object::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.evaluate(value)?);
                }
                Ok(Value::Object(map))
            }

            Expr::Member {
                object, property, ..
            } => {
                let target = self.evaluate(object)?;
                read_member(&target, property)
            }

            Expr::Index { object, index, .. } => {
                let target = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                read_index(&target, &index)
            }

            Expr::Call {
                callee, arguments, ..
            } => self.evaluate_call(callee, arguments),

            Expr::Unary {
                operator, operand, ..
            } => self.evaluate_unary(*operator, operand),

            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(apply_binary(*operator, &left, &right))
            }

            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let short_circuit = match operator {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_null(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.evaluate(test)?.is_truthy() {
                    self.evaluate(consequent)
                } else {
                    self.evaluate(alternate)
                }
            }

            Expr::Assign {
                target,
                operator,
                value,
                ..
            } => self.evaluate_assign(target, *operator, value),
        }
    }

    fn evaluate_unary(&self, operator: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        if operator == UnaryOp::Typeof {
            // `typeof missing` is "undefined", not an error
            if let Expr::Identifier { name, .. } = operand {
                return Ok(Value::from(match self.scope.resolve(name)? {
                    Some(value) => value.type_of(),
                    None => "undefined",
                }));
            }
            return Ok(Value::from(self.evaluate(operand)?.type_of()));
        }

        let value = self.evaluate(operand)?;
        Ok(match operator {
            UnaryOp::Not => Value::Boolean(!value.is_truthy()),
            UnaryOp::Negate => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Typeof => Value::from(value.type_of()),
        })
    }

    fn evaluate_args(&self, arguments: &[Expr]) -> EvalResult<Vec<Value>> {
        arguments.iter().map(|arg| self.evaluate(arg)).collect()
    }

    fn evaluate_call(&self, callee: &Expr, arguments: &[Expr]) -> EvalResult<Value> {
        match callee {
            Expr::Identifier { name, .. } => {
                let args = self.evaluate_args(arguments)?;
                if let Some(result) = self.scope.call(name, &args) {
                    return result;
                }
                if self.scope.resolve(name)?.is_some() {
                    return Err(EvalError::not_callable(name.clone()));
                }
                builtins::call_global(name, &args)
                    .unwrap_or_else(|| Err(EvalError::undefined(name.clone())))
            }

            Expr::Member {
                object, property, ..
            } => {
                if let Expr::Identifier { name, .. } = object.as_ref() {
                    if builtins::NAMESPACES.contains(&name.as_str())
                        && self.scope.resolve(name)?.is_none()
                    {
                        let args = self.evaluate_args(arguments)?;
                        return builtins::call_namespace(name, property, &args);
                    }
                }

                if builtins::is_mutator(property) {
                    let mut steps = Vec::new();
                    if let Some(root) = collect_path(object, &mut steps) {
                        let segments = self.resolve_steps(&steps)?;
                        let args = self.evaluate_args(arguments)?;
                        return self.scope.mutate(root, &mut |root_value| {
                            let target = path_mut(root_value, &segments, false)?;
                            builtins::call_mutator(target, property, &args)
                        });
                    }
                }

                let receiver = self.evaluate(object)?;
                let args = self.evaluate_args(arguments)?;
                builtins::call_method(&receiver, property, &args)
            }

            other => Err(EvalError::not_callable(describe(other))),
        }
    }

    fn evaluate_assign(&self, target: &Expr, operator: AssignOp, value: &Expr) -> EvalResult<Value> {
        let mut steps = Vec::new();
        let root = collect_path(target, &mut steps)
            .ok_or_else(|| EvalError::invalid_assignment("left side is not assignable"))?;
        let segments = self.resolve_steps(&steps)?;

        let rhs = self.evaluate(value)?;
        let new_value = match operator.binary() {
            None => rhs,
            Some(op) => {
                let current = self.evaluate(target)?;
                apply_binary(op, &current, &rhs)
            }
        };

        if segments.is_empty() {
            self.scope.assign(root, new_value.clone())?;
        } else {
            self.scope.mutate(root, &mut |root_value| {
                let slot = path_mut(root_value, &segments, true)?;
                *slot = new_value.clone();
                Ok(Value::Null)
            })?;
        }
        Ok(new_value)
    }

    fn resolve_steps(&self, steps: &[PathStep<'_>]) -> EvalResult<Vec<Segment>> {
        steps
            .iter()
            .map(|step| match step {
                PathStep::Key(key) => Ok(Segment::Key(key.to_string())),
                PathStep::Computed(expr) => Ok(match self.evaluate(expr)? {
                    Value::Number(n) => Segment::Index(n),
                    other => Segment::Key(other.to_string()),
                }),
            })
            .collect()
    }
}

/// Flatten `a.b[c]` into root `a` and steps `[b, c]`; `None` if the chain
/// is not rooted at an identifier.
fn collect_path<'e>(expr: &'e Expr, steps: &mut Vec<PathStep<'e>>) -> Option<&'e str> {
    match expr {
        Expr::Identifier { name, .. } => Some(name.as_str()),
        Expr::Member {
            object, property, ..
        } => {
            let root = collect_path(object, steps)?;
            steps.push(PathStep::Key(property));
            Some(root)
        }
        Expr::Index { object, index, .. } => {
            let root = collect_path(object, steps)?;
            steps.push(PathStep::Computed(index));
            Some(root)
        }
        _ => None,
    }
}

/// Walk `segments` into `root`. With `create`, a missing object key is
/// inserted and an array index one past the end is appended.
fn path_mut<'v>(root: &'v mut Value, segments: &[Segment], create: bool) -> EvalResult<&'v mut Value> {
    let mut current = root;
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let key = match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(n) => filament_common::format_number(*n),
        };
        current = match current {
            Value::Array(items) => {
                let index = match segment {
                    Segment::Index(n) if *n >= 0.0 && n.fract() == 0.0 => *n as usize,
                    _ => {
                        return Err(EvalError::type_error(format!(
                            "Cannot set property '{}' on array",
                            key
                        )))
                    }
                };
                if create && last && index == items.len() {
                    items.push(Value::Null);
                }
                let len = items.len();
                items.get_mut(index).ok_or_else(|| {
                    EvalError::type_error(format!(
                        "Index {} is out of bounds for length {}",
                        index, len
                    ))
                })?
            }
            Value::Object(map) => {
                if create && last {
                    map.entry(key).or_default()
                } else {
                    map.get_mut(key.as_str()).ok_or_else(|| null_read(&key))?
                }
            }
            other => {
                return Err(EvalError::type_error(format!(
                    "Cannot set property '{}' on {}",
                    key,
                    other.kind()
                )))
            }
        };
    }
    Ok(current)
}

fn null_read(property: &str) -> EvalError {
    EvalError::type_error(format!(
        "Cannot read properties of null (reading '{}')",
        property
    ))
}

/// `target.property`
pub(crate) fn read_member(target: &Value, property: &str) -> EvalResult<Value> {
    match target {
        Value::Null => Err(null_read(property)),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or_default()),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        _ => Ok(Value::Null),
    }
}

/// `target[index]`
pub(crate) fn read_index(target: &Value, index: &Value) -> EvalResult<Value> {
    match (target, index) {
        (Value::Null, _) => Err(null_read(&index.to_string())),
        (Value::Array(items), Value::Number(n)) => Ok(if *n >= 0.0 && n.fract() == 0.0 {
            items.get(*n as usize).cloned().unwrap_or_default()
        } else {
            Value::Null
        }),
        (Value::String(s), Value::Number(n)) => Ok(if *n >= 0.0 && n.fract() == 0.0 {
            s.chars()
                .nth(*n as usize)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default()
        } else {
            Value::Null
        }),
        (_, key) => read_member(target, &key.to_string()),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

/// Binary operators with JavaScript coercions
pub fn apply_binary(operator: BinaryOp, left: &Value, right: &Value) -> Value {
    match operator {
        BinaryOp::Add => {
            let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_));
            if stringy(left) || stringy(right) {
                Value::String(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Modulo => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Equals => Value::Boolean(left.loose_equals(right)),
        BinaryOp::NotEquals => Value::Boolean(!left.loose_equals(right)),
        BinaryOp::StrictEquals => Value::Boolean(left.strict_equals(right)),
        BinaryOp::StrictNotEquals => Value::Boolean(!left.strict_equals(right)),
        BinaryOp::LessThan => Value::Boolean(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LessThanOrEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::GreaterThan => Value::Boolean(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GreaterThanOrEqual => Value::Boolean(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Identifier { name, .. } => name.clone(),
        Expr::Literal { value, .. } => value.to_string(),
        _ => "expression".to_string(),
    }
}
