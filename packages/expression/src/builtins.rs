//! Whitelisted globals and methods available to template expressions.
//!
//! Nothing here reaches outside the value it is given. Array mutators are
//! split out so the evaluator can route them through [`Scope::mutate`]
//! when the receiver is a bound name.
//!
//! [`Scope::mutate`]: crate::scope::Scope::mutate

use crate::error::{EvalError, EvalResult};
use filament_common::{format_number, Value};
use std::cmp::Ordering;

/// Namespaces that can be used as call receivers (`Math.max(a, b)`)
pub const NAMESPACES: &[&str] = &["Math", "Object", "JSON"];

/// Array methods that modify their receiver
pub const MUTATORS: &[&str] = &["push", "pop", "shift", "unshift", "splice", "reverse", "sort"];

pub fn is_mutator(method: &str) -> bool {
    MUTATORS.contains(&method)
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn opt_number(args: &[Value], index: usize) -> Option<f64> {
    match args.get(index) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.to_number()),
    }
}

/// Clamp a possibly negative index the way `slice`/`splice` do.
pub fn relative_index(index: f64, len: usize) -> usize {
    if index.is_nan() {
        0
    } else if index < 0.0 {
        (len as f64 + index.trunc()).max(0.0) as usize
    } else {
        (index.trunc() as usize).min(len)
    }
}

/// Global functions: `isNaN`, `parseFloat`, `parseInt`, `String`, `Number`, `Boolean`.
pub fn call_global(name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
    let value = arg(args, 0);
    let result = match name {
        "isNaN" => Value::Boolean(value.to_number().is_nan()),
        "parseFloat" => Value::Number(parse_float_prefix(&value.to_string())),
        "parseInt" => {
            let radix = opt_number(args, 1).map(|r| r as u32).unwrap_or(10);
            Value::Number(parse_int_prefix(&value.to_string(), radix))
        }
        "String" => Value::String(value.to_string()),
        "Number" => Value::Number(value.to_number()),
        "Boolean" => Value::Boolean(value.is_truthy()),
        _ => return None,
    };
    Some(Ok(result))
}

/// Leading float of a string, `NaN` if there is none (`"3.5px"` → 3.5).
pub fn parse_float_prefix(source: &str) -> f64 {
    let trimmed = source.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return f64::NAN;
    }
    // optional exponent, only if followed by digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Leading integer of a string in `radix`, `NaN` if there is none.
pub fn parse_int_prefix(source: &str, radix: u32) -> f64 {
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let trimmed = source.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let rest = if radix == 16 {
        rest.strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
            .unwrap_or(rest)
    } else {
        rest
    };

    let mut result = 0.0;
    let mut any = false;
    for ch in rest.chars() {
        match ch.to_digit(radix) {
            Some(digit) => {
                result = result * radix as f64 + digit as f64;
                any = true;
            }
            None => break,
        }
    }
    if !any {
        f64::NAN
    } else if negative {
        -result
    } else {
        result
    }
}

/// `Math.*`, `Object.*` and `JSON.*`
pub fn call_namespace(namespace: &str, method: &str, args: &[Value]) -> EvalResult<Value> {
    match namespace {
        "Math" => call_math(method, args),
        "Object" => call_object(method, args),
        "JSON" => call_json(method, args),
        _ => Err(EvalError::undefined(namespace)),
    }
}

fn call_math(method: &str, args: &[Value]) -> EvalResult<Value> {
    let x = arg(args, 0).to_number();
    let result = match method {
        "abs" => x.abs(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => (x + 0.5).floor(),
        "trunc" => x.trunc(),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "sqrt" => x.sqrt(),
        "pow" => x.powf(arg(args, 1).to_number()),
        "min" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
        "max" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
        _ => return Err(EvalError::unknown_method("Math", method)),
    };
    Ok(Value::Number(result))
}

fn call_object(method: &str, args: &[Value]) -> EvalResult<Value> {
    let target = arg(args, 0);
    match (method, &target) {
        ("keys", Value::Object(map)) => Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        ("values", Value::Object(map)) => Ok(Value::Array(map.values().cloned().collect())),
        ("entries", Value::Object(map)) => Ok(Value::Array(
            map.iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                .collect(),
        )),
        ("keys", Value::Array(items)) => Ok(Value::Array(
            (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
        )),
        ("values", Value::Array(items)) => Ok(Value::Array(items.clone())),
        ("keys" | "values" | "entries", Value::Null) => Err(EvalError::type_error(
            "Cannot convert null to object",
        )),
        ("keys" | "values" | "entries", _) => Ok(Value::Array(Vec::new())),
        _ => Err(EvalError::unknown_method("Object", method)),
    }
}

fn call_json(method: &str, args: &[Value]) -> EvalResult<Value> {
    match method {
        "stringify" => Ok(Value::String(arg(args, 0).to_json_string())),
        "parse" => {
            let source = arg(args, 0).to_string();
            serde_json::from_str::<serde_json::Value>(&source)
                .map(Value::from)
                .map_err(|err| EvalError::type_error(format!("JSON.parse: {}", err)))
        }
        _ => Err(EvalError::unknown_method("JSON", method)),
    }
}

/// Non-mutating methods on strings, arrays, numbers and booleans.
/// Mutators called on a value that is not bound to a name run on a copy.
pub fn call_method(receiver: &Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    match receiver {
        Value::String(s) => string_method(s, method, args),
        Value::Array(items) => {
            if is_mutator(method) {
                let mut copy = receiver.clone();
                call_mutator(&mut copy, method, args)
            } else {
                array_method(items, method, args)
            }
        }
        Value::Number(n) => number_method(*n, method, args),
        Value::Boolean(b) => match method {
            "toString" => Ok(Value::String(b.to_string())),
            _ => Err(EvalError::unknown_method("boolean", method)),
        },
        Value::Object(_) => match method {
            "toString" => Ok(Value::String(receiver.to_string())),
            _ => Err(EvalError::unknown_method("object", method)),
        },
        Value::Null => Err(EvalError::type_error(format!(
            "Cannot read properties of null (reading '{}')",
            method
        ))),
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn char_index_of(haystack: &str, needle: &str) -> f64 {
    match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as f64,
        None => -1.0,
    }
}

/// Longest string `repeat` and `padStart`/`padEnd` will build, in chars.
const MAX_STRING_LENGTH: usize = 1 << 29;

fn invalid_length() -> EvalError {
    EvalError::type_error("Invalid string length")
}

fn pad(s: &str, target: f64, fill: &str, at_start: bool) -> EvalResult<String> {
    let len = s.chars().count();
    let target = if target.is_nan() { 0.0 } else { target.max(0.0) };
    if target <= len as f64 || fill.is_empty() {
        return Ok(s.to_string());
    }
    if target > MAX_STRING_LENGTH as f64 {
        return Err(invalid_length());
    }
    let padding: String = fill.chars().cycle().take(target as usize - len).collect();
    Ok(if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    })
}

fn string_method(s: &str, method: &str, args: &[Value]) -> EvalResult<Value> {
    let len = s.chars().count();
    let text = |index: usize| arg(args, index).to_string();

    let result = match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "trimStart" => Value::String(s.trim_start().to_string()),
        "trimEnd" => Value::String(s.trim_end().to_string()),
        "toString" => Value::String(s.to_string()),
        "includes" => Value::Boolean(s.contains(&text(0))),
        "startsWith" => Value::Boolean(s.starts_with(&text(0))),
        "endsWith" => Value::Boolean(s.ends_with(&text(0))),
        "indexOf" => Value::Number(char_index_of(s, &text(0))),
        "charAt" => {
            let index = opt_number(args, 0).unwrap_or(0.0);
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            Value::String(if index < 0.0 || index >= len as f64 {
                String::new()
            } else {
                char_slice(s, index as usize, index as usize + 1)
            })
        }
        "at" => {
            let index = opt_number(args, 0).unwrap_or(0.0).trunc();
            let resolved = if index < 0.0 { len as f64 + index } else { index };
            if resolved < 0.0 || resolved >= len as f64 {
                Value::Null
            } else {
                Value::String(char_slice(s, resolved as usize, resolved as usize + 1))
            }
        }
        "slice" => {
            let start = relative_index(opt_number(args, 0).unwrap_or(0.0), len);
            let end = opt_number(args, 1).map_or(len, |e| relative_index(e, len));
            Value::String(char_slice(s, start, end))
        }
        "substring" => {
            let clamp = |n: f64| if n.is_nan() { 0 } else { n.max(0.0).min(len as f64) as usize };
            let a = clamp(opt_number(args, 0).unwrap_or(0.0));
            let b = opt_number(args, 1).map_or(len, clamp);
            Value::String(char_slice(s, a.min(b), a.max(b)))
        }
        "split" => match args.first() {
            None | Some(Value::Null) => Value::Array(vec![Value::String(s.to_string())]),
            Some(separator) => {
                let separator = separator.to_string();
                if separator.is_empty() {
                    Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect())
                } else {
                    Value::Array(
                        s.split(separator.as_str())
                            .map(|part| Value::String(part.to_string()))
                            .collect(),
                    )
                }
            }
        },
        "replace" => Value::String(s.replacen(&text(0), &text(1), 1)),
        "replaceAll" => Value::String(s.replace(&text(0), &text(1))),
        "repeat" => {
            let count = arg(args, 0).to_number();
            if count < 0.0 || count.is_infinite() {
                return Err(EvalError::type_error(format!("Invalid count value: {}", format_number(count))));
            }
            let count = if count.is_nan() { 0.0 } else { count.trunc() };
            if count * len as f64 > MAX_STRING_LENGTH as f64 {
                return Err(invalid_length());
            }
            Value::String(s.repeat(count as usize))
        }
        "padStart" | "padEnd" => {
            let fill = match args.get(1) {
                None | Some(Value::Null) => " ".to_string(),
                Some(fill) => fill.to_string(),
            };
            Value::String(pad(s, arg(args, 0).to_number(), &fill, method == "padStart")?)
        }
        "concat" => {
            let mut out = s.to_string();
            for value in args {
                out.push_str(&value.to_string());
            }
            Value::String(out)
        }
        _ => return Err(EvalError::unknown_method("string", method)),
    };
    Ok(result)
}

fn array_method(items: &[Value], method: &str, args: &[Value]) -> EvalResult<Value> {
    let len = items.len();
    let result = match method {
        "includes" => {
            let needle = arg(args, 0);
            Value::Boolean(items.iter().any(|item| same_value_zero(item, &needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            Value::Number(
                items
                    .iter()
                    .position(|item| item.strict_equals(&needle))
                    .map_or(-1.0, |i| i as f64),
            )
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Null) => ",".to_string(),
                Some(separator) => separator.to_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        "slice" => {
            let start = relative_index(opt_number(args, 0).unwrap_or(0.0), len);
            let end = opt_number(args, 1).map_or(len, |e| relative_index(e, len));
            Value::Array(if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            })
        }
        "concat" => {
            let mut out = items.to_vec();
            for value in args {
                match value {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::Array(out)
        }
        "at" => {
            let index = opt_number(args, 0).unwrap_or(0.0).trunc();
            let resolved = if index < 0.0 { len as f64 + index } else { index };
            if resolved < 0.0 || resolved >= len as f64 {
                Value::Null
            } else {
                items[resolved as usize].clone()
            }
        }
        "toString" => Value::String(Value::Array(items.to_vec()).to_string()),
        _ => return Err(EvalError::unknown_method("array", method)),
    };
    Ok(result)
}

fn number_method(n: f64, method: &str, args: &[Value]) -> EvalResult<Value> {
    match method {
        "toFixed" => {
            let digits = opt_number(args, 0).unwrap_or(0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Err(EvalError::type_error("toFixed() digits argument must be between 0 and 100"));
            }
            if !n.is_finite() {
                return Ok(Value::String(format_number(n)));
            }
            Ok(Value::String(format!("{:.*}", digits as usize, n)))
        }
        "toString" => Ok(Value::String(format_number(n))),
        _ => Err(EvalError::unknown_method("number", method)),
    }
}

/// `includes` equality: like `===` but `NaN` finds `NaN`.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

/// Remove `delete` items at `start` and insert `insert` in their place.
/// Returns the removed items.
pub fn splice(items: &mut Vec<Value>, start: usize, delete: usize, insert: Vec<Value>) -> Vec<Value> {
    let start = start.min(items.len());
    let end = start.saturating_add(delete).min(items.len());
    items.splice(start..end, insert).collect()
}

/// Default `sort()` ordering: `null` last, everything else by display string.
pub fn sort_default(items: &mut [Value]) {
    items.sort_by(|a, b| match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.to_string().cmp(&b.to_string()),
    });
}

/// Array mutators, applied in place. Returns what JavaScript returns.
pub fn call_mutator(target: &mut Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    let items = match target {
        Value::Array(items) => items,
        other => {
            return Err(EvalError::unknown_method(other.kind(), method));
        }
    };

    let result = match method {
        "push" => {
            items.extend(args.iter().cloned());
            Value::from(items.len())
        }
        "pop" => items.pop().unwrap_or_default(),
        "shift" => {
            if items.is_empty() {
                Value::Null
            } else {
                items.remove(0)
            }
        }
        "unshift" => {
            items.splice(0..0, args.iter().cloned());
            Value::from(items.len())
        }
        "splice" => {
            let len = items.len();
            let start = relative_index(opt_number(args, 0).unwrap_or(0.0), len);
            let delete = match args.get(1) {
                None => len - start,
                Some(count) => {
                    let count = count.to_number();
                    if count.is_nan() || count < 0.0 {
                        0
                    } else {
                        count as usize
                    }
                }
            };
            let insert = args.iter().skip(2).cloned().collect();
            Value::Array(splice(items, start, delete, insert))
        }
        "reverse" => {
            items.reverse();
            Value::Array(items.clone())
        }
        "sort" => {
            sort_default(items);
            Value::Array(items.clone())
        }
        _ => return Err(EvalError::unknown_method("array", method)),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filament_common::array;

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("3.5px"), 3.5);
        assert_eq!(parse_float_prefix("  -2e3x"), -2000.0);
        assert_eq!(parse_float_prefix("1e"), 1.0);
        assert!(parse_float_prefix("px").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("42.9", 10), 42.0);
        assert_eq!(parse_int_prefix("-7abc", 10), -7.0);
        assert_eq!(parse_int_prefix("0xff", 16), 255.0);
        assert!(parse_int_prefix("abc", 10).is_nan());
    }

    #[test]
    fn test_default_sort_compares_strings() {
        let mut value = array([10, 9, 1]);
        call_mutator(&mut value, "sort", &[]).unwrap();
        assert_eq!(value, array([1, 10, 9]));
    }

    #[test]
    fn test_splice_with_negative_start() {
        let mut value = array([1, 2, 3, 4]);
        let removed = call_mutator(
            &mut value,
            "splice",
            &[Value::from(-2), Value::from(1), Value::from("x")],
        )
        .unwrap();
        assert_eq!(removed, array([3]));
        assert_eq!(value, array([Value::from(1), Value::from(2), Value::from("x"), Value::from(4)]));
    }

    #[test]
    fn test_splice_with_infinite_count() {
        let mut value = array([1, 2, 3]);
        let removed = call_mutator(
            &mut value,
            "splice",
            &[Value::from(1), Value::Number(f64::INFINITY)],
        )
        .unwrap();
        assert_eq!(removed, array([2, 3]));
        assert_eq!(value, array([1]));
    }

    #[test]
    fn test_char_at_out_of_range() {
        assert_eq!(string_method("abc", "charAt", &[Value::from(1)]).unwrap(), Value::from("b"));
        assert_eq!(string_method("abc", "charAt", &[Value::from(3)]).unwrap(), Value::from(""));
        assert_eq!(
            string_method("abc", "charAt", &[Value::Number(f64::INFINITY)]).unwrap(),
            Value::from("")
        );
        assert_eq!(string_method("abc", "charAt", &[Value::Number(1e300)]).unwrap(), Value::from(""));
    }

    #[test]
    fn test_oversized_strings_are_rejected() {
        assert!(matches!(
            string_method("a", "repeat", &[Value::Number(1e15)]),
            Err(EvalError::TypeError { .. })
        ));
        assert!(matches!(
            string_method("a", "padStart", &[Value::Number(1e15)]),
            Err(EvalError::TypeError { .. })
        ));
        assert!(matches!(
            string_method("a", "padEnd", &[Value::Number(f64::INFINITY), Value::from("x")]),
            Err(EvalError::TypeError { .. })
        ));
        assert_eq!(string_method("ab", "repeat", &[Value::from(2)]).unwrap(), Value::from("abab"));
        assert_eq!(string_method("ab", "repeat", &[Value::from(0)]).unwrap(), Value::from(""));
    }

    #[test]
    fn test_string_methods() {
        let s = "Hello World";
        assert_eq!(string_method(s, "slice", &[Value::from(-5)]).unwrap(), Value::from("World"));
        assert_eq!(string_method(s, "indexOf", &[Value::from("o")]).unwrap(), Value::from(4));
        assert_eq!(
            string_method("5", "padStart", &[Value::from(3), Value::from("0")]).unwrap(),
            Value::from("005")
        );
        assert_eq!(
            string_method("a,b", "split", &[Value::from(",")]).unwrap(),
            array(["a", "b"])
        );
    }

    #[test]
    fn test_math_round_and_extremes() {
        assert_eq!(call_namespace("Math", "round", &[Value::from(-2.5)]).unwrap(), Value::from(-2));
        assert_eq!(call_namespace("Math", "round", &[Value::from(2.5)]).unwrap(), Value::from(3));
        assert_eq!(
            call_namespace("Math", "max", &[]).unwrap(),
            Value::Number(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_mutator_on_non_array() {
        let mut value = Value::from("text");
        assert!(matches!(
            call_mutator(&mut value, "push", &[Value::from(1)]),
            Err(EvalError::UnknownMethod { receiver: "string", .. })
        ));
    }
}
