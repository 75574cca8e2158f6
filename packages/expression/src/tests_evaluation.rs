/// Evaluation tests over a `MapScope`
use crate::*;
use filament_common::{array, object, Value};

fn eval(source: &str, scope: &MapScope) -> Value {
    compile(source)
        .unwrap_or_else(|e| panic!("compile {:?}: {}", source, e))
        .evaluate(scope)
        .unwrap_or_else(|e| panic!("evaluate {:?}: {}", source, e))
}

fn scope() -> MapScope {
    MapScope::new()
        .with("count", 5)
        .with("name", "Ada")
        .with("flag", false)
        .with("items", array(["a", "b", "c"]))
        .with("user", object([("name", Value::from("Grace")), ("age", Value::from(36))]))
        .with("missing", Value::Null)
}

#[test]
fn test_arithmetic_and_string_concat() {
    let s = scope();
    assert_eq!(eval("count * 2 + 1", &s), Value::from(11));
    assert_eq!(eval("count % 3", &s), Value::from(2));
    assert_eq!(eval("'n=' + count", &s), Value::from("n=5"));
    assert_eq!(eval("1 + '2'", &s), Value::from("12"));
    assert_eq!(eval("'6' * '7'", &s), Value::from(42));
    assert_eq!(eval("1 / 0", &s), Value::Number(f64::INFINITY));
}

#[test]
fn test_logical_operators_return_operands() {
    let s = scope();
    assert_eq!(eval("flag || name", &s), Value::from("Ada"));
    assert_eq!(eval("name && count", &s), Value::from(5));
    assert_eq!(eval("missing ?? 'fallback'", &s), Value::from("fallback"));
    assert_eq!(eval("flag ?? 'fallback'", &s), Value::from(false));
    assert_eq!(eval("!flag", &s), Value::from(true));
}

#[test]
fn test_short_circuit_skips_right_side() {
    let s = scope();
    // `nope` is undefined; it must never be evaluated
    assert_eq!(eval("flag && nope", &s), Value::from(false));
    assert_eq!(eval("count || nope", &s), Value::from(5));
}

#[test]
fn test_equality_and_comparison() {
    let s = scope();
    assert_eq!(eval("count == '5'", &s), Value::from(true));
    assert_eq!(eval("count === '5'", &s), Value::from(false));
    assert_eq!(eval("count !== 5", &s), Value::from(false));
    assert_eq!(eval("'b' > 'a'", &s), Value::from(true));
    assert_eq!(eval("count >= 5 ? 'big' : 'small'", &s), Value::from("big"));
}

#[test]
fn test_members_indexing_and_length() {
    let s = scope();
    assert_eq!(eval("user.name", &s), Value::from("Grace"));
    assert_eq!(eval("user['age'] + 1", &s), Value::from(37));
    assert_eq!(eval("items[1]", &s), Value::from("b"));
    assert_eq!(eval("items[9]", &s), Value::Null);
    assert_eq!(eval("items.length", &s), Value::from(3));
    assert_eq!(eval("name.length", &s), Value::from(3));
    assert_eq!(eval("user.nothing", &s), Value::Null);
}

#[test]
fn test_member_of_null_is_a_type_error() {
    let s = scope();
    let err = compile("missing.name").unwrap().evaluate(&s).unwrap_err();
    assert!(matches!(err, EvalError::TypeError { .. }));
}

#[test]
fn test_literals() {
    let s = scope();
    assert_eq!(eval("[1, count, 'x']", &s), array([Value::from(1), Value::from(5), Value::from("x")]));
    assert_eq!(
        eval("{ active: count > 1, 'is-hidden': flag }", &s),
        object([("active", true), ("is-hidden", false)])
    );
    assert_eq!(eval("`Hello ${name}, ${count + 1}!`", &s), Value::from("Hello Ada, 6!"));
    assert_eq!(eval("typeof count", &s), Value::from("number"));
    assert_eq!(eval("typeof nope", &s), Value::from("undefined"));
}

#[test]
fn test_methods_and_globals() {
    let s = scope();
    assert_eq!(eval("name.toUpperCase()", &s), Value::from("ADA"));
    assert_eq!(eval("items.join('-')", &s), Value::from("a-b-c"));
    assert_eq!(eval("items.includes('b')", &s), Value::from(true));
    assert_eq!(eval("Math.max(count, 9, 2)", &s), Value::from(9));
    assert_eq!(eval("parseFloat('2.5kg') * 2", &s), Value::from(5));
    assert_eq!(eval("isNaN('abc')", &s), Value::from(true));
    assert_eq!(eval("(1.005).toFixed(1)", &s), Value::from("1.0"));
    assert_eq!(eval("Object.keys(user).join()", &s), Value::from("name,age"));
    assert_eq!(eval("JSON.stringify(items)", &s), Value::from(r#"["a","b","c"]"#));
}

#[test]
fn test_unknown_calls() {
    let s = scope();
    assert!(matches!(
        compile("nope()").unwrap().evaluate(&s).unwrap_err(),
        EvalError::UndefinedVariable { .. }
    ));
    assert!(matches!(
        compile("count()").unwrap().evaluate(&s).unwrap_err(),
        EvalError::NotCallable { .. }
    ));
    assert!(matches!(
        compile("name.explode()").unwrap().evaluate(&s).unwrap_err(),
        EvalError::UnknownMethod { .. }
    ));
}

#[test]
fn test_assignments() {
    let s = scope();
    assert_eq!(eval("count = count + 1", &s), Value::from(6));
    assert_eq!(s.get("count"), Some(Value::from(6)));

    eval("count += 4; name = name + '!'", &s);
    assert_eq!(s.get("count"), Some(Value::from(10)));
    assert_eq!(s.get("name"), Some(Value::from("Ada!")));

    eval("user.age -= 6", &s);
    assert_eq!(s.get("user").unwrap().get("age"), Value::from(30));

    eval("user.email = 'g@navy.mil'", &s);
    assert_eq!(s.get("user").unwrap().get("email"), Value::from("g@navy.mil"));

    eval("items[0] = 'z'", &s);
    assert_eq!(s.get("items"), Some(array(["z", "b", "c"])));
}

#[test]
fn test_mutators_write_through_scope() {
    let s = scope();
    assert_eq!(eval("items.push('d', 'e')", &s), Value::from(5));
    assert_eq!(s.get("items"), Some(array(["a", "b", "c", "d", "e"])));

    assert_eq!(eval("items.splice(1, 2)", &s), array(["b", "c"]));
    assert_eq!(eval("items.reverse()", &s), array(["e", "d", "a"]));
    assert_eq!(s.get("items"), Some(array(["e", "d", "a"])));
}

#[test]
fn test_splice_to_the_end_with_infinity() {
    let s = MapScope::new().with("items", array([1, 2, 3]));
    assert_eq!(eval("items.splice(1, 1/0)", &s), array([2, 3]));
    assert_eq!(s.get("items"), Some(array([1])));
    assert_eq!(eval("'abc'.charAt(1/0)", &s), Value::from(""));
}

#[test]
fn test_mutator_on_literal_does_not_touch_scope() {
    let s = scope();
    assert_eq!(eval("[3, 1, 2].sort()", &s), array([1, 2, 3]));
    assert_eq!(s.get("items"), Some(array(["a", "b", "c"])));
}

#[test]
fn test_event_is_a_read_only_local() {
    let s = scope();
    let compiled = compile("count = $event.detail").unwrap();
    compiled
        .evaluate_with_event(&s, object([("detail", 42)]))
        .unwrap();
    assert_eq!(s.get("count"), Some(Value::from(42)));

    let err = compile("$event = 1")
        .unwrap()
        .evaluate_with_event(&s, Value::Null)
        .unwrap_err();
    assert!(matches!(err, EvalError::InvalidAssignment { .. }));
}

#[test]
fn test_statement_sequence_returns_last_value() {
    let s = scope();
    assert_eq!(eval("count = 1; count + 1", &s), Value::from(2));
}
