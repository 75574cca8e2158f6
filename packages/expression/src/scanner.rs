//! Lexical dependency discovery.
//!
//! The scanner does not parse. It lexes every word-like identifier in the raw
//! fragment and keeps the ones the caller recognizes, so it over-reports:
//! a name inside a string literal or after a `.` is still reported when it
//! coincides with a property name. Properties only reached through a called
//! method are not found. Both are accepted limitations of lexical scanning.

use logos::Logos;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[^A-Za-z0-9_$]+")]
enum Word<'src> {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Identifier(&'src str),

    // `1px`, `2e3`: starts with a digit, never a name
    #[regex(r"[0-9][A-Za-z0-9_$]*")]
    Numeric,
}

/// Every identifier-shaped word in `fragment`, in order of appearance.
pub fn scan_identifiers(fragment: &str) -> Vec<&str> {
    Word::lexer(fragment)
        .filter_map(|word| match word {
            Ok(Word::Identifier(name)) => Some(name),
            _ => None,
        })
        .collect()
}

/// Names in `fragment` for which `is_known` holds, first occurrence order,
/// without duplicates.
pub fn scan_dependencies(fragment: &str, is_known: impl Fn(&str) -> bool) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for name in scan_identifiers(fragment) {
        if is_known(name) && !found.iter().any(|existing| existing == name) {
            found.push(name.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(names: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |name| names.contains(&name)
    }

    #[test]
    fn test_keeps_only_known_names_in_order() {
        let deps = scan_dependencies("b + a * b - c", known(&["a", "b"]));
        assert_eq!(deps, vec!["b", "a"]);
    }

    #[test]
    fn test_numbers_with_suffix_are_not_names() {
        assert_eq!(scan_identifiers("width + 10px + 2e3"), vec!["width"]);
    }

    #[test]
    fn test_dollar_and_underscore_identifiers() {
        assert_eq!(scan_identifiers("$event.detail || _x"), vec!["$event", "detail", "_x"]);
    }

    #[test]
    fn test_string_literal_false_positive_is_reported() {
        let deps = scan_dependencies("'count is ' + total", known(&["count", "total"]));
        assert_eq!(deps, vec!["count", "total"]);
    }

    #[test]
    fn test_member_name_coinciding_with_property_is_reported() {
        let deps = scan_dependencies("user.name", known(&["name"]));
        assert_eq!(deps, vec!["name"]);
    }
}
