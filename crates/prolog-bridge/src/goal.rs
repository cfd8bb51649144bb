//! Goal construction from the host's two calling conventions
//!
//! Callers either pass a complete goal string (`"parent(tom, X)"`) or a
//! predicate name plus an argument list (`"parent", ["tom", "X"]`).
//! Variables are detected purely by capitalization, so a string argument
//! starting with an uppercase letter or underscore is taken to be a
//! variable. There is no escape hatch for atoms that look like variables;
//! that sharp edge is part of the calling convention.

use crate::value::HostValue;

/// True iff the string names a Prolog variable: non-empty, first character
/// an ASCII uppercase letter or underscore.
pub fn is_variable_name(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_uppercase())
}

/// Drop one trailing clause terminator, tolerating `"fact(x)."` input.
pub fn strip_terminator(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed)
}

/// Assemble a goal string. With no arguments the (trimmed) input is the
/// complete goal already; otherwise arguments are rendered into
/// `name(a, b, ...)` with strings inserted verbatim.
pub fn build_query(predicate_or_goal: &str, args: &[HostValue]) -> String {
    let name = strip_terminator(predicate_or_goal);
    if args.is_empty() {
        return name.to_string();
    }
    let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    format!("{}({})", name, rendered.join(", "))
}

/// Structured binding extraction applies only when every argument is a
/// string naming a variable; any other argument shape falls back to
/// whole-goal decoding.
pub fn extraction_names(args: &[HostValue]) -> Option<Vec<String>> {
    if args.is_empty() {
        return None;
    }
    let mut names = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            HostValue::String(s) if is_variable_name(s) => names.push(s.clone()),
            _ => return None,
        }
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_variable_name() {
        assert!(is_variable_name("X"));
        assert!(is_variable_name("Result"));
        assert!(is_variable_name("_"));
        assert!(is_variable_name("_hidden"));
        assert!(!is_variable_name("tom"));
        assert!(!is_variable_name("x1"));
        assert!(!is_variable_name(""));
        assert!(!is_variable_name("1X"));
    }

    #[test]
    fn test_build_query_passes_goal_through() {
        assert_eq!(build_query("parent(tom, X)", &[]), "parent(tom, X)");
    }

    #[test]
    fn test_build_query_strips_trailing_dot() {
        assert_eq!(build_query("parent(tom, X).", &[]), "parent(tom, X)");
        assert_eq!(build_query("likes. ", &[]), "likes");
    }

    #[test]
    fn test_build_query_renders_arguments() {
        let args = vec![
            HostValue::string("tom"),
            HostValue::string("X"),
            HostValue::Int(3),
        ];
        assert_eq!(build_query("parent", &args), "parent(tom, X, 3)");
    }

    #[test]
    fn test_build_query_renders_lists_and_floats() {
        let args = vec![
            HostValue::List(vec![HostValue::Int(1), HostValue::Int(2)]),
            HostValue::Float(1.0),
        ];
        assert_eq!(build_query("p", &args), "p([1, 2], 1.0)");
    }

    #[test]
    fn test_extraction_requires_all_variable_names() {
        let all_vars = vec![HostValue::string("X"), HostValue::string("Y")];
        assert_eq!(
            extraction_names(&all_vars),
            Some(vec!["X".to_string(), "Y".to_string()])
        );

        // A single atom-looking argument disables extraction.
        let mixed = vec![HostValue::string("tom"), HostValue::string("X")];
        assert_eq!(extraction_names(&mixed), None);

        // Non-string arguments disable extraction too.
        let non_string = vec![HostValue::string("X"), HostValue::Int(1)];
        assert_eq!(extraction_names(&non_string), None);

        assert_eq!(extraction_names(&[]), None);
    }
}
