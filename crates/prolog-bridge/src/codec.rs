//! Bidirectional conversion between host values and engine terms
//!
//! The mapping is deliberately lossy: host strings become atoms, and both
//! atoms and engine strings come back as host strings. The two engine text
//! types are not distinguishable on the host side.

use prolog_parser::Term;

use crate::value::HostValue;

/// Convert a host value to a term. Never fails: values without a sensible
/// term shape (and compounds with an empty functor) encode to the
/// empty-list atom, and the failure surfaces later when the goal runs.
pub fn encode(value: &HostValue) -> Term {
    match value {
        HostValue::Null => Term::nil(),
        HostValue::Bool(true) => Term::atom("true"),
        HostValue::Bool(false) => Term::atom("false"),
        HostValue::Int(i) => Term::Int(*i),
        HostValue::Float(x) => Term::Float(*x),
        HostValue::String(s) => Term::atom(s),
        HostValue::List(items) => Term::list(items.iter().map(encode).collect()),
        HostValue::Compound { functor, args } => {
            if functor.is_empty() {
                Term::nil()
            } else {
                Term::compound(functor, args.iter().map(encode).collect())
            }
        }
    }
}

/// Convert a term back to a host value. Callers resolve bindings first;
/// any variable still unbound decodes to Null.
pub fn decode(term: &Term) -> HostValue {
    match term {
        Term::Var(_) => HostValue::Null,
        Term::Int(i) => HostValue::Int(*i),
        Term::Float(x) => HostValue::Float(*x),
        Term::Str(s) => HostValue::String(s.clone()),
        Term::Atom(name) => {
            if term.is_nil() {
                HostValue::List(Vec::new())
            } else {
                HostValue::String(name.as_ref().clone())
            }
        }
        Term::Compound(functor, args) => {
            // List deconstruction first: a '.'/2 chain ending in nil is a
            // list, never a named compound.
            if let Some(elements) = term.list_elements() {
                HostValue::List(elements.into_iter().map(decode).collect())
            } else {
                HostValue::Compound {
                    functor: functor.as_ref().clone(),
                    args: args.iter().map(decode).collect(),
                }
            }
        }
    }
}

/// Read the solved goal's arguments positionally into a name → value
/// mapping. Name at index `i` takes argument `i`, for `i` below the goal's
/// arity.
pub fn extract_bindings(goal: &Term, names: &[String]) -> Vec<(String, HostValue)> {
    let args: &[Term] = match goal {
        Term::Compound(_, args) => args,
        _ => &[],
    };
    names
        .iter()
        .zip(args.iter())
        .map(|(name, arg)| (name.clone(), decode(arg)))
        .collect()
}
