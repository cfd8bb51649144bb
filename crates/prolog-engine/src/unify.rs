//! Unification algorithm (Robinson's unification)
//!
//! This module implements first-order unification, which finds substitutions
//! that make two terms equal. This is the core operation of resolution.
//!
//! # Algorithm
//!
//! Implements Robinson's unification algorithm with occurs check to prevent
//! infinite structures.

use prolog_parser::{Symbol, Term};
use std::collections::HashMap;

/// A substitution maps variables to terms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    bindings: HashMap<Symbol, Term>,
}

impl Bindings {
    pub fn new() -> Self {
        Bindings {
            bindings: HashMap::new(),
        }
    }

    /// Bind a variable to a term
    pub fn bind(&mut self, var: Symbol, term: Term) {
        self.bindings.insert(var, term);
    }

    /// Get the binding for a variable
    pub fn get(&self, var: &Symbol) -> Option<&Term> {
        self.bindings.get(var)
    }

    /// Iterate over bindings
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Term)> {
        self.bindings.iter()
    }

    /// Apply substitution to a term, resolving bound variables recursively
    pub fn resolve(&self, term: &Term) -> Term {
        match term {
            Term::Var(var) => {
                if let Some(bound_term) = self.get(var) {
                    // Recursively resolve in case the bound term contains variables
                    self.resolve(bound_term)
                } else {
                    term.clone()
                }
            }
            Term::Int(_) | Term::Float(_) | Term::Atom(_) | Term::Str(_) => term.clone(),
            Term::Compound(functor, args) => {
                let new_args = args.iter().map(|arg| self.resolve(arg)).collect();
                Term::Compound(*functor, new_args)
            }
        }
    }

    /// Is the term still an unbound variable under this substitution?
    pub fn is_unbound(&self, term: &Term) -> bool {
        matches!(self.resolve(term), Term::Var(_))
    }
}

/// Unify two terms, extending the substitution on success.
/// This implements Robinson's unification algorithm.
///
/// On failure the substitution may contain bindings from partially unified
/// arguments; callers branch on a cloned substitution per alternative.
pub fn unify(term1: &Term, term2: &Term, bindings: &mut Bindings) -> bool {
    // Apply current substitution to both terms
    let t1 = bindings.resolve(term1);
    let t2 = bindings.resolve(term2);

    match (&t1, &t2) {
        // Anonymous variable "_" unifies with anything without binding
        (Term::Var(var), _) if var.as_ref() == "_" => true,
        (_, Term::Var(var)) if var.as_ref() == "_" => true,

        // Variable unifies with anything (occurs check applied)
        (Term::Var(var), t) | (t, Term::Var(var)) => {
            if occurs_check(var, t) {
                false
            } else {
                bindings.bind(*var, t.clone());
                true
            }
        }

        (Term::Int(a), Term::Int(b)) => a == b,
        (Term::Float(a), Term::Float(b)) => a == b,
        (Term::Atom(a), Term::Atom(b)) => a == b,
        (Term::Str(a), Term::Str(b)) => a == b,

        // Compound terms unify if functors match and all arguments unify
        (Term::Compound(f1, args1), Term::Compound(f2, args2)) => {
            if f1 != f2 || args1.len() != args2.len() {
                false
            } else {
                args1
                    .iter()
                    .zip(args2.iter())
                    .all(|(arg1, arg2)| unify(arg1, arg2, bindings))
            }
        }

        // Everything else fails to unify
        _ => false,
    }
}

/// Occurs check: does variable occur in term?
fn occurs_check(var: &Symbol, term: &Term) -> bool {
    match term {
        Term::Var(v) => v == var,
        Term::Int(_) | Term::Float(_) | Term::Atom(_) | Term::Str(_) => false,
        Term::Compound(_, args) => args.iter().any(|arg| occurs_check(var, arg)),
    }
}

/// Structural equality after resolving bindings, the `==/2` test.
/// Unbound variables are equal only to themselves.
pub fn terms_identical(term1: &Term, term2: &Term, bindings: &Bindings) -> bool {
    bindings.resolve(term1) == bindings.resolve(term2)
}
