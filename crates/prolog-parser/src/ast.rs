//! Term representation for Prolog programs
//!
//! A [`Term`] is the single tree type shared by the parser, the engine and
//! the bridge codec:
//!
//! - **Variables**: `X`, `_Tmp`, `_`
//! - **Atoms**: `tom`, `[]`, `'quoted atom'`
//! - **Numbers**: 64-bit integers and double floats
//! - **Strings**: `"text"` (distinct from atoms)
//! - **Compounds**: functor plus arguments, `parent(tom, bob)`
//!
//! Lists are not a separate variant: the parser desugars `[1, 2 | T]` into
//! a chain of `'.'/2` cells terminated by the nil atom `[]`, which is also
//! how clause resolution and the value codec see them.

use internment::Intern;
use std::fmt;

/// Interned string for efficient storage and comparison
pub type Symbol = Intern<String>;

/// Functor name of the list cons cell.
pub const CONS: &str = ".";

/// Name of the nil / empty-list atom.
pub const NIL: &str = "[]";

/// A Prolog term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Variable: uppercase or underscore-initial (X, _Tmp, _)
    Var(Symbol),
    /// 64-bit integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// Atom: symbolic constant (tom, [], 'two words')
    Atom(Symbol),
    /// String object, distinct from an atom
    Str(String),
    /// Compound term: functor with at least one argument
    Compound(Symbol, Vec<Term>),
}

impl Term {
    pub fn var(name: &str) -> Term {
        Term::Var(Intern::new(name.to_string()))
    }

    pub fn atom(name: &str) -> Term {
        Term::Atom(Intern::new(name.to_string()))
    }

    pub fn compound(name: &str, args: Vec<Term>) -> Term {
        if args.is_empty() {
            Term::atom(name)
        } else {
            Term::Compound(Intern::new(name.to_string()), args)
        }
    }

    /// The empty-list atom `[]`.
    pub fn nil() -> Term {
        Term::atom(NIL)
    }

    /// A single list cell `'.'(Head, Tail)`.
    pub fn cons(head: Term, tail: Term) -> Term {
        Term::compound(CONS, vec![head, tail])
    }

    /// Build a proper list from elements, consed tail-first so element
    /// order is preserved head-to-tail.
    pub fn list(elements: Vec<Term>) -> Term {
        elements
            .into_iter()
            .rev()
            .fold(Term::nil(), |tail, head| Term::cons(head, tail))
    }

    pub fn is_atom_named(&self, name: &str) -> bool {
        matches!(self, Term::Atom(a) if a.as_ref() == name)
    }

    pub fn is_nil(&self) -> bool {
        self.is_atom_named(NIL)
    }

    /// Functor name and arity; atoms have arity 0, non-callable terms None.
    pub fn functor(&self) -> Option<(Symbol, usize)> {
        match self {
            Term::Atom(name) => Some((*name, 0)),
            Term::Compound(name, args) => Some((*name, args.len())),
            _ => None,
        }
    }

    /// Deconstruct one list cell, if this term is one.
    pub fn as_cons(&self) -> Option<(&Term, &Term)> {
        match self {
            Term::Compound(name, args) if name.as_ref() == CONS && args.len() == 2 => {
                Some((&args[0], &args[1]))
            }
            _ => None,
        }
    }

    /// Collect the elements of a proper list. Returns None when the chain
    /// does not terminate in nil (partial lists, non-lists).
    pub fn list_elements(&self) -> Option<Vec<&Term>> {
        let mut elements = Vec::new();
        let mut cursor = self;
        loop {
            if cursor.is_nil() {
                return Some(elements);
            }
            let (head, tail) = cursor.as_cons()?;
            elements.push(head);
            cursor = tail;
        }
    }
}

/// Binary operators written infix when rendering terms.
const INFIX: &[&str] = &[
    ",", ";", "->", ":-", "=", "\\=", "==", "\\==", "is", "<", ">", "=<", ">=", "=:=", "=\\=",
    "+", "-", "*", "/", "mod", "|",
];

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            _ => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{}", name),
            Term::Int(i) => write!(f, "{}", i),
            Term::Float(x) => write!(f, "{:?}", x),
            Term::Atom(name) => write!(f, "{}", name),
            Term::Str(s) => {
                write!(f, "\"")?;
                write_escaped(f, s)?;
                write!(f, "\"")
            }
            Term::Compound(name, args) => {
                // Proper and partial lists render in bracket notation.
                if self.as_cons().is_some() {
                    write!(f, "[")?;
                    let mut cursor = self;
                    let mut first = true;
                    while let Some((head, tail)) = cursor.as_cons() {
                        if !first {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", head)?;
                        first = false;
                        cursor = tail;
                    }
                    if !cursor.is_nil() {
                        write!(f, "|{}", cursor)?;
                    }
                    return write!(f, "]");
                }
                if args.len() == 2 && INFIX.contains(&name.as_ref().as_str()) {
                    return write!(f, "({}{}{})", args[0], name, args[1]);
                }
                if args.len() == 1 && (name.as_ref() == ":-" || name.as_ref() == "?-") {
                    return write!(f, "{} {}", name, args[0]);
                }
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_construction_preserves_order() {
        let list = Term::list(vec![Term::Int(1), Term::Int(2), Term::Int(3)]);
        let elements = list.list_elements().unwrap();
        assert_eq!(elements, vec![&Term::Int(1), &Term::Int(2), &Term::Int(3)]);
    }

    #[test]
    fn test_empty_list_is_nil_atom() {
        assert!(Term::list(vec![]).is_nil());
        assert_eq!(Term::list(vec![]), Term::atom("[]"));
    }

    #[test]
    fn test_partial_list_is_not_proper() {
        let partial = Term::cons(Term::Int(1), Term::var("T"));
        assert!(partial.list_elements().is_none());
    }

    #[test]
    fn test_functor_of_atom_and_compound() {
        assert_eq!(
            Term::atom("foo").functor(),
            Some((Intern::new("foo".to_string()), 0))
        );
        let c = Term::compound("point", vec![Term::Int(1), Term::Int(2)]);
        assert_eq!(c.functor(), Some((Intern::new("point".to_string()), 2)));
        assert_eq!(Term::Int(3).functor(), None);
    }

    #[test]
    fn test_display_list_and_compound() {
        let list = Term::list(vec![Term::Int(1), Term::Int(2)]);
        assert_eq!(list.to_string(), "[1,2]");
        let c = Term::compound("point", vec![Term::Int(1), Term::Int(2)]);
        assert_eq!(c.to_string(), "point(1,2)");
        let rule = Term::compound(
            ":-",
            vec![Term::atom("a"), Term::compound(",", vec![Term::atom("b"), Term::atom("c")])],
        );
        assert_eq!(rule.to_string(), "(a:-(b,c))");
    }
}
