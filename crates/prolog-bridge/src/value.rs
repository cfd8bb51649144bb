//! Host-side value types
//!
//! [`HostValue`] is the dynamic tagged value crossing the bridge boundary.
//! Compounds are exposed as a two-key `{functor, args}` mapping so hosts
//! without a native term type can still round-trip them; a Prolog list is
//! a plain ordered sequence and never a compound, even though the engine
//! stores lists as `'.'/2` chains.

use serde::{Deserialize, Serialize};

/// A dynamic host value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<HostValue>),
    Compound {
        functor: String,
        args: Vec<HostValue>,
    },
}

impl HostValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn string(s: &str) -> HostValue {
        HostValue::String(s.to_string())
    }

    pub fn compound(functor: &str, args: Vec<HostValue>) -> HostValue {
        HostValue::Compound {
            functor: functor.to_string(),
            args,
        }
    }
}

/// Renders a value the way it would be written in a goal string. Strings
/// print verbatim, so `"X"` stays a variable and `"tom"` stays an atom.
impl std::fmt::Display for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::Null => write!(f, "[]"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Int(i) => write!(f, "{}", i),
            // {:?} keeps a decimal point or exponent, so the text
            // re-parses as a float
            HostValue::Float(x) => write!(f, "{:?}", x),
            HostValue::String(s) => write!(f, "{}", s),
            HostValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Compound { functor, args } => {
                write!(f, "{}", functor)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// One solution of a query: either the whole solved goal decoded to a
/// value, or a mapping of the caller's variable names to their bindings.
/// The mapping keeps the caller's argument order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Solution {
    Term(HostValue),
    Bindings(Vec<(String, HostValue)>),
}
