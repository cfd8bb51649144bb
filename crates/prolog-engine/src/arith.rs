//! Arithmetic evaluation for `is/2` and the numeric comparison operators
//!
//! Expressions are evaluated over an int/float numeric tower: integer
//! operations stay integral, any float operand promotes the result to float.
//! Failures raise ISO-style exception terms (`instantiation_error`,
//! `type_error(evaluable, ...)`, `evaluation_error(zero_divisor)`,
//! `evaluation_error(int_overflow)`) that propagate to the nearest
//! catch point.

use crate::unify::Bindings;
use prolog_parser::Term;

/// Numeric comparison operators (`=:=`, `=\=`, `<`, `>`, `=<`, `>=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "=:=" => Some(CompOp::Eq),
            "=\\=" => Some(CompOp::Neq),
            "<" => Some(CompOp::Lt),
            ">" => Some(CompOp::Gt),
            "=<" => Some(CompOp::Lte),
            ">=" => Some(CompOp::Gte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn to_term(self) -> Term {
        match self {
            Numeric::Int(i) => Term::Int(i),
            Numeric::Float(f) => Term::Float(f),
        }
    }

    fn add(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => Numeric::Int(l.wrapping_add(r)),
            (l, r) => Numeric::Float(l.to_f64() + r.to_f64()),
        }
    }

    fn sub(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => Numeric::Int(l.wrapping_sub(r)),
            (l, r) => Numeric::Float(l.to_f64() - r.to_f64()),
        }
    }

    fn mul(self, other: Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Int(l), Numeric::Int(r)) => Numeric::Int(l.wrapping_mul(r)),
            (l, r) => Numeric::Float(l.to_f64() * r.to_f64()),
        }
    }

    fn div(self, other: Numeric) -> Result<Numeric, Term> {
        match (self, other) {
            (Numeric::Int(_), Numeric::Int(0)) => Err(zero_divisor()),
            // checked_div fails on i64::MIN / -1
            (Numeric::Int(l), Numeric::Int(r)) => {
                l.checked_div(r).map(Numeric::Int).ok_or_else(int_overflow)
            }
            (l, r) => {
                let divisor = r.to_f64();
                if divisor == 0.0 {
                    Err(zero_divisor())
                } else {
                    Ok(Numeric::Float(l.to_f64() / divisor))
                }
            }
        }
    }

    fn modulo(self, other: Numeric) -> Result<Numeric, Term> {
        match (self, other) {
            (Numeric::Int(_), Numeric::Int(0)) => Err(zero_divisor()),
            (Numeric::Int(l), Numeric::Int(r)) => l
                .checked_rem_euclid(r)
                .map(Numeric::Int)
                .ok_or_else(int_overflow),
            (l, r) => {
                let divisor = r.to_f64();
                if divisor == 0.0 {
                    Err(zero_divisor())
                } else {
                    Ok(Numeric::Float(l.to_f64() % divisor))
                }
            }
        }
    }

    fn neg(self) -> Result<Numeric, Term> {
        match self {
            Numeric::Int(i) => i.checked_neg().map(Numeric::Int).ok_or_else(int_overflow),
            Numeric::Float(f) => Ok(Numeric::Float(-f)),
        }
    }

    fn abs(self) -> Result<Numeric, Term> {
        match self {
            Numeric::Int(i) => i.checked_abs().map(Numeric::Int).ok_or_else(int_overflow),
            Numeric::Float(f) => Ok(Numeric::Float(f.abs())),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }
}

fn zero_divisor() -> Term {
    Term::compound(
        "error",
        vec![
            Term::compound("evaluation_error", vec![Term::atom("zero_divisor")]),
            Term::atom("is"),
        ],
    )
}

fn int_overflow() -> Term {
    Term::compound(
        "error",
        vec![
            Term::compound("evaluation_error", vec![Term::atom("int_overflow")]),
            Term::atom("is"),
        ],
    )
}

fn instantiation_error() -> Term {
    Term::compound(
        "error",
        vec![Term::atom("instantiation_error"), Term::atom("is")],
    )
}

fn not_evaluable(name: &str, arity: usize) -> Term {
    Term::compound(
        "error",
        vec![
            Term::compound(
                "type_error",
                vec![
                    Term::atom("evaluable"),
                    Term::compound("/", vec![Term::atom(name), Term::Int(arity as i64)]),
                ],
            ),
            Term::atom("is"),
        ],
    )
}

/// Evaluate an arithmetic expression to a numeric value.
/// Raises an exception term for unbound variables, non-evaluable
/// functors and division by zero.
pub fn eval_arith(term: &Term, bindings: &Bindings) -> Result<Numeric, Term> {
    match term {
        Term::Int(i) => Ok(Numeric::Int(*i)),
        Term::Float(f) => Ok(Numeric::Float(*f)),

        Term::Var(var) => match bindings.get(var) {
            Some(bound_term) => {
                let bound_term = bound_term.clone();
                eval_arith(&bound_term, bindings)
            }
            None => Err(instantiation_error()),
        },

        Term::Atom(name) => Err(not_evaluable(name.as_ref(), 0)),
        Term::Str(_) => Err(not_evaluable("string", 0)),

        Term::Compound(functor, args) => match (functor.as_ref().as_str(), args.len()) {
            ("+", 2) => {
                let left = eval_arith(&args[0], bindings)?;
                let right = eval_arith(&args[1], bindings)?;
                Ok(left.add(right))
            }
            ("-", 2) => {
                let left = eval_arith(&args[0], bindings)?;
                let right = eval_arith(&args[1], bindings)?;
                Ok(left.sub(right))
            }
            ("*", 2) => {
                let left = eval_arith(&args[0], bindings)?;
                let right = eval_arith(&args[1], bindings)?;
                Ok(left.mul(right))
            }
            ("/", 2) => {
                let left = eval_arith(&args[0], bindings)?;
                let right = eval_arith(&args[1], bindings)?;
                left.div(right)
            }
            ("mod", 2) => {
                let left = eval_arith(&args[0], bindings)?;
                let right = eval_arith(&args[1], bindings)?;
                left.modulo(right)
            }
            ("-", 1) => eval_arith(&args[0], bindings)?.neg(),
            ("abs", 1) => eval_arith(&args[0], bindings)?.abs(),
            (name, arity) => Err(not_evaluable(name, arity)),
        },
    }
}

/// Evaluate a numeric comparison between two arithmetic expressions.
pub fn eval_comparison(
    op: CompOp,
    left: &Term,
    right: &Term,
    bindings: &Bindings,
) -> Result<bool, Term> {
    let left = eval_arith(left, bindings)?;
    let right = eval_arith(right, bindings)?;

    let holds = match op {
        CompOp::Eq => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l == r,
            (l, r) => l.to_f64() == r.to_f64(),
        },
        CompOp::Neq => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l != r,
            (l, r) => l.to_f64() != r.to_f64(),
        },
        CompOp::Lt => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l < r,
            (l, r) => l.to_f64() < r.to_f64(),
        },
        CompOp::Gt => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l > r,
            (l, r) => l.to_f64() > r.to_f64(),
        },
        CompOp::Lte => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l <= r,
            (l, r) => l.to_f64() <= r.to_f64(),
        },
        CompOp::Gte => match (left, right) {
            (Numeric::Int(l), Numeric::Int(r)) => l >= r,
            (l, r) => l.to_f64() >= r.to_f64(),
        },
    };

    Ok(holds)
}
