//! An embedded Prolog engine
//!
//! This crate implements SLD resolution over the terms produced by
//! `prolog-parser`: a clause database with assert/retract, unification
//! with occurs check, arithmetic evaluation, cut, negation as failure,
//! if-then-else, `findall/3`, exceptions, and term streams for loading
//! programs from strings or files.
//!
//! # Example
//!
//! ```ignore
//! use prolog_engine::Machine;
//! use prolog_parser::{parse_term, SrcId};
//!
//! let mut machine = Machine::new();
//! machine.consult_source("parent(tom, bob).", SrcId::empty())?;
//! let goal = parse_term("parent(tom, Who)", SrcId::empty())?;
//! let solution = machine.solve_first(&goal)?;
//! assert!(solution.is_some());
//! ```

mod arith;
mod machine;
mod solve;
mod unify;

pub use arith::{eval_arith, eval_comparison, CompOp, Numeric};
pub use machine::{Clause, EngineError, Machine, PredicateKey, DEFAULT_DEPTH_LIMIT};
pub use solve::{is_builtin, solve, Flow, Solutions, BUILTINS};
pub use unify::{terms_identical, unify, Bindings};
