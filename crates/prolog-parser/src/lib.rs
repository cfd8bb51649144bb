//! Parser for Prolog terms and programs
//!
//! This crate implements a parser combinator-based parser using the Chumsky
//! library. It parses Prolog source text into [`Term`] values.
//!
//! # Supported Syntax
//!
//! - **Facts**: `parent(tom, bob).`
//! - **Rules**: `grandparent(X, Z) :- parent(X, Y), parent(Y, Z).`
//! - **Directives**: `:- assertz(loaded).`
//! - **Control**: `,`, `;`, `->`, `\+`, `!`
//! - **Arithmetic and comparison**: `X is 1 + 2 * 3`, `X =< Y`, `X =:= Y`
//! - **Lists**: `[1, 2, 3]`, `[Head|Tail]`
//! - **Strings and quoted atoms**: `"text"`, `'two words'`
//!
//! # Example
//!
//! ```ignore
//! use prolog_parser::{parse_program, SrcId};
//!
//! let program_text = "parent(tom, bob). parent(bob, ann).";
//! let program = parse_program(program_text, SrcId::empty()).expect("Parse error");
//! ```

mod ast;
mod parser;
mod span;
mod src;
mod token;

pub use ast::{Symbol, Term, CONS, NIL};
pub use parser::{parse_program, parse_term, ParseError, TermStream};
pub use span::Span;
pub use src::SrcId;
pub use token::{LexError, Token};
