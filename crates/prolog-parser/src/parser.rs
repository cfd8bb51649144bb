//! Parser implementation for Prolog terms and programs.
//!
//! Supports the operator subset the bridge and its knowledge bases need:
//!
//! - Facts and rules: `parent(tom, bob).`, `gp(X, Z) :- p(X, Y), p(Y, Z).`
//! - Directives and queries: `:- dynamic(score/2).`, `?- member(X, [1,2]).`
//! - Control operators: `,`, `;`, `->`, `\+`, `!`
//! - Unification/comparison: `=`, `\=`, `==`, `\==`, `<`, `>`, `=<`, `>=`,
//!   `=:=`, `=\=`, `is`
//! - Arithmetic: `+`, `-`, `*`, `/`, `mod` with standard precedence
//! - Lists: `[]`, `[1, 2, 3]`, `[H|T]` (desugared to `'.'/2` chains)
//!
//! Terms parse at standard Prolog priorities: 1200 for `:-`/`?-`, 1100 for
//! `;`, 1050 for `->`, 1000 for `,`, 900 for `\+`, 700 for comparisons,
//! then arithmetic. Argument positions parse at priority 999 so commas
//! separate arguments instead of building conjunctions.

use chumsky::prelude::*;
use chumsky::stream::Stream;
use internment::Intern;
use std::fmt;

use crate::ast::Term;
use crate::token::{lexer, LexError, SpannedToken, Token};
use crate::{Span, SrcId};

type ParserError = Simple<Token, Span>;

#[derive(Debug, Clone)]
pub enum ParseError {
    Lex(LexError),
    Parse(ParserError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => write!(f, "syntax error: {}", err),
            ParseError::Parse(err) => write!(f, "syntax error: {}", err),
        }
    }
}

impl std::error::Error for ParseError {}

fn ident_token() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! {
        Token::Ident(ident) => ident,
        Token::QuotedAtom(ident) => ident,
    }
    .labelled("atom")
}

fn variable_token() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::Variable(ident) => ident }.labelled("variable")
}

fn string_token() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::String(value) => value }.labelled("string")
}

fn number_token() -> impl Parser<Token, Term, Error = ParserError> + Clone {
    select! { Token::Number(number) => number }
        .try_map(|value: String, span| {
            // An exponent without a fraction ("1e300") is still a float.
            if value.contains('.') || value.contains('e') {
                value
                    .parse::<f64>()
                    .map(Term::Float)
                    .map_err(|_| ParserError::custom(span, "invalid float"))
            } else {
                value
                    .parse::<i64>()
                    .map(Term::Int)
                    .map_err(|_| ParserError::custom(span, "invalid integer"))
            }
        })
        .labelled("number")
}

fn operator_token(op: &'static str) -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::Operator(value) if value == op => value }
}

fn alpha_operator(name: &'static str) -> impl Parser<Token, (), Error = ParserError> + Clone {
    select! { Token::Ident(value) if value == name => () }
}

fn token(kind: Token) -> impl Parser<Token, Token, Error = ParserError> + Clone {
    just(kind)
}

/// Fold a right-associative (xfy) operator chain.
fn fold_right(op: &'static str, operands: Vec<Term>) -> Term {
    let mut iter = operands.into_iter().rev();
    let rightmost = match iter.next() {
        Some(operand) => operand,
        // separated_by(..).at_least(1) never yields an empty chain
        None => Term::atom("true"),
    };
    iter.fold(rightmost, |acc, operand| {
        Term::compound(op, vec![operand, acc])
    })
}

fn list_parser<'a>(
    item: impl Parser<Token, Term, Error = ParserError> + Clone + 'a,
) -> impl Parser<Token, Term, Error = ParserError> + Clone + 'a {
    let contents = item
        .clone()
        .separated_by(token(Token::Comma))
        .at_least(1)
        .then(token(Token::Bar).ignore_then(item).or_not());

    token(Token::LBracket)
        .ignore_then(contents.or_not())
        .then_ignore(token(Token::RBracket))
        .map(|contents| match contents {
            None => Term::nil(),
            Some((elements, tail)) => elements
                .into_iter()
                .rev()
                .fold(tail.unwrap_or_else(Term::nil), |tail, head| {
                    Term::cons(head, tail)
                }),
        })
        .labelled("list")
}

fn infix_700() -> impl Parser<Token, &'static str, Error = ParserError> + Clone {
    choice((
        operator_token("=:=").to("=:="),
        operator_token("=\\=").to("=\\="),
        operator_token("==").to("=="),
        operator_token("\\==").to("\\=="),
        operator_token("=<").to("=<"),
        operator_token(">=").to(">="),
        operator_token("=").to("="),
        operator_token("\\=").to("\\="),
        operator_token("<").to("<"),
        operator_token(">").to(">"),
        alpha_operator("is").to("is"),
    ))
}

/// Parse a term at priority 1200.
fn term_parser() -> impl Parser<Token, Term, Error = ParserError> + Clone {
    recursive(|term1200| {
        // Argument-level terms (priority 999): no naked commas.
        let term999 = recursive(|term999| {
            let variable = variable_token().map(|name| Term::Var(Intern::new(name)));

            let string_const = string_token().map(Term::Str);

            let parens = term1200
                .clone()
                .delimited_by(token(Token::LParen), token(Token::RParen));

            let list = list_parser(term999.clone());

            let cut = operator_token("!").map(|_| Term::atom("!"));

            let atom_or_compound = ident_token()
                .then(
                    term999
                        .clone()
                        .separated_by(token(Token::Comma))
                        .at_least(1)
                        .delimited_by(token(Token::LParen), token(Token::RParen))
                        .or_not(),
                )
                .map(|(name, args)| match args {
                    Some(args) => Term::compound(&name, args),
                    None => Term::atom(&name),
                });

            let primary = choice((
                variable,
                number_token(),
                string_const,
                parens,
                list,
                cut,
                atom_or_compound,
            ));

            let unary = operator_token("-")
                .ignore_then(primary.clone())
                .map(|operand| match operand {
                    Term::Int(i) => Term::Int(-i),
                    Term::Float(x) => Term::Float(-x),
                    other => Term::compound("-", vec![other]),
                })
                .or(primary);

            let mul_div = unary
                .clone()
                .then(
                    choice((
                        operator_token("*").to("*"),
                        operator_token("/").to("/"),
                        alpha_operator("mod").to("mod"),
                    ))
                    .then(unary)
                    .repeated(),
                )
                .foldl(|left, (op, right)| Term::compound(op, vec![left, right]));

            let add_sub = mul_div
                .clone()
                .then(
                    choice((operator_token("+").to("+"), operator_token("-").to("-")))
                        .then(mul_div)
                        .repeated(),
                )
                .foldl(|left, (op, right)| Term::compound(op, vec![left, right]));

            let comparison = add_sub
                .clone()
                .then(infix_700().then(add_sub).or_not())
                .map(|(left, rest)| match rest {
                    Some((op, right)) => Term::compound(op, vec![left, right]),
                    None => left,
                });

            // \+ at priority 900, right-nesting.
            recursive(|negation| {
                operator_token("\\+")
                    .ignore_then(negation)
                    .map(|goal| Term::compound("\\+", vec![goal]))
                    .or(comparison)
            })
        });

        let conjunction = term999
            .separated_by(token(Token::Comma))
            .at_least(1)
            .map(|goals| fold_right(",", goals));

        let if_then = conjunction
            .separated_by(operator_token("->"))
            .at_least(1)
            .map(|goals| fold_right("->", goals));

        let disjunction = if_then
            .separated_by(operator_token(";"))
            .at_least(1)
            .map(|goals| fold_right(";", goals));

        let directive = operator_token(":-")
            .ignore_then(disjunction.clone())
            .map(|goal| Term::compound(":-", vec![goal]));

        let initial_query = operator_token("?-")
            .ignore_then(disjunction.clone())
            .map(|goal| Term::compound("?-", vec![goal]));

        let clause = disjunction
            .clone()
            .then(operator_token(":-").ignore_then(disjunction).or_not())
            .map(|(head, body)| match body {
                Some(body) => Term::compound(":-", vec![head, body]),
                None => head,
            });

        choice((directive, initial_query, clause)).labelled("term")
    })
}

fn lex_with_src(input: &str, src: SrcId) -> Result<Vec<SpannedToken>, Vec<ParseError>> {
    let len = input.chars().count();
    let eoi = Span::new(src, len..len);
    let stream = Stream::from_iter(
        eoi,
        input
            .chars()
            .enumerate()
            .map(|(idx, ch)| (ch, Span::new(src, idx..idx + 1))),
    );
    lexer()
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Lex).collect())
}

fn parse_tokens<T>(
    parser: impl Parser<Token, T, Error = ParserError>,
    tokens: Vec<SpannedToken>,
    eoi: Span,
) -> Result<T, Vec<ParseError>> {
    let stream = Stream::from_iter(eoi, tokens.into_iter());
    parser
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Parse).collect())
}

fn eoi_span(input: &str, src: SrcId) -> Span {
    let end = input.chars().count();
    Span::new(src, end..end)
}

/// Parse a single term, the analogue of an engine's chars-to-term call.
/// A trailing clause terminator `.` is tolerated and ignored.
pub fn parse_term(input: &str, src: SrcId) -> Result<Term, Vec<ParseError>> {
    let mut tokens = lex_with_src(input, src)?;
    if tokens.last().map(|(tok, _)| tok) == Some(&Token::Dot) {
        tokens.pop();
    }
    parse_tokens(term_parser().then_ignore(end()), tokens, eoi_span(input, src))
}

/// Parse a whole program: a sequence of `.`-terminated terms.
pub fn parse_program(input: &str, src: SrcId) -> Result<Vec<Term>, Vec<ParseError>> {
    let tokens = lex_with_src(input, src)?;
    parse_tokens(
        term_parser()
            .then_ignore(token(Token::Dot))
            .repeated()
            .then_ignore(end()),
        tokens,
        eoi_span(input, src),
    )
}

/// Incremental reader over `.`-terminated terms, backing the engine's
/// `read_term/3` over string streams. Lexes eagerly (so malformed input
/// fails at open time) but parses one clause per call.
pub struct TermStream {
    tokens: Vec<SpannedToken>,
    pos: usize,
    eoi: Span,
}

impl TermStream {
    pub fn new(input: &str, src: SrcId) -> Result<Self, Vec<ParseError>> {
        let tokens = lex_with_src(input, src)?;
        Ok(Self {
            tokens,
            pos: 0,
            eoi: eoi_span(input, src),
        })
    }

    /// Read the next term, or None at end of input.
    pub fn next_term(&mut self) -> Result<Option<Term>, Vec<ParseError>> {
        if self.pos >= self.tokens.len() {
            return Ok(None);
        }
        let dot = self.tokens[self.pos..]
            .iter()
            .position(|(tok, _)| *tok == Token::Dot)
            .map(|offset| self.pos + offset);
        let Some(dot) = dot else {
            let span = self.tokens.last().map(|(_, span)| *span).unwrap_or(self.eoi);
            return Err(vec![ParseError::Parse(ParserError::custom(
                span,
                "missing terminating '.'",
            ))]);
        };
        let clause: Vec<SpannedToken> = self.tokens[self.pos..dot].to_vec();
        self.pos = dot + 1;
        let term = parse_tokens(term_parser().then_ignore(end()), clause, self.eoi)?;
        Ok(Some(term))
    }
}
