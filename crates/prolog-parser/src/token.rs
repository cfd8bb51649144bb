use chumsky::prelude::*;
use std::fmt;

use crate::Span;

pub type SpannedToken = (Token, Span);
pub type LexError = Simple<char, Span>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Unquoted atom or alphabetic operator (is, mod)
    Ident(String),
    /// Quoted atom: 'two words'
    QuotedAtom(String),
    /// Variable: uppercase- or underscore-initial
    Variable(String),
    Number(String),
    String(String),
    Operator(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    /// Clause terminator
    Dot,
    Bar,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(text) => write!(f, "{}", text),
            Token::QuotedAtom(text) => write!(f, "'{}'", text),
            Token::Variable(text) => write!(f, "{}", text),
            Token::Number(text) => write!(f, "{}", text),
            Token::String(text) => write!(f, "\"{}\"", text),
            Token::Operator(text) => write!(f, "{}", text),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Bar => write!(f, "|"),
        }
    }
}

fn quoted_literal(quote: char) -> impl Parser<char, String, Error = LexError> + Clone {
    let escape_sequence = just('\\').ignore_then(choice((
        just(quote).to(quote),
        just('n').to('\n'),
        just('t').to('\t'),
        just('\\').to('\\'),
    )));

    let literal_char = choice((
        escape_sequence,
        filter(move |c| *c != quote && *c != '\\' && *c != '\n'),
    ));

    just(quote)
        .ignore_then(literal_char.repeated())
        .then_ignore(just(quote))
        .collect::<String>()
}

fn string_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    quoted_literal('"').labelled("string")
}

fn quoted_atom() -> impl Parser<char, String, Error = LexError> + Clone {
    quoted_literal('\'').labelled("quoted atom")
}

fn number_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    let digits = text::int(10);
    let fraction = just('.').ignore_then(text::digits(10));
    let exponent = just('e')
        .or(just('E'))
        .ignore_then(just('+').or(just('-')).or_not())
        .then(text::digits(10));

    digits
        .then(fraction.or_not())
        .then(exponent.or_not())
        .map(
            |((whole, frac), exp): ((String, Option<String>), Option<(Option<char>, String)>)| {
                let mut text = whole;
                if let Some(frac) = frac {
                    text.push('.');
                    text.push_str(&frac);
                }
                if let Some((sign, digits)) = exp {
                    text.push('e');
                    if let Some(sign) = sign {
                        text.push(sign);
                    }
                    text.push_str(&digits);
                }
                text
            },
        )
        .labelled("number")
}

fn identifier() -> impl Parser<char, Token, Error = LexError> + Clone {
    text::ident()
        .map(|ident: String| {
            let variable = ident
                .chars()
                .next()
                .is_some_and(|first| first.is_uppercase() || first == '_');
            if variable {
                Token::Variable(ident)
            } else {
                Token::Ident(ident)
            }
        })
        .labelled("identifier")
}

fn line_comment() -> impl Parser<char, (), Error = LexError> + Clone {
    just('%')
        .then(filter(|c| *c != '\n').repeated())
        .ignored()
        .labelled("line comment")
}

fn block_comment() -> impl Parser<char, (), Error = LexError> + Clone {
    just("/*")
        .then(
            choice((
                filter(|c| *c != '*').ignored(),
                just('*').then(filter(|c| *c != '/')).ignored(),
            ))
            .repeated()
            .then(just("*/")),
        )
        .ignored()
        .labelled("block comment")
}

fn comment() -> impl Parser<char, (), Error = LexError> + Clone {
    block_comment().or(line_comment()).labelled("comment")
}

fn spacing() -> impl Parser<char, (), Error = LexError> + Clone {
    comment()
        .or(text::whitespace().at_least(1).ignored())
        .repeated()
        .ignored()
}

fn operator(text: &'static str) -> impl Parser<char, Token, Error = LexError> + Clone {
    just(text).to(Token::Operator(text.to_string()))
}

pub fn lexer() -> impl Parser<char, Vec<SpannedToken>, Error = LexError> + Clone {
    // Longest operators first so prefixes do not shadow them.
    let punct = choice((
        choice((
            operator(":-"),
            operator("?-"),
            operator("->"),
            operator("\\=="),
            operator("\\="),
            operator("\\+"),
            operator("=:="),
            operator("=\\="),
            operator("=="),
            operator("=<"),
            operator("="),
            operator(">="),
            operator(">"),
            operator("<"),
        )),
        choice((
            operator("+"),
            operator("-"),
            operator("*"),
            operator("/"),
            operator(";"),
            operator("!"),
        )),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
        just('|').to(Token::Bar),
    ));

    let token = choice((
        string_literal().map(Token::String),
        quoted_atom().map(Token::QuotedAtom),
        number_literal().map(Token::Number),
        identifier(),
        punct,
    ))
    .map_with_span(|token, span| (token, span))
    .padded_by(spacing());

    token.repeated().then_ignore(end())
}
