use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use log::{debug, trace, warn};

pub mod errors {
    use error_chain::error_chain;
    error_chain! {
        errors {
            UnknownCharacter(c: char) {
                description("Unknown character"),
                display("Unknown character: {}", c),
            }

            NumberParseError(s: String) {
                description("Error parsing number"),
                display("Error parsing number: {}", s),
            }
        }
    }
}

use errors::*;

/// Internal symbol the two-character power operator is rewritten to.
pub const POWER: char = '^';
/// Internal symbol the two-character integer-division operator is rewritten to.
pub const INT_DIV: char = '#';

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Rem,
    IntDiv,
}

impl Operator {
    pub fn from_char(c: char) -> Option<Operator> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            POWER => Some(Operator::Pow),
            '%' => Some(Operator::Rem),
            INT_DIV => Some(Operator::IntDiv),
            _ => None,
        }
    }

    /// Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div | Operator::Rem | Operator::IntDiv => 2,
            Operator::Pow => 3,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "**",
            Operator::Rem => "%",
            Operator::IntDiv => "//",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Token {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

/// Strips all whitespace and rewrites `**` and `//` to their one-character
/// forms. This is a plain textual substitution over the whole input.
pub fn normalize(source: &str) -> String {
    source
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replace("**", &POWER.to_string())
        .replace("//", &INT_DIV.to_string())
}

pub struct TokenStream<'a> {
    input: Peekable<Chars<'a>>,
    strict: bool,
}

impl<'a> TokenStream<'a> {

    /// Expects already normalized input, see [`normalize`].
    pub fn new(normalized: &'a str, strict: bool) -> TokenStream<'a> {
        TokenStream {
            input: normalized.chars().peekable(),
            strict,
        }
    }

    fn read_while<P>(&mut self, predicate: P) -> String
        where P: Fn(&char) -> bool
    {
        let mut res = String::new();
        while let Some(c) = self.input.next_if(|c| predicate(c)) {
            res.push(c);
        }
        res
    }

    fn read_number(&mut self) -> Result<Token> {
        let res = self.read_while(TokenStream::is_number_con);
        let num = res.parse::<f64>()
            .chain_err(|| ErrorKind::NumberParseError(res.clone()))?;
        Ok(Token::Number(num))
    }

    fn is_number_con(c: &char) -> bool {
        c.is_ascii_digit() || *c == '.'
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = *self.input.peek()?;

            if TokenStream::is_number_con(&ch) {
                return Some(self.read_number());
            }

            let _ = self.input.next();
            match ch {
                '(' => return Some(Ok(Token::LeftParen)),
                ')' => return Some(Ok(Token::RightParen)),
                _ => {}
            }
            if let Some(op) = Operator::from_char(ch) {
                return Some(Ok(Token::Operator(op)));
            }

            if self.strict {
                return Some(Err(ErrorKind::UnknownCharacter(ch).into()));
            }
            warn!("skipping unrecognized character {:?}", ch);
        }
    }
}

pub fn tokenize(source: &str, strict: bool) -> Result<Vec<Token>> {
    let normalized = normalize(source);
    trace!("normalized {:?} to {:?}", source, normalized);
    let tokens = TokenStream::new(&normalized, strict).collect::<Result<Vec<_>>>()?;
    debug!("tokens: {:?}", tokens);
    Ok(tokens)
}
