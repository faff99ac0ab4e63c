//! Paren syntax
//!
//! ```text
//! (and is:String (equals "TEST"))
//! (apply (length) (equals (const "int" "4")))   // comments are allowed
//! ```
//!
//! - A word starts with a letter, `_` or `:` and continues with letters,
//!   digits, `.`, `-`, `_` or `:`.
//! - Strings are delimited by `"` or `'` and support `\"`, `\'`, `\\`, `\n`,
//!   `\t` and `\r` escapes.
//! - Bare numbers are rejected; typed literals go through `const`.
//! - `/* block */` and `// line` comments are skipped.
//! - Missing closing parentheses are implied at end of input, and an
//!   unbalanced `)` stops reading.

use std::fmt::Write as _;

use chumsky::prelude::*;

use crate::{
    syntax::TreeVisitor,
    utils::{Error, ParserError},
};

pub type Spanned<T> = (T, SimpleSpan);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Lexeme<'src> {
    Open,
    Close,
    Word(&'src str),
    Quoted(String),
    Number(&'src str),
}

fn is_word_char(c: &char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')
}

fn quoted<'src>(quote: char) -> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    let escape = just('\\')
        .ignore_then(choice((
            just('\\'),
            just('"'),
            just('\''),
            just('n').to('\n'),
            just('t').to('\t'),
            just('r').to('\r'),
        )))
        .labelled("escape sequence");

    none_of([quote, '\\'])
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just(quote), just(quote))
        .labelled("string")
}

fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Spanned<Lexeme<'src>>>, extra::Err<Rich<'src, char>>> {
    let word = any()
        .filter(|c: &char| c.is_alphabetic() || matches!(c, '_' | ':'))
        .then(any().filter(is_word_char).repeated())
        .to_slice()
        .map(Lexeme::Word)
        .labelled("word");

    let number = any()
        .filter(|c: &char| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
        .then(any().filter(is_word_char).repeated())
        .to_slice()
        .map(Lexeme::Number);

    let token = choice((
        just('(').to(Lexeme::Open),
        just(')').to(Lexeme::Close),
        quoted('"').map(Lexeme::Quoted),
        quoted('\'').map(Lexeme::Quoted),
        word,
        number,
    ));

    let line_comment = just("//").then(any().and_is(just('\n').not()).repeated()).ignored();
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();
    let trivia = choice((
        any().filter(|c: &char| c.is_whitespace()).repeated().at_least(1).ignored(),
        line_comment,
        block_comment,
    ))
    .repeated();

    trivia
        .clone()
        .ignore_then(
            token
                .map_with(|tok, e| (tok, e.span()))
                .then_ignore(trivia)
                .repeated()
                .collect(),
        )
        .then_ignore(end())
}

fn rich_to_error(errors: Vec<Rich<'_, char>>) -> Error {
    Error::ParserErrors {
        errors: errors
            .into_iter()
            .map(|e| ParserError::new(e.to_string(), e.span().into_range()))
            .collect(),
    }
}

fn located(message: impl Into<String>, span: SimpleSpan) -> Error {
    Error::ParserErrors {
        errors: vec![ParserError::new(message, span.into_range())],
    }
}

/// Reads `src` and reports its tree to `visitor`, finishing with
/// `end_of_tree`.
pub fn parse(src: &str, visitor: &mut impl TreeVisitor) -> Result<(), Error> {
    let lexemes = lexer().parse(src).into_result().map_err(rich_to_error)?;

    let mut depth = 0usize;
    let mut lexemes = lexemes.into_iter();
    while let Some((lexeme, span)) = lexemes.next() {
        match lexeme {
            Lexeme::Close => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                visitor.visit_end();
            }
            Lexeme::Word(word) => {
                visitor.visit_word(word);
                visitor.visit_end();
            }
            Lexeme::Quoted(value) => visitor.visit_constant(None, &value),
            Lexeme::Number(number) => {
                return Err(located(
                    format!(
                        "bare number `{number}` is not supported, use a typed constant such as (const \"double\" \"{number}\")"
                    ),
                    span,
                ));
            }
            Lexeme::Open => match lexemes.next() {
                Some((Lexeme::Word(word), _)) => {
                    depth += 1;
                    visitor.visit_word(word);
                }
                Some((Lexeme::Quoted(value), _)) => {
                    visitor.visit_constant(None, &value);
                    match lexemes.next() {
                        Some((Lexeme::Close, _)) | None => {}
                        Some((_, span)) => {
                            return Err(located("expecting a string to be followed by `)`", span));
                        }
                    }
                }
                Some((_, span)) => return Err(located("expecting a word or a string after `(`", span)),
                None => return Err(located("unexpected end of input after `(`", span)),
            },
        }
    }

    for _ in 0..depth {
        visitor.visit_end();
    }
    visitor.visit_end_of_tree();
    Ok(())
}

pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Renders events back into paren syntax.
#[derive(Debug, Clone, Default)]
pub struct ParenPrinter {
    out: String,
    pretty: bool,
    verbose: bool,
    indent: usize,
}

impl ParenPrinter {
    pub fn new(pretty: bool, verbose: bool) -> Self {
        Self {
            pretty,
            verbose,
            ..Self::default()
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn newline(&mut self) {
        if self.out.is_empty() {
            return;
        }
        if self.pretty {
            self.out.push('\n');
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        } else {
            self.out.push(' ');
        }
    }
}

impl TreeVisitor for ParenPrinter {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn visit_word(&mut self, word: &str) {
        self.newline();
        self.indent += 1;
        self.out.push('(');
        self.out.push_str(word);
    }

    fn visit_constant(&mut self, ty: Option<&str>, value: &str) {
        self.newline();
        let _ = match ty {
            None => write!(self.out, "\"{}\"", escape(value)),
            Some(ty) => write!(self.out, "(const \"{}\" \"{}\")", escape(ty), escape(value)),
        };
    }

    fn visit_end(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{BufferedVisitor, Token};

    fn tokens(src: &str) -> Vec<Token> {
        let mut buffer = BufferedVisitor::new();
        parse(src, &mut buffer).unwrap();
        buffer.into_tokens()
    }

    fn word(w: &str) -> Token {
        Token::Word(w.to_string())
    }

    fn string(v: &str) -> Token {
        Token::Constant {
            ty: None,
            value: v.to_string(),
        }
    }

    #[test]
    fn nested_words_and_strings() {
        assert_eq!(
            tokens("(and is:String (equals \"TEST\"))"),
            vec![
                word("and"),
                word("is:String"),
                Token::End,
                word("equals"),
                string("TEST"),
                Token::End,
                Token::End,
                Token::EndOfTree,
            ]
        );
    }

    #[test]
    fn missing_parentheses_are_implied() {
        assert_eq!(
            tokens("(not (isEmpty"),
            vec![word("not"), word("isEmpty"), Token::End, Token::End, Token::EndOfTree]
        );
    }

    #[test]
    fn unbalanced_close_stops_reading() {
        assert_eq!(tokens("(true)) (false)"), vec![word("true"), Token::End, Token::EndOfTree]);
    }

    #[test]
    fn comments_and_escapes() {
        let src = "/* header */ (equals // trailing\n \"a \\\"quoted\\\" \\\\ value\")";
        assert_eq!(
            tokens(src),
            vec![word("equals"), string("a \"quoted\" \\ value"), Token::End, Token::EndOfTree]
        );
    }

    #[test]
    fn parenthesized_string() {
        assert_eq!(tokens("(\"x\")"), vec![string("x"), Token::EndOfTree]);
        assert!(parse("(\"x\" \"y\")", &mut BufferedVisitor::new()).is_err());
    }

    #[test]
    fn numbers_are_rejected() {
        let err = parse("(equals 1.0)", &mut BufferedVisitor::new()).unwrap_err();
        let Error::ParserErrors { errors } = &err else {
            panic!("unexpected error {err:?}");
        };
        assert!(errors[0].message.contains("const"));
        assert_eq!(errors[0].start, 8);
    }

    #[test]
    fn invalid_characters_are_rejected() {
        assert!(parse("(and # is:String)", &mut BufferedVisitor::new()).is_err());
        assert!(parse("(equals \"open", &mut BufferedVisitor::new()).is_err());
    }

    #[test]
    fn escape_round_trips() {
        let value = "tab\tquote\"slash\\";
        let src = format!("\"{}\"", escape(value));
        assert_eq!(tokens(&src), vec![string(value), Token::EndOfTree]);
    }
}
