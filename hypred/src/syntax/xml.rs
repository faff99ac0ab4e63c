//! XML syntax
//!
//! ```xml
//! <and>
//!   <is:String/>
//!   <equals>TEST</equals>
//!   <apply><length/><equals><const type="int" value="4"/></equals></apply>
//! </and>
//! ```
//!
//! Each element is a node named by its tag. An element whose only child is
//! non-blank text receives that (trimmed) text as a string argument. `const`
//! elements take their type from a `type` (or `t`) attribute and their value
//! from a `value` (or `v`) attribute or from their text.
//!
//! The reader understands the subset of XML needed for predicates: elements,
//! attributes, text, CDATA sections, comments, processing instructions,
//! doctype declarations and the predefined and numeric character entities.

use chumsky::prelude::*;

use crate::{
    syntax::TreeVisitor,
    utils::{Error, ParserError},
};

/// Maximum element nesting accepted by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'src> {
    Open {
        name: &'src str,
        attrs: Vec<(&'src str, String)>,
        empty: bool,
    },
    Close(&'src str),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'src> {
    Element(Element<'src>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element<'src> {
    name: &'src str,
    attrs: Vec<(&'src str, String)>,
    children: Vec<Node<'src>>,
    span: SimpleSpan,
}

impl Element<'_> {
    fn push_text(&mut self, text: String) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }

    fn attr(&self, short: &str, long: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| *name == short || name.eq_ignore_ascii_case(long))
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text of an element whose single child is non-blank text.
    fn sole_text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Node::Text(text)] if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let code = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn entity<'src>() -> impl Parser<'src, &'src str, char, extra::Err<Rich<'src, char>>> + Clone {
    just('&')
        .ignore_then(none_of(";&<").repeated().at_least(1).to_slice())
        .then_ignore(just(';'))
        .try_map(|name: &str, span| {
            decode_entity(name).ok_or_else(|| Rich::custom(span, format!("unknown entity `&{name};`")))
        })
        .labelled("entity")
}

fn attr_value<'src>(quote: char) -> impl Parser<'src, &'src str, String, extra::Err<Rich<'src, char>>> + Clone {
    none_of([quote, '&', '<'])
        .or(entity())
        .repeated()
        .collect::<String>()
        .delimited_by(just(quote), just(quote))
}

fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<(Piece<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let name = any()
        .filter(|c: &char| c.is_alphabetic() || matches!(c, '_' | ':'))
        .then(
            any()
                .filter(|c: &char| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'))
                .repeated(),
        )
        .to_slice()
        .labelled("element name");

    let attribute = name
        .then_ignore(just('=').padded())
        .then(attr_value('"').or(attr_value('\'')))
        .labelled("attribute");

    let open = just('<')
        .ignore_then(name)
        .then(text::whitespace().at_least(1).ignore_then(attribute).repeated().collect::<Vec<_>>())
        .then_ignore(text::whitespace())
        .then(just("/>").to(true).or(just('>').to(false)))
        .map(|((name, attrs), empty)| Piece::Open { name, attrs, empty });

    let close = just("</")
        .ignore_then(name)
        .then_ignore(text::whitespace())
        .then_ignore(just('>'))
        .map(Piece::Close);

    let comment = just("<!--")
        .then(any().and_is(just("-->").not()).repeated())
        .then(just("-->"))
        .ignored();
    let instruction = just("<?")
        .then(any().and_is(just("?>").not()).repeated())
        .then(just("?>"))
        .ignored();
    let doctype = just("<!DOCTYPE").then(none_of(">").repeated()).then(just('>')).ignored();
    let cdata = just("<![CDATA[")
        .ignore_then(any().and_is(just("]]>").not()).repeated().to_slice())
        .then_ignore(just("]]>"))
        .map(|text: &str| Piece::Text(text.to_string()));
    let text = none_of("<&")
        .or(entity())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(Piece::Text);

    choice((
        comment.to(None),
        instruction.to(None),
        doctype.to(None),
        cdata.map(Some),
        close.map(Some),
        open.map(Some),
        text.map(Some),
    ))
    .map_with(|piece, e| piece.map(|piece| (piece, e.span())))
    .repeated()
    .collect::<Vec<_>>()
    .map(|pieces| pieces.into_iter().flatten().collect())
    .then_ignore(end())
}

fn located(message: impl Into<String>, span: SimpleSpan) -> Error {
    Error::ParserErrors {
        errors: vec![ParserError::new(message, span.into_range())],
    }
}

/// Assembles the document element from the flat piece stream.
fn build(pieces: Vec<(Piece<'_>, SimpleSpan)>, max_depth: usize) -> Result<Element<'_>, Error> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    fn attach<'src>(
        stack: &mut [Element<'src>],
        root: &mut Option<Element<'src>>,
        element: Element<'src>,
    ) -> Result<(), Error> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if root.is_some() => {
                return Err(located("only one document element is allowed", element.span));
            }
            None => *root = Some(element),
        }
        Ok(())
    }

    for (piece, span) in pieces {
        match piece {
            Piece::Open { name, attrs, empty } => {
                if stack.len() >= max_depth {
                    return Err(Error::NestingTooDeep { max: max_depth });
                }
                let element = Element {
                    name,
                    attrs,
                    children: Vec::new(),
                    span,
                };
                if empty {
                    attach(&mut stack, &mut root, element)?;
                } else {
                    stack.push(element);
                }
            }
            Piece::Close(name) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| located(format!("unexpected closing tag `</{name}>`"), span))?;
                if element.name != name {
                    return Err(located(
                        format!("mismatched closing tag `</{name}>`, expected `</{}>`", element.name),
                        span,
                    ));
                }
                attach(&mut stack, &mut root, element)?;
            }
            Piece::Text(text) => match stack.last_mut() {
                Some(parent) => parent.push_text(text),
                None if text.trim().is_empty() => {}
                None => return Err(located("text outside of the document element", span)),
            },
        }
    }

    if let Some(open) = stack.pop() {
        return Err(located(format!("element `<{}>` is never closed", open.name), open.span));
    }
    root.ok_or_else(|| located("missing document element", SimpleSpan::from(0..0)))
}

/// `const` elements become a single constant event; any other element is a
/// node wrapping its children.
fn emit(element: &Element<'_>, visitor: &mut impl TreeVisitor) -> Result<(), Error> {
    if element.name == "const" {
        let ty = element.attr("t", "type");
        let value = element
            .attr("v", "value")
            .or_else(|| element.sole_text())
            .ok_or_else(|| located("invalid const: expecting a `value` attribute or text", element.span))?;
        visitor.visit_constant(ty, value);
        return Ok(());
    }

    visitor.visit_word(element.name);
    for child in &element.children {
        if let Node::Element(child) = child {
            emit(child, visitor)?;
        }
    }
    if let Some(text) = element.sole_text() {
        visitor.visit_constant(None, text);
    }
    visitor.visit_end();
    Ok(())
}

/// Reads `src` and reports its tree to `visitor`, finishing with
/// `end_of_tree`.
pub fn parse(src: &str, visitor: &mut impl TreeVisitor) -> Result<(), Error> {
    parse_with_depth(src, DEFAULT_MAX_DEPTH, visitor)
}

pub fn parse_with_depth(src: &str, max_depth: usize, visitor: &mut impl TreeVisitor) -> Result<(), Error> {
    let pieces = lexer().parse(src).into_result().map_err(|errors| Error::ParserErrors {
        errors: errors
            .into_iter()
            .map(|e| ParserError::new(e.to_string(), e.span().into_range()))
            .collect(),
    })?;
    let root = build(pieces, max_depth)?;
    emit(&root, visitor)?;
    visitor.visit_end_of_tree();
    Ok(())
}

pub(crate) fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Renders events into XML syntax. Nodes without arguments become empty
/// elements.
#[derive(Debug, Clone, Default)]
pub struct XmlPrinter {
    out: String,
    pretty: bool,
    verbose: bool,
    indent: usize,
    open: Vec<String>,
    pending: Option<String>,
}

impl XmlPrinter {
    pub fn new(pretty: bool, verbose: bool) -> Self {
        Self {
            pretty,
            verbose,
            ..Self::default()
        }
    }

    pub fn finish(mut self) -> String {
        if self.pending.take().is_some() {
            self.out.push_str("/>");
        }
        self.out
    }

    fn newline(&mut self) {
        if self.pretty {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        }
    }

    /// Closes a pending start tag now that it is known to have children.
    fn settle(&mut self) {
        if let Some(word) = self.pending.take() {
            self.out.push('>');
            self.open.push(word);
            self.indent += 1;
        }
    }
}

impl TreeVisitor for XmlPrinter {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn visit_word(&mut self, word: &str) {
        self.settle();
        self.newline();
        self.out.push('<');
        self.out.push_str(word);
        self.pending = Some(word.to_string());
    }

    fn visit_constant(&mut self, ty: Option<&str>, value: &str) {
        self.settle();
        self.newline();
        self.out.push_str("<const");
        if let Some(ty) = ty {
            self.out.push_str(" type=\"");
            self.out.push_str(&escape_attr(ty));
            self.out.push('"');
        }
        self.out.push_str(" value=\"");
        self.out.push_str(&escape_attr(value));
        self.out.push_str("\"/>");
    }

    fn visit_end(&mut self) {
        if self.pending.take().is_some() {
            self.out.push_str("/>");
            return;
        }
        if let Some(word) = self.open.pop() {
            self.indent = self.indent.saturating_sub(1);
            self.newline();
            self.out.push_str("</");
            self.out.push_str(&word);
            self.out.push('>');
        }
    }
}
