use strum::{EnumIs, EnumTryAs};

use crate::syntax::TreeVisitor;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs)]
pub enum Token {
    End,
    EndOfTree,
    Word(String),
    Constant { ty: Option<String>, value: String },
}

impl Token {
    /// Sends this token to `visitor`.
    pub fn replay(&self, visitor: &mut impl TreeVisitor) {
        match self {
            Token::End => visitor.visit_end(),
            Token::EndOfTree => visitor.visit_end_of_tree(),
            Token::Word(word) => visitor.visit_word(word),
            Token::Constant { ty, value } => visitor.visit_constant(ty.as_deref(), value),
        }
    }
}

static END_OF_TREE: Token = Token::EndOfTree;

/// Records visitor events for later consumption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedVisitor {
    tokens: Vec<Token>,
    verbose: bool,
}

impl BufferedVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(verbose: bool) -> Self {
        Self {
            tokens: Vec::new(),
            verbose,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn tokenizer(&self) -> VisitTokenizer<'_> {
        VisitTokenizer::new(&self.tokens)
    }
}

impl TreeVisitor for BufferedVisitor {
    fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn visit_word(&mut self, word: &str) {
        self.tokens.push(Token::Word(word.to_string()));
    }

    fn visit_constant(&mut self, ty: Option<&str>, value: &str) {
        self.tokens.push(Token::Constant {
            ty: ty.map(str::to_string),
            value: value.to_string(),
        });
    }

    fn visit_end(&mut self) {
        self.tokens.push(Token::End);
    }

    fn visit_end_of_tree(&mut self) {
        self.tokens.push(Token::EndOfTree);
    }
}

/// Cursor over buffered tokens.
///
/// Reading past the last token yields [`Token::EndOfTree`] forever, so the
/// cursor never advances beyond the end of the stream.
#[derive(Debug, Clone)]
pub struct VisitTokenizer<'a> {
    tokens: &'a [Token],
    cursor: usize,
}

/// A saved cursor position, see [`VisitTokenizer::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

impl<'a> VisitTokenizer<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn peek(&self) -> &'a Token {
        self.tokens.get(self.cursor).unwrap_or(&END_OF_TREE)
    }

    pub fn next_token(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.is_end_of_tree() {
            self.cursor += 1;
        }
        token
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Saves the cursor. Marks are independent of each other, so nested
    /// lookaheads may each hold their own.
    pub fn mark(&self) -> Mark {
        Mark(self.cursor)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.cursor = mark.0.min(self.tokens.len());
    }

    /// Replays the whole stream to `visitor`, leaving the cursor where it was.
    pub fn replay(&mut self, visitor: &mut impl TreeVisitor) {
        let saved = self.mark();
        self.rewind();
        loop {
            let token = self.next_token();
            token.replay(visitor);
            if token.is_end_of_tree() {
                break;
            }
        }
        self.reset(saved);
    }
}
