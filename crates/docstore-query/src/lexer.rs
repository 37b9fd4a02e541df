//! Query lexer.
//!
//! A [`Cursor`] walks the characters of the input; a table of [`Rule`]s maps
//! the leading character to a token producer. New token kinds are added as
//! new rules without touching the cursor or the callers.
//!
//! Lexing is fail-fast: the first character no rule accepts aborts with an
//! error naming that character and the whole input.

use std::fmt;

use docstore_common::error::{StoreError, StoreResult};

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of one or more space characters.
    Space,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Space => write!(f, "SPACE"),
        }
    }
}

/// A lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Source text covered by the token.
    pub text: String,
}

impl Token {
    /// Creates a token.
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Position over the characters of a query. Only moves forward.
#[derive(Debug, Clone)]
pub struct Cursor {
    characters: Vec<char>,
    index: usize,
}

impl Cursor {
    /// Creates a cursor at the start of `input`.
    pub fn new(input: &str) -> Self {
        Self {
            characters: input.chars().collect(),
            index: 0,
        }
    }

    /// Returns the current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.characters.get(self.index).copied()
    }

    /// Consumes and returns the current character.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        Some(c)
    }

    /// Consumes characters while `pred` holds and returns them.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.index;
        while self.peek().is_some_and(&pred) {
            self.index += 1;
        }
        self.characters[start..self.index].iter().collect()
    }

    /// Returns the current index.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Returns true once every character has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.index >= self.characters.len()
    }
}

/// A token-producer rule keyed by the leading character.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Returns true if this rule handles a token starting with the character.
    pub starts: fn(char) -> bool,
    /// Consumes one token from the cursor. Must consume at least one
    /// character.
    pub produce: fn(&mut Cursor) -> Token,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").finish_non_exhaustive()
    }
}

fn is_space(c: char) -> bool {
    c == ' '
}

fn lex_space(cursor: &mut Cursor) -> Token {
    Token::new(TokenKind::Space, cursor.eat_while(is_space))
}

/// The built-in rule table.
pub const DEFAULT_RULES: &[Rule] = &[Rule {
    starts: is_space,
    produce: lex_space,
}];

/// Lexer over a single query string.
#[derive(Debug)]
pub struct Lexer<'r> {
    input: String,
    cursor: Cursor,
    rules: &'r [Rule],
}

impl Lexer<'static> {
    /// Creates a lexer using [`DEFAULT_RULES`].
    pub fn new(input: &str) -> Self {
        Self::with_rules(input, DEFAULT_RULES)
    }
}

impl<'r> Lexer<'r> {
    /// Creates a lexer with a custom rule table.
    pub fn with_rules(input: &str, rules: &'r [Rule]) -> Self {
        Self {
            input: input.to_string(),
            cursor: Cursor::new(input),
            rules,
        }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> StoreResult<Option<Token>> {
        let Some(c) = self.cursor.peek() else {
            return Ok(None);
        };

        match self.rules.iter().find(|rule| (rule.starts)(c)) {
            Some(rule) => {
                let before = self.cursor.position();
                let token = (rule.produce)(&mut self.cursor);
                if self.cursor.position() == before {
                    // producers must make progress
                    self.cursor.bump();
                }
                Ok(Some(token))
            }
            None => Err(StoreError::Lexical {
                character: c,
                input: self.input.clone(),
            }),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = StoreResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Lexes the whole input with the default rules.
pub fn tokenize(input: &str) -> StoreResult<Vec<Token>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_token() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap(), None);
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn test_space_run_is_one_token() {
        for k in [1, 2, 7, 40] {
            let input = " ".repeat(k);
            let tokens = tokenize(&input).unwrap();
            assert_eq!(tokens.len(), 1);
            assert_eq!(tokens[0].kind, TokenKind::Space);
            assert_eq!(tokens[0].text.len(), k);
        }
    }

    #[test]
    fn test_unknown_character_fails_with_input() {
        let err = tokenize("  x ").unwrap_err();
        assert_eq!(
            err,
            StoreError::Lexical {
                character: 'x',
                input: "  x ".to_string(),
            }
        );
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("  x "));
    }

    #[test]
    fn test_space_then_error_is_fail_fast() {
        let mut lexer = Lexer::new("   =");
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.text, "   ");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_custom_rule_extends_grammar() {
        fn is_eq(c: char) -> bool {
            c == '='
        }
        fn lex_eq(cursor: &mut Cursor) -> Token {
            cursor.bump();
            Token::new(TokenKind::Space, "=")
        }

        let rules = [
            DEFAULT_RULES[0],
            Rule {
                starts: is_eq,
                produce: lex_eq,
            },
        ];
        let tokens: Vec<Token> = Lexer::with_rules(" = ", &rules)
            .collect::<StoreResult<_>>()
            .unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec![" ", "=", " "]);
    }
}
