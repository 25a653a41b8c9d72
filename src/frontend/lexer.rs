//! Lexer for Axenlang
//!
//! Converts source text into a stream of tokens. The lexer never fails:
//! malformed input produces an `Invalid` token and a collected diagnostic,
//! and lexing continues.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Lex errors found so far
    diagnostics: Vec<Error>,
    /// Whether the Eof token has been produced (ends iteration)
    finished: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Take the lex errors collected so far
    pub fn take_diagnostics(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                // Whitespace
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment. Does NOT nest: the first */ closes it.
                '/' if self.peek_next() == Some('*') => {
                    let comment_start = self.pos;
                    self.advance(); // skip /
                    self.advance(); // skip *
                    let mut closed = false;
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_next() == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        self.diagnostics.push(Error::UnterminatedComment {
                            span: Span::new(comment_start, self.pos),
                        });
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword. Identifiers are `[A-Za-z][A-Za-z0-9]*`;
    /// underscores are not part of the language.
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));

        self.make_token(kind)
    }

    /// Read a number literal: hex, decimal, or float, each with an optional
    /// trailing `u`. Longest match wins, so a decimal immediately followed by
    /// `.` and a digit is a float.
    fn read_number(&mut self) -> Token {
        // Hex literal: 0x must be followed by at least one hex digit,
        // otherwise the 0 is a decimal and the x starts an identifier.
        if self.peek() == Some('0')
            && matches!(self.peek_next(), Some('x') | Some('X'))
            && self
                .source
                .get(self.pos + 2)
                .is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance(); // 0
            self.advance(); // x

            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    self.advance();
                } else {
                    break;
                }
            }

            let text: String = self.source[self.start + 2..self.pos].iter().collect();
            let value = u64::from_str_radix(&text, 16).unwrap_or(u64::MAX);
            let unsigned = self.consume_unsigned_suffix();
            return self.make_token(TokenKind::IntLit { value, unsigned });
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // A `.` followed by a digit turns this into a float; a bare `.` is
        // left for the next token.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }

            let text: String = self.source[self.start..self.pos].iter().collect();
            let value = text.parse().unwrap_or(0.0);
            let unsigned = self.consume_unsigned_suffix();
            return self.make_token(TokenKind::FloatLit { value, unsigned });
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let value = text.parse().unwrap_or(u64::MAX);
        let unsigned = self.consume_unsigned_suffix();
        self.make_token(TokenKind::IntLit { value, unsigned })
    }

    fn consume_unsigned_suffix(&mut self) -> bool {
        if self.peek() == Some('u') {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Read a string literal. A backslash consumes exactly the following
    /// character; the raw text between the quotes is kept verbatim, escape
    /// decoding is a later concern. Only end of input unterminates a string.
    fn read_string(&mut self) -> Token {
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance(); // consume closing quote
                    return self.make_token(TokenKind::StringLit(value));
                }
                Some('\\') => {
                    value.push('\\');
                    self.advance();
                    if let Some(c) = self.advance() {
                        value.push(c);
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    self.diagnostics.push(Error::UnterminatedString {
                        span: self.make_span(),
                    });
                    return self.make_token(TokenKind::Invalid);
                }
            }
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;

        if self.is_at_end() {
            self.finished = true;
            return Token::eof(self.make_span());
        }

        let c = self.peek().unwrap();

        if c.is_ascii_alphabetic() {
            return self.read_identifier();
        }

        if c.is_ascii_digit() {
            return self.read_number();
        }

        if c == '"' {
            return self.read_string();
        }

        self.advance();
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '$' => TokenKind::Dollar,
            '&' => TokenKind::Amp,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            _ => {
                self.diagnostics.push(Error::InvalidChar {
                    ch: c,
                    span: self.make_span(),
                });
                TokenKind::Invalid
            }
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens, ending with Eof
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            None
        } else {
            Some(self.next_token())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let toks = kinds("int main() { }");
        assert_eq!(
            toks,
            vec![
                TokenKind::Int,
                TokenKind::Ident("main".to_string()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        let toks = kinds("void uchar quad intdef nullptr ptr");
        assert_eq!(
            toks,
            vec![
                TokenKind::Void,
                TokenKind::Uchar,
                TokenKind::Quad,
                TokenKind::Intdef,
                TokenKind::Nullptr,
                // ptr stays an identifier; the parser gives it meaning
                TokenKind::Ident("ptr".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let toks = kinds("42 42u 0xFF 0x10u 3.14 2.5u");
        assert_eq!(
            toks,
            vec![
                TokenKind::IntLit { value: 42, unsigned: false },
                TokenKind::IntLit { value: 42, unsigned: true },
                TokenKind::IntLit { value: 0xFF, unsigned: false },
                TokenKind::IntLit { value: 0x10, unsigned: true },
                TokenKind::FloatLit { value: 3.14, unsigned: false },
                TokenKind::FloatLit { value: 2.5, unsigned: true },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_longest_match() {
        // `1.` is an int then a dot; `1.5` is one float token
        let toks = kinds("1. 1.5");
        assert_eq!(
            toks,
            vec![
                TokenKind::IntLit { value: 1, unsigned: false },
                TokenKind::Dot,
                TokenKind::FloatLit { value: 1.5, unsigned: false },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hex_requires_digits() {
        // `0x` with no hex digit is the decimal 0 then identifier x
        let toks = kinds("0x");
        assert_eq!(
            toks,
            vec![
                TokenKind::IntLit { value: 0, unsigned: false },
                TokenKind::Ident("x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_keeps_escapes_raw() {
        let mut lexer = Lexer::new(r#""a\nb\"c""#);
        let toks = lexer.tokenize();
        assert_eq!(
            toks[0].kind,
            TokenKind::StringLit(r#"a\nb\"c"#.to_string())
        );
        assert!(lexer.take_diagnostics().is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"abc");
        let toks = lexer.tokenize();
        assert_eq!(toks[0].kind, TokenKind::Invalid);
        let diags = lexer.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], Error::UnterminatedString { .. }));
    }

    #[test]
    fn test_line_comment() {
        let toks = kinds("1 // comment 2\n3");
        assert_eq!(
            toks,
            vec![
                TokenKind::IntLit { value: 1, unsigned: false },
                TokenKind::IntLit { value: 3, unsigned: false },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        // The first */ closes the comment; the rest lexes as code tokens.
        let toks = kinds("/* outer /* inner */ still comment */");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("still".to_string()),
                TokenKind::Ident("comment".to_string()),
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("1 /* never closed");
        let toks = lexer.tokenize();
        assert_eq!(
            toks.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![TokenKind::IntLit { value: 1, unsigned: false }, TokenKind::Eof]
        );
        let diags = lexer.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], Error::UnterminatedComment { .. }));
    }

    #[test]
    fn test_underscore_is_invalid() {
        let mut lexer = Lexer::new("foo_bar");
        let toks = lexer.tokenize();
        assert_eq!(
            toks.into_iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Ident("foo".to_string()),
                TokenKind::Invalid,
                TokenKind::Ident("bar".to_string()),
                TokenKind::Eof,
            ]
        );
        let diags = lexer.take_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags[0], Error::InvalidChar { ch: '_', .. }));
    }

    #[test]
    fn test_invalid_char() {
        let mut lexer = Lexer::new("a @ b");
        let toks = lexer.tokenize();
        assert_eq!(toks[1].kind, TokenKind::Invalid);
        assert!(matches!(
            lexer.take_diagnostics()[0],
            Error::InvalidChar { ch: '@', .. }
        ));
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("ab cd");
        let toks = lexer.tokenize();
        assert_eq!(toks[0].span, Span::new(0, 2));
        assert_eq!(toks[1].span, Span::new(3, 5));
    }

    #[test]
    fn test_lazy_iteration() {
        let lexer = Lexer::new("a b");
        let toks: Vec<Token> = lexer.collect();
        assert_eq!(toks.len(), 3); // a, b, Eof
        assert_eq!(toks[2].kind, TokenKind::Eof);
    }
}
