use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::currencies::CurrencyCatalog;
use crate::source::Source;
use crate::token::{Position, Token, TokenKind};

const TOKEN_MAX_LENGTH: usize = 50;
const STRING_MAX_LENGTH: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Unrecognized character '{character}' at {position}")]
    UnrecognizedCharacter { character: char, position: Position },
    #[error("Token exceeds {TOKEN_MAX_LENGTH} characters at {position}")]
    TokenTooLong { position: Position },
    #[error("String literal exceeds {STRING_MAX_LENGTH} characters at {position}")]
    StringTooLong { position: Position },
    #[error("Malformed number literal '{literal}' at {position}")]
    MalformedNumber { literal: String, position: Position },
    #[error("Unterminated string literal at {position}")]
    UnterminatedString { position: Position },
}

pub struct Lexer<S: Source> {
    source: S,
    current: Option<char>,
    keywords: FxHashMap<String, TokenKind>,
}

impl<S: Source> Lexer<S> {
    /// The catalog's codes become keywords alongside the static ones, each
    /// producing a `Currency` token carrying its own text.
    pub fn new(mut source: S, catalog: &CurrencyCatalog) -> Self {
        let current = source.next_char();
        Self {
            source,
            current,
            keywords: keyword_table(catalog),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let position = self.source.position();
        match self.current {
            None => Ok(Token::new(TokenKind::Eof, position)),
            Some(c) if c.is_alphabetic() => self.read_keyword_or_identifier(position),
            Some(c) if c.is_ascii_digit() => self.read_number(position),
            Some('"') => self.read_string(position),
            Some('#') => {
                self.skip_comment();
                self.next_token()
            }
            Some(c) => self.read_operator(c, position),
        }
    }

    fn read_keyword_or_identifier(&mut self, position: Position) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut length = 0;
        while let Some(c) = self.current {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            length += 1;
            if length > TOKEN_MAX_LENGTH {
                return Err(LexError::TokenTooLong { position });
            }
            text.push(c);
            self.advance();
        }
        let kind = self
            .keywords
            .get(&text)
            .cloned()
            .unwrap_or(TokenKind::Identifier(text));
        Ok(Token::new(kind, position))
    }

    fn read_number(&mut self, position: Position) -> Result<Token, LexError> {
        let mut text = String::new();
        while let Some(c) = self.current {
            if !c.is_ascii_digit() && c != '.' {
                break;
            }
            if text.len() >= TOKEN_MAX_LENGTH {
                return Err(LexError::TokenTooLong { position });
            }
            text.push(c);
            self.advance();
        }
        if text.matches('.').count() > 1 {
            return Err(LexError::MalformedNumber {
                literal: text,
                position,
            });
        }
        let value = text
            .parse::<f64>()
            .map_err(|_| LexError::MalformedNumber {
                literal: text,
                position,
            })?;
        Ok(Token::new(TokenKind::Number(value), position))
    }

    fn read_string(&mut self, position: Position) -> Result<Token, LexError> {
        self.advance(); // opening quote
        let mut text = String::new();
        let mut length = 0;
        loop {
            match self.current {
                Some('"') => {
                    self.advance();
                    return Ok(Token::new(TokenKind::String(text), position));
                }
                Some(c) => {
                    length += 1;
                    if length > STRING_MAX_LENGTH {
                        return Err(LexError::StringTooLong { position });
                    }
                    text.push(c);
                    self.advance();
                }
                None => return Err(LexError::UnterminatedString { position }),
            }
        }
    }

    fn read_operator(&mut self, first: char, position: Position) -> Result<Token, LexError> {
        let kind = match first {
            '>' => self.one_or_two('=', TokenKind::Greater, TokenKind::GreaterEqual),
            '<' => self.one_or_two('=', TokenKind::Less, TokenKind::LessEqual),
            '=' => self.one_or_two('=', TokenKind::Assign, TokenKind::Equal),
            '!' => self.one_or_two('=', TokenKind::Not, TokenKind::NotEqual),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '&' => self.single(TokenKind::And),
            '|' => self.single(TokenKind::Or),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            character => {
                return Err(LexError::UnrecognizedCharacter {
                    character,
                    position,
                });
            }
        };
        Ok(Token::new(kind, position))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Peeks one character ahead; falls back to the single-character token
    /// when the pair does not match.
    fn one_or_two(&mut self, second: char, single: TokenKind, double: TokenKind) -> TokenKind {
        self.advance();
        if self.current == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.current = self.source.next_char();
    }
}

fn keyword_table(catalog: &CurrencyCatalog) -> FxHashMap<String, TokenKind> {
    let static_keywords = [
        ("dec", TokenKind::Dec),
        ("cur", TokenKind::Cur),
        ("void", TokenKind::Void),
        ("if", TokenKind::If),
        ("while", TokenKind::While),
        ("return", TokenKind::Return),
        ("print", TokenKind::Print),
    ];
    let mut table = FxHashMap::default();
    for (keyword, kind) in static_keywords {
        table.insert(keyword.to_string(), kind);
    }
    for code in catalog.codes() {
        table.insert(code.to_string(), TokenKind::Currency(code.to_string()));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StringSource;

    fn tokenize(input: &str) -> Result<Vec<TokenKind>, LexError> {
        let catalog = CurrencyCatalog::from_codes(["eur", "pln", "usd"]);
        let mut lexer = Lexer::new(StringSource::new(input), &catalog);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            kinds.push(token.kind);
            if is_eof {
                break;
            }
        }
        Ok(kinds)
    }

    #[test]
    fn lexes_declaration_with_currency_literal() {
        let kinds = tokenize("cur a = 5 eur;").expect("tokenize should succeed");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Cur,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Assign,
                TokenKind::Number(5.0),
                TokenKind::Currency("eur".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unregistered_code_lexes_as_identifier() {
        let kinds = tokenize("doubloon").expect("tokenize should succeed");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("doubloon".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_two_character_operators_with_backtracking() {
        let kinds = tokenize(">= <= == != > < = !").expect("tokenize should succeed");
        assert_eq!(
            kinds,
            vec![
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Assign,
                TokenKind::Not,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments_to_end_of_line() {
        let kinds = tokenize("a # the rest is ignored\nb").expect("tokenize should succeed");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Identifier("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reports_token_positions() {
        let catalog = CurrencyCatalog::from_codes(["eur"]);
        let mut lexer = Lexer::new(StringSource::new("dec a;\n  b"), &catalog);
        let token = lexer.next_token().expect("first token");
        assert_eq!(token.position, Position { line: 1, column: 1 });
        let token = lexer.next_token().expect("second token");
        assert_eq!(token.position, Position { line: 1, column: 5 });
        lexer.next_token().expect("semicolon");
        let token = lexer.next_token().expect("token on next line");
        assert_eq!(token.position, Position { line: 2, column: 3 });
    }

    #[test]
    fn number_round_trips_its_value() {
        let kinds = tokenize("12.5").expect("tokenize should succeed");
        assert_eq!(kinds[0], TokenKind::Number(12.5));
    }

    #[test]
    fn errors_on_two_decimal_points() {
        let err = tokenize("1.2.3").expect_err("expected malformed number");
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn errors_on_identifier_over_fifty_characters() {
        let long = "a".repeat(51);
        let err = tokenize(&long).expect_err("expected too-long token");
        assert!(matches!(err, LexError::TokenTooLong { .. }));
        let ok = "a".repeat(50);
        assert!(tokenize(&ok).is_ok());
    }

    #[test]
    fn errors_on_number_over_fifty_characters() {
        let long = "1".repeat(51);
        let err = tokenize(&long).expect_err("expected too-long number");
        assert!(matches!(err, LexError::TokenTooLong { .. }));
        let ok = "1".repeat(50);
        assert_eq!(tokenize(&ok).expect("tokenize should succeed").len(), 2);
    }

    #[test]
    fn errors_on_string_over_thousand_characters() {
        let long = format!("\"{}\"", "x".repeat(1001));
        let err = tokenize(&long).expect_err("expected too-long string");
        assert!(matches!(err, LexError::StringTooLong { .. }));
        let ok = format!("\"{}\"", "x".repeat(1000));
        assert!(tokenize(&ok).is_ok());
    }

    #[test]
    fn errors_on_unterminated_string() {
        let err = tokenize("\"never closed").expect_err("expected unterminated string");
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn errors_on_unrecognized_character() {
        let err = tokenize("a @ b").expect_err("expected lexing failure");
        assert_eq!(
            err,
            LexError::UnrecognizedCharacter {
                character: '@',
                position: Position { line: 1, column: 3 },
            }
        );
    }
}
