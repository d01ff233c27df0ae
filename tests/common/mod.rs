//! Shared fixtures: a lexer for the toy surface syntax and span helpers.

#![allow(dead_code)]

use restitch::{Span, Token, TokenKind, TokenStream};

/// Tokenize the toy surface syntax used by the integration suites:
/// identifiers, numbers, `if`/`then`/`else`/`not`/`return` keywords,
/// `and`/`or`/`**`/`=`/`?`/`:` operators, parentheses, separators, and
/// newlines. Spaces and tabs are skipped.
pub fn lex(source: &str) -> TokenStream {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '\n' => {
                tokens.push(Token::new(TokenKind::Newline, i, i + 1));
                i += 1;
            }
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, i, i + 1));
                i += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, i, i + 1));
                i += 1;
            }
            ';' => {
                tokens.push(Token::new(TokenKind::Semicolon, i, i + 1));
                i += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenKind::Comma, i, i + 1));
                i += 1;
            }
            '*' if bytes.get(i + 1) == Some(&b'*') => {
                tokens.push(Token::new(TokenKind::Operator, i, i + 2));
                i += 2;
            }
            '=' | '?' | ':' | '+' | '-' => {
                tokens.push(Token::new(TokenKind::Operator, i, i + 1));
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                    i += 1;
                }
                tokens.push(Token::new(TokenKind::Number, start, i));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let kind = match &source[start..i] {
                    "if" | "then" | "else" | "not" | "return" => TokenKind::Keyword,
                    "and" | "or" => TokenKind::Operator,
                    _ => TokenKind::Identifier,
                };
                tokens.push(Token::new(kind, start, i));
            }
            other => panic!("unsupported character {other:?} at offset {i}"),
        }
    }
    TokenStream::from_tokens(tokens).expect("lexer emitted an unordered stream")
}

/// Byte span of the first occurrence of `needle` in `source`.
pub fn span_of(source: &str, needle: &str) -> Span {
    let start = source.find(needle).expect("needle not found in source");
    Span::new(start, start + needle.len())
}
