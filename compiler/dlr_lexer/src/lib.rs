//! Lexer for dlr scripts using logos.
//!
//! Comments (`#` to end of line) are dropped; newlines are kept because the
//! grammar is line oriented. The token list always ends with `Eof`.

mod escape;
mod raw_token;

use std::fmt;

use dlr_ir::{Span, Token, TokenKind};
use logos::Logos;

use crate::escape::unescape_string;
use crate::raw_token::RawToken;

/// A span of input that is not a valid token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

impl std::error::Error for LexError {}

/// Tokenize `source`.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();
        let raw = result.map_err(|()| LexError {
            span,
            message: format!("unexpected character `{slice}`"),
        })?;
        if raw == RawToken::Comment {
            continue;
        }
        let kind = convert_token(raw, slice).ok_or_else(|| LexError {
            span,
            message: format!("invalid literal `{slice}`"),
        })?;
        tokens.push(Token::new(kind, span));
    }

    let eof = Span::from_range(source.len()..source.len());
    tokens.push(Token::new(TokenKind::Eof, eof));
    Ok(tokens)
}

/// Convert a raw token to its final kind; `None` for unrepresentable literals.
fn convert_token(raw: RawToken, slice: &str) -> Option<TokenKind> {
    let kind = match raw {
        RawToken::Int => TokenKind::Int(slice.parse().ok()?),
        RawToken::Float => TokenKind::Float(slice.parse().ok()?),
        RawToken::DoubleQuoted | RawToken::SingleQuoted => {
            let body = slice.get(1..slice.len().saturating_sub(1))?;
            TokenKind::Str(unescape_string(body))
        }
        RawToken::Ident => TokenKind::Ident(slice.to_string()),
        RawToken::Const => TokenKind::Const(slice.to_string()),
        RawToken::Underscore => TokenKind::Underscore,

        RawToken::Import => TokenKind::Import,
        RawToken::If => TokenKind::If,
        RawToken::Then => TokenKind::Then,
        RawToken::Else => TokenKind::Else,
        RawToken::For => TokenKind::For,
        RawToken::In => TokenKind::In,
        RawToken::Nil => TokenKind::Nil,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,
        RawToken::And => TokenKind::AndAnd,
        RawToken::Or => TokenKind::OrOr,
        RawToken::Err => TokenKind::Err,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::DoubleColon => TokenKind::DoubleColon,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Question => TokenKind::Question,
        RawToken::Assign => TokenKind::Assign,
        RawToken::DoubleStar => TokenKind::DoubleStar,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::AndAnd => TokenKind::AndAnd,
        RawToken::OrOr => TokenKind::OrOr,

        RawToken::Newline => TokenKind::Newline,
        RawToken::Comment => return None,
    };
    Some(kind)
}
