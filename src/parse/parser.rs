use super::{cst::Cst, lexer::*};
use logos_iter::LogosIter;
use std::fmt;
use std::ops::Range;

type PResult<T> = Result<T, ParseError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("error at position {} ({slice:?}): {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        found: Option<TokenKind>,
        expected: Vec<TokenKind>,
    },
    UnexpectedString {
        expected: Vec<TokenKind>,
    },
    TrailingInput,
    InvalidToken(String),
    TooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                found: Some(found),
                expected,
            } => {
                write!(f, "unexpected token: found {}, expected ", found)?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedToken {
                found: None,
                expected,
            } => {
                write!(f, "unexpected end of input, expected ")?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedString { expected } => {
                write!(f, "expected ")?;
                fmt_expected(expected, f)
            }
            Self::TrailingInput => f.write_str("unexpected input after the end of the expression"),
            Self::InvalidToken(why) => f.write_str(why),
            Self::TooDeep => write!(
                f,
                "expression too deeply nested (at most {} levels)",
                super::MAX_DEPTH
            ),
        }
    }
}

fn fmt_expected(expected: &[TokenKind], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let len = expected.len();

    if expected.is_empty() {
        Ok(())
    } else if len == 1 {
        f.write_str(expected[0].as_str())
    } else if len == 2 {
        write!(f, "{} or {}", expected[0], expected[1])
    } else {
        for exp in &expected[..len - 1] {
            write!(f, "{}, ", exp)?;
        }
        write!(f, "or {}", expected[len - 1])
    }
}

impl ParseError {
    pub(crate) fn invalid_token(token: &Token<'_>, why: impl ToString) -> Self {
        Self {
            kind: ParseErrorKind::InvalidToken(why.to_string()),
            span: token.span.clone(),
            slice: token.slice.to_string(),
        }
    }

    pub(crate) fn too_deep(token: Option<&Token<'_>>) -> Self {
        let (span, slice) = token.map_or((0..0, String::new()), |token| {
            (token.span.clone(), token.slice.to_string())
        });
        Self {
            kind: ParseErrorKind::TooDeep,
            span,
            slice,
        }
    }
}

/// Recursive-descent parser producing a [`Cst`].
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    const ADDITION_OPS: &'static [TokenKind] = &[TokenKind::Plus, TokenKind::Minus];

    const MULTIPLICATION_OPS: &'static [TokenKind] =
        &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent];

    const UNARY_PREFIX_OPS: &'static [TokenKind] = &[TokenKind::Plus, TokenKind::Minus];

    const PRIMARY_STARTS: &'static [TokenKind] = &[
        TokenKind::Number,
        TokenKind::Dice,
        TokenKind::CustomDice,
        TokenKind::FudgeDice,
        TokenKind::LeftBrace,
        TokenKind::FunctionCall,
        TokenKind::Table,
        TokenKind::Macro,
        TokenKind::InlineOpen,
        TokenKind::RollQuery,
        TokenKind::RollReference,
        TokenKind::Formatting,
        TokenKind::Minus,
        TokenKind::LeftParen,
    ];

    pub fn new(s: &'a str) -> Self {
        Self {
            source: s,
            lexer: lexer(s),
            depth: 0,
        }
    }

    pub fn parse(mut self) -> PResult<Cst<'a>> {
        let expr = self.parse_expression()?;
        if self.lexer.peek().is_some() {
            let token = self.bump();
            return self.error_at(token, ParseErrorKind::TrailingInput);
        }
        Ok(expr)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let kind = self.lexer.next()?;
        let span = self.lexer.span();
        Some(Token::new(kind, &self.source[span.clone()], span))
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        self.lexer.peek().map_or(false, |&peeked| peeked == kind)
    }

    fn matches_any(&mut self, options: &[TokenKind]) -> bool {
        self.lexer
            .peek()
            .map_or(false, |peeked| options.contains(peeked))
    }

    fn consume(&mut self, expected: TokenKind) -> PResult<Token<'a>> {
        if self.matches(expected) {
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        self.unexpected_token(vec![expected])
    }

    fn eat_any(&mut self, options: &[TokenKind]) -> Option<Token<'a>> {
        if self.matches_any(options) {
            self.bump()
        } else {
            None
        }
    }

    fn error_at<T>(&self, token: Option<Token<'a>>, kind: ParseErrorKind) -> PResult<T> {
        let (span, slice) = match token {
            Some(token) => (token.span, token.slice.to_string()),
            None => (self.source.len()..self.source.len(), String::new()),
        };
        Err(ParseError { kind, span, slice })
    }

    fn unexpected_token<T>(&mut self, expected: Vec<TokenKind>) -> PResult<T> {
        let found = self.bump();
        match found.as_ref().map(|t| t.kind) {
            Some(TokenKind::Error) => {
                self.error_at(found, ParseErrorKind::UnexpectedString { expected })
            }
            kind => self.error_at(
                found,
                ParseErrorKind::UnexpectedToken {
                    found: kind,
                    expected,
                },
            ),
        }
    }

    /// Runs `parse` one level deeper, failing past [`MAX_DEPTH`](super::MAX_DEPTH).
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= super::MAX_DEPTH {
            let token = self.bump();
            return Err(ParseError::too_deep(token.as_ref()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_expression(&mut self) -> PResult<Cst<'a>> {
        self.nested(Self::parse_additive)
    }

    fn parse_additive(&mut self) -> PResult<Cst<'a>> {
        let lhs = self.parse_exponential()?;
        let mut rest = Vec::new();

        while let Some(op) = self.eat_any(Self::ADDITION_OPS) {
            rest.push((op, self.nested(Self::parse_exponential)?));
        }

        Ok(if rest.is_empty() {
            lhs
        } else {
            Cst::Additive(Box::new(lhs), rest)
        })
    }

    fn parse_exponential(&mut self) -> PResult<Cst<'a>> {
        let lhs = self.parse_multiplicative()?;
        let mut rest = Vec::new();

        while let Some(op) = self.eat_any(&[TokenKind::StarStar]) {
            rest.push((op, self.parse_exponential()?));
        }

        Ok(if rest.is_empty() {
            lhs
        } else {
            Cst::Exponential(Box::new(lhs), rest)
        })
    }

    fn parse_multiplicative(&mut self) -> PResult<Cst<'a>> {
        let lhs = self.parse_primary()?;
        let mut rest = Vec::new();

        while let Some(op) = self.eat_any(Self::MULTIPLICATION_OPS) {
            rest.push((op, self.parse_primary()?));
        }

        Ok(if rest.is_empty() {
            lhs
        } else {
            Cst::Multiplicative(Box::new(lhs), rest)
        })
    }

    fn parse_primary(&mut self) -> PResult<Cst<'a>> {
        let kind = match self.lexer.peek() {
            Some(&kind) => kind,
            None => return self.unexpected_token(Self::PRIMARY_STARTS.to_vec()),
        };

        match kind {
            TokenKind::FunctionCall => self.parse_function_call(),
            TokenKind::LeftBrace => self.parse_group(),
            TokenKind::CustomDice => {
                let dice = self.consume(kind)?;
                let modifiers = self.parse_modifiers();
                Ok(Cst::CustomDice { dice, modifiers })
            }
            TokenKind::Dice => self.parse_dice(),
            TokenKind::FudgeDice => {
                let dice = self.consume(kind)?;
                let modifiers = self.parse_modifiers();
                Ok(Cst::FudgeDice { dice, modifiers })
            }
            TokenKind::Table => Ok(Cst::Table(self.consume(kind)?)),
            TokenKind::Number => Ok(Cst::Number(self.consume(kind)?)),
            TokenKind::Macro => Ok(Cst::Macro(self.consume(kind)?)),
            TokenKind::InlineOpen => self.parse_inline_roll(),
            TokenKind::RollQuery => Ok(Cst::RollQuery(self.consume(kind)?)),
            TokenKind::RollReference => Ok(Cst::RollReference(self.consume(kind)?)),
            TokenKind::Formatting => Ok(Cst::Formatting(self.consume(kind)?)),
            _ if Self::UNARY_PREFIX_OPS.contains(&kind) => {
                let op = self.consume(kind)?;
                let rhs = self.nested(Self::parse_primary)?;
                Ok(Cst::Prefix(op, Box::new(rhs)))
            }
            TokenKind::LeftParen => {
                self.consume(kind)?;
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                Ok(Cst::Parenthesized(Box::new(inner)))
            }
            _ => self.unexpected_token(Self::PRIMARY_STARTS.to_vec()),
        }
    }

    fn parse_modifiers(&mut self) -> Vec<Token<'a>> {
        let mut modifiers = Vec::new();
        while self.matches_any(TokenKind::MODIFIERS) {
            modifiers.extend(self.bump());
        }
        modifiers
    }

    fn parse_dice(&mut self) -> PResult<Cst<'a>> {
        let dice = self.consume(TokenKind::Dice)?;
        let modifiers = self.parse_modifiers();

        let mut label = None;
        let mut bracketed = Vec::new();
        if self.matches(TokenKind::Label) {
            label = self.bump();
        } else if self.matches(TokenKind::LeftBracket) {
            self.consume(TokenKind::LeftBracket)?;
            while !self.matches(TokenKind::RightBracket) {
                match self.bump() {
                    Some(token) => bracketed.push(token),
                    None => return self.unexpected_token(vec![TokenKind::RightBracket]),
                }
            }
            self.consume(TokenKind::RightBracket)?;
        }

        Ok(Cst::Dice {
            dice,
            modifiers,
            label,
            bracketed,
        })
    }

    fn parse_group(&mut self) -> PResult<Cst<'a>> {
        self.consume(TokenKind::LeftBrace)?;
        let mut items = vec![self.parse_expression()?];
        while self.matches(TokenKind::Comma) {
            self.consume(TokenKind::Comma)?;
            items.push(self.parse_expression()?);
        }
        self.consume(TokenKind::RightBrace)?;

        let modifiers = self.parse_modifiers();
        Ok(Cst::Group { items, modifiers })
    }

    fn parse_function_call(&mut self) -> PResult<Cst<'a>> {
        let name = self.consume(TokenKind::FunctionCall)?;
        let mut args = Vec::new();
        if !self.matches(TokenKind::RightParen) {
            args.push(self.parse_expression()?);
            while self.matches(TokenKind::Comma) {
                self.consume(TokenKind::Comma)?;
                args.push(self.parse_expression()?);
            }
        }
        self.consume(TokenKind::RightParen)?;
        Ok(Cst::Function { name, args })
    }

    fn parse_inline_roll(&mut self) -> PResult<Cst<'a>> {
        let open = self.consume(TokenKind::InlineOpen)?;
        let body = self.parse_expression()?;
        let close = self.consume(TokenKind::InlineClose)?;
        let text = self.source[open.span.end..close.span.start].trim();
        Ok(Cst::InlineRoll {
            text,
            body: Box::new(body),
        })
    }
}
