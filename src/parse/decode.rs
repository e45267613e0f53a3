//! Decoding of the raw text carried by compound tokens.

use super::lexer::{Token, TokenKind};
use super::parser::ParseError;
use crate::common::*;
use crate::modifier::*;
use std::str::FromStr;

type DResult<T> = Result<T, ParseError>;

fn number<T: FromStr>(token: &Token<'_>, s: &str) -> DResult<T> {
    s.parse()
        .map_err(|_| ParseError::invalid_token(token, format!("invalid number {:?}", s)))
}

/// `[cmp]N`, where a missing comparator means equality.
fn condition(token: &Token<'_>, s: &str) -> DResult<(Comparator, Float)> {
    let (cmp, rest) = Comparator::from_prefix(s).unwrap_or((Comparator::Eq, s));
    Ok((cmp, number(token, rest)?))
}

fn extreme(token: &Token<'_>, c: u8) -> DResult<Extreme> {
    match c {
        b'h' => Ok(Extreme::Highest),
        b'l' => Ok(Extreme::Lowest),
        _ => Err(ParseError::invalid_token(token, "expected 'h' or 'l'")),
    }
}

pub fn decode_modifier(token: &Token<'_>) -> DResult<Modifier> {
    let s = token.slice;
    let modifier = match token.kind {
        TokenKind::ModKeep => {
            let rest = &s[1..];
            let keep = match rest.as_bytes().first() {
                Some(&c @ (b'h' | b'l')) => Keep {
                    end: extreme(token, c)?,
                    count: number(token, &rest[1..])?,
                },
                _ => Keep {
                    end: Extreme::Highest,
                    count: number(token, rest)?,
                },
            };
            keep.into()
        }
        TokenKind::ModDrop => Drop {
            end: extreme(token, s.as_bytes()[1])?,
            count: number(token, &s[2..])?,
        }
        .into(),
        TokenKind::ModKeepFilter => {
            let (cmp, target) = condition(token, &s[1..])?;
            KeepFilter { cmp, target }.into()
        }
        TokenKind::ModRerollOnce => {
            let (cmp, target) = condition(token, &s[2..])?;
            RerollOnce { cmp, target }.into()
        }
        TokenKind::ModReroll => {
            let (cmp, target) = condition(token, &s[1..])?;
            Reroll { cmp, target }.into()
        }
        TokenKind::ModExplode => decode_explode(token)?.into(),
        TokenKind::ModClamp => {
            let value = number(token, &s[2..])?;
            if s.starts_with("mi") {
                Minimum(value).into()
            } else {
                Maximum(value).into()
            }
        }
        TokenKind::ModCompare => {
            let (cmp, target) = condition(token, s)?;
            Success {
                kind: SuccessKind::Compare,
                cmp,
                target,
            }
            .into()
        }
        TokenKind::ModSuccess => {
            let (kind, rest) = [
                ("cs", SuccessKind::CriticalSuccess),
                ("cf", SuccessKind::CriticalFailure),
                ("s", SuccessKind::Success),
                ("f", SuccessKind::Failure),
            ]
            .into_iter()
            .find_map(|(prefix, kind)| s.strip_prefix(prefix).map(|rest| (kind, rest)))
            .ok_or_else(|| ParseError::invalid_token(token, "unknown success modifier"))?;
            let (cmp, target) = condition(token, rest)?;
            Success { kind, cmp, target }.into()
        }
        TokenKind::ModSort => Sort {
            descending: s == "sd",
        }
        .into(),
        TokenKind::ModMatch => Match.into(),
        TokenKind::ModRollOnce => RollOnce.into(),
        TokenKind::ModExhaustive => Exhaustive.into(),
        _ => return Err(ParseError::invalid_token(token, "not a modifier")),
    };
    Ok(modifier)
}

/// `!`, `!!` or `!p`, an optional condition and an optional `lN` chain limit.
fn decode_explode(token: &Token<'_>) -> DResult<Explode> {
    let s = &token.slice[1..];
    let (mut kind, s) = if let Some(rest) = s.strip_prefix('!') {
        (ExplodeKind::Compound, rest)
    } else if let Some(rest) = s.strip_prefix('p') {
        (ExplodeKind::Penetrating, rest)
    } else {
        (ExplodeKind::Basic, s)
    };

    let (s, limit) = match s.split_once('l') {
        Some((s, limit)) => (s, Some(number(token, limit)?)),
        None => (s, None),
    };

    let condition = if s.is_empty() {
        None
    } else {
        if kind == ExplodeKind::Basic {
            kind = ExplodeKind::Recursive;
        }
        Some(condition(token, s)?)
    };

    Ok(Explode {
        kind,
        condition,
        limit,
    })
}

/// `NdS`, `Nd%`, with `N` defaulting to 1. Values are checked during evaluation.
pub fn decode_dice(token: &Token<'_>) -> DResult<(Int, Int)> {
    let (count, sides) = token
        .slice
        .split_once('d')
        .ok_or_else(|| ParseError::invalid_token(token, "expected dice"))?;
    let count = decode_count(token, count)?;
    let sides = if sides == "%" {
        100
    } else {
        number(token, sides)?
    };
    Ok((count, sides))
}

fn decode_count(token: &Token<'_>, s: &str) -> DResult<Int> {
    if s.is_empty() {
        Ok(1)
    } else {
        number(token, s)
    }
}

/// `Nd{a,b,...}`.
pub fn decode_custom_dice(token: &Token<'_>) -> DResult<(Int, Vec<Float>)> {
    let (count, rest) = token
        .slice
        .split_once("d{")
        .ok_or_else(|| ParseError::invalid_token(token, "expected custom dice"))?;
    let count = decode_count(token, count)?;
    let body = rest.strip_suffix('}').unwrap_or(rest);

    let mut sides = Vec::new();
    for side in body.split(',').map(str::trim).filter(|side| !side.is_empty()) {
        let value = side.parse().map_err(|_| {
            ParseError::invalid_token(token, format!("custom die side {:?} is not a number", side))
        })?;
        sides.push(value);
    }
    Ok((count, sides))
}

/// `NdF` or `NdF.1` through `NdF.3`.
pub fn decode_fudge_dice(token: &Token<'_>) -> DResult<(Int, FudgeVariant)> {
    let (count, variant) = token
        .slice
        .split_once("dF")
        .ok_or_else(|| ParseError::invalid_token(token, "expected fudge dice"))?;
    let count = decode_count(token, count)?;
    let variant = match variant {
        "" => FudgeVariant::Basic,
        ".1" => FudgeVariant::One,
        ".2" => FudgeVariant::Two,
        ".3" => FudgeVariant::Three,
        other => {
            return Err(ParseError::invalid_token(
                token,
                format!("invalid fudge variant {:?}", other),
            ))
        }
    };
    Ok((count, variant))
}

/// `Nt[name]`.
pub fn decode_table(token: &Token<'_>) -> DResult<(Int, String)> {
    let (count, rest) = token
        .slice
        .split_once("t[")
        .ok_or_else(|| ParseError::invalid_token(token, "expected table"))?;
    let name = rest.strip_suffix(']').unwrap_or(rest).trim();
    Ok((decode_count(token, count)?, name.to_string()))
}

/// Splits `?{prompt|...}` into the prompt and the remaining `|`-separated parts.
pub fn split_query(token: &Token<'_>) -> (String, Vec<String>) {
    let body = token
        .slice
        .strip_prefix("?{")
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(token.slice);
    let mut parts = body.split('|').map(|part| part.trim().to_string());
    let prompt = parts.next().unwrap_or_default();
    (prompt, parts.collect())
}

/// The id inside `$[[id]]`: an index when numeric, otherwise a name.
pub fn decode_reference(token: &Token<'_>) -> crate::parse::ast::RollRef {
    use crate::parse::ast::RollRef;

    let id = token
        .slice
        .strip_prefix("$[[")
        .and_then(|s| s.strip_suffix("]]"))
        .unwrap_or(token.slice)
        .trim();
    match id.parse() {
        Ok(index) => RollRef::Index(index),
        Err(_) => RollRef::Name(id.to_string()),
    }
}
