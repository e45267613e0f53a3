//! Lowering of the concrete syntax tree into [`Node`]s.

use super::ast::{self, Node};
use super::cst::Cst;
use super::decode::*;
use super::lexer::{Token, TokenKind};
use super::parser::ParseError;
use super::MAX_DEPTH;
use crate::common::*;
use crate::modifier::Modifier;

type BResult<T> = Result<T, ParseError>;

pub fn build(cst: &Cst<'_>) -> BResult<Node> {
    build_at(cst, 0)
}

/// Operator chains nest one node per operator, so every operand is built at the depth of the
/// deepest one.
fn chain_depth(depth: usize, rest: &[(Token<'_>, Cst<'_>)]) -> BResult<usize> {
    let deepest = depth + rest.len();
    if deepest > MAX_DEPTH {
        let op = &rest[MAX_DEPTH.saturating_sub(depth).min(rest.len() - 1)].0;
        return Err(ParseError::too_deep(Some(op)));
    }
    Ok(deepest)
}

fn build_at(cst: &Cst<'_>, depth: usize) -> BResult<Node> {
    if depth > MAX_DEPTH {
        return Err(ParseError::too_deep(None));
    }
    let nested = |cst: &Cst<'_>| build_at(cst, depth + 1);
    let node = match cst {
        Cst::Additive(lhs, rest) | Cst::Multiplicative(lhs, rest) => {
            let depth = chain_depth(depth, rest)?;
            rest.iter()
                .try_fold(build_at(lhs, depth)?, |acc, (op, rhs)| -> BResult<Node> {
                    Ok(Node::Arithmetic(
                        Box::new(acc),
                        binary_operator(op)?,
                        Box::new(build_at(rhs, depth)?),
                    ))
                })?
        }
        Cst::Exponential(lhs, rest) => {
            let depth = chain_depth(depth, rest)?;
            // Folded from the right: `a ** b ** c` is `a ** (b ** c)`.
            let mut operands = vec![build_at(lhs, depth)?];
            let mut ops = Vec::with_capacity(rest.len());
            for (op, rhs) in rest {
                ops.push(binary_operator(op)?);
                operands.push(build_at(rhs, depth)?);
            }
            let mut acc = operands.pop().unwrap_or(Node::Number(0.0));
            while let (Some(lhs), Some(op)) = (operands.pop(), ops.pop()) {
                acc = Node::Arithmetic(Box::new(lhs), op, Box::new(acc));
            }
            acc
        }
        Cst::Prefix(op, rhs) => {
            let op = match op.kind {
                TokenKind::Minus => UnaryOperator::Neg,
                _ => UnaryOperator::Pos,
            };
            Node::Unary(op, Box::new(nested(rhs)?))
        }
        Cst::Parenthesized(inner) => build_at(inner, depth)?,
        Cst::Number(token) => Node::Number(
            token
                .slice
                .parse()
                .map_err(|_| ParseError::invalid_token(token, "invalid number"))?,
        ),
        Cst::Dice {
            dice,
            modifiers,
            label,
            bracketed,
        } => {
            let (count, sides) = decode_dice(dice)?;
            let label = match label {
                Some(token) => Some(token.slice[1..token.slice.len() - 1].trim().to_string()),
                None if !bracketed.is_empty() => Some(join_tokens(bracketed)),
                None => None,
            };
            Node::Dice(ast::Dice {
                count,
                sides,
                modifiers: build_modifiers(modifiers)?,
                label,
            })
        }
        Cst::CustomDice { dice, modifiers } => {
            let (count, sides) = decode_custom_dice(dice)?;
            Node::CustomDice(ast::CustomDice {
                count,
                sides,
                modifiers: build_modifiers(modifiers)?,
            })
        }
        Cst::FudgeDice { dice, modifiers } => {
            let (count, variant) = decode_fudge_dice(dice)?;
            Node::FudgeDice(ast::FudgeDice {
                count,
                variant,
                modifiers: build_modifiers(modifiers)?,
            })
        }
        Cst::Group { items, modifiers } => {
            let items = items.iter().map(nested).collect::<BResult<Vec<_>>>()?;
            let items = NonEmpty::try_from_vec(items).map_err(|_| ParseError {
                kind: super::parser::ParseErrorKind::InvalidToken("empty group".to_string()),
                span: 0..0,
                slice: String::new(),
            })?;
            Node::Group(ast::GroupedRoll {
                items,
                modifiers: build_modifiers(modifiers)?,
            })
        }
        Cst::Function { name, args } => Node::Function(ast::FunctionCall {
            name: name.slice.trim_end_matches('(').to_string(),
            args: args.iter().map(nested).collect::<BResult<_>>()?,
        }),
        Cst::Table(token) => {
            let (count, name) = decode_table(token)?;
            Node::Table(ast::TableRoll { name, count })
        }
        Cst::Macro(token) => Node::Macro(ast::MacroCall {
            name: token.slice[1..].to_string(),
        }),
        Cst::InlineRoll { text, body } => Node::InlineRoll(ast::InlineRoll {
            expression: text.to_string(),
            body: Box::new(nested(body)?),
            index: None,
        }),
        Cst::RollQuery(token) => Node::RollQuery(build_query(token)),
        Cst::RollReference(token) => Node::RollReference(ast::RollReference {
            id: decode_reference(token),
        }),
        Cst::Formatting(token) => Node::Formatting(ast::Formatting {
            name: token.slice.trim_matches('%').to_string(),
        }),
    };
    Ok(node)
}

fn binary_operator(token: &Token<'_>) -> BResult<BinaryOperator> {
    Ok(match token.kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Sub,
        TokenKind::Star => BinaryOperator::Mul,
        TokenKind::Slash => BinaryOperator::Div,
        TokenKind::Percent => BinaryOperator::Rem,
        TokenKind::StarStar => BinaryOperator::Pow,
        _ => return Err(ParseError::invalid_token(token, "not a binary operator")),
    })
}

/// Modifiers apply in the order they were written.
fn build_modifiers(tokens: &[Token<'_>]) -> BResult<Vec<Modifier>> {
    let mut tokens: Vec<_> = tokens.iter().collect();
    tokens.sort_by_key(|token| token.offset());
    tokens.into_iter().map(decode_modifier).collect()
}

/// Rebuilds the text of a label that the lexer split into several tokens.
fn join_tokens(tokens: &[Token<'_>]) -> String {
    let mut label = String::new();
    let mut end = None;
    for token in tokens {
        if end.map_or(false, |end| end != token.span.start) {
            label.push(' ');
        }
        label.push_str(token.slice);
        end = Some(token.span.end);
    }
    label
}

/// `?{prompt}`, `?{prompt|default}` or `?{prompt|Label,Value|Value|...}`.
fn build_query(token: &Token<'_>) -> ast::RollQuery {
    let (prompt, parts) = split_query(token);

    if let [default] = parts.as_slice() {
        if !default.contains(',') {
            return ast::RollQuery {
                prompt,
                default: Some(default.clone()),
                options: Vec::new(),
            };
        }
    }

    let options: Vec<_> = parts
        .into_iter()
        .map(|part| match part.split_once(',') {
            Some((label, value)) => ast::QueryOption {
                label: label.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => ast::QueryOption {
                label: part.clone(),
                value: part,
            },
        })
        .collect();
    ast::RollQuery {
        prompt,
        default: options.first().map(|option| option.value.clone()),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::*;
    use crate::parse::parser::Parser;

    fn check(s: &str, expected: Node) {
        let cst = Parser::new(s).parse().unwrap();
        assert_eq!(build(&cst).unwrap(), expected);
    }

    fn built(s: &str) -> Node {
        build(&Parser::new(s).parse().unwrap()).unwrap()
    }

    #[test]
    fn test_build_arithmetic() {
        check(
            "1 - 2 - 3",
            Node::bin(Node::bin(Node::num(1.0), Sub, Node::num(2.0)), Sub, Node::num(3.0)),
        );
        check(
            "2**2**3",
            Node::bin(Node::num(2.0), Pow, Node::bin(Node::num(2.0), Pow, Node::num(3.0))),
        );
        check(
            "2*3**2",
            Node::bin(Node::bin(Node::num(2.0), Mul, Node::num(3.0)), Pow, Node::num(2.0)),
        );
        check("-(1d4)", Node::neg(Node::dice(1, 4)));
    }

    #[test]
    fn test_build_dice() {
        check(
            "4d6kh3",
            Node::op_dice(
                4,
                6,
                vec![Keep {
                    end: Extreme::Highest,
                    count: 3,
                }
                .into()],
            ),
        );
        check("d%", Node::dice(1, 100));
        check("0d6", Node::dice(0, 6));
    }

    #[test]
    fn test_build_labels() {
        match built("2d6[ fire ]") {
            Node::Dice(dice) => assert_eq!(dice.label.as_deref(), Some("fire")),
            other => panic!("unexpected node {:?}", other),
        }
        match built("1d8[a[b]c]") {
            Node::Dice(dice) => assert_eq!(dice.label.as_deref(), Some("a[b]c")),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_build_plugin_nodes() {
        match built("?{Bonus|2}") {
            Node::RollQuery(q) => {
                assert_eq!(q.prompt, "Bonus");
                assert_eq!(q.default.as_deref(), Some("2"));
                assert!(q.options.is_empty());
            }
            other => panic!("unexpected node {:?}", other),
        }
        match built("?{Mode|Normal,0|Advantage,1|5}") {
            Node::RollQuery(q) => {
                assert_eq!(q.options.len(), 3);
                assert_eq!(q.options[1].label, "Advantage");
                assert_eq!(q.options[2].label, "5");
                assert_eq!(q.default.as_deref(), Some("0"));
            }
            other => panic!("unexpected node {:?}", other),
        }
        match built("$[[hit]]") {
            Node::RollReference(r) => assert_eq!(r.id, ast::RollRef::Name("hit".into())),
            other => panic!("unexpected node {:?}", other),
        }
        check(
            "#attack",
            Node::Macro(ast::MacroCall {
                name: "attack".into(),
            }),
        );
        check(
            "%NEWLINE%",
            Node::Formatting(ast::Formatting {
                name: "NEWLINE".into(),
            }),
        );
        check(
            "floor(1)",
            Node::Function(ast::FunctionCall {
                name: "floor".into(),
                args: vec![Node::num(1.0)],
            }),
        );
    }

    #[test]
    fn test_build_rejects_bad_tokens() {
        assert!(build(&Parser::new("2d{1,a}").parse().unwrap()).is_err());
        assert!(build(&Parser::new("1dF.7").parse().unwrap()).is_err());
    }

    #[test]
    fn test_build_depth_limit() {
        let long = vec!["1"; 1000].join("+");
        let err = build(&Parser::new(&long).parse().unwrap()).unwrap_err();
        assert_eq!(err.kind, crate::parse::ParseErrorKind::TooDeep);
        assert_eq!(err.slice, "+");

        let products = vec!["2"; 1000].join("*");
        assert!(build(&Parser::new(&products).parse().unwrap()).is_err());

        let nested_sums = format!("1+({})", vec!["1"; 130].join("+"));
        assert!(build(&Parser::new(&nested_sums).parse().unwrap()).is_err());

        let fine = vec!["1"; 100].join("+");
        assert!(build(&Parser::new(&fine).parse().unwrap()).is_ok());
    }
}
