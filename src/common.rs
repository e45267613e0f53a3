use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::num::NonZeroU32;

pub type Int = i64;
pub type UInt = u32;
pub type NonZeroUInt = NonZeroU32;

pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOperator {
    Pos,
    Neg,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Pos => '+',
            Self::Neg => '-',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "**",
        };
        f.write_str(s)
    }
}

/// The comparison used by conditional modifiers such as `r<3` or `!>5`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
}

impl Comparator {
    pub fn matches(self, value: Float, target: Float) -> bool {
        match self {
            Self::Eq => value == target,
            Self::Gt => value > target,
            Self::Lt => value < target,
            Self::Ge => value >= target,
            Self::Le => value <= target,
        }
    }

    pub(crate) fn from_prefix(s: &str) -> Option<(Self, &str)> {
        // Two-character operators first so `>=` is not read as `>`.
        for (text, cmp) in [
            (">=", Self::Ge),
            ("<=", Self::Le),
            (">", Self::Gt),
            ("<", Self::Lt),
            ("=", Self::Eq),
        ] {
            if let Some(rest) = s.strip_prefix(text) {
                return Some((cmp, rest));
            }
        }
        None
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::Eq
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        };
        f.write_str(s)
    }
}

/// Fate/fudge die flavours. `Basic` is uniform over {-1, 0, 1}; `F.n` is a six-sided die
/// with `n` minus faces, `n` plus faces and blanks for the rest.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FudgeVariant {
    Basic,
    One,
    Two,
    Three,
}

impl FudgeVariant {
    pub(crate) fn faces(self) -> &'static [Float] {
        match self {
            Self::Basic => &[-1.0, 0.0, 1.0],
            Self::One => &[-1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            Self::Two => &[-1.0, -1.0, 0.0, 0.0, 1.0, 1.0],
            Self::Three => &[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl fmt::Display for FudgeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_char('F'),
            Self::One => f.write_str("F.1"),
            Self::Two => f.write_str("F.2"),
            Self::Three => f.write_str("F.3"),
        }
    }
}

/// Formats a float the way totals are shown to users: integral values without a fraction.
pub fn fmt_number(x: Float) -> String {
    if x.fract() == 0.0 && x.is_finite() {
        format!("{}", x as Int)
    } else {
        format!("{}", x)
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    pub use super::*;
    pub(crate) use crate::modifier::*;
    pub(crate) use crate::parse::ast::{self, Node};
    pub use BinaryOperator::*;

    pub trait NodeExt: Sized {
        fn num(x: Float) -> Self;

        fn dice(count: Int, sides: Int) -> Self;

        fn op_dice(count: Int, sides: Int, modifiers: Vec<Modifier>) -> Self;

        fn neg(x: Self) -> Self;

        fn bin(l: Self, op: BinaryOperator, r: Self) -> Self;
    }

    impl NodeExt for Node {
        fn num(x: Float) -> Self {
            Self::Number(x)
        }

        fn dice(count: Int, sides: Int) -> Self {
            Self::op_dice(count, sides, vec![])
        }

        fn op_dice(count: Int, sides: Int, modifiers: Vec<Modifier>) -> Self {
            Self::Dice(ast::Dice {
                count,
                sides,
                modifiers,
                label: None,
            })
        }

        fn neg(x: Self) -> Self {
            Self::Unary(UnaryOperator::Neg, Box::new(x))
        }

        fn bin(l: Self, op: BinaryOperator, r: Self) -> Self {
            Self::Arithmetic(Box::new(l), op, Box::new(r))
        }
    }
}
