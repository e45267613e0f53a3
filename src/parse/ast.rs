use crate::common::*;
use crate::modifier::Modifier;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(Float),
    Unary(UnaryOperator, Box<Node>),
    Arithmetic(Box<Node>, BinaryOperator, Box<Node>),
    Function(FunctionCall),
    Dice(Dice),
    CustomDice(CustomDice),
    FudgeDice(FudgeDice),
    Group(GroupedRoll),
    Table(TableRoll),
    Macro(MacroCall),
    RollQuery(RollQuery),
    RollReference(RollReference),
    InlineRoll(InlineRoll),
    Formatting(Formatting),
}

impl Node {
    /// The node type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Unary(..) => "unary",
            Self::Arithmetic(..) => "arithmetic",
            Self::Function(_) => "function",
            Self::Dice(_) => "dice",
            Self::CustomDice(_) => "custom-dice",
            Self::FudgeDice(_) => "fudge-dice",
            Self::Group(_) => "grouped-roll",
            Self::Table(_) => "table",
            Self::Macro(_) => "macro",
            Self::RollQuery(_) => "roll-query",
            Self::RollReference(_) => "roll-reference",
            Self::InlineRoll(_) => "inline-roll",
            Self::Formatting(_) => "formatting",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dice {
    pub count: Int,
    pub sides: Int,
    pub modifiers: Vec<Modifier>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomDice {
    pub count: Int,
    pub sides: Vec<Float>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FudgeDice {
    pub count: Int,
    pub variant: FudgeVariant,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRoll {
    pub items: NonEmpty<Node>,
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRoll {
    pub name: String,
    pub count: Int,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollQuery {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QueryOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RollRef {
    Index(usize),
    Name(String),
}

impl RollRef {
    /// The key under which the referenced roll is stored in the evaluation context.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RollRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => fmt::Display::fmt(i, f),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollReference {
    pub id: RollRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineRoll {
    pub expression: String,
    pub body: Box<Node>,
    /// Document-order position, filled in by [`index_inline_rolls`](super::index_inline_rolls).
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formatting {
    pub name: String,
}
