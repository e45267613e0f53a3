use super::lexer::Token;

/// Concrete syntax tree. One variant per grammar rule; leaves are raw tokens whose text is only
/// interpreted by the AST builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Cst<'a> {
    Additive(Box<Cst<'a>>, Vec<(Token<'a>, Cst<'a>)>),
    /// `multiplicative ("**" exponential)*`: every right operand is itself an exponential.
    Exponential(Box<Cst<'a>>, Vec<(Token<'a>, Cst<'a>)>),
    Multiplicative(Box<Cst<'a>>, Vec<(Token<'a>, Cst<'a>)>),
    Prefix(Token<'a>, Box<Cst<'a>>),
    Parenthesized(Box<Cst<'a>>),
    Number(Token<'a>),
    Dice {
        dice: Token<'a>,
        modifiers: Vec<Token<'a>>,
        label: Option<Token<'a>>,
        bracketed: Vec<Token<'a>>,
    },
    CustomDice {
        dice: Token<'a>,
        modifiers: Vec<Token<'a>>,
    },
    FudgeDice {
        dice: Token<'a>,
        modifiers: Vec<Token<'a>>,
    },
    Group {
        items: Vec<Cst<'a>>,
        modifiers: Vec<Token<'a>>,
    },
    Function {
        name: Token<'a>,
        args: Vec<Cst<'a>>,
    },
    Table(Token<'a>),
    Macro(Token<'a>),
    InlineRoll {
        text: &'a str,
        body: Box<Cst<'a>>,
    },
    RollQuery(Token<'a>),
    RollReference(Token<'a>),
    Formatting(Token<'a>),
}
