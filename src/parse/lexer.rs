use logos::{Lexer as LogosLexer, Logos};
use logos_iter::{LogosIter, PeekableLexer};
use std::fmt;
use std::ops::Range;

pub type Lexer<'a> = PeekableLexer<'a, LogosLexer<'a, TokenKind>, TokenKind>;

pub fn lexer(s: &str) -> Lexer {
    TokenKind::lexer(s).peekable_lexer()
}

/// A lexed token. Compound tokens (modifiers, tables, queries, ...) keep their raw text; it is
/// decoded when the CST is lowered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub slice: &'a str,
    pub span: Range<usize>,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, slice: &'a str, span: Range<usize>) -> Self {
        Self { kind, slice, span }
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }
}

/// Splits the whole input into tokens. The parser pulls tokens lazily instead; this is the
/// standalone entry point for tooling and tests.
pub fn tokenize(s: &str) -> Vec<Token<'_>> {
    TokenKind::lexer(s)
        .spanned()
        .map(|(kind, span)| Token::new(kind, &s[span.clone()], span))
        .collect()
}

#[derive(Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[0-9]*d(%|[0-9]+)")]
    Dice,
    #[regex(r"[0-9]*d\{[^}]*\}")]
    CustomDice,
    #[regex(r"[0-9]*dF(\.[0-9])?")]
    FudgeDice,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*\(")]
    FunctionCall,
    #[regex(r"[0-9]*t\[[^\]]+\]")]
    Table,
    /// `#name`, where the name is an identifier: `#a-1` is `#a - 1`.
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    Macro,
    #[token("[[")]
    InlineOpen,
    #[token("]]")]
    InlineClose,
    #[regex(r"\$\[\[[^\]]+\]\]")]
    RollReference,
    #[regex(r"\?\{[^}]*\}")]
    RollQuery,
    #[regex(r"%[A-Za-z_]+%")]
    Formatting,
    #[regex(r"\[[^\[\]]+\]")]
    Label,

    #[regex(r"k[hl]?[0-9]+")]
    ModKeep,
    #[regex(r"d[hl][0-9]+")]
    ModDrop,
    #[regex(r"k[<>][0-9]+")]
    ModKeepFilter,
    #[regex(r"r(>=|<=|[<>=])?[0-9]+")]
    ModReroll,
    #[regex(r"ro(>=|<=|[<>=])?[0-9]+")]
    ModRerollOnce,
    #[regex(r"!(!|p)?((>=|<=|[<>=])?[0-9]+)?(l[0-9]+)?")]
    ModExplode,
    #[regex(r"m[ia][0-9]+")]
    ModClamp,
    #[regex(r"(>=|<=|[<>=])[0-9]+")]
    ModCompare,
    #[regex(r"(c[sf]|s|f)(>=|<=|[<>=])?[0-9]+")]
    ModSuccess,
    #[regex(r"s[ad]")]
    ModSort,
    #[token("m")]
    ModMatch,
    #[token("o")]
    ModRollOnce,
    #[token("e")]
    ModExhaustive,

    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub const MODIFIERS: &'static [Self] = &[
        Self::ModKeep,
        Self::ModDrop,
        Self::ModKeepFilter,
        Self::ModReroll,
        Self::ModRerollOnce,
        Self::ModExplode,
        Self::ModClamp,
        Self::ModCompare,
        Self::ModSuccess,
        Self::ModSort,
        Self::ModMatch,
        Self::ModRollOnce,
        Self::ModExhaustive,
    ];

    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;

        match self {
            Number => "<number>",
            Dice => "<dice>",
            CustomDice => "<custom dice>",
            FudgeDice => "<fudge dice>",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            LeftBracket => "'['",
            RightBracket => "']'",
            Comma => "','",
            Plus => "'+'",
            Minus => "'-'",
            StarStar => "'**'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            FunctionCall => "<function>",
            Table => "<table>",
            Macro => "<macro>",
            InlineOpen => "'[['",
            InlineClose => "']]'",
            RollReference => "<roll reference>",
            RollQuery => "<roll query>",
            Formatting => "<formatting>",
            Label => "<label>",
            ModKeep | ModDrop | ModKeepFilter | ModReroll | ModRerollOnce | ModExplode
            | ModClamp | ModCompare | ModSuccess | ModSort | ModMatch | ModRollOnce
            | ModExhaustive => "<modifier>",
            Error => "<error>",
        }
    }

    pub fn is_modifier(&self) -> bool {
        Self::MODIFIERS.contains(self)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(s: &str) -> Vec<TokenKind> {
        tokenize(s).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_dice() {
        assert_eq!(kinds("4d6kh3 + 2"), vec![Dice, ModKeep, Plus, Number]);
        assert_eq!(kinds("d%"), vec![Dice]);
        assert_eq!(kinds("3dF.2"), vec![FudgeDice]);
        assert_eq!(kinds("2d{1,3,5}"), vec![CustomDice]);
        assert_eq!(kinds("2d6[fire]"), vec![Dice, Label]);
    }

    #[test]
    fn test_lex_compound_modifiers() {
        assert_eq!(
            kinds("10d6r<=3ro2!>5l3mi2ma5"),
            vec![Dice, ModReroll, ModRerollOnce, ModExplode, ModClamp, ModClamp]
        );
        assert_eq!(kinds("5d6>6e"), vec![Dice, ModCompare, ModExhaustive]);
        assert_eq!(kinds("8d6dl2k>3sa"), vec![Dice, ModDrop, ModKeepFilter, ModSort]);
        assert_eq!(kinds("3d6cs>5cf1"), vec![Dice, ModSuccess, ModSuccess]);
        assert_eq!(kinds("{1d6,1d8}o"), vec![LeftBrace, Dice, Comma, Dice, RightBrace, ModRollOnce]);
    }

    #[test]
    fn test_lex_plugin_tokens() {
        assert_eq!(
            kinds("[[2+3]] + $[[0]]"),
            vec![InlineOpen, Number, Plus, Number, InlineClose, Plus, RollReference]
        );
        assert_eq!(kinds("?{Bonus|0} + #attack"), vec![RollQuery, Plus, Macro]);
        assert_eq!(kinds("2t[loot-table]"), vec![Table]);
        assert_eq!(kinds("#loot_table"), vec![Macro]);
        assert_eq!(kinds("#a-1"), vec![Macro, Minus, Number]);
        assert_eq!(kinds("#a-#b"), vec![Macro, Minus, Macro]);
        assert_eq!(kinds("%NEWLINE%"), vec![Formatting]);
        assert_eq!(kinds("max(1, 2)"), vec![FunctionCall, Number, Comma, Number, RightParen]);
        assert_eq!(kinds("2**3%2"), vec![Number, StarStar, Number, Percent, Number]);
    }

    #[test]
    fn test_token_offsets() {
        let tokens = tokenize("1d20 + 4");
        assert_eq!(tokens[0].slice, "1d20");
        assert_eq!(tokens[1].offset(), 5);
        assert_eq!(tokens[2].span, 7..8);
    }
}
