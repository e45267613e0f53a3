use super::roller::Roller;
use crate::common::*;
use crate::error::{DiceError, DiceResult};
use crate::parse::{self, ast::Node};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Soft and hard limits for a single evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Macro and roll-query expansion depth.
    pub max_nesting: usize,
    /// Extra dice a single explode modifier may add.
    pub max_rolls: usize,
    pub max_reroll_attempts: usize,
    pub max_exhaustive_cycles: usize,
    /// Dice in a single term.
    pub max_dice: usize,
    /// Nodes being evaluated at once, across macro and query expansions.
    pub max_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_nesting: 99,
            max_rolls: 99,
            max_reroll_attempts: 10,
            max_exhaustive_cycles: 99,
            max_dice: 1000,
            max_depth: 256,
        }
    }
}

/// A value recorded for roll references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRoll {
    Total(Float),
    Rolls(Vec<Float>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableValue {
    Number(Float),
    Text(String),
}

impl TableValue {
    /// Numeric results contribute to a table roll's total.
    pub fn as_number(&self) -> Option<Float> {
        match self {
            Self::Number(x) => Some(*x),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for TableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => f.write_str(&fmt_number(*x)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of a random table, e.g. `"Sword"` or `{"value": "Sword", "weight": 3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableEntry {
    Weighted { value: TableValue, weight: Float },
    Plain(TableValue),
}

/// State threaded through one top-level evaluation.
pub struct EvalContext {
    pub macros: HashMap<String, Node>,
    pub tables: HashMap<String, Vec<TableEntry>>,
    pub user_input: HashMap<String, String>,
    pub rolls: HashMap<String, StoredRoll>,
    pub nesting_level: usize,
    pub warnings: Vec<String>,
    pub config: EvalConfig,
    depth: usize,
    roller: Box<dyn Roller>,
}

impl EvalContext {
    pub fn with_roller(roller: impl Roller + 'static) -> Self {
        Self {
            macros: HashMap::new(),
            tables: HashMap::new(),
            user_input: HashMap::new(),
            rolls: HashMap::new(),
            nesting_level: 0,
            warnings: Vec::new(),
            config: EvalConfig::default(),
            depth: 0,
            roller: Box::new(roller),
        }
    }

    pub fn new() -> Self {
        Self::with_roller(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_roller(StdRng::seed_from_u64(seed))
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses `expression` with the built-in grammar and stores it as macro `name`.
    pub fn define_macro(&mut self, name: impl Into<String>, expression: &str) -> DiceResult<()> {
        let node = parse::parse(expression)?;
        self.macros.insert(name.into(), node);
        Ok(())
    }

    pub fn define_table(&mut self, name: impl Into<String>, entries: Vec<TableEntry>) {
        self.tables.insert(name.into(), entries);
    }

    /// Loads a table from its JSON form, a list of plain or weighted entries.
    pub fn define_table_json(&mut self, name: impl Into<String>, json: &str) -> DiceResult<()> {
        let entries = serde_json::from_str(json)
            .map_err(|e| DiceError::validation(format!("invalid table entries: {}", e)))?;
        self.define_table(name, entries);
        Ok(())
    }

    pub fn set_input(&mut self, prompt: impl Into<String>, value: impl Into<String>) {
        self.user_input.insert(prompt.into(), value.into());
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::debug!(warning = %msg);
        self.warnings.push(msg);
    }

    pub fn roll(&mut self, sides: NonZeroUInt) -> UInt {
        self.roller.roll(sides)
    }

    pub fn pick(&mut self, len: usize) -> usize {
        self.roller.pick(len)
    }

    /// Fails once the expansion depth reaches `max_nesting`.
    pub fn check_nesting(&self, what: &str) -> DiceResult<()> {
        if self.nesting_level >= self.config.max_nesting {
            Err(DiceError::validation(format!(
                "Maximum nesting depth of {} exceeded while expanding {}",
                self.config.max_nesting, what
            )))
        } else {
            Ok(())
        }
    }

    /// Enters one more level of evaluation. Pair with [`EvalContext::leave`].
    pub(crate) fn enter(&mut self) -> DiceResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(DiceError::validation(format!(
                "Expression too deeply nested (at most {} levels)",
                self.config.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth -= 1;
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("macros", &self.macros.keys().collect::<Vec<_>>())
            .field("tables", &self.tables.keys().collect::<Vec<_>>())
            .field("user_input", &self.user_input)
            .field("rolls", &self.rolls)
            .field("nesting_level", &self.nesting_level)
            .field("depth", &self.depth)
            .field("warnings", &self.warnings)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: EvalConfig = serde_json::from_str(r#"{"max_nesting": 5}"#).unwrap();
        assert_eq!(config.max_nesting, 5);
        assert_eq!(config.max_rolls, 99);
        assert_eq!(config.max_dice, 1000);
    }

    #[test]
    fn test_table_entries_from_json() {
        let mut ctx = EvalContext::seeded(0);
        ctx.define_table_json(
            "loot",
            r#"["Gold", 5, {"value": "Sword", "weight": 3}]"#,
        )
        .unwrap();
        assert_eq!(
            ctx.tables["loot"],
            vec![
                TableEntry::Plain(TableValue::Text("Gold".into())),
                TableEntry::Plain(TableValue::Number(5.0)),
                TableEntry::Weighted {
                    value: TableValue::Text("Sword".into()),
                    weight: 3.0
                },
            ]
        );
        assert!(ctx.define_table_json("bad", "{").is_err());
    }

    #[test]
    fn test_stored_roll_shapes() {
        let total: StoredRoll = serde_json::from_str("7").unwrap();
        assert_eq!(total, StoredRoll::Total(7.0));
        let rolls: StoredRoll = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(rolls, StoredRoll::Rolls(vec![1.0, 2.0]));
    }

    #[test]
    fn test_nesting_guard() {
        let mut ctx = EvalContext::seeded(0).with_config(EvalConfig {
            max_nesting: 2,
            ..EvalConfig::default()
        });
        assert!(ctx.check_nesting("#a").is_ok());
        ctx.nesting_level = 2;
        assert_eq!(ctx.check_nesting("#a").unwrap_err().kind(), crate::ErrorKind::Validation);
    }
}
