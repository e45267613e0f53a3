use crate::common::*;
use crate::modifier::Modifier;
use crate::parse::ast::{RollQuery, RollRef};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollResult {
    pub total: Float,
    pub rolls: Vec<Float>,
    pub warnings: Vec<String>,
    pub details: Box<Details>,
}

impl RollResult {
    pub fn constant(total: Float) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Takes on `other`'s rolls and warnings and merges its details.
    pub fn absorb(&mut self, other: RollResult) {
        self.rolls.extend(other.rolls);
        self.warnings.extend(other.warnings);
        self.details.merge(*other.details);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhaustiveDetails {
    pub total_successes: usize,
    pub cycles: usize,
    pub capped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchDetails {
    pub values: Vec<Float>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableDetails {
    pub name: String,
    pub results: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDetails {
    pub prompt: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineRollDetails {
    pub index: usize,
    pub expression: String,
    pub total: Float,
}

/// Everything the extractors found, for hosts that prefetch or prompt before rolling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extracted {
    pub queries: Vec<RollQuery>,
    pub macros: Vec<String>,
    pub tables: Vec<String>,
    pub rolls: Vec<RollRef>,
    pub formatting: Vec<String>,
}

/// Structured trace of an evaluation. Absent fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    #[serde(skip_serializing_if = "is_zero")]
    pub explosions: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub rerolls: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaustive: Option<ExhaustiveDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_once: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableDetails>,
    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<RollRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inline_rolls: Vec<InlineRollDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Extracted>,
}

fn is_zero(x: &usize) -> bool {
    *x == 0
}

fn fill<T>(this: &mut Option<T>, other: Option<T>) {
    if this.is_none() {
        *this = other;
    }
}

fn add(this: &mut Option<usize>, other: Option<usize>) {
    if let Some(other) = other {
        *this = Some(this.unwrap_or(0) + other);
    }
}

impl Details {
    /// Folds a child's details into this one. Existing values are kept; lists are extended and
    /// counters summed.
    pub fn merge(&mut self, other: Details) {
        self.modifiers.extend(other.modifiers);
        self.explosions += other.explosions;
        self.rerolls += other.rerolls;
        add(&mut self.successes, other.successes);
        add(&mut self.failures, other.failures);
        fill(&mut self.exhaustive, other.exhaustive);
        fill(&mut self.matches, other.matches);
        fill(&mut self.roll_once, other.roll_once);
        self.labels.extend(other.labels);
        fill(&mut self.function, other.function);
        fill(&mut self.table, other.table);
        fill(&mut self.macro_name, other.macro_name);
        fill(&mut self.query, other.query);
        fill(&mut self.reference, other.reference);
        self.inline_rolls.extend(other.inline_rolls);
        match (&mut self.formatting, other.formatting) {
            (Some(this), Some(other)) => this.push_str(&other),
            (this, other) => fill(this, other),
        }
        fill(&mut self.extracted, other.extracted);
    }
}
