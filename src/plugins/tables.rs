use crate::common::*;
use crate::error::{DiceError, DiceResult};
use crate::parse::{ast::*, visit};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, RollResult, TableDetails, TableEntry, TableValue};

/// `Nt[name]`: weighted sampling from a table in the evaluation context.
#[derive(Debug, Default, Copy, Clone)]
pub struct TablePlugin;

/// Expands entries into a pool where each value appears once per unit of weight.
fn weighted_pool(entries: &[TableEntry]) -> Vec<TableValue> {
    let mut pool = Vec::new();
    for entry in entries {
        let (value, copies) = match entry {
            TableEntry::Plain(value) => (value, 1),
            TableEntry::Weighted { value, weight } if weight.is_finite() && *weight >= 1.0 => {
                (value, weight.floor() as usize)
            }
            TableEntry::Weighted { .. } => continue,
        };
        if matches!(value, TableValue::Text(s) if s.trim().is_empty()) {
            continue;
        }
        pool.extend(std::iter::repeat(value).take(copies).cloned());
    }
    pool
}

impl TablePlugin {
    pub fn evaluate_table(&self, roll: &TableRoll, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        let entries = ctx
            .tables
            .get(&roll.name)
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| {
                DiceError::missing_data(format!("Table '{}' not found or empty", roll.name))
            })?;
        if roll.count <= 0 {
            return Err(DiceError::validation(format!(
                "Table roll count must be positive, got {}",
                roll.count
            )));
        }
        let pool = weighted_pool(entries);
        if pool.is_empty() {
            return Err(DiceError::validation(format!(
                "Table '{}' has no valid entries",
                roll.name
            )));
        }
        let max = ctx.config.max_dice;
        let count = usize::try_from(roll.count)
            .ok()
            .filter(|&count| count <= max)
            .ok_or_else(|| {
                DiceError::validation(format!("Cannot roll a table more than {} times", max))
            })?;

        let picks: Vec<_> = (0..count).map(|_| pool[ctx.pick(pool.len())].clone()).collect();
        let rolls: Vec<Float> = picks.iter().filter_map(TableValue::as_number).collect();
        tracing::trace!(table = %roll.name, ?picks, "rolled on table");

        Ok(RollResult {
            total: rolls.iter().sum(),
            rolls,
            warnings: Vec::new(),
            details: Box::new(crate::roll::Details {
                table: Some(TableDetails {
                    name: roll.name.clone(),
                    results: picks.iter().map(ToString::to_string).collect(),
                }),
                ..Default::default()
            }),
        })
    }
}

impl DicePlugin for TablePlugin {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn evaluate(
        &self,
        _: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::Table(roll) => self.evaluate_table(roll, ctx).map(Some),
            _ => Ok(None),
        }
    }

    fn extract_tables(&self, node: &Node) -> Vec<String> {
        visit::collect(node, |node| match node {
            Node::Table(roll) => Some(roll.name.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::roll::roller::StepRoller;

    fn ctx() -> EvalContext {
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        ctx.define_table_json(
            "loot",
            r#"[{"value": "Sword", "weight": 2}, "Shield", 10, {"value": "Nothing", "weight": 0}]"#,
        )
        .unwrap();
        ctx.define_table("empty", Vec::new());
        ctx
    }

    fn eval(s: &str, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        Registry::default().process_expression(s, ctx)
    }

    #[test]
    fn test_weighted_pool() {
        let ctx = ctx();
        let pool = weighted_pool(&ctx.tables["loot"]);
        assert_eq!(
            pool.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["Sword", "Sword", "Shield", "10"]
        );
    }

    #[test]
    fn test_table_roll() {
        let mut ctx = ctx();
        let result = eval("4t[loot]", &mut ctx).unwrap();
        let table = result.details.table.unwrap();
        assert_eq!(table.name, "loot");
        assert_eq!(table.results, vec!["Sword", "Sword", "Shield", "10"]);
        assert_eq!(result.rolls, vec![10.0]);
        assert_eq!(result.total, 10.0);
    }

    #[test]
    fn test_table_errors() {
        let mut ctx = ctx();
        assert_eq!(eval("t[missing]", &mut ctx).unwrap_err().kind(), ErrorKind::MissingData);
        assert_eq!(eval("t[empty]", &mut ctx).unwrap_err().kind(), ErrorKind::MissingData);
        assert_eq!(eval("0t[loot]", &mut ctx).unwrap_err().kind(), ErrorKind::Validation);

        ctx.define_table_json("blank", r#"[{"value": "x", "weight": 0}, ""]"#)
            .unwrap();
        assert_eq!(eval("t[blank]", &mut ctx).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_extract_tables() {
        let node = Registry::default().parse("t[a] + 2t[b]").unwrap();
        assert_eq!(TablePlugin.extract_tables(&node), vec!["a", "b"]);
    }
}
