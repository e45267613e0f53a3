use crate::error::DiceResult;
use crate::parse::ast::*;
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, InlineRollDetails, RollResult, StoredRoll};

/// `[[expr]]`: evaluates eagerly and records the total under the roll's index.
#[derive(Debug, Default, Copy, Clone)]
pub struct InlineRollPlugin;

impl InlineRollPlugin {
    pub fn evaluate_inline_roll(
        &self,
        registry: &Registry,
        inline: &InlineRoll,
        ctx: &mut EvalContext,
    ) -> DiceResult<RollResult> {
        let mut result = registry.evaluate(&inline.body, ctx)?;
        match inline.index {
            Some(index) => {
                ctx.rolls
                    .insert(index.to_string(), StoredRoll::Total(result.total));
                result.details.inline_rolls.push(InlineRollDetails {
                    index,
                    expression: inline.expression.clone(),
                    total: result.total,
                });
            }
            None => {
                let msg = format!("Inline roll [[{}]] has no index and was not recorded", inline.expression);
                ctx.warn(msg.clone());
                result.warnings.push(msg);
            }
        }
        Ok(result)
    }
}

impl DicePlugin for InlineRollPlugin {
    fn name(&self) -> &'static str {
        "inline-rolls"
    }

    fn evaluate(
        &self,
        registry: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::InlineRoll(inline) => self.evaluate_inline_roll(registry, inline, ctx).map(Some),
            _ => Ok(None),
        }
    }
}
