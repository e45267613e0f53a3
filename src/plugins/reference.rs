use crate::error::{DiceError, DiceResult};
use crate::parse::{ast::*, visit};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, RollResult, StoredRoll};

/// `$[[id]]`: reads a roll recorded earlier in the same evaluation.
#[derive(Debug, Default, Copy, Clone)]
pub struct ReferencePlugin;

impl ReferencePlugin {
    pub fn evaluate_roll_reference(
        &self,
        reference: &RollReference,
        ctx: &mut EvalContext,
    ) -> DiceResult<RollResult> {
        let key = reference.id.key();
        let mut result = match ctx.rolls.get(&key) {
            Some(StoredRoll::Total(total)) => RollResult::constant(*total),
            Some(StoredRoll::Rolls(rolls)) => RollResult {
                rolls: rolls.clone(),
                ..RollResult::default()
            },
            None => {
                return Err(DiceError::missing_data(format!(
                    "Referenced roll '{}' not found",
                    key
                )))
            }
        };
        result.details.reference = Some(reference.id.clone());
        Ok(result)
    }
}

impl DicePlugin for ReferencePlugin {
    fn name(&self) -> &'static str {
        "roll-references"
    }

    fn evaluate(
        &self,
        _: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::RollReference(reference) => {
                self.evaluate_roll_reference(reference, ctx).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn extract_rolls(&self, node: &Node) -> Vec<RollRef> {
        visit::collect(node, |node| match node {
            Node::RollReference(reference) => Some(reference.id.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::roll::roller::StepRoller;

    fn eval(s: &str, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        Registry::default().process_expression(s, ctx)
    }

    #[test]
    fn test_reference_stored_rolls() {
        let mut ctx = EvalContext::with_roller(StepRoller::new(1, 1));
        ctx.rolls.insert("attack".into(), StoredRoll::Total(17.0));
        ctx.rolls.insert("damage".into(), StoredRoll::Rolls(vec![3.0, 4.0]));

        let result = eval("$[[attack]] + 1", &mut ctx).unwrap();
        assert_eq!(result.total, 18.0);
        assert_eq!(result.details.reference, Some(RollRef::Name("attack".into())));

        let result = eval("$[[damage]]", &mut ctx).unwrap();
        assert_eq!(result.total, 0.0);
        assert_eq!(result.rolls, vec![3.0, 4.0]);
    }

    #[test]
    fn test_missing_reference() {
        let err = eval("$[[99]]", &mut EvalContext::seeded(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingData);
        assert_eq!(err.to_string(), "Referenced roll '99' not found");
    }
}
