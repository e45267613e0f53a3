use crate::common::*;
use crate::error::{DiceError, DiceResult};
use crate::parse::{ast::*, visit};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, QueryDetails, RollResult};

/// `?{prompt|...}`: substitutes a value the host collected from the user.
#[derive(Debug, Default, Copy, Clone)]
pub struct QueryPlugin;

impl QueryPlugin {
    pub fn evaluate_roll_query(
        &self,
        query: &RollQuery,
        ctx: &mut EvalContext,
    ) -> DiceResult<RollResult> {
        ctx.check_nesting(&format!("roll query '{}'", query.prompt))?;

        let value = ctx
            .user_input
            .get(&query.prompt)
            .cloned()
            .or_else(|| query.default.clone())
            .ok_or_else(|| {
                DiceError::missing_data(format!("No input provided for '{}'", query.prompt))
            })?;
        if !query.options.is_empty() && !query.options.iter().any(|o| o.value == value) {
            return Err(DiceError::validation(format!(
                "'{}' is not one of the options for '{}'",
                value, query.prompt
            )));
        }

        let total = value
            .trim()
            .parse::<Float>()
            .ok()
            .filter(|x| x.is_finite())
            .unwrap_or(0.0);
        let mut result = RollResult::constant(total);
        result.details.query = Some(QueryDetails {
            prompt: query.prompt.clone(),
            value,
        });
        Ok(result)
    }
}

impl DicePlugin for QueryPlugin {
    fn name(&self) -> &'static str {
        "roll-queries"
    }

    fn evaluate(
        &self,
        _: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::RollQuery(query) => self.evaluate_roll_query(query, ctx).map(Some),
            _ => Ok(None),
        }
    }

    fn extract_queries(&self, node: &Node) -> Vec<RollQuery> {
        visit::collect(node, |node| match node {
            Node::RollQuery(query) => Some(query.clone()),
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

    fn ctx() -> EvalContext {
        EvalContext::with_roller(StepRoller::new(1, 1))
    }

    #[test]
    fn test_query_input_and_default() {
        let mut ctx = ctx();
        assert_eq!(eval("1 + ?{Bonus|2}", &mut ctx).unwrap().total, 3.0);

        ctx.set_input("Bonus", "5");
        let result = eval("1 + ?{Bonus|2}", &mut ctx).unwrap();
        assert_eq!(result.total, 6.0);
        let query = result.details.query.unwrap();
        assert_eq!((query.prompt.as_str(), query.value.as_str()), ("Bonus", "5"));

        ctx.set_input("Bonus", "lots");
        assert_eq!(eval("?{Bonus|2}", &mut ctx).unwrap().total, 0.0);
    }

    #[test]
    fn test_query_missing_input() {
        let err = eval("?{Bonus}", &mut ctx()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingData);
    }

    #[test]
    fn test_query_options() {
        let mut ctx = ctx();
        assert_eq!(
            eval("?{Mode|Normal,0|Advantage,1}", &mut ctx).unwrap().total,
            0.0
        );
        ctx.set_input("Mode", "1");
        assert_eq!(
            eval("?{Mode|Normal,0|Advantage,1}", &mut ctx).unwrap().total,
            1.0
        );
        ctx.set_input("Mode", "7");
        assert_eq!(
            eval("?{Mode|Normal,0|Advantage,1}", &mut ctx)
                .unwrap_err()
                .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_extract_queries() {
        let node = Registry::default().parse("?{A} + [[?{B|1}]]").unwrap();
        let prompts: Vec<_> = QueryPlugin
            .extract_queries(&node)
            .into_iter()
            .map(|q| q.prompt)
            .collect();
        assert_eq!(prompts, vec!["A", "B"]);
    }
}
