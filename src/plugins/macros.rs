use crate::error::{DiceError, DiceResult};
use crate::parse::{ast::*, visit};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, RollResult};

/// `#name`: expands a macro defined in the evaluation context.
#[derive(Debug, Default, Copy, Clone)]
pub struct MacroPlugin;

impl MacroPlugin {
    pub fn evaluate_macro(
        &self,
        registry: &Registry,
        call: &MacroCall,
        ctx: &mut EvalContext,
    ) -> DiceResult<RollResult> {
        let body = ctx
            .macros
            .get(&call.name)
            .cloned()
            .ok_or_else(|| DiceError::missing_data(format!("Macro '{}' not found", call.name)))?;
        ctx.check_nesting(&format!("macro '#{}'", call.name))?;

        ctx.nesting_level += 1;
        let result = registry.evaluate(&body, ctx);
        ctx.nesting_level -= 1;

        let mut result = result?;
        result.details.macro_name = Some(call.name.clone());
        let trace = format!("Expanded macro '#{}' to total {}", call.name, result.total);
        ctx.warn(trace.clone());
        result.warnings.push(trace);
        Ok(result)
    }
}

impl DicePlugin for MacroPlugin {
    fn name(&self) -> &'static str {
        "macros"
    }

    fn evaluate(
        &self,
        registry: &Registry,
        node: &Node,
        ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::Macro(call) => self.evaluate_macro(registry, call, ctx).map(Some),
            _ => Ok(None),
        }
    }

    fn extract_macros(&self, node: &Node) -> Vec<String> {
        visit::collect(node, |node| match node {
            Node::Macro(call) => Some(call.name.clone()),
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
        EvalContext::with_roller(StepRoller::new(3, 0))
    }

    #[test]
    fn test_macro_chain() {
        let mut ctx = ctx();
        ctx.define_macro("a", "1d6").unwrap();
        ctx.define_macro("b", "#a").unwrap();
        let result = Registry::default()
            .process_expression("1d20 + #b", &mut ctx)
            .unwrap();
        assert_eq!(result.total, 6.0);
        assert_eq!(result.details.macro_name.as_deref(), Some("b"));
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(ctx.nesting_level, 0);
    }

    #[test]
    fn test_macro_followed_by_subtraction() {
        let mut ctx = ctx();
        ctx.define_macro("a", "5").unwrap();
        ctx.define_macro("hit_bonus", "2").unwrap();
        let registry = Registry::default();
        assert_eq!(registry.process_expression("#a-1", &mut ctx).unwrap().total, 4.0);
        assert_eq!(registry.process_expression("#a-#hit_bonus", &mut ctx).unwrap().total, 3.0);
    }

    #[test]
    fn test_missing_macro() {
        let err = Registry::default()
            .process_expression("#nope", &mut ctx())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingData);
        assert_eq!(err.to_string(), "Macro 'nope' not found");
    }

    #[test]
    fn test_recursive_macro_hits_limit() {
        let mut ctx = ctx();
        ctx.define_macro("loop", "1 + #loop").unwrap();
        let err = Registry::default()
            .process_expression("#loop", &mut ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "Maximum nesting depth of 99 exceeded while expanding macro '#loop'"
        );
        assert_eq!(ctx.nesting_level, 0);

        // The context is usable again once the failed expansion has unwound.
        ctx.define_macro("two", "1 + 1").unwrap();
        let result = Registry::default()
            .process_expression("#two", &mut ctx)
            .unwrap();
        assert_eq!(result.total, 2.0);
    }

    #[test]
    fn test_extract_macros() {
        let registry = Registry::default();
        let node = registry.parse("#a + {#b, 2}").unwrap();
        assert_eq!(MacroPlugin.extract_macros(&node), vec!["a", "b"]);
    }
}
