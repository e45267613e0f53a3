use crate::error::{DiceError, DiceResult};
use crate::parse::{ast::*, visit};
use crate::plugin::DicePlugin;
use crate::registry::Registry;
use crate::roll::{EvalContext, RollResult};

/// `%NAME%`: literal markup that contributes nothing to the total.
#[derive(Debug, Default, Copy, Clone)]
pub struct FormattingPlugin;

impl FormattingPlugin {
    pub fn evaluate_formatting(&self, formatting: &Formatting) -> DiceResult<RollResult> {
        let markup = if formatting.name.eq_ignore_ascii_case("NEWLINE") {
            "\n"
        } else {
            return Err(DiceError::syntax(format!(
                "Unknown markup: %{}%",
                formatting.name
            )));
        };
        let mut result = RollResult::constant(0.0);
        result.details.formatting = Some(markup.to_string());
        Ok(result)
    }
}

impl DicePlugin for FormattingPlugin {
    fn name(&self) -> &'static str {
        "formatting"
    }

    fn evaluate(
        &self,
        _: &Registry,
        node: &Node,
        _: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        match node {
            Node::Formatting(formatting) => self.evaluate_formatting(formatting).map(Some),
            _ => Ok(None),
        }
    }

    fn extract_formatting(&self, node: &Node) -> Vec<String> {
        visit::collect(node, |node| match node {
            Node::Formatting(formatting) => Some(formatting.name.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_newline() {
        let result = FormattingPlugin
            .evaluate_formatting(&Formatting {
                name: "newline".into(),
            })
            .unwrap();
        assert_eq!(result.total, 0.0);
        assert_eq!(result.details.formatting.as_deref(), Some("\n"));
    }

    #[test]
    fn test_unknown_markup() {
        let err = Registry::default()
            .process_expression("1 + %BOLD%", &mut EvalContext::seeded(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.to_string().starts_with("Unknown markup"));
    }
}
