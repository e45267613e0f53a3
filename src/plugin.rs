//! The extension point of the interpreter.

use crate::error::DiceResult;
use crate::parse::ast::{Node, RollQuery, RollRef};
use crate::registry::Registry;
use crate::roll::{EvalContext, RollResult};

/// A pluggable syntax and evaluation handler. Every method defaults to "not provided", so a
/// plugin implements only what it contributes.
pub trait DicePlugin {
    fn name(&self) -> &'static str;

    /// Called once when the plugin is added to `registry`.
    fn register(&mut self, _registry: &Registry) {}

    /// `None` when the plugin has no grammar of its own.
    fn parse(&self, _text: &str) -> Option<DiceResult<Node>> {
        None
    }

    /// `Ok(None)` means the node is not handled by this plugin. Child nodes are evaluated
    /// through `registry` so every plugin sees them.
    fn evaluate(
        &self,
        _registry: &Registry,
        _node: &Node,
        _ctx: &mut EvalContext,
    ) -> DiceResult<Option<RollResult>> {
        Ok(None)
    }

    fn extract_queries(&self, _node: &Node) -> Vec<RollQuery> {
        Vec::new()
    }

    fn extract_macros(&self, _node: &Node) -> Vec<String> {
        Vec::new()
    }

    fn extract_tables(&self, _node: &Node) -> Vec<String> {
        Vec::new()
    }

    fn extract_rolls(&self, _node: &Node) -> Vec<RollRef> {
        Vec::new()
    }

    fn extract_formatting(&self, _node: &Node) -> Vec<String> {
        Vec::new()
    }
}
