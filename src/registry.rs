use crate::error::{DiceError, DiceResult, ErrorKind};
use crate::parse::{ast::*, index_inline_rolls};
use crate::plugin::DicePlugin;
use crate::plugins::*;
use crate::roll::{EvalContext, Extracted, RollResult};
use tracing::{debug, trace};

/// An ordered list of plugins. Parsing and evaluation ask each plugin in registration order.
pub struct Registry {
    plugins: Vec<Box<dyn DicePlugin>>,
}

impl Registry {
    /// A registry with no plugins at all. See [`Registry::default`] for the built-in set.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: impl DicePlugin + 'static) {
        let mut plugin = Box::new(plugin);
        plugin.register(self);
        debug!(plugin = plugin.name(), "registered plugin");
        self.plugins.push(plugin);
    }

    pub fn with(mut self, plugin: impl DicePlugin + 'static) -> Self {
        self.register(plugin);
        self
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Parses with the first plugin that accepts `text`, then numbers its inline rolls.
    ///
    /// Input that a plugin understood but refused for exceeding a limit fails with that
    /// plugin's `Validation` error.
    pub fn parse(&self, text: &str) -> DiceResult<Node> {
        let mut last_error = None;
        for plugin in &self.plugins {
            match plugin.parse(text) {
                Some(Ok(mut node)) => {
                    trace!(plugin = plugin.name(), "parsed input");
                    index_inline_rolls(&mut node);
                    return Ok(node);
                }
                Some(Err(e)) if e.kind() == ErrorKind::Validation => return Err(e),
                Some(Err(e)) => {
                    trace!(plugin = plugin.name(), error = %e, "plugin failed to parse input");
                    last_error = Some(e);
                }
                None => {}
            }
        }
        Err(DiceError::Unparseable {
            source: last_error.map(Box::new),
        })
    }

    /// Evaluates `node` with the first plugin that produces a result.
    ///
    /// A plugin error does not stop dispatch. If no plugin produces a result the first error
    /// is returned. Fails with `Validation` once evaluation nests deeper than
    /// [`EvalConfig::max_depth`](crate::EvalConfig::max_depth).
    pub fn evaluate(&self, node: &Node, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        ctx.enter()?;
        let result = self.dispatch(node, ctx);
        ctx.leave();
        result
    }

    fn dispatch(&self, node: &Node, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        let mut first_error = None;
        for plugin in &self.plugins {
            match plugin.evaluate(self, node, ctx) {
                Ok(Some(result)) => {
                    trace!(plugin = plugin.name(), node = node.kind(), total = result.total);
                    return Ok(result);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(plugin = plugin.name(), node = node.kind(), error = %e);
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| {
            DiceError::syntax(format!("Unable to evaluate node type: {}", node.kind()))
        }))
    }

    pub fn extract_queries(&self, node: &Node) -> Vec<RollQuery> {
        self.plugins
            .iter()
            .flat_map(|p| p.extract_queries(node))
            .collect()
    }

    pub fn extract_macros(&self, node: &Node) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.extract_macros(node))
            .collect()
    }

    pub fn extract_tables(&self, node: &Node) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.extract_tables(node))
            .collect()
    }

    pub fn extract_rolls(&self, node: &Node) -> Vec<RollRef> {
        self.plugins
            .iter()
            .flat_map(|p| p.extract_rolls(node))
            .collect()
    }

    pub fn extract_formatting(&self, node: &Node) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.extract_formatting(node))
            .collect()
    }

    pub fn extract(&self, node: &Node) -> Extracted {
        Extracted {
            queries: self.extract_queries(node),
            macros: self.extract_macros(node),
            tables: self.extract_tables(node),
            rolls: self.extract_rolls(node),
            formatting: self.extract_formatting(node),
        }
    }

    /// Parse, extract and evaluate in one go. The extraction lists end up in
    /// `details.extracted`.
    pub fn process_expression(&self, text: &str, ctx: &mut EvalContext) -> DiceResult<RollResult> {
        let node = self.parse(text)?;
        let extracted = self.extract(&node);
        let mut result = self.evaluate(&node, ctx)?;
        result.details.extracted = Some(extracted);
        debug!(text, total = result.total, "processed expression");
        Ok(result)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
            .with(CorePlugin)
            .with(MacroPlugin)
            .with(TablePlugin)
            .with(QueryPlugin)
            .with(ReferencePlugin)
            .with(InlineRollPlugin)
            .with(FormattingPlugin)
    }
}
