//! An interpreter for tabletop dice notation such as `4d6kh3 + 2`, `{1d6,1d8}o`, `?{Bonus|0}`
//! or `[[2d6+3]] + $[[0]]`.
//!
//! Text is parsed into a [`Node`] tree and evaluated against an [`EvalContext`] by the plugins
//! held in a [`Registry`].

pub mod common;
mod error;
pub mod modifier;
pub mod parse;
mod plugin;
pub mod plugins;
mod registry;
pub mod roll;

pub use error::{DiceError, DiceResult, ErrorKind};
pub use parse::ast::Node;
pub use plugin::DicePlugin;
pub use registry::Registry;
pub use roll::{EvalConfig, EvalContext, RollResult};

/// Rolls `text` with the built-in plugins and a fresh context.
///
/// ```
/// let result = dice_interp::roll("2d6 + 3").unwrap();
/// assert_eq!(result.rolls.len(), 2);
/// assert!((5.0..=15.0).contains(&result.total));
///
/// let err = dice_interp::roll("#missing").unwrap_err();
/// assert_eq!(err.kind(), dice_interp::ErrorKind::MissingData);
/// ```
pub fn roll(text: &str) -> DiceResult<RollResult> {
    Registry::default().process_expression(text, &mut EvalContext::new())
}
