//! The plugins registered by [`Registry::default`](crate::Registry::default).

mod dice;
mod formatting;
mod inline;
mod macros;
mod query;
mod reference;
mod tables;

pub use dice::CorePlugin;
pub use formatting::FormattingPlugin;
pub use inline::InlineRollPlugin;
pub use macros::MacroPlugin;
pub use query::QueryPlugin;
pub use reference::ReferencePlugin;
pub use tables::TablePlugin;
