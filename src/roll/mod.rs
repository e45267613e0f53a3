mod ctx;
mod dice;
mod result;
pub(crate) mod roller;

pub use ctx::{EvalConfig, EvalContext, StoredRoll, TableEntry, TableValue};
pub use dice::DieSource;
pub use result::*;
pub use roller::Roller;
