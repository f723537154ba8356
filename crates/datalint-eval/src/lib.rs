//! Rule evaluation.
//!
//! Every lint file of a target runs against every data file of that target through a
//! [`RuleEngine`]. Failures are isolated to the `(rule, data file)` pair that caused them.

#![forbid(unsafe_code)]

mod data;
mod engine;
mod evaluate;
mod import;
mod node;
mod output;

pub use data::{DataError, decode_data_file};
pub use engine::{EngineError, RuleEngine};
pub use evaluate::{TopLevelArgument, evaluate_targets};
pub use import::{
    ImportChain, ImportContext, ImportError, ImportStrategy, ModuleCacheImport, RelativeImport,
};
pub use node::RuleNode;
pub use output::RuleOutput;
