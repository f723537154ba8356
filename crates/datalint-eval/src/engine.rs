use crate::import::{ImportContext, ImportError};
use camino::Utf8Path;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("evaluate: {0}")]
    Evaluate(String),
    #[error(transparent)]
    Import(#[from] ImportError),
}

/// An evaluator for the rule language.
///
/// The engine is opaque to the rest of datalint: it turns source into a program, and a program
/// plus a JSON top-level argument into a JSON string.
pub trait RuleEngine: Send + Sync {
    type Program: Send + Sync;

    fn parse(&self, path: &Utf8Path, source: &str) -> Result<Self::Program, EngineError>;

    /// `tla` is the JSON encoding of a [`crate::TopLevelArgument`].
    fn evaluate(
        &self,
        program: &Self::Program,
        tla: &str,
        imports: &ImportContext<'_>,
    ) -> Result<String, EngineError>;
}
