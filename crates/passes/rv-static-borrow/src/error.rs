//! Fatal pass errors
//!
//! A borrow that fails one of the promotion gates is not an error; it is left
//! as written. Everything here means the pass was misused or the input crate
//! is malformed, and aborts the whole run.

use rv_const_eval::ConstError;
use rv_span::FileSpan;
use thiserror::Error;

/// Internal invariant violations of the static borrow pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    /// A static was requested while no module was being visited
    #[error("static requested at {span} with no current module")]
    NoCurrentModule {
        /// Location of the borrowed value
        span: FileSpan,
    },

    /// Evaluating a lifted value tried to create yet another static
    #[error("evaluating `{path}` tried to allocate another static at {span}")]
    NestedAllocation {
        /// Static being evaluated
        path: String,
        /// Location of the borrow that needed storage
        span: FileSpan,
    },

    /// An expression was reached outside of any code-bearing item
    #[error("expression at {span} visited outside of a code-bearing item")]
    BareExpression {
        /// Location of the expression root
        span: FileSpan,
    },

    /// An impl names a source module that does not exist
    #[error("source module `{path}` does not exist")]
    UnknownModule {
        /// Rendered module path
        path: String,
    },

    /// A generated name is already taken in its module
    #[error("generated static `{path}` collides with an existing item")]
    DuplicateItem {
        /// Rendered item path
        path: String,
    },

    /// The evaluator rejected a lifted value
    #[error("failed to evaluate lifted value `{path}`")]
    Evaluation {
        /// Static being evaluated
        path: String,
        /// Evaluator error
        #[source]
        source: ConstError,
    },
}
