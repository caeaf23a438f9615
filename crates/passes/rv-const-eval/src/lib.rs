//! Compile-time constant evaluation
//!
//! Turns the initializer expression of a constant or static into an encoded
//! [`ConstValue`]. Used for:
//! - Const item initializers: `const FOO: i64 = expr;`
//! - Static initializers: `static BAR: i64 = expr;`
//! - Statics the compiler splits out of function bodies
//!
//! Borrows inside an initializer need storage of their own; the evaluator asks
//! its caller for that storage through the [`NewValue`] hook.

mod error;
mod evaluator;

pub use error::ConstError;
pub use evaluator::{Evaluator, NewValue};
pub use rv_hir::ConstValue;
