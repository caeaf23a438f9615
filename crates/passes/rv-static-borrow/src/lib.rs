//! Promotion of constant borrows to statics
//!
//! After type checking, a shared borrow of a value that is fully known at
//! compile time (`&[1, 2, 3]`, `&SOME_CONST`, `&(1, "a")`) can point at
//! read-only storage instead of a temporary. This pass finds such borrows in
//! every function body, constant, static, enum discriminant and array length,
//! moves the borrowed value into a new compiler-generated static named
//! `lifted#N` in the enclosing module, and rewrites the borrow to refer to
//! that static.
//!
//! A borrow is left alone when its operand is not constant, when its type
//! still depends on generic parameters, when it is a mutable borrow, or when
//! the borrowed type may contain interior mutability.

mod classify;
mod driver;
mod error;
mod registry;

pub use classify::{Classifier, NewStatic};
pub use driver::StaticBorrowConstants;
pub use error::PassError;
pub use registry::{StaticRegistry, lifted_name};

use indexmap::IndexMap;
use rv_hir::{Crate, SimplePath};
use rv_resolve::{StaticResolve, TypeFacts};

/// Summary of one run of the pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Borrows rewritten to point at a new static
    pub promoted: usize,
    /// New statics per module, in first-allocation order
    pub statics_per_module: IndexMap<SimplePath, usize>,
}

impl PassReport {
    /// Total number of statics added to the crate
    pub fn total_statics(&self) -> usize {
        self.statics_per_module.values().sum()
    }
}

/// Runs the pass over `krate` with facts derived from the crate itself
///
/// # Errors
///
/// Returns `PassError` if the crate is malformed or a lifted value cannot be
/// evaluated.
pub fn run(krate: &mut Crate) -> Result<PassReport, PassError> {
    let resolve = StaticResolve::new(krate);
    run_with(krate, resolve)
}

/// Runs the pass over `krate` using `resolve` for type questions
///
/// # Errors
///
/// Returns `PassError` if the crate is malformed or a lifted value cannot be
/// evaluated.
pub fn run_with<R: TypeFacts>(krate: &mut Crate, resolve: R) -> Result<PassReport, PassError> {
    StaticBorrowConstants::new(krate, resolve).run(krate)
}
