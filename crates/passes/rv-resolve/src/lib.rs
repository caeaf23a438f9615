//! Type facts for post-typecheck passes
//!
//! Passes that rewrite typed IR need to ask a few read-only questions about
//! types and paths: does a type still depend on generics, could it hide
//! interior mutability, and what kind of item does a value path name. This
//! crate provides those answers.
//!
//! # Architecture
//!
//! - **[`TypeFacts`]**: the query surface passes are written against
//! - **[`StaticResolve`]**: an owned index built from a [`rv_hir::Crate`], so
//!   the crate itself stays free to be mutated while questions are answered
//!
//! # Usage
//!
//! ```rust,ignore
//! use rv_resolve::{Certainty, StaticResolve, TypeFacts};
//!
//! let resolve = StaticResolve::new(&krate);
//! if resolve.type_is_interior_mutable(span, &ty) == Certainty::No {
//!     // safe to place in read-only storage
//! }
//! ```

pub mod facts;
pub mod static_resolve;

pub use facts::{Certainty, TypeFacts, ValueKind};
pub use static_resolve::StaticResolve;
