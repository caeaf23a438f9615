//! The query surface

use rv_hir::{GenericParams, Path, SimplePath, TypeRef};
use rv_span::FileSpan;

/// Three-valued answer to a type question
///
/// Ordered so that combining the answers for several components is `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Certainty {
    /// Definitely not
    No,
    /// Cannot be decided
    Maybe,
    /// Definitely
    Yes,
}

impl Certainty {
    /// Answer for a type made of parts answering `self` and `other`
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }
}

/// What a value path names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A constant, free or associated
    Constant,
    /// A function or a tuple-like constructor
    Function,
    /// A static
    Static,
    /// Nothing known
    NotFound,
}

/// Read-only facts about types and paths
///
/// Only the generic-parameter context is mutable: callers activate the
/// parameters of the impl or item they are inside of, and restore the
/// previous set (the return value) when leaving.
pub trait TypeFacts {
    /// Could values of `ty` be mutated through a shared reference
    fn type_is_interior_mutable(&self, span: FileSpan, ty: &TypeRef) -> Certainty;

    /// Whether `ty` still depends on a generic parameter
    fn type_needs_monomorph(&self, ty: &TypeRef) -> bool {
        ty.contains_generics()
    }

    /// Whether `path` still depends on a generic parameter
    fn path_needs_monomorph(&self, path: &Path) -> bool {
        path.contains_generics()
    }

    /// Kind of item `path` resolves to
    fn get_value(&self, span: FileSpan, path: &Path) -> ValueKind;

    /// Whether a module exists at `path`
    fn module_exists(&self, path: &SimplePath) -> bool;

    /// Activates impl or type-level generics, returning the previous set
    fn set_impl_generics(&mut self, params: Option<GenericParams>) -> Option<GenericParams>;

    /// Activates item-level generics, returning the previous set
    fn set_item_generics(&mut self, params: Option<GenericParams>) -> Option<GenericParams>;
}
