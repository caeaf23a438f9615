//! Item paths

use crate::ty::TypeRef;
use rv_intern::Symbol;

/// Fully qualified, non-generic path to an item or module
///
/// The crate root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SimplePath {
    /// Path components, outermost first
    pub components: Vec<Symbol>,
}

impl SimplePath {
    /// The crate root
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from its components
    pub fn new(components: Vec<Symbol>) -> Self {
        Self { components }
    }

    /// Returns a new path with `name` appended
    #[must_use]
    pub fn join(&self, name: Symbol) -> Self {
        let mut components = self.components.clone();
        components.push(name);
        Self { components }
    }

    /// Final component, `None` for the root
    pub fn last(&self) -> Option<Symbol> {
        self.components.last().copied()
    }

    /// Path with the final component removed, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.components.split_last()?;
        Some(Self::new(rest.to_vec()))
    }

    /// Whether this is the crate root
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }
}

/// Generic arguments attached to a path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathParams {
    /// Type arguments
    pub types: Vec<TypeRef>,
}

impl PathParams {
    /// Arguments from a list of types
    pub fn new(types: Vec<TypeRef>) -> Self {
        Self { types }
    }

    /// Whether no arguments are present
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether any argument still mentions a generic parameter
    pub fn contains_generics(&self) -> bool {
        self.types.iter().any(TypeRef::contains_generics)
    }
}

/// Path with generic arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericPath {
    /// Item path
    pub path: SimplePath,
    /// Arguments for the item's generics
    pub params: PathParams,
}

impl GenericPath {
    /// Creates a generic path
    pub fn new(path: SimplePath, params: PathParams) -> Self {
        Self { path, params }
    }
}

impl From<SimplePath> for GenericPath {
    fn from(path: SimplePath) -> Self {
        Self::new(path, PathParams::default())
    }
}

/// Path to a value, possibly through a type
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// Plain item path (`a::b::<T>`)
    Generic(GenericPath),
    /// Inherent associated item (`<Ty>::item`)
    UfcsInherent {
        /// Self type
        ty: Box<TypeRef>,
        /// Associated item name
        item: Symbol,
        /// Arguments for the item's own generics
        params: PathParams,
    },
    /// Trait associated item (`<Ty as Trait>::item`)
    UfcsKnown {
        /// Self type
        ty: Box<TypeRef>,
        /// Trait providing the item
        trait_path: GenericPath,
        /// Associated item name
        item: Symbol,
        /// Arguments for the item's own generics
        params: PathParams,
    },
}

impl Path {
    /// Whether the path still depends on a generic parameter
    pub fn contains_generics(&self) -> bool {
        match self {
            Self::Generic(gp) => gp.params.contains_generics(),
            Self::UfcsInherent { ty, params, .. } => {
                ty.contains_generics() || params.contains_generics()
            }
            Self::UfcsKnown {
                ty,
                trait_path,
                params,
                ..
            } => {
                ty.contains_generics()
                    || trait_path.params.contains_generics()
                    || params.contains_generics()
            }
        }
    }

    /// The plain path, if this is not a UFCS path
    pub fn as_generic(&self) -> Option<&GenericPath> {
        match self {
            Self::Generic(gp) => Some(gp),
            Self::UfcsInherent { .. } | Self::UfcsKnown { .. } => None,
        }
    }
}

impl From<GenericPath> for Path {
    fn from(path: GenericPath) -> Self {
        Self::Generic(path)
    }
}

impl From<SimplePath> for Path {
    fn from(path: SimplePath) -> Self {
        Self::Generic(path.into())
    }
}
