//! Resolved types

use crate::expr::ExprPtr;
use crate::path::{GenericPath, SimplePath};
use rv_intern::Symbol;

/// Built-in scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs, reason = "Names are the types themselves")]
pub enum CoreType {
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    F32,
    F64,
    Bool,
    Char,
    Str,
}

impl CoreType {
    /// Width in bits for integer types
    pub fn int_bits(self) -> Option<u32> {
        match self {
            Self::U8 | Self::I8 => Some(8),
            Self::U16 | Self::I16 => Some(16),
            Self::U32 | Self::I32 => Some(32),
            Self::U64 | Self::I64 | Self::Usize | Self::Isize => Some(64),
            Self::U128 | Self::I128 => Some(128),
            Self::F32 | Self::F64 | Self::Bool | Self::Char | Self::Str => None,
        }
    }

    /// Whether this is a signed integer type
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::I128 | Self::Isize
        )
    }

    /// Whether this is a floating point type
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Source spelling
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Str => "str",
        }
    }
}

/// Kind of a borrow or raw pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorrowKind {
    /// `&T` / `*const T`
    Shared,
    /// `&mut T` / `*mut T`
    Unique,
}

/// Which generic parameter list a [`GenericRef`] indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericGroup {
    /// Parameters of the enclosing impl, trait or type definition
    Impl,
    /// Parameters of the item itself (function, associated constant)
    Item,
    /// The `Self` type of a trait
    SelfType,
}

/// Reference to a generic type or value parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericRef {
    /// Parameter name, for display
    pub name: Symbol,
    /// Owning parameter list
    pub group: GenericGroup,
    /// Position within that list
    pub index: u16,
}

/// Constant generic argument
#[derive(Debug, Clone, PartialEq)]
pub enum ConstGeneric {
    /// Expression not yet evaluated
    Unevaluated(Box<ExprPtr>),
    /// A value generic parameter
    Generic(GenericRef),
}

/// Length of an array type
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySize {
    /// Length already known
    Known(u64),
    /// Length still given by a constant generic
    Unevaluated(ConstGeneric),
}

/// What a nominal type path resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeBinding {
    /// A struct definition
    Struct,
    /// An enum definition
    Enum,
    /// A union definition
    Union,
    /// Not resolved to a definition
    Unbound,
}

/// A fully resolved type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    /// Built-in scalar
    Primitive(CoreType),
    /// Tuple, `()` when empty
    Tuple(Vec<TypeRef>),
    /// Nominal type
    Path {
        /// Definition path and arguments
        path: GenericPath,
        /// Kind of definition
        binding: TypeBinding,
    },
    /// Generic parameter
    Generic(GenericRef),
    /// Fixed-size array
    Array {
        /// Element type
        inner: Box<TypeRef>,
        /// Length
        size: ArraySize,
    },
    /// Dynamically sized slice
    Slice(Box<TypeRef>),
    /// Reference
    Borrow {
        /// Shared or unique
        kind: BorrowKind,
        /// Referent
        inner: Box<TypeRef>,
    },
    /// Raw pointer
    Pointer {
        /// Const or mut
        kind: BorrowKind,
        /// Pointee
        inner: Box<TypeRef>,
    },
    /// Function pointer
    Function {
        /// Argument types
        args: Vec<TypeRef>,
        /// Return type
        ret: Box<TypeRef>,
    },
    /// `dyn Trait`
    TraitObject {
        /// Principal trait
        trait_path: GenericPath,
    },
    /// `!`
    Diverge,
}

impl TypeRef {
    /// `()`
    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    /// Nominal struct type
    pub fn new_struct(path: GenericPath) -> Self {
        Self::Path {
            path,
            binding: TypeBinding::Struct,
        }
    }

    /// `&T` or `&mut T`
    pub fn new_borrow(kind: BorrowKind, inner: Self) -> Self {
        Self::Borrow {
            kind,
            inner: Box::new(inner),
        }
    }

    /// `[T; N]` with a known length
    pub fn new_array(inner: Self, len: u64) -> Self {
        Self::Array {
            inner: Box::new(inner),
            size: ArraySize::Known(len),
        }
    }

    /// `[T]`
    pub fn new_slice(inner: Self) -> Self {
        Self::Slice(Box::new(inner))
    }

    /// Whether the type still depends on an unresolved generic parameter
    ///
    /// Unevaluated array-size expressions are concrete; only a size naming a
    /// value parameter counts as generic.
    pub fn contains_generics(&self) -> bool {
        match self {
            Self::Generic(_) => true,
            Self::Primitive(_) | Self::Diverge => false,
            Self::Tuple(elements) => elements.iter().any(Self::contains_generics),
            Self::Path { path, .. } | Self::TraitObject { trait_path: path } => {
                path.params.contains_generics()
            }
            Self::Array { inner, size } => {
                matches!(size, ArraySize::Unevaluated(ConstGeneric::Generic(_)))
                    || inner.contains_generics()
            }
            Self::Slice(inner) | Self::Borrow { inner, .. } | Self::Pointer { inner, .. } => {
                inner.contains_generics()
            }
            Self::Function { args, ret } => {
                args.iter().any(Self::contains_generics) || ret.contains_generics()
            }
        }
    }

    /// Path of a nominal type
    pub fn type_path(&self) -> Option<&SimplePath> {
        match self {
            Self::Path { path, .. } => Some(&path.path),
            _ => None,
        }
    }
}

/// Declaration of a generic type parameter
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDef {
    /// Parameter name
    pub name: Symbol,
    /// Trait bounds declared on the parameter
    pub bounds: Vec<SimplePath>,
}

/// Declaration of a generic value parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ValueParamDef {
    /// Parameter name
    pub name: Symbol,
    /// Parameter type
    pub ty: TypeRef,
}

/// Generic parameter list of an item, impl or type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenericParams {
    /// Type parameters
    pub types: Vec<TypeParamDef>,
    /// Value parameters
    pub values: Vec<ValueParamDef>,
}

impl GenericParams {
    /// Whether no parameters are declared
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.values.is_empty()
    }

    /// Type parameter at `index`
    pub fn type_param(&self, index: u16) -> Option<&TypeParamDef> {
        self.types.get(usize::from(index))
    }
}
