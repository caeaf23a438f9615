//! Evaluated constant values

use crate::path::{Path, SimplePath};
use rv_intern::Symbol;

/// A compile-time constant value, as stored on evaluated statics and constants
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer constant, already truncated to its type
    Int(i128),
    /// `u128` constant above `i128::MAX`
    ///
    /// Smaller values always use [`ConstValue::Int`]; build through
    /// [`ConstValue::from_u128`] to keep the encoding canonical.
    UInt(u128),
    /// Floating-point constant
    Float(f64),
    /// Boolean constant
    Bool(bool),
    /// Character constant
    Char(char),
    /// String constant
    String(String),
    /// Byte string constant
    Bytes(Vec<u8>),
    /// Unit constant (())
    Unit,
    /// Tuple constant
    Tuple(Vec<ConstValue>),
    /// Struct constant with named fields
    Struct {
        /// Field values
        fields: Vec<(Symbol, ConstValue)>,
    },
    /// Enum variant
    Variant {
        /// Variant path
        path: SimplePath,
        /// Field values
        fields: Vec<ConstValue>,
    },
    /// Array constant
    Array(Vec<ConstValue>),
    /// Array of `len` copies of one value
    Repeat {
        /// Element value
        value: Box<ConstValue>,
        /// Number of elements
        len: u64,
    },
    /// Address of a static
    Ref(SimplePath),
    /// Address of a function
    FnPtr(Path),
}

impl ConstValue {
    /// Unsigned integer in canonical form
    #[must_use]
    pub fn from_u128(value: u128) -> Self {
        i128::try_from(value).map_or(Self::UInt(value), Self::Int)
    }

    /// Returns true if this is an integer value
    #[must_use]
    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_) | Self::UInt(_))
    }

    /// Returns the value as an unsigned integer, if it is a non-negative integer
    #[must_use]
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::Int(value) => u128::try_from(*value).ok(),
            Self::UInt(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer value if this is an integer
    #[must_use]
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float value if this is a float
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the target of a static reference
    #[must_use]
    pub fn as_ref_target(&self) -> Option<&SimplePath> {
        match self {
            Self::Ref(path) => Some(path),
            _ => None,
        }
    }

    /// Human-readable kind, for error messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Char(_) => "char",
            Self::String(_) => "str",
            Self::Bytes(_) => "byte string",
            Self::Unit => "()",
            Self::Tuple(_) => "tuple",
            Self::Struct { .. } => "struct",
            Self::Variant { .. } => "variant",
            Self::Array(_) | Self::Repeat { .. } => "array",
            Self::Ref(_) => "reference",
            Self::FnPtr(_) => "function pointer",
        }
    }
}
