//! Typed high-level IR
//!
//! The representation produced by type checking: a crate is a tree of modules
//! holding items, and every code-bearing item owns expression trees whose
//! nodes carry a resolved type and a span. Later passes rewrite these trees in
//! place through the visitors in [`visit`].

pub mod expr;
pub mod item;
pub mod path;
pub mod pretty;
pub mod ty;
pub mod value;
pub mod visit;

pub use expr::{
    BinOp, ExprKind, ExprNode, ExprNodeP, ExprPtr, ExprStage, ExprState, Literal, PathValueTarget, UniOp,
};
pub use item::{
    Constant, Crate, DataVariant, Enum, EnumData, Function, Linkage, Module, Publicity, Static, Struct,
    StructData, Trait, TraitImpl, TraitValueItem, TypeAlias, TypeImpl, TypeItem, Union, ValueItem,
    ValueVariant, VisEnt,
};
pub use path::{GenericPath, Path, PathParams, SimplePath};
pub use pretty::HirPrinter;
pub use ty::{
    ArraySize, BorrowKind, ConstGeneric, CoreType, GenericGroup, GenericParams, GenericRef, TypeBinding,
    TypeParamDef, TypeRef, ValueParamDef,
};
pub use value::ConstValue;
pub use visit::{ExprVisitor, Visitor};
