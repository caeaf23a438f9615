//! Expression constructors for hand-built fixtures
//!
//! Every node gets the generated span and a type derived from its operands,
//! the way type checking would have annotated it.

use rv_hir::{
    BinOp, BorrowKind, CoreType, ExprKind, ExprNode, ExprNodeP, ExprPtr, ExprStage, ExprState, GenericPath,
    Literal, Path, PathValueTarget, SimplePath, TypeRef,
};
use rv_intern::Symbol;
use rv_span::FileSpan;

fn node(kind: ExprKind, ty: TypeRef) -> ExprNodeP {
    ExprNode::boxed(kind, ty, FileSpan::generated())
}

/// Integer literal of type `ty`
pub fn int(value: u128, ty: CoreType) -> ExprNodeP {
    node(ExprKind::Literal(Literal::Integer(value)), TypeRef::Primitive(ty))
}

/// `true` / `false`
pub fn boolean(value: bool) -> ExprNodeP {
    node(ExprKind::Literal(Literal::Bool(value)), TypeRef::Primitive(CoreType::Bool))
}

/// `[a, b, c]`, typed from the first element
pub fn array(items: Vec<ExprNodeP>) -> ExprNodeP {
    let inner = items.first().map_or_else(TypeRef::unit, |first| first.ty.clone());
    let ty = TypeRef::new_array(inner, items.len() as u64);
    node(ExprKind::ArrayList(items), ty)
}

/// `[value; size]`
pub fn repeat(value: ExprNodeP, size: u64) -> ExprNodeP {
    let ty = TypeRef::new_array(value.ty.clone(), size);
    node(ExprKind::ArraySized { value, size }, ty)
}

/// `(a, b)`
pub fn tuple(items: Vec<ExprNodeP>) -> ExprNodeP {
    let ty = TypeRef::Tuple(items.iter().map(|item| item.ty.clone()).collect());
    node(ExprKind::Tuple(items), ty)
}

/// `&value`
pub fn borrow(value: ExprNodeP) -> ExprNodeP {
    let ty = TypeRef::new_borrow(BorrowKind::Shared, value.ty.clone());
    node(ExprKind::Borrow { kind: BorrowKind::Shared, value }, ty)
}

/// `&mut value`
pub fn borrow_mut(value: ExprNodeP) -> ExprNodeP {
    let ty = TypeRef::new_borrow(BorrowKind::Unique, value.ty.clone());
    node(ExprKind::Borrow { kind: BorrowKind::Unique, value }, ty)
}

/// Array-to-slice coercion of `value`
pub fn unsize_to_slice(value: ExprNodeP) -> ExprNodeP {
    let inner = match &value.ty {
        TypeRef::Array { inner, .. } => (**inner).clone(),
        other => other.clone(),
    };
    node(ExprKind::Unsize { value }, TypeRef::new_slice(inner))
}

/// `value as ty`
pub fn cast(value: ExprNodeP, ty: CoreType) -> ExprNodeP {
    node(ExprKind::Cast { value }, TypeRef::Primitive(ty))
}

/// `value.field`
pub fn field(value: ExprNodeP, field: Symbol, ty: TypeRef) -> ExprNodeP {
    node(ExprKind::Field { value, field }, ty)
}

/// Named value of type `ty`
pub fn path_value(path: impl Into<Path>, ty: TypeRef, target: PathValueTarget) -> ExprNodeP {
    node(
        ExprKind::PathValue {
            path: path.into(),
            target,
        },
        ty,
    )
}

/// Local variable read
pub fn variable(name: Symbol, slot: u32, ty: TypeRef) -> ExprNodeP {
    node(ExprKind::Variable { name, slot }, ty)
}

/// `{ nodes; value }`
pub fn block(nodes: Vec<ExprNodeP>, value: Option<ExprNodeP>) -> ExprNodeP {
    let ty = value.as_ref().map_or_else(TypeRef::unit, |value| value.ty.clone());
    node(ExprKind::Block { nodes, value }, ty)
}

/// `left op right`, typed as `left`
pub fn binop(op: BinOp, left: ExprNodeP, right: ExprNodeP) -> ExprNodeP {
    let ty = left.ty.clone();
    node(ExprKind::BinOp { op, left, right }, ty)
}

/// `Path { fields }` of type `ty`
pub fn struct_literal(path: GenericPath, fields: Vec<(Symbol, ExprNodeP)>, ty: TypeRef) -> ExprNodeP {
    node(
        ExprKind::StructLiteral {
            path,
            base: None,
            fields,
        },
        ty,
    )
}

/// `path(args)` returning `ret`
pub fn call(path: impl Into<Path>, args: Vec<ExprNodeP>, ret: TypeRef) -> ExprNodeP {
    node(
        ExprKind::CallPath {
            path: path.into(),
            args,
        },
        ret,
    )
}

/// Expression root owned by `module`, as left by the expansion stage
pub fn root(node: ExprNodeP, module: &SimplePath) -> ExprPtr {
    let mut state = ExprState::new(module.clone());
    state.stage = ExprStage::Expand;
    ExprPtr::from_boxed(node, Some(state))
}
