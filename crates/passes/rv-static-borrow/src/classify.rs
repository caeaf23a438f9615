//! Bottom-up constant classification of one expression tree
//!
//! Every node answers one question for its parent: is the value it produces
//! fully known at compile time? Leaves answer directly, composite nodes answer
//! "yes" when all of their children did, and everything else answers "no".
//! A shared borrow whose operand is constant has that operand moved into a
//! new static and replaced by a path to it, after which the borrow itself
//! counts as constant.

use crate::error::PassError;
use rv_hir::visit::walk_node;
use rv_hir::{
    BorrowKind, ExprKind, ExprNode, ExprNodeP, ExprPtr, ExprState, ExprVisitor, Path, PathValueTarget,
    SimplePath, TypeRef,
};
use rv_resolve::{Certainty, TypeFacts, ValueKind};
use rv_span::FileSpan;
use std::mem;
use tracing::{debug, trace};

/// Receives values lifted out of an expression tree
pub trait NewStatic {
    /// Stores `value` of type `ty` as a new static, returning its path
    ///
    /// # Errors
    ///
    /// Returns `PassError` if no static can be created at this point.
    fn new_static(&mut self, span: FileSpan, ty: TypeRef, value: ExprPtr) -> Result<SimplePath, PassError>;
}

/// Classifier for a single expression root
pub struct Classifier<'pass, R: TypeFacts + ?Sized> {
    resolve: &'pass R,
    statics: &'pass mut dyn NewStatic,
    /// State given to every lifted value
    lifted_state: Option<ExprState>,
    /// Answer of the node visited last
    is_constant: bool,
    /// Whether every child of the innermost open composite was constant
    all_constant: bool,
    promoted: usize,
}

impl<'pass, R: TypeFacts + ?Sized> Classifier<'pass, R> {
    /// Creates a classifier sending lifted values to `statics`
    pub fn new(resolve: &'pass R, statics: &'pass mut dyn NewStatic, lifted_state: Option<ExprState>) -> Self {
        Self {
            resolve,
            statics,
            lifted_state,
            is_constant: false,
            all_constant: true,
            promoted: 0,
        }
    }

    /// Classifies `root`, promoting borrows in place
    ///
    /// Returns whether the root value itself is constant.
    ///
    /// # Errors
    ///
    /// Propagates errors from the [`NewStatic`] sink.
    pub fn visit_root(&mut self, root: &mut ExprPtr) -> Result<bool, PassError> {
        self.is_constant = false;
        self.all_constant = true;
        self.visit_node(&mut root.node)?;
        Ok(self.is_constant)
    }

    /// Number of borrows promoted so far
    pub fn promoted(&self) -> usize {
        self.promoted
    }

    fn path_is_constant(&self, span: FileSpan, path: &Path) -> bool {
        match self.resolve.get_value(span, path) {
            ValueKind::Constant | ValueKind::Function => {
                if self.resolve.path_needs_monomorph(path) {
                    trace!("value path still depends on generics");
                    false
                } else {
                    true
                }
            }
            ValueKind::Static | ValueKind::NotFound => false,
        }
    }

    fn visit_composite(&mut self, node: &mut ExprNode) -> Result<(), PassError> {
        let saved = mem::replace(&mut self.all_constant, true);
        walk_node(self, node)?;
        self.is_constant = self.all_constant;
        self.all_constant = saved;
        Ok(())
    }

    fn visit_opaque(&mut self, node: &mut ExprNode) -> Result<(), PassError> {
        let saved = mem::replace(&mut self.all_constant, true);
        walk_node(self, node)?;
        self.all_constant = saved;
        self.is_constant = false;
        Ok(())
    }

    fn visit_borrow(&mut self, node: &mut ExprNode) -> Result<(), PassError> {
        let saved = mem::replace(&mut self.all_constant, true);
        walk_node(self, node)?;
        self.is_constant = self.all_constant && self.promote_borrow(node)?;
        self.all_constant = saved;
        Ok(())
    }

    fn promote_borrow(&mut self, node: &mut ExprNode) -> Result<bool, PassError> {
        let ExprKind::Borrow { kind, value } = &mut node.kind else {
            return Ok(false);
        };
        let kind = *kind;
        match &mut value.kind {
            ExprKind::Unsize { value: inner } => self.promote_slot(kind, inner),
            _ => self.promote_slot(kind, value),
        }
    }

    /// Moves the value in `slot` into a new static if every gate allows it
    fn promote_slot(&mut self, kind: BorrowKind, slot: &mut ExprNodeP) -> Result<bool, PassError> {
        let span = slot.span;
        if self.resolve.type_needs_monomorph(&slot.ty) {
            debug!(%span, "not promoting borrow of a generic type");
            return Ok(false);
        }
        if kind != BorrowKind::Shared {
            debug!(%span, "not promoting mutable borrow");
            return Ok(false);
        }
        let interior = self.resolve.type_is_interior_mutable(span, &slot.ty);
        if interior != Certainty::No {
            debug!(%span, ?interior, "not promoting borrow of interior-mutable type");
            return Ok(false);
        }

        let ty = slot.ty.clone();
        let value = mem::replace(slot, ExprNode::boxed(ExprKind::Tuple(Vec::new()), TypeRef::unit(), span));
        trace!(%span, kind = value.kind_name(), "lifting value");
        let root = ExprPtr::from_boxed(value, self.lifted_state.clone());
        let path = self.statics.new_static(span, ty.clone(), root)?;
        **slot = ExprNode::new(
            ExprKind::PathValue {
                path: path.into(),
                target: PathValueTarget::Static,
            },
            ty,
            span,
        );
        self.promoted += 1;
        Ok(true)
    }
}

impl<R: TypeFacts + ?Sized> ExprVisitor for Classifier<'_, R> {
    type Error = PassError;

    fn visit_node_ptr(&mut self, node: &mut ExprNodeP) -> Result<(), PassError> {
        self.is_constant = false;
        self.visit_node(node)?;
        if !self.is_constant {
            self.all_constant = false;
        }
        self.is_constant = false;
        Ok(())
    }

    fn visit_node(&mut self, node: &mut ExprNode) -> Result<(), PassError> {
        match &node.kind {
            ExprKind::Literal(_) | ExprKind::UnitVariant { .. } => {
                self.is_constant = true;
                Ok(())
            }
            ExprKind::PathValue { path, .. } => {
                self.is_constant = self.path_is_constant(node.span, path);
                Ok(())
            }
            ExprKind::Tuple(_)
            | ExprKind::TupleVariant { .. }
            | ExprKind::ArrayList(_)
            | ExprKind::ArraySized { .. }
            | ExprKind::StructLiteral { .. }
            | ExprKind::Field { .. }
            | ExprKind::Cast { .. }
            | ExprKind::Unsize { .. } => self.visit_composite(node),
            ExprKind::Borrow { .. } => self.visit_borrow(node),
            ExprKind::Variable { .. }
            | ExprKind::Let { .. }
            | ExprKind::Block { .. }
            | ExprKind::BinOp { .. }
            | ExprKind::UniOp { .. }
            | ExprKind::Deref { .. }
            | ExprKind::Index { .. }
            | ExprKind::CallPath { .. }
            | ExprKind::CallValue { .. }
            | ExprKind::If { .. }
            | ExprKind::Assign { .. }
            | ExprKind::Return(_) => self.visit_opaque(node),
        }
    }
}
