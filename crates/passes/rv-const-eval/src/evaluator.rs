//! Const expression evaluator

use crate::ConstError;
use rv_hir::{
    BinOp, BorrowKind, ConstValue, CoreType, Crate, ExprKind, ExprNode, ExprNodeP, ExprPtr, GenericPath,
    HirPrinter, Literal, Path, SimplePath, Struct, StructData, TraitValueItem, TypeItem, TypeRef, UniOp,
    ValueItem,
};
use rv_intern::Symbol;
use rv_span::FileSpan;
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Deepest chain of constants whose initializers are evaluated on demand
const MAX_DEPTH: u32 = 64;

/// Longest chain of re-exports followed when resolving a value
const MAX_IMPORT_DEPTH: u32 = 16;

/// Storage for values that need an address
///
/// Evaluating `&expr` produces a reference, so the referent must live in a
/// static somewhere. The evaluator hands such values to its caller, which
/// decides where (and whether) to put them.
pub trait NewValue {
    /// Allocates a static of type `ty` holding `value`, returning its path
    ///
    /// # Errors
    ///
    /// Returns [`ConstError::NewStaticRefused`] when the caller does not
    /// allow new statics at this point.
    fn new_static(&mut self, span: FileSpan, ty: TypeRef, value: ConstValue) -> Result<SimplePath, ConstError>;
}

/// Const expression evaluator
///
/// Evaluates typed expressions at compile-time to produce const values.
/// Other constants and statics are read from the crate, using their evaluated
/// value when one is stored and evaluating their initializer otherwise.
pub struct Evaluator<'krate, 'hook> {
    /// Location reported for compiler-made nodes
    span: FileSpan,
    krate: &'krate Crate,
    new_values: &'hook mut dyn NewValue,
    /// Constants currently being evaluated on demand
    depth: u32,
}

impl<'krate, 'hook> Evaluator<'krate, 'hook> {
    /// Creates an evaluator reading items from `krate`
    ///
    /// `span` is used for errors on nodes that have no source location.
    pub fn new(span: FileSpan, krate: &'krate Crate, new_values: &'hook mut dyn NewValue) -> Self {
        Self {
            span,
            krate,
            new_values,
            depth: 0,
        }
    }

    /// Evaluates the initializer `expr` of the item at `path`, declared as `ty`
    ///
    /// # Errors
    ///
    /// Returns `ConstError` if:
    /// - The expression is not a constant expression
    /// - Division by zero or integer overflow occurs
    /// - Operand types do not match an operation
    /// - A borrow needs storage and the [`NewValue`] hook refuses it
    pub fn evaluate_constant(
        &mut self,
        path: &SimplePath,
        expr: &ExprPtr,
        ty: &TypeRef,
    ) -> Result<ConstValue, ConstError> {
        trace!(path = %HirPrinter::new(&self.krate.interner).simple_path(path), "evaluating constant");
        let value = self.eval(&expr.node)?;
        Ok(coerce(value, ty))
    }

    fn span_of(&self, node: &ExprNode) -> FileSpan {
        if node.span.is_generated() { self.span } else { node.span }
    }

    fn eval(&mut self, node: &ExprNode) -> Result<ConstValue, ConstError> {
        let span = self.span_of(node);
        match &node.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal, &node.ty)),
            ExprKind::UnitVariant { path, is_struct } => Ok(if *is_struct {
                ConstValue::Struct { fields: Vec::new() }
            } else {
                ConstValue::Variant {
                    path: path.path.clone(),
                    fields: Vec::new(),
                }
            }),
            ExprKind::PathValue { path, .. } => self.eval_path(path, span),
            ExprKind::Tuple(items) => Ok(ConstValue::Tuple(self.eval_all(items)?)),
            ExprKind::TupleVariant { path, is_struct, args } => {
                let values = self.eval_all(args)?;
                if *is_struct {
                    let interner = &self.krate.interner;
                    let fields = values
                        .into_iter()
                        .enumerate()
                        .map(|(index, value)| (interner.intern(&index.to_string()), value))
                        .collect();
                    Ok(ConstValue::Struct { fields })
                } else {
                    Ok(ConstValue::Variant {
                        path: path.path.clone(),
                        fields: values,
                    })
                }
            }
            ExprKind::ArrayList(items) => Ok(ConstValue::Array(self.eval_all(items)?)),
            ExprKind::ArraySized { value, size } => Ok(ConstValue::Repeat {
                value: Box::new(self.eval(value)?),
                len: *size,
            }),
            ExprKind::StructLiteral { path, base, fields } => {
                self.eval_struct_literal(path, base.as_deref(), fields, span)
            }
            ExprKind::Field { value, field } => {
                let base = self.eval(value)?;
                self.project(base, *field, span)
            }
            ExprKind::Cast { value } => {
                let operand = self.eval(value)?;
                cast(operand, &node.ty, span)
            }
            ExprKind::Unsize { value } => self.eval(value),
            ExprKind::Borrow { kind, value } => self.eval_borrow(*kind, value, span),
            ExprKind::BinOp { op, left, right } => self.eval_binary(*op, left, right, &node.ty, span),
            ExprKind::UniOp { op, value } => {
                let operand = self.eval(value)?;
                eval_unary(*op, operand, &node.ty, span)
            }
            ExprKind::Block { nodes, value } => {
                if !nodes.is_empty() {
                    return Err(ConstError::UnsupportedOperation {
                        operation: "block with statements".to_owned(),
                        span,
                    });
                }
                match value {
                    Some(value) => self.eval(value),
                    None => Ok(ConstValue::Unit),
                }
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_val = self.eval(cond)?;
                let cond_bool = cond_val.as_bool().ok_or_else(|| ConstError::TypeMismatch {
                    expected: "bool".to_owned(),
                    got: cond_val.kind_name().to_owned(),
                    span,
                })?;
                if cond_bool {
                    self.eval(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch)
                } else {
                    Ok(ConstValue::Unit)
                }
            }
            ExprKind::Variable { .. }
            | ExprKind::Let { .. }
            | ExprKind::Deref { .. }
            | ExprKind::Index { .. }
            | ExprKind::CallPath { .. }
            | ExprKind::CallValue { .. }
            | ExprKind::Assign { .. }
            | ExprKind::Return(_) => Err(ConstError::NonConstExpr { span }),
        }
    }

    fn eval_all(&mut self, items: &[ExprNodeP]) -> Result<Vec<ConstValue>, ConstError> {
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn render(&self, path: &Path) -> String {
        HirPrinter::new(&self.krate.interner).path(path)
    }

    /// Finds the value item at `path`, following re-exports
    fn lookup_value(&self, path: &SimplePath) -> Option<(SimplePath, &'krate ValueItem)> {
        let krate = self.krate;
        let mut current = path.clone();
        for _ in 0..MAX_IMPORT_DEPTH {
            match krate.get_value_by_path(&current)? {
                ValueItem::Import(target) => current = target.clone(),
                item => return Some((current, item)),
            }
        }
        None
    }

    fn eval_path(&mut self, path: &Path, span: FileSpan) -> Result<ConstValue, ConstError> {
        let krate = self.krate;
        match path {
            Path::Generic(gp) => match self.lookup_value(&gp.path) {
                Some((_, ValueItem::Function(_))) => Ok(ConstValue::FnPtr(path.clone())),
                Some((resolved, ValueItem::Constant(constant))) => self.eval_item(
                    &resolved.into(),
                    constant.value.as_ref(),
                    constant.value_res.as_ref(),
                    &constant.ty,
                    span,
                ),
                Some((resolved, ValueItem::Static(item))) => {
                    if item.is_mut {
                        return Err(ConstError::UnsupportedOperation {
                            operation: format!("read of mutable static `{}`", self.render(path)),
                            span,
                        });
                    }
                    self.eval_item(
                        &resolved.into(),
                        item.value.as_ref(),
                        item.value_res.as_ref(),
                        &item.ty,
                        span,
                    )
                }
                Some((_, ValueItem::Import(_))) | None => Err(ConstError::UnknownPath {
                    path: self.render(path),
                    span,
                }),
            },
            Path::UfcsInherent { ty, item, .. } => {
                for imp in krate.type_impls.iter().filter(|imp| imp.ty == **ty) {
                    if let Some(constant) = imp.constants.get(item) {
                        return self.eval_item(
                            path,
                            constant.value.as_ref(),
                            constant.value_res.as_ref(),
                            &constant.ty,
                            span,
                        );
                    }
                    if imp.methods.contains_key(item) {
                        return Ok(ConstValue::FnPtr(path.clone()));
                    }
                }
                Err(ConstError::UnknownPath {
                    path: self.render(path),
                    span,
                })
            }
            Path::UfcsKnown {
                ty,
                trait_path,
                item,
                ..
            } => {
                let impls = krate
                    .trait_impls
                    .iter()
                    .filter(|imp| imp.trait_path == trait_path.path && imp.ty == **ty);
                for imp in impls {
                    if let Some(constant) = imp.constants.get(item) {
                        return self.eval_item(
                            path,
                            constant.value.as_ref(),
                            constant.value_res.as_ref(),
                            &constant.ty,
                            span,
                        );
                    }
                    if let Some(assoc) = imp.statics.get(item) {
                        return self.eval_item(
                            path,
                            assoc.value.as_ref(),
                            assoc.value_res.as_ref(),
                            &assoc.ty,
                            span,
                        );
                    }
                    if imp.methods.contains_key(item) {
                        return Ok(ConstValue::FnPtr(path.clone()));
                    }
                }
                // Fall back to the default the trait provides
                match krate.get_typeitem_by_path(&trait_path.path) {
                    Some(TypeItem::Trait(def)) => match def.values.get(item) {
                        Some(TraitValueItem::Constant(constant)) => self.eval_item(
                            path,
                            constant.value.as_ref(),
                            constant.value_res.as_ref(),
                            &constant.ty,
                            span,
                        ),
                        Some(TraitValueItem::Function(_)) => Ok(ConstValue::FnPtr(path.clone())),
                        Some(TraitValueItem::Static(_)) | None => Err(ConstError::UnknownPath {
                            path: self.render(path),
                            span,
                        }),
                    },
                    _ => Err(ConstError::UnknownPath {
                        path: self.render(path),
                        span,
                    }),
                }
            }
        }
    }

    /// Value of a constant or static, evaluating its initializer if needed
    fn eval_item(
        &mut self,
        path: &Path,
        value: Option<&ExprPtr>,
        value_res: Option<&ConstValue>,
        ty: &TypeRef,
        span: FileSpan,
    ) -> Result<ConstValue, ConstError> {
        if let Some(done) = value_res {
            return Ok(done.clone());
        }
        let Some(expr) = value else {
            return Err(ConstError::UnknownPath {
                path: self.render(path),
                span,
            });
        };
        if self.depth >= MAX_DEPTH {
            return Err(ConstError::RecursionLimit {
                path: self.render(path),
                span,
            });
        }
        self.depth += 1;
        let result = self.eval(&expr.node);
        self.depth -= 1;
        result.map(|value| coerce(value, ty))
    }

    fn eval_borrow(&mut self, kind: BorrowKind, value: &ExprNode, span: FileSpan) -> Result<ConstValue, ConstError> {
        if kind == BorrowKind::Unique {
            return Err(ConstError::UnsupportedOperation {
                operation: "mutable borrow".to_owned(),
                span,
            });
        }
        let target = match &value.kind {
            ExprKind::Unsize { value: inner } => &**inner,
            _ => value,
        };
        if let ExprKind::PathValue {
            path: Path::Generic(gp),
            ..
        } = &target.kind
            && let Some((resolved, ValueItem::Static(_))) = self.lookup_value(&gp.path)
        {
            return Ok(ConstValue::Ref(resolved));
        }

        let stored = self.eval(target)?;
        let path = self.new_values.new_static(span, target.ty.clone(), stored)?;
        debug!(
            path = %HirPrinter::new(&self.krate.interner).simple_path(&path),
            "allocated static for borrowed value"
        );
        Ok(ConstValue::Ref(path))
    }

    fn eval_struct_literal(
        &mut self,
        path: &GenericPath,
        base: Option<&ExprNode>,
        fields: &[(Symbol, ExprNodeP)],
        span: FileSpan,
    ) -> Result<ConstValue, ConstError> {
        let mut values = match base {
            Some(base) => match self.eval(base)? {
                ConstValue::Struct { fields } => fields,
                other => {
                    return Err(ConstError::TypeMismatch {
                        expected: "struct".to_owned(),
                        got: other.kind_name().to_owned(),
                        span,
                    });
                }
            },
            None => Vec::new(),
        };
        for (name, expr) in fields {
            let value = self.eval(expr)?;
            match values.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = value,
                None => values.push((*name, value)),
            }
        }

        let krate = self.krate;
        let owner = path
            .path
            .parent()
            .and_then(|parent| krate.get_typeitem_by_path(&parent));
        if let Some(TypeItem::Enum(_)) = owner {
            return Ok(ConstValue::Variant {
                path: path.path.clone(),
                fields: values.into_iter().map(|(_, value)| value).collect(),
            });
        }
        if let Some(TypeItem::Struct(Struct {
            data: StructData::Named(declared),
            ..
        })) = krate.get_typeitem_by_path(&path.path)
        {
            values.sort_by_key(|(name, _)| {
                declared
                    .iter()
                    .position(|(field, _)| field == name)
                    .unwrap_or(usize::MAX)
            });
        }
        Ok(ConstValue::Struct { fields: values })
    }

    fn project(&self, base: ConstValue, field: Symbol, span: FileSpan) -> Result<ConstValue, ConstError> {
        let name = self.krate.interner.resolve(field);
        let found = match base {
            ConstValue::Struct { fields } => fields
                .into_iter()
                .find(|(existing, _)| *existing == field)
                .map(|(_, value)| value),
            ConstValue::Tuple(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.into_iter().nth(index)),
            other => {
                return Err(ConstError::TypeMismatch {
                    expected: "struct or tuple".to_owned(),
                    got: other.kind_name().to_owned(),
                    span,
                });
            }
        };
        found.ok_or_else(|| ConstError::UnsupportedOperation {
            operation: format!("access of missing field `{name}`"),
            span,
        })
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &ExprNode,
        right: &ExprNode,
        ty: &TypeRef,
        span: FileSpan,
    ) -> Result<ConstValue, ConstError> {
        let left_val = self.eval(left)?;
        // Short-circuit before touching the right operand
        match (op, &left_val) {
            (BinOp::BoolAnd, ConstValue::Bool(false)) => return Ok(ConstValue::Bool(false)),
            (BinOp::BoolOr, ConstValue::Bool(true)) => return Ok(ConstValue::Bool(true)),
            _ => {}
        }
        let right_val = self.eval(right)?;
        binary_op(op, left_val, right_val, int_type(ty), span)
    }
}

/// Integer width of `ty`, if it is an integer type
fn int_type(ty: &TypeRef) -> Option<CoreType> {
    match ty {
        TypeRef::Primitive(core) if core.int_bits().is_some() => Some(*core),
        _ => None,
    }
}

/// Wraps `value` to the width of `ty`, sign-extending signed types
pub(crate) fn truncate_int(value: i128, ty: CoreType) -> i128 {
    let Some(bits) = ty.int_bits() else {
        return value;
    };
    if bits >= 128 {
        return value;
    }
    let shift = 128 - bits;
    if ty.is_signed() {
        (value << shift) >> shift
    } else {
        (((value as u128) << shift) >> shift) as i128
    }
}

/// Smallest and largest value of an integer type
fn int_range(ty: CoreType) -> (i128, i128) {
    match (ty.int_bits(), ty.is_signed()) {
        (Some(128), true) | (None, _) => (i128::MIN, i128::MAX),
        (Some(128), false) => (0, i128::MAX),
        (Some(bits), true) => (-(1 << (bits - 1)), (1 << (bits - 1)) - 1),
        (Some(bits), false) => (0, (1 << bits) - 1),
    }
}

/// Integer `value` wrapped to `ty`
///
/// `u128` reinterprets the bits, so `-1` becomes `u128::MAX`.
fn int_value(value: i128, ty: CoreType) -> ConstValue {
    if ty == CoreType::U128 {
        ConstValue::from_u128(value as u128)
    } else {
        ConstValue::Int(truncate_int(value, ty))
    }
}

fn coerce(value: ConstValue, ty: &TypeRef) -> ConstValue {
    match (value, int_type(ty)) {
        (ConstValue::Int(raw), Some(core)) => int_value(raw, core),
        (ConstValue::UInt(raw), Some(core)) => int_value(raw as i128, core),
        (value, _) => value,
    }
}

fn literal_value(literal: &Literal, ty: &TypeRef) -> ConstValue {
    match literal {
        Literal::Integer(raw) => match ty {
            TypeRef::Primitive(core) if core.is_float() => ConstValue::Float(*raw as f64),
            _ => match i128::try_from(*raw) {
                Ok(value) => coerce(ConstValue::Int(value), ty),
                Err(_) if matches!(int_type(ty), Some(CoreType::U128) | None) => ConstValue::UInt(*raw),
                Err(_) => coerce(ConstValue::Int(*raw as i128), ty),
            },
        },
        Literal::Float(value) => ConstValue::Float(*value),
        Literal::Bool(value) => ConstValue::Bool(*value),
        Literal::Char(value) => ConstValue::Char(*value),
        Literal::String(value) => ConstValue::String(value.clone()),
        Literal::ByteString(bytes) => ConstValue::Bytes(bytes.clone()),
    }
}

/// Primitive `as` conversion
///
/// Integer targets wrap, float-to-integer saturates. Casts to non-primitive
/// types (pointers, references) leave the value untouched.
fn cast(value: ConstValue, ty: &TypeRef, span: FileSpan) -> Result<ConstValue, ConstError> {
    let TypeRef::Primitive(target) = ty else {
        return Ok(value);
    };
    let target = *target;
    let is_int = target.int_bits().is_some();
    match value {
        ConstValue::Int(raw) if is_int => Ok(int_value(raw, target)),
        ConstValue::UInt(raw) if is_int => Ok(int_value(raw as i128, target)),
        ConstValue::UInt(raw) if target.is_float() => Ok(ConstValue::Float(round_float(raw as f64, target))),
        ConstValue::UInt(_) if target == CoreType::Char => Err(ConstError::OverflowError { span }),
        ConstValue::Int(raw) if target.is_float() => Ok(ConstValue::Float(round_float(raw as f64, target))),
        ConstValue::Int(raw) if target == CoreType::Char => u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .map(ConstValue::Char)
            .ok_or(ConstError::OverflowError { span }),
        ConstValue::Float(raw) if target == CoreType::U128 => Ok(ConstValue::from_u128(raw as u128)),
        ConstValue::Float(raw) if is_int => {
            let (min, max) = int_range(target);
            Ok(ConstValue::Int((raw as i128).clamp(min, max)))
        }
        ConstValue::Float(raw) if target.is_float() => Ok(ConstValue::Float(round_float(raw, target))),
        ConstValue::Bool(raw) if is_int => Ok(ConstValue::Int(i128::from(raw))),
        ConstValue::Char(raw) if is_int => Ok(int_value(i128::from(u32::from(raw)), target)),
        ConstValue::Bool(raw) if target == CoreType::Bool => Ok(ConstValue::Bool(raw)),
        ConstValue::Char(raw) if target == CoreType::Char => Ok(ConstValue::Char(raw)),
        other => Err(ConstError::TypeMismatch {
            expected: target.name().to_owned(),
            got: other.kind_name().to_owned(),
            span,
        }),
    }
}

fn round_float(value: f64, ty: CoreType) -> f64 {
    if ty == CoreType::F32 {
        f64::from(value as f32)
    } else {
        value
    }
}

/// Checks that an arithmetic result fits the operand type
fn fit(result: Option<i128>, ty: Option<CoreType>, span: FileSpan) -> Result<ConstValue, ConstError> {
    let value = result.ok_or(ConstError::OverflowError { span })?;
    match ty {
        Some(CoreType::U128) if value < 0 => Err(ConstError::OverflowError { span }),
        Some(core) if truncate_int(value, core) != value => Err(ConstError::OverflowError { span }),
        _ => Ok(ConstValue::Int(value)),
    }
}

fn shift(
    op: BinOp,
    value: i128,
    amount: i128,
    ty: Option<CoreType>,
    span: FileSpan,
) -> Result<ConstValue, ConstError> {
    let bits = ty.and_then(CoreType::int_bits).unwrap_or(128);
    let amount = u32::try_from(amount)
        .ok()
        .filter(|amount| *amount < bits)
        .ok_or(ConstError::OverflowError { span })?;
    let shifted = if op == BinOp::Shl { value << amount } else { value >> amount };
    Ok(ty.map_or(ConstValue::Int(shifted), |core| int_value(shifted, core)))
}

fn compare(op: BinOp, ordering: Option<Ordering>) -> Option<bool> {
    let ordering = ordering?;
    match op {
        BinOp::Eq => Some(ordering == Ordering::Equal),
        BinOp::Ne => Some(ordering != Ordering::Equal),
        BinOp::Lt => Some(ordering == Ordering::Less),
        BinOp::Le => Some(ordering != Ordering::Greater),
        BinOp::Gt => Some(ordering == Ordering::Greater),
        BinOp::Ge => Some(ordering != Ordering::Less),
        _ => None,
    }
}

/// Evaluates a binary operation on already evaluated operands
fn binary_op(
    op: BinOp,
    left: ConstValue,
    right: ConstValue,
    ty: Option<CoreType>,
    span: FileSpan,
) -> Result<ConstValue, ConstError> {
    let ordering = match (&left, &right) {
        (ConstValue::Int(left_val), ConstValue::Int(right_val)) => left_val.partial_cmp(right_val),
        (ConstValue::Float(left_val), ConstValue::Float(right_val)) => left_val.partial_cmp(right_val),
        (ConstValue::Bool(left_val), ConstValue::Bool(right_val)) => left_val.partial_cmp(right_val),
        (ConstValue::Char(left_val), ConstValue::Char(right_val)) => left_val.partial_cmp(right_val),
        (ConstValue::UInt(_), _) | (_, ConstValue::UInt(_)) => wide_ordering(&left, &right),
        _ => None,
    };
    if let Some(result) = compare(op, ordering) {
        return Ok(ConstValue::Bool(result));
    }

    let wide = ty == Some(CoreType::U128)
        || matches!(left, ConstValue::UInt(_))
        || matches!(right, ConstValue::UInt(_));
    if wide && let (Some(left_val), Some(right_val)) = (left.as_u128(), right.as_u128()) {
        return binary_u128(op, left_val, right_val, span);
    }

    match (op, &left, &right) {
        // Integer arithmetic
        (BinOp::Add, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            fit(left_val.checked_add(*right_val), ty, span)
        }
        (BinOp::Sub, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            fit(left_val.checked_sub(*right_val), ty, span)
        }
        (BinOp::Mul, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            fit(left_val.checked_mul(*right_val), ty, span)
        }
        (BinOp::Div | BinOp::Rem, ConstValue::Int(_), ConstValue::Int(0)) => Err(ConstError::DivisionByZero { span }),
        (BinOp::Div, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            fit(left_val.checked_div(*right_val), ty, span)
        }
        (BinOp::Rem, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            fit(left_val.checked_rem(*right_val), ty, span)
        }

        // Bitwise operations on integers
        (BinOp::BitAnd, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            Ok(ConstValue::Int(left_val & right_val))
        }
        (BinOp::BitOr, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            Ok(ConstValue::Int(left_val | right_val))
        }
        (BinOp::BitXor, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            Ok(ConstValue::Int(left_val ^ right_val))
        }
        (BinOp::Shl | BinOp::Shr, ConstValue::Int(left_val), ConstValue::Int(right_val)) => {
            shift(op, *left_val, *right_val, ty, span)
        }

        // Float arithmetic
        (BinOp::Add, ConstValue::Float(left_val), ConstValue::Float(right_val)) => {
            Ok(ConstValue::Float(left_val + right_val))
        }
        (BinOp::Sub, ConstValue::Float(left_val), ConstValue::Float(right_val)) => {
            Ok(ConstValue::Float(left_val - right_val))
        }
        (BinOp::Mul, ConstValue::Float(left_val), ConstValue::Float(right_val)) => {
            Ok(ConstValue::Float(left_val * right_val))
        }
        (BinOp::Div, ConstValue::Float(left_val), ConstValue::Float(right_val)) => {
            Ok(ConstValue::Float(left_val / right_val))
        }
        (BinOp::Rem, ConstValue::Float(left_val), ConstValue::Float(right_val)) => {
            Ok(ConstValue::Float(left_val % right_val))
        }

        // Logical operations
        (BinOp::BoolAnd | BinOp::BitAnd, ConstValue::Bool(left_val), ConstValue::Bool(right_val)) => {
            Ok(ConstValue::Bool(*left_val && *right_val))
        }
        (BinOp::BoolOr | BinOp::BitOr, ConstValue::Bool(left_val), ConstValue::Bool(right_val)) => {
            Ok(ConstValue::Bool(*left_val || *right_val))
        }
        (BinOp::BitXor, ConstValue::Bool(left_val), ConstValue::Bool(right_val)) => {
            Ok(ConstValue::Bool(left_val ^ right_val))
        }

        // Invalid operations
        _ => Err(ConstError::InvalidBinaryOp {
            left_type: left.kind_name().to_owned(),
            op: op.symbol().to_owned(),
            right_type: right.kind_name().to_owned(),
            span,
        }),
    }
}

/// Orders two integers when at least one is above `i128::MAX`
fn wide_ordering(left: &ConstValue, right: &ConstValue) -> Option<Ordering> {
    match (left.as_u128(), right.as_u128()) {
        (Some(left_val), Some(right_val)) => Some(left_val.cmp(&right_val)),
        (None, Some(_)) if left.is_int() => Some(Ordering::Less),
        (Some(_), None) if right.is_int() => Some(Ordering::Greater),
        _ => None,
    }
}

/// Integer arithmetic in `u128`
fn binary_u128(op: BinOp, left: u128, right: u128, span: FileSpan) -> Result<ConstValue, ConstError> {
    let result = match op {
        BinOp::Add => left.checked_add(right),
        BinOp::Sub => left.checked_sub(right),
        BinOp::Mul => left.checked_mul(right),
        BinOp::Div | BinOp::Rem if right == 0 => return Err(ConstError::DivisionByZero { span }),
        BinOp::Div => left.checked_div(right),
        BinOp::Rem => left.checked_rem(right),
        BinOp::BitAnd => Some(left & right),
        BinOp::BitOr => Some(left | right),
        BinOp::BitXor => Some(left ^ right),
        BinOp::Shl | BinOp::Shr => {
            let amount = u32::try_from(right)
                .ok()
                .filter(|amount| *amount < u128::BITS)
                .ok_or(ConstError::OverflowError { span })?;
            Some(if op == BinOp::Shl { left << amount } else { left >> amount })
        }
        _ => {
            return Err(ConstError::InvalidBinaryOp {
                left_type: "integer".to_owned(),
                op: op.symbol().to_owned(),
                right_type: "integer".to_owned(),
                span,
            });
        }
    };
    result.map(ConstValue::from_u128).ok_or(ConstError::OverflowError { span })
}

/// Evaluates a unary operation
fn eval_unary(op: UniOp, operand: ConstValue, ty: &TypeRef, span: FileSpan) -> Result<ConstValue, ConstError> {
    let int_ty = int_type(ty);
    match (op, &operand) {
        (UniOp::Neg, ConstValue::Int(value)) => fit(value.checked_neg(), int_ty, span),
        (UniOp::Neg, ConstValue::UInt(_)) => Err(ConstError::OverflowError { span }),
        (UniOp::Neg, ConstValue::Float(value)) => Ok(ConstValue::Float(-value)),
        (UniOp::Not, ConstValue::Bool(value)) => Ok(ConstValue::Bool(!value)),
        (UniOp::Not, ConstValue::Int(value)) => Ok(int_ty.map_or(ConstValue::Int(!value), |core| int_value(!value, core))),
        (UniOp::Not, ConstValue::UInt(value)) => Ok(ConstValue::from_u128(!value)),
        _ => Err(ConstError::InvalidUnaryOp {
            op: match op {
                UniOp::Neg => "-".to_owned(),
                UniOp::Not => "!".to_owned(),
            },
            operand_type: operand.kind_name().to_owned(),
            span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use rv_hir::{Constant, GenericParams, Module, PathParams, PathValueTarget, Publicity, Static, TypeImpl};
    use rv_intern::Interner;

    /// Hands out `lifted#N` paths at the crate root
    #[derive(Default)]
    struct Recorder {
        names: Vec<String>,
        values: Vec<ConstValue>,
        interner: Interner,
    }

    impl NewValue for Recorder {
        fn new_static(&mut self, _span: FileSpan, _ty: TypeRef, value: ConstValue) -> Result<SimplePath, ConstError> {
            let name = format!("lifted#{}", self.names.len());
            let path = SimplePath::new(vec![self.interner.intern(&name)]);
            self.names.push(name);
            self.values.push(value);
            Ok(path)
        }
    }

    struct Refuse;

    impl NewValue for Refuse {
        fn new_static(&mut self, span: FileSpan, _ty: TypeRef, _value: ConstValue) -> Result<SimplePath, ConstError> {
            Err(ConstError::NewStaticRefused { span })
        }
    }

    fn prim(core: CoreType) -> TypeRef {
        TypeRef::Primitive(core)
    }

    fn node(kind: ExprKind, ty: TypeRef) -> ExprNodeP {
        ExprNode::boxed(kind, ty, FileSpan::generated())
    }

    fn int(value: u128, core: CoreType) -> ExprNodeP {
        node(ExprKind::Literal(Literal::Integer(value)), prim(core))
    }

    fn binop(op: BinOp, left: ExprNodeP, right: ExprNodeP, ty: TypeRef) -> ExprNodeP {
        node(ExprKind::BinOp { op, left, right }, ty)
    }

    fn eval_in(krate: &Crate, expr: ExprNodeP) -> Result<ConstValue, ConstError> {
        let mut refuse = Refuse;
        let ty = expr.ty.clone();
        let root = ExprPtr::from_boxed(expr, None);
        Evaluator::new(FileSpan::generated(), krate, &mut refuse).evaluate_constant(&SimplePath::root(), &root, &ty)
    }

    fn eval(expr: ExprNodeP) -> Result<ConstValue, ConstError> {
        eval_in(&Crate::new(Interner::new()), expr)
    }

    #[test]
    fn test_arithmetic_and_overflow() {
        let sum = binop(BinOp::Add, int(200, CoreType::U8), int(55, CoreType::U8), prim(CoreType::U8));
        assert_eq!(eval(sum), Ok(ConstValue::Int(255)));

        let overflow = binop(BinOp::Add, int(200, CoreType::U8), int(56, CoreType::U8), prim(CoreType::U8));
        assert!(matches!(eval(overflow), Err(ConstError::OverflowError { .. })));

        let div = binop(BinOp::Div, int(1, CoreType::I32), int(0, CoreType::I32), prim(CoreType::I32));
        assert!(matches!(eval(div), Err(ConstError::DivisionByZero { .. })));

        let shl = binop(BinOp::Shl, int(255, CoreType::U8), int(1, CoreType::U32), prim(CoreType::U8));
        assert_eq!(eval(shl), Ok(ConstValue::Int(254)));

        let neg = node(
            ExprKind::UniOp {
                op: UniOp::Neg,
                value: int(5, CoreType::I8),
            },
            prim(CoreType::I8),
        );
        assert_eq!(eval(neg), Ok(ConstValue::Int(-5)));
    }

    #[test]
    fn test_truncation_and_casts() {
        assert_eq!(truncate_int(300, CoreType::U8), 44);
        assert_eq!(truncate_int(255, CoreType::I8), -1);
        assert_eq!(truncate_int(-1, CoreType::U16), 65535);
        assert_eq!(truncate_int(i128::MIN, CoreType::I128), i128::MIN);

        let wrap = node(ExprKind::Cast { value: int(300, CoreType::I32) }, prim(CoreType::U8));
        assert_eq!(eval(wrap), Ok(ConstValue::Int(44)));

        let float = node(ExprKind::Literal(Literal::Float(300.5)), prim(CoreType::F64));
        let saturate = node(ExprKind::Cast { value: float }, prim(CoreType::U8));
        assert_eq!(eval(saturate), Ok(ConstValue::Int(255)));

        let flag = node(ExprKind::Literal(Literal::Bool(true)), prim(CoreType::Bool));
        let widen = node(ExprKind::Cast { value: flag }, prim(CoreType::U32));
        assert_eq!(eval(widen), Ok(ConstValue::Int(1)));

        let byte = node(ExprKind::Cast { value: int(65, CoreType::U8) }, prim(CoreType::Char));
        assert_eq!(eval(byte), Ok(ConstValue::Char('A')));
    }

    #[test]
    fn test_u128_keeps_full_range() {
        let max = int(u128::MAX, CoreType::U128);
        assert_eq!(eval(max), Ok(ConstValue::UInt(u128::MAX)));

        let small = int(5, CoreType::U128);
        assert_eq!(eval(small), Ok(ConstValue::Int(5)));

        let high = 1u128 << 127;
        let sum = binop(BinOp::Add, int(high, CoreType::U128), int(1, CoreType::U128), prim(CoreType::U128));
        assert_eq!(eval(sum), Ok(ConstValue::UInt(high + 1)));

        let overflow = binop(
            BinOp::Add,
            int(u128::MAX, CoreType::U128),
            int(1, CoreType::U128),
            prim(CoreType::U128),
        );
        assert!(matches!(eval(overflow), Err(ConstError::OverflowError { .. })));

        let below_zero = binop(BinOp::Sub, int(0, CoreType::U128), int(1, CoreType::U128), prim(CoreType::U128));
        assert!(matches!(eval(below_zero), Err(ConstError::OverflowError { .. })));

        let back_down = binop(
            BinOp::Sub,
            int(u128::MAX, CoreType::U128),
            int(u128::MAX - 3, CoreType::U128),
            prim(CoreType::U128),
        );
        assert_eq!(eval(back_down), Ok(ConstValue::Int(3)));

        let greater = binop(
            BinOp::Gt,
            int(u128::MAX, CoreType::U128),
            int(1, CoreType::U128),
            prim(CoreType::Bool),
        );
        assert_eq!(eval(greater), Ok(ConstValue::Bool(true)));

        let wrap = node(ExprKind::Cast { value: int(u128::MAX, CoreType::U128) }, prim(CoreType::U8));
        assert_eq!(eval(wrap), Ok(ConstValue::Int(255)));

        let minus_one = node(
            ExprKind::UniOp {
                op: UniOp::Neg,
                value: int(1, CoreType::I64),
            },
            prim(CoreType::I64),
        );
        let widen = node(ExprKind::Cast { value: minus_one }, prim(CoreType::U128));
        assert_eq!(eval(widen), Ok(ConstValue::UInt(u128::MAX)));
    }

    #[test]
    fn test_comparison_and_short_circuit() {
        let lt = binop(BinOp::Lt, int(1, CoreType::I32), int(2, CoreType::I32), prim(CoreType::Bool));
        assert_eq!(eval(lt), Ok(ConstValue::Bool(true)));

        // The right operand is not a constant but is never reached
        let stuck = node(
            ExprKind::Variable {
                name: Interner::new().intern("x"),
                slot: 0,
            },
            prim(CoreType::Bool),
        );
        let falsy = node(ExprKind::Literal(Literal::Bool(false)), prim(CoreType::Bool));
        let and = binop(BinOp::BoolAnd, falsy, stuck, prim(CoreType::Bool));
        assert_eq!(eval(and), Ok(ConstValue::Bool(false)));
    }

    #[test]
    fn test_repeat_and_projection() {
        let interner = Interner::new();
        let krate = Crate::new(interner.clone());
        let repeat = node(
            ExprKind::ArraySized {
                value: int(7, CoreType::U8),
                size: 3,
            },
            TypeRef::new_array(prim(CoreType::U8), 3),
        );
        assert_eq!(
            eval_in(&krate, repeat),
            Ok(ConstValue::Repeat {
                value: Box::new(ConstValue::Int(7)),
                len: 3,
            })
        );

        let huge = node(
            ExprKind::ArraySized {
                value: int(0, CoreType::U8),
                size: u64::MAX,
            },
            TypeRef::new_array(prim(CoreType::U8), u64::MAX),
        );
        assert_eq!(
            eval_in(&krate, huge),
            Ok(ConstValue::Repeat {
                value: Box::new(ConstValue::Int(0)),
                len: u64::MAX,
            })
        );

        let pair = node(
            ExprKind::Tuple(vec![int(1, CoreType::U8), int(2, CoreType::U8)]),
            TypeRef::Tuple(vec![prim(CoreType::U8), prim(CoreType::U8)]),
        );
        let second = node(
            ExprKind::Field {
                value: pair,
                field: interner.intern("1"),
            },
            prim(CoreType::U8),
        );
        assert_eq!(eval_in(&krate, second), Ok(ConstValue::Int(2)));
    }

    #[test]
    fn test_struct_literal_uses_declared_order_and_base() {
        let interner = Interner::new();
        let mut krate = Crate::new(interner.clone());
        let point = interner.intern("Point");
        let x_name = interner.intern("x");
        let y_name = interner.intern("y");
        krate.root_module.add_type(
            point,
            Publicity::Public,
            TypeItem::Struct(Struct {
                params: GenericParams::default(),
                data: StructData::Named(vec![(x_name, prim(CoreType::I32)), (y_name, prim(CoreType::I32))]),
            }),
        );
        let path: GenericPath = SimplePath::new(vec![point]).into();
        let ty = TypeRef::new_struct(path.clone());
        let base = node(
            ExprKind::StructLiteral {
                path: path.clone(),
                base: None,
                fields: vec![(y_name, int(2, CoreType::I32)), (x_name, int(1, CoreType::I32))],
            },
            ty.clone(),
        );
        let updated = node(
            ExprKind::StructLiteral {
                path,
                base: Some(base),
                fields: vec![(y_name, int(5, CoreType::I32))],
            },
            ty,
        );
        assert_eq!(
            eval_in(&krate, updated),
            Ok(ConstValue::Struct {
                fields: vec![(x_name, ConstValue::Int(1)), (y_name, ConstValue::Int(5))],
            })
        );
    }

    #[test]
    fn test_paths_to_constants_and_statics() {
        let interner = Interner::new();
        let mut krate = Crate::new(interner.clone());
        let limit = interner.intern("LIMIT");
        let table = interner.intern("TABLE");
        let twice = interner.intern("TWICE");
        let inner = interner.intern("inner");

        let mut module = Module::new();
        module.add_value(
            limit,
            Publicity::Public,
            ValueItem::Constant(Constant::new(prim(CoreType::U32), ExprPtr::from_boxed(int(21, CoreType::U32), None))),
        );
        krate.root_module.add_type(inner, Publicity::Public, TypeItem::Module(module));
        krate.root_module.add_value(
            limit,
            Publicity::Public,
            ValueItem::Import(SimplePath::new(vec![inner, limit])),
        );
        krate.root_module.add_value(
            table,
            Publicity::Public,
            ValueItem::Static(Static::new(prim(CoreType::U32), ExprPtr::from_boxed(int(0, CoreType::U32), None))),
        );

        let limit_ref = node(
            ExprKind::PathValue {
                path: SimplePath::new(vec![limit]).into(),
                target: PathValueTarget::Constant,
            },
            prim(CoreType::U32),
        );
        let doubled = binop(BinOp::Mul, limit_ref, int(2, CoreType::U32), prim(CoreType::U32));
        krate.type_impls.push(TypeImpl {
            params: GenericParams::default(),
            ty: prim(CoreType::U32),
            methods: IndexMap::new(),
            constants: IndexMap::from([(twice, Constant::new(prim(CoreType::U32), ExprPtr::from_boxed(doubled, None)))]),
            src_module: SimplePath::root(),
        });

        let assoc = node(
            ExprKind::PathValue {
                path: Path::UfcsInherent {
                    ty: Box::new(prim(CoreType::U32)),
                    item: twice,
                    params: PathParams::default(),
                },
                target: PathValueTarget::Constant,
            },
            prim(CoreType::U32),
        );
        assert_eq!(eval_in(&krate, assoc), Ok(ConstValue::Int(42)));

        let static_ref = node(
            ExprKind::PathValue {
                path: SimplePath::new(vec![table]).into(),
                target: PathValueTarget::Static,
            },
            prim(CoreType::U32),
        );
        let borrow = node(
            ExprKind::Borrow {
                kind: BorrowKind::Shared,
                value: static_ref,
            },
            TypeRef::new_borrow(BorrowKind::Shared, prim(CoreType::U32)),
        );
        assert_eq!(eval_in(&krate, borrow), Ok(ConstValue::Ref(SimplePath::new(vec![table]))));
    }

    #[test]
    fn test_borrow_asks_hook_for_storage() {
        let krate = Crate::new(Interner::new());
        let array_ty = TypeRef::new_array(prim(CoreType::U8), 2);
        let array = node(
            ExprKind::ArrayList(vec![int(1, CoreType::U8), int(2, CoreType::U8)]),
            array_ty.clone(),
        );
        let borrow = node(
            ExprKind::Borrow {
                kind: BorrowKind::Shared,
                value: array,
            },
            TypeRef::new_borrow(BorrowKind::Shared, array_ty),
        );
        let root = ExprPtr::from_boxed(borrow, None);
        let ty = root.ty().clone();

        let mut recorder = Recorder {
            interner: krate.interner.clone(),
            ..Recorder::default()
        };
        let value = Evaluator::new(FileSpan::generated(), &krate, &mut recorder)
            .evaluate_constant(&SimplePath::root(), &root, &ty);
        assert!(matches!(value, Ok(ConstValue::Ref(_))));
        assert_eq!(recorder.names, vec!["lifted#0".to_owned()]);
        assert_eq!(
            recorder.values,
            vec![ConstValue::Array(vec![ConstValue::Int(1), ConstValue::Int(2)])]
        );

        let mut refuse = Refuse;
        let refused = Evaluator::new(FileSpan::generated(), &krate, &mut refuse)
            .evaluate_constant(&SimplePath::root(), &root, &ty);
        assert!(matches!(refused, Err(ConstError::NewStaticRefused { .. })));
    }

    #[test]
    fn test_self_referential_constant_hits_limit() {
        let interner = Interner::new();
        let mut krate = Crate::new(interner.clone());
        let looped = interner.intern("LOOPED");
        let self_ref = node(
            ExprKind::PathValue {
                path: SimplePath::new(vec![looped]).into(),
                target: PathValueTarget::Constant,
            },
            prim(CoreType::U8),
        );
        krate.root_module.add_value(
            looped,
            Publicity::Public,
            ValueItem::Constant(Constant::new(prim(CoreType::U8), ExprPtr::from_boxed(self_ref.clone(), None))),
        );
        assert!(matches!(
            eval_in(&krate, self_ref),
            Err(ConstError::RecursionLimit { .. })
        ));
    }
}
