//! Rust-like rendering of paths, types and expressions

use crate::expr::{ExprKind, ExprNode, Literal, UniOp};
use crate::path::{GenericPath, Path, PathParams, SimplePath};
use crate::ty::{ArraySize, BorrowKind, ConstGeneric, TypeRef};
use rv_intern::Interner;

/// Renders IR fragments to strings for logs and snapshot tests
#[derive(Debug, Clone, Copy)]
pub struct HirPrinter<'interner> {
    interner: &'interner Interner,
}

impl<'interner> HirPrinter<'interner> {
    /// Printer resolving symbols through `interner`
    pub fn new(interner: &'interner Interner) -> Self {
        Self { interner }
    }

    /// `a::b::c`; the root renders as `crate`
    pub fn simple_path(&self, path: &SimplePath) -> String {
        if path.is_root() {
            return "crate".to_owned();
        }
        let parts: Vec<&str> = path
            .components
            .iter()
            .map(|sym| self.interner.resolve(*sym))
            .collect();
        parts.join("::")
    }

    /// `a::b::<T, U>`
    pub fn generic_path(&self, path: &GenericPath) -> String {
        let mut out = self.simple_path(&path.path);
        if !path.params.is_empty() {
            out.push_str("::");
            out.push_str(&self.path_params(&path.params));
        }
        out
    }

    fn path_params(&self, params: &PathParams) -> String {
        let types: Vec<String> = params.types.iter().map(|ty| self.ty(ty)).collect();
        format!("<{}>", types.join(", "))
    }

    /// Value path, including `<T>::item` and `<T as Trait>::item` forms
    pub fn path(&self, path: &Path) -> String {
        let (mut out, item, params) = match path {
            Path::Generic(gp) => return self.generic_path(gp),
            Path::UfcsInherent { ty, item, params } => (format!("<{}>", self.ty(ty)), item, params),
            Path::UfcsKnown {
                ty,
                trait_path,
                item,
                params,
            } => (
                format!("<{} as {}>", self.ty(ty), self.generic_path(trait_path)),
                item,
                params,
            ),
        };
        out.push_str("::");
        out.push_str(self.interner.resolve(*item));
        if !params.is_empty() {
            out.push_str("::");
            out.push_str(&self.path_params(params));
        }
        out
    }

    /// Type in source syntax
    pub fn ty(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive(core) => core.name().to_owned(),
            TypeRef::Tuple(elements) => Self::list("(", elements.iter().map(|el| self.ty(el)), ")", true),
            TypeRef::Path { path, .. } => self.generic_path(path),
            TypeRef::Generic(generic) => self.interner.resolve(generic.name).to_owned(),
            TypeRef::Array { inner, size } => {
                let size = match size {
                    ArraySize::Known(len) => len.to_string(),
                    ArraySize::Unevaluated(ConstGeneric::Generic(generic)) => {
                        self.interner.resolve(generic.name).to_owned()
                    }
                    ArraySize::Unevaluated(ConstGeneric::Unevaluated(expr)) => {
                        format!("{{ {} }}", self.expr(&expr.node))
                    }
                };
                format!("[{}; {size}]", self.ty(inner))
            }
            TypeRef::Slice(inner) => format!("[{}]", self.ty(inner)),
            TypeRef::Borrow { kind, inner } => match kind {
                BorrowKind::Shared => format!("&{}", self.ty(inner)),
                BorrowKind::Unique => format!("&mut {}", self.ty(inner)),
            },
            TypeRef::Pointer { kind, inner } => match kind {
                BorrowKind::Shared => format!("*const {}", self.ty(inner)),
                BorrowKind::Unique => format!("*mut {}", self.ty(inner)),
            },
            TypeRef::Function { args, ret } => {
                let args = Self::list("(", args.iter().map(|arg| self.ty(arg)), ")", false);
                format!("fn{args} -> {}", self.ty(ret))
            }
            TypeRef::TraitObject { trait_path } => format!("dyn {}", self.generic_path(trait_path)),
            TypeRef::Diverge => "!".to_owned(),
        }
    }

    /// Expression on one line
    ///
    /// Casts and unsizing coercions are parenthesized with their target type,
    /// `(v as T)` and `(v : T)` respectively.
    pub fn expr(&self, node: &ExprNode) -> String {
        match &node.kind {
            ExprKind::Literal(literal) => Self::literal(literal),
            ExprKind::UnitVariant { path, .. } => self.generic_path(path),
            ExprKind::PathValue { path, .. } => self.path(path),
            ExprKind::Tuple(items) => Self::list("(", items.iter().map(|item| self.expr(item)), ")", true),
            ExprKind::TupleVariant { path, args, .. } => {
                let args = Self::list("(", args.iter().map(|arg| self.expr(arg)), ")", false);
                format!("{}{args}", self.generic_path(path))
            }
            ExprKind::ArrayList(items) => Self::list("[", items.iter().map(|item| self.expr(item)), "]", false),
            ExprKind::ArraySized { value, size } => format!("[{}; {size}]", self.expr(value)),
            ExprKind::StructLiteral { path, base, fields } => {
                let mut parts: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", self.interner.resolve(*name), self.expr(value)))
                    .collect();
                if let Some(base) = base {
                    parts.push(format!("..{}", self.expr(base)));
                }
                if parts.is_empty() {
                    format!("{} {{}}", self.generic_path(path))
                } else {
                    format!("{} {{ {} }}", self.generic_path(path), parts.join(", "))
                }
            }
            ExprKind::Field { value, field } => {
                format!("{}.{}", self.expr(value), self.interner.resolve(*field))
            }
            ExprKind::Cast { value } => format!("({} as {})", self.expr(value), self.ty(&node.ty)),
            ExprKind::Unsize { value } => format!("({} : {})", self.expr(value), self.ty(&node.ty)),
            ExprKind::Borrow { kind, value } => match kind {
                BorrowKind::Shared => format!("&{}", self.expr(value)),
                BorrowKind::Unique => format!("&mut {}", self.expr(value)),
            },
            ExprKind::Variable { name, .. } => self.interner.resolve(*name).to_owned(),
            ExprKind::Let { name, value, .. } => match value {
                Some(value) => format!("let {} = {}", self.interner.resolve(*name), self.expr(value)),
                None => format!("let {}", self.interner.resolve(*name)),
            },
            ExprKind::Block { nodes, value } => {
                let mut out = String::from("{");
                for stmt in nodes {
                    out.push_str(&format!(" {};", self.expr(stmt)));
                }
                if let Some(value) = value {
                    out.push_str(&format!(" {}", self.expr(value)));
                }
                out.push_str(" }");
                out
            }
            ExprKind::BinOp { op, left, right } => {
                format!("({} {} {})", self.expr(left), op.symbol(), self.expr(right))
            }
            ExprKind::UniOp { op, value } => match op {
                UniOp::Neg => format!("-{}", self.expr(value)),
                UniOp::Not => format!("!{}", self.expr(value)),
            },
            ExprKind::Deref { value } => format!("*{}", self.expr(value)),
            ExprKind::Index { value, index } => format!("{}[{}]", self.expr(value), self.expr(index)),
            ExprKind::CallPath { path, args } => {
                let args = Self::list("(", args.iter().map(|arg| self.expr(arg)), ")", false);
                format!("{}{args}", self.path(path))
            }
            ExprKind::CallValue { value, args } => {
                let args = Self::list("(", args.iter().map(|arg| self.expr(arg)), ")", false);
                format!("({}){args}", self.expr(value))
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = format!("if {} {}", self.expr(cond), self.expr(then_branch));
                if let Some(else_branch) = else_branch {
                    out.push_str(&format!(" else {}", self.expr(else_branch)));
                }
                out
            }
            ExprKind::Assign { place, value } => format!("{} = {}", self.expr(place), self.expr(value)),
            ExprKind::Return(value) => match value {
                Some(value) => format!("return {}", self.expr(value)),
                None => "return".to_owned(),
            },
        }
    }

    fn literal(literal: &Literal) -> String {
        match literal {
            Literal::Integer(value) => value.to_string(),
            Literal::Float(value) => format!("{value:?}"),
            Literal::Bool(value) => value.to_string(),
            Literal::Char(value) => format!("{value:?}"),
            Literal::String(value) => format!("{value:?}"),
            Literal::ByteString(bytes) => format!("b\"{}\"", bytes.escape_ascii()),
        }
    }

    /// Joins `items` between delimiters; `trailing_single` adds the comma of
    /// one-element tuples
    fn list(
        open: &str,
        items: impl Iterator<Item = String>,
        close: &str,
        trailing_single: bool,
    ) -> String {
        let items: Vec<String> = items.collect();
        let comma = if trailing_single && items.len() == 1 { "," } else { "" };
        format!("{open}{}{comma}{close}", items.join(", "))
    }
}
