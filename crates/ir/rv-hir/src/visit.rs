//! Mutable visitors over expressions and whole crates
//!
//! Both visitors are fallible: an `Err` from any hook stops the walk and is
//! returned to the caller unchanged.

use crate::expr::{ExprNode, ExprNodeP, ExprPtr};
use crate::item::{
    Constant, Crate, DataVariant, Enum, EnumData, Function, Module, Static, Struct, StructData,
    Trait, TraitImpl, TraitValueItem, TypeAlias, TypeImpl, TypeItem, Union, ValueItem,
};
use crate::path::{PathParams, SimplePath};
use crate::ty::{ArraySize, ConstGeneric, GenericParams, TypeRef};
use rv_intern::Symbol;

/// Visitor over the nodes of one expression tree
pub trait ExprVisitor {
    /// Error that aborts the walk
    type Error;

    /// Visits an owned child slot
    ///
    /// Overriding this allows replacing the node in its parent.
    fn visit_node_ptr(&mut self, node: &mut ExprNodeP) -> Result<(), Self::Error> {
        self.visit_node(node)
    }

    /// Visits a node; the default recurses into its children
    fn visit_node(&mut self, node: &mut ExprNode) -> Result<(), Self::Error> {
        walk_node(self, node)
    }
}

/// Visits every child slot of `node` in evaluation order
pub fn walk_node<V: ExprVisitor + ?Sized>(visitor: &mut V, node: &mut ExprNode) -> Result<(), V::Error> {
    for child in node.children_mut() {
        visitor.visit_node_ptr(child)?;
    }
    Ok(())
}

/// Visitor over every item of a crate
///
/// Each `visit_*` method defaults to the matching `walk_*` function, so an
/// implementation only overrides the hooks it cares about and calls the walk
/// function to keep descending.
pub trait Visitor {
    /// Error that aborts the walk
    type Error;

    /// Entry point
    fn visit_crate(&mut self, krate: &mut Crate) -> Result<(), Self::Error> {
        walk_crate(self, krate)
    }

    /// Module at `path`
    fn visit_module(&mut self, path: &SimplePath, module: &mut Module) -> Result<(), Self::Error> {
        walk_module(self, path, module)
    }

    /// Inherent impl block
    fn visit_type_impl(&mut self, imp: &mut TypeImpl) -> Result<(), Self::Error> {
        walk_type_impl(self, imp)
    }

    /// Trait impl block
    fn visit_trait_impl(&mut self, imp: &mut TraitImpl) -> Result<(), Self::Error> {
        walk_trait_impl(self, imp)
    }

    /// Function, free or associated
    fn visit_function(&mut self, name: Symbol, item: &mut Function) -> Result<(), Self::Error> {
        walk_function(self, name, item)
    }

    /// Static, free or associated
    fn visit_static(&mut self, name: Symbol, item: &mut Static) -> Result<(), Self::Error> {
        walk_static(self, name, item)
    }

    /// Constant, free or associated
    fn visit_constant(&mut self, name: Symbol, item: &mut Constant) -> Result<(), Self::Error> {
        walk_constant(self, name, item)
    }

    /// Struct definition
    fn visit_struct(&mut self, name: Symbol, item: &mut Struct) -> Result<(), Self::Error> {
        walk_struct(self, name, item)
    }

    /// Enum definition
    fn visit_enum(&mut self, name: Symbol, item: &mut Enum) -> Result<(), Self::Error> {
        walk_enum(self, name, item)
    }

    /// Union definition
    fn visit_union(&mut self, name: Symbol, item: &mut Union) -> Result<(), Self::Error> {
        walk_union(self, name, item)
    }

    /// Trait definition
    fn visit_trait(&mut self, name: Symbol, item: &mut Trait) -> Result<(), Self::Error> {
        walk_trait(self, name, item)
    }

    /// Type alias
    fn visit_type_alias(&mut self, name: Symbol, item: &mut TypeAlias) -> Result<(), Self::Error> {
        walk_type_alias(self, name, item)
    }

    /// Generic parameter list
    fn visit_generic_params(&mut self, params: &mut GenericParams) -> Result<(), Self::Error> {
        walk_generic_params(self, params)
    }

    /// Any type appearing in an item
    fn visit_type(&mut self, ty: &mut TypeRef) -> Result<(), Self::Error> {
        walk_type(self, ty)
    }

    /// Generic arguments of a path
    fn visit_path_params(&mut self, params: &mut PathParams) -> Result<(), Self::Error> {
        walk_path_params(self, params)
    }

    /// Expression root; ignored by default
    fn visit_expr(&mut self, _expr: &mut ExprPtr) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Walks the root module, then inherent impls, then trait impls
pub fn walk_crate<V: Visitor + ?Sized>(visitor: &mut V, krate: &mut Crate) -> Result<(), V::Error> {
    visitor.visit_module(&SimplePath::root(), &mut krate.root_module)?;
    for imp in &mut krate.type_impls {
        visitor.visit_type_impl(imp)?;
    }
    for imp in &mut krate.trait_impls {
        visitor.visit_trait_impl(imp)?;
    }
    Ok(())
}

/// Walks type items, then value items, each in insertion order
pub fn walk_module<V: Visitor + ?Sized>(
    visitor: &mut V,
    path: &SimplePath,
    module: &mut Module,
) -> Result<(), V::Error> {
    for (name, entry) in &mut module.mod_items {
        let name = *name;
        match &mut entry.ent {
            TypeItem::Module(child) => visitor.visit_module(&path.join(name), child)?,
            TypeItem::Struct(item) => visitor.visit_struct(name, item)?,
            TypeItem::Enum(item) => visitor.visit_enum(name, item)?,
            TypeItem::Union(item) => visitor.visit_union(name, item)?,
            TypeItem::Trait(item) => visitor.visit_trait(name, item)?,
            TypeItem::TypeAlias(item) => visitor.visit_type_alias(name, item)?,
        }
    }
    for (name, entry) in &mut module.value_items {
        let name = *name;
        match &mut entry.ent {
            ValueItem::Function(item) => visitor.visit_function(name, item)?,
            ValueItem::Static(item) => visitor.visit_static(name, item)?,
            ValueItem::Constant(item) => visitor.visit_constant(name, item)?,
            ValueItem::Import(_) => {}
        }
    }
    Ok(())
}

/// Walks impl generics, self type, then associated items
pub fn walk_type_impl<V: Visitor + ?Sized>(visitor: &mut V, imp: &mut TypeImpl) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut imp.params)?;
    visitor.visit_type(&mut imp.ty)?;
    for (name, item) in &mut imp.methods {
        visitor.visit_function(*name, item)?;
    }
    for (name, item) in &mut imp.constants {
        visitor.visit_constant(*name, item)?;
    }
    Ok(())
}

/// Walks impl generics, trait arguments, self type, then associated items
pub fn walk_trait_impl<V: Visitor + ?Sized>(visitor: &mut V, imp: &mut TraitImpl) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut imp.params)?;
    visitor.visit_path_params(&mut imp.trait_args)?;
    visitor.visit_type(&mut imp.ty)?;
    for (name, item) in &mut imp.methods {
        visitor.visit_function(*name, item)?;
    }
    for (name, item) in &mut imp.constants {
        visitor.visit_constant(*name, item)?;
    }
    for (name, item) in &mut imp.statics {
        visitor.visit_static(*name, item)?;
    }
    for ty in imp.types.values_mut() {
        visitor.visit_type(ty)?;
    }
    Ok(())
}

/// Walks generics, argument types and return type
pub fn walk_function_signature<V: Visitor + ?Sized>(
    visitor: &mut V,
    item: &mut Function,
) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    for (_, ty) in &mut item.args {
        visitor.visit_type(ty)?;
    }
    visitor.visit_type(&mut item.ret)
}

/// Walks the signature, then the body if present
pub fn walk_function<V: Visitor + ?Sized>(
    visitor: &mut V,
    _name: Symbol,
    item: &mut Function,
) -> Result<(), V::Error> {
    walk_function_signature(visitor, item)?;
    if let Some(code) = &mut item.code {
        visitor.visit_expr(code)?;
    }
    Ok(())
}

/// Walks the type, then the initializer if present
pub fn walk_static<V: Visitor + ?Sized>(visitor: &mut V, _name: Symbol, item: &mut Static) -> Result<(), V::Error> {
    visitor.visit_type(&mut item.ty)?;
    if let Some(value) = &mut item.value {
        visitor.visit_expr(value)?;
    }
    Ok(())
}

/// Walks generics and type, then the initializer if present
pub fn walk_constant<V: Visitor + ?Sized>(
    visitor: &mut V,
    _name: Symbol,
    item: &mut Constant,
) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    visitor.visit_type(&mut item.ty)?;
    if let Some(value) = &mut item.value {
        visitor.visit_expr(value)?;
    }
    Ok(())
}

/// Walks generics, then field types
pub fn walk_struct<V: Visitor + ?Sized>(visitor: &mut V, _name: Symbol, item: &mut Struct) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    match &mut item.data {
        StructData::Unit => {}
        StructData::Tuple(fields) => {
            for ty in fields {
                visitor.visit_type(ty)?;
            }
        }
        StructData::Named(fields) => {
            for (_, ty) in fields {
                visitor.visit_type(ty)?;
            }
        }
    }
    Ok(())
}

/// Walks generics, then discriminant expressions or variant payload types
pub fn walk_enum<V: Visitor + ?Sized>(visitor: &mut V, _name: Symbol, item: &mut Enum) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    match &mut item.data {
        EnumData::Value { variants, .. } => {
            for variant in variants {
                if let Some(expr) = &mut variant.expr {
                    visitor.visit_expr(expr)?;
                }
            }
        }
        EnumData::Data(variants) => {
            for DataVariant { ty, .. } in variants {
                visitor.visit_type(ty)?;
            }
        }
    }
    Ok(())
}

/// Walks generics, then field types
pub fn walk_union<V: Visitor + ?Sized>(visitor: &mut V, _name: Symbol, item: &mut Union) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    for (_, ty) in &mut item.variants {
        visitor.visit_type(ty)?;
    }
    Ok(())
}

/// Walks generics, then every declared value with its default
pub fn walk_trait<V: Visitor + ?Sized>(visitor: &mut V, _name: Symbol, item: &mut Trait) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    for (name, value) in &mut item.values {
        match value {
            TraitValueItem::Function(function) => visitor.visit_function(*name, function)?,
            TraitValueItem::Constant(constant) => visitor.visit_constant(*name, constant)?,
            TraitValueItem::Static(item) => visitor.visit_static(*name, item)?,
        }
    }
    Ok(())
}

/// Walks generics, then the aliased type
pub fn walk_type_alias<V: Visitor + ?Sized>(
    visitor: &mut V,
    _name: Symbol,
    item: &mut TypeAlias,
) -> Result<(), V::Error> {
    visitor.visit_generic_params(&mut item.params)?;
    visitor.visit_type(&mut item.ty)
}

/// Walks the types of value parameters
pub fn walk_generic_params<V: Visitor + ?Sized>(
    visitor: &mut V,
    params: &mut GenericParams,
) -> Result<(), V::Error> {
    for value in &mut params.values {
        visitor.visit_type(&mut value.ty)?;
    }
    Ok(())
}

/// Walks component types
///
/// An array whose size is still an expression hands that expression to
/// [`Visitor::visit_expr`] after its element type.
pub fn walk_type<V: Visitor + ?Sized>(visitor: &mut V, ty: &mut TypeRef) -> Result<(), V::Error> {
    match ty {
        TypeRef::Primitive(_) | TypeRef::Generic(_) | TypeRef::Diverge => Ok(()),
        TypeRef::Tuple(elements) => {
            for element in elements {
                visitor.visit_type(element)?;
            }
            Ok(())
        }
        TypeRef::Path { path, .. } => visitor.visit_path_params(&mut path.params),
        TypeRef::TraitObject { trait_path } => visitor.visit_path_params(&mut trait_path.params),
        TypeRef::Array { inner, size } => {
            visitor.visit_type(inner)?;
            match size {
                ArraySize::Unevaluated(ConstGeneric::Unevaluated(expr)) => visitor.visit_expr(expr),
                ArraySize::Unevaluated(ConstGeneric::Generic(_)) | ArraySize::Known(_) => Ok(()),
            }
        }
        TypeRef::Slice(inner) | TypeRef::Borrow { inner, .. } | TypeRef::Pointer { inner, .. } => {
            visitor.visit_type(inner)
        }
        TypeRef::Function { args, ret } => {
            for arg in args {
                visitor.visit_type(arg)?;
            }
            visitor.visit_type(ret)
        }
    }
}

/// Walks each type argument
pub fn walk_path_params<V: Visitor + ?Sized>(visitor: &mut V, params: &mut PathParams) -> Result<(), V::Error> {
    for ty in &mut params.types {
        visitor.visit_type(ty)?;
    }
    Ok(())
}
