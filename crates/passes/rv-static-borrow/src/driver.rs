//! Crate traversal for the static borrow pass
//!
//! Walks every item that owns an expression root, keeping the current module
//! and the active generic parameters in step with the item being visited,
//! and runs a fresh [`Classifier`] over each root. Lifted values are queued
//! in a [`StaticRegistry`] and only inserted into the crate once the walk is
//! over.

use crate::classify::{Classifier, NewStatic};
use crate::error::PassError;
use crate::registry::StaticRegistry;
use crate::PassReport;
use rv_hir::visit::{
    walk_function_signature, walk_generic_params, walk_module, walk_struct, walk_trait, walk_trait_impl,
    walk_type, walk_type_alias, walk_type_impl, walk_union,
};
use rv_hir::{
    ArraySize, ConstGeneric, Constant, Crate, DataVariant, Enum, EnumData, ExprPtr, ExprState, Function,
    GenericParams, HirPrinter, Module, SimplePath, Static, Struct, Trait, TraitImpl, TypeAlias, TypeImpl, TypeRef,
    Union, Visitor,
};
use rv_intern::{Interner, Symbol};
use rv_resolve::TypeFacts;
use rv_span::FileSpan;
use tracing::{debug, instrument, trace};

/// Sends lifted values to the registry under the current module
struct ModuleAllocator<'pass> {
    registry: &'pass mut StaticRegistry,
    interner: &'pass Interner,
    module: Option<&'pass SimplePath>,
}

impl NewStatic for ModuleAllocator<'_> {
    fn new_static(&mut self, span: FileSpan, ty: TypeRef, value: ExprPtr) -> Result<SimplePath, PassError> {
        self.registry.allocate(self.interner, self.module, span, ty, value)
    }
}

/// The static borrow pass over one crate
///
/// Consumed by [`StaticBorrowConstants::run`], so a pass value is used for
/// exactly one traversal followed by one commit.
pub struct StaticBorrowConstants<R: TypeFacts> {
    resolve: R,
    registry: StaticRegistry,
    interner: Interner,
    current_module: Option<SimplePath>,
    promoted: usize,
}

impl<R: TypeFacts> StaticBorrowConstants<R> {
    /// Creates a pass for `krate` answering type questions with `resolve`
    pub fn new(krate: &Crate, resolve: R) -> Self {
        Self {
            resolve,
            registry: StaticRegistry::new(),
            interner: krate.interner.clone(),
            current_module: None,
            promoted: 0,
        }
    }

    /// Walks `krate`, then inserts every lifted static
    ///
    /// # Errors
    ///
    /// Returns `PassError` on a malformed crate or when a lifted value
    /// cannot be evaluated. The crate may be partially rewritten on error.
    #[instrument(skip_all)]
    pub fn run(mut self, krate: &mut Crate) -> Result<PassReport, PassError> {
        debug!(state = "TraversingCrate", "static borrow pass started");
        self.visit_crate(krate)?;
        debug!(state = "Committing", promoted = self.promoted, queued = self.registry.len(), "crate traversed");
        let statics_per_module = self.registry.commit(krate)?;
        debug!(state = "Done", "statics committed");
        Ok(PassReport {
            promoted: self.promoted,
            statics_per_module,
        })
    }

    fn classify(&mut self, expr: &mut ExprPtr) -> Result<(), PassError> {
        let lifted_state = expr.state.as_ref().map(ExprState::derive_typechecked);
        let mut allocator = ModuleAllocator {
            registry: &mut self.registry,
            interner: &self.interner,
            module: self.current_module.as_ref(),
        };
        let mut classifier = Classifier::new(&self.resolve, &mut allocator, lifted_state);
        classifier.visit_root(expr)?;
        self.promoted += classifier.promoted();
        Ok(())
    }

    fn render(&self, path: &SimplePath) -> String {
        HirPrinter::new(&self.interner).simple_path(path)
    }

    /// Runs `body` inside an impl whose items live in `src_module`
    fn in_impl<F>(&mut self, src_module: SimplePath, params: GenericParams, body: F) -> Result<(), PassError>
    where
        F: FnOnce(&mut Self) -> Result<(), PassError>,
    {
        if !self.resolve.module_exists(&src_module) {
            return Err(PassError::UnknownModule {
                path: self.render(&src_module),
            });
        }
        trace!(module = %self.render(&src_module), "entering impl");
        let parent = self.current_module.replace(src_module);
        let result = self.with_impl_generics(params, body);
        self.current_module = parent;
        result
    }

    fn with_impl_generics<F>(&mut self, params: GenericParams, body: F) -> Result<(), PassError>
    where
        F: FnOnce(&mut Self) -> Result<(), PassError>,
    {
        let saved = self.resolve.set_impl_generics(Some(params));
        let result = body(self);
        self.resolve.set_impl_generics(saved);
        result
    }

    fn with_item_generics<F>(&mut self, params: GenericParams, body: F) -> Result<(), PassError>
    where
        F: FnOnce(&mut Self) -> Result<(), PassError>,
    {
        let saved = self.resolve.set_item_generics(Some(params));
        let result = body(self);
        self.resolve.set_item_generics(saved);
        result
    }
}

impl<R: TypeFacts> Visitor for StaticBorrowConstants<R> {
    type Error = PassError;

    fn visit_module(&mut self, path: &SimplePath, module: &mut Module) -> Result<(), PassError> {
        trace!(module = %self.render(path), "entering module");
        let parent = self.current_module.replace(path.clone());
        let result = walk_module(self, path, module);
        self.current_module = parent;
        result
    }

    fn visit_type_impl(&mut self, imp: &mut TypeImpl) -> Result<(), PassError> {
        let (src_module, params) = (imp.src_module.clone(), imp.params.clone());
        self.in_impl(src_module, params, |this| walk_type_impl(this, imp))
    }

    fn visit_trait_impl(&mut self, imp: &mut TraitImpl) -> Result<(), PassError> {
        let (src_module, params) = (imp.src_module.clone(), imp.params.clone());
        self.in_impl(src_module, params, |this| walk_trait_impl(this, imp))
    }

    fn visit_function(&mut self, name: Symbol, item: &mut Function) -> Result<(), PassError> {
        self.with_item_generics(item.params.clone(), |this| {
            walk_function_signature(this, item)?;
            match &mut item.code {
                Some(code) => {
                    trace!(function = this.interner.resolve(name), "classifying body");
                    this.classify(code)
                }
                None => Ok(()),
            }
        })
    }

    fn visit_static(&mut self, _name: Symbol, item: &mut Static) -> Result<(), PassError> {
        self.visit_type(&mut item.ty)?;
        match &mut item.value {
            Some(value) => self.classify(value),
            None => Ok(()),
        }
    }

    fn visit_constant(&mut self, _name: Symbol, item: &mut Constant) -> Result<(), PassError> {
        self.with_item_generics(item.params.clone(), |this| {
            walk_generic_params(this, &mut item.params)?;
            this.visit_type(&mut item.ty)?;
            match &mut item.value {
                Some(value) => this.classify(value),
                None => Ok(()),
            }
        })
    }

    fn visit_struct(&mut self, name: Symbol, item: &mut Struct) -> Result<(), PassError> {
        self.with_impl_generics(item.params.clone(), |this| walk_struct(this, name, item))
    }

    fn visit_enum(&mut self, _name: Symbol, item: &mut Enum) -> Result<(), PassError> {
        self.with_impl_generics(item.params.clone(), |this| {
            walk_generic_params(this, &mut item.params)?;
            match &mut item.data {
                EnumData::Value { variants, .. } => {
                    for variant in variants {
                        if let Some(expr) = &mut variant.expr {
                            this.classify(expr)?;
                        }
                    }
                }
                EnumData::Data(variants) => {
                    for DataVariant { ty, .. } in variants {
                        this.visit_type(ty)?;
                    }
                }
            }
            Ok(())
        })
    }

    fn visit_union(&mut self, name: Symbol, item: &mut Union) -> Result<(), PassError> {
        self.with_impl_generics(item.params.clone(), |this| walk_union(this, name, item))
    }

    fn visit_trait(&mut self, name: Symbol, item: &mut Trait) -> Result<(), PassError> {
        self.with_impl_generics(item.params.clone(), |this| walk_trait(this, name, item))
    }

    fn visit_type_alias(&mut self, name: Symbol, item: &mut TypeAlias) -> Result<(), PassError> {
        self.with_impl_generics(item.params.clone(), |this| walk_type_alias(this, name, item))
    }

    fn visit_type(&mut self, ty: &mut TypeRef) -> Result<(), PassError> {
        match ty {
            TypeRef::Array { inner, size } => {
                self.visit_type(inner)?;
                if let ArraySize::Unevaluated(ConstGeneric::Unevaluated(expr)) = size {
                    trace!("classifying array size");
                    self.classify(expr)?;
                }
                Ok(())
            }
            _ => walk_type(self, ty),
        }
    }

    fn visit_expr(&mut self, expr: &mut ExprPtr) -> Result<(), PassError> {
        Err(PassError::BareExpression { span: expr.span() })
    }
}
