//! Deferred storage for lifted values
//!
//! Statics cannot be added to a module while the crate is being walked, so
//! they are queued here per module and inserted once the walk is over.

use crate::error::PassError;
use indexmap::IndexMap;
use rv_const_eval::{ConstError, ConstValue, Evaluator, NewValue};
use rv_hir::{
    Crate, ExprPtr, ExprStage, ExprState, HirPrinter, Linkage, Publicity, SimplePath, Static, TypeRef, ValueItem,
};
use rv_intern::{Interner, Symbol};
use rv_span::FileSpan;
use tracing::{debug, instrument, trace};

/// Name of the `index`-th static lifted out of a module
pub fn lifted_name(index: usize) -> String {
    format!("lifted#{index}")
}

/// A value waiting to become a static
#[derive(Debug, Clone)]
struct PendingStatic {
    name: Symbol,
    path: SimplePath,
    span: FileSpan,
    ty: TypeRef,
    value: ExprPtr,
}

/// Queue of new statics, keyed by owning module
#[derive(Debug, Default)]
pub struct StaticRegistry {
    pending: IndexMap<SimplePath, Vec<PendingStatic>>,
}

impl StaticRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of statics waiting to be inserted
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues `value` as the next lifted static of `module`
    ///
    /// A value without lexical state gets a type-checked state for `module`.
    ///
    /// # Errors
    ///
    /// Returns [`PassError::NoCurrentModule`] when `module` is `None`.
    pub fn allocate(
        &mut self,
        interner: &Interner,
        module: Option<&SimplePath>,
        span: FileSpan,
        ty: TypeRef,
        mut value: ExprPtr,
    ) -> Result<SimplePath, PassError> {
        let module = module.ok_or(PassError::NoCurrentModule { span })?;
        let queue = self.pending.entry(module.clone()).or_default();
        let name = interner.intern(&lifted_name(queue.len()));
        let path = module.join(name);
        if value.state.is_none() {
            let mut state = ExprState::new(module.clone());
            state.stage = ExprStage::Typecheck;
            value.state = Some(state);
        }
        trace!(path = %HirPrinter::new(interner).simple_path(&path), "queued static");
        queue.push(PendingStatic {
            name,
            path: path.clone(),
            span,
            ty,
            value,
        });
        Ok(path)
    }

    /// Inserts every queued static, then evaluates each one
    ///
    /// All statics are in place before the first evaluation, so a value may
    /// refer to any static lifted in the same run regardless of allocation
    /// order. Evaluation itself follows allocation order. Returns the number
    /// inserted per module.
    ///
    /// # Errors
    ///
    /// Returns `PassError` if a value fails to evaluate, if evaluation would
    /// need yet another static, if a module has disappeared, or if a name is
    /// already taken.
    #[instrument(skip_all, fields(statics = self.len()))]
    pub fn commit(self, krate: &mut Crate) -> Result<IndexMap<SimplePath, usize>, PassError> {
        let interner = krate.interner.clone();
        let printer = HirPrinter::new(&interner);
        let mut counts = IndexMap::new();
        let mut inserted = Vec::with_capacity(self.len());

        for (module_path, queue) in self.pending {
            counts.insert(module_path.clone(), queue.len());
            let module = krate
                .get_mod_by_path_mut(&module_path)
                .ok_or_else(|| PassError::UnknownModule {
                    path: printer.simple_path(&module_path),
                })?;
            for pending in queue {
                if module.value_items.contains_key(&pending.name) {
                    return Err(PassError::DuplicateItem {
                        path: printer.simple_path(&pending.path),
                    });
                }
                trace!(path = %printer.simple_path(&pending.path), "inserting static");
                module.add_value(
                    pending.name,
                    Publicity::None,
                    ValueItem::Static(Static {
                        linkage: Linkage::default(),
                        is_mut: false,
                        ty: pending.ty,
                        value: Some(pending.value),
                        value_res: None,
                        value_generated: true,
                    }),
                );
                inserted.push((pending.path, pending.span));
            }
        }

        for (path, span) in inserted {
            let value_res = evaluate(krate, &path, span, &printer)?;
            debug!(path = %printer.simple_path(&path), "evaluated static");
            if let Some(item) = static_mut(krate, &path) {
                item.value_res = Some(value_res);
            }
        }
        Ok(counts)
    }
}

fn static_mut<'krate>(krate: &'krate mut Crate, path: &SimplePath) -> Option<&'krate mut Static> {
    let name = path.last()?;
    let module = krate.get_mod_by_path_mut(&path.parent()?)?;
    match &mut module.value_items.get_mut(&name)?.ent {
        ValueItem::Static(item) => Some(item),
        _ => None,
    }
}

fn evaluate(
    krate: &Crate,
    path: &SimplePath,
    span: FileSpan,
    printer: &HirPrinter<'_>,
) -> Result<ConstValue, PassError> {
    let Some(ValueItem::Static(Static {
        ty, value: Some(value), ..
    })) = krate.get_value_by_path(path)
    else {
        return Err(PassError::Evaluation {
            path: printer.simple_path(path),
            source: ConstError::UnknownPath {
                path: printer.simple_path(path),
                span,
            },
        });
    };
    let mut refuse = RefuseNewValues::default();
    let result = Evaluator::new(span, krate, &mut refuse).evaluate_constant(path, value, ty);
    match (result, refuse.attempted) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(span)) => Err(PassError::NestedAllocation {
            path: printer.simple_path(path),
            span,
        }),
        (Err(source), None) => Err(PassError::Evaluation {
            path: printer.simple_path(path),
            source,
        }),
    }
}

/// Hook that refuses every request for further storage
#[derive(Debug, Default)]
struct RefuseNewValues {
    attempted: Option<FileSpan>,
}

impl NewValue for RefuseNewValues {
    fn new_static(&mut self, span: FileSpan, _ty: TypeRef, _value: ConstValue) -> Result<SimplePath, ConstError> {
        self.attempted.get_or_insert(span);
        Err(ConstError::NewStaticRefused { span })
    }
}
