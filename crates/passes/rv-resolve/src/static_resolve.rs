//! Crate index answering [`TypeFacts`] queries

use crate::facts::{Certainty, TypeFacts, ValueKind};
use rustc_hash::{FxHashMap, FxHashSet};
use rv_hir::{
    Crate, EnumData, GenericGroup, GenericParams, GenericRef, Module, Path, PathParams, SimplePath,
    StructData, TraitValueItem, TypeItem, TypeRef, ValueItem,
};
use rv_intern::Symbol;
use rv_span::FileSpan;
use std::mem;
use tracing::trace;

/// Nominal types nested deeper than this are reported as [`Certainty::Maybe`]
const MAX_TYPE_DEPTH: u32 = 64;

/// Longest chain of re-exports followed when resolving a value
const MAX_IMPORT_DEPTH: u32 = 16;

/// Value namespace entry
#[derive(Debug, Clone)]
enum IndexedValue {
    Kind(ValueKind),
    Import(SimplePath),
}

/// Field types of a nominal type, written against its own generics
#[derive(Debug, Clone)]
enum TypeDef {
    /// Struct, union or enum
    Fields(Vec<TypeRef>),
    /// Type alias
    Alias(TypeRef),
}

/// Owned index of a crate's items
///
/// Built once from a [`Crate`]; later changes to the crate are not seen.
#[derive(Debug, Clone, Default)]
pub struct StaticResolve {
    values: FxHashMap<SimplePath, IndexedValue>,
    types: FxHashMap<SimplePath, TypeDef>,
    modules: FxHashSet<SimplePath>,
    /// Inherent associated values keyed by self type path
    inherent: FxHashMap<SimplePath, FxHashMap<Symbol, ValueKind>>,
    /// Inherent associated values of non-nominal self types
    inherent_other: Vec<(TypeRef, FxHashMap<Symbol, ValueKind>)>,
    /// Values declared by traits, and provided by impls of traits
    trait_values: FxHashMap<SimplePath, FxHashMap<Symbol, ValueKind>>,
    unsafe_cell: Option<SimplePath>,
    freeze: Option<SimplePath>,
    impl_generics: Option<GenericParams>,
    item_generics: Option<GenericParams>,
}

impl StaticResolve {
    /// Indexes every module, item and impl of `krate`
    pub fn new(krate: &Crate) -> Self {
        let mut resolve = Self {
            unsafe_cell: krate.lang_item("unsafe_cell").cloned(),
            freeze: krate.lang_item("freeze").cloned(),
            ..Self::default()
        };
        resolve.index_module(&SimplePath::root(), &krate.root_module);

        for imp in &krate.type_impls {
            let values = imp
                .methods
                .keys()
                .map(|name| (*name, ValueKind::Function))
                .chain(imp.constants.keys().map(|name| (*name, ValueKind::Constant)));
            match imp.ty.type_path() {
                Some(path) => resolve.inherent.entry(path.clone()).or_default().extend(values),
                None => match resolve.inherent_other.iter_mut().find(|(ty, _)| *ty == imp.ty) {
                    Some((_, existing)) => existing.extend(values),
                    None => resolve.inherent_other.push((imp.ty.clone(), values.collect())),
                },
            }
        }

        for imp in &krate.trait_impls {
            let entry = resolve.trait_values.entry(imp.trait_path.clone()).or_default();
            for name in imp.methods.keys() {
                entry.entry(*name).or_insert(ValueKind::Function);
            }
            for name in imp.constants.keys() {
                entry.entry(*name).or_insert(ValueKind::Constant);
            }
            for name in imp.statics.keys() {
                entry.entry(*name).or_insert(ValueKind::Static);
            }
        }

        trace!(
            values = resolve.values.len(),
            types = resolve.types.len(),
            modules = resolve.modules.len(),
            "indexed crate"
        );
        resolve
    }

    fn index_module(&mut self, path: &SimplePath, module: &Module) {
        self.modules.insert(path.clone());

        for (name, entry) in &module.value_items {
            let value = match &entry.ent {
                ValueItem::Function(_) => IndexedValue::Kind(ValueKind::Function),
                ValueItem::Static(_) => IndexedValue::Kind(ValueKind::Static),
                ValueItem::Constant(_) => IndexedValue::Kind(ValueKind::Constant),
                ValueItem::Import(target) => IndexedValue::Import(target.clone()),
            };
            self.values.insert(path.join(*name), value);
        }

        for (name, entry) in &module.mod_items {
            let item_path = path.join(*name);
            match &entry.ent {
                TypeItem::Module(child) => self.index_module(&item_path, child),
                TypeItem::Struct(item) => {
                    let fields = match &item.data {
                        StructData::Unit => Vec::new(),
                        StructData::Tuple(fields) => {
                            self.values
                                .insert(item_path.clone(), IndexedValue::Kind(ValueKind::Function));
                            fields.clone()
                        }
                        StructData::Named(fields) => fields.iter().map(|(_, ty)| ty.clone()).collect(),
                    };
                    self.types.insert(item_path, TypeDef::Fields(fields));
                }
                TypeItem::Enum(item) => {
                    let fields = match &item.data {
                        EnumData::Value { .. } => Vec::new(),
                        EnumData::Data(variants) => {
                            for variant in variants {
                                if variant.ty != TypeRef::unit() {
                                    self.values.insert(
                                        item_path.join(variant.name),
                                        IndexedValue::Kind(ValueKind::Function),
                                    );
                                }
                            }
                            variants.iter().map(|variant| variant.ty.clone()).collect()
                        }
                    };
                    self.types.insert(item_path, TypeDef::Fields(fields));
                }
                TypeItem::Union(item) => {
                    let fields = item.variants.iter().map(|(_, ty)| ty.clone()).collect();
                    self.types.insert(item_path, TypeDef::Fields(fields));
                }
                TypeItem::Trait(item) => {
                    let values = item
                        .values
                        .iter()
                        .map(|(name, value)| {
                            let kind = match value {
                                TraitValueItem::Function(_) => ValueKind::Function,
                                TraitValueItem::Constant(_) => ValueKind::Constant,
                                TraitValueItem::Static(_) => ValueKind::Static,
                            };
                            (*name, kind)
                        })
                        .collect::<FxHashMap<_, _>>();
                    self.trait_values.entry(item_path).or_default().extend(values);
                }
                TypeItem::TypeAlias(item) => {
                    self.types.insert(item_path, TypeDef::Alias(item.ty.clone()));
                }
            }
        }
    }

    fn resolve_simple(&self, path: &SimplePath, depth: u32) -> ValueKind {
        match self.values.get(path) {
            Some(IndexedValue::Kind(kind)) => *kind,
            Some(IndexedValue::Import(target)) if depth < MAX_IMPORT_DEPTH => {
                self.resolve_simple(target, depth + 1)
            }
            Some(IndexedValue::Import(_)) | None => ValueKind::NotFound,
        }
    }

    fn inherent_value(&self, ty: &TypeRef, item: Symbol) -> ValueKind {
        let values = match ty.type_path() {
            Some(path) => self.inherent.get(path),
            None => self
                .inherent_other
                .iter()
                .find(|(other, _)| other == ty)
                .map(|(_, values)| values),
        };
        values
            .and_then(|values| values.get(&item))
            .copied()
            .unwrap_or(ValueKind::NotFound)
    }

    fn generic_is_freeze(&self, generic: &GenericRef) -> bool {
        let Some(freeze) = &self.freeze else {
            return false;
        };
        let params = match generic.group {
            GenericGroup::Impl => self.impl_generics.as_ref(),
            GenericGroup::Item => self.item_generics.as_ref(),
            GenericGroup::SelfType => None,
        };
        params
            .and_then(|params| params.type_param(generic.index))
            .is_some_and(|def| def.bounds.contains(freeze))
    }

    fn interior_mutable(&self, ty: &TypeRef, depth: u32) -> Certainty {
        if depth > MAX_TYPE_DEPTH {
            trace!(depth, "type nesting limit reached");
            return Certainty::Maybe;
        }
        match ty {
            TypeRef::Primitive(_)
            | TypeRef::Borrow { .. }
            | TypeRef::Pointer { .. }
            | TypeRef::Function { .. }
            | TypeRef::Diverge => Certainty::No,
            TypeRef::Tuple(elements) => elements
                .iter()
                .map(|element| self.interior_mutable(element, depth + 1))
                .fold(Certainty::No, Certainty::combine),
            TypeRef::Array { inner, .. } | TypeRef::Slice(inner) => self.interior_mutable(inner, depth + 1),
            TypeRef::TraitObject { .. } => Certainty::Maybe,
            TypeRef::Generic(generic) => {
                if self.generic_is_freeze(generic) {
                    Certainty::No
                } else {
                    Certainty::Maybe
                }
            }
            TypeRef::Path { path, .. } => {
                if self.unsafe_cell.as_ref() == Some(&path.path) {
                    return Certainty::Yes;
                }
                match self.types.get(&path.path) {
                    Some(TypeDef::Fields(fields)) => fields
                        .iter()
                        .map(|field| self.interior_mutable(&substitute(field, &path.params), depth + 1))
                        .fold(Certainty::No, Certainty::combine),
                    Some(TypeDef::Alias(aliased)) => {
                        self.interior_mutable(&substitute(aliased, &path.params), depth + 1)
                    }
                    None => Certainty::Maybe,
                }
            }
        }
    }
}

/// Replaces type-level generic parameters in `ty` with `args`
///
/// Parameters without a matching argument are left in place.
fn substitute(ty: &TypeRef, args: &PathParams) -> TypeRef {
    let mut out = ty.clone();
    if !args.is_empty() {
        substitute_in_place(&mut out, args);
    }
    out
}

fn substitute_in_place(ty: &mut TypeRef, args: &PathParams) {
    match ty {
        TypeRef::Generic(generic) if generic.group == GenericGroup::Impl => {
            if let Some(arg) = args.types.get(usize::from(generic.index)) {
                *ty = arg.clone();
            }
        }
        TypeRef::Generic(_) | TypeRef::Primitive(_) | TypeRef::Diverge => {}
        TypeRef::Tuple(elements) => {
            for element in elements {
                substitute_in_place(element, args);
            }
        }
        TypeRef::Path { path, .. } | TypeRef::TraitObject { trait_path: path } => {
            for param in &mut path.params.types {
                substitute_in_place(param, args);
            }
        }
        TypeRef::Array { inner, .. }
        | TypeRef::Slice(inner)
        | TypeRef::Borrow { inner, .. }
        | TypeRef::Pointer { inner, .. } => substitute_in_place(inner, args),
        TypeRef::Function { args: fn_args, ret } => {
            for arg in fn_args {
                substitute_in_place(arg, args);
            }
            substitute_in_place(ret, args);
        }
    }
}

impl TypeFacts for StaticResolve {
    fn type_is_interior_mutable(&self, _span: FileSpan, ty: &TypeRef) -> Certainty {
        self.interior_mutable(ty, 0)
    }

    fn get_value(&self, _span: FileSpan, path: &Path) -> ValueKind {
        match path {
            Path::Generic(gp) => self.resolve_simple(&gp.path, 0),
            Path::UfcsInherent { ty, item, .. } => self.inherent_value(ty, *item),
            Path::UfcsKnown { trait_path, item, .. } => self
                .trait_values
                .get(&trait_path.path)
                .and_then(|values| values.get(item))
                .copied()
                .unwrap_or(ValueKind::NotFound),
        }
    }

    fn module_exists(&self, path: &SimplePath) -> bool {
        self.modules.contains(path)
    }

    fn set_impl_generics(&mut self, params: Option<GenericParams>) -> Option<GenericParams> {
        mem::replace(&mut self.impl_generics, params)
    }

    fn set_item_generics(&mut self, params: Option<GenericParams>) -> Option<GenericParams> {
        mem::replace(&mut self.item_generics, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_hir::{
        BorrowKind, Constant, CoreType, DataVariant, Enum, ExprKind, ExprNode, ExprPtr, GenericPath,
        Literal, Publicity, Struct, TypeBinding, TypeImpl, TypeParamDef, Union,
    };
    use indexmap::IndexMap;
    use rv_intern::Interner;

    struct Fixture {
        interner: Interner,
        krate: Crate,
    }

    impl Fixture {
        fn new() -> Self {
            let interner = Interner::new();
            let mut krate = Crate::new(interner.clone());
            let cell = interner.intern("UnsafeCell");
            let freeze = interner.intern("Freeze");
            krate.root_module.add_type(
                cell,
                Publicity::Public,
                TypeItem::Struct(Struct {
                    params: GenericParams::default(),
                    data: StructData::Named(vec![(interner.intern("value"), generic(&interner, "T", 0))]),
                }),
            );
            krate
                .lang_items
                .insert("unsafe_cell".to_owned(), SimplePath::new(vec![cell]));
            krate
                .lang_items
                .insert("freeze".to_owned(), SimplePath::new(vec![freeze]));
            Self { interner, krate }
        }

        fn path(&self, names: &[&str]) -> SimplePath {
            SimplePath::new(names.iter().map(|name| self.interner.intern(name)).collect())
        }

        fn named(&self, name: &str, args: Vec<TypeRef>) -> TypeRef {
            TypeRef::Path {
                path: GenericPath::new(self.path(&[name]), PathParams::new(args)),
                binding: TypeBinding::Struct,
            }
        }

        fn add_struct(&mut self, name: &str, fields: Vec<TypeRef>) {
            let sym = self.interner.intern(name);
            self.krate.root_module.add_type(
                sym,
                Publicity::Public,
                TypeItem::Struct(Struct {
                    params: GenericParams::default(),
                    data: StructData::Tuple(fields),
                }),
            );
        }
    }

    fn generic(interner: &Interner, name: &str, index: u16) -> TypeRef {
        TypeRef::Generic(GenericRef {
            name: interner.intern(name),
            group: GenericGroup::Impl,
            index,
        })
    }

    fn unit_expr() -> ExprPtr {
        ExprPtr::new(ExprNode::new(
            ExprKind::Literal(Literal::Bool(true)),
            TypeRef::Primitive(CoreType::Bool),
            FileSpan::generated(),
        ))
    }

    #[test]
    fn test_primitives_and_references_are_frozen() {
        let fixture = Fixture::new();
        let resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();
        let cell = fixture.named("UnsafeCell", vec![TypeRef::Primitive(CoreType::U8)]);

        assert_eq!(
            resolve.type_is_interior_mutable(span, &TypeRef::Primitive(CoreType::I32)),
            Certainty::No
        );
        assert_eq!(
            resolve.type_is_interior_mutable(span, &TypeRef::new_borrow(BorrowKind::Shared, cell.clone())),
            Certainty::No
        );
        assert_eq!(resolve.type_is_interior_mutable(span, &cell), Certainty::Yes);
        assert_eq!(
            resolve.type_is_interior_mutable(span, &TypeRef::new_array(cell, 4)),
            Certainty::Yes
        );
    }

    #[test]
    fn test_struct_fields_use_substituted_arguments() {
        let mut fixture = Fixture::new();
        let param = generic(&fixture.interner, "T", 0);
        fixture.add_struct("Wrapper", vec![param, TypeRef::Primitive(CoreType::U32)]);
        let cell = fixture.named("UnsafeCell", vec![TypeRef::Primitive(CoreType::U8)]);
        let plain = fixture.named("Wrapper", vec![TypeRef::Primitive(CoreType::U8)]);
        let celled = fixture.named("Wrapper", vec![cell]);
        let resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();

        assert_eq!(resolve.type_is_interior_mutable(span, &plain), Certainty::No);
        assert_eq!(resolve.type_is_interior_mutable(span, &celled), Certainty::Yes);
    }

    #[test]
    fn test_unknown_and_dynamic_types_are_undecided() {
        let mut fixture = Fixture::new();
        let unknown = fixture.named("Missing", Vec::new());
        let dyn_ty = TypeRef::TraitObject {
            trait_path: fixture.path(&["Trait"]).into(),
        };
        fixture.add_struct("Recursive", vec![TypeRef::new_slice(fixture.named("Recursive", Vec::new()))]);
        let recursive = fixture.named("Recursive", Vec::new());
        let resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();

        assert_eq!(resolve.type_is_interior_mutable(span, &unknown), Certainty::Maybe);
        assert_eq!(resolve.type_is_interior_mutable(span, &dyn_ty), Certainty::Maybe);
        assert_eq!(resolve.type_is_interior_mutable(span, &recursive), Certainty::Maybe);
    }

    #[test]
    fn test_union_and_data_enum_fields() {
        let mut fixture = Fixture::new();
        let cell = fixture.named("UnsafeCell", vec![TypeRef::Primitive(CoreType::U8)]);
        let union_name = fixture.interner.intern("Bits");
        fixture.krate.root_module.add_type(
            union_name,
            Publicity::Public,
            TypeItem::Union(Union {
                params: GenericParams::default(),
                variants: vec![(fixture.interner.intern("raw"), TypeRef::Primitive(CoreType::U64))],
            }),
        );
        let enum_name = fixture.interner.intern("Slot");
        fixture.krate.root_module.add_type(
            enum_name,
            Publicity::Public,
            TypeItem::Enum(Enum {
                params: GenericParams::default(),
                data: EnumData::Data(vec![
                    DataVariant {
                        name: fixture.interner.intern("Empty"),
                        ty: TypeRef::unit(),
                    },
                    DataVariant {
                        name: fixture.interner.intern("Full"),
                        ty: TypeRef::Tuple(vec![cell]),
                    },
                ]),
            }),
        );
        let bits = fixture.named("Bits", Vec::new());
        let slot = fixture.named("Slot", Vec::new());
        let resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();

        assert_eq!(resolve.type_is_interior_mutable(span, &bits), Certainty::No);
        assert_eq!(resolve.type_is_interior_mutable(span, &slot), Certainty::Yes);
        assert_eq!(
            resolve.get_value(span, &Path::from(fixture.path(&["Slot", "Full"]))),
            ValueKind::Function
        );
        assert_eq!(
            resolve.get_value(span, &Path::from(fixture.path(&["Slot", "Empty"]))),
            ValueKind::NotFound
        );
    }

    #[test]
    fn test_generic_parameter_needs_freeze_bound() {
        let fixture = Fixture::new();
        let mut resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();
        let param = TypeRef::Generic(GenericRef {
            name: fixture.interner.intern("T"),
            group: GenericGroup::Item,
            index: 0,
        });

        assert_eq!(resolve.type_is_interior_mutable(span, &param), Certainty::Maybe);

        let bounded = GenericParams {
            types: vec![TypeParamDef {
                name: fixture.interner.intern("T"),
                bounds: vec![fixture.path(&["Freeze"])],
            }],
            values: Vec::new(),
        };
        let previous = resolve.set_item_generics(Some(bounded));
        assert!(previous.is_none());
        assert_eq!(resolve.type_is_interior_mutable(span, &param), Certainty::No);

        let restored = resolve.set_item_generics(previous);
        assert!(restored.is_some());
        assert_eq!(resolve.type_is_interior_mutable(span, &param), Certainty::Maybe);
    }

    #[test]
    fn test_values_follow_imports_and_impls() {
        let mut fixture = Fixture::new();
        let limit = fixture.interner.intern("LIMIT");
        let alias = fixture.interner.intern("ALIAS");
        let loop_a = fixture.interner.intern("LOOP_A");
        let loop_b = fixture.interner.intern("LOOP_B");
        let root = &mut fixture.krate.root_module;
        root.add_value(
            limit,
            Publicity::Public,
            ValueItem::Constant(Constant::new(TypeRef::Primitive(CoreType::Bool), unit_expr())),
        );
        root.add_value(alias, Publicity::Public, ValueItem::Import(SimplePath::new(vec![limit])));
        root.add_value(loop_a, Publicity::Public, ValueItem::Import(SimplePath::new(vec![loop_b])));
        root.add_value(loop_b, Publicity::Public, ValueItem::Import(SimplePath::new(vec![loop_a])));

        let max = fixture.interner.intern("MAX");
        let mut constants = IndexMap::new();
        constants.insert(max, Constant::new(TypeRef::Primitive(CoreType::Bool), unit_expr()));
        let holder = fixture.named("Holder", Vec::new());
        fixture.add_struct("Holder", Vec::new());
        fixture.krate.type_impls.push(TypeImpl {
            params: GenericParams::default(),
            ty: holder.clone(),
            methods: IndexMap::new(),
            constants,
            src_module: SimplePath::root(),
        });

        let resolve = StaticResolve::new(&fixture.krate);
        let span = FileSpan::generated();
        assert_eq!(resolve.get_value(span, &Path::from(fixture.path(&["ALIAS"]))), ValueKind::Constant);
        assert_eq!(resolve.get_value(span, &Path::from(fixture.path(&["LOOP_A"]))), ValueKind::NotFound);
        assert_eq!(resolve.get_value(span, &Path::from(fixture.path(&["Holder"]))), ValueKind::Function);
        let assoc = Path::UfcsInherent {
            ty: Box::new(holder),
            item: max,
            params: PathParams::default(),
        };
        assert_eq!(resolve.get_value(span, &assoc), ValueKind::Constant);
        assert!(resolve.module_exists(&SimplePath::root()));
        assert!(!resolve.module_exists(&fixture.path(&["Holder"])));
    }
}
