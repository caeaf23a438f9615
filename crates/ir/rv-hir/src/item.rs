//! Crate, modules and items

use crate::expr::ExprPtr;
use crate::path::{PathParams, SimplePath};
use crate::ty::{CoreType, GenericParams, TypeRef};
use crate::value::ConstValue;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use rv_intern::{Interner, Symbol};

/// Who may name an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publicity {
    /// `pub`
    Public,
    /// Visible in its module and descendants
    Private,
    /// Not nameable from source, used for compiler-made items
    None,
}

/// An item together with its visibility
#[derive(Debug, Clone, PartialEq)]
pub struct VisEnt<T> {
    /// Visibility
    pub publicity: Publicity,
    /// The item
    pub ent: T,
}

impl<T> VisEnt<T> {
    /// Wraps an item
    pub fn new(publicity: Publicity, ent: T) -> Self {
        Self { publicity, ent }
    }
}

/// Symbol linkage of a function or static
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Linkage {
    /// External symbol name, if fixed
    pub name: Option<String>,
}

/// Function item
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Generic parameters
    pub params: GenericParams,
    /// Arguments
    pub args: Vec<(Symbol, TypeRef)>,
    /// Return type
    pub ret: TypeRef,
    /// Body, `None` for declarations
    pub code: Option<ExprPtr>,
    /// Symbol linkage
    pub linkage: Linkage,
}

/// Static item
#[derive(Debug, Clone, PartialEq)]
pub struct Static {
    /// Symbol linkage
    pub linkage: Linkage,
    /// `static mut`
    pub is_mut: bool,
    /// Declared type
    pub ty: TypeRef,
    /// Initializer, `None` for extern statics
    pub value: Option<ExprPtr>,
    /// Evaluated initializer
    pub value_res: Option<ConstValue>,
    /// Whether the compiler created this static
    pub value_generated: bool,
}

impl Static {
    /// Immutable static awaiting evaluation
    pub fn new(ty: TypeRef, value: ExprPtr) -> Self {
        Self {
            linkage: Linkage::default(),
            is_mut: false,
            ty,
            value: Some(value),
            value_res: None,
            value_generated: false,
        }
    }
}

/// Constant item
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// Generic parameters (associated constants)
    pub params: GenericParams,
    /// Declared type
    pub ty: TypeRef,
    /// Initializer, `None` for required trait constants
    pub value: Option<ExprPtr>,
    /// Evaluated initializer
    pub value_res: Option<ConstValue>,
}

impl Constant {
    /// Non-generic constant awaiting evaluation
    pub fn new(ty: TypeRef, value: ExprPtr) -> Self {
        Self {
            params: GenericParams::default(),
            ty,
            value: Some(value),
            value_res: None,
        }
    }
}

/// Items in the value namespace of a module
#[derive(Debug, Clone, PartialEq)]
pub enum ValueItem {
    /// Function
    Function(Function),
    /// Static
    Static(Static),
    /// Constant
    Constant(Constant),
    /// Re-export of another value
    Import(SimplePath),
}

/// Fields of a struct
#[derive(Debug, Clone, PartialEq)]
pub enum StructData {
    /// `struct S;`
    Unit,
    /// `struct S(A, B);`
    Tuple(Vec<TypeRef>),
    /// `struct S { a: A }`
    Named(Vec<(Symbol, TypeRef)>),
}

/// Struct definition
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    /// Generic parameters
    pub params: GenericParams,
    /// Fields
    pub data: StructData,
}

/// Variant of a field-less enum
#[derive(Debug, Clone, PartialEq)]
pub struct ValueVariant {
    /// Variant name
    pub name: Symbol,
    /// Explicit discriminant expression
    pub expr: Option<ExprPtr>,
    /// Discriminant value
    pub val: u64,
}

/// Variant of an enum with data
#[derive(Debug, Clone, PartialEq)]
pub struct DataVariant {
    /// Variant name
    pub name: Symbol,
    /// Payload type, `()` for unit variants
    pub ty: TypeRef,
}

/// Variants of an enum
#[derive(Debug, Clone, PartialEq)]
pub enum EnumData {
    /// C-like enum with discriminants
    Value {
        /// Discriminant representation
        repr: CoreType,
        /// Variants
        variants: Vec<ValueVariant>,
    },
    /// Enum whose variants carry data
    Data(Vec<DataVariant>),
}

/// Enum definition
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    /// Generic parameters
    pub params: GenericParams,
    /// Variants
    pub data: EnumData,
}

/// Union definition
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    /// Generic parameters
    pub params: GenericParams,
    /// Overlapping fields
    pub variants: Vec<(Symbol, TypeRef)>,
}

/// Value items a trait declares
#[derive(Debug, Clone, PartialEq)]
pub enum TraitValueItem {
    /// Method, with a default body if provided
    Function(Function),
    /// Associated constant, with a default if provided
    Constant(Constant),
    /// Associated static
    Static(Static),
}

/// Trait definition
#[derive(Debug, Clone, PartialEq)]
pub struct Trait {
    /// Generic parameters
    pub params: GenericParams,
    /// Declared values
    pub values: IndexMap<Symbol, TraitValueItem>,
}

/// Type alias
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    /// Generic parameters
    pub params: GenericParams,
    /// Aliased type
    pub ty: TypeRef,
}

/// Items in the type namespace of a module
#[derive(Debug, Clone, PartialEq)]
pub enum TypeItem {
    /// Child module
    Module(Module),
    /// Struct
    Struct(Struct),
    /// Enum
    Enum(Enum),
    /// Union
    Union(Union),
    /// Trait
    Trait(Trait),
    /// Type alias
    TypeAlias(TypeAlias),
}

/// Module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Value namespace
    pub value_items: IndexMap<Symbol, VisEnt<ValueItem>>,
    /// Type namespace, including child modules
    pub mod_items: IndexMap<Symbol, VisEnt<TypeItem>>,
}

impl Module {
    /// Empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value item, replacing any previous item of that name
    pub fn add_value(&mut self, name: Symbol, publicity: Publicity, item: ValueItem) {
        self.value_items.insert(name, VisEnt::new(publicity, item));
    }

    /// Adds a type item, replacing any previous item of that name
    pub fn add_type(&mut self, name: Symbol, publicity: Publicity, item: TypeItem) {
        self.mod_items.insert(name, VisEnt::new(publicity, item));
    }

    /// Value item named `name`
    pub fn value(&self, name: Symbol) -> Option<&ValueItem> {
        self.value_items.get(&name).map(|vis| &vis.ent)
    }

    /// Child module named `name`
    pub fn child(&self, name: Symbol) -> Option<&Self> {
        match self.mod_items.get(&name) {
            Some(VisEnt {
                ent: TypeItem::Module(module),
                ..
            }) => Some(module),
            _ => None,
        }
    }

    /// Mutable child module named `name`
    pub fn child_mut(&mut self, name: Symbol) -> Option<&mut Self> {
        match self.mod_items.get_mut(&name) {
            Some(VisEnt {
                ent: TypeItem::Module(module),
                ..
            }) => Some(module),
            _ => None,
        }
    }
}

/// Inherent impl block
#[derive(Debug, Clone, PartialEq)]
pub struct TypeImpl {
    /// Impl generics
    pub params: GenericParams,
    /// Self type
    pub ty: TypeRef,
    /// Methods and associated functions
    pub methods: IndexMap<Symbol, Function>,
    /// Associated constants
    pub constants: IndexMap<Symbol, Constant>,
    /// Module the impl was written in
    pub src_module: SimplePath,
}

/// Trait impl block
#[derive(Debug, Clone, PartialEq)]
pub struct TraitImpl {
    /// Impl generics
    pub params: GenericParams,
    /// Implemented trait
    pub trait_path: SimplePath,
    /// Trait arguments
    pub trait_args: PathParams,
    /// Self type
    pub ty: TypeRef,
    /// Method implementations
    pub methods: IndexMap<Symbol, Function>,
    /// Associated constant values
    pub constants: IndexMap<Symbol, Constant>,
    /// Associated statics
    pub statics: IndexMap<Symbol, Static>,
    /// Associated types
    pub types: IndexMap<Symbol, TypeRef>,
    /// Module the impl was written in
    pub src_module: SimplePath,
}

/// A whole compilation unit
#[derive(Debug, Clone)]
pub struct Crate {
    /// Interner owning every symbol in the crate
    pub interner: Interner,
    /// Root module
    pub root_module: Module,
    /// Inherent impls
    pub type_impls: Vec<TypeImpl>,
    /// Trait impls
    pub trait_impls: Vec<TraitImpl>,
    /// Language items by name (`unsafe_cell`, `freeze`, ...)
    pub lang_items: FxHashMap<String, SimplePath>,
}

impl Crate {
    /// Empty crate
    pub fn new(interner: Interner) -> Self {
        Self {
            interner,
            root_module: Module::new(),
            type_impls: Vec::new(),
            trait_impls: Vec::new(),
            lang_items: FxHashMap::default(),
        }
    }

    /// Module at `path`
    pub fn get_mod_by_path(&self, path: &SimplePath) -> Option<&Module> {
        path.components
            .iter()
            .try_fold(&self.root_module, |module, name| module.child(*name))
    }

    /// Mutable module at `path`
    pub fn get_mod_by_path_mut(&mut self, path: &SimplePath) -> Option<&mut Module> {
        let mut module = &mut self.root_module;
        for name in &path.components {
            module = module.child_mut(*name)?;
        }
        Some(module)
    }

    /// Value item at `path`
    pub fn get_value_by_path(&self, path: &SimplePath) -> Option<&ValueItem> {
        let name = path.last()?;
        self.get_mod_by_path(&path.parent()?)?.value(name)
    }

    /// Type item at `path`
    pub fn get_typeitem_by_path(&self, path: &SimplePath) -> Option<&TypeItem> {
        let name = path.last()?;
        let module = self.get_mod_by_path(&path.parent()?)?;
        module.mod_items.get(&name).map(|vis| &vis.ent)
    }

    /// Path registered for a language item
    pub fn lang_item(&self, name: &str) -> Option<&SimplePath> {
        self.lang_items.get(name)
    }
}
