//! Integration test utilities for the static borrow pass
//!
//! Crates are built by hand the way type checking would leave them: every
//! node typed, every code-bearing item owning a root with lexical state.

pub mod build;
mod render;

pub use render::{render_crate, render_value};

use indexmap::IndexMap;
use rv_hir::{
    Constant, Crate, ExprNodeP, Function, GenericGroup, GenericParams, GenericPath, GenericRef, Linkage, Module, PathParams,
    Publicity, SimplePath, Static, Struct, StructData, TypeItem, TypeParamDef, TypeRef, ValueItem,
};
use rv_intern::{Interner, Symbol};
use rv_static_borrow::{PassError, PassReport};

/// A crate under construction
pub struct Fixture {
    /// The crate being built
    pub krate: Crate,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Empty crate
    #[must_use]
    pub fn new() -> Self {
        Self {
            krate: Crate::new(Interner::new()),
        }
    }

    /// Interns `name`
    pub fn sym(&self, name: &str) -> Symbol {
        self.krate.interner.intern(name)
    }

    /// Path from the crate root through `components`
    pub fn path(&self, components: &[&str]) -> SimplePath {
        SimplePath::new(components.iter().map(|name| self.sym(name)).collect())
    }

    fn module_mut(&mut self, path: &SimplePath) -> &mut Module {
        self.krate
            .get_mod_by_path_mut(path)
            .unwrap_or_else(|| panic!("fixture module {path:?} does not exist"))
    }

    fn add_value(&mut self, module: &SimplePath, name: &str, item: ValueItem) -> SimplePath {
        let name = self.sym(name);
        self.module_mut(module).add_value(name, Publicity::Public, item);
        module.join(name)
    }

    /// Adds an empty child module
    pub fn add_module(&mut self, parent: &SimplePath, name: &str) -> SimplePath {
        self.add_type(parent, name, TypeItem::Module(Module::new()))
    }

    /// Adds a type item
    pub fn add_type(&mut self, module: &SimplePath, name: &str, item: TypeItem) -> SimplePath {
        let name = self.sym(name);
        self.module_mut(module).add_type(name, Publicity::Public, item);
        module.join(name)
    }

    /// Adds `fn name() -> typeof(body) { body }`
    pub fn add_function(&mut self, module: &SimplePath, name: &str, body: ExprNodeP) -> SimplePath {
        self.add_generic_function(module, name, GenericParams::default(), body)
    }

    /// Adds a function with generic parameters `params`
    pub fn add_generic_function(
        &mut self,
        module: &SimplePath,
        name: &str,
        params: GenericParams,
        body: ExprNodeP,
    ) -> SimplePath {
        let function = function(module, params, body);
        self.add_value(module, name, ValueItem::Function(function))
    }

    /// Adds `const name: typeof(value) = value`
    pub fn add_constant(&mut self, module: &SimplePath, name: &str, value: ExprNodeP) -> SimplePath {
        let ty = value.ty.clone();
        let item = Constant::new(ty, build::root(value, module));
        self.add_value(module, name, ValueItem::Constant(item))
    }

    /// Adds `static name: typeof(value) = value`
    pub fn add_static(&mut self, module: &SimplePath, name: &str, value: ExprNodeP) -> SimplePath {
        let ty = value.ty.clone();
        let item = Static::new(ty, build::root(value, module));
        self.add_value(module, name, ValueItem::Static(item))
    }

    /// Adds a struct with named fields
    pub fn add_struct(
        &mut self,
        module: &SimplePath,
        name: &str,
        params: GenericParams,
        fields: Vec<(&str, TypeRef)>,
    ) -> SimplePath {
        let fields = fields.into_iter().map(|(field, ty)| (self.sym(field), ty)).collect();
        let item = Struct {
            params,
            data: StructData::Named(fields),
        };
        self.add_type(module, name, TypeItem::Struct(item))
    }

    /// Type parameter `name` declared in `group` at `index`
    pub fn type_param(&self, name: &str, group: GenericGroup, index: u16) -> (TypeParamDef, TypeRef) {
        let name = self.sym(name);
        let def = TypeParamDef {
            name,
            bounds: Vec::new(),
        };
        (def, TypeRef::Generic(GenericRef { name, group, index }))
    }

    /// Declares `struct UnsafeCell<T> { value: T }` as the `unsafe_cell`
    /// language item, returning its path
    pub fn add_unsafe_cell(&mut self) -> SimplePath {
        let (def, param) = self.type_param("T", GenericGroup::Impl, 0);
        let params = GenericParams {
            types: vec![def],
            values: Vec::new(),
        };
        let path = self.add_struct(&SimplePath::root(), "UnsafeCell", params, vec![("value", param)]);
        self.krate.lang_items.insert("unsafe_cell".to_owned(), path.clone());
        path
    }

    /// `path::<args>`
    pub fn generic_path(path: &SimplePath, args: Vec<TypeRef>) -> GenericPath {
        GenericPath::new(path.clone(), PathParams::new(args))
    }

    /// Nominal type at `path` with arguments `args`
    pub fn struct_ty(path: &SimplePath, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::new_struct(Self::generic_path(path, args))
    }

    /// Runs the pass with facts derived from the crate
    ///
    /// # Errors
    ///
    /// Returns whatever the pass reports.
    pub fn run(&mut self) -> Result<PassReport, PassError> {
        rv_static_borrow::run(&mut self.krate)
    }

    /// Text dump of the whole crate
    pub fn render(&self) -> String {
        render_crate(&self.krate)
    }

    /// Static at `path`
    pub fn static_at(&self, path: &SimplePath) -> &Static {
        match self.krate.get_value_by_path(path) {
            Some(ValueItem::Static(item)) => item,
            other => panic!("expected a static at {path:?}, found {other:?}"),
        }
    }
}

/// Function owning `body`, returning its type
pub fn function(module: &SimplePath, params: GenericParams, body: ExprNodeP) -> Function {
    Function {
        params,
        args: Vec::new(),
        ret: body.ty.clone(),
        code: Some(build::root(body, module)),
        linkage: Linkage::default(),
    }
}

/// Single-entry ordered map
pub fn single<V>(key: Symbol, value: V) -> IndexMap<Symbol, V> {
    let mut map = IndexMap::new();
    map.insert(key, value);
    map
}
