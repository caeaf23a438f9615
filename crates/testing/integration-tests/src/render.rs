//! Plain-text dump of a crate for snapshot tests

use rv_hir::{
    ConstValue, Constant, Crate, EnumData, Function, HirPrinter, Module, Publicity, Static, TypeItem, ValueItem,
};
use rv_intern::Symbol;

/// Renders every module, enum discriminant and impl of `krate`
///
/// One item per line, nested modules and impls indented by four spaces.
/// Evaluated statics show their value after `=>`.
pub fn render_crate(krate: &Crate) -> String {
    let mut renderer = Renderer::new(krate);
    renderer.module(&krate.root_module);
    for imp in &krate.type_impls {
        let header = format!(
            "impl {} in {} {{",
            renderer.printer.ty(&imp.ty),
            renderer.printer.simple_path(&imp.src_module)
        );
        renderer.line(&header);
        renderer.depth += 1;
        for (name, item) in &imp.methods {
            renderer.function("", *name, item);
        }
        for (name, item) in &imp.constants {
            renderer.constant("", *name, item);
        }
        renderer.depth -= 1;
        renderer.line("}");
    }
    for imp in &krate.trait_impls {
        let header = format!(
            "impl {} for {} in {} {{",
            renderer.printer.simple_path(&imp.trait_path),
            renderer.printer.ty(&imp.ty),
            renderer.printer.simple_path(&imp.src_module)
        );
        renderer.line(&header);
        renderer.depth += 1;
        for (name, item) in &imp.methods {
            renderer.function("", *name, item);
        }
        for (name, item) in &imp.constants {
            renderer.constant("", *name, item);
        }
        for (name, item) in &imp.statics {
            renderer.static_item("", *name, item);
        }
        renderer.depth -= 1;
        renderer.line("}");
    }
    renderer.out
}

/// Renders an evaluated constant
pub fn render_value(krate: &Crate, value: &ConstValue) -> String {
    Renderer::new(krate).value(value)
}

struct Renderer<'krate> {
    krate: &'krate Crate,
    printer: HirPrinter<'krate>,
    depth: usize,
    out: String,
}

impl<'krate> Renderer<'krate> {
    fn new(krate: &'krate Crate) -> Self {
        Self {
            krate,
            printer: HirPrinter::new(&krate.interner),
            depth: 0,
            out: String::new(),
        }
    }

    fn name(&self, name: Symbol) -> &'krate str {
        self.krate.interner.resolve(name)
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(&"    ".repeat(self.depth));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn module(&mut self, module: &Module) {
        for (name, entry) in &module.mod_items {
            let name = self.name(*name);
            match &entry.ent {
                TypeItem::Module(child) => {
                    self.line(&format!("{}mod {name} {{", visibility(entry.publicity)));
                    self.depth += 1;
                    self.module(child);
                    self.depth -= 1;
                    self.line("}");
                }
                TypeItem::Enum(item) => {
                    if let EnumData::Value { variants, .. } = &item.data {
                        self.line(&format!("enum {name} {{"));
                        self.depth += 1;
                        for variant in variants {
                            let variant_name = self.name(variant.name);
                            let text = match &variant.expr {
                                Some(expr) => format!("{variant_name} = {},", self.printer.expr(&expr.node)),
                                None => format!("{variant_name},"),
                            };
                            self.line(&text);
                        }
                        self.depth -= 1;
                        self.line("}");
                    }
                }
                TypeItem::Struct(_) | TypeItem::Union(_) | TypeItem::Trait(_) | TypeItem::TypeAlias(_) => {}
            }
        }
        for (name, entry) in &module.value_items {
            let prefix = visibility(entry.publicity);
            match &entry.ent {
                ValueItem::Function(item) => self.function(prefix, *name, item),
                ValueItem::Static(item) => self.static_item(prefix, *name, item),
                ValueItem::Constant(item) => self.constant(prefix, *name, item),
                ValueItem::Import(target) => {
                    let text = format!("{prefix}use {} as {}", self.printer.simple_path(target), self.name(*name));
                    self.line(&text);
                }
            }
        }
    }

    fn function(&mut self, prefix: &str, name: Symbol, item: &Function) {
        let name = self.name(name);
        let text = match &item.code {
            Some(code) => format!("{prefix}fn {name} = {}", self.printer.expr(&code.node)),
            None => format!("{prefix}fn {name};"),
        };
        self.line(&text);
    }

    fn constant(&mut self, prefix: &str, name: Symbol, item: &Constant) {
        let name = self.name(name);
        let ty = self.printer.ty(&item.ty);
        let text = match &item.value {
            Some(value) => format!("{prefix}const {name}: {ty} = {}", self.printer.expr(&value.node)),
            None => format!("{prefix}const {name}: {ty};"),
        };
        self.line(&text);
    }

    fn static_item(&mut self, prefix: &str, name: Symbol, item: &Static) {
        let keyword = if item.is_mut { "static mut" } else { "static" };
        let mut text = format!("{prefix}{keyword} {}: {}", self.name(name), self.printer.ty(&item.ty));
        if let Some(value) = &item.value {
            text.push_str(&format!(" = {}", self.printer.expr(&value.node)));
        }
        if let Some(value) = &item.value_res {
            text.push_str(&format!(" => {}", self.value(value)));
        }
        self.line(&text);
    }

    fn value(&self, value: &ConstValue) -> String {
        match value {
            ConstValue::Int(value) => value.to_string(),
            ConstValue::UInt(value) => value.to_string(),
            ConstValue::Float(value) => format!("{value:?}"),
            ConstValue::Bool(value) => value.to_string(),
            ConstValue::Char(value) => format!("{value:?}"),
            ConstValue::String(value) => format!("{value:?}"),
            ConstValue::Bytes(bytes) => format!("b\"{}\"", bytes.escape_ascii()),
            ConstValue::Unit => "()".to_owned(),
            ConstValue::Tuple(items) => format!("({})", self.values(items)),
            ConstValue::Struct { fields } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{}: {}", self.name(*name), self.value(value)))
                    .collect();
                format!("{{ {} }}", fields.join(", "))
            }
            ConstValue::Variant { path, fields } => {
                format!("{}({})", self.printer.simple_path(path), self.values(fields))
            }
            ConstValue::Array(items) => format!("[{}]", self.values(items)),
            ConstValue::Repeat { value, len } => format!("[{}; {len}]", self.value(value)),
            ConstValue::Ref(path) => format!("&{}", self.printer.simple_path(path)),
            ConstValue::FnPtr(path) => format!("fn {}", self.printer.path(path)),
        }
    }

    fn values(&self, items: &[ConstValue]) -> String {
        let items: Vec<String> = items.iter().map(|item| self.value(item)).collect();
        items.join(", ")
    }
}

fn visibility(publicity: Publicity) -> &'static str {
    match publicity {
        Publicity::Public => "pub ",
        Publicity::Private => "",
        Publicity::None => "pub(none) ",
    }
}
