//! Typed expression trees

use crate::path::{GenericPath, Path, SimplePath};
use crate::ty::{BorrowKind, GenericParams, TypeRef};
use rv_intern::Symbol;
use rv_span::FileSpan;

/// Owned link to a child expression
pub type ExprNodeP = Box<ExprNode>;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal, width given by the node type
    Integer(u128),
    /// Float literal
    Float(f64),
    /// Boolean literal
    Bool(bool),
    /// Character literal
    Char(char),
    /// String literal
    String(String),
    /// Byte string literal
    ByteString(Vec<u8>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    BoolAnd,
    /// `||`
    BoolOr,
}

impl BinOp {
    /// Source spelling
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::BoolAnd => "&&",
            Self::BoolOr => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniOp {
    /// Arithmetic negation
    Neg,
    /// Logical or bitwise inversion
    Not,
}

/// What a `PathValue` node was resolved to by type checking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathValueTarget {
    /// Not recorded
    Unknown,
    /// A function item
    Function,
    /// A static item
    Static,
    /// A constant item
    Constant,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal value
    Literal(Literal),
    /// Unit enum variant or unit struct
    UnitVariant {
        /// Variant or struct path
        path: GenericPath,
        /// Whether `path` names a unit struct
        is_struct: bool,
    },
    /// Reference to a named value item
    PathValue {
        /// Item path
        path: Path,
        /// Item kind recorded by type checking
        target: PathValueTarget,
    },
    /// Tuple construction
    Tuple(Vec<ExprNodeP>),
    /// Tuple variant or tuple struct construction
    TupleVariant {
        /// Variant or struct path
        path: GenericPath,
        /// Whether `path` names a tuple struct
        is_struct: bool,
        /// Field values
        args: Vec<ExprNodeP>,
    },
    /// `[a, b, c]`
    ArrayList(Vec<ExprNodeP>),
    /// `[value; size]`
    ArraySized {
        /// Repeated element
        value: ExprNodeP,
        /// Repeat count
        size: u64,
    },
    /// `Path { field: value, ..base }`
    StructLiteral {
        /// Struct or struct-variant path
        path: GenericPath,
        /// Functional update source
        base: Option<ExprNodeP>,
        /// Field initializers in source order
        fields: Vec<(Symbol, ExprNodeP)>,
    },
    /// Field projection, numeric names for tuples
    Field {
        /// Projected value
        value: ExprNodeP,
        /// Field name
        field: Symbol,
    },
    /// `value as T`, target type is the node type
    Cast {
        /// Cast operand
        value: ExprNodeP,
    },
    /// Implicit unsizing coercion, target type is the node type
    Unsize {
        /// Coerced value
        value: ExprNodeP,
    },
    /// `&value` / `&mut value`
    Borrow {
        /// Borrow kind
        kind: BorrowKind,
        /// Borrowed value
        value: ExprNodeP,
    },
    /// Local variable use
    Variable {
        /// Variable name
        name: Symbol,
        /// Binding slot
        slot: u32,
    },
    /// `let name = value`
    Let {
        /// Variable name
        name: Symbol,
        /// Binding slot
        slot: u32,
        /// Initializer
        value: Option<ExprNodeP>,
    },
    /// Block of statements with optional trailing value
    Block {
        /// Statements
        nodes: Vec<ExprNodeP>,
        /// Trailing value
        value: Option<ExprNodeP>,
    },
    /// Binary operation
    BinOp {
        /// Operator
        op: BinOp,
        /// Left operand
        left: ExprNodeP,
        /// Right operand
        right: ExprNodeP,
    },
    /// Unary operation
    UniOp {
        /// Operator
        op: UniOp,
        /// Operand
        value: ExprNodeP,
    },
    /// `*value`
    Deref {
        /// Dereferenced value
        value: ExprNodeP,
    },
    /// `value[index]`
    Index {
        /// Indexed value
        value: ExprNodeP,
        /// Index
        index: ExprNodeP,
    },
    /// Call of a named function
    CallPath {
        /// Callee path
        path: Path,
        /// Arguments
        args: Vec<ExprNodeP>,
    },
    /// Call of a function value
    CallValue {
        /// Callee
        value: ExprNodeP,
        /// Arguments
        args: Vec<ExprNodeP>,
    },
    /// `if cond { .. } else { .. }`
    If {
        /// Condition
        cond: ExprNodeP,
        /// Taken when true
        then_branch: ExprNodeP,
        /// Taken when false
        else_branch: Option<ExprNodeP>,
    },
    /// `place = value`
    Assign {
        /// Assigned place
        place: ExprNodeP,
        /// New value
        value: ExprNodeP,
    },
    /// `return value`
    Return(Option<ExprNodeP>),
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    /// Node kind and children
    pub kind: ExprKind,
    /// Resolved type
    pub ty: TypeRef,
    /// Source location
    pub span: FileSpan,
}

impl ExprNode {
    /// Creates a node
    pub fn new(kind: ExprKind, ty: TypeRef, span: FileSpan) -> Self {
        Self { kind, ty, span }
    }

    /// Creates a boxed node
    pub fn boxed(kind: ExprKind, ty: TypeRef, span: FileSpan) -> ExprNodeP {
        Box::new(Self::new(kind, ty, span))
    }

    /// Short kind name for logs and errors
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "Literal",
            ExprKind::UnitVariant { .. } => "UnitVariant",
            ExprKind::PathValue { .. } => "PathValue",
            ExprKind::Tuple(_) => "Tuple",
            ExprKind::TupleVariant { .. } => "TupleVariant",
            ExprKind::ArrayList(_) => "ArrayList",
            ExprKind::ArraySized { .. } => "ArraySized",
            ExprKind::StructLiteral { .. } => "StructLiteral",
            ExprKind::Field { .. } => "Field",
            ExprKind::Cast { .. } => "Cast",
            ExprKind::Unsize { .. } => "Unsize",
            ExprKind::Borrow { .. } => "Borrow",
            ExprKind::Variable { .. } => "Variable",
            ExprKind::Let { .. } => "Let",
            ExprKind::Block { .. } => "Block",
            ExprKind::BinOp { .. } => "BinOp",
            ExprKind::UniOp { .. } => "UniOp",
            ExprKind::Deref { .. } => "Deref",
            ExprKind::Index { .. } => "Index",
            ExprKind::CallPath { .. } => "CallPath",
            ExprKind::CallValue { .. } => "CallValue",
            ExprKind::If { .. } => "If",
            ExprKind::Assign { .. } => "Assign",
            ExprKind::Return(_) => "Return",
        }
    }

    /// Child slots in evaluation order
    pub fn children_mut(&mut self) -> Vec<&mut ExprNodeP> {
        match &mut self.kind {
            ExprKind::Literal(_)
            | ExprKind::UnitVariant { .. }
            | ExprKind::PathValue { .. }
            | ExprKind::Variable { .. } => Vec::new(),
            ExprKind::Tuple(items) | ExprKind::ArrayList(items) => items.iter_mut().collect(),
            ExprKind::TupleVariant { args, .. } | ExprKind::CallPath { args, .. } => {
                args.iter_mut().collect()
            }
            ExprKind::StructLiteral { base, fields, .. } => fields
                .iter_mut()
                .map(|(_, value)| value)
                .chain(base.as_mut())
                .collect(),
            ExprKind::ArraySized { value, .. }
            | ExprKind::Field { value, .. }
            | ExprKind::Cast { value }
            | ExprKind::Unsize { value }
            | ExprKind::Borrow { value, .. }
            | ExprKind::UniOp { value, .. }
            | ExprKind::Deref { value } => vec![value],
            ExprKind::Let { value, .. } | ExprKind::Return(value) => value.iter_mut().collect(),
            ExprKind::Block { nodes, value } => nodes.iter_mut().chain(value.as_mut()).collect(),
            ExprKind::BinOp { left, right, .. } => vec![left, right],
            ExprKind::Index { value, index } => vec![value, index],
            ExprKind::CallValue { value, args } => {
                let mut children = vec![value];
                children.extend(args.iter_mut());
                children
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![cond, then_branch];
                children.extend(else_branch.as_mut());
                children
            }
            ExprKind::Assign { place, value } => vec![value, place],
        }
    }
}

/// How far through the pipeline an expression root has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExprStage {
    /// As lowered from source
    Created,
    /// Type checked
    Typecheck,
    /// Post-typecheck expansion passes applied
    Expand,
    /// Lowered to MIR
    Mir,
}

/// Lexical context shared by every node under an expression root
#[derive(Debug, Clone, PartialEq)]
pub struct ExprState {
    /// Module the expression belongs to
    pub module: SimplePath,
    /// Traits in scope
    pub traits: Vec<SimplePath>,
    /// Generics of the enclosing impl, trait or type
    pub impl_generics: Option<GenericParams>,
    /// Generics of the enclosing item
    pub item_generics: Option<GenericParams>,
    /// Pipeline stage
    pub stage: ExprStage,
}

impl ExprState {
    /// Fresh state for an expression in `module`
    pub fn new(module: SimplePath) -> Self {
        Self {
            module,
            traits: Vec::new(),
            impl_generics: None,
            item_generics: None,
            stage: ExprStage::Created,
        }
    }

    /// State for code split out of this expression by the compiler
    ///
    /// Keeps the module, traits and generics, and marks the result as
    /// already type checked.
    #[must_use]
    pub fn derive_typechecked(&self) -> Self {
        Self {
            module: self.module.clone(),
            traits: self.traits.clone(),
            impl_generics: self.impl_generics.clone(),
            item_generics: self.item_generics.clone(),
            stage: ExprStage::Typecheck,
        }
    }
}

/// Root of an expression tree
#[derive(Debug, Clone, PartialEq)]
pub struct ExprPtr {
    /// Root node
    pub node: ExprNodeP,
    /// Lexical context
    pub state: Option<ExprState>,
    /// Types of local bindings, indexed by slot
    pub bindings: Vec<TypeRef>,
}

impl ExprPtr {
    /// Root without context
    pub fn new(node: ExprNode) -> Self {
        Self::from_boxed(Box::new(node), None)
    }

    /// Root around an existing boxed node
    pub fn from_boxed(node: ExprNodeP, state: Option<ExprState>) -> Self {
        Self {
            node,
            state,
            bindings: Vec::new(),
        }
    }

    /// Sets the lexical context
    #[must_use]
    pub fn with_state(mut self, state: ExprState) -> Self {
        self.state = Some(state);
        self
    }

    /// Type of the root node
    pub fn ty(&self) -> &TypeRef {
        &self.node.ty
    }

    /// Location of the root node
    pub fn span(&self) -> FileSpan {
        self.node.span
    }
}
