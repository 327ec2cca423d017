//! AST node model consumed by the lowering engine.
//!
//! The parser hands over a finished tree; lowering reads it and never rewrites it,
//! apart from element-type propagation into array literals, which declaration sites
//! apply to their own copy.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Expr {
    Int {
        value: i64,
    },
    Float {
        value: f64,
    },
    Bool {
        value: bool,
    },
    Str(StringLiteral),
    Ident {
        name: String,
    },
    Binary(BinaryOp),
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Postfix {
        op: String,
        operand: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call(FunctionCall),
    Member {
        object: Box<Expr>,
        member: String,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Array(ArrayLiteral),
    ArrayRepeat {
        value: Box<Expr>,
        count: Box<Expr>,
    },
    Pod(PodLiteral),
    EnumAccess {
        enum_name: String,
        value_name: String,
        #[serde(default)]
        component_name: Option<String>,
    },
    Construct {
        component_name: String,
        #[serde(default)]
        args: Vec<CallArg>,
    },
    Match(MatchExpr),
    Reference {
        operand: Box<Expr>,
    },
    Move {
        operand: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Int { value }
    }

    pub fn float(value: f64) -> Self {
        Expr::Float { value }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Bool { value }
    }

    pub fn string(value: &str) -> Self {
        Expr::Str(StringLiteral::new(value))
    }

    pub fn ident(name: &str) -> Self {
        Expr::Ident {
            name: name.to_string(),
        }
    }

    pub fn binary(left: Expr, op: &str, right: Expr) -> Self {
        Expr::Binary(BinaryOp::new(left, op, right))
    }

    pub fn unary(op: &str, operand: Expr) -> Self {
        Expr::Unary {
            op: op.to_string(),
            operand: Box::new(operand),
        }
    }

    pub fn postfix(operand: Expr, op: &str) -> Self {
        Expr::Postfix {
            op: op.to_string(),
            operand: Box::new(operand),
        }
    }

    pub fn call(name: &str, args: Vec<CallArg>) -> Self {
        Expr::Call(FunctionCall::new(name, args))
    }

    pub fn member(object: Expr, member: &str) -> Self {
        Expr::Member {
            object: Box::new(object),
            member: member.to_string(),
        }
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::Index {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn enum_access(enum_name: &str, value_name: &str) -> Self {
        Expr::EnumAccess {
            enum_name: enum_name.to_string(),
            value_name: value_name.to_string(),
            component_name: None,
        }
    }

    /// A string-typed expression is a string literal or a `+` chain whose leftmost
    /// operand is one.
    pub fn is_string_expr(&self) -> bool {
        match self {
            Expr::Str(_) => true,
            Expr::Binary(bin) => bin.is_string_chain(),
            _ => false,
        }
    }

    pub fn is_concat_chain(&self) -> bool {
        matches!(self, Expr::Binary(bin) if bin.is_string_chain())
    }

    /// True when the value can be computed without reading any runtime state.
    pub fn is_static(&self) -> bool {
        match self {
            Expr::Int { .. } | Expr::Float { .. } | Expr::Bool { .. } => true,
            Expr::EnumAccess { .. } => true,
            Expr::Str(lit) => !lit.has_interpolation(),
            Expr::Binary(bin) => bin.left.is_static() && bin.right.is_static(),
            Expr::Unary { operand, .. } => operand.is_static(),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => condition.is_static() && then_expr.is_static() && else_expr.is_static(),
            Expr::Array(arr) => arr.elements.iter().all(Expr::is_static),
            Expr::ArrayRepeat { value, count } => value.is_static() && count.is_static(),
            Expr::Pod(pod) => pod.fields.iter().all(|f| f.value.is_static()),
            Expr::Match(m) => m.is_static(),
            Expr::Ident { .. }
            | Expr::Postfix { .. }
            | Expr::Call(_)
            | Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Construct { .. }
            | Expr::Reference { .. }
            | Expr::Move { .. } => false,
        }
    }
}

/// Binary operator node. Whether it roots a string concatenation chain is decided
/// once at construction and stored on the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBinaryOp", into = "RawBinaryOp")]
pub struct BinaryOp {
    pub left: Box<Expr>,
    pub op: String,
    pub right: Box<Expr>,
    string_chain: bool,
}

#[derive(Serialize, Deserialize)]
struct RawBinaryOp {
    left: Box<Expr>,
    op: String,
    right: Box<Expr>,
}

impl BinaryOp {
    pub fn new(left: Expr, op: &str, right: Expr) -> Self {
        let string_chain = op == "+" && left.is_string_expr();
        BinaryOp {
            left: Box::new(left),
            op: op.to_string(),
            right: Box::new(right),
            string_chain,
        }
    }

    pub fn is_string_chain(&self) -> bool {
        self.string_chain
    }
}

impl From<RawBinaryOp> for BinaryOp {
    fn from(raw: RawBinaryOp) -> Self {
        BinaryOp::new(*raw.left, &raw.op, *raw.right)
    }
}

impl From<BinaryOp> for RawBinaryOp {
    fn from(bin: BinaryOp) -> Self {
        RawBinaryOp {
            left: bin.left,
            op: bin.op,
            right: bin.right,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRING LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringLiteral {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPart {
    pub is_expr: bool,
    pub content: String,
}

impl StringLiteral {
    pub fn new(value: &str) -> Self {
        StringLiteral {
            value: value.to_string(),
        }
    }

    /// Splits the raw text into literal and `{expr}` parts.
    ///
    /// `\{` and `\}` produce literal braces, an unclosed `{` is literal text and
    /// an empty `{}` is kept verbatim.
    pub fn parts(&self) -> Vec<StringPart> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let chars: Vec<char> = self.value.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\\' && i + 1 < chars.len() && (chars[i + 1] == '{' || chars[i + 1] == '}') {
                current.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '{' {
                let close = chars[i + 1..].iter().position(|&ch| ch == '}');
                match close {
                    Some(offset) => {
                        let inner: String = chars[i + 1..i + 1 + offset].iter().collect();
                        if inner.trim().is_empty() {
                            current.push_str("{}");
                        } else {
                            if !current.is_empty() {
                                parts.push(StringPart {
                                    is_expr: false,
                                    content: std::mem::take(&mut current),
                                });
                            }
                            parts.push(StringPart {
                                is_expr: true,
                                content: inner.trim().to_string(),
                            });
                        }
                        i += offset + 2;
                        continue;
                    }
                    None => {
                        current.push(c);
                        i += 1;
                        continue;
                    }
                }
            }
            current.push(c);
            i += 1;
        }

        if !current.is_empty() {
            parts.push(StringPart {
                is_expr: false,
                content: current,
            });
        }
        parts
    }

    pub fn has_interpolation(&self) -> bool {
        self.parts().iter().any(|p| p.is_expr)
    }

    /// Text of a literal without interpolation, with escapes resolved.
    pub fn static_text(&self) -> String {
        self.parts().into_iter().map(|p| p.content).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArg {
    #[serde(default)]
    pub name: Option<String>,
    pub value: Expr,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_move: bool,
}

impl CallArg {
    pub fn positional(value: Expr) -> Self {
        CallArg {
            name: None,
            value,
            is_reference: false,
            is_move: false,
        }
    }

    pub fn by_ref(value: Expr) -> Self {
        CallArg {
            is_reference: true,
            ..Self::positional(value)
        }
    }

    pub fn named(name: &str, value: Expr) -> Self {
        CallArg {
            name: Some(name.to_string()),
            ..Self::positional(value)
        }
    }
}

/// `name` is the dotted source name, e.g. `canvas.setSize` or `System.log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<CallArg>,
    #[serde(default)]
    pub line: u32,
}

impl FunctionCall {
    pub fn new(name: &str, args: Vec<CallArg>) -> Self {
        FunctionCall {
            name: name.to_string(),
            args,
            line: 0,
        }
    }

    /// Splits `receiver.method` at the last dot.
    pub fn split_receiver(&self) -> Option<(&str, &str)> {
        let dot = self.name.rfind('.')?;
        if dot == 0 || dot + 1 >= self.name.len() {
            return None;
        }
        Some((&self.name[..dot], &self.name[dot + 1..]))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AGGREGATE LITERALS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayLiteral {
    pub elements: Vec<Expr>,
    #[serde(default)]
    pub element_type: Option<String>,
}

impl ArrayLiteral {
    pub fn new(elements: Vec<Expr>) -> Self {
        ArrayLiteral {
            elements,
            element_type: None,
        }
    }

    /// Records the element type and pushes it into anonymous aggregate elements.
    pub fn propagate_element_type(&mut self, element_type: &str) {
        self.element_type = Some(element_type.to_string());
        for element in &mut self.elements {
            match element {
                Expr::Pod(pod) if pod.type_name.is_none() => {
                    pod.type_name = Some(element_type.to_string());
                }
                Expr::Array(inner) => {
                    if let Some(inner_type) = element_type.strip_suffix("[]") {
                        inner.propagate_element_type(inner_type);
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodField {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodLiteral {
    #[serde(default)]
    pub type_name: Option<String>,
    pub fields: Vec<PodField>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MATCH
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchExpr {
    pub subject: Box<Expr>,
    pub arms: Vec<MatchArm>,
    #[serde(default)]
    pub else_arm: Option<Box<Expr>>,
    #[serde(default)]
    pub line: u32,
}

impl MatchExpr {
    fn is_static(&self) -> bool {
        self.subject.is_static()
            && self.arms.iter().all(|arm| {
                arm.body.is_static()
                    && match &arm.pattern {
                        Pattern::Literal { value } => value.is_static(),
                        Pattern::Enum { .. } => true,
                        Pattern::Pod { fields, .. } => fields
                            .iter()
                            .all(|f| f.value.as_ref().map_or(true, Expr::is_static)),
                    }
            })
            && self.else_arm.as_ref().map_or(true, |e| e.is_static())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Pattern {
    Literal {
        value: Expr,
    },
    Enum {
        enum_name: String,
        value_name: String,
        #[serde(default)]
        component_name: Option<String>,
    },
    /// Fields with a value compare, fields without one bind a local.
    Pod {
        #[serde(default)]
        type_name: Option<String>,
        fields: Vec<PodPatternField>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodPatternField {
    pub name: String,
    #[serde(default)]
    pub value: Option<Expr>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Stmt {
    VarDecl(VarDeclaration),
    Assign(Assignment),
    IndexAssign(IndexAssignment),
    MemberAssign(MemberAssignment),
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Expression {
        expression: Expr,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
    },
    ForRange {
        var_name: String,
        start: Expr,
        end: Expr,
        body: Box<Stmt>,
    },
    ForEach {
        var_name: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarDeclaration {
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub is_mutable: bool,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_move: bool,
    #[serde(default)]
    pub is_public: bool,
}

impl VarDeclaration {
    pub fn new(type_name: &str, name: &str, initializer: Option<Expr>) -> Self {
        VarDeclaration {
            type_name: type_name.to_string(),
            name: name.to_string(),
            initializer,
            is_mutable: false,
            is_reference: false,
            is_move: false,
            is_public: false,
        }
    }

    pub fn mutable(mut self) -> Self {
        self.is_mutable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub is_move: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAssignment {
    pub array: Expr,
    pub index: Expr,
    pub value: Expr,
    #[serde(default)]
    pub compound_op: Option<String>,
    #[serde(default)]
    pub is_move: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAssignment {
    pub object: Expr,
    pub member: String,
    pub value: Expr,
    #[serde(default)]
    pub compound_op: Option<String>,
    #[serde(default)]
    pub is_move: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub is_mutable: bool,
    #[serde(default)]
    pub is_reference: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDef {
    pub name: String,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub is_public: bool,
}

fn default_return_type() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub type_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDef {
    pub name: String,
    /// Set for module-level definitions; component-local ones leave it empty.
    #[serde(default)]
    pub module_name: String,
    pub fields: Vec<DataField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

/// Constructor parameter of a component. Reference parameters are stored as
/// pointers and read through a dereference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentParam {
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub default_value: Option<Expr>,
    #[serde(default)]
    pub is_mutable: bool,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDependency {
    pub object: String,
    pub member: String,
}
