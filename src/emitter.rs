//! Expression emission.
//!
//! Every node renders to one text fragment given only the ambient type context
//! and schema. Calls are handled in `dispatch`, match expressions in
//! `match_lowerer` and concatenation chains in `formatter`.

use crate::ast::{ArrayLiteral, CallArg, Expr, PodLiteral, StringLiteral};
use crate::codegen::CodegenOptions;
use crate::error::CodegenResult;
use crate::schema::Schema;
use crate::scope::TypeContext;
use crate::types::{TypeResolver, RUNTIME_NAMESPACE};
use regex::Regex;

lazy_static::lazy_static! {
    static ref NAME_PATH: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
}

#[derive(Clone, Copy)]
pub struct Emitter<'a> {
    ctx: &'a TypeContext,
    schema: &'a Schema,
    options: &'a CodegenOptions,
}

impl<'a> Emitter<'a> {
    pub fn new(ctx: &'a TypeContext, schema: &'a Schema, options: &'a CodegenOptions) -> Self {
        Emitter {
            ctx,
            schema,
            options,
        }
    }

    pub fn context(&self) -> &'a TypeContext {
        self.ctx
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn options(&self) -> &'a CodegenOptions {
        self.options
    }

    pub fn resolver(&self) -> TypeResolver<'a> {
        TypeResolver::new(self.ctx, self.schema)
    }

    pub fn resolve_type(&self, name: &str) -> String {
        self.resolver().resolve(name)
    }

    pub fn emit_expr(&self, expr: &Expr) -> CodegenResult<String> {
        match expr {
            Expr::Int { value } => Ok(value.to_string()),
            Expr::Float { value } => Ok(format_float(*value)),
            Expr::Bool { value } => Ok(value.to_string()),
            Expr::Str(lit) => Ok(self.emit_string_literal(lit)),
            Expr::Ident { name } => Ok(self.emit_identifier(name)),
            Expr::Binary(bin) => {
                if bin.is_string_chain() {
                    return self.formatter_expr(expr);
                }
                Ok(format!(
                    "({} {} {})",
                    self.emit_expr(&bin.left)?,
                    bin.op,
                    self.emit_expr(&bin.right)?
                ))
            }
            Expr::Unary { op, operand } => Ok(format!("{}{}", op, self.emit_expr(operand)?)),
            Expr::Postfix { op, operand } => Ok(format!("{}{}", self.emit_expr(operand)?, op)),
            Expr::Ternary {
                condition,
                then_expr,
                else_expr,
            } => Ok(format!(
                "({} ? {} : {})",
                self.emit_expr(condition)?,
                self.emit_expr(then_expr)?,
                self.emit_expr(else_expr)?
            )),
            Expr::Call(call) => self.emit_call(call),
            Expr::Member { object, member } => self.emit_member(object, member),
            Expr::Index { array, index } => Ok(format!(
                "{}[{}]",
                self.emit_expr(array)?,
                self.emit_expr(index)?
            )),
            Expr::Array(arr) => self.emit_array(arr),
            Expr::ArrayRepeat { value, count } => self.emit_array_repeat(value, count),
            Expr::Pod(pod) => self.emit_pod(pod),
            Expr::EnumAccess {
                enum_name,
                value_name,
                component_name,
            } => Ok(self.emit_enum_access(component_name.as_deref(), enum_name, value_name)),
            Expr::Construct {
                component_name,
                args,
            } => self.emit_construct(component_name, args),
            Expr::Match(m) => self.emit_match(m),
            Expr::Reference { operand } => self.emit_expr(operand),
            Expr::Move { operand } => Ok(format!(
                "{}::move({})",
                RUNTIME_NAMESPACE,
                self.emit_expr(operand)?
            )),
        }
    }

    pub fn emit_identifier(&self, name: &str) -> String {
        if self.ctx.is_reference(name) {
            format!("(*{})", name)
        } else {
            name.to_string()
        }
    }

    /// Code for an embedded `{...}` fragment. A plain name or dotted path reads
    /// through a reference root like any identifier; other fragments are kept as written.
    pub fn emit_interpolated(&self, content: &str) -> String {
        let trimmed = content.trim();
        if NAME_PATH.is_match(trimmed) {
            self.emit_receiver(trimmed)
        } else {
            content.to_string()
        }
    }

    fn emit_string_literal(&self, lit: &StringLiteral) -> String {
        let parts = lit.parts();
        if !parts.iter().any(|p| p.is_expr) {
            return format!("\"{}\"", escape_string(&lit.static_text()));
        }
        let pieces: Vec<String> = parts
            .iter()
            .map(|p| {
                if p.is_expr {
                    self.emit_interpolated(&p.content)
                } else {
                    format!("\"{}\"", escape_string(&p.content))
                }
            })
            .collect();
        format!("{}::string::concat({})", RUNTIME_NAMESPACE, pieces.join(", "))
    }

    fn emit_member(&self, object: &Expr, member: &str) -> CodegenResult<String> {
        if let Expr::Ident { name } = object {
            if starts_uppercase(name) && self.ctx.classify(name).is_none() {
                if let Some(constant) = self
                    .schema
                    .methods_named(name, member)
                    .into_iter()
                    .find(|m| m.is_shared && m.is_constant)
                {
                    return Ok(constant.mapping_value.clone());
                }
            }
        }
        Ok(format!("{}.{}", self.emit_expr(object)?, member))
    }

    pub fn emit_array(&self, arr: &ArrayLiteral) -> CodegenResult<String> {
        let codes = arr
            .elements
            .iter()
            .map(|e| self.emit_expr(e))
            .collect::<CodegenResult<Vec<_>>>()?;
        Ok(format!("{{{}}}", codes.join(", ")))
    }

    /// Outside a declaration only a literal count can be expanded in place.
    fn emit_array_repeat(&self, value: &Expr, count: &Expr) -> CodegenResult<String> {
        let code = self.emit_expr(value)?;
        match count {
            Expr::Int { value: n } if *n >= 0 => {
                Ok(format!("{{{}}}", vec![code; *n as usize].join(", ")))
            }
            _ => {
                log::debug!(
                    "[CoiCodegen] array repeat with non-literal count outside a declaration"
                );
                Ok(format!("{{{}}}", code))
            }
        }
    }

    fn emit_pod(&self, pod: &PodLiteral) -> CodegenResult<String> {
        let fields = pod
            .fields
            .iter()
            .map(|f| Ok(format!(".{} = {}", f.name, self.emit_expr(&f.value)?)))
            .collect::<CodegenResult<Vec<_>>>()?;
        let type_name = pod
            .type_name
            .as_deref()
            .map(|t| self.resolve_type(t))
            .unwrap_or_default();
        Ok(format!("{}{{{}}}", type_name, fields.join(", ")))
    }

    pub fn emit_enum_access(&self, component: Option<&str>, enum_name: &str, value: &str) -> String {
        let source = match component {
            Some(c) => format!("{}.{}", c, enum_name),
            None => enum_name.to_string(),
        };
        format!("{}::{}", self.resolve_type(&source), value)
    }

    fn emit_construct(&self, component: &str, args: &[CallArg]) -> CodegenResult<String> {
        let type_name = self.resolve_type(component);
        let mut codes = Vec::with_capacity(args.len());
        for arg in args {
            let code = self.emit_expr(&arg.value)?;
            codes.push(if arg.is_reference { format!("&{}", code) } else { code });
        }
        if !args.is_empty() && args.iter().all(|a| a.name.is_some()) {
            let fields: Vec<String> = args
                .iter()
                .zip(codes)
                .map(|(a, code)| format!(".{} = {}", a.name.as_deref().unwrap_or_default(), code))
                .collect();
            return Ok(format!("{}{{{}}}", type_name, fields.join(", ")));
        }
        Ok(format!("{}({})", type_name, codes.join(", ")))
    }
}

pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}

pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Shortest decimal that round-trips, always with a fractional digit.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}
