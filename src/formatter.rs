//! Lowering of string concatenation chains onto the runtime's buffered formatter.
//!
//! A chain can appear where a value is expected (expression form, wrapped in an
//! immediately invoked lambda) or as an argument of a runtime call (block form,
//! where the call itself is emitted inside the formatter's scope).

use crate::ast::Expr;
use crate::emitter::{escape_string, Emitter};
use crate::error::CodegenResult;
use crate::types::RUNTIME_NAMESPACE;

pub const FORMATTER_BUFFER_SIZE: usize = 512;

/// Leaves of a left-leaning `+` chain in source order.
pub fn flatten_string_concat(expr: &Expr) -> Vec<&Expr> {
    let mut parts = Vec::new();
    collect_parts(expr, &mut parts);
    parts
}

fn collect_parts<'e>(expr: &'e Expr, out: &mut Vec<&'e Expr>) {
    match expr {
        Expr::Binary(bin) if bin.is_string_chain() => {
            collect_parts(&bin.left, out);
            collect_parts(&bin.right, out);
        }
        other => out.push(other),
    }
}

/// True for values that must go through the formatter rather than be passed as-is.
pub fn needs_formatter(expr: &Expr) -> bool {
    match expr {
        Expr::Binary(bin) => bin.is_string_chain(),
        Expr::Str(lit) => lit.has_interpolation(),
        _ => false,
    }
}

fn formatter_decl() -> String {
    format!(
        "{}::formatter<{}> _fmt;",
        RUNTIME_NAMESPACE, FORMATTER_BUFFER_SIZE
    )
}

impl<'a> Emitter<'a> {
    /// One `_fmt << (..);` per piece. Interpolated literals contribute their
    /// literal text and each embedded expression as separate pieces.
    pub fn formatter_appends(&self, expr: &Expr) -> CodegenResult<String> {
        let mut out = String::new();
        for part in flatten_string_concat(expr) {
            match part {
                Expr::Str(lit) => {
                    for piece in lit.parts() {
                        if piece.is_expr {
                            let code = self.emit_interpolated(&piece.content);
                            out.push_str(&format!("_fmt << ({}); ", code));
                        } else {
                            out.push_str(&format!("_fmt << (\"{}\"); ", escape_string(&piece.content)));
                        }
                    }
                }
                other => {
                    let code = self.emit_expr(other)?;
                    out.push_str(&format!("_fmt << ({}); ", code));
                }
            }
        }
        Ok(out)
    }

    pub fn formatter_expr(&self, expr: &Expr) -> CodegenResult<String> {
        let appends = self.formatter_appends(expr)?;
        Ok(format!(
            "([&]() {{ {} {}return {}::string(_fmt.c_str()); }}())",
            formatter_decl(),
            appends,
            RUNTIME_NAMESPACE
        ))
    }

    /// `prefix` and `suffix` surround the formatted text, e.g. `f(a, ` and `, b)`.
    pub fn formatter_block(&self, expr: &Expr, prefix: &str, suffix: &str) -> CodegenResult<String> {
        let appends = self.formatter_appends(expr)?;
        Ok(format!(
            "{{ {} {}{}_fmt.c_str(){}; }}",
            formatter_decl(),
            appends,
            prefix,
            suffix
        ))
    }
}
