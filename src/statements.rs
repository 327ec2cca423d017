//! Statement emission.
//!
//! Every emitted statement ends with a newline. Writes that target a bound
//! collection are routed through `reactive`.

use crate::ast::{Assignment, Expr, IndexAssignment, MemberAssignment, Stmt, VarDeclaration};
use crate::emitter::{starts_uppercase, Emitter};
use crate::error::CodegenResult;
use crate::reactive::{CollectionOp, LoopTable};
use crate::types::{is_collection_type, RUNTIME_NAMESPACE};

pub struct StmtEmitter<'a> {
    expr: Emitter<'a>,
    loops: &'a LoopTable,
}

impl<'a> StmtEmitter<'a> {
    pub fn new(expr: Emitter<'a>, loops: &'a LoopTable) -> Self {
        StmtEmitter { expr, loops }
    }

    pub fn emit_all(&self, statements: &[Stmt]) -> CodegenResult<String> {
        let mut out = String::new();
        for stmt in statements {
            out.push_str(&self.emit(stmt)?);
        }
        Ok(out)
    }

    pub fn emit(&self, stmt: &Stmt) -> CodegenResult<String> {
        match stmt {
            Stmt::VarDecl(decl) => Ok(format!("{}\n", self.emit_var_decl(decl)?)),
            Stmt::Assign(assign) => self.emit_assignment(assign),
            Stmt::IndexAssign(assign) => self.emit_index_assignment(assign),
            Stmt::MemberAssign(assign) => self.emit_member_assignment(assign),
            Stmt::Return { value: Some(value) } => {
                Ok(format!("return {};\n", self.expr.emit_expr(value)?))
            }
            Stmt::Return { value: None } => Ok("return;\n".to_string()),
            Stmt::Expression { expression } => self.emit_expression_stmt(expression),
            Stmt::Block { statements } => Ok(format!("{{\n{}}}\n", self.emit_all(statements)?)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr.emit_expr(condition)?;
                let mut out = format!(
                    "if ({}) {}",
                    strip_outer_parens(&cond),
                    self.emit(then_branch)?
                );
                if let Some(else_branch) = else_branch {
                    let trimmed = out.trim_end().len();
                    out.truncate(trimmed);
                    out.push_str(" else ");
                    out.push_str(&self.emit(else_branch)?);
                }
                Ok(out)
            }
            Stmt::ForRange {
                var_name,
                start,
                end,
                body,
            } => Ok(format!(
                "for (int {v} = {}; {v} < {}; {v}++) {}",
                self.expr.emit_expr(start)?,
                self.expr.emit_expr(end)?,
                self.emit(body)?,
                v = var_name
            )),
            Stmt::ForEach {
                var_name,
                iterable,
                body,
            } => Ok(format!(
                "for (auto& {} : {}) {}",
                var_name,
                self.expr.emit_expr(iterable)?,
                self.emit(body)?
            )),
        }
    }

    /// Declaration without the trailing newline, so component state can reuse it.
    pub fn emit_var_decl(&self, decl: &VarDeclaration) -> CodegenResult<String> {
        let resolver = self.expr.resolver();
        let schema = self.expr.schema();
        let reference = if decl.is_reference { "&" } else { "" };

        match &decl.initializer {
            Some(Expr::ArrayRepeat { value, count }) => {
                let element = resolver
                    .element_type(&decl.type_name)
                    .unwrap_or_else(|| resolver.resolve(&decl.type_name));
                let value_code = self.expr.emit_expr(value)?;
                if let Expr::Int { value: n } = count.as_ref() {
                    let n = (*n).max(0) as usize;
                    let qualifier = if decl.is_mutable { "" } else { "const " };
                    return Ok(format!(
                        "{}{}::array<{}, {}> {} = {{{}}};",
                        qualifier,
                        RUNTIME_NAMESPACE,
                        element,
                        n,
                        decl.name,
                        vec![value_code; n].join(", ")
                    ));
                }
                let count_code = self.expr.emit_expr(count)?;
                return Ok(format!(
                    "{}::array<{}, {}> {}; {}.fill({});",
                    RUNTIME_NAMESPACE, element, count_code, decl.name, decl.name, value_code
                ));
            }
            Some(Expr::Array(arr)) if decl.type_name.trim().ends_with("[]") => {
                let type_name = decl.type_name.trim();
                let element_source = &type_name[..type_name.len() - 2];
                let mut arr = arr.clone();
                arr.propagate_element_type(element_source);
                let element = resolver.resolve(element_source);
                let literal = self.expr.emit_array(&arr)?;
                if decl.is_mutable {
                    return Ok(format!(
                        "{}::vector<{}>{} {} = {};",
                        RUNTIME_NAMESPACE, element, reference, decl.name, literal
                    ));
                }
                return Ok(format!(
                    "const {}::array<{}, {}>{} {} = {};",
                    RUNTIME_NAMESPACE,
                    element,
                    arr.elements.len(),
                    reference,
                    decl.name,
                    literal
                ));
            }
            _ => {}
        }

        let canonical = schema.resolve_alias(decl.type_name.trim());
        let is_handle = schema.is_handle(&canonical);
        let is_component =
            starts_uppercase(&canonical) && !is_collection_type(&canonical) && !is_handle;
        let qualifier = if decl.is_mutable || is_component { "" } else { "const " };
        let mut out = format!(
            "{}{}{} {}",
            qualifier,
            resolver.resolve(&decl.type_name),
            reference,
            decl.name
        );
        if let Some(init) = &decl.initializer {
            let mut code = self.expr.emit_expr(init)?;
            if decl.is_move {
                code = format!("{}::move({})", RUNTIME_NAMESPACE, code);
            }
            if is_handle {
                out.push_str(&format!("{{{}}}", code));
            } else {
                out.push_str(&format!(" = {}", code));
            }
        }
        out.push(';');
        Ok(out)
    }

    fn emit_assignment(&self, assign: &Assignment) -> CodegenResult<String> {
        let lhs = self.expr.emit_identifier(&assign.name);
        let mut rhs = self.expr.emit_expr(&assign.value)?;
        if assign.is_move {
            rhs = format!("{}::move({})", RUNTIME_NAMESPACE, rhs);
        }
        if let Some(target) = assign.target_type.as_deref() {
            let schema = self.expr.schema();
            if schema.is_handle(&schema.resolve_alias(target)) {
                rhs = format!("{}((int32_t){})", self.expr.resolve_type(target), rhs);
            }
        }

        if let Some(info) = self.loops.get(&assign.name).filter(|i| i.by_reference) {
            let op = CollectionOp::new(&lhs, info);
            return Ok(op.render(&op.reassign(&rhs)));
        }
        Ok(format!("{} = {};\n", lhs, rhs))
    }

    fn emit_index_assignment(&self, assign: &IndexAssignment) -> CodegenResult<String> {
        let target = self.expr.emit_expr(&assign.array)?;
        let index = self.expr.emit_expr(&assign.index)?;
        let mut value = self.expr.emit_expr(&assign.value)?;
        if assign.is_move {
            value = format!("{}::move({})", RUNTIME_NAMESPACE, value);
        }
        let op = assign.compound_op.as_deref().map(compound_operator);

        if let Expr::Ident { name } = &assign.array {
            if let Some(info) = self.loops.get(name) {
                let coll = CollectionOp::new(&target, info);
                return Ok(coll.render(&coll.index_write(&index, &value, op)));
            }
        }
        let slot = format!("{}[{}]", target, index);
        Ok(match op {
            Some(op) => format!("{slot} = {slot} {op} {value};\n"),
            None => format!("{} = {};\n", slot, value),
        })
    }

    fn emit_member_assignment(&self, assign: &MemberAssignment) -> CodegenResult<String> {
        let target = format!("{}.{}", self.expr.emit_expr(&assign.object)?, assign.member);
        let mut value = self.expr.emit_expr(&assign.value)?;
        if assign.is_move {
            value = format!("{}::move({})", RUNTIME_NAMESPACE, value);
        }
        Ok(match assign.compound_op.as_deref().map(compound_operator) {
            Some(op) => format!("{target} = {target} {op} {value};\n"),
            None => format!("{} = {};\n", target, value),
        })
    }

    fn emit_expression_stmt(&self, expr: &Expr) -> CodegenResult<String> {
        if let Expr::Call(call) = expr {
            if let Some((receiver, method)) = call.split_receiver() {
                if let Some(info) = self.loops.get(receiver) {
                    let storage = self.expr.emit_identifier(receiver);
                    let coll = CollectionOp::new(&storage, info);
                    match (method, call.args.as_slice()) {
                        ("push", [item]) => {
                            let item = self.expr.emit_arg(item)?;
                            return Ok(coll.render(&coll.append(&item)));
                        }
                        ("pop", []) => return Ok(coll.render(&coll.remove_last())),
                        ("clear", []) => return Ok(coll.render(&coll.clear())),
                        _ => {}
                    }
                }
            }
        }
        let code = self.expr.emit_expr(expr)?;
        // Formatter blocks are already complete statements.
        if code.starts_with(&format!("{{ {}::formatter", RUNTIME_NAMESPACE)) {
            return Ok(format!("{}\n", code));
        }
        Ok(format!("{};\n", code))
    }
}

/// `+=` and `+` both name the `+` operator.
fn compound_operator(op: &str) -> &str {
    match op.strip_suffix('=') {
        Some(base) if !base.is_empty() => base,
        _ => op,
    }
}

/// Removes one pair of parentheses wrapping the whole expression.
pub fn strip_outer_parens(code: &str) -> &str {
    let trimmed = code.trim();
    if !(trimmed.starts_with('(') && trimmed.ends_with(')')) {
        return trimmed;
    }
    let mut depth = 0i32;
    for (i, c) in trimmed.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i + 1 < trimmed.len() {
                    return trimmed;
                }
            }
            _ => {}
        }
    }
    &trimmed[1..trimmed.len() - 1]
}
