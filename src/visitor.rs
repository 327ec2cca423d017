use crate::ast::{
    Assignment, Expr, FunctionCall, IndexAssignment, MatchExpr, MemberAssignment, Pattern, Stmt,
    StringLiteral, VarDeclaration,
};

/// The StmtVisitor trait is the single traversal mechanism for statement trees.
///
/// Rules:
/// 1. Traversal order is source order.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call `walk_*` functions to continue traversal unless pruning is intended.
/// 4. Statement walkers descend into nested statements only, never into expressions.
pub trait StmtVisitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_block(&mut self, statements: &[Stmt]) {
        walk_block(self, statements);
    }

    fn visit_var_decl(&mut self, _decl: &VarDeclaration) {}

    fn visit_assignment(&mut self, _assign: &Assignment) {}

    fn visit_index_assignment(&mut self, _assign: &IndexAssignment) {}

    fn visit_member_assignment(&mut self, _assign: &MemberAssignment) {}

    fn visit_expression_stmt(&mut self, _expr: &Expr) {}

    fn visit_return(&mut self, _value: Option<&Expr>) {}

    fn visit_if(&mut self, _condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        walk_if(self, then_branch, else_branch);
    }

    fn visit_for_range(&mut self, _var_name: &str, _start: &Expr, _end: &Expr, body: &Stmt) {
        self.visit_stmt(body);
    }

    fn visit_for_each(&mut self, _var_name: &str, _iterable: &Expr, body: &Stmt) {
        self.visit_stmt(body);
    }
}

pub fn walk_stmt<V: StmtVisitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::VarDecl(decl) => visitor.visit_var_decl(decl),
        Stmt::Assign(assign) => visitor.visit_assignment(assign),
        Stmt::IndexAssign(assign) => visitor.visit_index_assignment(assign),
        Stmt::MemberAssign(assign) => visitor.visit_member_assignment(assign),
        Stmt::Return { value } => visitor.visit_return(value.as_ref()),
        Stmt::Expression { expression } => visitor.visit_expression_stmt(expression),
        Stmt::Block { statements } => visitor.visit_block(statements),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => visitor.visit_if(condition, then_branch, else_branch.as_deref()),
        Stmt::ForRange {
            var_name,
            start,
            end,
            body,
        } => visitor.visit_for_range(var_name, start, end, body),
        Stmt::ForEach {
            var_name,
            iterable,
            body,
        } => visitor.visit_for_each(var_name, iterable, body),
    }
}

pub fn walk_block<V: StmtVisitor + ?Sized>(visitor: &mut V, statements: &[Stmt]) {
    for stmt in statements {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_if<V: StmtVisitor + ?Sized>(visitor: &mut V, then_branch: &Stmt, else_branch: Option<&Stmt>) {
    visitor.visit_stmt(then_branch);
    if let Some(else_branch) = else_branch {
        visitor.visit_stmt(else_branch);
    }
}

/// Expression counterpart of [`StmtVisitor`]. Leaves are identifiers and string
/// literals; everything else walks its children by default.
pub trait ExprVisitor {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_identifier(&mut self, _name: &str) {}

    fn visit_string(&mut self, _literal: &StringLiteral) {}

    fn visit_call(&mut self, call: &FunctionCall) {
        walk_call(self, call);
    }

    fn visit_member(&mut self, object: &Expr, _member: &str) {
        self.visit_expr(object);
    }

    fn visit_match(&mut self, m: &MatchExpr) {
        walk_match(self, m);
    }
}

pub fn walk_expr<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Int { .. } | Expr::Float { .. } | Expr::Bool { .. } | Expr::EnumAccess { .. } => {}
        Expr::Str(lit) => visitor.visit_string(lit),
        Expr::Ident { name } => visitor.visit_identifier(name),
        Expr::Binary(bin) => {
            visitor.visit_expr(&bin.left);
            visitor.visit_expr(&bin.right);
        }
        Expr::Unary { operand, .. }
        | Expr::Postfix { operand, .. }
        | Expr::Reference { operand }
        | Expr::Move { operand } => visitor.visit_expr(operand),
        Expr::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_expr);
            visitor.visit_expr(else_expr);
        }
        Expr::Call(call) => visitor.visit_call(call),
        Expr::Member { object, member } => visitor.visit_member(object, member),
        Expr::Index { array, index } => {
            visitor.visit_expr(array);
            visitor.visit_expr(index);
        }
        Expr::Array(arr) => {
            for element in &arr.elements {
                visitor.visit_expr(element);
            }
        }
        Expr::ArrayRepeat { value, count } => {
            visitor.visit_expr(value);
            visitor.visit_expr(count);
        }
        Expr::Pod(pod) => {
            for field in &pod.fields {
                visitor.visit_expr(&field.value);
            }
        }
        Expr::Construct { args, .. } => {
            for arg in args {
                visitor.visit_expr(&arg.value);
            }
        }
        Expr::Match(m) => visitor.visit_match(m),
    }
}

pub fn walk_call<V: ExprVisitor + ?Sized>(visitor: &mut V, call: &FunctionCall) {
    for arg in &call.args {
        visitor.visit_expr(&arg.value);
    }
}

pub fn walk_match<V: ExprVisitor + ?Sized>(visitor: &mut V, m: &MatchExpr) {
    visitor.visit_expr(&m.subject);
    for arm in &m.arms {
        match &arm.pattern {
            Pattern::Literal { value } => visitor.visit_expr(value),
            Pattern::Enum { .. } => {}
            Pattern::Pod { fields, .. } => {
                for value in fields.iter().filter_map(|f| f.value.as_ref()) {
                    visitor.visit_expr(value);
                }
            }
        }
        visitor.visit_expr(&arm.body);
    }
    if let Some(else_arm) = &m.else_arm {
        visitor.visit_expr(else_arm);
    }
}
