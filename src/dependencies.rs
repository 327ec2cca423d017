//! Names an expression or statement list reads.
//!
//! Sets are conservative: identifiers inside interpolated strings are picked up
//! lexically and the receiver of every dotted call counts as read.

use crate::ast::{
    Assignment, Expr, FunctionCall, IndexAssignment, MemberAssignment, MemberDependency, Stmt,
    StringLiteral, VarDeclaration,
};
use crate::visitor::{walk_block, walk_call, walk_if, ExprVisitor, StmtVisitor};
use regex::Regex;
use std::collections::BTreeSet;

lazy_static::lazy_static! {
    static ref MEMBER_PAIR: Regex = Regex::new(r"\b([A-Za-z_]\w*)\.([A-Za-z_]\w*)").unwrap();
}

#[derive(Debug, Default)]
pub struct DependencyCollector {
    pub names: BTreeSet<String>,
    pub members: BTreeSet<MemberDependency>,
}

pub fn collect_dependencies(expr: &Expr) -> BTreeSet<String> {
    let mut collector = DependencyCollector::default();
    collector.visit_expr(expr);
    collector.names
}

pub fn collect_member_dependencies(expr: &Expr) -> BTreeSet<MemberDependency> {
    let mut collector = DependencyCollector::default();
    collector.visit_expr(expr);
    collector.members
}

pub fn collect_stmt_dependencies(body: &[Stmt]) -> BTreeSet<String> {
    let mut collector = DependencyCollector::default();
    walk_block(&mut collector, body);
    collector.names
}

impl Expr {
    pub fn collect_dependencies(&self, deps: &mut BTreeSet<String>) {
        deps.extend(collect_dependencies(self));
    }

    pub fn collect_member_dependencies(&self, deps: &mut BTreeSet<MemberDependency>) {
        deps.extend(collect_member_dependencies(self));
    }
}

impl Stmt {
    pub fn collect_dependencies(&self, deps: &mut BTreeSet<String>) {
        deps.extend(collect_stmt_dependencies(std::slice::from_ref(self)));
    }
}

/// Identifier-like tokens of an embedded expression. Tokens starting with a
/// digit are numbers and skipped.
fn scan_identifiers(source: &str, out: &mut BTreeSet<String>) {
    for token in source.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
        if token.is_empty() || token.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        out.insert(token.to_string());
    }
}

impl ExprVisitor for DependencyCollector {
    fn visit_identifier(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    fn visit_string(&mut self, literal: &StringLiteral) {
        for part in literal.parts().iter().filter(|p| p.is_expr) {
            scan_identifiers(&part.content, &mut self.names);
            for caps in MEMBER_PAIR.captures_iter(&part.content) {
                self.members.insert(MemberDependency {
                    object: caps[1].to_string(),
                    member: caps[2].to_string(),
                });
            }
        }
    }

    fn visit_call(&mut self, call: &FunctionCall) {
        if let Some((receiver, _)) = call.split_receiver() {
            let root = receiver.split('.').next().unwrap_or(receiver);
            self.names.insert(root.to_string());
        }
        walk_call(self, call);
    }

    fn visit_member(&mut self, object: &Expr, member: &str) {
        if let Expr::Ident { name } = object {
            self.members.insert(MemberDependency {
                object: name.clone(),
                member: member.to_string(),
            });
        }
        self.visit_expr(object);
    }
}

impl StmtVisitor for DependencyCollector {
    fn visit_var_decl(&mut self, decl: &VarDeclaration) {
        if let Some(init) = &decl.initializer {
            self.visit_expr(init);
        }
    }

    fn visit_assignment(&mut self, assign: &Assignment) {
        self.visit_expr(&assign.value);
    }

    fn visit_index_assignment(&mut self, assign: &IndexAssignment) {
        self.visit_expr(&assign.array);
        self.visit_expr(&assign.index);
        self.visit_expr(&assign.value);
    }

    fn visit_member_assignment(&mut self, assign: &MemberAssignment) {
        self.visit_expr(&assign.object);
        self.visit_expr(&assign.value);
    }

    fn visit_expression_stmt(&mut self, expr: &Expr) {
        self.visit_expr(expr);
    }

    fn visit_return(&mut self, value: Option<&Expr>) {
        if let Some(value) = value {
            self.visit_expr(value);
        }
    }

    fn visit_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.visit_expr(condition);
        walk_if(self, then_branch, else_branch);
    }

    fn visit_for_range(&mut self, _var_name: &str, start: &Expr, end: &Expr, body: &Stmt) {
        self.visit_expr(start);
        self.visit_expr(end);
        self.visit_stmt(body);
    }

    fn visit_for_each(&mut self, _var_name: &str, iterable: &Expr, body: &Stmt) {
        self.visit_expr(iterable);
        self.visit_stmt(body);
    }
}
