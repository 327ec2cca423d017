//! Which component variables a method body writes.
//!
//! The result drives the reactive update scheduler, so the set errs on the side
//! of over-reporting, with one exception: writing an element of a bound
//! collection only reorders existing views and is not reported.

use crate::ast::{Assignment, Expr, IndexAssignment, MemberAssignment, Stmt};
use crate::dispatch::{find_shortcut, BuiltinFamily};
use crate::reactive::LoopTable;
use crate::schema::{Schema, ARRAY_FAMILY};
use crate::visitor::{walk_block, StmtVisitor};
use std::collections::BTreeSet;

pub fn analyze(body: &[Stmt], schema: &Schema, loops: &LoopTable) -> BTreeSet<String> {
    let mut analyzer = MutationAnalyzer::new(schema, loops);
    walk_block(&mut analyzer, body);
    analyzer.into_modified()
}

pub struct MutationAnalyzer<'a> {
    schema: &'a Schema,
    loops: &'a LoopTable,
    modified: BTreeSet<String>,
}

impl<'a> MutationAnalyzer<'a> {
    pub fn new(schema: &'a Schema, loops: &'a LoopTable) -> Self {
        MutationAnalyzer {
            schema,
            loops,
            modified: BTreeSet::new(),
        }
    }

    pub fn into_modified(self) -> BTreeSet<String> {
        self.modified
    }

    fn mark(&mut self, expr: &Expr) {
        if let Some(root) = root_name(expr) {
            self.modified.insert(root.to_string());
        }
    }

    fn is_mutating_collection_method(&self, method: &str, argc: usize) -> bool {
        match self.schema.lookup_method(ARRAY_FAMILY, method, Some(argc)) {
            Some(def) => def.return_type == "void",
            None => find_shortcut(BuiltinFamily::Collection, method, argc).map_or(false, |s| s.mutates),
        }
    }
}

/// Root variable of an lvalue-shaped expression: `a`, `a.b.c`, `a[i][j]`.
pub fn root_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident { name } => Some(name),
        Expr::Member { object, .. } => root_name(object),
        Expr::Index { array, .. } => root_name(array),
        _ => None,
    }
}

impl<'a> StmtVisitor for MutationAnalyzer<'a> {
    fn visit_assignment(&mut self, assign: &Assignment) {
        self.modified.insert(assign.name.clone());
    }

    fn visit_index_assignment(&mut self, assign: &IndexAssignment) {
        if let Expr::Ident { name } = &assign.array {
            if self.loops.is_bound(name) {
                return;
            }
        }
        self.mark(&assign.array);
    }

    fn visit_member_assignment(&mut self, assign: &MemberAssignment) {
        self.mark(&assign.object);
    }

    fn visit_expression_stmt(&mut self, expr: &Expr) {
        match expr {
            Expr::Postfix { op, operand } | Expr::Unary { op, operand }
                if op == "++" || op == "--" =>
            {
                self.mark(operand);
            }
            Expr::Call(call) => {
                if let Some((receiver, method)) = call.split_receiver() {
                    if self.is_mutating_collection_method(method, call.args.len()) {
                        let root = receiver.split('.').next().unwrap_or(receiver);
                        self.modified.insert(root.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}
