use crate::ast::{DataDef, EnumDef, Expr, FunctionDef, Param, Stmt, VarDeclaration};
use crate::emitter::Emitter;
use crate::error::CodegenResult;
use crate::mutation;
use crate::reactive::LoopTable;
use crate::schema::Schema;
use crate::scope::qualified_name;
use crate::statements::StmtEmitter;
use crate::visitor::{walk_block, StmtVisitor};
use std::collections::BTreeSet;

/// Smallest unsigned type that holds every enumerator plus the `_COUNT` sentinel.
pub fn enum_underlying_type(value_count: usize) -> &'static str {
    let needed = value_count + 1;
    if needed <= 256 {
        "uint8_t"
    } else if needed <= 65536 {
        "uint16_t"
    } else {
        "uint32_t"
    }
}

impl FunctionDef {
    pub fn collect_modifications(&self, schema: &Schema, loops: &LoopTable) -> BTreeSet<String> {
        mutation::analyze(&self.body, schema, loops)
    }
}

#[derive(Default)]
struct LocalDeclarations {
    symbols: Vec<(String, String)>,
}

impl StmtVisitor for LocalDeclarations {
    fn visit_var_decl(&mut self, decl: &VarDeclaration) {
        self.symbols.push((decl.name.clone(), decl.type_name.clone()));
    }

    fn visit_for_range(&mut self, var_name: &str, _start: &Expr, _end: &Expr, body: &Stmt) {
        self.symbols.push((var_name.to_string(), "int".to_string()));
        self.visit_stmt(body);
    }
}

/// `(name, source type)` of every parameter and every local declared anywhere in
/// the body, in declaration order.
pub fn method_symbols(def: &FunctionDef) -> Vec<(String, String)> {
    let mut locals = LocalDeclarations::default();
    locals.symbols.extend(
        def.params
            .iter()
            .map(|p| (p.name.clone(), p.type_name.clone())),
    );
    walk_block(&mut locals, &def.body);
    locals.symbols
}

impl<'a> Emitter<'a> {
    pub fn emit_data_def(&self, def: &DataDef) -> String {
        let name = if !self.context().is_local_type(&def.name) && !def.module_name.is_empty() {
            qualified_name(&def.module_name, &def.name)
        } else {
            self.resolve_type(&def.name)
        };
        let mut out = format!("struct {} {{\n", name);
        for field in &def.fields {
            out.push_str(&format!(
                "    {} {};\n",
                self.resolve_type(&field.type_name),
                field.name
            ));
        }
        out.push_str("};\n");
        out
    }

    pub fn emit_enum_def(&self, def: &EnumDef) -> String {
        let mut values = def.values.clone();
        values.push("_COUNT".to_string());
        format!(
            "enum struct {} : {} {{ {} }};\n",
            self.resolve_type(&def.name),
            enum_underlying_type(def.values.len()),
            values.join(", ")
        )
    }

    fn emit_param(&self, param: &Param) -> String {
        let qualifier = if param.is_mutable { "" } else { "const " };
        let reference = if param.is_reference { "&" } else { "" };
        format!(
            "{}{}{} {}",
            qualifier,
            self.resolve_type(&param.type_name),
            reference,
            param.name
        )
    }

    /// `injected` is appended after the body, before the closing brace.
    pub fn emit_function(
        &self,
        def: &FunctionDef,
        loops: &LoopTable,
        injected: &str,
    ) -> CodegenResult<String> {
        let params: Vec<String> = def.params.iter().map(|p| self.emit_param(p)).collect();
        let body = StmtEmitter::new(*self, loops).emit_all(&def.body)?;
        let mut out = format!(
            "{} {}({}) {{\n{}",
            self.resolve_type(&def.return_type),
            def.name,
            params.join(", "),
            body
        );
        if !injected.is_empty() {
            out.push_str(injected);
            if !injected.ends_with('\n') {
                out.push('\n');
            }
        }
        out.push_str("}\n");
        Ok(out)
    }
}
