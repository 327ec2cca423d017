//! Codegen entry points.
//!
//! Lowers one component unit at a time into target-language fragments. Each unit
//! gets a freshly built `TypeContext`; the schema and the global type registry are
//! shared read-only, which is what lets `generate_units_parallel` hand units to
//! rayon without any locking.

use crate::ast::{ComponentParam, DataDef, EnumDef, FunctionDef, VarDeclaration};
use crate::definitions::method_symbols;
use crate::emitter::Emitter;
use crate::error::CodegenResult;
use crate::reactive::LoopTable;
use crate::schema::Schema;
use crate::scope::{qualified_name, TypeContext};
use crate::statements::StmtEmitter;
#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOptions {
    /// Emit `__builtin_unreachable();` after match chains that can fall through.
    #[serde(default)]
    pub trap_non_exhaustive_match: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT/OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUnit {
    pub name: String,
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub data: Vec<DataDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub params: Vec<ComponentParam>,
    #[serde(default)]
    pub state: Vec<VarDeclaration>,
    #[serde(default)]
    pub methods: Vec<FunctionDef>,
    #[serde(default)]
    pub loops: LoopTable,
}

impl ComponentUnit {
    pub fn new(name: &str) -> Self {
        ComponentUnit {
            name: name.to_string(),
            module_name: String::new(),
            data: vec![],
            enums: vec![],
            params: vec![],
            state: vec![],
            methods: vec![],
            loops: LoopTable::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_name(&self.module_name, &self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentKind {
    Data,
    Enum,
    Param,
    State,
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub name: String,
    pub kind: FragmentKind,
    pub code: String,
}

impl Fragment {
    fn new(name: &str, kind: FragmentKind, code: String) -> Self {
        Fragment {
            name: name.to_string(),
            kind,
            code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOutput {
    pub component: String,
    pub fragments: Vec<Fragment>,
    /// Method name -> component variables the method writes.
    pub modifications: BTreeMap<String, BTreeSet<String>>,
}

impl ComponentOutput {
    pub fn fragment(&self, name: &str, kind: FragmentKind) -> Option<&Fragment> {
        self.fragments
            .iter()
            .find(|f| f.name == name && f.kind == kind)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORT
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn generate_component_native(
    unit_json: String,
    schema_json: String,
    options_json: Option<String>,
) -> String {
    match generate_component_json(&unit_json, &schema_json, options_json.as_deref()) {
        Ok(json) => json,
        Err(err) => serde_json::json!({ "errors": [err] }).to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Qualified names of every component in the batch, plus every module-level data
/// definition any of them carries.
pub fn global_types(units: &[ComponentUnit]) -> HashSet<String> {
    let mut globals: HashSet<String> = units.iter().map(ComponentUnit::qualified_name).collect();
    for unit in units {
        globals.extend(
            unit.data
                .iter()
                .filter(|d| !d.module_name.is_empty())
                .map(|d| qualified_name(&d.module_name, &d.name)),
        );
    }
    globals
}

pub fn build_context(unit: &ComponentUnit, globals: &HashSet<String>) -> TypeContext {
    let mut ctx = TypeContext::for_component(&unit.module_name, &unit.qualified_name(), globals);
    for data in unit.data.iter().filter(|d| d.module_name.is_empty()) {
        ctx.declare_local_type(&data.name);
    }
    for def in &unit.enums {
        ctx.declare_local_type(&def.name);
    }
    for param in &unit.params {
        ctx.set_component_symbol(&param.name, &param.type_name);
        if param.is_reference {
            ctx.mark_reference(&param.name);
        }
    }
    for var in &unit.state {
        ctx.set_component_symbol(&var.name, &var.type_name);
    }
    for method in &unit.methods {
        ctx.register_method(&method.name, method.params.len());
    }
    ctx
}

fn emit_param_member(emitter: &Emitter, param: &ComponentParam) -> CodegenResult<String> {
    let type_name = emitter.resolve_type(&param.type_name);
    if param.is_reference {
        return Ok(format!("{}* {} = nullptr;", type_name, param.name));
    }
    match &param.default_value {
        Some(value) => Ok(format!(
            "{} {} = {};",
            type_name,
            param.name,
            emitter.emit_expr(value)?
        )),
        None => Ok(format!("{} {};", type_name, param.name)),
    }
}

pub fn generate_component(
    unit: &ComponentUnit,
    schema: &Schema,
    globals: &HashSet<String>,
    options: &CodegenOptions,
) -> CodegenResult<ComponentOutput> {
    let mut ctx = build_context(unit, globals);
    let mut fragments = Vec::new();

    {
        let emitter = Emitter::new(&ctx, schema, options);
        for data in &unit.data {
            fragments.push(Fragment::new(&data.name, FragmentKind::Data, emitter.emit_data_def(data)));
        }
        for def in &unit.enums {
            fragments.push(Fragment::new(&def.name, FragmentKind::Enum, emitter.emit_enum_def(def)));
        }
        for param in &unit.params {
            let code = emit_param_member(&emitter, param)?;
            fragments.push(Fragment::new(&param.name, FragmentKind::Param, code));
        }
        let statements = StmtEmitter::new(emitter, &unit.loops);
        for var in &unit.state {
            let code = statements.emit_var_decl(var)?;
            fragments.push(Fragment::new(&var.name, FragmentKind::State, code));
        }
    }

    let mut modifications = BTreeMap::new();
    for method in &unit.methods {
        ctx.enter_method();
        for (name, type_name) in method_symbols(method) {
            ctx.set_local_symbol(&name, &type_name);
        }
        let emitter = Emitter::new(&ctx, schema, options);
        let code = emitter.emit_function(method, &unit.loops, "")?;
        fragments.push(Fragment::new(&method.name, FragmentKind::Method, code));
        modifications.insert(
            method.name.clone(),
            method.collect_modifications(schema, &unit.loops),
        );
    }

    Ok(ComponentOutput {
        component: unit.qualified_name(),
        fragments,
        modifications,
    })
}

/// Compiles units one after another; the first error stops the batch.
pub fn generate_units(
    units: &[ComponentUnit],
    schema: &Schema,
    options: &CodegenOptions,
) -> CodegenResult<Vec<ComponentOutput>> {
    let globals = global_types(units);
    units
        .iter()
        .map(|unit| generate_component(unit, schema, &globals, options))
        .collect()
}

/// Same output as [`generate_units`], in input order.
pub fn generate_units_parallel(
    units: &[ComponentUnit],
    schema: &Schema,
    options: &CodegenOptions,
) -> CodegenResult<Vec<ComponentOutput>> {
    let globals = global_types(units);
    units
        .par_iter()
        .map(|unit| generate_component(unit, schema, &globals, options))
        .collect()
}

pub fn generate_component_json(
    unit_json: &str,
    schema_json: &str,
    options_json: Option<&str>,
) -> CodegenResult<String> {
    let unit: ComponentUnit = serde_json::from_str(unit_json)?;
    let schema = Schema::from_json(schema_json)?;
    let options: CodegenOptions = match options_json {
        Some(json) => serde_json::from_str(json)?,
        None => CodegenOptions::default(),
    };
    let globals = global_types(std::slice::from_ref(&unit));
    let output = generate_component(&unit, &schema, &globals, &options)?;
    Ok(serde_json::to_string(&output)?)
}
