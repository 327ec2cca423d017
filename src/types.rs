//! Source type names to target type names.
//!
//! Resolution is idempotent: feeding an already-resolved name back in yields the
//! same name, so call sites never need to track whether a name was resolved.

use crate::schema::Schema;
use crate::scope::{qualified_name, TypeContext};
use regex::Regex;
use std::collections::HashMap;

pub const RUNTIME_NAMESPACE: &str = "webcc";
pub const RUNTIME_STRING: &str = "webcc::string";

lazy_static::lazy_static! {
    static ref PRIMITIVES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("int", "int32_t");
        m.insert("int8", "int8_t");
        m.insert("int16", "int16_t");
        m.insert("int32", "int32_t");
        m.insert("int64", "int64_t");
        m.insert("uint8", "uint8_t");
        m.insert("uint16", "uint16_t");
        m.insert("uint32", "uint32_t");
        m.insert("uint64", "uint64_t");
        m.insert("float32", "float");
        m.insert("float64", "double");
        m.insert("bool", "bool");
        m.insert("void", "void");
        m.insert("string", RUNTIME_STRING);
        m
    };

    static ref FIXED_ARRAY: Regex = Regex::new(r"^(.+)\[(\d+)\]$").unwrap();
}

/// Target spellings. These pass through before any alias lookup, so `float`
/// (the image of `float32`) is never re-read as a source name.
const TARGET_PRIMITIVES: &[&str] = &[
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t",
    "uint64_t", "float", "double", "bool", "void", RUNTIME_STRING,
];

/// Target integer types narrower than the runtime's native return width.
const FIXED_WIDTH_INTS: &[&str] = &[
    "int8_t", "int16_t", "int32_t", "uint8_t", "uint16_t", "uint32_t",
];

pub struct TypeResolver<'a> {
    ctx: &'a TypeContext,
    schema: &'a Schema,
}

impl<'a> TypeResolver<'a> {
    pub fn new(ctx: &'a TypeContext, schema: &'a Schema) -> Self {
        TypeResolver { ctx, schema }
    }

    pub fn resolve(&self, name: &str) -> String {
        let name = name.trim();
        if name.is_empty() {
            return String::new();
        }

        if let Some(inner) = name.strip_suffix("[]") {
            return format!("{}::vector<{}>", RUNTIME_NAMESPACE, self.resolve(inner));
        }
        if let Some(caps) = FIXED_ARRAY.captures(name) {
            return format!(
                "{}::array<{}, {}>",
                RUNTIME_NAMESPACE,
                self.resolve(&caps[1]),
                &caps[2]
            );
        }

        if TARGET_PRIMITIVES.contains(&name) {
            return name.to_string();
        }
        if let Some(target) = PRIMITIVES.get(name) {
            return target.to_string();
        }
        let canonical = self.schema.resolve_alias(name);
        if canonical != name {
            return self.resolve(&canonical);
        }

        if self.ctx.is_local_type(name) {
            return qualified_name(self.ctx.component_name(), name);
        }

        let module_form = qualified_name(self.ctx.module_name(), name);
        if module_form != name && self.ctx.is_global_type(&module_form) {
            return module_form;
        }

        if let Some(flat) = flatten_module_path(name) {
            return flat;
        }

        if self.schema.is_handle(name) {
            return format!("{}::{}", RUNTIME_NAMESPACE, name);
        }

        if let Some(base) = name.strip_suffix("Meta").filter(|b| !b.is_empty()) {
            let resolved = self.resolve(base);
            if resolved != base {
                return format!("{}Meta", resolved);
            }
        }

        log::trace!("[CoiCodegen] type '{}' passed through unresolved", name);
        name.to_string()
    }

    /// Resolved element type of a collection type name, if it is one.
    pub fn element_type(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if let Some(inner) = name.strip_suffix("[]") {
            return Some(self.resolve(inner));
        }
        FIXED_ARRAY.captures(name).map(|caps| self.resolve(&caps[1]))
    }
}

/// `Mod.Name` / `Mod::Name` -> `Mod_Name`. Names already in the runtime namespace
/// are left alone.
fn flatten_module_path(name: &str) -> Option<String> {
    if !name.contains('.') && !name.contains("::") {
        return None;
    }
    let runtime_prefix = format!("{}::", RUNTIME_NAMESPACE);
    if name.starts_with(&runtime_prefix) {
        return Some(name.to_string());
    }
    Some(name.replace("::", "_").replace('.', "_"))
}

pub fn is_collection_type(name: &str) -> bool {
    let name = name.trim();
    name.ends_with("[]") || FIXED_ARRAY.is_match(name)
}

/// Cast applied to mapped-call results whose declared return is a fixed-width integer.
pub fn narrowing_cast(resolved_return: &str) -> Option<&'static str> {
    FIXED_WIDTH_INTS
        .iter()
        .copied()
        .find(|t| *t == resolved_return)
}
