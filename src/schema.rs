//! Runtime API schema.
//!
//! Describes every type the `webcc` runtime exposes: the built-in `string` and
//! `array` families, opaque handle types and namespaces of free functions. Each
//! method carries a mapping that tells the dispatcher how to lower a call to it.

use crate::error::CodegenResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const MAX_ALIAS_DEPTH: usize = 16;

pub const STRING_FAMILY: &str = "string";
pub const ARRAY_FAMILY: &str = "array";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// `namespace::function` in the runtime.
    #[default]
    Map,
    /// Text template with `${this}` and `${N}` placeholders.
    Inline,
    /// Key into the intrinsic table.
    Intrinsic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodParam {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub is_callback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<MethodParam>,
    #[serde(default = "void_type")]
    pub return_type: String,
    #[serde(default)]
    pub is_shared: bool,
    /// Shared constants carry their literal in `mapping_value`.
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default)]
    pub mapping: MappingKind,
    #[serde(default)]
    pub mapping_value: String,
}

fn void_type() -> String {
    "void".to_string()
}

impl MethodDef {
    pub fn new(name: &str, mapping: MappingKind, mapping_value: &str) -> Self {
        MethodDef {
            name: name.to_string(),
            params: vec![],
            return_type: void_type(),
            is_shared: false,
            is_constant: false,
            mapping,
            mapping_value: mapping_value.to_string(),
        }
    }

    pub fn constant(name: &str, literal: &str) -> Self {
        MethodDef {
            is_shared: true,
            is_constant: true,
            ..Self::new(name, MappingKind::Inline, literal)
        }
    }

    pub fn param(mut self, type_name: &str, name: &str) -> Self {
        self.params.push(MethodParam {
            type_name: type_name.to_string(),
            name: name.to_string(),
            is_callback: false,
        });
        self
    }

    pub fn callback(mut self, name: &str) -> Self {
        self.params.push(MethodParam {
            type_name: "callback".to_string(),
            name: name.to_string(),
            is_callback: true,
        });
        self
    }

    pub fn returns(mut self, type_name: &str) -> Self {
        self.return_type = type_name.to_string();
        self
    }

    pub fn shared(mut self) -> Self {
        self.is_shared = true;
        self
    }

    /// `(namespace, function)` of a `Map` entry.
    pub fn map_target(&self) -> Option<(&str, &str)> {
        if self.mapping != MappingKind::Map {
            return None;
        }
        match self.mapping_value.split_once("::") {
            Some((ns, func)) if !ns.is_empty() && !func.is_empty() => Some((ns, func)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default)]
    pub is_nocopy: bool,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub alias_of: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub fn new(name: &str) -> Self {
        TypeDef {
            name: name.to_string(),
            is_builtin: false,
            is_nocopy: false,
            extends: None,
            alias_of: None,
            methods: vec![],
        }
    }

    pub fn builtin(name: &str) -> Self {
        TypeDef {
            is_builtin: true,
            ..Self::new(name)
        }
    }

    pub fn alias(name: &str, target: &str) -> Self {
        TypeDef {
            is_builtin: true,
            alias_of: Some(target.to_string()),
            ..Self::new(name)
        }
    }

    pub fn extending(mut self, base: &str) -> Self {
        self.extends = Some(base.to_string());
        self
    }

    pub fn nocopy(mut self) -> Self {
        self.is_nocopy = true;
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }
}

/// Result of a reverse lookup from a runtime function name.
#[derive(Debug, Clone, Copy)]
pub struct FuncLookup<'a> {
    pub type_name: &'a str,
    pub namespace: &'a str,
    pub function: &'a str,
    pub method: &'a MethodDef,
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    types: Vec<TypeDef>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: BTreeMap<String, TypeDef>,
    /// snake_case runtime function name -> (type name, method index)
    func_index: HashMap<String, Vec<(String, usize)>>,
}

impl Schema {
    pub fn from_types(types: impl IntoIterator<Item = TypeDef>) -> Self {
        let mut schema = Schema::default();
        for def in types {
            schema.insert(def);
        }
        schema
    }

    pub fn from_json(json: &str) -> CodegenResult<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;
        Ok(Self::from_types(file.types))
    }

    pub fn to_json(&self) -> CodegenResult<String> {
        let file = SchemaFile {
            types: self.types.values().cloned().collect(),
        };
        Ok(serde_json::to_string(&file)?)
    }

    pub fn insert(&mut self, def: TypeDef) {
        for entries in self.func_index.values_mut() {
            entries.retain(|(owner, _)| owner != &def.name);
        }
        for (idx, method) in def.methods.iter().enumerate() {
            if let Some((_, func)) = method.map_target() {
                self.func_index
                    .entry(to_snake_case(func))
                    .or_default()
                    .push((def.name.clone(), idx));
            }
        }
        self.types.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// All types in name order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    /// Follows `alias_of` links. Stops on cycles and returns the last name reached.
    pub fn resolve_alias(&self, name: &str) -> String {
        let mut current = name;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.types.get(current).and_then(|t| t.alias_of.as_deref()) {
                Some(target) if target != current => current = target,
                _ => break,
            }
        }
        current.to_string()
    }

    /// Handle types are schema types that are neither built-in nor aliases.
    pub fn is_handle(&self, name: &str) -> bool {
        self.types
            .get(name)
            .map_or(false, |t| !t.is_builtin && t.alias_of.is_none())
    }

    pub fn inherits_from(&self, derived: &str, base: &str) -> bool {
        let mut current = self.types.get(derived);
        for _ in 0..MAX_ALIAS_DEPTH {
            let Some(def) = current else { return false };
            match def.extends.as_deref() {
                Some(parent) if parent == base => return true,
                Some(parent) => current = self.types.get(parent),
                None => return false,
            }
        }
        false
    }

    /// Methods named `method` on `type_name` or its ancestors, nearest type first.
    pub fn methods_named(&self, type_name: &str, method: &str) -> Vec<&MethodDef> {
        let mut found = Vec::new();
        let mut current = self.types.get(type_name);
        for _ in 0..MAX_ALIAS_DEPTH {
            let Some(def) = current else { break };
            found.extend(def.methods.iter().filter(|m| m.name == method));
            current = def.extends.as_deref().and_then(|p| self.types.get(p));
        }
        found
    }

    /// First method named `method` taking exactly `arity` arguments, or any arity
    /// when `arity` is `None`.
    pub fn lookup_method(
        &self,
        type_name: &str,
        method: &str,
        arity: Option<usize>,
    ) -> Option<&MethodDef> {
        self.methods_named(type_name, method)
            .into_iter()
            .find(|m| arity.map_or(true, |n| m.params.len() == n))
    }

    /// Reverse lookup by runtime function name, in either camel or snake case.
    pub fn lookup_func(&self, name: &str, arity: Option<usize>) -> Option<FuncLookup<'_>> {
        let entries = self.func_index.get(&to_snake_case(name))?;
        entries.iter().find_map(|(owner, idx)| {
            let def = self.types.get(owner)?;
            let method = def.methods.get(*idx)?;
            if arity.map_or(false, |n| method.params.len() != n) {
                return None;
            }
            let (namespace, function) = method.map_target()?;
            Some(FuncLookup {
                type_name: &def.name,
                namespace,
                function,
                method,
            })
        })
    }
}

/// `setInnerText` -> `set_inner_text`, `getContext2d` -> `get_context_2d`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some() && prev != Some('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_digit() {
            if prev.map_or(false, |p| p.is_ascii_lowercase()) {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}
