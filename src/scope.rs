use std::collections::{HashMap, HashSet};

/// Joins a module prefix and a name the way generated identifiers are flattened.
pub fn qualified_name(module: &str, name: &str) -> String {
    if module.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", module, name)
    }
}

/// Where a symbol was declared. Earlier variants shadow later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolScope {
    MethodLocal,
    ComponentMember,
}

/// Per-component typing state threaded through every emission call.
///
/// Built by the driver before a component is lowered and dropped afterwards.
/// Nothing is shared between components, so units can be lowered concurrently
/// with one context each.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    component: String,
    module: String,
    local_types: HashSet<String>,
    global_types: HashSet<String>,
    component_symbols: HashMap<String, String>,
    method_locals: HashMap<String, String>,
    ref_bindings: HashSet<String>,
    method_arities: HashMap<String, usize>,
}

impl TypeContext {
    /// `component` is the already-qualified component name.
    pub fn for_component(module: &str, component: &str, global_types: &HashSet<String>) -> Self {
        log::trace!(
            "[CoiCodegen] type context for '{}' (module '{}', {} global types)",
            component,
            module,
            global_types.len()
        );
        TypeContext {
            component: component.to_string(),
            module: module.to_string(),
            global_types: global_types.clone(),
            ..Default::default()
        }
    }

    /// Context for definitions that live at module level, outside any component.
    pub fn module_scope(module: &str, global_types: &HashSet<String>) -> Self {
        Self::for_component(module, "", global_types)
    }

    pub fn component_name(&self) -> &str {
        &self.component
    }

    pub fn module_name(&self) -> &str {
        &self.module
    }

    pub fn declare_local_type(&mut self, name: &str) {
        self.local_types.insert(name.to_string());
    }

    pub fn is_local_type(&self, name: &str) -> bool {
        !self.component.is_empty() && self.local_types.contains(name)
    }

    pub fn is_global_type(&self, name: &str) -> bool {
        self.global_types.contains(name)
    }

    pub fn set_component_symbol(&mut self, name: &str, type_name: &str) {
        self.component_symbols
            .insert(name.to_string(), type_name.to_string());
    }

    pub fn mark_reference(&mut self, name: &str) {
        self.ref_bindings.insert(name.to_string());
    }

    pub fn register_method(&mut self, name: &str, arity: usize) {
        self.method_arities.insert(name.to_string(), arity);
    }

    pub fn method_arity(&self, name: &str) -> Option<usize> {
        self.method_arities.get(name).copied()
    }

    /// Starts a new method body; locals of the previous one are forgotten.
    pub fn enter_method(&mut self) {
        self.method_locals.clear();
    }

    pub fn set_local_symbol(&mut self, name: &str, type_name: &str) {
        self.method_locals
            .insert(name.to_string(), type_name.to_string());
    }

    pub fn classify(&self, name: &str) -> Option<SymbolScope> {
        if self.method_locals.contains_key(name) {
            Some(SymbolScope::MethodLocal)
        } else if self.component_symbols.contains_key(name) {
            Some(SymbolScope::ComponentMember)
        } else {
            None
        }
    }

    /// Declared type of a symbol, locals first.
    pub fn symbol_type(&self, name: &str) -> Option<&str> {
        match self.classify(name)? {
            SymbolScope::MethodLocal => self.method_locals.get(name).map(String::as_str),
            SymbolScope::ComponentMember => self.component_symbols.get(name).map(String::as_str),
        }
    }

    /// True when `name` reads through a reference parameter. A method local of the
    /// same name shadows it.
    pub fn is_reference(&self, name: &str) -> bool {
        self.ref_bindings.contains(name) && self.classify(name) != Some(SymbolScope::MethodLocal)
    }
}
