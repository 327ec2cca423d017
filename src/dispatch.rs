//! Schema-driven call dispatch.
//!
//! A call is tried against each tier in order and the first tier that produces
//! code wins:
//!
//! 1. built-in shortcuts on strings and collections,
//! 2. static schema calls mapped to an intrinsic or an inline template,
//! 3. inline overloads of the built-in `string` and `array` families,
//! 4. `Map` entries lowered to `webcc::namespace::function(...)`,
//! 5. a plain call with the name passed through, unless an undotted name is
//!    itself a runtime function known to the schema.
//!
//! `Component.Enum.size()` short-circuits all of them.

use crate::ast::{CallArg, Expr, FunctionCall};
use crate::emitter::{starts_uppercase, Emitter};
use crate::error::{CodegenResult, CompilerError};
use crate::formatter::needs_formatter;
use crate::intrinsics;
use crate::schema::{MappingKind, MethodDef, MethodParam, ARRAY_FAMILY, STRING_FAMILY};
use crate::types::{is_collection_type, narrowing_cast, RUNTIME_NAMESPACE};
use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{(this|\d+)\}").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILT-IN SHORTCUTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    Text,
    Collection,
}

#[derive(Debug, Clone, Copy)]
pub struct Shortcut {
    pub method: &'static str,
    pub arity: usize,
    pub template: &'static str,
    /// Whether the call changes the receiver's contents.
    pub mutates: bool,
}

const TEXT_SHORTCUTS: &[Shortcut] = &[
    Shortcut { method: "length", arity: 0, template: "(int32_t)${this}.length()", mutates: false },
    Shortcut { method: "at", arity: 1, template: "${this}.at(${0})", mutates: false },
    Shortcut { method: "substr", arity: 2, template: "${this}.substr(${0}, ${1})", mutates: false },
    Shortcut { method: "contains", arity: 1, template: "${this}.contains(${0})", mutates: false },
    Shortcut { method: "isEmpty", arity: 0, template: "${this}.empty()", mutates: false },
];

const COLLECTION_SHORTCUTS: &[Shortcut] = &[
    Shortcut { method: "length", arity: 0, template: "(int32_t)${this}.size()", mutates: false },
    Shortcut { method: "size", arity: 0, template: "(int32_t)${this}.size()", mutates: false },
    Shortcut { method: "at", arity: 1, template: "${this}.at(${0})", mutates: false },
    Shortcut { method: "contains", arity: 1, template: "${this}.contains(${0})", mutates: false },
    Shortcut { method: "isEmpty", arity: 0, template: "${this}.empty()", mutates: false },
    Shortcut { method: "push", arity: 1, template: "${this}.push_back(${0})", mutates: true },
    Shortcut { method: "pop", arity: 0, template: "${this}.pop_back()", mutates: true },
    Shortcut { method: "clear", arity: 0, template: "${this}.clear()", mutates: true },
];

pub fn find_shortcut(family: BuiltinFamily, method: &str, arity: usize) -> Option<&'static Shortcut> {
    let table = match family {
        BuiltinFamily::Text => TEXT_SHORTCUTS,
        BuiltinFamily::Collection => COLLECTION_SHORTCUTS,
    };
    table.iter().find(|s| s.method == method && s.arity == arity)
}

/// Substitutes `${this}` with the receiver and `${N}` with the N-th argument.
/// Placeholders without a matching argument are left in place.
pub fn expand_inline_template(template: &str, receiver: &str, args: &[String]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            if key == "this" {
                return receiver.to_string();
            }
            key.parse::<usize>()
                .ok()
                .and_then(|i| args.get(i).cloned())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

impl<'a> Emitter<'a> {
    pub fn emit_call(&self, call: &FunctionCall) -> CodegenResult<String> {
        let Some((receiver, method)) = call.split_receiver() else {
            return self.emit_plain_call(call);
        };

        if method == "size"
            && call.args.is_empty()
            && receiver.contains('.')
            && starts_uppercase(receiver)
        {
            return Ok(format!(
                "static_cast<int32_t>({}::_COUNT)",
                self.resolve_type(receiver)
            ));
        }

        if let Some(code) = self.try_builtin_shortcut(receiver, method, &call.args)? {
            return Ok(code);
        }
        if let Some(code) = self.try_static_call(call, receiver, method)? {
            return Ok(code);
        }
        if let Some(code) = self.try_builtin_overload(call, receiver, method)? {
            return Ok(code);
        }
        if let Some(code) = self.try_mapped_call(call, receiver, method)? {
            return Ok(code);
        }

        log::debug!(
            "[CoiCodegen] no schema entry for '{}', emitting a plain call",
            call.name
        );
        let args = self.emit_args(&call.args)?;
        if self.is_static_receiver(receiver) {
            Ok(format!(
                "{}::{}({})",
                self.resolve_type(receiver),
                method,
                args.join(", ")
            ))
        } else {
            Ok(format!(
                "{}.{}({})",
                self.emit_receiver(receiver),
                method,
                args.join(", ")
            ))
        }
    }

    fn emit_plain_call(&self, call: &FunctionCall) -> CodegenResult<String> {
        if let Some(code) = self.try_global_function(call)? {
            return Ok(code);
        }
        let name = if starts_uppercase(&call.name) {
            self.resolve_type(&call.name)
        } else {
            call.name.clone()
        };
        let args = self.emit_args(&call.args)?;
        Ok(format!("{}({})", name, args.join(", ")))
    }

    /// Undotted call naming a runtime function directly, e.g. `setSize(c, 1, 2)`.
    /// Component methods shadow runtime functions of the same name.
    fn try_global_function(&self, call: &FunctionCall) -> CodegenResult<Option<String>> {
        if starts_uppercase(&call.name) || self.context().method_arity(&call.name).is_some() {
            return Ok(None);
        }
        let Some(found) = self.schema().lookup_func(&call.name, Some(call.args.len())) else {
            return Ok(None);
        };
        log::trace!(
            "[CoiCodegen] '{}' resolved to {}::{} on '{}'",
            call.name,
            found.namespace,
            found.function,
            found.type_name
        );
        self.check_callbacks(call, &found.method.params, 0)?;
        let mut codes = Vec::with_capacity(call.args.len());
        for (arg, param) in call.args.iter().zip(found.method.params.iter()) {
            codes.push(if param.is_callback {
                self.emit_callback_arg(arg)?
            } else {
                self.emit_arg(arg)?
            });
        }
        let code = format!(
            "{}::{}::{}({})",
            RUNTIME_NAMESPACE,
            found.namespace,
            found.function,
            codes.join(", ")
        );
        let resolved_return = self.resolve_type(&found.method.return_type);
        Ok(Some(match narrowing_cast(&resolved_return) {
            Some(cast) => format!("({})({})", cast, code),
            None => code,
        }))
    }

    pub fn emit_args(&self, args: &[CallArg]) -> CodegenResult<Vec<String>> {
        args.iter().map(|a| self.emit_arg(a)).collect()
    }

    pub fn emit_arg(&self, arg: &CallArg) -> CodegenResult<String> {
        let code = self.emit_expr(&arg.value)?;
        if arg.is_move {
            Ok(format!("{}::move({})", RUNTIME_NAMESPACE, code))
        } else {
            Ok(code)
        }
    }

    /// A callback naming a component method becomes a lambda forwarding the
    /// method's registered parameter count.
    pub fn emit_callback_arg(&self, arg: &CallArg) -> CodegenResult<String> {
        if let Expr::Ident { name } = &arg.value {
            if let Some(arity) = self.context().method_arity(name) {
                let params: Vec<String> = (0..arity).map(|i| format!("auto _a{}", i)).collect();
                let forwarded: Vec<String> = (0..arity).map(|i| format!("_a{}", i)).collect();
                return Ok(format!(
                    "[this]({}) {{ {}({}); }}",
                    params.join(", "),
                    name,
                    forwarded.join(", ")
                ));
            }
        }
        self.emit_expr(&arg.value)
    }

    /// Receiver text with the root identifier dereferenced when it is a reference.
    pub fn emit_receiver(&self, receiver: &str) -> String {
        match receiver.split_once('.') {
            Some((root, rest)) => format!("{}.{}", self.emit_identifier(root), rest),
            None => self.emit_identifier(receiver),
        }
    }

    fn is_static_receiver(&self, receiver: &str) -> bool {
        starts_uppercase(receiver) && self.context().classify(receiver).is_none()
    }

    /// Declared type of an undotted receiver, with schema aliases followed.
    fn receiver_type(&self, receiver: &str) -> Option<String> {
        if receiver.contains('.') {
            return None;
        }
        self.context()
            .symbol_type(receiver)
            .map(|t| self.schema().resolve_alias(t))
    }

    pub fn builtin_family(&self, receiver: &str) -> Option<BuiltinFamily> {
        let ty = self.receiver_type(receiver)?;
        if ty == STRING_FAMILY {
            Some(BuiltinFamily::Text)
        } else if is_collection_type(&ty) {
            Some(BuiltinFamily::Collection)
        } else {
            None
        }
    }

    fn check_callbacks(
        &self,
        call: &FunctionCall,
        params: &[MethodParam],
        offset: usize,
    ) -> CodegenResult<()> {
        for (arg, param) in call.args.iter().zip(params.iter().skip(offset)) {
            if param.is_callback && !arg.is_reference {
                return Err(CompilerError::callback_by_value(
                    &call.name,
                    &param.name,
                    call.line,
                ));
            }
        }
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Tiers
    // ───────────────────────────────────────────────────────────────────────────

    fn try_builtin_shortcut(
        &self,
        receiver: &str,
        method: &str,
        args: &[CallArg],
    ) -> CodegenResult<Option<String>> {
        let Some(family) = self.builtin_family(receiver) else {
            return Ok(None);
        };
        let Some(shortcut) = find_shortcut(family, method, args.len()) else {
            return Ok(None);
        };
        let codes = self.emit_args(args)?;
        Ok(Some(expand_inline_template(
            shortcut.template,
            &self.emit_receiver(receiver),
            &codes,
        )))
    }

    fn try_static_call(
        &self,
        call: &FunctionCall,
        receiver: &str,
        method: &str,
    ) -> CodegenResult<Option<String>> {
        if !self.is_static_receiver(receiver) {
            return Ok(None);
        }
        let owner = self.schema().resolve_alias(receiver);
        let argc = call.args.len();
        for def in self.schema().methods_named(&owner, method) {
            match def.mapping {
                MappingKind::Intrinsic if argc <= def.params.len() => {
                    self.check_callbacks(call, &def.params, 0)?;
                    let code = intrinsics::generate(self, &def.mapping_value, call)?;
                    if code.is_empty() {
                        log::warn!(
                            "[CoiCodegen] intrinsic '{}' for '{}' produced no code",
                            def.mapping_value,
                            call.name
                        );
                    }
                    return Ok(Some(code));
                }
                MappingKind::Inline if argc == def.params.len() => {
                    self.check_callbacks(call, &def.params, 0)?;
                    let codes = self.emit_args(&call.args)?;
                    return Ok(Some(expand_inline_template(&def.mapping_value, receiver, &codes)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn try_builtin_overload(
        &self,
        call: &FunctionCall,
        receiver: &str,
        method: &str,
    ) -> CodegenResult<Option<String>> {
        if self.is_static_receiver(receiver) {
            return Ok(None);
        }
        let families: &[&str] = match (self.builtin_family(receiver), self.receiver_type(receiver)) {
            (Some(BuiltinFamily::Text), _) => &[STRING_FAMILY],
            (Some(BuiltinFamily::Collection), _) => &[ARRAY_FAMILY],
            (None, Some(_)) => &[],
            (None, None) => &[STRING_FAMILY, ARRAY_FAMILY],
        };
        for family in families {
            let Some(def) = self
                .schema()
                .lookup_method(family, method, Some(call.args.len()))
                .filter(|d| d.mapping == MappingKind::Inline)
            else {
                continue;
            };
            self.check_callbacks(call, &def.params, 0)?;
            let codes = self.emit_args(&call.args)?;
            return Ok(Some(expand_inline_template(
                &def.mapping_value,
                &self.emit_receiver(receiver),
                &codes,
            )));
        }
        Ok(None)
    }

    fn try_mapped_call(
        &self,
        call: &FunctionCall,
        receiver: &str,
        method: &str,
    ) -> CodegenResult<Option<String>> {
        let is_static = self.is_static_receiver(receiver);
        let owner = if is_static {
            Some(self.schema().resolve_alias(receiver))
        } else {
            self.receiver_type(receiver)
        };
        if owner.as_deref().map_or(false, is_collection_type) {
            return Ok(None);
        }

        let argc = call.args.len();
        let candidates: Vec<&MethodDef> = match &owner {
            Some(ty) => self.schema().methods_named(ty, method),
            None if !is_static => self
                .schema()
                .types()
                .filter(|t| !t.is_builtin)
                .flat_map(|t| {
                    t.methods
                        .iter()
                        .filter(move |m| m.name == method && !m.is_shared)
                })
                .collect(),
            None => vec![],
        };

        let mut chosen: Option<(&MethodDef, bool)> = None;
        if !is_static {
            chosen = candidates
                .iter()
                .find(|d| self.is_receiver_passing(d, owner.as_deref(), argc))
                .map(|d| (*d, true));
        }
        if chosen.is_none() && owner.is_some() {
            chosen = candidates
                .iter()
                .find(|d| d.mapping == MappingKind::Map && d.params.len() == argc)
                .map(|d| (*d, false));
        }
        let Some((def, passes_receiver)) = chosen else {
            return Ok(None);
        };
        let Some((namespace, function)) = def.map_target() else {
            return Ok(None);
        };

        let offset = usize::from(passes_receiver);
        self.check_callbacks(call, &def.params, offset)?;

        let callee = format!("{}::{}::{}", RUNTIME_NAMESPACE, namespace, function);
        let mut leading = Vec::new();
        if passes_receiver {
            leading.push(self.emit_receiver(receiver));
        }

        let chain_at = call.args.iter().position(|a| needs_formatter(&a.value));
        let mut codes = Vec::with_capacity(argc);
        for (i, arg) in call.args.iter().enumerate() {
            if Some(i) == chain_at {
                codes.push(String::new());
                continue;
            }
            let is_callback = def.params.get(i + offset).map_or(false, |p| p.is_callback);
            codes.push(if is_callback {
                self.emit_callback_arg(arg)?
            } else {
                self.emit_arg(arg)?
            });
        }

        if let Some(k) = chain_at {
            leading.extend(codes[..k].iter().cloned());
            let prefix: String = leading.iter().map(|a| format!("{}, ", a)).collect();
            let suffix: String = codes[k + 1..].iter().map(|a| format!(", {}", a)).collect();
            return Ok(Some(self.formatter_block(
                &call.args[k].value,
                &format!("{}({}", callee, prefix),
                &format!("{})", suffix),
            )?));
        }

        leading.extend(codes);
        let code = format!("{}({})", callee, leading.join(", "));
        let resolved_return = self.resolve_type(&def.return_type);
        Ok(Some(match narrowing_cast(&resolved_return) {
            Some(cast) => format!("({})({})", cast, code),
            None => code,
        }))
    }

    /// The first parameter must be a handle, and when the receiver's type is known
    /// it must be that type or one of its ancestors.
    fn is_receiver_passing(&self, def: &MethodDef, owner: Option<&str>, argc: usize) -> bool {
        if def.mapping != MappingKind::Map || def.params.len() != argc + 1 {
            return false;
        }
        let Some(first) = def.params.first() else {
            return false;
        };
        let handle = self.schema().resolve_alias(&first.type_name);
        if !self.schema().is_handle(&handle) {
            return false;
        }
        owner.map_or(true, |ty| ty == handle || self.schema().inherits_from(ty, &handle))
    }
}
