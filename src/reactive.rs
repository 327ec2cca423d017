//! Lowering of writes to collections that are rendered as lists of views.
//!
//! Each operation first becomes a list of [`ReactiveStep`]s, which is then rendered
//! to target text. Keeping the plan as data lets the ordering rules be checked
//! without parsing generated code.
//!
//! Appending may reallocate storage, which invalidates the self-reference every
//! rendered item holds. Every pre-existing item is therefore rebound before the new
//! item's view is created.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Render-side facts about one collection, filled in by the template compiler
/// before statements are lowered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundCollection {
    pub loop_id: u32,
    #[serde(default)]
    pub parent_ref: Option<String>,
    pub item_var: String,
    pub item_creation_code: String,
    #[serde(default)]
    pub is_only_child: bool,
    /// The loop variable aliases the stored element rather than copying it.
    #[serde(default = "default_true")]
    pub by_reference: bool,
}

fn default_true() -> bool {
    true
}

impl BoundCollection {
    pub fn new(loop_id: u32, item_var: &str, item_creation_code: &str) -> Self {
        BoundCollection {
            loop_id,
            parent_ref: None,
            item_var: item_var.to_string(),
            item_creation_code: item_creation_code.to_string(),
            is_only_child: false,
            by_reference: true,
        }
    }

    pub fn only_child(mut self) -> Self {
        self.is_only_child = true;
        self
    }

    pub fn parent(&self) -> String {
        self.parent_ref
            .clone()
            .unwrap_or_else(|| format!("_loop_{}_parent", self.loop_id))
    }

    pub fn count_var(&self) -> String {
        format!("_loop_{}_count", self.loop_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopTable {
    entries: HashMap<String, BoundCollection>,
}

impl LoopTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, info: BoundCollection) {
        self.entries.insert(name.to_string(), info);
    }

    pub fn get(&self, name: &str) -> Option<&BoundCollection> {
        self.entries.get(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEPS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum ReactiveStep {
    Scope(Vec<ReactiveStep>),
    IfAttached(Vec<ReactiveStep>),
    IfNonEmpty(Vec<ReactiveStep>),
    IfRendered(Vec<ReactiveStep>),
    SaveOldCount,
    Append { item: String },
    RebindExisting,
    BindNewest,
    CreateItem,
    IncrementCount,
    DecrementCount,
    RemoveLastView { keep_dom: bool },
    ShrinkByOne,
    /// `bulk` unregisters bindings only; the DOM is reset separately.
    TeardownAll { bulk: bool },
    ResetParentContent,
    ResetCount,
    ClearStorage,
    Assign { value: String },
    CountFromSize,
    EnterRender,
    CreateEach,
    ExitRenderAndFlush,
    WriteElement { index: String, value: String, compound_op: Option<String> },
    RelocateNode { index: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactivePlan {
    pub steps: Vec<ReactiveStep>,
}

/// A write target that is a bound collection. `storage` is the emitted code naming it.
pub struct CollectionOp<'a> {
    storage: String,
    info: &'a BoundCollection,
}

impl<'a> CollectionOp<'a> {
    pub fn new(storage: &str, info: &'a BoundCollection) -> Self {
        CollectionOp {
            storage: storage.to_string(),
            info,
        }
    }

    pub fn append(&self, item: &str) -> ReactivePlan {
        use ReactiveStep::*;
        ReactivePlan {
            steps: vec![Scope(vec![
                SaveOldCount,
                Append {
                    item: item.to_string(),
                },
                IfAttached(vec![RebindExisting, BindNewest, CreateItem, IncrementCount]),
            ])],
        }
    }

    pub fn remove_last(&self) -> ReactivePlan {
        use ReactiveStep::*;
        ReactivePlan {
            steps: vec![IfNonEmpty(vec![
                RemoveLastView {
                    keep_dom: self.info.is_only_child,
                },
                ShrinkByOne,
                IfAttached(vec![DecrementCount]),
            ])],
        }
    }

    pub fn clear(&self) -> ReactivePlan {
        use ReactiveStep::*;
        let mut steps = vec![TeardownAll {
            bulk: self.info.is_only_child,
        }];
        if self.info.is_only_child {
            steps.push(ResetParentContent);
        }
        steps.extend([ResetCount, ClearStorage]);
        ReactivePlan { steps }
    }

    /// Old views are torn down while the old data is still addressable.
    pub fn reassign(&self, value: &str) -> ReactivePlan {
        use ReactiveStep::*;
        let mut teardown = vec![TeardownAll {
            bulk: self.info.is_only_child,
        }];
        if self.info.is_only_child {
            teardown.push(ResetParentContent);
        }
        ReactivePlan {
            steps: vec![
                IfRendered(teardown),
                Assign {
                    value: value.to_string(),
                },
                CountFromSize,
                EnterRender,
                CreateEach,
                ExitRenderAndFlush,
            ],
        }
    }

    /// Data swap followed by moving the existing node; nothing is re-rendered.
    pub fn index_write(&self, index: &str, value: &str, compound_op: Option<&str>) -> ReactivePlan {
        use ReactiveStep::*;
        ReactivePlan {
            steps: vec![
                WriteElement {
                    index: index.to_string(),
                    value: value.to_string(),
                    compound_op: compound_op.map(str::to_string),
                },
                RelocateNode {
                    index: index.to_string(),
                },
            ],
        }
    }

    pub fn render(&self, plan: &ReactivePlan) -> String {
        let mut out = String::new();
        for step in &plan.steps {
            self.render_step(step, &mut out);
        }
        out
    }

    fn render_block(&self, head: &str, body: &[ReactiveStep], out: &mut String) {
        out.push_str(head);
        out.push_str("{\n");
        for step in body {
            self.render_step(step, out);
        }
        out.push_str("}\n");
    }

    fn render_step(&self, step: &ReactiveStep, out: &mut String) {
        let xs = &self.storage;
        let info = self.info;
        let var = &info.item_var;
        let count = info.count_var();
        let parent = info.parent();
        match step {
            ReactiveStep::Scope(body) => self.render_block("", body, out),
            ReactiveStep::IfAttached(body) => {
                self.render_block(&format!("if ({}.is_valid()) ", parent), body, out)
            }
            ReactiveStep::IfNonEmpty(body) => {
                self.render_block(&format!("if (!{}.empty()) ", xs), body, out)
            }
            ReactiveStep::IfRendered(body) => {
                self.render_block(&format!("if ({} > 0) ", count), body, out)
            }
            ReactiveStep::SaveOldCount => {
                out.push_str(&format!("int _old_count = (int){}.size();\n", xs))
            }
            ReactiveStep::Append { item } => out.push_str(&format!("{}.push_back({});\n", xs, item)),
            ReactiveStep::RebindExisting => out.push_str(&format!(
                "for (int _i = 0; _i < _old_count; _i++) {}[_i]._rebind();\n",
                xs
            )),
            ReactiveStep::BindNewest => {
                out.push_str(&format!("auto& {} = {}[{}.size() - 1];\n", var, xs, xs))
            }
            ReactiveStep::CreateItem => {
                out.push_str(&info.item_creation_code);
                if !info.item_creation_code.ends_with('\n') {
                    out.push('\n');
                }
            }
            ReactiveStep::IncrementCount => out.push_str(&format!("{}++;\n", count)),
            ReactiveStep::DecrementCount => out.push_str(&format!("{}--;\n", count)),
            ReactiveStep::RemoveLastView { keep_dom } => out.push_str(&format!(
                "{}.back()._remove_view({});\n",
                xs,
                if *keep_dom { "true" } else { "" }
            )),
            ReactiveStep::ShrinkByOne => out.push_str(&format!("{}.pop_back();\n", xs)),
            ReactiveStep::TeardownAll { bulk } => out.push_str(&format!(
                "for (auto& _v : {}) {{ _v._remove_view({}); }}\n",
                xs,
                if *bulk { "true" } else { "" }
            )),
            ReactiveStep::ResetParentContent => {
                out.push_str(&format!("webcc::dom::set_inner_html({}, \"\");\n", parent))
            }
            ReactiveStep::ResetCount => out.push_str(&format!("{} = 0;\n", count)),
            ReactiveStep::ClearStorage => out.push_str(&format!("{}.clear();\n", xs)),
            ReactiveStep::Assign { value } => out.push_str(&format!("{} = {};\n", xs, value)),
            ReactiveStep::CountFromSize => {
                out.push_str(&format!("{} = (int){}.size();\n", count, xs))
            }
            ReactiveStep::EnterRender => out.push_str("g_view_depth++;\n"),
            ReactiveStep::CreateEach => {
                out.push_str(&format!("for (auto& {} : {}) {{\n", var, xs));
                self.render_step(&ReactiveStep::CreateItem, out);
                out.push_str("}\n");
            }
            ReactiveStep::ExitRenderAndFlush => {
                out.push_str("if (--g_view_depth == 0) webcc::flush();\n")
            }
            ReactiveStep::WriteElement {
                index,
                value,
                compound_op,
            } => match compound_op {
                Some(op) => out.push_str(&format!(
                    "{xs}[{index}] = {xs}[{index}] {op} {value};\n"
                )),
                None => out.push_str(&format!("{}[{}] = {};\n", xs, index, value)),
            },
            ReactiveStep::RelocateNode { index } => {
                out.push_str(&format!("{{\nint _idx = {};\n", index));
                out.push_str(&format!(
                    "webcc::handle _node = {}[_idx]._get_root_element();\n",
                    xs
                ));
                out.push_str(&format!(
                    "webcc::handle _ref = (_idx + 1 < (int){xs}.size()) ? {xs}[_idx + 1]._get_root_element() : webcc::handle{{0}};\n"
                ));
                out.push_str(&format!(
                    "webcc::dom::move_before({}, _node, _ref);\n}}\n",
                    parent
                ));
            }
        }
    }
}
