//! Match expressions lowered to an if/else-if chain inside an immediately
//! invoked lambda, with the subject bound once as `_m`.

use crate::ast::{MatchExpr, Pattern};
use crate::emitter::Emitter;
use crate::error::CodegenResult;

const SUBJECT: &str = "_m";

#[derive(Debug, Clone, PartialEq)]
pub struct MatchBranch {
    /// `None` for an unconditional branch.
    pub condition: Option<String>,
    pub bindings: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchChain {
    pub subject: String,
    pub branches: Vec<MatchBranch>,
}

impl MatchChain {
    /// True when some subject value falls through every branch.
    pub fn has_gap(&self) -> bool {
        !self.branches.iter().any(|b| b.condition.is_none())
    }

    pub fn render(&self, trap_gap: bool) -> String {
        let mut out = format!("([&]() {{ const auto& {} = {}; ", SUBJECT, self.subject);
        for (i, branch) in self.branches.iter().enumerate() {
            let body = format!("{}return {};", branch.bindings.concat(), branch.body);
            match (&branch.condition, i) {
                (Some(cond), 0) => out.push_str(&format!("if ({}) {{ {} }}", cond, body)),
                (Some(cond), _) => out.push_str(&format!(" else if ({}) {{ {} }}", cond, body)),
                (None, 0) => out.push_str(&format!("{{ {} }}", body)),
                (None, _) => out.push_str(&format!(" else {{ {} }}", body)),
            }
        }
        if trap_gap && self.has_gap() {
            out.push_str(" __builtin_unreachable();");
        }
        out.push_str(" }())");
        out
    }
}

impl<'a> Emitter<'a> {
    pub fn emit_match(&self, m: &MatchExpr) -> CodegenResult<String> {
        let chain = self.lower_match(m)?;
        Ok(chain.render(self.options().trap_non_exhaustive_match))
    }

    /// Builds the branch list. The first unconditional branch ends the chain;
    /// anything after it is unreachable and dropped.
    pub fn lower_match(&self, m: &MatchExpr) -> CodegenResult<MatchChain> {
        let mut branches = Vec::new();
        let mut closed = false;

        for (i, arm) in m.arms.iter().enumerate() {
            if closed {
                log::warn!(
                    "[CoiCodegen] match at line {}: arm {} follows an unconditional arm and is dropped",
                    m.line,
                    i
                );
                continue;
            }
            let body = self.emit_expr(&arm.body)?;
            let branch = match &arm.pattern {
                Pattern::Literal { value } => MatchBranch {
                    condition: Some(format!("{} == {}", SUBJECT, self.emit_expr(value)?)),
                    bindings: vec![],
                    body,
                },
                Pattern::Enum {
                    enum_name,
                    value_name,
                    component_name,
                } => MatchBranch {
                    condition: Some(format!(
                        "{} == {}",
                        SUBJECT,
                        self.emit_enum_access(component_name.as_deref(), enum_name, value_name)
                    )),
                    bindings: vec![],
                    body,
                },
                Pattern::Pod { fields, .. } => {
                    let mut conditions = Vec::new();
                    let mut bindings = Vec::new();
                    for field in fields {
                        match &field.value {
                            Some(value) => conditions.push(format!(
                                "{}.{} == {}",
                                SUBJECT,
                                field.name,
                                self.emit_expr(value)?
                            )),
                            None => bindings.push(format!(
                                "const auto& {} = {}.{}; ",
                                field.name, SUBJECT, field.name
                            )),
                        }
                    }
                    MatchBranch {
                        condition: (!conditions.is_empty()).then(|| conditions.join(" && ")),
                        bindings,
                        body,
                    }
                }
            };
            closed = branch.condition.is_none();
            branches.push(branch);
        }

        match &m.else_arm {
            Some(else_body) if !closed => branches.push(MatchBranch {
                condition: None,
                bindings: vec![],
                body: self.emit_expr(else_body)?,
            }),
            Some(_) => log::warn!(
                "[CoiCodegen] match at line {}: else arm follows an unconditional arm and is dropped",
                m.line
            ),
            None if !closed => log::warn!(
                "[CoiCodegen] match at line {} has no unconditional arm; unmatched subjects fall through",
                m.line
            ),
            None => {}
        }

        Ok(MatchChain {
            subject: self.emit_expr(&m.subject)?,
            branches,
        })
    }
}
