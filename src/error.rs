use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_CALLBACK_BY_VALUE: &str = "C-ERR-CALLBACK-001";
pub const ERR_INVALID_INPUT: &str = "C-ERR-INPUT-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_CALLBACK_BY_VALUE => {
            "Callbacks handed to the runtime always refer to a live component method."
        }
        ERR_INVALID_INPUT => "Code generation only runs on a well-formed AST and schema.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// The only error raised by lowering. Everything else degrades to passthrough code
/// and is left to the native toolchain to reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message} (line {line})")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub guarantee: String,
    pub line: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, line: u32) -> Self {
        Self::with_details(code, message, line, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        line: u32,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            line,
            context,
            hints,
        }
    }

    pub fn callback_by_value(call: &str, param: &str, line: u32) -> Self {
        Self::with_details(
            ERR_CALLBACK_BY_VALUE,
            &format!(
                "Callback parameter '{}' of '{}' must be passed by reference.",
                param, call
            ),
            line,
            Some(call.to_string()),
            vec![format!("Write '&{}' at the call site.", param)],
        )
    }
}

impl From<serde_json::Error> for CompilerError {
    fn from(err: serde_json::Error) -> Self {
        CompilerError::new(
            ERR_INVALID_INPUT,
            &format!("Malformed input: {}", err),
            err.line() as u32,
        )
    }
}

pub type CodegenResult<T> = Result<T, CompilerError>;
