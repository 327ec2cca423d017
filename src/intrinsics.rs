//! Hand-written generators for schema entries mapped as `intrinsic`.
//!
//! An unknown key, or an argument count the generator cannot handle, yields an
//! empty string.

use crate::ast::FunctionCall;
use crate::emitter::Emitter;
use crate::error::CodegenResult;
use crate::formatter::needs_formatter;

pub fn generate(emitter: &Emitter, key: &str, call: &FunctionCall) -> CodegenResult<String> {
    let args = &call.args;
    match (key, args.len()) {
        ("random", 0) => Ok("webcc::random()".to_string()),
        ("random", 1) | ("random_seeded", 1) => Ok(format!(
            "(webcc::random_seed({}), webcc::random())",
            emitter.emit_arg(&args[0])?
        )),
        ("key_down", 1) => Ok(format!("g_key_state[{}]", emitter.emit_arg(&args[0])?)),
        ("key_up", 1) => Ok(format!("!g_key_state[{}]", emitter.emit_arg(&args[0])?)),
        ("log", 1) => {
            if needs_formatter(&args[0].value) {
                emitter.formatter_block(&args[0].value, "webcc::system::log(", ")")
            } else {
                Ok(format!("webcc::system::log({})", emitter.emit_arg(&args[0])?))
            }
        }
        ("request_frame", 1) => Ok(format!(
            "webcc::system::request_animation_frame({})",
            emitter.emit_callback_arg(&args[0])?
        )),
        _ => {
            log::debug!(
                "[CoiCodegen] no intrinsic generator for '{}' with {} argument(s)",
                key,
                args.len()
            );
            Ok(String::new())
        }
    }
}
