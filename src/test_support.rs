//! Shared fixtures for the test modules.

use crate::ast::{CallArg, Expr, Stmt};
use crate::codegen::CodegenOptions;
use crate::emitter::Emitter;
use crate::error::CodegenResult;
use crate::reactive::LoopTable;
use crate::schema::{MappingKind, MethodDef, Schema, TypeDef};
use crate::scope::TypeContext;
use crate::statements::StmtEmitter;
use std::collections::HashSet;

pub fn mock_schema() -> Schema {
    use MappingKind::{Inline, Intrinsic, Map};
    Schema::from_types(vec![
        TypeDef::alias("int", "int32"),
        TypeDef::builtin("string")
            .method(MethodDef::new("length", Inline, "${this}.length()").returns("int"))
            .method(MethodDef::new("toUpper", Inline, "${this}.to_upper()").returns("string"))
            .method(
                MethodDef::new("split", Inline, "${this}.split(${0})")
                    .param("string", "sep")
                    .returns("string[]"),
            ),
        TypeDef::builtin("array")
            .method(MethodDef::new("push", Inline, "${this}.push_back(${0})").param("T", "item"))
            .method(MethodDef::new("pop", Inline, "${this}.pop_back()"))
            .method(MethodDef::new("clear", Inline, "${this}.clear()"))
            .method(MethodDef::new("sort", Inline, "${this}.sort()"))
            .method(MethodDef::new("size", Inline, "(int32_t)${this}.size()").returns("int")),
        TypeDef::new("DOMElement").method(
            MethodDef::new("setText", Map, "dom::set_inner_text")
                .param("DOMElement", "el")
                .param("string", "text"),
        ),
        TypeDef::new("Canvas")
            .extending("DOMElement")
            .nocopy()
            .method(
                MethodDef::new("createCanvas", Map, "canvas::create_canvas")
                    .shared()
                    .param("string", "id")
                    .param("int", "w")
                    .param("int", "h")
                    .returns("Canvas"),
            )
            .method(
                MethodDef::new("setSize", Map, "canvas::set_size")
                    .param("Canvas", "canvas")
                    .param("int", "w")
                    .param("int", "h"),
            )
            .method(
                MethodDef::new("getWidth", Map, "canvas::get_width")
                    .param("Canvas", "canvas")
                    .returns("int"),
            ),
        TypeDef::new("System")
            .method(MethodDef::new("log", Intrinsic, "log").shared().param("string", "msg"))
            .method(
                MethodDef::new("requestFrame", Intrinsic, "request_frame")
                    .shared()
                    .callback("cb"),
            )
            .method(MethodDef::new("onTick", Map, "system::on_tick").shared().callback("cb"))
            .method(MethodDef::new("time", Map, "system::get_time").shared().returns("int"))
            .method(
                MethodDef::new("trace", Intrinsic, "no_such_generator")
                    .shared()
                    .param("string", "msg"),
            ),
        TypeDef::new("Random").method(
            MethodDef::new("next", Intrinsic, "random")
                .shared()
                .param("int", "seed")
                .returns("float64"),
        ),
        TypeDef::new("Input").method(
            MethodDef::new("isKeyDown", Intrinsic, "key_down")
                .shared()
                .param("int", "key")
                .returns("bool"),
        ),
        TypeDef::new("Math")
            .method(MethodDef::constant("PI", "3.141592653589793"))
            .method(
                MethodDef::new("abs", Inline, "webcc::math::abs(${0})")
                    .shared()
                    .param("float64", "x")
                    .returns("float64"),
            ),
        TypeDef::new("Storage").method(
            MethodDef::new("setItem", Map, "storage::set_item")
                .shared()
                .param("string", "key")
                .param("string", "value"),
        ),
    ])
}

/// Component `App` with a handful of typed members, local types `Vector3` and
/// `Mode`, reference parameter `title` and methods `tick(dt)` and `render()`.
pub fn mock_context() -> TypeContext {
    let mut ctx = TypeContext::for_component("", "App", &HashSet::new());
    ctx.declare_local_type("Vector3");
    ctx.declare_local_type("Mode");
    ctx.set_component_symbol("name", "string");
    ctx.set_component_symbol("items", "int[]");
    ctx.set_component_symbol("todos", "Todo[]");
    ctx.set_component_symbol("canvas", "Canvas");
    ctx.set_component_symbol("count", "int");
    ctx.set_component_symbol("title", "string");
    ctx.mark_reference("title");
    ctx.register_method("tick", 1);
    ctx.register_method("render", 0);
    ctx
}

pub fn try_emit(expr: &Expr) -> CodegenResult<String> {
    let ctx = mock_context();
    let schema = mock_schema();
    let options = CodegenOptions::default();
    Emitter::new(&ctx, &schema, &options).emit_expr(expr)
}

pub fn emit(expr: &Expr) -> String {
    try_emit(expr).expect("emission should succeed")
}

pub fn emit_stmt(stmt: &Stmt, loops: &LoopTable) -> String {
    let ctx = mock_context();
    let schema = mock_schema();
    let options = CodegenOptions::default();
    StmtEmitter::new(Emitter::new(&ctx, &schema, &options), loops)
        .emit(stmt)
        .expect("statement emission should succeed")
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args.into_iter().map(CallArg::positional).collect())
}

pub fn expr_stmt(expression: Expr) -> Stmt {
    Stmt::Expression { expression }
}
