#[cfg(test)]
mod tests {
    use crate::ast::{CallArg, Expr};
    use crate::codegen::CodegenOptions;
    use crate::dispatch::{expand_inline_template, find_shortcut, BuiltinFamily};
    use crate::emitter::Emitter;
    use crate::error::ERR_CALLBACK_BY_VALUE;
    use crate::schema::{MappingKind, MethodDef, TypeDef};
    use crate::test_support::{call, emit, mock_context, mock_schema, try_emit};

    fn chain(text: &str, name: &str) -> Expr {
        Expr::binary(Expr::string(text), "+", Expr::ident(name))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BUILT-IN SHORTCUTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_string_length_shortcut() {
        assert_eq!(emit(&call("name.length", vec![])), "(int32_t)name.length()");
        assert_eq!(emit(&call("title.length", vec![])), "(int32_t)(*title).length()");
    }

    #[test]
    fn test_collection_shortcuts() {
        assert_eq!(emit(&call("items.push", vec![Expr::int(4)])), "items.push_back(4)");
        assert_eq!(emit(&call("items.size", vec![])), "(int32_t)items.size()");
        assert_eq!(emit(&call("items.isEmpty", vec![])), "items.empty()");
    }

    #[test]
    fn test_shortcut_table_arity() {
        assert!(find_shortcut(BuiltinFamily::Text, "substr", 2).is_some());
        assert!(find_shortcut(BuiltinFamily::Text, "substr", 1).is_none());
        assert!(find_shortcut(BuiltinFamily::Collection, "push", 1).unwrap().mutates);
        assert!(!find_shortcut(BuiltinFamily::Collection, "at", 1).unwrap().mutates);
    }

    #[test]
    fn test_template_expansion() {
        let args = vec!["a".to_string()];
        assert_eq!(expand_inline_template("${this}.f(${0})", "x", &args), "x.f(a)");
        assert_eq!(expand_inline_template("f(${0}, ${1})", "x", &args), "f(a, ${1})");
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // STATIC SCHEMA CALLS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_log_intrinsic() {
        assert_eq!(
            emit(&call("System.log", vec![Expr::string("hi")])),
            "webcc::system::log(\"hi\")"
        );
    }

    #[test]
    fn test_log_with_chain_uses_formatter_block() {
        assert_eq!(
            emit(&call("System.log", vec![chain("n=", "count")])),
            "{ webcc::formatter<512> _fmt; _fmt << (\"n=\"); _fmt << (count); webcc::system::log(_fmt.c_str()); }"
        );
    }

    #[test]
    fn test_random_intrinsic() {
        assert_eq!(emit(&call("Random.next", vec![])), "webcc::random()");
        assert_eq!(
            emit(&call("Random.next", vec![Expr::int(42)])),
            "(webcc::random_seed(42), webcc::random())"
        );
    }

    #[test]
    fn test_key_state_intrinsic() {
        assert_eq!(emit(&call("Input.isKeyDown", vec![Expr::int(32)])), "g_key_state[32]");
    }

    #[test]
    fn test_inline_static_call() {
        assert_eq!(emit(&call("Math.abs", vec![Expr::ident("x")])), "webcc::math::abs(x)");
    }

    #[test]
    fn test_unknown_intrinsic_emits_nothing() {
        assert_eq!(emit(&call("System.trace", vec![Expr::string("x")])), "");
    }

    #[test]
    fn test_enum_size() {
        assert_eq!(
            emit(&call("App.Mode.size", vec![])),
            "static_cast<int32_t>(App_Mode::_COUNT)"
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // MAPPED CALLS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_receiver_is_passed_first() {
        assert_eq!(
            emit(&call("canvas.setSize", vec![Expr::int(100), Expr::int(50)])),
            "webcc::canvas::set_size(canvas, 100, 50)"
        );
    }

    #[test]
    fn test_inherited_method() {
        assert_eq!(
            emit(&call("canvas.setText", vec![Expr::string("hi")])),
            "webcc::dom::set_inner_text(canvas, \"hi\")"
        );
    }

    #[test]
    fn test_narrow_return_is_cast() {
        assert_eq!(
            emit(&call("canvas.getWidth", vec![])),
            "(int32_t)(webcc::canvas::get_width(canvas))"
        );
        assert_eq!(
            emit(&call("System.time", vec![])),
            "(int32_t)(webcc::system::get_time())"
        );
    }

    #[test]
    fn test_shared_factory() {
        assert_eq!(
            emit(&call(
                "Canvas.createCanvas",
                vec![Expr::string("c"), Expr::int(10), Expr::int(20)]
            )),
            "webcc::canvas::create_canvas(\"c\", 10, 20)"
        );
    }

    #[test]
    fn test_chain_argument_moves_call_into_formatter_scope() {
        assert_eq!(
            emit(&call("Storage.setItem", vec![Expr::string("k"), chain("v=", "count")])),
            "{ webcc::formatter<512> _fmt; _fmt << (\"v=\"); _fmt << (count); webcc::storage::set_item(\"k\", _fmt.c_str()); }"
        );
        assert_eq!(
            emit(&call("Storage.setItem", vec![chain("v=", "count"), Expr::string("v")])),
            "{ webcc::formatter<512> _fmt; _fmt << (\"v=\"); _fmt << (count); webcc::storage::set_item(_fmt.c_str(), \"v\"); }"
        );
    }

    #[test]
    fn test_unknown_receiver_matches_handle_method() {
        assert_eq!(
            emit(&call("el2.setText", vec![Expr::string("a")])),
            "webcc::dom::set_inner_text(el2, \"a\")"
        );
        assert_eq!(emit(&call("s.toUpper", vec![])), "s.to_upper()");
    }

    #[test]
    fn test_receiver_must_match_first_parameter() {
        let mut ctx = mock_context();
        ctx.set_component_symbol("panel", "Panel");
        let mut schema = mock_schema();
        schema.insert(TypeDef::new("Panel").method(
            MethodDef::new("attach", MappingKind::Map, "dom::attach").param("Canvas", "target"),
        ));
        let options = CodegenOptions::default();
        let emitter = Emitter::new(&ctx, &schema, &options);
        assert_eq!(
            emitter.emit_expr(&call("panel.attach", vec![])).unwrap(),
            "panel.attach()"
        );
        assert_eq!(
            emitter
                .emit_expr(&call("panel.attach", vec![Expr::ident("canvas")]))
                .unwrap(),
            "webcc::dom::attach(canvas)"
        );
    }

    #[test]
    fn test_runtime_function_called_by_name() {
        assert_eq!(
            emit(&call(
                "setSize",
                vec![Expr::ident("canvas"), Expr::int(1), Expr::int(2)]
            )),
            "webcc::canvas::set_size(canvas, 1, 2)"
        );
        assert_eq!(
            emit(&call("get_width", vec![Expr::ident("canvas")])),
            "(int32_t)(webcc::canvas::get_width(canvas))"
        );
        assert_eq!(
            emit(&call("setSize", vec![Expr::int(1), Expr::int(2)])),
            "setSize(1, 2)"
        );
        let err = try_emit(&call("onTick", vec![Expr::ident("tick")])).unwrap_err();
        assert_eq!(err.code, ERR_CALLBACK_BY_VALUE);
    }

    #[test]
    fn test_component_method_shadows_runtime_function() {
        let mut ctx = mock_context();
        ctx.register_method("setSize", 3);
        let schema = mock_schema();
        let options = CodegenOptions::default();
        let code = Emitter::new(&ctx, &schema, &options)
            .emit_expr(&call("setSize", vec![Expr::int(0), Expr::int(1), Expr::int(2)]))
            .unwrap();
        assert_eq!(code, "setSize(0, 1, 2)");
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CALLBACKS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_callback_by_value_is_rejected() {
        let err = try_emit(&call("System.onTick", vec![Expr::ident("tick")])).unwrap_err();
        assert_eq!(err.code, ERR_CALLBACK_BY_VALUE);
        assert!(err.message.contains("cb"), "message names the parameter: {}", err.message);
    }

    #[test]
    fn test_callback_by_reference_becomes_lambda() {
        let by_ref = Expr::call("System.onTick", vec![CallArg::by_ref(Expr::ident("tick"))]);
        assert_eq!(
            emit(&by_ref),
            "webcc::system::on_tick([this](auto _a0) { tick(_a0); })"
        );

        let frame = Expr::call("System.requestFrame", vec![CallArg::by_ref(Expr::ident("render"))]);
        assert_eq!(
            emit(&frame),
            "webcc::system::request_animation_frame([this]() { render(); })"
        );
    }

    #[test]
    fn test_intrinsic_callback_by_value_is_rejected() {
        let err = try_emit(&call("System.requestFrame", vec![Expr::ident("render")])).unwrap_err();
        assert_eq!(err.code, ERR_CALLBACK_BY_VALUE);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FALLBACK
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_unmatched_calls_pass_through() {
        assert_eq!(emit(&call("helper", vec![Expr::int(1), Expr::int(2)])), "helper(1, 2)");
        assert_eq!(emit(&call("player.update", vec![])), "player.update()");
        assert_eq!(emit(&call("Utils.compute", vec![Expr::int(3)])), "Utils::compute(3)");
    }

    #[test]
    fn test_move_argument() {
        let arg = CallArg {
            is_move: true,
            ..CallArg::positional(Expr::ident("items"))
        };
        assert_eq!(emit(&Expr::call("consume", vec![arg])), "consume(webcc::move(items))");
    }
}
