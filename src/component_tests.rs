#[cfg(test)]
mod tests {
    use crate::ast::{
        Assignment, ComponentParam, DataDef, DataField, EnumDef, Expr, FunctionDef, Param, Stmt,
        VarDeclaration,
    };
    use crate::codegen::{
        generate_component, generate_component_json, generate_units, generate_units_parallel,
        global_types, CodegenOptions, ComponentOutput, ComponentUnit, FragmentKind,
    };
    use crate::definitions::enum_underlying_type;
    use crate::emitter::Emitter;
    use crate::error::{ERR_CALLBACK_BY_VALUE, ERR_INVALID_INPUT};
    use crate::reactive::LoopTable;
    use crate::scope::TypeContext;
    use crate::test_support::{call, expr_stmt, mock_context, mock_schema};
    use std::collections::HashSet;

    fn method(name: &str, return_type: &str, params: Vec<Param>, body: Vec<Stmt>) -> FunctionDef {
        FunctionDef {
            name: name.to_string(),
            return_type: return_type.to_string(),
            params,
            body,
            is_public: false,
        }
    }

    fn param(type_name: &str, name: &str) -> Param {
        Param {
            type_name: type_name.to_string(),
            name: name.to_string(),
            is_mutable: false,
            is_reference: false,
        }
    }

    fn counter_unit() -> ComponentUnit {
        let mut unit = ComponentUnit::new("Counter");
        unit.enums.push(EnumDef {
            name: "Mode".to_string(),
            values: vec!["Idle".to_string(), "Running".to_string()],
        });
        unit.data.push(DataDef {
            name: "Vector3".to_string(),
            module_name: String::new(),
            fields: vec![
                DataField {
                    type_name: "float64".to_string(),
                    name: "x".to_string(),
                },
                DataField {
                    type_name: "float64".to_string(),
                    name: "y".to_string(),
                },
            ],
        });
        unit.params.push(ComponentParam {
            type_name: "string".to_string(),
            name: "title".to_string(),
            default_value: None,
            is_mutable: false,
            is_reference: true,
            is_public: true,
        });
        unit.state
            .push(VarDeclaration::new("int", "count", Some(Expr::int(0))).mutable());
        unit.methods.push(method(
            "increment",
            "void",
            vec![],
            vec![Stmt::Assign(Assignment {
                name: "count".to_string(),
                value: Expr::binary(Expr::ident("count"), "+", Expr::int(1)),
                target_type: None,
                is_move: false,
            })],
        ));
        unit
    }

    fn generate(unit: &ComponentUnit) -> ComponentOutput {
        let globals = global_types(std::slice::from_ref(unit));
        generate_component(unit, &mock_schema(), &globals, &CodegenOptions::default()).unwrap()
    }

    fn code<'o>(output: &'o ComponentOutput, name: &str, kind: FragmentKind) -> &'o str {
        &output
            .fragment(name, kind)
            .unwrap_or_else(|| panic!("missing fragment {} ({:?})", name, kind))
            .code
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // FRAGMENTS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_counter_fragments() {
        let output = generate(&counter_unit());
        assert_eq!(output.component, "Counter");
        assert_eq!(
            code(&output, "Mode", FragmentKind::Enum),
            "enum struct Counter_Mode : uint8_t { Idle, Running, _COUNT };\n"
        );
        assert_eq!(
            code(&output, "Vector3", FragmentKind::Data),
            "struct Counter_Vector3 {\n    double x;\n    double y;\n};\n"
        );
        assert_eq!(
            code(&output, "title", FragmentKind::Param),
            "webcc::string* title = nullptr;"
        );
        assert_eq!(code(&output, "count", FragmentKind::State), "int32_t count = 0;");
        assert_eq!(
            code(&output, "increment", FragmentKind::Method),
            "void increment() {\ncount = (count + 1);\n}\n"
        );
    }

    #[test]
    fn test_modifications_per_method() {
        let output = generate(&counter_unit());
        let increment = &output.modifications["increment"];
        assert_eq!(increment.len(), 1);
        assert!(increment.contains("count"));
    }

    #[test]
    fn test_method_parameter_shadows_reference() {
        let mut unit = counter_unit();
        unit.methods.push(method(
            "echo",
            "string",
            vec![param("string", "title")],
            vec![Stmt::Return {
                value: Some(Expr::ident("title")),
            }],
        ));
        unit.methods.push(method(
            "heading",
            "string",
            vec![],
            vec![Stmt::Return {
                value: Some(Expr::ident("title")),
            }],
        ));
        let output = generate(&unit);
        assert_eq!(
            code(&output, "echo", FragmentKind::Method),
            "webcc::string echo(const webcc::string title) {\nreturn title;\n}\n"
        );
        assert!(code(&output, "heading", FragmentKind::Method).contains("return (*title);"));
    }

    #[test]
    fn test_local_declarations_type_method_calls() {
        let mut unit = counter_unit();
        unit.methods.push(method(
            "measure",
            "int",
            vec![],
            vec![
                Stmt::VarDecl(VarDeclaration::new("string", "s", Some(Expr::string("abc")))),
                Stmt::Return {
                    value: Some(call("s.length", vec![])),
                },
            ],
        ));
        let output = generate(&unit);
        let body = code(&output, "measure", FragmentKind::Method);
        assert!(body.starts_with("int32_t measure() {\n"));
        assert!(body.contains("const webcc::string s = \"abc\";\n"));
        assert!(body.contains("return (int32_t)s.length();\n"));
    }

    #[test]
    fn test_callback_error_aborts_unit() {
        let mut unit = counter_unit();
        unit.methods.push(method(
            "start",
            "void",
            vec![],
            vec![expr_stmt(call("System.onTick", vec![Expr::ident("increment")]))],
        ));
        let globals = global_types(std::slice::from_ref(&unit));
        let err = generate_component(&unit, &mock_schema(), &globals, &CodegenOptions::default())
            .unwrap_err();
        assert_eq!(err.code, ERR_CALLBACK_BY_VALUE);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BATCHES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_parallel_matches_sequential() {
        let mut units = Vec::new();
        for i in 0..8 {
            let mut unit = counter_unit();
            unit.name = format!("Counter{}", i);
            units.push(unit);
        }
        let schema = mock_schema();
        let options = CodegenOptions::default();
        let sequential = generate_units(&units, &schema, &options).unwrap();
        let parallel = generate_units_parallel(&units, &schema, &options).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[3].component, "Counter3");
    }

    #[test]
    fn test_cross_component_types_use_module_prefix() {
        let mut a = ComponentUnit::new("A");
        a.module_name = "ui".to_string();
        let mut b = ComponentUnit::new("B");
        b.module_name = "ui".to_string();
        b.state.push(VarDeclaration::new("A", "child", None));

        let outputs =
            generate_units(&[a, b], &mock_schema(), &CodegenOptions::default()).unwrap();
        assert_eq!(outputs[1].component, "ui_B");
        assert_eq!(code(&outputs[1], "child", FragmentKind::State), "ui_A child;");
    }

    #[test]
    fn test_module_level_data_is_shared_across_units() {
        let mut shapes = ComponentUnit::new("Shapes");
        shapes.module_name = "math".to_string();
        shapes.data.push(DataDef {
            name: "Vec2".to_string(),
            module_name: "math".to_string(),
            fields: vec![DataField {
                type_name: "float64".to_string(),
                name: "x".to_string(),
            }],
        });
        shapes.state.push(VarDeclaration::new("Vec2", "origin", None));
        let mut player = ComponentUnit::new("Player");
        player.module_name = "math".to_string();
        player.state.push(VarDeclaration::new("Vec2", "pos", None));

        let units = [shapes, player];
        assert!(global_types(&units).contains("math_Vec2"));
        let outputs = generate_units(&units, &mock_schema(), &CodegenOptions::default()).unwrap();
        assert_eq!(
            code(&outputs[0], "Vec2", FragmentKind::Data),
            "struct math_Vec2 {\n    double x;\n};\n"
        );
        assert_eq!(code(&outputs[0], "origin", FragmentKind::State), "math_Vec2 origin;");
        assert_eq!(code(&outputs[1], "pos", FragmentKind::State), "math_Vec2 pos;");
    }

    #[test]
    fn test_json_bridge() {
        let unit_json = serde_json::to_string(&counter_unit()).unwrap();
        let schema_json = mock_schema().to_json().unwrap();
        let json = generate_component_json(&unit_json, &schema_json, None).unwrap();
        let output: ComponentOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(output, generate(&counter_unit()));

        let err = generate_component_json("not json", &schema_json, None).unwrap_err();
        assert_eq!(err.code, ERR_INVALID_INPUT);

        let trap = generate_component_json(&unit_json, &schema_json, Some(r#"{"trapNonExhaustiveMatch":true}"#));
        assert!(trap.is_ok());
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // DEFINITIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_enum_underlying_type_counts_sentinel() {
        assert_eq!(enum_underlying_type(2), "uint8_t");
        assert_eq!(enum_underlying_type(255), "uint8_t");
        assert_eq!(enum_underlying_type(256), "uint16_t");
        assert_eq!(enum_underlying_type(70000), "uint32_t");
    }

    #[test]
    fn test_module_level_data() {
        let ctx = TypeContext::module_scope("geo", &HashSet::new());
        let schema = mock_schema();
        let options = CodegenOptions::default();
        let def = DataDef {
            name: "Point".to_string(),
            module_name: "geo".to_string(),
            fields: vec![DataField {
                type_name: "int".to_string(),
                name: "x".to_string(),
            }],
        };
        assert_eq!(
            Emitter::new(&ctx, &schema, &options).emit_data_def(&def),
            "struct geo_Point {\n    int32_t x;\n};\n"
        );
    }

    #[test]
    fn test_function_signature() {
        let ctx = mock_context();
        let schema = mock_schema();
        let options = CodegenOptions::default();
        let emitter = Emitter::new(&ctx, &schema, &options);
        let def = method(
            "shift",
            "void",
            vec![
                param("int", "a"),
                Param {
                    is_mutable: true,
                    is_reference: true,
                    ..param("Vector3", "v")
                },
            ],
            vec![],
        );
        let loops = LoopTable::new();
        assert_eq!(
            emitter.emit_function(&def, &loops, "").unwrap(),
            "void shift(const int32_t a, App_Vector3& v) {\n}\n"
        );
        assert_eq!(
            emitter.emit_function(&def, &loops, "flush();").unwrap(),
            "void shift(const int32_t a, App_Vector3& v) {\nflush();\n}\n"
        );
    }
}
