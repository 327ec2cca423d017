#[cfg(test)]
mod tests {
    use crate::schema::{to_snake_case, MappingKind, Schema, TypeDef};
    use crate::scope::TypeContext;
    use crate::test_support::{mock_context, mock_schema};
    use crate::types::{is_collection_type, narrowing_cast, TypeResolver};
    use std::collections::HashSet;

    fn physics_context() -> TypeContext {
        let mut ctx = TypeContext::for_component("", "Physics", &HashSet::new());
        ctx.declare_local_type("Vector3");
        ctx
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // RESOLUTION RULES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_local_collection_is_component_prefixed() {
        let ctx = physics_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("Vector3[]"), "webcc::vector<Physics_Vector3>");
        assert_eq!(resolver.resolve("Vector3[8]"), "webcc::array<Physics_Vector3, 8>");
    }

    #[test]
    fn test_local_declaration_wins_over_module_type() {
        let mut globals = HashSet::new();
        globals.insert("game_Vector3".to_string());
        let mut ctx = TypeContext::for_component("game", "game_Physics", &globals);
        ctx.declare_local_type("Vector3");
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("Vector3"), "game_Physics_Vector3");
    }

    #[test]
    fn test_module_form_used_when_globally_registered() {
        let mut globals = HashSet::new();
        globals.insert("game_Vector3".to_string());
        let ctx = TypeContext::for_component("game", "game_Renderer", &globals);
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("Vector3"), "game_Vector3");
        assert_eq!(resolver.resolve("Color"), "Color", "unregistered names pass through");
    }

    #[test]
    fn test_explicit_module_syntax_is_flattened() {
        let ctx = mock_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("ui.Button"), "ui_Button");
        assert_eq!(resolver.resolve("ui::Button"), "ui_Button");
        assert_eq!(resolver.resolve("webcc::handle"), "webcc::handle");
    }

    #[test]
    fn test_primitive_aliases() {
        let ctx = mock_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("int"), "int32_t");
        assert_eq!(resolver.resolve("uint8"), "uint8_t");
        assert_eq!(resolver.resolve("float32"), "float");
        assert_eq!(resolver.resolve("float64"), "double");
        assert_eq!(resolver.resolve("float"), "float");
        assert_eq!(resolver.resolve("double"), "double");
        assert_eq!(resolver.resolve("string"), "webcc::string");
        assert_eq!(resolver.resolve("bool"), "bool");
    }

    #[test]
    fn test_non_numeric_bracket_is_left_alone() {
        let ctx = mock_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("int[N]"), "int[N]");
    }

    #[test]
    fn test_handles_and_meta_types() {
        let ctx = mock_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        assert_eq!(resolver.resolve("Canvas"), "webcc::Canvas");
        assert_eq!(resolver.resolve("CanvasMeta"), "webcc::CanvasMeta");
        assert_eq!(resolver.resolve("Vector3Meta"), "App_Vector3Meta");
        assert_eq!(resolver.resolve("Canvas[]"), "webcc::vector<webcc::Canvas>");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let ctx = physics_context();
        let schema = mock_schema();
        let resolver = TypeResolver::new(&ctx, &schema);
        let names = [
            "int", "string", "float32", "float", "float64", "uint8", "float64[][]", "Vector3",
            "Vector3[]", "Vector3[4]", "Vector3Meta", "Canvas", "CanvasMeta", "Canvas[2]", "ui.Button", "webcc::handle", "Unknown", "int[N]",
        ];
        for name in names {
            let once = resolver.resolve(name);
            assert_eq!(resolver.resolve(&once), once, "resolving '{}' twice changed it", name);
        }
    }

    #[test]
    fn test_collection_helpers() {
        assert!(is_collection_type("int[]"));
        assert!(is_collection_type("Vector3[3]"));
        assert!(!is_collection_type("int[N]"));
        assert_eq!(narrowing_cast("int32_t"), Some("int32_t"));
        assert_eq!(narrowing_cast("double"), None);
        assert_eq!(narrowing_cast("int64_t"), None);
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SCHEMA
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("setInnerText"), "set_inner_text");
        assert_eq!(to_snake_case("getContext2d"), "get_context_2d");
        assert_eq!(to_snake_case("Canvas"), "canvas");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_alias_cycle_terminates() {
        let schema = Schema::from_types(vec![TypeDef::alias("a", "b"), TypeDef::alias("b", "a")]);
        let resolved = schema.resolve_alias("a");
        assert!(resolved == "a" || resolved == "b");
    }

    #[test]
    fn test_schema_queries() {
        let schema = mock_schema();
        assert!(schema.is_handle("Canvas"));
        assert!(!schema.is_handle("string"));
        assert!(!schema.is_handle("int"), "aliases are not handles");
        assert!(schema.inherits_from("Canvas", "DOMElement"));
        assert!(!schema.inherits_from("DOMElement", "Canvas"));
        assert_eq!(schema.resolve_alias("int"), "int32");

        let set_text = schema.lookup_method("Canvas", "setText", Some(2));
        assert!(set_text.is_some(), "inherited methods are visible");
        assert!(schema.lookup_method("Canvas", "setText", Some(1)).is_none());
    }

    #[test]
    fn test_reverse_function_lookup() {
        let schema = mock_schema();
        let found = schema.lookup_func("setInnerText", Some(2)).expect("lookup by camel case");
        assert_eq!(found.type_name, "DOMElement");
        assert_eq!(found.namespace, "dom");
        assert_eq!(found.function, "set_inner_text");
        assert!(schema.lookup_func("set_size", None).is_some());
        assert!(schema.lookup_func("set_size", Some(1)).is_none());
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "types": [
                {
                    "name": "Audio",
                    "methods": [
                        {
                            "name": "play",
                            "params": [{ "type": "Audio", "name": "a" }],
                            "mapping": "map",
                            "mappingValue": "audio::play"
                        },
                        { "name": "VOLUME_MAX", "isShared": true, "isConstant": true,
                          "mapping": "inline", "mappingValue": "100" }
                    ]
                }
            ]
        }"#;
        let schema = Schema::from_json(json).unwrap();
        let play = schema.lookup_method("Audio", "play", Some(1)).unwrap();
        assert_eq!(play.mapping, MappingKind::Map);
        assert_eq!(play.return_type, "void");
        assert_eq!(play.map_target(), Some(("audio", "play")));

        let round_trip = Schema::from_json(&schema.to_json().unwrap()).unwrap();
        assert!(round_trip.lookup_method("Audio", "VOLUME_MAX", None).unwrap().is_constant);
    }

    #[test]
    fn test_malformed_schema_is_input_error() {
        let err = Schema::from_json("{ \"types\": 3 }").unwrap_err();
        assert_eq!(err.code, crate::error::ERR_INVALID_INPUT);
    }
}
