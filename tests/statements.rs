use sass_syntax::ast::{AstExpr, AstSelector, AstStmt};

use macros::{only_stmt, ruleset_body};

#[macro_use]
mod macros;

parse!(
    variable_then_ruleset,
    "$c: red;\na { color: $c; }",
    |body| {
        assert_eq!(body.len(), 2);

        match &body[0] {
            AstStmt::VariableDecl(decl) => {
                assert_eq!(decl.name.as_str(), "c");
                assert!(!decl.is_guarded);
                assert!(!decl.is_global);
                match &decl.value {
                    AstExpr::Color(color) => {
                        assert_eq!(color.red, 0xFF);
                        assert_eq!(color.green, 0);
                        assert_eq!(color.blue, 0);
                        assert_eq!(color.text, "red");
                    }
                    v => panic!("expected named color, got {:?}", v),
                }
            }
            stmt => panic!("expected variable declaration, got {:?}", stmt),
        }

        match &body[1] {
            AstStmt::RuleSet(ruleset) => {
                let list = match &ruleset.selector {
                    AstSelector::List(list) => list,
                    AstSelector::Schema(..) => panic!("plain selector parsed lazily"),
                };
                assert_eq!(list.to_string(), "a");

                match &ruleset.body[0] {
                    AstStmt::Style(style) => {
                        assert_eq!(style.name.as_plain(), Some("color"));
                        match &style.value.as_ref().unwrap().node {
                            AstExpr::Variable { name, namespace } => {
                                assert_eq!(name.node.as_str(), "c");
                                assert!(namespace.is_none());
                            }
                            v => panic!("expected variable reference, got {:?}", v),
                        }
                    }
                    stmt => panic!("expected declaration, got {:?}", stmt),
                }
            }
            stmt => panic!("expected style rule, got {:?}", stmt),
        }
    }
);

parse!(
    variable_flags,
    "$a: 1 !default !global;",
    |body| match only_stmt(body) {
        AstStmt::VariableDecl(decl) => {
            assert!(decl.is_guarded);
            assert!(decl.is_global);
        }
        stmt => panic!("expected variable declaration, got {:?}", stmt),
    }
);

parse!(
    if_else_chain,
    "a { @if $a { x: 1; } @else if $b { x: 2; } @else { x: 3; } }",
    |body| {
        match &ruleset_body(body)[0] {
            AstStmt::If(if_rule) => {
                assert_eq!(if_rule.if_clauses.len(), 2);
                assert!(matches!(
                    if_rule.if_clauses[0].condition,
                    AstExpr::Variable { .. }
                ));
                assert_eq!(if_rule.if_clauses[0].body.len(), 1);
                assert_eq!(if_rule.if_clauses[1].body.len(), 1);
                assert_eq!(if_rule.else_clause.as_ref().map(Vec::len), Some(1));
            }
            stmt => panic!("expected @if, got {:?}", stmt),
        }
    }
);

error!(
    else_without_if,
    "a { @else { x: 1; } }",
    "Error: Invalid CSS: @else must come after @if"
);

parse!(
    for_rule_through,
    "a { @for $i from 1 through 3 { x: $i; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::For(for_rule) => {
            assert_eq!(for_rule.variable.node.as_str(), "i");
            assert!(!for_rule.is_exclusive);
            assert_eq!(for_rule.body.len(), 1);
        }
        stmt => panic!("expected @for, got {:?}", stmt),
    }
);

parse!(
    for_rule_to_is_exclusive,
    "a { @for $i from 1 to 3 { x: $i; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::For(for_rule) => assert!(for_rule.is_exclusive),
        stmt => panic!("expected @for, got {:?}", stmt),
    }
);

parse!(
    each_rule_with_multiple_variables,
    "a { @each $key, $value in $map { x: $key; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Each(each) => {
            assert_eq!(each.variables.len(), 2);
            assert_eq!(each.variables[0].as_str(), "key");
            assert_eq!(each.variables[1].as_str(), "value");
        }
        stmt => panic!("expected @each, got {:?}", stmt),
    }
);

parse!(
    while_rule,
    "a { @while $i < 3 { x: $i; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::While(while_rule) => {
            assert!(matches!(while_rule.condition, AstExpr::BinaryOp(..)));
        }
        stmt => panic!("expected @while, got {:?}", stmt),
    }
);

parse!(
    function_with_return,
    "@function double($n) { @return $n * 2; }",
    |body| match only_stmt(body) {
        AstStmt::FunctionDecl(decl) => {
            assert_eq!(decl.name.node.as_str(), "double");
            assert_eq!(decl.arguments.args.len(), 1);
            assert!(matches!(decl.body[0], AstStmt::Return(..)));
        }
        stmt => panic!("expected @function, got {:?}", stmt),
    }
);

error!(
    function_with_reserved_name,
    "@function not($a) { @return $a; }",
    "Error: Invalid function name."
);

error!(
    function_containing_style_rule,
    "@function f() { a { x: y; } }",
    "Error: @function rules may not contain style rules."
);

parse!(
    mixin_with_args_and_content,
    "@mixin pad($x, $y: 2px, $rest...) { padding: $x $y; @content; }",
    |body| match only_stmt(body) {
        AstStmt::Mixin(mixin) => {
            assert_eq!(mixin.name.as_str(), "pad");
            assert_eq!(mixin.args.args.len(), 2);
            assert_eq!(mixin.args.args[1].name.as_str(), "y");
            assert!(mixin.args.args[1].default.is_some());
            assert_eq!(mixin.args.rest.as_ref().map(|r| r.as_str()), Some("rest"));
            assert!(mixin.has_content);
        }
        stmt => panic!("expected @mixin, got {:?}", stmt),
    }
);

parse!(
    include_with_named_args_and_block,
    "a { @include pad(1px, $y: 3px) { x: y; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Include(include) => {
            assert_eq!(include.name.node.as_str(), "pad");
            assert_eq!(include.args.positional.len(), 1);
            assert_eq!(include.args.named.len(), 1);
            assert!(include.content.is_some());
        }
        stmt => panic!("expected @include, got {:?}", stmt),
    }
);

parse!(
    mixin_and_function_names_normalize_underscores,
    "@mixin a_b() { x: y; }",
    |body| match only_stmt(body) {
        AstStmt::Mixin(mixin) => assert_eq!(mixin.name.as_str(), "a-b"),
        stmt => panic!("expected @mixin, got {:?}", stmt),
    }
);

error!(
    content_outside_mixin,
    "@content;",
    "Error: @content is only allowed within mixin declarations."
);

error!(
    extend_at_root,
    "@extend a;",
    "Error: @extend may only be used within style rules."
);

parse!(
    extend_with_optional_flag,
    "a { @extend %placeholder !optional; }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Extend(extend) => {
            assert!(extend.is_optional);
            let list = extend.value.as_list().expect("plain selector parsed lazily");
            assert_eq!(list.to_string(), "%placeholder");
        }
        stmt => panic!("expected @extend, got {:?}", stmt),
    }
);

error!(
    import_inside_function,
    "@function f() { @import \"x\"; }",
    "Error: Import directives may not be used within control directives or mixins."
);

error!(
    import_inside_control_flow,
    "@if true { @import \"x\"; }",
    "Error: Import directives may not be used within control directives or mixins."
);

parse!(
    unknown_at_rule_with_value_and_body,
    "@keyframes spin { from { transform: rotate(0deg); } }",
    |body| match only_stmt(body) {
        AstStmt::UnknownAtRule(rule) => {
            assert_eq!(rule.name.as_plain(), Some("keyframes"));
            assert_eq!(rule.value.as_ref().and_then(|v| v.as_plain()), Some("spin "));
            assert_eq!(rule.body.as_ref().map(Vec::len), Some(1));
        }
        stmt => panic!("expected unknown at-rule, got {:?}", stmt),
    }
);

parse!(
    charset_is_consumed,
    "@charset \"UTF-8\";\na { x: y; }",
    |body| {
        assert_eq!(body.len(), 1);
        assert!(matches!(body[0], AstStmt::RuleSet(..)));
    }
);

parse!(
    comments_are_statements,
    "// silent\n/* loud */\na { x: y; }",
    |body| {
        assert_eq!(body.len(), 3);
        match &body[0] {
            AstStmt::SilentComment(comment) => assert_eq!(comment.text, " silent"),
            stmt => panic!("expected silent comment, got {:?}", stmt),
        }
        match &body[1] {
            AstStmt::LoudComment(comment) => {
                assert_eq!(comment.text.as_plain(), Some("/* loud */"));
            }
            stmt => panic!("expected loud comment, got {:?}", stmt),
        }
    }
);

parse!(
    nested_property_block,
    "a { font: 10px { weight: bold; } }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Style(style) => {
            assert_eq!(style.name.as_plain(), Some("font"));
            assert!(style.value.is_some());
            assert_eq!(style.indentation, 0);
            match &style.body[0] {
                AstStmt::Style(inner) => {
                    assert_eq!(inner.name.as_plain(), Some("weight"));
                    assert_eq!(inner.indentation, 1);
                }
                stmt => panic!("expected nested declaration, got {:?}", stmt),
            }
        }
        stmt => panic!("expected declaration, got {:?}", stmt),
    }
);

error!(
    warn_inside_property_block,
    "a { font: { @warn \"x\"; } }",
    "Error: This at-rule is not allowed here."
);

error!(
    unmatched_closing_brace,
    "a { x: y; } }",
    "Error: unmatched \"}\"."
);

error!(
    missing_closing_brace,
    "a { color: red",
    "Error: expected \"}\"."
);

#[test]
fn deeply_nested_parens_error_instead_of_overflowing() {
    let input = format!("a {{ b: {}1{}; }}", "(".repeat(150), ")".repeat(150));
    match sass_syntax::parse_stylesheet(
        input,
        "input.scss",
        &sass_syntax::Options::default(),
    ) {
        Ok(..) => panic!("did not fail"),
        Err(e) => assert!(e.to_string().starts_with("Error: nested too deeply.")),
    }
}

#[test]
fn deeply_nested_blocks_error_instead_of_overflowing() {
    let mut input = String::new();
    for _ in 0..150 {
        input.push_str("a{");
    }
    input.push_str("x:y");
    for _ in 0..150 {
        input.push('}');
    }
    match sass_syntax::parse_stylesheet(
        input,
        "input.scss",
        &sass_syntax::Options::default(),
    ) {
        Ok(..) => panic!("did not fail"),
        Err(e) => assert!(e.to_string().starts_with("Error: nested too deeply.")),
    }
}

parse!(
    at_root_with_query,
    "@at-root (without: media) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::AtRootRule(rule) => {
            match &rule.query.as_ref().expect("query").node {
                sass_syntax::ast::AstAtRootQuery::Query(query) => {
                    assert!(!query.include);
                    assert!(query.names.contains("media"));
                    assert!(query.excludes_name("media"));
                }
                query => panic!("expected parsed query, got {:?}", query),
            }
            assert_eq!(rule.body.len(), 1);
        }
        stmt => panic!("expected @at-root, got {:?}", stmt),
    }
);

parse!(
    at_root_with_single_rule,
    "@at-root a { x: y; }",
    |body| match only_stmt(body) {
        AstStmt::AtRootRule(rule) => {
            assert!(rule.query.is_none());
            assert!(matches!(rule.body[0], AstStmt::RuleSet(..)));
        }
        stmt => panic!("expected @at-root, got {:?}", stmt),
    }
);

parse!(
    use_rule_with_namespace,
    "@use \"colors\" as c;",
    |body| match only_stmt(body) {
        AstStmt::Use(use_rule) => {
            assert_eq!(use_rule.namespace.as_deref(), Some("c"));
        }
        stmt => panic!("expected @use, got {:?}", stmt),
    }
);

parse!(
    use_rule_default_namespace,
    "@use \"sass:math\";",
    |body| match only_stmt(body) {
        AstStmt::Use(use_rule) => {
            assert_eq!(use_rule.namespace.as_deref(), Some("sass:math"));
        }
        stmt => panic!("expected @use, got {:?}", stmt),
    }
);

error!(
    use_after_other_rules,
    "a { x: y; }\n@use \"colors\";",
    "Error: @use rules must be written before any other rules."
);

parse!(
    forward_with_show_list,
    "@forward \"src/list\" show list-remove, $horizontal-list-gap;",
    |body| match only_stmt(body) {
        AstStmt::Forward(forward) => {
            assert!(forward
                .shown_mixins_and_functions
                .as_ref()
                .unwrap()
                .contains(&sass_syntax::Identifier::from("list-remove")));
            assert!(forward
                .shown_variables
                .as_ref()
                .unwrap()
                .contains(&sass_syntax::Identifier::from("horizontal-list-gap")));
        }
        stmt => panic!("expected @forward, got {:?}", stmt),
    }
);

parse!(
    use_with_configuration,
    "@use \"theme\" with ($primary: blue, $radius: 2px);",
    |body| match only_stmt(body) {
        AstStmt::Use(use_rule) => {
            assert_eq!(use_rule.configuration.len(), 2);
            assert_eq!(use_rule.configuration[0].name.node.as_str(), "primary");
        }
        stmt => panic!("expected @use, got {:?}", stmt),
    }
);

parse!(
    statements_appear_in_source_order,
    "$a: 1;\n$b: 2;\nx { y: z; }\n@media screen { a { b: c; } }",
    |body| {
        assert_eq!(body.len(), 4);
        assert!(matches!(body[0], AstStmt::VariableDecl(..)));
        assert!(matches!(body[1], AstStmt::VariableDecl(..)));
        assert!(matches!(body[2], AstStmt::RuleSet(..)));
        assert!(matches!(body[3], AstStmt::Media(..)));
    }
);
