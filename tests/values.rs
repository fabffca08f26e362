use sass_syntax::ast::{AstExpr, AstStmt};
use sass_syntax::{BinaryOp, Brackets, ListSeparator, QuoteKind, UnaryOp, Unit};

use macros::only_stmt;

#[macro_use]
mod macros;

value!(delayed_division_in_font_shorthand, "16px/24px Serif", |value| {
    let list = match value {
        AstExpr::List(list) => list,
        v => panic!("expected space list, got {:?}", v),
    };
    assert_eq!(list.separator, ListSeparator::Space);
    assert_eq!(list.brackets, Brackets::None);
    assert_eq!(list.elems.len(), 2);

    match &list.elems[0].node {
        AstExpr::BinaryOp(op) => {
            assert_eq!(op.op, BinaryOp::Div);
            assert!(op.allows_slash);
            assert!(matches!(
                op.lhs,
                AstExpr::Number { unit: Unit::Px, .. }
            ));
            assert!(matches!(
                op.rhs,
                AstExpr::Number { unit: Unit::Px, .. }
            ));
        }
        v => panic!("expected division, got {:?}", v),
    }

    match &list.elems[1].node {
        AstExpr::String(s, ..) => {
            assert_eq!(s.0.as_plain(), Some("Serif"));
            assert_eq!(s.1, QuoteKind::None);
        }
        v => panic!("expected unquoted string, got {:?}", v),
    }
});

value!(parenthesized_division_is_not_delayed, "(16px/24px)", |value| {
    match value {
        AstExpr::Paren(inner) => match &**inner {
            AstExpr::BinaryOp(op) => {
                assert_eq!(op.op, BinaryOp::Div);
                assert!(!op.allows_slash);
            }
            v => panic!("expected division, got {:?}", v),
        },
        v => panic!("expected parenthesized expression, got {:?}", v),
    }
});

value!(leading_zero_is_preserved, "0.5px", |value| {
    match value {
        AstExpr::Number { n, unit } => {
            assert_eq!(n.value, 0.5);
            assert!(n.has_leading_zero);
            assert_eq!(*unit, Unit::Px);
        }
        v => panic!("expected number, got {:?}", v),
    }
});

value!(missing_leading_zero_is_preserved, ".5em", |value| {
    match value {
        AstExpr::Number { n, unit } => {
            assert_eq!(n.value, 0.5);
            assert!(!n.has_leading_zero);
            assert_eq!(*unit, Unit::Em);
        }
        v => panic!("expected number, got {:?}", v),
    }
});

value!(scientific_notation, "1.5e2", |value| {
    match value {
        AstExpr::Number { n, unit } => {
            assert_eq!(n.value, 150.0);
            assert_eq!(*unit, Unit::None);
        }
        v => panic!("expected number, got {:?}", v),
    }
});

value!(percentage, "50%", |value| {
    assert!(matches!(
        value,
        AstExpr::Number {
            unit: Unit::Percent,
            ..
        }
    ));
});

value!(negative_number, "-3px", |value| {
    match value {
        AstExpr::Number { n, .. } => assert_eq!(n.value, -3.0),
        v => panic!("expected number, got {:?}", v),
    }
});

value!(unknown_unit_is_kept, "3foo", |value| {
    match value {
        AstExpr::Number { unit, .. } => assert_eq!(unit.to_string(), "foo"),
        v => panic!("expected number, got {:?}", v),
    }
});

parse!(
    map_literal_with_trailing_comma,
    "$m: (a: 1, b: 2,);",
    |body| match only_stmt(body) {
        AstStmt::VariableDecl(decl) => match &decl.value {
            AstExpr::Map(map) => {
                assert_eq!(map.0.len(), 2);
                match &map.0[0].0.node {
                    AstExpr::String(s, ..) => assert_eq!(s.0.as_plain(), Some("a")),
                    v => panic!("expected string key, got {:?}", v),
                }
                assert!(matches!(map.0[0].1, AstExpr::Number { .. }));
                match &map.0[1].0.node {
                    AstExpr::String(s, ..) => assert_eq!(s.0.as_plain(), Some("b")),
                    v => panic!("expected string key, got {:?}", v),
                }
            }
            v => panic!("expected map, got {:?}", v),
        },
        stmt => panic!("expected variable declaration, got {:?}", stmt),
    }
);

value!(empty_parens_are_an_empty_list, "()", |value| {
    match value {
        AstExpr::List(list) => {
            assert!(list.elems.is_empty());
            assert_eq!(list.separator, ListSeparator::Undecided);
        }
        v => panic!("expected list, got {:?}", v),
    }
});

value!(bracketed_list_with_commas, "[1, 2]", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.brackets, Brackets::Bracketed);
            assert_eq!(list.separator, ListSeparator::Comma);
            assert_eq!(list.elems.len(), 2);
        }
        v => panic!("expected list, got {:?}", v),
    }
});

value!(bracketed_singleton_stays_a_list, "[1]", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.brackets, Brackets::Bracketed);
            assert_eq!(list.elems.len(), 1);
        }
        v => panic!("expected list, got {:?}", v),
    }
});

value!(empty_bracketed_list, "[]", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.brackets, Brackets::Bracketed);
            assert!(list.elems.is_empty());
        }
        v => panic!("expected list, got {:?}", v),
    }
});

value!(comma_list_of_space_lists, "1 2, 3 4", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.separator, ListSeparator::Comma);
            assert_eq!(list.elems.len(), 2);
            match &list.elems[0].node {
                AstExpr::List(inner) => {
                    assert_eq!(inner.separator, ListSeparator::Space);
                    assert_eq!(inner.elems.len(), 2);
                }
                v => panic!("expected space list, got {:?}", v),
            }
        }
        v => panic!("expected comma list, got {:?}", v),
    }
});

value!(single_element_is_unwrapped, "1", |value| {
    assert!(matches!(value, AstExpr::Number { .. }));
});

value!(boolean_and_or_precedence, "true and false or true", |value| {
    match value {
        AstExpr::BinaryOp(op) => {
            assert_eq!(op.op, BinaryOp::Or);
            match &op.lhs {
                AstExpr::BinaryOp(inner) => assert_eq!(inner.op, BinaryOp::And),
                v => panic!("expected conjunction, got {:?}", v),
            }
            assert!(matches!(op.rhs, AstExpr::True));
        }
        v => panic!("expected disjunction, got {:?}", v),
    }
});

value!(comparison_binds_tighter_than_and, "1 < 2 and 3 >= 2", |value| {
    match value {
        AstExpr::BinaryOp(op) => {
            assert_eq!(op.op, BinaryOp::And);
            match &op.lhs {
                AstExpr::BinaryOp(inner) => assert_eq!(inner.op, BinaryOp::LessThan),
                v => panic!("expected comparison, got {:?}", v),
            }
            match &op.rhs {
                AstExpr::BinaryOp(inner) => {
                    assert_eq!(inner.op, BinaryOp::GreaterThanEqual);
                }
                v => panic!("expected comparison, got {:?}", v),
            }
        }
        v => panic!("expected conjunction, got {:?}", v),
    }
});

value!(multiplication_binds_tighter_than_addition, "1 + 2 * 3", |value| {
    match value {
        AstExpr::BinaryOp(op) => {
            assert_eq!(op.op, BinaryOp::Plus);
            match &op.rhs {
                AstExpr::BinaryOp(inner) => assert_eq!(inner.op, BinaryOp::Mul),
                v => panic!("expected multiplication, got {:?}", v),
            }
        }
        v => panic!("expected addition, got {:?}", v),
    }
});

value!(not_is_a_unary_operator, "not true", |value| {
    match value {
        AstExpr::UnaryOp(op, operand, ..) => {
            assert_eq!(*op, UnaryOp::Not);
            assert!(matches!(**operand, AstExpr::True));
        }
        v => panic!("expected unary operation, got {:?}", v),
    }
});

value!(null_literal, "null", |value| {
    assert!(matches!(value, AstExpr::Null));
});

value!(three_digit_hex_color, "#abc", |value| {
    match value {
        AstExpr::Color(color) => {
            assert_eq!(color.red, 0xAA);
            assert_eq!(color.green, 0xBB);
            assert_eq!(color.blue, 0xCC);
            assert_eq!(color.alpha, 1.0);
            assert_eq!(color.text, "#abc");
        }
        v => panic!("expected color, got {:?}", v),
    }
});

value!(eight_digit_hex_color_has_alpha, "#ff000080", |value| {
    match value {
        AstExpr::Color(color) => {
            assert_eq!(color.red, 0xFF);
            assert!((color.alpha - 0x80 as f64 / 0xFF as f64).abs() < 1e-9);
        }
        v => panic!("expected color, got {:?}", v),
    }
});

value!(named_color_keeps_original_text, "CornflowerBlue", |value| {
    match value {
        AstExpr::Color(color) => {
            assert_eq!(color.red, 0x64);
            assert_eq!(color.green, 0x95);
            assert_eq!(color.blue, 0xED);
            assert_eq!(color.text, "CornflowerBlue");
        }
        v => panic!("expected color, got {:?}", v),
    }
});

value!(important_keyword, "c !important", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.elems.len(), 2);
            match &list.elems[1].node {
                AstExpr::String(s, ..) => assert_eq!(s.0.as_plain(), Some("!important")),
                v => panic!("expected !important, got {:?}", v),
            }
        }
        v => panic!("expected space list, got {:?}", v),
    }
});

value!(calc_is_captured_verbatim, "calc(100% - 10px)", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.1, QuoteKind::None);
            assert_eq!(s.0.as_plain(), Some("calc(100% - 10px)"));
        }
        v => panic!("expected special function string, got {:?}", v),
    }
});

value!(raw_url_is_captured_verbatim, "url(image.png)", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.0.as_plain(), Some("url(image.png)"));
        }
        v => panic!("expected url string, got {:?}", v),
    }
});

value!(url_with_spaces_falls_back_to_function_call, "url(foo bar)", |value| {
    match value {
        AstExpr::FunctionCall(call) => {
            assert_eq!(call.name.as_str(), "url");
        }
        v => panic!("expected function call, got {:?}", v),
    }
});

value!(unicode_range, "U+0-7F", |value| {
    match value {
        AstExpr::String(s, ..) => assert_eq!(s.0.as_plain(), Some("U+0-7F")),
        v => panic!("expected unquoted string, got {:?}", v),
    }
});

value!(function_call_with_named_and_rest_args, "join($a, $b: 2, $c...)", |value| {
    match value {
        AstExpr::FunctionCall(call) => {
            assert_eq!(call.name.as_str(), "join");
            assert_eq!(call.arguments.positional.len(), 1);
            assert_eq!(call.arguments.named.len(), 1);
            assert!(call.arguments.rest.is_some());
        }
        v => panic!("expected function call, got {:?}", v),
    }
});

value!(namespaced_variable, "math.$pi", |value| {
    match value {
        AstExpr::Variable { name, namespace } => {
            assert_eq!(name.node.as_str(), "pi");
            assert_eq!(namespace.as_ref().unwrap().node.as_str(), "math");
        }
        v => panic!("expected namespaced variable, got {:?}", v),
    }
});

value!(namespaced_function_call, "math.floor(1.5)", |value| {
    match value {
        AstExpr::FunctionCall(call) => {
            assert_eq!(call.name.as_str(), "floor");
            assert_eq!(call.namespace.as_ref().unwrap().node.as_str(), "math");
        }
        v => panic!("expected namespaced call, got {:?}", v),
    }
});

value!(variable_names_normalize_underscores, "$foo_bar", |value| {
    match value {
        AstExpr::Variable { name, .. } => assert_eq!(name.node.as_str(), "foo-bar"),
        v => panic!("expected variable, got {:?}", v),
    }
});

value!(quoted_string, "\"foo bar\"", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.1, QuoteKind::Quoted);
            assert_eq!(s.0.as_plain(), Some("foo bar"));
        }
        v => panic!("expected quoted string, got {:?}", v),
    }
});

error!(
    content_exists_outside_mixin,
    "a { b: content-exists(); }",
    "Error: Cannot call content-exists() except within a mixin."
);

parse!(
    content_exists_inside_mixin,
    "@mixin m { a: content-exists(); }",
    |body| assert!(matches!(body[0], AstStmt::Mixin(..)))
);

error!(
    empty_value_is_an_error,
    "a { b: ; }",
    "Error: Expected expression."
);
