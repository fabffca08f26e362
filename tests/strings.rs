use sass_syntax::ast::{AstExpr, AstStmt, InterpolationPart};
use sass_syntax::QuoteKind;

use macros::ruleset_body;

#[macro_use]
mod macros;

value!(interpolation_inside_quoted_string, "\"a #{$b} c\"", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.1, QuoteKind::Quoted);
            assert_eq!(s.0.contents.len(), 3);
            assert_eq!(s.0.initial_plain(), "a ");
            assert!(matches!(s.0.contents[1], InterpolationPart::Expr(..)));
            assert_eq!(s.0.trailing_string(), " c");
        }
        v => panic!("expected string, got {:?}", v),
    }
});

value!(interpolation_in_unquoted_value, "c#{$d}e", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.1, QuoteKind::None);
            assert_eq!(s.0.contents.len(), 3);
            assert_eq!(s.0.initial_plain(), "c");
            assert_eq!(s.0.trailing_string(), "e");
        }
        v => panic!("expected string schema, got {:?}", v),
    }
});

value!(interpolation_alone_in_value, "#{$a}", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.0.contents.len(), 1);
            assert!(matches!(s.0.contents[0], InterpolationPart::Expr(..)));
        }
        v => panic!("expected string schema, got {:?}", v),
    }
});

value!(hash_without_brace_is_literal, "a#b", |value| {
    match value {
        AstExpr::List(list) => {
            assert_eq!(list.elems.len(), 2);
            match (&list.elems[0].node, &list.elems[1].node) {
                (AstExpr::String(a, ..), AstExpr::String(b, ..)) => {
                    assert_eq!(a.0.as_plain(), Some("a"));
                    assert_eq!(b.0.as_plain(), Some("#b"));
                }
                v => panic!("expected two strings, got {:?}", v),
            }
        }
        v => panic!("expected space list, got {:?}", v),
    }
});

value!(escaped_hex_in_string, "\"\\61 bc\"", |value| {
    match value {
        AstExpr::String(s, ..) => assert_eq!(s.0.as_plain(), Some("abc")),
        v => panic!("expected string, got {:?}", v),
    }
});

parse!(
    interpolated_property_name,
    "a { co#{lo}r: red; }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Style(style) => {
            assert_eq!(style.name.contents.len(), 3);
            assert_eq!(style.name.initial_plain(), "co");
            assert!(matches!(style.name.contents[1], InterpolationPart::Expr(..)));
        }
        stmt => panic!("expected declaration, got {:?}", stmt),
    }
);

parse!(
    custom_property_with_braced_value,
    "a { --grid: { cols: 3 }; }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Style(style) => {
            assert!(style.is_custom_property());
            assert_eq!(style.name.as_plain(), Some("--grid"));
            match &style.value.as_ref().unwrap().node {
                AstExpr::String(s, ..) => {
                    assert_eq!(s.1, QuoteKind::None);
                    assert_eq!(s.0.as_plain().map(str::trim), Some("{ cols: 3 }"));
                }
                v => panic!("expected any-value string, got {:?}", v),
            }
        }
        stmt => panic!("expected declaration, got {:?}", stmt),
    }
);

parse!(
    custom_property_with_interpolation,
    "a { --theme: #{$base}; }",
    |body| match &ruleset_body(body)[0] {
        AstStmt::Style(style) => {
            assert!(style.is_custom_property());
            match &style.value.as_ref().unwrap().node {
                AstExpr::String(s, ..) => {
                    assert!(s
                        .0
                        .contents
                        .iter()
                        .any(|part| matches!(part, InterpolationPart::Expr(..))));
                }
                v => panic!("expected any-value string, got {:?}", v),
            }
        }
        stmt => panic!("expected declaration, got {:?}", stmt),
    }
);

error!(
    custom_property_without_value,
    "a { --grid:; }",
    "Error: Expected token."
);

error!(
    empty_interpolation,
    "a { b: #{}; }",
    "Error: Expected expression."
);

error!(
    unterminated_interpolation,
    "a { b: \"#{1\"; }",
    "Error: expected \"}\"."
);

error!(
    unterminated_string,
    "$a: \"foo;",
    "Error: Expected \"."
);

value!(url_with_interpolation, "url(#{$base}/img.png)", |value| {
    match value {
        AstExpr::String(s, ..) => {
            assert_eq!(s.1, QuoteKind::None);
            assert_eq!(s.0.initial_plain(), "url(");
            assert!(s
                .0
                .contents
                .iter()
                .any(|part| matches!(part, InterpolationPart::Expr(..))));
        }
        v => panic!("expected url string, got {:?}", v),
    }
});

parse!(
    loud_comment_with_interpolation,
    "/* version #{$v} */",
    |body| match &body[0] {
        AstStmt::LoudComment(comment) => {
            assert_eq!(comment.text.initial_plain(), "/* version ");
            assert!(comment
                .text
                .contents
                .iter()
                .any(|part| matches!(part, InterpolationPart::Expr(..))));
        }
        stmt => panic!("expected loud comment, got {:?}", stmt),
    }
);
