use sass_syntax::ast::{AstStmt, AstSupportsCondition, InterpolationPart};

use macros::only_stmt;

#[macro_use]
mod macros;

parse!(
    media_with_type_and_feature,
    "@media screen and (min-width: 600px) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Media(media) => {
            assert!(media.query.initial_plain().starts_with("screen"));
            assert!(media
                .query
                .contents
                .iter()
                .any(|part| matches!(part, InterpolationPart::Expr(..))));
            assert_eq!(media.body.len(), 1);
        }
        stmt => panic!("expected @media, got {:?}", stmt),
    }
);

parse!(
    media_with_bare_feature,
    "@media (orientation: landscape) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Media(media) => {
            assert_eq!(media.query.initial_plain(), "(");
            assert_eq!(media.body.len(), 1);
        }
        stmt => panic!("expected @media, got {:?}", stmt),
    }
);

parse!(
    media_with_range_syntax,
    "@media (600px <= width <= 900px) { a { x: y; } }",
    |body| assert!(matches!(only_stmt(body), AstStmt::Media(..)))
);

parse!(
    media_query_with_interpolation,
    "@media #{$query} { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Media(media) => {
            assert!(media
                .query
                .contents
                .iter()
                .any(|part| matches!(part, InterpolationPart::Expr(..))));
        }
        stmt => panic!("expected @media, got {:?}", stmt),
    }
);

parse!(
    media_query_list,
    "@media screen, print { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Media(media) => {
            assert_eq!(media.query.as_plain(), Some("screen, print"));
        }
        stmt => panic!("expected @media, got {:?}", stmt),
    }
);

error!(
    media_requires_a_query,
    "@media { a { x: y; } }",
    "Error: Expected identifier."
);

parse!(
    supports_declaration,
    "@supports (display: grid) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Supports(supports) => {
            assert!(matches!(
                supports.condition,
                AstSupportsCondition::Declaration { .. }
            ));
            assert_eq!(supports.body.len(), 1);
        }
        stmt => panic!("expected @supports, got {:?}", stmt),
    }
);

parse!(
    supports_negation_binds_tightest,
    "@supports (display: grid) and (not (display: inline-grid)) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Supports(supports) => match &supports.condition {
            AstSupportsCondition::Operation {
                left,
                operator,
                right,
            } => {
                assert_eq!(operator.as_deref(), Some("and"));
                assert!(matches!(**left, AstSupportsCondition::Declaration { .. }));
                assert!(matches!(**right, AstSupportsCondition::Negation(..)));
            }
            condition => panic!("expected operation, got {:?}", condition),
        },
        stmt => panic!("expected @supports, got {:?}", stmt),
    }
);

parse!(
    supports_chained_or,
    "@supports (a: b) or (c: d) or (e: f) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Supports(supports) => match &supports.condition {
            AstSupportsCondition::Operation { left, operator, .. } => {
                assert_eq!(operator.as_deref(), Some("or"));
                assert!(matches!(
                    **left,
                    AstSupportsCondition::Operation { .. }
                ));
            }
            condition => panic!("expected operation, got {:?}", condition),
        },
        stmt => panic!("expected @supports, got {:?}", stmt),
    }
);

error!(
    supports_cannot_mix_and_or_without_parens,
    "@supports (a: b) and (c: d) or (e: f) { a { x: y; } }",
    "Error: Expected \"and\"."
);

parse!(
    supports_function_syntax,
    "@supports selector(a > b) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Supports(supports) => match &supports.condition {
            AstSupportsCondition::Function { name, args } => {
                assert_eq!(name.as_plain(), Some("selector"));
                assert_eq!(args.as_plain(), Some("a > b"));
            }
            condition => panic!("expected function condition, got {:?}", condition),
        },
        stmt => panic!("expected @supports, got {:?}", stmt),
    }
);

parse!(
    supports_not_condition,
    "@supports not (display: grid) { a { x: y; } }",
    |body| match only_stmt(body) {
        AstStmt::Supports(supports) => {
            assert!(matches!(
                supports.condition,
                AstSupportsCondition::Negation(..)
            ));
        }
        stmt => panic!("expected @supports, got {:?}", stmt),
    }
);
