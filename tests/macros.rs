use sass_syntax::ast::{AstExpr, AstStmt};

/// Parse the input and run assertions against the resulting statement list.
#[macro_export]
macro_rules! parse {
    ($func:ident, $input:expr, $check:expr) => {
        #[test]
        #[allow(non_snake_case)]
        fn $func() {
            let stylesheet = sass_syntax::parse_stylesheet(
                $input.to_string(),
                "input.scss",
                &sass_syntax::Options::default(),
            )
            .expect(concat!("failed to parse ", $input));
            let check: &dyn Fn(&[sass_syntax::ast::AstStmt]) = &$check;
            check(&stylesheet.body);
        }
    };
}

/// Verify the error *message*, i.e. the first line of the rendered error.
#[macro_export]
macro_rules! error {
    ($func:ident, $input:expr, $err:expr) => {
        #[test]
        #[allow(non_snake_case)]
        fn $func() {
            match sass_syntax::parse_stylesheet(
                $input.to_string(),
                "input.scss",
                &sass_syntax::Options::default(),
            ) {
                Ok(..) => panic!("did not fail"),
                Err(e) => assert_eq!(
                    $err,
                    e.to_string()
                        .chars()
                        .take_while(|c| *c != '\n')
                        .collect::<String>()
                        .as_str()
                ),
            }
        }
    };
}

/// The lone statement of a parsed body.
#[allow(unused)]
pub fn only_stmt(body: &[AstStmt]) -> &AstStmt {
    assert_eq!(body.len(), 1, "expected exactly one statement");
    &body[0]
}

/// The body of the lone style rule in `body`.
#[allow(unused)]
pub fn ruleset_body(body: &[AstStmt]) -> &[AstStmt] {
    match only_stmt(body) {
        AstStmt::RuleSet(ruleset) => &ruleset.body,
        stmt => panic!("expected style rule, got {:?}", stmt),
    }
}

/// The value of the lone declaration in `body`.
#[allow(unused)]
pub fn only_style_value(body: &[AstStmt]) -> &AstExpr {
    match only_stmt(body) {
        AstStmt::Style(style) => &style.value.as_ref().expect("declaration has no value").node,
        stmt => panic!("expected declaration, got {:?}", stmt),
    }
}

/// Parses `a { b: <value>; }` and returns assertions the lone value.
#[macro_export]
macro_rules! value {
    ($func:ident, $value:expr, $check:expr) => {
        #[test]
        #[allow(non_snake_case)]
        fn $func() {
            let input = format!("a {{ b: {}; }}", $value);
            let stylesheet = sass_syntax::parse_stylesheet(
                input.clone(),
                "input.scss",
                &sass_syntax::Options::default(),
            )
            .unwrap_or_else(|e| panic!("failed to parse {}: {}", input, e));
            let body = crate::macros::ruleset_body(&stylesheet.body);
            let check: &dyn Fn(&sass_syntax::ast::AstExpr) = &$check;
            check(crate::macros::only_style_value(body));
        }
    };
}
