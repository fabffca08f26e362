use sass_syntax::ast::{AstSelector, AstStmt, InterpolationPart};
use sass_syntax::{
    AttributeOp, Combinator, ComplexSelectorComponent, Namespace, SimpleSelector,
};

use macros::only_stmt;

#[macro_use]
mod macros;

fn selector_of(body: &[AstStmt]) -> &AstSelector {
    match only_stmt(body) {
        AstStmt::RuleSet(ruleset) => &ruleset.selector,
        stmt => panic!("expected style rule, got {:?}", stmt),
    }
}

fn list_of(body: &[AstStmt]) -> &sass_syntax::SelectorList {
    selector_of(body)
        .as_list()
        .expect("plain selector should parse eagerly")
}

parse!(compound_selector_taxonomy, "a.b#c:hover::before { x: y; }", |body| {
    let list = list_of(body);
    assert_eq!(list.components.len(), 1);

    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    assert_eq!(compound.components.len(), 5);
    assert!(matches!(
        &compound.components[0],
        SimpleSelector::Type(name) if name.ident == "a" && name.namespace == Namespace::None
    ));
    assert!(matches!(&compound.components[1], SimpleSelector::Class(c) if c == "b"));
    assert!(matches!(&compound.components[2], SimpleSelector::Id(i) if i == "c"));

    match &compound.components[3] {
        SimpleSelector::Pseudo(pseudo) => {
            assert_eq!(pseudo.name, "hover");
            assert!(pseudo.is_class);
            assert!(pseudo.is_syntactic_class);
        }
        s => panic!("expected pseudo-class, got {:?}", s),
    }

    match &compound.components[4] {
        SimpleSelector::Pseudo(pseudo) => {
            assert_eq!(pseudo.name, "before");
            assert!(!pseudo.is_class);
            assert!(!pseudo.is_syntactic_class);
        }
        s => panic!("expected pseudo-element, got {:?}", s),
    }
});

parse!(combinators, "a > b + c ~ d { x: y; }", |body| {
    let list = list_of(body);
    let components = &list.components[0].components;

    let combinators: Vec<_> = components
        .iter()
        .filter_map(|c| match c {
            ComplexSelectorComponent::Combinator(combinator) => Some(*combinator),
            ComplexSelectorComponent::Compound(..) => None,
        })
        .collect();

    assert_eq!(
        combinators,
        vec![
            Combinator::Child,
            Combinator::NextSibling,
            Combinator::FollowingSibling
        ]
    );
});

parse!(selector_list_is_comma_separated, "a, b, c { x: y; }", |body| {
    assert_eq!(list_of(body).components.len(), 3);
});

parse!(attribute_selector_with_modifier, "[href^=\"http\" i] { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    match &compound.components[0] {
        SimpleSelector::Attribute(attr) => {
            assert_eq!(attr.attr.ident, "href");
            assert_eq!(attr.op, AttributeOp::Prefix);
            assert_eq!(attr.value, "http");
            assert_eq!(attr.modifier, Some('i'));
        }
        s => panic!("expected attribute selector, got {:?}", s),
    }
});

parse!(bare_attribute_selector, "[disabled] { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    match &compound.components[0] {
        SimpleSelector::Attribute(attr) => {
            assert_eq!(attr.op, AttributeOp::Any);
            assert_eq!(attr.value, "");
        }
        s => panic!("expected attribute selector, got {:?}", s),
    }
});

parse!(not_takes_a_selector_list, ":not(a, .b) { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    match &compound.components[0] {
        SimpleSelector::Pseudo(pseudo) => {
            assert_eq!(pseudo.name, "not");
            assert!(pseudo.argument.is_none());
            assert_eq!(pseudo.selector.as_ref().unwrap().components.len(), 2);
        }
        s => panic!("expected :not, got {:?}", s),
    }
});

parse!(
    nth_child_with_of_clause,
    ":nth-child(2n+1 of a.b) { x: y; }",
    |body| {
        let list = list_of(body);
        let compound = match &list.components[0].components[0] {
            ComplexSelectorComponent::Compound(compound) => compound,
            c => panic!("expected compound selector, got {:?}", c),
        };

        match &compound.components[0] {
            SimpleSelector::Pseudo(pseudo) => {
                assert_eq!(pseudo.name, "nth-child");
                assert_eq!(pseudo.argument.as_deref(), Some("2n+1 of"));
                assert!(pseudo.selector.is_some());
            }
            s => panic!("expected :nth-child, got {:?}", s),
        }
    }
);

parse!(nth_child_even, ":nth-child(even) { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    match &compound.components[0] {
        SimpleSelector::Pseudo(pseudo) => {
            assert_eq!(pseudo.argument.as_deref(), Some("even"));
            assert!(pseudo.selector.is_none());
        }
        s => panic!("expected :nth-child, got {:?}", s),
    }
});

parse!(placeholder_selector, "%strong { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    assert!(matches!(
        &compound.components[0],
        SimpleSelector::Placeholder(name) if name == "strong"
    ));
});

parse!(parent_selector_in_nested_rule, "a { &:hover { x: y; } }", |body| {
    match only_stmt(body) {
        AstStmt::RuleSet(outer) => match &outer.body[0] {
            AstStmt::RuleSet(inner) => {
                let list = inner.selector.as_list().unwrap();
                let compound = match &list.components[0].components[0] {
                    ComplexSelectorComponent::Compound(compound) => compound,
                    c => panic!("expected compound selector, got {:?}", c),
                };
                assert!(matches!(&compound.components[0], SimpleSelector::Parent(None)));
                assert!(matches!(&compound.components[1], SimpleSelector::Pseudo(..)));
            }
            stmt => panic!("expected nested rule, got {:?}", stmt),
        },
        stmt => panic!("expected style rule, got {:?}", stmt),
    }
});

parse!(parent_selector_with_suffix, "a { &-fallback { x: y; } }", |body| {
    match only_stmt(body) {
        AstStmt::RuleSet(outer) => match &outer.body[0] {
            AstStmt::RuleSet(inner) => {
                let list = inner.selector.as_list().unwrap();
                let compound = match &list.components[0].components[0] {
                    ComplexSelectorComponent::Compound(compound) => compound,
                    c => panic!("expected compound selector, got {:?}", c),
                };
                assert!(matches!(
                    &compound.components[0],
                    SimpleSelector::Parent(Some(suffix)) if suffix == "-fallback"
                ));
            }
            stmt => panic!("expected nested rule, got {:?}", stmt),
        },
        stmt => panic!("expected style rule, got {:?}", stmt),
    }
});

parse!(universal_selector_with_namespace, "*|* { x: y; }", |body| {
    let list = list_of(body);
    let compound = match &list.components[0].components[0] {
        ComplexSelectorComponent::Compound(compound) => compound,
        c => panic!("expected compound selector, got {:?}", c),
    };

    assert!(matches!(
        &compound.components[0],
        SimpleSelector::Universal(Namespace::Asterisk)
    ));
});

parse!(
    interpolated_selector_becomes_a_schema,
    ".a#{$n} > b { x: 1; }",
    |body| {
        match selector_of(body) {
            AstSelector::Schema(schema) => {
                assert_eq!(schema.initial_plain(), ".a");
                assert!(schema
                    .contents
                    .iter()
                    .any(|part| matches!(part, InterpolationPart::Expr(..))));
                assert_eq!(schema.trailing_string(), " > b ");
            }
            AstSelector::List(list) => panic!("expected schema, got {}", list),
        }
    }
);

#[test]
fn parse_selector_api_parses_a_list() {
    let list = sass_syntax::parse_selector("a > b, .c".to_owned(), "input.scss").unwrap();
    assert_eq!(list.components.len(), 2);
    assert_eq!(list.to_string(), "a > b, .c");
}

#[test]
fn parse_selector_api_rejects_parent() {
    let err = sass_syntax::parse_selector("&".to_owned(), "input.scss").unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Error: Parent selectors aren't allowed here."));
}

#[test]
fn parse_selector_api_rejects_trailing_garbage() {
    assert!(sass_syntax::parse_selector("a {".to_owned(), "input.scss").is_err());
}
