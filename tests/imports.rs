use std::path::{Path, PathBuf};

use sass_syntax::ast::{AstImport, AstStmt};
use sass_syntax::{Importer, Options, Resolution, ResolvedImport};

use macros::only_stmt;

#[macro_use]
mod macros;

/// Claims urls beginning with `pkg/`, resolving each to two files.
#[derive(Debug)]
struct PkgImporter;

impl Importer for PkgImporter {
    fn resolve(
        &self,
        url: &str,
        _importing_path: &Path,
        _location: sass_syntax::codemap::SpanLoc,
    ) -> Resolution {
        match url.strip_prefix("pkg/") {
            Some(name) => Resolution::Handled(vec![
                ResolvedImport {
                    url: url.to_owned(),
                    path: PathBuf::from(format!("node_modules/{}/_index.scss", name)),
                },
                ResolvedImport {
                    url: url.to_owned(),
                    path: PathBuf::from(format!("node_modules/{}/_extra.scss", name)),
                },
            ]),
            None => Resolution::NotHandled,
        }
    }
}

fn parse_with_importer(input: &str) -> Vec<AstStmt> {
    let options = Options::default().importer(&PkgImporter);
    sass_syntax::parse_stylesheet(input.to_owned(), "input.scss", &options)
        .expect("failed to parse")
        .body
}

#[test]
fn importer_produces_stub_nodes_in_order() {
    let body = parse_with_importer("@import \"pkg/theme\", \"local\";");

    match &body[0] {
        AstStmt::ImportRule(rule) => {
            assert_eq!(rule.imports.len(), 3);

            match &rule.imports[0] {
                AstImport::Resolved(stub) => {
                    assert_eq!(stub.resolved.url, "pkg/theme");
                    assert_eq!(
                        stub.resolved.path,
                        PathBuf::from("node_modules/theme/_index.scss")
                    );
                }
                import => panic!("expected resolved stub, got {:?}", import),
            }

            match &rule.imports[1] {
                AstImport::Resolved(stub) => {
                    assert_eq!(
                        stub.resolved.path,
                        PathBuf::from("node_modules/theme/_extra.scss")
                    );
                }
                import => panic!("expected resolved stub, got {:?}", import),
            }

            match &rule.imports[2] {
                AstImport::Sass(import) => assert_eq!(import.url, "local"),
                import => panic!("expected dynamic import, got {:?}", import),
            }
        }
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
}

#[test]
fn css_extension_bypasses_the_importer() {
    let body = parse_with_importer("@import \"pkg/theme.css\";");

    match &body[0] {
        AstStmt::ImportRule(rule) => {
            assert!(matches!(rule.imports[0], AstImport::Plain(..)));
        }
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
}

parse!(
    url_import_is_plain_css,
    "@import url(theme.css);",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => {
            assert!(matches!(rule.imports[0], AstImport::Plain(..)));
        }
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

parse!(
    http_import_is_plain_css,
    "@import \"http://example.com/a\";",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => {
            assert!(matches!(rule.imports[0], AstImport::Plain(..)));
        }
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

parse!(
    media_modifiers_force_a_plain_import,
    "@import \"theme\" screen;",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => match &rule.imports[0] {
            AstImport::Plain(plain) => {
                assert_eq!(
                    plain.modifiers.as_ref().and_then(|m| m.as_plain()),
                    Some("screen")
                );
            }
            import => panic!("expected plain import, got {:?}", import),
        },
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

parse!(
    supports_modifier_forces_a_plain_import,
    "@import \"theme\" supports(display: grid);",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => match &rule.imports[0] {
            AstImport::Plain(plain) => assert!(plain.modifiers.is_some()),
            import => panic!("expected plain import, got {:?}", import),
        },
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

parse!(
    bare_string_import_is_dynamic,
    "@import \"theme\";",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => match &rule.imports[0] {
            AstImport::Sass(import) => assert_eq!(import.url, "theme"),
            import => panic!("expected dynamic import, got {:?}", import),
        },
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

parse!(
    url_with_interpolation_stays_a_plain_import,
    "@import url(\"#{$base}/theme.css\");",
    |body| match only_stmt(body) {
        AstStmt::ImportRule(rule) => {
            assert!(matches!(rule.imports[0], AstImport::Plain(..)));
        }
        stmt => panic!("expected import rule, got {:?}", stmt),
    }
);

error!(
    import_missing_path,
    "@import ;",
    "Error: Expected string."
);

error!(
    dynamic_import_in_mixin,
    "@mixin m { @import \"x\"; }",
    "Error: Import directives may not be used within control directives or mixins."
);
