use sass_syntax::{ErrorKind, Options};

#[macro_use]
mod macros;

#[test]
fn utf16_bom_is_rejected_by_name() {
    let err = sass_syntax::parse_stylesheet_bytes(
        vec![0xFE, 0xFF, 0x00, 0x61],
        "input.scss",
        &Options::default(),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error: only UTF-8 documents are currently supported; your document appears to be UTF-16 (big endian)\n"
    );
}

#[test]
fn utf32_bom_is_distinguished_from_utf16() {
    let err = sass_syntax::parse_stylesheet_bytes(
        vec![0xFF, 0xFE, 0x00, 0x00, 0x61, 0x00, 0x00, 0x00],
        "input.scss",
        &Options::default(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("UTF-32 (little endian)"));
}

#[test]
fn utf8_bom_is_skipped() {
    let mut input = vec![0xEF, 0xBB, 0xBF];
    input.extend_from_slice(b"a { x: y; }");

    let stylesheet =
        sass_syntax::parse_stylesheet_bytes(input, "input.scss", &Options::default()).unwrap();
    assert_eq!(stylesheet.body.len(), 1);
}

#[test]
fn invalid_utf8_reports_byte_offset() {
    let err = sass_syntax::parse_stylesheet_bytes(
        vec![b'a', b' ', 0xC3, 0x28],
        "input.scss",
        &Options::default(),
    )
    .unwrap_err();

    match err.kind() {
        ErrorKind::FromUtf8Error { offset, .. } => assert_eq!(offset, 2),
        kind => panic!("expected utf8 error, got {:?}", kind),
    }
}

#[test]
fn parse_errors_carry_a_location() {
    let err = sass_syntax::parse_stylesheet(
        "$a: 1;\n$b 2;".to_owned(),
        "input.scss",
        &Options::default(),
    )
    .unwrap_err();

    match err.kind() {
        ErrorKind::ParseError { message, loc, .. } => {
            assert_eq!(message, "expected \":\".");
            assert_eq!(loc.begin.line, 1);
            assert_eq!(loc.begin.column, 3);
            assert_eq!(loc.file.name(), "input.scss");
        }
        kind => panic!("expected parse error, got {:?}", kind),
    }
}

#[test]
fn error_display_frames_the_source_line() {
    let err = sass_syntax::parse_stylesheet(
        "$a: (1;".to_owned(),
        "input.scss",
        &Options::default().unicode_error_messages(false),
    )
    .unwrap_err();

    let rendered = err.to_string();
    let mut lines = rendered.lines();

    assert_eq!(lines.next(), Some("Error: expected \")\"."));
    assert_eq!(lines.next(), Some("  ,"));
    assert_eq!(lines.next(), Some("1 | $a: (1;"));
}

#[test]
fn long_lines_are_elided_around_the_error() {
    let input = format!("$a: ({}{}", "x".repeat(80), ";");
    let err = sass_syntax::parse_stylesheet(
        input,
        "input.scss",
        &Options::default().unicode_error_messages(false),
    )
    .unwrap_err();

    let rendered = err.to_string();
    let source_line = rendered.lines().nth(2).expect("source line");
    assert!(source_line.contains("..."), "{}", rendered);
}

error!(
    expected_closing_paren,
    "$a: (1;",
    "Error: expected \")\"."
);

error!(
    invalid_variable_flag,
    "$a: 1 !foo;",
    "Error: Invalid flag name."
);

error!(
    positional_after_named_argument,
    "a { b: foo($x: 1, 2); }",
    "Error: Positional arguments must come before keyword arguments."
);

error!(
    duplicate_named_argument,
    "a { b: foo($x: 1, $x: 2); }",
    "Error: Duplicate argument."
);

error!(
    duplicate_mixin_parameter,
    "@mixin m($a, $a) { x: y; }",
    "Error: Duplicate argument."
);
