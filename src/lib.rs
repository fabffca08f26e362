/*!
This crate parses the [SCSS](https://sass-lang.com/documentation/syntax)
dialect of CSS into a spanned abstract syntax tree.

Parsing stops at the AST: variables are not resolved, mixins are not
expanded, arithmetic is not evaluated, and no CSS is emitted. The tree is
intended as input to an evaluation pass, and every node carries a
[`codemap::Span`] precise enough for diagnostics and source maps.

## Use as library
```
fn main() -> Result<(), Box<sass_syntax::Error>> {
    let stylesheet = sass_syntax::parse_stylesheet(
        "a { color: $c; }".to_owned(),
        "input.scss",
        &sass_syntax::Options::default(),
    )?;
    assert_eq!(stylesheet.body.len(), 1);
    Ok(())
}
```

`@import` rules with plain string paths can be intercepted through the
[`Importer`] trait; every other form of IO is out of scope.
*/

#![warn(clippy::all, clippy::cargo, clippy::dbg_macro)]
#![deny(missing_debug_implementations)]
#![allow(
    clippy::use_self,
    clippy::missing_docs_in_private_items,
    clippy::unreachable,
    clippy::module_name_repetitions,
    clippy::new_ret_no_self,
    clippy::single_match,
    clippy::option_if_let_else,
    clippy::branches_sharing_code,
    clippy::derive_partial_eq_without_eq,
    clippy::too_many_lines,
    clippy::cast_possible_truncation,
    clippy::single_match_else,
    clippy::redundant_pub_crate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::wrong_self_convention,
    clippy::items_after_statements,
    clippy::uninlined_format_args,
    clippy::float_cmp,
    clippy::wildcard_imports
)]

use std::path::Path;

use codemap::CodeMap;

pub use crate::error::{
    PublicSassErrorKind as ErrorKind, SassError as Error, SassResult as Result,
};
pub use crate::importer::{Importer, NullImporter, ResolvedImport, Resolution};
pub use crate::logger::{Logger, NullLogger, StdLogger};
pub use crate::options::Options;
pub use crate::selector::{
    Attribute, AttributeOp, Combinator, ComplexSelector, ComplexSelectorComponent,
    CompoundSelector, Namespace, Pseudo, QualifiedName, SelectorList, SimpleSelector,
};
pub use crate::{
    color::Color,
    common::{BinaryOp, Brackets, Identifier, ListSeparator, QuoteKind, UnaryOp},
    unit::Unit,
};

pub use codemap;

pub mod ast;
mod color;
mod common;
mod context_flags;
mod encoding;
mod error;
mod importer;
mod interner;
mod lexer;
mod logger;
mod options;
mod parse;
mod selector;
mod unit;
mod utils;

use lexer::Lexer;
use parse::StylesheetParser;
use selector::SelectorParser;

fn raw_to_parse_error(map: &CodeMap, err: Error, unicode: bool) -> Box<Error> {
    let (message, span, trace) = err.raw();
    let trace = trace
        .into_iter()
        .map(|frame| map.look_up_span(frame))
        .collect();
    Box::new(Error::from_loc(
        message,
        map.look_up_span(span),
        unicode,
        trace,
    ))
}

/// Parse a stylesheet from a string
///
/// The returned [`ast::StyleSheet`] owns its statements; statements appear
/// in source order.
///
/// ```
/// fn main() -> Result<(), Box<sass_syntax::Error>> {
///     let stylesheet = sass_syntax::parse_stylesheet(
///         "$c: red;".to_owned(),
///         "input.scss",
///         &sass_syntax::Options::default(),
///     )?;
///     Ok(())
/// }
/// ```
pub fn parse_stylesheet<P: AsRef<Path>>(
    input: String,
    file_name: P,
    options: &Options,
) -> Result<ast::StyleSheet> {
    let mut map = CodeMap::new();
    let path = file_name.as_ref();
    let file = map.add_file(path.to_string_lossy().into_owned(), input);
    let empty_span = file.span.subspan(0, 0);
    let lexer = Lexer::new_from_file(&file);

    let stylesheet =
        StylesheetParser::new(lexer, &mut map, options, empty_span, file_name.as_ref()).parse();

    match stylesheet {
        Ok(v) => Ok(v),
        Err(e) => Err(raw_to_parse_error(&map, *e, options.unicode_error_messages)),
    }
}

/// Parse a stylesheet from a raw buffer
///
/// Like [`parse_stylesheet`], but first validates the buffer's encoding: a
/// UTF-8 byte-order mark is accepted (and skipped), the byte-order mark of
/// any other encoding is rejected by name, and invalid UTF-8 anywhere in
/// the buffer is reported with its byte offset.
pub fn parse_stylesheet_bytes<P: AsRef<Path>>(
    input: Vec<u8>,
    file_name: P,
    options: &Options,
) -> Result<ast::StyleSheet> {
    parse_stylesheet(encoding::decode_source(input)?, file_name, options)
}

/// Parse a selector list on its own, as accepted by the selector functions
/// of the standard library
///
/// The parent selector `&` is rejected, as there is no enclosing rule for
/// it to refer to. Placeholder selectors are allowed.
///
/// ```
/// fn main() -> Result<(), Box<sass_syntax::Error>> {
///     let list = sass_syntax::parse_selector("a > b, .c".to_owned(), "input.scss")?;
///     assert_eq!(list.components.len(), 2);
///     Ok(())
/// }
/// ```
pub fn parse_selector<P: AsRef<Path>>(input: String, file_name: P) -> Result<SelectorList> {
    let mut map = CodeMap::new();
    let path = file_name.as_ref();
    let file = map.add_file(path.to_string_lossy().into_owned(), input);
    let lexer = Lexer::new_from_file(&file);

    let selector = SelectorParser::new(lexer, false, true, file.span).parse();

    match selector {
        Ok(v) => Ok(v),
        Err(e) => Err(raw_to_parse_error(&map, *e, true)),
    }
}
