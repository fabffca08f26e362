use std::fmt::Debug;
use std::path::{Path, PathBuf};

use codemap::SpanLoc;

/// A single file located by an [`Importer`].
///
/// One `@import` URL may resolve to more than one file (e.g. an index file
/// plus its partials); each resolved file becomes its own stub node in the
/// AST, in the order the importer returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    /// The URL as written in the stylesheet.
    pub url: String,
    /// The canonical path of the resolved file.
    pub path: PathBuf,
}

/// The result of asking an [`Importer`] about an `@import` URL.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The importer claimed the URL and resolved it to zero or more files.
    Handled(Vec<ResolvedImport>),
    /// The importer declined; the import stays dynamic and is resolved by
    /// the default file lookup during evaluation.
    NotHandled,
}

/// A trait to allow intercepting `@import`s with plain string paths.
///
/// The parser performs no IO itself. URLs that are syntactically plain-CSS
/// imports (`.css`, `http(s)://`, `//…`, `url(...)`, or any import carrying
/// media or `supports(...)` modifiers) never reach the importer.
pub trait Importer: Debug {
    /// Called once per plain-string `@import` entry, in source order.
    fn resolve(&self, url: &str, importing_path: &Path, location: SpanLoc) -> Resolution;
}

/// An importer that declines every URL.
///
/// This is the default: all dynamic imports are left for the evaluator's
/// file resolution.
#[derive(Debug)]
pub struct NullImporter;

impl Importer for NullImporter {
    #[inline]
    fn resolve(&self, _url: &str, _importing_path: &Path, _location: SpanLoc) -> Resolution {
        Resolution::NotHandled
    }
}
