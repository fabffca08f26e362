use crate::{Importer, Logger, NullImporter, StdLogger};

/// Configuration for parsing
///
/// The simplest usage is `sass_syntax::Options::default()`; however, a
/// builder pattern is also exposed to offer more control.
#[derive(Debug)]
pub struct Options<'a> {
    pub(crate) importer: &'a dyn Importer,
    pub(crate) logger: &'a dyn Logger,
    pub(crate) quiet: bool,
    pub(crate) unicode_error_messages: bool,
}

impl Default for Options<'_> {
    #[inline]
    fn default() -> Self {
        Self {
            importer: &NullImporter,
            logger: &StdLogger,
            quiet: false,
            unicode_error_messages: true,
        }
    }
}

impl<'a> Options<'a> {
    /// This option allows you to intercept `@import` rules with plain string
    /// paths.
    ///
    /// By default, [`NullImporter`] is used and every dynamic import is left
    /// in the AST for later resolution.
    #[must_use]
    #[inline]
    pub fn importer(mut self, importer: &'a dyn Importer) -> Self {
        self.importer = importer;
        self
    }

    /// This option allows you to define how warnings should be handled
    ///
    /// By default, [`StdLogger`] is used, which writes all events to
    /// standard error.
    #[must_use]
    #[inline]
    pub fn logger(mut self, logger: &'a dyn Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Setting this option to `true` stops all warnings from reaching the
    /// [`Logger`], including deprecation warnings.
    ///
    /// By default, this value is `false`.
    #[must_use]
    #[inline]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// This flag tells the parser only to emit ASCII characters as part of
    /// error messages.
    ///
    /// By default non-ASCII characters are used for the error frame.
    #[must_use]
    #[inline]
    pub const fn unicode_error_messages(mut self, unicode_error_messages: bool) -> Self {
        self.unicode_error_messages = unicode_error_messages;
        self
    }
}
